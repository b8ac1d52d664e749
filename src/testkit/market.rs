//! Scripted mock venue.

use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;
use tokio::time::Instant;

use crate::domain::{Amount, Currency, Offer, OfferId, OfferSide, Price, UnifiedTrade};
use crate::error::{MarketError, MarketResult};
use crate::market::{MarketBackend, RequestSerializer};

/// One recorded backend call, with the interval its body held the
/// serializer lock and the nonce it was issued.
#[derive(Debug, Clone)]
pub struct CallRecord {
    pub method: &'static str,
    pub nonce: u64,
    pub started: Instant,
    pub finished: Instant,
}

#[derive(Debug, Clone)]
struct OfferSpec {
    min: Decimal,
    max: Decimal,
    price: Decimal,
}

struct MockState {
    buy_price: MarketResult<Decimal>,
    sell_price: MarketResult<Decimal>,
    buy_offer: MarketResult<OfferSpec>,
    sell_offer: MarketResult<OfferSpec>,
    execute_result: MarketResult<()>,
    market_order_result: MarketResult<()>,
    base_balance: Decimal,
    trading_balance: Decimal,
    history: Vec<UnifiedTradeSpec>,
    calls: Vec<CallRecord>,
}

#[derive(Debug, Clone, Copy)]
struct UnifiedTradeSpec {
    trading: Decimal,
    base: Decimal,
    fee: Decimal,
}

/// A venue whose every response is scripted.
///
/// All reads and writes are funnelled through a real
/// [`RequestSerializer`], and every call body is recorded with its nonce
/// and lock-held interval, so serializer properties can be asserted from
/// the outside. Scripted failures leave balances untouched, matching the
/// no-side-effect-on-failure contract.
pub struct MockMarket<T: Currency, B: Currency> {
    name: String,
    risk: u8,
    buy_fee: Decimal,
    sell_fee: Decimal,
    work: Duration,
    serializer: RequestSerializer,
    state: Mutex<MockState>,
    _pair: PhantomData<(T, B)>,
}

impl<T: Currency, B: Currency> MockMarket<T, B> {
    #[must_use]
    pub fn new(name: impl Into<String>, risk: u8) -> Self {
        let name = name.into();
        Self {
            serializer: RequestSerializer::with_default_timeout(name.clone()),
            name,
            risk,
            buy_fee: Decimal::ZERO,
            sell_fee: Decimal::ZERO,
            work: Duration::ZERO,
            state: Mutex::new(MockState {
                buy_price: Ok(Decimal::ONE_HUNDRED),
                sell_price: Ok(Decimal::ONE_HUNDRED),
                buy_offer: Ok(OfferSpec {
                    min: Decimal::ZERO,
                    max: Decimal::from(1000),
                    price: Decimal::ONE_HUNDRED,
                }),
                sell_offer: Ok(OfferSpec {
                    min: Decimal::ZERO,
                    max: Decimal::from(1000),
                    price: Decimal::ONE_HUNDRED,
                }),
                execute_result: Ok(()),
                market_order_result: Ok(()),
                base_balance: Decimal::from(10_000),
                trading_balance: Decimal::from(10_000),
                history: Vec::new(),
                calls: Vec::new(),
            }),
            _pair: PhantomData,
        }
    }

    /// Fee multipliers applied by the effective-price transforms.
    #[must_use]
    pub fn with_fees(mut self, buy_fee: Decimal, sell_fee: Decimal) -> Self {
        self.buy_fee = buy_fee;
        self.sell_fee = sell_fee;
        self
    }

    /// Make every call body take this long while holding the lock.
    #[must_use]
    pub fn with_work(mut self, work: Duration) -> Self {
        self.work = work;
        self
    }

    pub fn set_buy_price(&self, price: Decimal) {
        self.state.lock().buy_price = Ok(price);
    }

    pub fn set_sell_price(&self, price: Decimal) {
        self.state.lock().sell_price = Ok(price);
    }

    pub fn fail_buy_price(&self, error: MarketError) {
        self.state.lock().buy_price = Err(error);
    }

    pub fn fail_sell_price(&self, error: MarketError) {
        self.state.lock().sell_price = Err(error);
    }

    pub fn set_buy_offer(&self, min: Decimal, max: Decimal, price: Decimal) {
        self.state.lock().buy_offer = Ok(OfferSpec { min, max, price });
    }

    pub fn set_sell_offer(&self, min: Decimal, max: Decimal, price: Decimal) {
        self.state.lock().sell_offer = Ok(OfferSpec { min, max, price });
    }

    pub fn fail_buy_offer(&self, error: MarketError) {
        self.state.lock().buy_offer = Err(error);
    }

    pub fn set_execute_result(&self, result: MarketResult<()>) {
        self.state.lock().execute_result = result;
    }

    pub fn set_market_order_result(&self, result: MarketResult<()>) {
        self.state.lock().market_order_result = result;
    }

    pub fn set_balances(&self, base: Decimal, trading: Decimal) {
        let mut state = self.state.lock();
        state.base_balance = base;
        state.trading_balance = trading;
    }

    pub fn push_history(&self, trading: Decimal, base: Decimal, fee: Decimal) {
        self.state.lock().history.push(UnifiedTradeSpec { trading, base, fee });
    }

    /// Everything recorded so far, in completion order.
    #[must_use]
    pub fn calls(&self) -> Vec<CallRecord> {
        self.state.lock().calls.clone()
    }

    /// How many times `method` was called.
    #[must_use]
    pub fn call_count(&self, method: &str) -> usize {
        self.state
            .lock()
            .calls
            .iter()
            .filter(|c| c.method == method)
            .count()
    }

    #[must_use]
    pub fn base_balance(&self) -> Decimal {
        self.state.lock().base_balance
    }

    #[must_use]
    pub fn trading_balance(&self) -> Decimal {
        self.state.lock().trading_balance
    }

    async fn tracked<R>(
        &self,
        method: &'static str,
        f: impl FnOnce(&mut MockState) -> MarketResult<R> + Send,
    ) -> MarketResult<R> {
        self.serializer
            .call(|nonce| async move {
                let started = Instant::now();
                if !self.work.is_zero() {
                    tokio::time::sleep(self.work).await;
                }
                let mut state = self.state.lock();
                let result = f(&mut state);
                state.calls.push(CallRecord {
                    method,
                    nonce: nonce.get(),
                    started,
                    finished: Instant::now(),
                });
                result
            })
            .await
    }

    fn price_of(&self, value: Decimal) -> MarketResult<Price<T, B>> {
        Price::new(value).ok_or_else(|| MarketError::fatal(&self.name, "scripted non-positive price"))
    }

    fn offer_of(&self, side: OfferSide, spec: &OfferSpec) -> MarketResult<Offer<T, B>> {
        Ok(Offer {
            id: OfferId::new(format!("mock-{}", self.name)),
            side,
            min_amount: Amount::new(spec.min),
            max_amount: Amount::new(spec.max),
            price: self.price_of(spec.price)?,
            timestamp: Utc::now(),
        })
    }
}

#[async_trait]
impl<T: Currency, B: Currency> MarketBackend for MockMarket<T, B> {
    type Trading = T;
    type Base = B;

    fn name(&self) -> &str {
        &self.name
    }

    fn risk(&self) -> u8 {
        self.risk
    }

    async fn current_buy_price(&self) -> MarketResult<Price<T, B>> {
        let value = self.tracked("current_buy_price", |s| s.buy_price.clone()).await?;
        self.price_of(value)
    }

    async fn current_sell_price(&self) -> MarketResult<Price<T, B>> {
        let value = self.tracked("current_sell_price", |s| s.sell_price.clone()).await?;
        self.price_of(value)
    }

    fn effective_buy_price(&self, price: Price<T, B>) -> Price<T, B> {
        price.scaled(Decimal::ONE + self.buy_fee)
    }

    fn effective_sell_price(&self, price: Price<T, B>) -> Price<T, B> {
        price.scaled(Decimal::ONE - self.sell_fee)
    }

    async fn cheapest_offer_to_buy(
        &self,
        _max_spend: Option<Amount<B>>,
    ) -> MarketResult<Offer<T, B>> {
        let spec = self.tracked("cheapest_offer_to_buy", |s| s.buy_offer.clone()).await?;
        self.offer_of(OfferSide::Buy, &spec)
    }

    async fn highest_offer_to_sell(
        &self,
        _max_amount: Option<Amount<T>>,
    ) -> MarketResult<Offer<T, B>> {
        let spec = self.tracked("highest_offer_to_sell", |s| s.sell_offer.clone()).await?;
        self.offer_of(OfferSide::Sell, &spec)
    }

    async fn execute_pending_offer(
        &self,
        _offer: &Offer<T, B>,
        _amount: Amount<T>,
    ) -> MarketResult<()> {
        self.tracked("execute_pending_offer", |s| s.execute_result.clone())
            .await
    }

    async fn set_market_order(
        &self,
        _side: OfferSide,
        _amount: Amount<T>,
        _min_amount: Option<Amount<T>>,
    ) -> MarketResult<()> {
        self.tracked("set_market_order", |s| s.market_order_result.clone())
            .await
    }

    async fn available_trading_currency(&self) -> MarketResult<Amount<T>> {
        self.tracked("available_trading_currency", |s| Ok(Amount::new(s.trading_balance)))
            .await
    }

    async fn available_base_currency(&self) -> MarketResult<Amount<B>> {
        self.tracked("available_base_currency", |s| Ok(Amount::new(s.base_balance)))
            .await
    }

    async fn trade_history(
        &self,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
    ) -> MarketResult<Vec<UnifiedTrade<T, B>>> {
        self.tracked("trade_history", |s| {
            Ok(s.history
                .iter()
                .map(|t| UnifiedTrade {
                    trading_amount: Amount::new(t.trading),
                    base_amount: Amount::new(t.base),
                    fee_in_base: Amount::new(t.fee),
                })
                .collect())
        })
        .await
    }
}
