//! In-memory paper venue.
//!
//! Implements the full [`MarketBackend`] contract against a quoted spread
//! around a configurable mid price. Used by the binary's paper-trading mode
//! and as a realistic venue for examples; real venues are external adapters
//! implementing the same trait.

use std::marker::PhantomData;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use rust_decimal::Decimal;

use crate::domain::{Amount, Currency, Offer, OfferId, OfferSide, Price, UnifiedTrade};
use crate::error::{MarketError, MarketResult};

use super::{MarketBackend, RequestSerializer};

/// Knobs for one simulated venue.
#[derive(Debug, Clone)]
pub struct SimulatedConfig {
    pub name: String,
    pub risk: u8,
    /// Fee fraction added on top of buy costs (e.g. `0.004`).
    pub buy_fee: Decimal,
    /// Fee fraction deducted from sell proceeds (e.g. `0.002`).
    pub sell_fee: Decimal,
    /// Quoted mid price, base per trading unit.
    pub mid_price: Decimal,
    /// Relative half-spread around the mid (e.g. `0.001`).
    pub spread: Decimal,
    /// Trading-currency depth available on each book side.
    pub book_depth: Decimal,
    /// Smallest order the venue accepts, in trading currency.
    pub min_order: Decimal,
    pub base_balance: Decimal,
    pub trading_balance: Decimal,
    /// Artificial per-request latency.
    pub latency: Duration,
    /// Venue request timeout.
    pub timeout: Duration,
}

struct State {
    mid: Decimal,
    base: Decimal,
    trading: Decimal,
    next_order: u64,
    fills: Vec<Fill>,
}

struct Fill {
    at: DateTime<Utc>,
    trading_delta: Decimal,
    base_delta: Decimal,
    fee: Decimal,
}

/// A venue that fills orders instantly from an in-memory book.
pub struct SimulatedMarket<T: Currency, B: Currency> {
    name: String,
    risk: u8,
    buy_fee: Decimal,
    sell_fee: Decimal,
    spread: Decimal,
    book_depth: Decimal,
    min_order: Decimal,
    latency: Duration,
    serializer: RequestSerializer,
    state: Mutex<State>,
    _pair: PhantomData<(T, B)>,
}

impl<T: Currency, B: Currency> SimulatedMarket<T, B> {
    #[must_use]
    pub fn new(config: SimulatedConfig) -> Self {
        Self {
            serializer: RequestSerializer::new(config.name.clone(), config.timeout),
            name: config.name,
            risk: config.risk,
            buy_fee: config.buy_fee,
            sell_fee: config.sell_fee,
            spread: config.spread,
            book_depth: config.book_depth,
            min_order: config.min_order,
            latency: config.latency,
            state: Mutex::new(State {
                mid: config.mid_price,
                base: config.base_balance,
                trading: config.trading_balance,
                next_order: 1,
                fills: Vec::new(),
            }),
            _pair: PhantomData,
        }
    }

    /// Move the quoted mid price, e.g. to open or close a gap between venues.
    pub fn set_mid(&self, mid: Decimal) {
        self.state.lock().mid = mid;
    }

    fn quoted_buy(&self, mid: Decimal) -> Decimal {
        mid * (Decimal::ONE + self.spread)
    }

    fn quoted_sell(&self, mid: Decimal) -> Decimal {
        mid * (Decimal::ONE - self.spread)
    }

    fn price(&self, value: Decimal) -> MarketResult<Price<T, B>> {
        Price::new(value)
            .ok_or_else(|| MarketError::fatal(&self.name, format!("non-positive quote {value}")))
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }

    /// Fill bookkeeping shared by `execute_pending_offer` and
    /// `set_market_order`. Validates against balances first and mutates
    /// only after every check has passed, so a failure has no side effect.
    fn settle(&self, side: OfferSide, amount: Decimal, price: Decimal) -> MarketResult<()> {
        let gross = amount * price;
        let fee = match side {
            OfferSide::Buy => gross * self.buy_fee,
            OfferSide::Sell => gross * self.sell_fee,
        };

        let mut state = self.state.lock();
        let (trading_delta, base_delta) = match side {
            OfferSide::Buy => {
                if state.base < gross + fee {
                    return Err(MarketError::fatal(
                        &self.name,
                        format!("insufficient base balance for {amount} @ {price}"),
                    ));
                }
                (amount, -(gross + fee))
            }
            OfferSide::Sell => {
                if state.trading < amount {
                    return Err(MarketError::fatal(
                        &self.name,
                        format!("insufficient trading balance for {amount}"),
                    ));
                }
                (-amount, gross - fee)
            }
        };

        state.trading += trading_delta;
        state.base += base_delta;
        state.fills.push(Fill {
            at: Utc::now(),
            trading_delta,
            base_delta,
            fee,
        });
        Ok(())
    }

    fn make_offer(&self, side: OfferSide, price: Decimal, max_amount: Decimal) -> MarketResult<Offer<T, B>> {
        if max_amount < self.min_order {
            return Err(MarketError::retryable(
                &self.name,
                "no fillable offer on this book side",
            ));
        }
        let id = {
            let mut state = self.state.lock();
            state.next_order += 1;
            OfferId::new(format!("sim-{}", state.next_order - 1))
        };
        Ok(Offer {
            id,
            side,
            min_amount: Amount::new(self.min_order),
            max_amount: Amount::new(max_amount),
            price: self.price(price)?,
            timestamp: Utc::now(),
        })
    }
}

#[async_trait]
impl<T: Currency, B: Currency> MarketBackend for SimulatedMarket<T, B> {
    type Trading = T;
    type Base = B;

    fn name(&self) -> &str {
        &self.name
    }

    fn risk(&self) -> u8 {
        self.risk
    }

    async fn current_buy_price(&self) -> MarketResult<Price<T, B>> {
        self.serializer
            .call(|_nonce| async move {
                self.simulate_latency().await;
                let mid = self.state.lock().mid;
                self.price(self.quoted_buy(mid))
            })
            .await
    }

    async fn current_sell_price(&self) -> MarketResult<Price<T, B>> {
        self.serializer
            .call(|_nonce| async move {
                self.simulate_latency().await;
                let mid = self.state.lock().mid;
                self.price(self.quoted_sell(mid))
            })
            .await
    }

    fn effective_buy_price(&self, price: Price<T, B>) -> Price<T, B> {
        price.scaled(Decimal::ONE + self.buy_fee)
    }

    fn effective_sell_price(&self, price: Price<T, B>) -> Price<T, B> {
        price.scaled(Decimal::ONE - self.sell_fee)
    }

    async fn cheapest_offer_to_buy(
        &self,
        max_spend: Option<Amount<B>>,
    ) -> MarketResult<Offer<T, B>> {
        self.serializer
            .call(|_nonce| async move {
                self.simulate_latency().await;
                let mid = self.state.lock().mid;
                let price = self.quoted_buy(mid);
                let mut max_amount = self.book_depth;
                if let Some(spend) = max_spend {
                    max_amount = max_amount.min(spend.value() / price);
                }
                self.make_offer(OfferSide::Buy, price, max_amount)
            })
            .await
    }

    async fn highest_offer_to_sell(
        &self,
        max_amount: Option<Amount<T>>,
    ) -> MarketResult<Offer<T, B>> {
        self.serializer
            .call(|_nonce| async move {
                self.simulate_latency().await;
                let mid = self.state.lock().mid;
                let price = self.quoted_sell(mid);
                let mut cap = self.book_depth;
                if let Some(max) = max_amount {
                    cap = cap.min(max.value());
                }
                self.make_offer(OfferSide::Sell, price, cap)
            })
            .await
    }

    async fn execute_pending_offer(
        &self,
        offer: &Offer<T, B>,
        amount: Amount<T>,
    ) -> MarketResult<()> {
        self.serializer
            .call(|_nonce| async move {
                self.simulate_latency().await;
                if !offer.accepts(amount) {
                    return Err(MarketError::fatal(
                        &self.name,
                        format!(
                            "amount {amount} outside offer bounds [{}, {}]",
                            offer.min_amount, offer.max_amount
                        ),
                    ));
                }
                self.settle(offer.side, amount.value(), offer.price.value())
            })
            .await
    }

    async fn set_market_order(
        &self,
        side: OfferSide,
        amount: Amount<T>,
        min_amount: Option<Amount<T>>,
    ) -> MarketResult<()> {
        self.serializer
            .call(|_nonce| async move {
                self.simulate_latency().await;
                let fillable = Amount::new(self.book_depth).min(amount);
                if let Some(min) = min_amount {
                    if fillable < min {
                        return Err(MarketError::retryable(
                            &self.name,
                            format!("book can fill only {fillable}, below minimum {min}"),
                        ));
                    }
                }
                let mid = self.state.lock().mid;
                let price = match side {
                    OfferSide::Buy => self.quoted_buy(mid),
                    OfferSide::Sell => self.quoted_sell(mid),
                };
                self.settle(side, fillable.value(), price)
            })
            .await
    }

    async fn available_trading_currency(&self) -> MarketResult<Amount<T>> {
        self.serializer
            .call(|_nonce| async move {
                self.simulate_latency().await;
                Ok(Amount::new(self.state.lock().trading))
            })
            .await
    }

    async fn available_base_currency(&self) -> MarketResult<Amount<B>> {
        self.serializer
            .call(|_nonce| async move {
                self.simulate_latency().await;
                Ok(Amount::new(self.state.lock().base))
            })
            .await
    }

    async fn trade_history(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> MarketResult<Vec<UnifiedTrade<T, B>>> {
        self.serializer
            .call(|_nonce| async move {
                self.simulate_latency().await;
                let state = self.state.lock();
                Ok(state
                    .fills
                    .iter()
                    .filter(|f| f.at >= from && f.at <= to)
                    .map(|f| UnifiedTrade {
                        trading_amount: Amount::new(f.trading_delta),
                        base_amount: Amount::new(f.base_delta),
                        fee_in_base: Amount::new(f.fee),
                    })
                    .collect())
            })
            .await
    }
}
