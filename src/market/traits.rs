//! The polymorphic contract every trading venue implements.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::{Amount, Currency, Offer, OfferSide, Price, UnifiedTrade};
use crate::error::MarketResult;

/// One trading venue, reachable through its authenticated network API.
///
/// Constructed once at startup from credentials and alive for the process
/// lifetime; stateless between calls except for its request serializer's
/// nonce counter. The currency pair a venue trades is part of its type, so
/// a scanner can only ever hold venues sharing both currencies.
///
/// # Contract
///
/// - Every network-bound method is funnelled through the venue's
///   [`RequestSerializer`](super::RequestSerializer): at most one in-flight
///   authenticated request per backend instance, with strictly monotonic
///   nonces.
/// - A failed [`MarketResult`] means the attempted operation had no
///   observable side effect. Reads get this for free; the write methods
///   (`execute_pending_offer`, `set_market_order`) carry it as an explicit
///   obligation on each implementation.
/// - Nothing here retries. `can_retry` on errors is advice to the caller.
#[async_trait]
pub trait MarketBackend: Send + Sync {
    /// The currency being traded, e.g. [`Btc`](crate::domain::Btc).
    type Trading: Currency;
    /// The currency amounts are quoted in, e.g. [`Eur`](crate::domain::Eur).
    type Base: Currency;

    /// Venue name, unique within a run (e.g. `"kraken.com"`).
    fn name(&self) -> &str;

    /// Risk score; lower means safer. Drives leg ordering in the executor.
    fn risk(&self) -> u8;

    /// Best price at which one trading unit can currently be bought.
    /// No fees included. Fails retryable when the book side is empty.
    async fn current_buy_price(&self) -> MarketResult<Price<Self::Trading, Self::Base>>;

    /// Best price at which one trading unit can currently be sold.
    /// No fees included. Fails retryable when the book side is empty.
    async fn current_sell_price(&self) -> MarketResult<Price<Self::Trading, Self::Base>>;

    /// What buying at `price` actually costs once this venue's fees apply.
    /// Pure arithmetic, no I/O, never fails.
    fn effective_buy_price(
        &self,
        price: Price<Self::Trading, Self::Base>,
    ) -> Price<Self::Trading, Self::Base>;

    /// What selling at `price` actually yields once this venue's fees apply.
    /// Pure arithmetic, no I/O, never fails.
    fn effective_sell_price(
        &self,
        price: Price<Self::Trading, Self::Base>,
    ) -> Price<Self::Trading, Self::Base>;

    /// Cheapest open offer where trading currency can be bought, optionally
    /// restricted to offers fillable with `max_spend` of base currency.
    async fn cheapest_offer_to_buy(
        &self,
        max_spend: Option<Amount<Self::Base>>,
    ) -> MarketResult<Offer<Self::Trading, Self::Base>>;

    /// Highest open offer where trading currency can be sold, optionally
    /// restricted to offers fillable with `max_amount` of trading currency.
    async fn highest_offer_to_sell(
        &self,
        max_amount: Option<Amount<Self::Trading>>,
    ) -> MarketResult<Offer<Self::Trading, Self::Base>>;

    /// Fill `amount` against a specific previously-fetched offer.
    ///
    /// Must be called at most once per offer; implementations must not
    /// retry internally.
    async fn execute_pending_offer(
        &self,
        offer: &Offer<Self::Trading, Self::Base>,
        amount: Amount<Self::Trading>,
    ) -> MarketResult<()>;

    /// Place a venue-native market order, used where a specific offer need
    /// not be pinned.
    async fn set_market_order(
        &self,
        side: OfferSide,
        amount: Amount<Self::Trading>,
        min_amount: Option<Amount<Self::Trading>>,
    ) -> MarketResult<()>;

    /// Spendable trading-currency balance.
    async fn available_trading_currency(&self) -> MarketResult<Amount<Self::Trading>>;

    /// Spendable base-currency balance; sizes the buy leg.
    async fn available_base_currency(&self) -> MarketResult<Amount<Self::Base>>;

    /// Settled trades in `[from, to]`, translated to unified records.
    async fn trade_history(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> MarketResult<Vec<UnifiedTrade<Self::Trading, Self::Base>>>;
}
