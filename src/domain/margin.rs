//! Fee-adjusted profit margin between an ordered pair of venues.

use rust_decimal::Decimal;

use crate::error::MarketResult;
use crate::market::MarketBackend;

use super::{Currency, Price};

/// Relative margin between two fee-adjusted prices.
///
/// `(eff_sell - eff_buy) / eff_buy`, dimensionless. Positive when selling
/// at `eff_sell` more than covers buying at `eff_buy`.
#[must_use]
pub fn margin<T: Currency, B: Currency>(eff_buy: Price<T, B>, eff_sell: Price<T, B>) -> Decimal {
    (eff_sell.value() - eff_buy.value()) / eff_buy.value()
}

/// Fee-adjusted margin for buying on `buy` and selling on `sell`.
///
/// Fetches both venues' current prices concurrently (they are independent
/// venues; ordering does not matter), applies each venue's own fee
/// transform, and propagates the buy-side failure first if both fail.
///
/// The result is advisory: it answers "is it worth looking closer", not
/// "trade now", because prices are stale the instant they are read. The
/// two directions of a pair are independent values; fees are not assumed
/// symmetric.
pub async fn margin_between<T, B>(
    buy: &dyn MarketBackend<Trading = T, Base = B>,
    sell: &dyn MarketBackend<Trading = T, Base = B>,
) -> MarketResult<Decimal>
where
    T: Currency,
    B: Currency,
{
    let (buy_price, sell_price) = tokio::join!(buy.current_buy_price(), sell.current_sell_price());

    let eff_buy = buy.effective_buy_price(buy_price?);
    let eff_sell = sell.effective_sell_price(sell_price?);

    Ok(margin(eff_buy, eff_sell))
}
