//! Trade-history aggregation across venues.
//!
//! Read-only: folds each venue's translated trade records into one signed
//! [`UnifiedTrade`] per venue plus a combined total, and values the net
//! position at a reference price. Owns no storage.

use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::domain::{Amount, Currency, Price, UnifiedTrade};
use crate::error::MarketResult;
use crate::market::MarketBackend;

/// One venue's net trading activity over a period.
#[derive(Debug, Clone)]
pub struct VenueSummary<T: Currency, B: Currency> {
    pub venue: String,
    pub net: UnifiedTrade<T, B>,
    pub trade_count: usize,
}

/// Net activity across all venues over a period.
#[derive(Debug, Clone)]
pub struct CombinedReport<T: Currency, B: Currency> {
    pub venues: Vec<VenueSummary<T, B>>,
    pub total: UnifiedTrade<T, B>,
}

impl<T: Currency, B: Currency> CombinedReport<T, B> {
    /// Value the combined net position at `reference`, in base currency.
    #[must_use]
    pub fn estimated_profit(&self, reference: Price<T, B>) -> Amount<B> {
        self.total.estimated_profit(reference)
    }
}

/// Fold one venue's settled trades in `[from, to]` into a summary.
pub async fn summarize<T, B>(
    backend: &dyn MarketBackend<Trading = T, Base = B>,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> MarketResult<VenueSummary<T, B>>
where
    T: Currency,
    B: Currency,
{
    let trades = backend.trade_history(from, to).await?;
    Ok(VenueSummary {
        venue: backend.name().to_string(),
        trade_count: trades.len(),
        net: trades.into_iter().sum(),
    })
}

/// Summarize every venue and the combined total.
///
/// Venues are queried sequentially; each query is already serialized
/// per-venue and a report is not latency-sensitive.
pub async fn combined_report<T, B>(
    backends: &[Arc<dyn MarketBackend<Trading = T, Base = B>>],
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> MarketResult<CombinedReport<T, B>>
where
    T: Currency,
    B: Currency,
{
    let mut venues = Vec::with_capacity(backends.len());
    for backend in backends {
        venues.push(summarize(backend.as_ref(), from, to).await?);
    }

    let total = venues.iter().map(|v| v.net).sum();
    Ok(CombinedReport { venues, total })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Btc, Eur, OfferSide};
    use crate::market::{SimulatedConfig, SimulatedMarket};
    use rust_decimal_macros::dec;
    use std::time::Duration;

    fn venue(name: &str, mid: rust_decimal::Decimal) -> Arc<SimulatedMarket<Btc, Eur>> {
        Arc::new(SimulatedMarket::new(SimulatedConfig {
            name: name.into(),
            risk: 1,
            buy_fee: dec!(0),
            sell_fee: dec!(0),
            mid_price: mid,
            spread: dec!(0),
            book_depth: dec!(100),
            min_order: dec!(0),
            base_balance: dec!(10000),
            trading_balance: dec!(10),
            latency: Duration::ZERO,
            timeout: Duration::from_secs(20),
        }))
    }

    #[tokio::test]
    async fn report_nets_out_a_round_trip() {
        let cheap = venue("cheap.test", dec!(100));
        let dear = venue("dear.test", dec!(110));

        cheap
            .set_market_order(OfferSide::Buy, Amount::new(dec!(2)), None)
            .await
            .unwrap();
        dear.set_market_order(OfferSide::Sell, Amount::new(dec!(2)), None)
            .await
            .unwrap();

        let backends: Vec<Arc<dyn MarketBackend<Trading = Btc, Base = Eur>>> =
            vec![cheap, dear];
        let from = Utc::now() - chrono::Duration::minutes(1);
        let report = combined_report(&backends, from, Utc::now()).await.unwrap();

        assert_eq!(report.venues.len(), 2);
        assert_eq!(report.total.trading_amount.value(), dec!(0));
        // Bought at 100, sold at 110, no fees: 20 EUR realized.
        assert_eq!(report.total.base_amount.value(), dec!(20));

        let reference = Price::new(dec!(105)).unwrap();
        assert_eq!(report.estimated_profit(reference).value(), dec!(20));
    }
}
