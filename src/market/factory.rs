//! Venue factory.
//!
//! Builds backend instances from `[[venues]]` configuration entries.
//! Per-venue HTTP clients are external adapters; they register here by
//! growing [`VenueKind`](crate::config::VenueKind) and this match.

use std::sync::Arc;
use std::time::Duration;

use crate::config::{VenueConfig, VenueKind};
use crate::domain::Currency;

use super::{MarketBackend, SimulatedConfig, SimulatedMarket};

/// Construct one backend per configured venue.
pub fn build_venues<T, B>(venues: &[VenueConfig]) -> Vec<Arc<dyn MarketBackend<Trading = T, Base = B>>>
where
    T: Currency,
    B: Currency,
{
    venues
        .iter()
        .map(|venue| match venue.kind {
            VenueKind::Simulated => {
                let backend: Arc<dyn MarketBackend<Trading = T, Base = B>> =
                    Arc::new(SimulatedMarket::new(SimulatedConfig {
                        name: venue.name.clone(),
                        risk: venue.risk,
                        buy_fee: venue.buy_fee,
                        sell_fee: venue.sell_fee,
                        mid_price: venue.mid_price,
                        spread: venue.spread,
                        book_depth: venue.book_depth,
                        min_order: venue.min_order,
                        base_balance: venue.base_balance,
                        trading_balance: venue.trading_balance,
                        latency: Duration::from_millis(venue.latency_ms),
                        timeout: Duration::from_secs(venue.timeout_secs),
                    }));
                backend
            }
        })
        .collect()
}
