//! Arbitrage scanner loop.
//!
//! Polls every ordered pair of venues on a fixed interval and hands pairs
//! whose advisory margin clears the threshold to the executor. Polling is
//! deliberate: the venues expose no uniform low-latency push feed, so the
//! scanner trades freshness for predictable venue load.

use std::sync::Arc;
use std::time::Duration;

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::config::ScannerConfig;
use crate::domain::{margin_between, Currency};
use crate::error::MarketError;
use crate::executor::{TradeExecutor, TradeOutcome};
use crate::market::MarketBackend;
use crate::operator::{Event, Operator};

/// What happened to one ordered pair during a scan pass.
#[derive(Debug)]
pub enum PairOutcome {
    /// Margin computed, below threshold.
    Evaluated {
        buy: String,
        sell: String,
        margin: Decimal,
    },
    /// Margin could not be computed this pass; the next poll retries.
    Skipped {
        buy: String,
        sell: String,
        error: MarketError,
    },
    /// Margin cleared the threshold; an executor run was spawned.
    Triggered {
        buy: String,
        sell: String,
        margin: Decimal,
    },
}

impl PairOutcome {
    #[must_use]
    pub const fn is_triggered(&self) -> bool {
        matches!(self, Self::Triggered { .. })
    }

    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped { .. })
    }
}

/// Scans all ordered venue pairs sharing a currency pair.
///
/// Venues sharing the pair is enforced by construction: the backend list
/// is homogeneous in `(T, B)`, so a currency-mismatched pairing cannot be
/// expressed. Self-pairs are excluded by index.
pub struct ArbitrageScanner<T: Currency, B: Currency> {
    backends: Vec<Arc<dyn MarketBackend<Trading = T, Base = B>>>,
    executor: Arc<TradeExecutor>,
    operator: Arc<dyn Operator>,
    min_profit: Decimal,
    interval: Duration,
}

impl<T: Currency, B: Currency> ArbitrageScanner<T, B> {
    #[must_use]
    pub fn new(
        backends: Vec<Arc<dyn MarketBackend<Trading = T, Base = B>>>,
        executor: Arc<TradeExecutor>,
        operator: Arc<dyn Operator>,
        config: &ScannerConfig,
    ) -> Self {
        Self {
            backends,
            executor,
            operator,
            min_profit: config.min_profit,
            interval: Duration::from_secs(config.scan_interval_secs),
        }
    }

    /// Scan forever on the configured interval. Terminates only with the
    /// process (ctrl-c handling lives in `main`).
    pub async fn run(&self) {
        info!(
            venues = self.backends.len(),
            interval_secs = self.interval.as_secs(),
            threshold = %self.min_profit,
            "Scanner started"
        );

        loop {
            self.scan_once().await;
            tokio::time::sleep(self.interval).await;
        }
    }

    /// Evaluate every ordered pair once.
    ///
    /// A pair failure is logged and skipped; it never aborts the pass.
    /// Triggered executions are spawned detached; the scanner does not
    /// serialize with them, but each venue's request serializer keeps
    /// concurrent work against the same venue from interleaving unsafely.
    pub async fn scan_once(&self) -> Vec<PairOutcome> {
        let mut outcomes = Vec::with_capacity(self.backends.len() * self.backends.len());

        for (i, buy) in self.backends.iter().enumerate() {
            for (j, sell) in self.backends.iter().enumerate() {
                if i == j {
                    continue;
                }

                let outcome = match margin_between(buy.as_ref(), sell.as_ref()).await {
                    Err(error) => {
                        self.operator.notify(Event::PairSkipped {
                            buy_venue: buy.name().to_string(),
                            sell_venue: sell.name().to_string(),
                            reason: error.to_string(),
                        });
                        PairOutcome::Skipped {
                            buy: buy.name().to_string(),
                            sell: sell.name().to_string(),
                            error,
                        }
                    }
                    Ok(margin) if margin >= self.min_profit => {
                        self.operator.notify(Event::OpportunityDetected {
                            buy_venue: buy.name().to_string(),
                            sell_venue: sell.name().to_string(),
                            margin,
                        });
                        self.spawn_execution(buy.clone(), sell.clone());
                        PairOutcome::Triggered {
                            buy: buy.name().to_string(),
                            sell: sell.name().to_string(),
                            margin,
                        }
                    }
                    Ok(margin) => {
                        debug!(
                            buy = buy.name(),
                            sell = sell.name(),
                            margin = %margin,
                            "Pair below threshold"
                        );
                        PairOutcome::Evaluated {
                            buy: buy.name().to_string(),
                            sell: sell.name().to_string(),
                            margin,
                        }
                    }
                };
                outcomes.push(outcome);
            }
        }

        outcomes
    }

    /// Run the executor without blocking the scan loop.
    fn spawn_execution(
        &self,
        buy: Arc<dyn MarketBackend<Trading = T, Base = B>>,
        sell: Arc<dyn MarketBackend<Trading = T, Base = B>>,
    ) {
        let executor = self.executor.clone();
        tokio::spawn(async move {
            match executor.execute(buy, sell).await {
                Ok(TradeOutcome::Completed { amount, margin }) => {
                    info!(amount = %amount, margin = %margin, "Execution completed");
                }
                Ok(TradeOutcome::DryRun { amount, margin }) => {
                    info!(amount = %amount, margin = %margin, "Dry run completed");
                }
                Ok(TradeOutcome::Aborted(reason)) => {
                    debug!(reason = %reason, "Execution aborted");
                }
                Ok(TradeOutcome::RiskyLegFailed(error)) => {
                    warn!(error = %error, "Risky leg failed, nothing moved");
                }
                // Already notified at error priority through the operator
                // channel; nothing to recover here.
                Err(e) => {
                    warn!(error = %e, "Execution failed");
                }
            }
        });
    }
}
