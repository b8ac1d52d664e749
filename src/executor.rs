//! Two-leg trade execution.
//!
//! A profitable scan result spans two venues that know nothing about each
//! other, so there is no transaction to lean on: the executor orders the
//! legs by venue risk, re-validates the opportunity against concrete
//! offers, and commits the risky leg before the safer one. The one state
//! this protocol cannot roll back (risky leg committed, safer leg missing)
//! is escalated as [`ExecutorError::Unbalanced`] and never retried,
//! because a retry could double-execute the offsetting trade.

use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;
use tracing::{debug, info};

use crate::config::Config;
use crate::domain::{margin, Amount, Currency, OfferSide};
use crate::error::{ExecutorError, MarketError};
use crate::market::MarketBackend;
use crate::operator::{Event, Operator};

/// Executor settings, snapshotted from [`Config`] at construction.
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    /// Minimum fee-adjusted margin a revalidated opportunity must clear.
    pub min_profit: Decimal,
    /// Maximum base currency committed to one trade.
    pub max_stake: Decimal,
    /// Gate the risky leg on an operator confirmation.
    pub confirm_risky: bool,
    /// Gate the safer leg on an operator confirmation.
    pub confirm_safe: bool,
    /// Size and report trades but place no orders.
    pub dry_run: bool,
}

impl ExecutorConfig {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self {
            min_profit: config.scanner.min_profit,
            max_stake: config.scanner.max_stake,
            confirm_risky: config.execution.confirm_risky,
            confirm_safe: config.execution.confirm_safe,
            dry_run: config.execution.dry_run,
        }
    }
}

/// Why an execution stopped before any capital moved.
#[derive(Debug, Clone)]
pub enum AbortReason {
    /// The revalidated concrete-offer margin no longer clears the
    /// threshold. Expected and frequent; not an error.
    StaleMargin { margin: Decimal, threshold: Decimal },
    /// A venue balance cannot fund the trade at all.
    InsufficientBalance { venue: String },
    /// The sized amount falls below a venue's minimum order.
    BelowVenueMinimum {
        venue: String,
        amount: Decimal,
        minimum: Decimal,
    },
    /// The operator declined the risky leg.
    DeclinedRisky,
}

impl fmt::Display for AbortReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaleMargin { margin, threshold } => {
                write!(f, "margin {margin} below threshold {threshold} on revalidation")
            }
            Self::InsufficientBalance { venue } => {
                write!(f, "insufficient balance on {venue}")
            }
            Self::BelowVenueMinimum {
                venue,
                amount,
                minimum,
            } => {
                write!(f, "amount {amount} below minimum {minimum} on {venue}")
            }
            Self::DeclinedRisky => write!(f, "operator declined the risky leg"),
        }
    }
}

/// Outcome of one executor run that did not end in escalation.
#[derive(Debug)]
pub enum TradeOutcome {
    /// Both legs committed.
    Completed { amount: Decimal, margin: Decimal },
    /// Dry-run mode: the trade was sized and validated, no orders placed.
    DryRun { amount: Decimal, margin: Decimal },
    /// Stopped before any capital moved.
    Aborted(AbortReason),
    /// The risky leg failed. Nothing moved; no recovery action required.
    RiskyLegFailed(MarketError),
}

/// Executes one two-leg trade between a buy venue and a sell venue.
pub struct TradeExecutor {
    config: ExecutorConfig,
    operator: Arc<dyn Operator>,
}

impl TradeExecutor {
    #[must_use]
    pub fn new(config: ExecutorConfig, operator: Arc<dyn Operator>) -> Self {
        Self { config, operator }
    }

    /// Run the two-leg protocol: risk-order the legs, revalidate the margin
    /// against concrete offers, execute the risky leg, then the safer leg.
    ///
    /// Ordinary pre-commit failures come back as
    /// [`ExecutorError::Market`]; the post-commit inconsistency comes back
    /// as [`ExecutorError::Unbalanced`] and is the caller's signal to alert
    /// a human rather than retry.
    pub async fn execute<T, B>(
        &self,
        buy: Arc<dyn MarketBackend<Trading = T, Base = B>>,
        sell: Arc<dyn MarketBackend<Trading = T, Base = B>>,
    ) -> Result<TradeOutcome, ExecutorError>
    where
        T: Currency,
        B: Currency,
    {
        // The higher-risk venue's leg goes first: failing it aborts with
        // zero exposure, while failing the second leg after the first
        // committed is the costly case. Ties treat the buy leg as risky.
        let risky_is_buy = buy.risk() >= sell.risk();
        let (risky_name, safer_name) = if risky_is_buy {
            (buy.name().to_string(), sell.name().to_string())
        } else {
            (sell.name().to_string(), buy.name().to_string())
        };

        // Revalidate against concrete fillable offers, not quotes.
        let available_base = buy.available_base_currency().await?;
        let available_trading = sell.available_trading_currency().await?;

        let spend_cap = available_base.min(Amount::new(self.config.max_stake));
        if !spend_cap.is_positive() {
            return Ok(self.abort(buy.as_ref(), sell.as_ref(), AbortReason::InsufficientBalance {
                venue: buy.name().to_string(),
            }));
        }
        if !available_trading.is_positive() {
            return Ok(self.abort(buy.as_ref(), sell.as_ref(), AbortReason::InsufficientBalance {
                venue: sell.name().to_string(),
            }));
        }

        let buy_offer = buy.cheapest_offer_to_buy(Some(spend_cap)).await?;
        let sell_offer = sell.highest_offer_to_sell(Some(available_trading)).await?;

        let eff_buy = buy.effective_buy_price(buy_offer.price);
        let eff_sell = sell.effective_sell_price(sell_offer.price);
        let offer_margin = margin(eff_buy, eff_sell);

        if offer_margin < self.config.min_profit {
            debug!(
                buy = buy.name(),
                sell = sell.name(),
                margin = %offer_margin,
                threshold = %self.config.min_profit,
                "Opportunity evaporated on revalidation"
            );
            return Ok(self.abort(buy.as_ref(), sell.as_ref(), AbortReason::StaleMargin {
                margin: offer_margin,
                threshold: self.config.min_profit,
            }));
        }

        // Size once, after both offers are confirmed valid; never re-derived.
        let amount = eff_buy
            .affordable_with(spend_cap)
            .min(buy_offer.max_amount)
            .min(sell_offer.max_amount)
            .min(available_trading);

        for (offer, venue) in [(&buy_offer, buy.name()), (&sell_offer, sell.name())] {
            if amount < offer.min_amount {
                return Ok(self.abort(buy.as_ref(), sell.as_ref(), AbortReason::BelowVenueMinimum {
                    venue: venue.to_string(),
                    amount: amount.value(),
                    minimum: offer.min_amount.value(),
                }));
            }
        }

        if self.config.confirm_risky {
            let question = format!(
                "Buy {amount} on {} at {eff_buy} and sell on {} at {eff_sell} \
                 (margin {offer_margin})? Risky leg first: {risky_name}.",
                buy.name(),
                sell.name(),
            );
            if !self.operator.decide(&question).await {
                return Ok(self.abort(buy.as_ref(), sell.as_ref(), AbortReason::DeclinedRisky));
            }
        }

        if self.config.dry_run {
            info!(
                buy = buy.name(),
                sell = sell.name(),
                amount = %amount,
                margin = %offer_margin,
                "Dry run - not placing orders"
            );
            return Ok(TradeOutcome::DryRun {
                amount: amount.value(),
                margin: offer_margin,
            });
        }

        // ExecuteRisky: pin the fetched offer on the risky venue. A failure
        // here means nothing has moved anywhere.
        let risky_result = if risky_is_buy {
            buy.execute_pending_offer(&buy_offer, amount).await
        } else {
            sell.execute_pending_offer(&sell_offer, amount).await
        };
        if let Err(e) = risky_result {
            self.operator.notify(Event::RiskyLegFailed {
                venue: risky_name,
                error: e.to_string(),
            });
            return Ok(TradeOutcome::RiskyLegFailed(e));
        }

        // From here on the risky leg has committed: every early exit below
        // leaves an unbalanced position and must escalate.
        if self.config.confirm_safe {
            let question = format!(
                "Risky leg on {risky_name} committed. Place the offsetting \
                 order for {amount} on {safer_name}?"
            );
            if !self.operator.decide(&question).await {
                return Err(self.unbalanced(
                    &risky_name,
                    &safer_name,
                    amount,
                    "operator declined the offsetting leg".to_string(),
                ));
            }
        }

        // ExecuteSafe: a market order on the safer venue; no pinned offer.
        let safe_result = if risky_is_buy {
            sell.set_market_order(OfferSide::Sell, amount, None).await
        } else {
            buy.set_market_order(OfferSide::Buy, amount, None).await
        };
        if let Err(e) = safe_result {
            return Err(self.unbalanced(&risky_name, &safer_name, amount, e.to_string()));
        }

        info!(
            buy = buy.name(),
            sell = sell.name(),
            amount = %amount,
            margin = %offer_margin,
            "Both legs committed"
        );
        self.operator.notify(Event::TradeCompleted {
            buy_venue: buy.name().to_string(),
            sell_venue: sell.name().to_string(),
            amount: amount.value(),
            currency: T::CODE,
            margin: offer_margin,
        });

        Ok(TradeOutcome::Completed {
            amount: amount.value(),
            margin: offer_margin,
        })
    }

    fn abort<T, B>(
        &self,
        buy: &dyn MarketBackend<Trading = T, Base = B>,
        sell: &dyn MarketBackend<Trading = T, Base = B>,
        reason: AbortReason,
    ) -> TradeOutcome
    where
        T: Currency,
        B: Currency,
    {
        self.operator.notify(Event::TradeAborted {
            buy_venue: buy.name().to_string(),
            sell_venue: sell.name().to_string(),
            reason: reason.to_string(),
        });
        TradeOutcome::Aborted(reason)
    }

    fn unbalanced<T: Currency>(
        &self,
        risky_venue: &str,
        safer_venue: &str,
        amount: Amount<T>,
        detail: String,
    ) -> ExecutorError {
        self.operator.notify(Event::PositionUnbalanced {
            risky_venue: risky_venue.to_string(),
            safer_venue: safer_venue.to_string(),
            amount: amount.value(),
            currency: T::CODE,
            detail: detail.clone(),
        });
        ExecutorError::Unbalanced {
            risky_venue: risky_venue.to_string(),
            safer_venue: safer_venue.to_string(),
            amount: amount.value(),
            currency: T::CODE,
            detail,
        }
    }
}
