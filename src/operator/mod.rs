//! Operator interaction channel.
//!
//! The core talks to a human operator at exactly two kinds of points: the
//! confirmation gates before trade legs (`decide`, blocking yes/no) and
//! scan/trade event reporting (`notify`, fire-and-forget). Whether the
//! channel is a console or a chat bot is an implementation detail behind
//! the [`Operator`] trait.

mod console;
#[cfg(feature = "telegram")]
mod telegram;

pub use console::ConsoleOperator;
#[cfg(feature = "telegram")]
pub use telegram::{TelegramConfig, TelegramOperator};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

/// Events reported to the operator channel.
#[derive(Debug, Clone)]
pub enum Event {
    /// A scanned pair's margin cleared the configured threshold.
    OpportunityDetected {
        buy_venue: String,
        sell_venue: String,
        margin: Decimal,
    },
    /// A pair could not be evaluated this pass; next poll retries.
    PairSkipped {
        buy_venue: String,
        sell_venue: String,
        reason: String,
    },
    /// Both legs committed.
    TradeCompleted {
        buy_venue: String,
        sell_venue: String,
        amount: Decimal,
        currency: &'static str,
        margin: Decimal,
    },
    /// The executor stopped before any capital moved. Expected and frequent.
    TradeAborted {
        buy_venue: String,
        sell_venue: String,
        reason: String,
    },
    /// The risky leg failed; nothing moved, no recovery needed.
    RiskyLegFailed { venue: String, error: String },
    /// The safer leg failed after the risky leg committed. Requires a human.
    PositionUnbalanced {
        risky_venue: String,
        safer_venue: String,
        amount: Decimal,
        currency: &'static str,
        detail: String,
    },
}

/// The channel the core consults for confirmations and reports events to.
///
/// `decide` blocks until an explicit affirmative or negative; `notify` must
/// return quickly, so implementations spawn tasks for slow transports.
#[async_trait]
pub trait Operator: Send + Sync {
    /// Ask the operator a yes/no question and wait for the answer.
    async fn decide(&self, question: &str) -> bool;

    /// Report an event. Fire-and-forget.
    fn notify(&self, event: Event);
}

/// Structured-log rendering of an event, shared by operator implementations.
pub(crate) fn log_event(event: &Event) {
    match event {
        Event::OpportunityDetected {
            buy_venue,
            sell_venue,
            margin,
        } => {
            info!(buy = %buy_venue, sell = %sell_venue, margin = %margin, "Opportunity detected");
        }
        Event::PairSkipped {
            buy_venue,
            sell_venue,
            reason,
        } => {
            debug!(buy = %buy_venue, sell = %sell_venue, reason = %reason, "Pair skipped");
        }
        Event::TradeCompleted {
            buy_venue,
            sell_venue,
            amount,
            currency,
            margin,
        } => {
            info!(
                buy = %buy_venue,
                sell = %sell_venue,
                amount = %amount,
                currency = %currency,
                margin = %margin,
                "Trade completed"
            );
        }
        Event::TradeAborted {
            buy_venue,
            sell_venue,
            reason,
        } => {
            debug!(buy = %buy_venue, sell = %sell_venue, reason = %reason, "Trade aborted");
        }
        Event::RiskyLegFailed { venue, error } => {
            warn!(venue = %venue, error = %error, "Risky leg failed, nothing moved");
        }
        Event::PositionUnbalanced {
            risky_venue,
            safer_venue,
            amount,
            currency,
            detail,
        } => {
            error!(
                risky = %risky_venue,
                safer = %safer_venue,
                amount = %amount,
                currency = %currency,
                detail = %detail,
                "UNBALANCED POSITION - manual intervention required"
            );
        }
    }
}

/// Logs events and denies every confirmation.
///
/// The fallback channel for unattended deployments: with confirmation
/// gates enabled and no interactive operator, trades stop at the gate
/// instead of proceeding unconfirmed.
pub struct LogOperator;

#[async_trait]
impl Operator for LogOperator {
    async fn decide(&self, question: &str) -> bool {
        warn!(question = %question, "No interactive operator channel, answering no");
        false
    }

    fn notify(&self, event: Event) {
        log_event(&event);
    }
}

/// Discards everything. Denies every confirmation.
pub struct NullOperator;

#[async_trait]
impl Operator for NullOperator {
    async fn decide(&self, _question: &str) -> bool {
        false
    }

    fn notify(&self, _event: Event) {}
}
