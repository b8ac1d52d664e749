use rust_decimal::Decimal;
use thiserror::Error;

/// Configuration-related errors with structured variants.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required field: {field}")]
    MissingField { field: &'static str },

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },

    #[error("failed to read config file: {0}")]
    ReadFile(#[source] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(#[source] toml::de::Error),

    #[error("{0}")]
    Other(String),
}

/// Failure of an operation at a venue boundary.
///
/// Every fallible backend operation returns [`MarketResult<T>`] instead of
/// panicking or retrying internally. `can_retry` is advisory only: callers
/// decide retry policy, the error never retries itself.
#[derive(Error, Debug, Clone)]
#[error("{origin}: {message}")]
pub struct MarketError {
    /// Human-readable failure description.
    pub message: String,
    /// Whether re-attempting the identical call may succeed (timeouts,
    /// empty order book, rate limiting). Structural failures set `false`.
    pub can_retry: bool,
    /// Name of the venue or component that produced the failure.
    pub origin: String,
    /// Unparsed venue response payload, when one was received.
    pub raw: Option<serde_json::Value>,
}

impl MarketError {
    /// A transient failure that may succeed on a later attempt.
    pub fn retryable(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            can_retry: true,
            origin: origin.into(),
            raw: None,
        }
    }

    /// A structural failure; re-attempting the identical call is pointless.
    pub fn fatal(origin: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            can_retry: false,
            origin: origin.into(),
            raw: None,
        }
    }

    /// Attach the venue's raw response payload.
    #[must_use]
    pub fn with_raw(mut self, raw: serde_json::Value) -> Self {
        self.raw = Some(raw);
        self
    }
}

/// Result type for all venue-boundary operations.
pub type MarketResult<T> = std::result::Result<T, MarketError>;

/// Failures of a two-leg executor run.
///
/// `Unbalanced` is the one condition escalated above the ordinary result
/// discipline: the risky leg committed but the offsetting leg did not, so
/// the position is exposed on one venue. It is never retried automatically
/// because a retry could double-execute the offsetting trade.
#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error(transparent)]
    Market(#[from] MarketError),

    #[error(
        "UNBALANCED POSITION: {risky_venue} leg for {amount} {currency} committed \
         but {safer_venue} leg did not: {detail}"
    )]
    Unbalanced {
        /// Venue whose leg already committed.
        risky_venue: String,
        /// Venue whose offsetting leg is missing.
        safer_venue: String,
        /// Trading-currency amount now exposed.
        amount: Decimal,
        /// Trading currency code, for the operator alert.
        currency: &'static str,
        /// What went wrong on the safer leg.
        detail: String,
    },

    #[error("backend contract violation: {0}")]
    ContractViolation(String),
}

impl ExecutorError {
    /// True for the escalated post-commit inconsistency.
    #[must_use]
    pub const fn is_unbalanced(&self) -> bool {
        matches!(self, Self::Unbalanced { .. })
    }
}

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Market(#[from] MarketError),

    #[error(transparent)]
    Executor(#[from] ExecutorError),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<dialoguer::Error> for Error {
    fn from(err: dialoguer::Error) -> Self {
        // dialoguer::Error wraps an IO error
        Error::Io(std::io::Error::other(err.to_string()))
    }
}
