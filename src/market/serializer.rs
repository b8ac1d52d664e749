//! Per-backend request serialization and nonce discipline.
//!
//! Venues reject authenticated requests whose nonce did not strictly
//! increase relative to the previous accepted request from the same
//! credentials. Concurrent in-flight requests from one process can race and
//! hand the venue out-of-order nonces, which shows up as spurious
//! authentication failures. The serializer closes that hole: one mutex and
//! one nonce counter per backend instance.

use std::future::Future;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tokio::sync::Mutex;

use crate::error::{MarketError, MarketResult};

/// A strictly increasing value attached to every authenticated request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Nonce(u64);

impl Nonce {
    /// The numeric nonce value, ready for a request header.
    #[must_use]
    pub const fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Nonce {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Generates strictly monotonic nonces from the millisecond clock.
///
/// Two calls landing in the same millisecond get the timestamp plus an
/// intra-millisecond counter in a fixed four-digit field, so the sequence
/// stays strictly increasing up to 1000 calls per millisecond.
#[derive(Debug, Default)]
pub struct Noncer {
    last_ms: u64,
    counter: u64,
}

impl Noncer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Generate the next nonce from the system clock.
    pub fn generate(&mut self) -> Nonce {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        self.tick(now_ms)
    }

    fn tick(&mut self, now_ms: u64) -> Nonce {
        // A backwards clock step must not regress the sequence.
        let now = now_ms.max(self.last_ms);
        self.counter = if now == self.last_ms {
            self.counter + 1
        } else {
            0
        };
        self.last_ms = now;
        Nonce(now * 10_000 + self.counter)
    }
}

/// Serializes all authenticated calls against one backend instance.
///
/// Guarantees:
///
/// - at most one in-flight request per backend at a time;
/// - nonces observed by the venue are strictly monotonic;
/// - the lock is released on every exit path, including timeout and error
///   returns (the guard is scoped to [`RequestSerializer::call`]).
pub struct RequestSerializer {
    venue: String,
    timeout: Duration,
    noncer: Mutex<Noncer>,
}

impl RequestSerializer {
    /// Venue timeout applied when none is configured.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

    #[must_use]
    pub fn new(venue: impl Into<String>, timeout: Duration) -> Self {
        Self {
            venue: venue.into(),
            timeout,
            noncer: Mutex::new(Noncer::new()),
        }
    }

    #[must_use]
    pub fn with_default_timeout(venue: impl Into<String>) -> Self {
        Self::new(venue, Self::DEFAULT_TIMEOUT)
    }

    /// The venue name this serializer is tagged with.
    #[must_use]
    pub fn venue(&self) -> &str {
        &self.venue
    }

    /// Run one authenticated request under the lock.
    ///
    /// `f` receives the nonce for this request and performs the actual
    /// transport call. The request is bounded by the venue timeout; on
    /// expiry the call surfaces a retryable failure instead of hanging,
    /// and the lock is released either way.
    pub async fn call<T, F, Fut>(&self, f: F) -> MarketResult<T>
    where
        F: FnOnce(Nonce) -> Fut + Send,
        Fut: Future<Output = MarketResult<T>> + Send,
    {
        let mut noncer = self.noncer.lock().await;
        let nonce = noncer.generate();

        match tokio::time::timeout(self.timeout, f(nonce)).await {
            Ok(result) => result,
            Err(_) => Err(MarketError::retryable(
                &self.venue,
                format!("request timed out after {}s", self.timeout.as_secs()),
            )),
        }
    }
}
