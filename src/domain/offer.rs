//! Concrete fillable offers fetched from a venue's order book.

use chrono::{DateTime, Utc};

use super::{Amount, Currency, Price};

/// Venue-assigned identifier of an open order backing an offer.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OfferId(pub String);

impl OfferId {
    /// Create a new OfferId.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the underlying ID string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for OfferId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which side of the book an offer (or market order) is on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OfferSide {
    /// Acquire trading currency for base currency.
    Buy,
    /// Give up trading currency for base currency.
    Sell,
}

impl OfferSide {
    /// The other side of the book.
    #[must_use]
    pub const fn opposite(self) -> Self {
        match self {
            Self::Buy => Self::Sell,
            Self::Sell => Self::Buy,
        }
    }
}

/// A point-in-time quote from a venue's order book.
///
/// Immutable once returned; consumed within one scan/trade cycle and then
/// discarded. Prices do not include fees; apply the owning backend's
/// effective-price transforms before comparing across venues.
#[derive(Debug, Clone)]
pub struct Offer<T: Currency, B: Currency> {
    /// The venue's identifier for the backing order.
    pub id: OfferId,
    /// Side of the book this offer sits on.
    pub side: OfferSide,
    /// Smallest fillable trading-currency amount.
    pub min_amount: Amount<T>,
    /// Largest fillable trading-currency amount.
    pub max_amount: Amount<T>,
    /// Quoted price, fees not included.
    pub price: Price<T, B>,
    /// When the venue reported this offer.
    pub timestamp: DateTime<Utc>,
}

impl<T: Currency, B: Currency> Offer<T, B> {
    /// True if `amount` is within this offer's fillable bounds.
    #[must_use]
    pub fn accepts(&self, amount: Amount<T>) -> bool {
        amount >= self.min_amount && amount <= self.max_amount
    }
}
