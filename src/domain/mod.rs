//! Venue-agnostic domain logic.

mod currency;
mod margin;
mod offer;
mod trade;

// Core domain types
pub use currency::{Amount, Btc, Currency, Eur, Price, Usd};
pub use offer::{Offer, OfferId, OfferSide};
pub use trade::UnifiedTrade;

// Margin calculator
pub use margin::{margin, margin_between};
