//! Market backend abstraction and supporting machinery.
//!
//! A backend is one trading venue's implementation of the
//! [`MarketBackend`] capability. Per-venue HTTP clients live outside this
//! crate; they plug in by implementing the trait and funnelling their
//! authenticated calls through a [`RequestSerializer`].

mod factory;
mod serializer;
mod simulated;
mod traits;

pub use factory::build_venues;
pub use serializer::{Nonce, Noncer, RequestSerializer};
pub use simulated::{SimulatedConfig, SimulatedMarket};
pub use traits::MarketBackend;
