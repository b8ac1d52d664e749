//! Unified trade records translated from venue-specific history entries.

use std::iter::Sum;
use std::ops::Add;

use super::{Amount, Currency, Price};

/// A single settled trade, normalized across venues.
///
/// Signed so that a positive `trading_amount` means this unit acquired
/// trading currency, and a positive `base_amount` means it received base
/// currency. A buy therefore carries a positive trading amount and a
/// negative base amount net of fees.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnifiedTrade<T: Currency, B: Currency> {
    /// Trading currency actually received (negative when sold).
    pub trading_amount: Amount<T>,
    /// Base currency actually received (negative when spent), fees deducted.
    pub base_amount: Amount<B>,
    /// Fees paid, expressed in base currency.
    pub fee_in_base: Amount<B>,
}

impl<T: Currency, B: Currency> UnifiedTrade<T, B> {
    /// The record of no trading activity; identity for aggregation.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            trading_amount: Amount::zero(),
            base_amount: Amount::zero(),
            fee_in_base: Amount::zero(),
        }
    }

    /// Value the net position at `reference`, in base currency.
    ///
    /// `trading_amount * reference + base_amount`: what the aggregated
    /// activity is worth if the remaining trading-currency delta were
    /// liquidated at the reference price.
    #[must_use]
    pub fn estimated_profit(&self, reference: Price<T, B>) -> Amount<B> {
        reference.cost_of(self.trading_amount) + self.base_amount
    }
}

impl<T: Currency, B: Currency> Default for UnifiedTrade<T, B> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: Currency, B: Currency> Add for UnifiedTrade<T, B> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self {
            trading_amount: self.trading_amount + rhs.trading_amount,
            base_amount: self.base_amount + rhs.base_amount,
            fee_in_base: self.fee_in_base + rhs.fee_in_base,
        }
    }
}

impl<T: Currency, B: Currency> Sum for UnifiedTrade<T, B> {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::empty(), Add::add)
    }
}
