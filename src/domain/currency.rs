//! Currency-tagged monetary types.
//!
//! Amounts and prices carry their currency as a zero-sized type parameter,
//! so arithmetic is only defined between matching tags and mixing EUR with
//! BTC is a compile error rather than a runtime surprise. All values are
//! [`Decimal`]; never floats.

use std::fmt;
use std::iter::Sum;
use std::marker::PhantomData;
use std::ops::{Add, Mul, Neg, Sub};

use rust_decimal::Decimal;

/// A currency usable as a tag on [`Amount`] and [`Price`].
///
/// The supertraits let tagged types derive comparison and formatting
/// behaviour without per-use-site bounds.
pub trait Currency:
    Copy + fmt::Debug + PartialEq + Eq + PartialOrd + Ord + std::hash::Hash + Send + Sync + 'static
{
    /// ISO-ish currency code, e.g. `"BTC"`.
    const CODE: &'static str;
}

/// Bitcoin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Btc;

/// Euro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Eur;

/// US dollar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Usd;

impl Currency for Btc {
    const CODE: &'static str = "BTC";
}

impl Currency for Eur {
    const CODE: &'static str = "EUR";
}

impl Currency for Usd {
    const CODE: &'static str = "USD";
}

/// A signed quantity of a single currency.
///
/// Negative amounts are legal: unified trade records are signed so that a
/// positive trading amount means the unit acquired currency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Amount<C: Currency> {
    value: Decimal,
    _currency: PhantomData<C>,
}

impl<C: Currency> Amount<C> {
    /// Wrap a decimal value in this currency.
    #[must_use]
    pub const fn new(value: Decimal) -> Self {
        Self {
            value,
            _currency: PhantomData,
        }
    }

    /// The zero amount.
    #[must_use]
    pub const fn zero() -> Self {
        Self::new(Decimal::ZERO)
    }

    /// The underlying decimal value.
    #[must_use]
    pub const fn value(&self) -> Decimal {
        self.value
    }

    /// The currency code of this amount.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        C::CODE
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.value.is_zero()
    }

    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.value > Decimal::ZERO
    }

    /// The smaller of two amounts.
    #[must_use]
    pub fn min(self, other: Self) -> Self {
        if other.value < self.value {
            other
        } else {
            self
        }
    }
}

impl<C: Currency> Add for Amount<C> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self::new(self.value + rhs.value)
    }
}

impl<C: Currency> Sub for Amount<C> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self::new(self.value - rhs.value)
    }
}

impl<C: Currency> Neg for Amount<C> {
    type Output = Self;

    fn neg(self) -> Self {
        Self::new(-self.value)
    }
}

/// Scaling by a dimensionless factor keeps the tag.
impl<C: Currency> Mul<Decimal> for Amount<C> {
    type Output = Self;

    fn mul(self, factor: Decimal) -> Self {
        Self::new(self.value * factor)
    }
}

impl<C: Currency> Sum for Amount<C> {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::zero(), Add::add)
    }
}

impl<C: Currency> fmt::Display for Amount<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.value, C::CODE)
    }
}

/// A price quoted in base currency per one unit of trading currency.
///
/// Prices are strictly positive; [`Price::new`] rejects anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Price<T: Currency, B: Currency> {
    value: Decimal,
    _pair: PhantomData<(T, B)>,
}

impl<T: Currency, B: Currency> Price<T, B> {
    /// Wrap a strictly positive decimal price.
    #[must_use]
    pub fn new(value: Decimal) -> Option<Self> {
        if value > Decimal::ZERO {
            Some(Self {
                value,
                _pair: PhantomData,
            })
        } else {
            None
        }
    }

    /// The underlying decimal value (base per trading unit).
    #[must_use]
    pub const fn value(&self) -> Decimal {
        self.value
    }

    /// Cost in base currency of acquiring `amount` at this price.
    #[must_use]
    pub fn cost_of(&self, amount: Amount<T>) -> Amount<B> {
        Amount::new(amount.value() * self.value)
    }

    /// Trading-currency volume purchasable with `funds` at this price.
    #[must_use]
    pub fn affordable_with(&self, funds: Amount<B>) -> Amount<T> {
        Amount::new(funds.value() / self.value)
    }

    /// Scale by a positive factor, e.g. a fee multiplier.
    ///
    /// The factor must keep the price positive; fee rates are validated at
    /// configuration time to stay below 1.
    #[must_use]
    pub fn scaled(&self, factor: Decimal) -> Self {
        debug_assert!(factor > Decimal::ZERO);
        Self {
            value: self.value * factor,
            _pair: PhantomData,
        }
    }
}

impl<T: Currency, B: Currency> fmt::Display for Price<T, B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}/{}", self.value, B::CODE, T::CODE)
    }
}
