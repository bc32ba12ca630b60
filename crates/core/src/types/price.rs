//! Type-safe price representation.
//!
//! Prices are Kenyan shillings stored as integer cents. Decimal arithmetic
//! is used only for parsing user input and for display, so a `Price` can be
//! persisted as a plain `INTEGER` column and compared exactly.

use core::fmt;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

/// Errors that can occur when parsing a [`Price`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PriceError {
    /// The input string is empty.
    #[error("price cannot be empty")]
    Empty,
    /// The input is not a decimal number.
    #[error("price is not a valid number")]
    Invalid,
    /// Negative prices are not allowed.
    #[error("price cannot be negative")]
    Negative,
    /// The value does not fit in the cents representation.
    #[error("price is too large")]
    Overflow,
}

/// A price in Kenyan shillings, held as integer cents.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// A price of zero.
    pub const ZERO: Self = Self(0);

    /// Create a price from integer cents.
    #[must_use]
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Create a price from whole shillings.
    #[must_use]
    pub const fn from_shillings(shillings: i64) -> Self {
        Self(shillings * 100)
    }

    /// The price in integer cents (the storage representation).
    #[must_use]
    pub const fn as_cents(&self) -> i64 {
        self.0
    }

    /// The price as a decimal amount of shillings.
    #[must_use]
    pub fn amount(&self) -> Decimal {
        Decimal::new(self.0, 2)
    }

    /// Whether this price is exactly zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// The price truncated to whole shillings.
    ///
    /// The M-PESA API wants the amount as a whole-shilling integer string;
    /// fractional cents are dropped, not rounded.
    #[must_use]
    pub const fn whole_shillings(&self) -> i64 {
        self.0 / 100
    }

    /// Multiply by a quantity, saturating on overflow.
    #[must_use]
    pub fn saturating_mul(&self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(i64::from(quantity)))
    }

    /// Add another price, saturating on overflow.
    #[must_use]
    pub const fn saturating_add(&self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Parse a price from user input such as `"85000"` or `"1234.50"`.
    ///
    /// # Errors
    ///
    /// Returns a [`PriceError`] if the input is empty, not a decimal number,
    /// negative, or too large to represent.
    pub fn parse(s: &str) -> Result<Self, PriceError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PriceError::Empty);
        }
        let amount: Decimal = s.parse().map_err(|_| PriceError::Invalid)?;
        if amount.is_sign_negative() {
            return Err(PriceError::Negative);
        }
        let cents = (amount * Decimal::ONE_HUNDRED).trunc();
        cents.to_i64().map(Self).ok_or(PriceError::Overflow)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "KSh {:.2}", self.amount())
    }
}

impl std::str::FromStr for Price {
    type Err = PriceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_shillings() {
        assert_eq!(Price::from_shillings(85_000).as_cents(), 8_500_000);
    }

    #[test]
    fn test_parse_whole() {
        assert_eq!(Price::parse("85000").unwrap(), Price::from_shillings(85_000));
    }

    #[test]
    fn test_parse_fractional() {
        assert_eq!(Price::parse("1234.50").unwrap().as_cents(), 123_450);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        assert_eq!(Price::parse(" 10 ").unwrap(), Price::from_shillings(10));
    }

    #[test]
    fn test_parse_empty() {
        assert_eq!(Price::parse(""), Err(PriceError::Empty));
        assert_eq!(Price::parse("   "), Err(PriceError::Empty));
    }

    #[test]
    fn test_parse_invalid() {
        assert_eq!(Price::parse("abc"), Err(PriceError::Invalid));
    }

    #[test]
    fn test_parse_negative() {
        assert_eq!(Price::parse("-5"), Err(PriceError::Negative));
    }

    #[test]
    fn test_whole_shillings_truncates() {
        assert_eq!(Price::from_cents(123_450).whole_shillings(), 1_234);
    }

    #[test]
    fn test_saturating_mul() {
        let unit = Price::from_shillings(5_000);
        assert_eq!(unit.saturating_mul(3), Price::from_shillings(15_000));
        assert_eq!(Price::from_cents(i64::MAX).saturating_mul(2).as_cents(), i64::MAX);
    }

    #[test]
    fn test_display() {
        assert_eq!(Price::from_shillings(85_000).to_string(), "KSh 85000.00");
        assert_eq!(Price::from_cents(123_450).to_string(), "KSh 1234.50");
    }

    #[test]
    fn test_zero() {
        assert!(Price::ZERO.is_zero());
        assert!(!Price::from_cents(1).is_zero());
    }
}
