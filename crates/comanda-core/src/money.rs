//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Why Integer Money?
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  THE FLOATING POINT PROBLEM                                             │
//! │                                                                         │
//! │  In floating point:                                                     │
//! │    0.1 + 0.2 = 0.30000000000000004  ❌ WRONG!                           │
//! │                                                                         │
//! │  OUR SOLUTION: Integer Minor Units                                      │
//! │    Every subtotal, tax and payment amount is an i64 count of the        │
//! │    smallest currency unit. The database, calculations, and API all      │
//! │    use minor units; only the UI formats for display.                    │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use comanda_core::money::{Money, TaxRate};
//!
//! let price = Money::from_minor(285_000);
//! let line = price * 2;
//! assert_eq!(line.minor(), 570_000);
//!
//! // 11% of 765,000 = 84,150 exactly
//! let tax = Money::from_minor(765_000).calculate_tax(TaxRate::from_bps(1_100));
//! assert_eq!(tax.minor(), 84_150);
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Mul, Sub, SubAssign};

// =============================================================================
// Money Type
// =============================================================================

/// Represents a monetary value in the smallest currency unit.
///
/// ## Design Decisions
/// - **i64 (signed)**: Allows negative values for refunds and balance math
/// - **Single field tuple struct**: Zero-cost abstraction over i64
/// - **Derives**: Full serde support for JSON serialization
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Creates a Money value from minor units (the smallest currency unit).
    ///
    /// ## Example
    /// ```rust
    /// use comanda_core::money::Money;
    ///
    /// let price = Money::from_minor(285_000);
    /// assert_eq!(price.minor(), 285_000);
    /// ```
    #[inline]
    pub const fn from_minor(minor: i64) -> Self {
        Money(minor)
    }

    /// Returns the value in minor units.
    #[inline]
    pub const fn minor(&self) -> i64 {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(0)
    }

    /// Checks if the value is zero.
    #[inline]
    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    /// Checks if the value is positive (greater than zero).
    #[inline]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// Checks if the value is negative (less than zero).
    #[inline]
    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// Calculates tax for this amount at the given rate.
    ///
    /// ## Implementation
    /// Integer math with round-half-up: `(amount * bps + 5000) / 10000`.
    /// i128 intermediate prevents overflow on large amounts.
    ///
    /// ## Example
    /// ```rust
    /// use comanda_core::money::{Money, TaxRate};
    ///
    /// let subtotal = Money::from_minor(765_000);
    /// let rate = TaxRate::from_bps(1_100); // 11%
    /// assert_eq!(subtotal.calculate_tax(rate).minor(), 84_150);
    /// ```
    pub fn calculate_tax(&self, rate: TaxRate) -> Money {
        let tax = (self.0 as i128 * rate.bps() as i128 + 5_000) / 10_000;
        Money::from_minor(tax as i64)
    }

    /// Multiplies money by a quantity.
    ///
    /// ## Example
    /// ```rust
    /// use comanda_core::money::Money;
    ///
    /// let unit_price = Money::from_minor(195_000);
    /// assert_eq!(unit_price.multiply_quantity(3).minor(), 585_000);
    /// ```
    #[inline]
    pub const fn multiply_quantity(&self, qty: i64) -> Self {
        Money(self.0 * qty)
    }

    /// Saturating subtraction clamped at zero.
    ///
    /// Used for remaining-balance math where a negative remainder is
    /// meaningless.
    #[inline]
    pub fn saturating_remaining(&self, paid: Money) -> Money {
        Money((self.0 - paid.0).max(0))
    }
}

// =============================================================================
// Tax Rate
// =============================================================================

/// Tax rate represented in basis points (bps).
///
/// ## Why Basis Points?
/// 1 basis point = 0.01% = 1/10000
/// 1100 bps = 11% (the configured default)
///
/// The settings store carries the rate as a stringly-typed percentage;
/// parsing happens once at the policy layer and produces this type, so no
/// ad hoc float parsing leaks into call sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRate(u32);

impl TaxRate {
    /// Creates a tax rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        TaxRate(bps)
    }

    /// Creates a tax rate from a percentage (e.g. `11.0`).
    pub fn from_percentage(pct: f64) -> Self {
        TaxRate((pct * 100.0).round() as u32)
    }

    /// Parses a stringly-typed percentage from the settings store.
    ///
    /// Returns `None` on empty or unparseable input so the caller can fall
    /// back to the configured default instead of silently using zero.
    pub fn parse_percentage(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let pct: f64 = trimmed.parse().ok()?;
        if !pct.is_finite() || pct < 0.0 {
            return None;
        }
        Some(TaxRate::from_percentage(pct))
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }

    /// Zero tax rate.
    #[inline]
    pub const fn zero() -> Self {
        TaxRate(0)
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        TaxRate(crate::DEFAULT_TAX_RATE_BPS)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Display implementation shows the raw minor-unit count.
///
/// ## Note
/// This is for debugging and log lines. Use frontend formatting for actual
/// UI display to handle currency and localization properly.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Default money is zero.
impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        Money(self.0 * qty)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_minor() {
        let money = Money::from_minor(285_000);
        assert_eq!(money.minor(), 285_000);
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_minor(1_000);
        let b = Money::from_minor(500);

        assert_eq!((a + b).minor(), 1_500);
        assert_eq!((a - b).minor(), 500);
        assert_eq!((a * 3).minor(), 3_000);
    }

    #[test]
    fn test_tax_default_rate_is_eleven_percent() {
        let rate = TaxRate::default();
        assert_eq!(rate.bps(), 1_100);
        assert!((rate.percentage() - 11.0).abs() < 0.001);
    }

    /// The exact figures from the reference dine-in ticket:
    /// 2×285,000 + 1×195,000 at 11% tax.
    #[test]
    fn test_tax_calculation_reference_ticket() {
        let subtotal = Money::from_minor(285_000) * 2 + Money::from_minor(195_000);
        assert_eq!(subtotal.minor(), 765_000);

        let tax = subtotal.calculate_tax(TaxRate::from_bps(1_100));
        assert_eq!(tax.minor(), 84_150);

        let total = subtotal + tax;
        assert_eq!(total.minor(), 849_150);
    }

    #[test]
    fn test_tax_calculation_with_rounding() {
        // 1,005 at 11% = 110.55 → rounds up to 111
        let amount = Money::from_minor(1_005);
        let tax = amount.calculate_tax(TaxRate::from_bps(1_100));
        assert_eq!(tax.minor(), 111);
    }

    #[test]
    fn test_parse_percentage() {
        assert_eq!(TaxRate::parse_percentage("11").unwrap().bps(), 1_100);
        assert_eq!(TaxRate::parse_percentage(" 8.25 ").unwrap().bps(), 825);
        assert_eq!(TaxRate::parse_percentage("0").unwrap().bps(), 0);

        assert!(TaxRate::parse_percentage("").is_none());
        assert!(TaxRate::parse_percentage("eleven").is_none());
        assert!(TaxRate::parse_percentage("-2").is_none());
        assert!(TaxRate::parse_percentage("NaN").is_none());
    }

    #[test]
    fn test_saturating_remaining() {
        let total = Money::from_minor(849_150);
        assert_eq!(
            total.saturating_remaining(Money::from_minor(800_000)).minor(),
            49_150
        );
        assert_eq!(
            total.saturating_remaining(Money::from_minor(900_000)).minor(),
            0
        );
    }

    #[test]
    fn test_zero_and_checks() {
        let zero = Money::zero();
        assert!(zero.is_zero());
        assert!(!zero.is_positive());
        assert!(!zero.is_negative());

        assert!(Money::from_minor(100).is_positive());
        assert!(Money::from_minor(-100).is_negative());
    }
}
