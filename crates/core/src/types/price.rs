//! Integer price representation in minor currency units.
//!
//! Catalog prices, cart snapshots and order totals are all integers, so
//! sums never drift. Decimal arithmetic is only used to format a price for
//! display.

use core::fmt;
use core::iter::Sum;
use core::ops::{Add, AddAssign, Sub};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Number of minor units per major unit (paise per rupee).
const MINOR_UNIT_SCALE: u32 = 2;

/// A price in minor currency units.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Price(i64);

impl Price {
    /// The zero amount.
    pub const ZERO: Self = Self(0);

    /// Create a price from an amount in minor units.
    #[must_use]
    pub const fn from_minor(amount: i64) -> Self {
        Self(amount)
    }

    /// Amount in minor units.
    #[must_use]
    pub const fn minor_units(&self) -> i64 {
        self.0
    }

    /// Whether the amount is strictly greater than zero.
    #[must_use]
    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    /// This price multiplied by a quantity, saturating at the bounds of
    /// the representation.
    #[must_use]
    pub fn times(self, quantity: u32) -> Self {
        Self(self.0.saturating_mul(i64::from(quantity)))
    }

    /// This price multiplied by a quantity, or `None` on overflow.
    #[must_use]
    pub fn checked_times(self, quantity: u32) -> Option<Self> {
        self.0.checked_mul(i64::from(quantity)).map(Self)
    }

    /// Sum of two prices, or `None` on overflow.
    #[must_use]
    pub fn checked_add(self, rhs: Self) -> Option<Self> {
        self.0.checked_add(rhs.0).map(Self)
    }

    /// Amount in major units as an exact decimal.
    #[must_use]
    pub fn to_decimal(&self) -> Decimal {
        Decimal::new(self.0, MINOR_UNIT_SCALE)
    }

    /// Format for display in the store currency, e.g. `₹1,24,999.00`.
    #[must_use]
    pub fn display(&self) -> String {
        let formatted = format!("{:.2}", self.to_decimal().abs());
        let (whole, fraction) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));
        let sign = if self.0 < 0 { "-" } else { "" };
        format!(
            "{sign}{}{}.{fraction}",
            CurrencyCode::INR.symbol(),
            group_digits(whole)
        )
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display())
    }
}

// Operators saturate; callers that must reject overflow use the
// `checked_*` methods.
impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self {
        Self(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for Price {
    fn add_assign(&mut self, rhs: Self) {
        *self = *self + rhs;
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self {
        Self(self.0.saturating_sub(rhs.0))
    }
}

impl Sum for Price {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

/// ISO 4217 currency codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CurrencyCode {
    #[default]
    INR,
}

impl CurrencyCode {
    /// Currency symbol used for display.
    #[must_use]
    pub const fn symbol(&self) -> &'static str {
        match self {
            Self::INR => "\u{20b9}",
        }
    }
}

/// Group the integer part the en-IN way: last three digits, then pairs.
fn group_digits(whole: &str) -> String {
    if whole.len() <= 3 {
        return whole.to_string();
    }

    let (head, tail) = whole.split_at(whole.len() - 3);
    let mut groups: Vec<&str> = Vec::new();
    let mut rest = head;
    while rest.len() > 2 {
        let (left, right) = rest.split_at(rest.len() - 2);
        groups.push(right);
        rest = left;
    }
    if !rest.is_empty() {
        groups.push(rest);
    }
    groups.reverse();

    format!("{},{tail}", groups.join(","))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_small_amounts() {
        assert_eq!(Price::from_minor(0).display(), "\u{20b9}0.00");
        assert_eq!(Price::from_minor(500).display(), "\u{20b9}5.00");
        assert_eq!(Price::from_minor(9900).display(), "\u{20b9}99.00");
    }

    #[test]
    fn test_display_groups_like_en_in() {
        assert_eq!(Price::from_minor(123_456).display(), "\u{20b9}1,234.56");
        assert_eq!(Price::from_minor(12_499_900).display(), "\u{20b9}1,24,999.00");
        assert_eq!(
            Price::from_minor(1_234_567_800).display(),
            "\u{20b9}1,23,45,678.00"
        );
    }

    #[test]
    fn test_display_negative() {
        assert_eq!(Price::from_minor(-150).display(), "-\u{20b9}1.50");
    }

    #[test]
    fn test_times_and_sum() {
        let total: Price = [Price::from_minor(500).times(2), Price::from_minor(800)]
            .into_iter()
            .sum();
        assert_eq!(total, Price::from_minor(1800));
    }

    #[test]
    fn test_checked_arithmetic_reports_overflow() {
        let price = Price::from_minor(69_900);
        assert_eq!(price.checked_times(3), Some(Price::from_minor(209_700)));
        assert_eq!(Price::from_minor(i64::MAX / 2).checked_times(u32::MAX), None);
        assert_eq!(
            price.checked_add(Price::from_minor(100)),
            Some(Price::from_minor(70_000))
        );
        assert_eq!(Price::from_minor(i64::MAX).checked_add(price), None);
    }

    #[test]
    fn test_operators_saturate_instead_of_panicking() {
        let huge = Price::from_minor(i64::MAX / 2).times(u32::MAX);
        assert_eq!(huge, Price::from_minor(i64::MAX));
        assert_eq!(huge + Price::from_minor(1), Price::from_minor(i64::MAX));

        let total: Price = [huge, huge, Price::from_minor(500)].into_iter().sum();
        assert_eq!(total, Price::from_minor(i64::MAX));
        assert_eq!(
            Price::from_minor(i64::MIN) - Price::from_minor(1),
            Price::from_minor(i64::MIN)
        );
    }

    #[test]
    fn test_serializes_as_integer() {
        assert_eq!(
            serde_json::to_string(&Price::from_minor(500)).ok(),
            Some("500".to_string())
        );
    }
}
