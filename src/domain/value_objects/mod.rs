//! Value Objects for the storefront

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};

/// SKU (Stock Keeping Unit) value object
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Sku(String);

impl Sku {
    pub fn new(value: impl Into<String>) -> Result<Self, SkuError> {
        let value = value.into().trim().to_uppercase();
        if value.is_empty() { return Err(SkuError::Empty); }
        if value.len() > 50 { return Err(SkuError::TooLong); }
        Ok(Self(value))
    }
    pub fn as_str(&self) -> &str { &self.0 }

    /// Case-insensitive substring match used by inventory search.
    pub fn contains_ignore_case(&self, needle: &str) -> bool {
        self.0.contains(&needle.to_uppercase())
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

impl TryFrom<String> for Sku {
    type Error = SkuError;
    fn try_from(value: String) -> Result<Self, Self::Error> { Sku::new(value) }
}

impl From<Sku> for String {
    fn from(sku: Sku) -> Self { sku.0 }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum SkuError { Empty, TooLong }
impl std::error::Error for SkuError {}
impl fmt::Display for SkuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self { Self::Empty => write!(f, "SKU empty"), Self::TooLong => write!(f, "SKU too long") }
    }
}

/// Traffic bucket in `0..=99`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Bucket(u8);

impl Bucket {
    pub const COUNT: u32 = 100;

    pub fn from_hash(hash: u32) -> Self { Self((hash % Self::COUNT) as u8) }
    pub fn value(&self) -> u8 { self.0 }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{}", self.0) }
}

/// Percentage in `0..=100`, used for traffic allocation and rollouts.
#[derive(Clone, Copy, Debug, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Percentage(f64);

impl Percentage {
    pub const ZERO: Percentage = Percentage(0.0);
    pub const FULL: Percentage = Percentage(100.0);

    pub fn new(value: f64) -> Result<Self, PercentageError> {
        if !value.is_finite() || !(0.0..=100.0).contains(&value) {
            return Err(PercentageError(value));
        }
        Ok(Self(value))
    }
    pub fn value(&self) -> f64 { self.0 }

    /// A bucket is admitted when it falls strictly below the percentage, so
    /// raising the percentage never drops a bucket that was admitted before.
    pub fn admits(&self, bucket: Bucket) -> bool { f64::from(bucket.value()) < self.0 }
}

impl Default for Percentage { fn default() -> Self { Self::FULL } }

impl TryFrom<f64> for Percentage {
    type Error = PercentageError;
    fn try_from(value: f64) -> Result<Self, Self::Error> { Percentage::new(value) }
}

impl From<Percentage> for f64 {
    fn from(p: Percentage) -> Self { p.0 }
}

#[derive(Debug, Clone, PartialEq)] pub struct PercentageError(pub f64);
impl std::error::Error for PercentageError {}
impl fmt::Display for PercentageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "percentage out of range: {}", self.0) }
}

/// Money value object. Amounts are rupees; on the wire they are plain JSON
/// numbers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(#[serde(with = "rust_decimal::serde::float")] Decimal);

impl Money {
    pub const ZERO: Money = Money(Decimal::ZERO);

    pub fn new(amount: Decimal) -> Self { Self(amount) }
    pub fn rupees(rupees: i64) -> Self { Self(Decimal::from(rupees)) }
    /// `Money::from_paise(44985)` is 449.85.
    pub fn from_paise(paise: i64) -> Self { Self(Decimal::new(paise, 2)) }
    pub fn amount(&self) -> Decimal { self.0 }
    pub fn is_positive(&self) -> bool { self.0 > Decimal::ZERO }

    /// True when the amount carries fractions of a paisa.
    pub fn has_sub_paise(&self) -> bool { self.0 != self.0.round_dp(2) }

    /// Multiplies by `factor`, rounding half away from zero to whole paise.
    pub fn scale(&self, factor: Decimal) -> Money {
        Money(self.0.saturating_mul(factor).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero))
    }
}

impl Add for Money {
    type Output = Money;
    fn add(self, other: Money) -> Money { Money(self.0.saturating_add(other.0)) }
}

impl Sub for Money {
    type Output = Money;
    fn sub(self, other: Money) -> Money { Money(self.0.saturating_sub(other.0)) }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Money { iter.fold(Money::ZERO, Add::add) }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:.2}", self.0) }
}
