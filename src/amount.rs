use std::fmt;
use std::ops::Neg;
use std::str::FromStr;

use rust_decimal::Decimal;
use thiserror::Error;

/// Exact decimal amount.
///
/// Precision is bounded by a 96-bit mantissa. Sums that cannot be held
/// exactly are refused with [`AmountOverflow`] instead of being rounded, and
/// parsing refuses input that would round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Amount(Decimal);

/// Error returned when a sum does not fit an [`Amount`] exactly.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("{lhs} + {rhs} cannot be represented exactly")]
pub struct AmountOverflow {
    pub lhs: Amount,
    pub rhs: Amount,
}

/// Error returned when a string is not a valid decimal amount.
#[derive(Debug, Error)]
#[error("invalid amount '{input}': {source}")]
pub struct AmountParseError {
    input: String,
    source: rust_decimal::Error,
}

impl Amount {
    pub const ZERO: Amount = Amount(Decimal::ZERO);

    /// Build an amount from a mantissa and a number of decimal places,
    /// e.g. `Amount::new(23, 1)` is `2.3`.
    pub fn new(mantissa: i64, scale: u32) -> Self {
        Amount(Decimal::new(mantissa, scale))
    }

    /// Strictly greater than zero.
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Strictly less than zero.
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    pub fn abs(&self) -> Self {
        Amount(self.0.abs())
    }

    /// Exact sum, or [`AmountOverflow`] when it would overflow or round.
    pub fn checked_add(self, rhs: Amount) -> Result<Amount, AmountOverflow> {
        exact_sum(self.0, rhs.0)
            .or_else(|| exact_sum(self.0.normalize(), rhs.0.normalize()))
            .map(Amount)
            .ok_or(AmountOverflow { lhs: self, rhs })
    }

    pub fn checked_sub(self, rhs: Amount) -> Result<Amount, AmountOverflow> {
        self.checked_add(-rhs)
    }

    /// Exact sum of every amount, starting from zero.
    pub fn checked_sum(
        amounts: impl IntoIterator<Item = Amount>,
    ) -> Result<Amount, AmountOverflow> {
        amounts
            .into_iter()
            .try_fold(Amount::ZERO, |acc, amount| acc.checked_add(amount))
    }
}

// rust_decimal drops fractional digits when the mantissa runs out; a result
// at a coarser scale than its operands has been rounded.
fn exact_sum(lhs: Decimal, rhs: Decimal) -> Option<Decimal> {
    lhs.checked_add(rhs)
        .filter(|sum| sum.scale() >= lhs.scale().max(rhs.scale()))
}

impl From<Decimal> for Amount {
    fn from(value: Decimal) -> Self {
        Amount(value)
    }
}

impl FromStr for Amount {
    type Err = AmountParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Decimal::from_str_exact(s.trim())
            .map(Amount)
            .map_err(|source| AmountParseError {
                input: s.to_string(),
                source,
            })
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Neg for Amount {
    type Output = Self;

    fn neg(self) -> Self::Output {
        Amount(-self.0)
    }
}
