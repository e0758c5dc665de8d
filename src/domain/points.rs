//! Exact decimal point values backed by rust_decimal.
//!
//! Ranking points, reward points, multipliers and currency amounts all flow
//! through this wrapper so nothing in the engine ever touches binary floats.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal as RustDecimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Exact decimal value for point and currency arithmetic.
///
/// Serializes to a JSON number (not a string) by default.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Points(#[serde(with = "rust_decimal::serde::float")] RustDecimal);

impl Points {
    pub fn new(value: RustDecimal) -> Self {
        Points(value)
    }

    /// Parse from a decimal string.
    ///
    /// # Errors
    /// Returns an error if the string is not a valid decimal number.
    pub fn from_str_canonical(s: &str) -> Result<Self, rust_decimal::Error> {
        RustDecimal::from_str(s).map(Points)
    }

    /// Whole-number constructor for base points and scores.
    pub fn from_int(value: i64) -> Self {
        Points(RustDecimal::from(value))
    }

    /// Format without exponent notation or trailing zeros.
    pub fn to_canonical_string(&self) -> String {
        format!("{}", self.0.normalize())
    }

    /// Presentation rounding: 2 decimal places, midpoint away from zero.
    ///
    /// Applied exactly once, at the end of a multiplier chain.
    pub fn round2(&self) -> Self {
        Points(
            self.0
                .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Intermediate rounding floor for currency normalization: 4 decimal
    /// places, midpoint away from zero. Never use fewer digits before the
    /// final `round2`.
    pub fn round4(&self) -> Self {
        Points(
            self.0
                .round_dp_with_strategy(4, RoundingStrategy::MidpointAwayFromZero),
        )
    }

    /// Exact integer hundredths, if this value has at most 2 decimal places.
    ///
    /// Ledger storage works in hundredths so SQL increments stay exact;
    /// callers must round first.
    pub fn to_cents(&self) -> Option<i64> {
        let scaled = (self.0 * RustDecimal::ONE_HUNDRED).normalize();
        if scaled.is_integer() {
            scaled.to_i64()
        } else {
            None
        }
    }

    /// Rebuild a value from integer hundredths.
    pub fn from_cents(cents: i64) -> Self {
        Points(RustDecimal::new(cents, 2))
    }

    pub fn inner(&self) -> RustDecimal {
        self.0
    }

    pub fn zero() -> Self {
        Points(RustDecimal::ZERO)
    }

    pub fn one() -> Self {
        Points(RustDecimal::ONE)
    }

    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    pub fn is_negative(&self) -> bool {
        !self.is_zero() && self.0.is_sign_negative()
    }
}

impl fmt::Display for Points {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_canonical_string())
    }
}

impl FromStr for Points {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_canonical(s)
    }
}

impl From<RustDecimal> for Points {
    fn from(value: RustDecimal) -> Self {
        Points(value)
    }
}

impl std::ops::Add for Points {
    type Output = Points;

    fn add(self, rhs: Points) -> Points {
        Points(self.0 + rhs.0)
    }
}

impl std::ops::Sub for Points {
    type Output = Points;

    fn sub(self, rhs: Points) -> Points {
        Points(self.0 - rhs.0)
    }
}

impl std::ops::Mul for Points {
    type Output = Points;

    fn mul(self, rhs: Points) -> Points {
        Points(self.0 * rhs.0)
    }
}

impl std::ops::Neg for Points {
    type Output = Points;

    fn neg(self) -> Points {
        Points(-self.0)
    }
}
