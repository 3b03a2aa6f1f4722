//! Numeric literal semantics: integer bounds and fixed-point decimals.
//!
//! Integers are arbitrary precision but only values in `[MIN_INT256, MAX_UINT256]`
//! are representable. Decimals carry exactly [`DECIMAL_PLACES`] fractional digits
//! and are stored as a scaled integer.

use core::fmt;
use std::{
    fmt::{Display, Formatter},
    str::FromStr,
};

use num_bigint::BigInt;
use num_traits::{One, Signed, Zero};
use thiserror::Error;

pub const DECIMAL_PLACES: u32 = 10;

#[must_use]
pub fn min_int256() -> BigInt {
    -(BigInt::one() << 255u32)
}

#[must_use]
pub fn max_uint256() -> BigInt {
    (BigInt::one() << 256) - 1
}

#[must_use]
pub fn int_in_range(value: &BigInt) -> bool {
    *value >= min_int256() && *value <= max_uint256()
}

fn decimal_divisor() -> BigInt {
    BigInt::from(10).pow(DECIMAL_PLACES)
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecimalParseError {
    #[error("`{0}` is not a decimal literal")]
    Invalid(String),
    #[error("`{0}` has more than {DECIMAL_PLACES} decimal places")]
    TooPrecise(String),
}

/// Fixed-point decimal with [`DECIMAL_PLACES`] digits after the point.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Debug)]
pub struct Decimal(BigInt);

impl Decimal {
    #[must_use]
    pub fn from_scaled(scaled: BigInt) -> Self {
        Self(scaled)
    }

    #[must_use]
    pub fn from_int(value: &BigInt) -> Self {
        Self(value * decimal_divisor())
    }

    /// The value multiplied by `10^DECIMAL_PLACES`.
    #[must_use]
    pub fn scaled(&self) -> &BigInt {
        &self.0
    }

    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// `-2^167 / 10^10 <= value <= (2^167 - 1) / 10^10`
    #[must_use]
    pub fn is_in_range(&self) -> bool {
        let bound: BigInt = BigInt::one() << 167;
        self.0 >= -bound.clone() && self.0 < bound
    }

    #[must_use]
    pub fn add(&self, other: &Decimal) -> Decimal {
        Decimal(&self.0 + &other.0)
    }

    #[must_use]
    pub fn sub(&self, other: &Decimal) -> Decimal {
        Decimal(&self.0 - &other.0)
    }

    #[must_use]
    pub fn neg(&self) -> Decimal {
        Decimal(-&self.0)
    }

    /// Product truncated toward zero to `DECIMAL_PLACES` digits.
    #[must_use]
    pub fn mul(&self, other: &Decimal) -> Decimal {
        Decimal(&self.0 * &other.0 / decimal_divisor())
    }

    /// Quotient truncated toward zero, `None` when dividing by zero.
    #[must_use]
    pub fn checked_div(&self, other: &Decimal) -> Option<Decimal> {
        if other.is_zero() {
            return None;
        }
        Some(Decimal(&self.0 * decimal_divisor() / &other.0))
    }

    /// Remainder with the sign of the dividend, `None` when dividing by zero.
    #[must_use]
    pub fn checked_rem(&self, other: &Decimal) -> Option<Decimal> {
        if other.is_zero() {
            return None;
        }
        Some(Decimal(&self.0 % &other.0))
    }
}

impl FromStr for Decimal {
    type Err = DecimalParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DecimalParseError::Invalid(s.to_string());
        let text = s.trim();
        let (negative, digits) = match text.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, text.strip_prefix('+').unwrap_or(text)),
        };
        let (whole, fraction) = digits.split_once('.').unwrap_or((digits, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if !whole.chars().chain(fraction.chars()).all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }
        if fraction.len() > DECIMAL_PLACES as usize {
            return Err(DecimalParseError::TooPrecise(s.to_string()));
        }
        let padded = format!("{whole}{fraction:0<width$}", width = DECIMAL_PLACES as usize);
        let magnitude = BigInt::from_str(&padded).map_err(|_| invalid())?;
        Ok(Decimal(if negative { -magnitude } else { magnitude }))
    }
}

impl Display for Decimal {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let divisor = decimal_divisor();
        let magnitude = self.0.abs();
        let whole = &magnitude / &divisor;
        let fraction = format!(
            "{:0>width$}",
            (&magnitude % &divisor).to_string(),
            width = DECIMAL_PLACES as usize
        );
        let fraction = fraction.trim_end_matches('0');
        let sign = if self.0.is_negative() { "-" } else { "" };
        if fraction.is_empty() {
            write!(f, "{sign}{whole}.0")
        } else {
            write!(f, "{sign}{whole}.{fraction}")
        }
    }
}
