// idis-core/src/core/decimal.rs
// ============================================================================
// Module: IDIS Decimal Values
// Description: Exact decimal arithmetic wrapper for all financial values.
// Purpose: Keep floating point out of every calculation and hash path.
// Dependencies: bigdecimal, serde
// ============================================================================

//! ## Overview
//! All monetary and ratio arithmetic in IDIS runs on [`Dec`], a thin wrapper
//! over `BigDecimal`. Values serialize as quoted strings so canonical JSON
//! hashing never sees a binary floating-point representation. Quantization
//! uses half-up rounding to a fixed number of fractional digits, matching the
//! output-precision contract of the calc engine.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::fmt;
use std::ops::Add;
use std::ops::Mul;
use std::ops::Sub;
use std::str::FromStr;

use bigdecimal::BigDecimal;
use bigdecimal::RoundingMode;
use bigdecimal::Zero;
use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use thiserror::Error;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when parsing or operating on decimal values.
#[derive(Debug, Error)]
pub enum DecimalError {
    /// The input string is not a valid decimal literal.
    #[error("invalid decimal literal: {0}")]
    Invalid(String),
    /// Division by zero attempted.
    #[error("division by zero")]
    DivisionByZero,
}

// ============================================================================
// SECTION: Decimal Value
// ============================================================================

/// Exact decimal value used for all IDIS arithmetic.
///
/// # Invariants
/// - Serializes as a quoted string in plain decimal notation.
/// - Never constructed from a binary floating-point value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dec(BigDecimal);

impl Dec {
    /// Parses a decimal from its string literal.
    ///
    /// # Errors
    ///
    /// Returns [`DecimalError::Invalid`] when the literal does not parse.
    pub fn parse(text: &str) -> Result<Self, DecimalError> {
        BigDecimal::from_str(text.trim())
            .map(Self)
            .map_err(|_| DecimalError::Invalid(text.to_string()))
    }

    /// Builds a decimal from a signed integer.
    #[must_use]
    pub fn from_i64(value: i64) -> Self {
        Self(BigDecimal::from(value))
    }

    /// Returns zero.
    #[must_use]
    pub fn zero() -> Self {
        Self(BigDecimal::zero())
    }

    /// Returns true when the value equals zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Returns the absolute value.
    #[must_use]
    pub fn abs(&self) -> Self {
        Self(self.0.abs())
    }

    /// Quantizes to `digits` fractional digits with half-up rounding.
    #[must_use]
    pub fn quantize(&self, digits: u32) -> Self {
        Self(self.0.with_scale_round(i64::from(digits), RoundingMode::HalfUp))
    }

    /// Divides by `other`, returning `None` on a zero divisor.
    #[must_use]
    pub fn checked_div(&self, other: &Self) -> Option<Self> {
        if other.is_zero() {
            return None;
        }
        Some(Self(&self.0 / &other.0))
    }

    /// Returns the underlying `BigDecimal`.
    #[must_use]
    pub const fn inner(&self) -> &BigDecimal {
        &self.0
    }
}

impl fmt::Display for Dec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Dec {
    type Err = DecimalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl PartialOrd for Dec {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Dec {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

impl Add for &Dec {
    type Output = Dec;

    fn add(self, rhs: &Dec) -> Dec {
        Dec(&self.0 + &rhs.0)
    }
}

impl Sub for &Dec {
    type Output = Dec;

    fn sub(self, rhs: &Dec) -> Dec {
        Dec(&self.0 - &rhs.0)
    }
}

impl Mul for &Dec {
    type Output = Dec;

    fn mul(self, rhs: &Dec) -> Dec {
        Dec(&self.0 * &rhs.0)
    }
}

// ============================================================================
// SECTION: Serde
// ============================================================================

impl Serialize for Dec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Dec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}
