// idis-core/src/core/value_struct.rs
// ============================================================================
// Module: IDIS Value Structs
// Description: Typed value containers for extracted claim values.
// Purpose: Represent monetary, percentage, count, date, range, and text values.
// Dependencies: serde, bigdecimal, time
// ============================================================================

//! ## Overview
//! A [`ValueStruct`] is the typed payload of a claim: a monetary amount, a
//! percentage, a count, a date, a bounded range, or free text with semantic
//! tags. Variants form a closed set with a `type` discriminator tag; parsing
//! validates every domain invariant (non-negative counts, percentage bounds,
//! range ordering) and fails closed on unknown types.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use thiserror::Error;
use time::Date;
use time::macros::format_description;

use crate::core::decimal::Dec;

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Errors raised when parsing or validating a value struct.
#[derive(Debug, Error)]
pub enum ValueStructError {
    /// The `type` discriminator is missing.
    #[error("missing 'type' field on value struct")]
    MissingType,
    /// The `type` discriminator names an unknown variant.
    #[error("unknown value struct type: {0}")]
    UnknownType(String),
    /// The payload failed to deserialize.
    #[error("malformed value struct: {0}")]
    Malformed(String),
    /// A percentage exceeds 1.0 without `allow_overflow`.
    #[error("percentage {0} exceeds 1.0 and allow_overflow is not set")]
    PercentageOverflow(String),
    /// A percentage is negative.
    #[error("percentage {0} is negative")]
    PercentageNegative(String),
    /// A range has no bounds.
    #[error("range requires at least one bound")]
    RangeUnbounded,
    /// A range minimum exceeds its maximum.
    #[error("range min {min} cannot exceed max {max}")]
    RangeInverted {
        /// Offending minimum bound.
        min: String,
        /// Offending maximum bound.
        max: String,
    },
    /// A text value is empty.
    #[error("text value must be non-empty")]
    EmptyText,
}

// ============================================================================
// SECTION: ISO Date
// ============================================================================

/// Calendar date serialized as `YYYY-MM-DD`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct IsoDate(Date);

impl IsoDate {
    /// Parses a `YYYY-MM-DD` date string.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        Date::parse(text, format_description!("[year]-[month]-[day]")).ok().map(Self)
    }

    /// Returns the inner calendar date.
    #[must_use]
    pub const fn inner(&self) -> Date {
        self.0
    }
}

impl fmt::Display for IsoDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self
            .0
            .format(format_description!("[year]-[month]-[day]"))
            .map_err(|_| fmt::Error)?;
        f.write_str(&rendered)
    }
}

impl Serialize for IsoDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for IsoDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid date: {text}")))
    }
}

// ============================================================================
// SECTION: Supporting Types
// ============================================================================

/// ISO 4217 currency codes accepted for monetary values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Currency {
    /// United States dollar.
    USD,
    /// Euro.
    EUR,
    /// Pound sterling.
    GBP,
    /// Saudi riyal.
    SAR,
    /// United Arab Emirates dirham.
    AED,
}

/// Reporting window a value refers to (fiscal year, LTM, quarter).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    /// Window label such as `FY2024` or `LTM`.
    pub label: String,
    /// Optional inclusive window start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<IsoDate>,
    /// Optional inclusive window end.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<IsoDate>,
}

/// Semantic tags attached to text values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SemanticTag {
    /// The company under diligence.
    CompanyName,
    /// A named competitor.
    Competitor,
    /// A named person.
    Person,
    /// A named product.
    Product,
    /// A market or segment name.
    Market,
    /// A named metric.
    Metric,
}

// ============================================================================
// SECTION: Value Struct
// ============================================================================

/// Typed claim value payload.
///
/// # Invariants
/// - `Percentage.value >= 0` and `<= 1` unless `allow_overflow`.
/// - `Range` carries at least one bound and `min <= max` when both are set.
/// - `Text.value` is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ValueStruct {
    /// A monetary amount with currency and optional window context.
    Monetary {
        /// Exact amount.
        amount: Dec,
        /// Currency code.
        currency: Currency,
        /// Optional as-of date.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        as_of: Option<IsoDate>,
        /// Optional reporting window.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        time_window: Option<TimeWindow>,
    },
    /// A ratio in `[0, 1]`, or above 1 for growth rates with overflow allowed.
    Percentage {
        /// Ratio value.
        value: Dec,
        /// Permits values above 1.0 (growth rates).
        #[serde(default)]
        allow_overflow: bool,
    },
    /// A non-negative count with an optional unit label.
    Count {
        /// Count value.
        value: u64,
        /// Optional unit label such as `users` or `employees`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
        /// Optional as-of date.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        as_of: Option<IsoDate>,
    },
    /// A calendar date with an optional semantic label.
    Date {
        /// Date value.
        value: IsoDate,
        /// Optional semantic label such as `founded`.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        label: Option<String>,
    },
    /// A bounded numeric range.
    Range {
        /// Optional inclusive minimum.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        min_value: Option<Dec>,
        /// Optional inclusive maximum.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        max_value: Option<Dec>,
        /// Optional unit label.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        unit: Option<String>,
        /// Optional currency for monetary ranges.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        currency: Option<Currency>,
    },
    /// Free text with semantic tags.
    Text {
        /// Text value.
        value: String,
        /// Semantic tags.
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        tags: Vec<SemanticTag>,
    },
}

impl ValueStruct {
    /// Validates the domain invariants of this value.
    ///
    /// # Errors
    ///
    /// Returns [`ValueStructError`] when an invariant is violated.
    pub fn validate(&self) -> Result<(), ValueStructError> {
        match self {
            Self::Percentage { value, allow_overflow } => {
                if value < &Dec::zero() {
                    return Err(ValueStructError::PercentageNegative(value.to_string()));
                }
                if !allow_overflow && value > &Dec::from_i64(1) {
                    return Err(ValueStructError::PercentageOverflow(value.to_string()));
                }
                Ok(())
            }
            Self::Range { min_value, max_value, .. } => {
                match (min_value, max_value) {
                    (None, None) => Err(ValueStructError::RangeUnbounded),
                    (Some(min), Some(max)) if min > max => Err(ValueStructError::RangeInverted {
                        min: min.to_string(),
                        max: max.to_string(),
                    }),
                    _ => Ok(()),
                }
            }
            Self::Text { value, .. } => {
                if value.is_empty() {
                    return Err(ValueStructError::EmptyText);
                }
                Ok(())
            }
            Self::Monetary { .. } | Self::Count { .. } | Self::Date { .. } => Ok(()),
        }
    }

    /// Parses a value struct from a JSON object and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ValueStructError`] on unknown types, malformed payloads, or
    /// invariant violations.
    pub fn parse(value: &serde_json::Value) -> Result<Self, ValueStructError> {
        let object = value.as_object().ok_or_else(|| {
            ValueStructError::Malformed("expected a JSON object".to_string())
        })?;
        let kind = object
            .get("type")
            .and_then(serde_json::Value::as_str)
            .ok_or(ValueStructError::MissingType)?;
        const KNOWN: [&str; 6] = ["monetary", "percentage", "count", "date", "range", "text"];
        if !KNOWN.contains(&kind) {
            return Err(ValueStructError::UnknownType(kind.to_string()));
        }
        let parsed: Self = serde_json::from_value(value.clone())
            .map_err(|err| ValueStructError::Malformed(err.to_string()))?;
        parsed.validate()?;
        Ok(parsed)
    }

    /// Serializes the value struct to its canonical JSON object form.
    #[must_use]
    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}
