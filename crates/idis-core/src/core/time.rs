// idis-core/src/core/time.rs
// ============================================================================
// Module: IDIS Time Model
// Description: Canonical RFC 3339 timestamps for ledgers and audit events.
// Purpose: Provide deterministic, replayable time values across IDIS records.
// Dependencies: serde, time
// ============================================================================

//! ## Overview
//! IDIS engines never read wall-clock time directly; hosts supply timestamps
//! through the [`crate::interfaces::Clock`] seam so that grading, hashing,
//! and ledger replay stay deterministic under test. Timestamps serialize as
//! RFC 3339 strings with a `Z` suffix.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Ordering;
use std::fmt;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// Canonical UTC timestamp used in IDIS ledgers, chains, and audit events.
///
/// # Invariants
/// - Always rendered in RFC 3339 with a trailing `Z`.
/// - Comparison is by instant, independent of source offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    /// Parses an RFC 3339 timestamp string.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        OffsetDateTime::parse(text, &Rfc3339).ok().map(|dt| Self(dt.to_offset(time::UtcOffset::UTC)))
    }

    /// Builds a timestamp from unix seconds.
    #[must_use]
    pub fn from_unix_seconds(seconds: i64) -> Option<Self> {
        OffsetDateTime::from_unix_timestamp(seconds).ok().map(Self)
    }

    /// Returns the timestamp as unix seconds.
    #[must_use]
    pub const fn unix_seconds(&self) -> i64 {
        self.0.unix_timestamp()
    }

    /// Returns the current wall-clock instant.
    ///
    /// Reserved for host-side [`crate::interfaces::Clock`] implementations;
    /// engines receive time through that seam instead.
    #[must_use]
    pub fn now() -> Self {
        Self(OffsetDateTime::now_utc())
    }

    /// Returns the inner `OffsetDateTime`.
    #[must_use]
    pub const fn inner(&self) -> OffsetDateTime {
        self.0
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered = self.0.format(&Rfc3339).map_err(|_| fmt::Error)?;
        f.write_str(&rendered.replace("+00:00", "Z"))
    }
}

impl PartialOrd for Timestamp {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Timestamp {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.cmp(&other.0)
    }
}

// ============================================================================
// SECTION: Serde
// ============================================================================

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid rfc3339 timestamp: {text}")))
    }
}
