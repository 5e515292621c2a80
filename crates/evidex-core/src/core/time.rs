// crates/evidex-core/src/core/time.rs
// ============================================================================
// Module: Evidex Timestamps
// Description: Canonical RFC 3339 timestamp wrapper.
// Purpose: Provide a single serializable, comparable timestamp type.
// Dependencies: time, serde
// ============================================================================

//! ## Overview
//! All entities carry RFC 3339 timestamps. [`Timestamp`] wraps
//! [`time::OffsetDateTime`] so the wire form is always a UTC `Z`-suffixed
//! string, regardless of the offset supplied at construction.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::Serializer;
use serde::de::Error as DeError;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

// ============================================================================
// SECTION: Timestamp
// ============================================================================

/// A UTC timestamp with RFC 3339 wire representation.
///
/// # Invariants
/// - Always normalized to UTC on construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(OffsetDateTime);

impl Timestamp {
    /// Wraps an [`OffsetDateTime`], normalizing it to UTC.
    #[must_use]
    pub fn new(value: OffsetDateTime) -> Self {
        Self(value.to_offset(time::UtcOffset::UTC))
    }

    /// Returns the underlying UTC [`OffsetDateTime`].
    #[must_use]
    pub const fn as_offset_date_time(&self) -> OffsetDateTime {
        self.0
    }

    /// Returns the number of whole milliseconds since a given earlier instant.
    #[must_use]
    pub fn duration_ms_since(&self, earlier: Self) -> i64 {
        (self.0 - earlier.0).whole_milliseconds().clamp(i64::MIN as i128, i64::MAX as i128) as i64
    }
}

/// Errors raised parsing a [`Timestamp`] from its wire form.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
#[error("invalid rfc3339 timestamp: {0}")]
pub struct TimestampParseError(String);

impl std::str::FromStr for Timestamp {
    type Err = TimestampParseError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        OffsetDateTime::parse(raw, &Rfc3339)
            .map(Self::new)
            .map_err(|_err| TimestampParseError(raw.to_string()))
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let rendered = self.0.format(&Rfc3339).map_err(serde::ser::Error::custom)?;
        serializer.serialize_str(&rendered)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(DeError::custom)
    }
}
