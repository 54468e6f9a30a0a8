//! # Temporal Types
//!
//! ISO 8601 timestamps as they appear on the wire
//! (`2024-02-01T17:27:07.299000+00:00`).
//!
//! ## Design Decision
//!
//! A [`Timestamp`] keeps the exact string it was parsed from alongside the
//! parsed UTC instant. Re-serialization emits the original string, so a
//! payload that passes through normalization comes back byte-identical in
//! its timestamp fields regardless of precision or offset notation.
//! Equality is defined on the wire string.

use std::fmt;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::PrimitiveError;

/// A validated wire timestamp.
#[derive(Debug, Clone)]
pub struct Timestamp {
    raw: String,
    instant: DateTime<Utc>,
}

impl Timestamp {
    /// Parse an RFC 3339 timestamp, keeping the original text.
    ///
    /// # Errors
    ///
    /// Returns [`PrimitiveError::InvalidTimestamp`] if the string is not
    /// RFC 3339.
    pub fn parse(raw: impl Into<String>) -> Result<Self, PrimitiveError> {
        let raw = raw.into();
        let parsed = DateTime::parse_from_rfc3339(&raw).map_err(|e| {
            PrimitiveError::InvalidTimestamp {
                value: raw.clone(),
                reason: e.to_string(),
            }
        })?;
        Ok(Self {
            instant: parsed.with_timezone(&Utc),
            raw,
        })
    }

    /// Build a timestamp for outgoing payloads. The wire form uses
    /// microsecond precision and a `+00:00` offset, matching what the
    /// platform itself emits.
    pub fn from_datetime(dt: DateTime<Utc>) -> Self {
        Self {
            raw: dt.to_rfc3339_opts(SecondsFormat::Micros, false),
            instant: dt,
        }
    }

    /// The wire string this timestamp was parsed from.
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn instant(&self) -> &DateTime<Utc> {
        &self.instant
    }
}

impl PartialEq for Timestamp {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Timestamp {}

impl Hash for Timestamp {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.raw.hash(state);
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

impl From<DateTime<Utc>> for Timestamp {
    fn from(dt: DateTime<Utc>) -> Self {
        Self::from_datetime(dt)
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.raw)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::parse(raw).map_err(serde::de::Error::custom)
    }
}
