//! # Snowflake Identifiers
//!
//! Every entity on the platform (message, channel, user, role, attachment,
//! SKU) is identified by a snowflake: an unsigned 64-bit integer whose top
//! 42 bits are milliseconds since the platform epoch.
//!
//! Snowflakes travel as decimal strings because 64-bit integers do not
//! survive every JSON parser. [`Snowflake`] accepts either a string or a
//! non-negative integer on input and always re-emits a string.
//!
//! ## Layout
//!
//! ```text
//!  63                 22 21    17 16    12 11          0
//! +---------------------+--------+--------+-------------+
//! | ms since epoch      | worker | process| increment   |
//! +---------------------+--------+--------+-------------+
//! ```

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, TimeZone, Utc};
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::error::PrimitiveError;

/// Milliseconds between the Unix epoch and the platform epoch
/// (2015-01-01T00:00:00Z).
pub const PLATFORM_EPOCH_MS: u64 = 1_420_070_400_000;

/// A platform snowflake identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Snowflake(u64);

impl Snowflake {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Parse a decimal string. Signs, whitespace, and empty strings are
    /// rejected.
    ///
    /// # Errors
    ///
    /// Returns [`PrimitiveError::InvalidSnowflake`] if the string is not a
    /// decimal `u64`.
    pub fn parse(s: &str) -> Result<Self, PrimitiveError> {
        if s.is_empty() || !s.bytes().all(|b| b.is_ascii_digit()) {
            return Err(PrimitiveError::InvalidSnowflake(s.to_string()));
        }
        s.parse::<u64>()
            .map(Self)
            .map_err(|_| PrimitiveError::InvalidSnowflake(s.to_string()))
    }

    /// Read a snowflake from a JSON string or non-negative JSON integer.
    pub fn from_value(value: &Value) -> Result<Self, PrimitiveError> {
        match value {
            Value::String(s) => Self::parse(s),
            Value::Number(n) => n
                .as_u64()
                .map(Self)
                .ok_or_else(|| PrimitiveError::InvalidSnowflake(n.to_string())),
            other => Err(PrimitiveError::InvalidSnowflake(other.to_string())),
        }
    }

    pub fn get(self) -> u64 {
        self.0
    }

    /// Creation time encoded in the top 42 bits.
    pub fn created_at(self) -> Option<DateTime<Utc>> {
        let ms = (self.0 >> 22).checked_add(PLATFORM_EPOCH_MS)?;
        let ms = i64::try_from(ms).ok()?;
        Utc.timestamp_millis_opt(ms).single()
    }

    pub fn worker_id(self) -> u8 {
        ((self.0 & 0x3E_0000) >> 17) as u8
    }

    pub fn process_id(self) -> u8 {
        ((self.0 & 0x1_F000) >> 12) as u8
    }

    pub fn increment(self) -> u16 {
        (self.0 & 0xFFF) as u16
    }

    pub fn to_value(self) -> Value {
        Value::String(self.0.to_string())
    }
}

impl fmt::Display for Snowflake {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Snowflake {
    type Err = PrimitiveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<u64> for Snowflake {
    fn from(raw: u64) -> Self {
        Self(raw)
    }
}

impl Serialize for Snowflake {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for Snowflake {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct SnowflakeVisitor;

        impl Visitor<'_> for SnowflakeVisitor {
            type Value = Snowflake;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a snowflake as a decimal string or unsigned integer")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Snowflake, E> {
                Ok(Snowflake(v))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Snowflake, E> {
                u64::try_from(v)
                    .map(Snowflake)
                    .map_err(|_| E::custom(PrimitiveError::InvalidSnowflake(v.to_string())))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Snowflake, E> {
                Snowflake::parse(v).map_err(E::custom)
            }
        }

        deserializer.deserialize_any(SnowflakeVisitor)
    }
}
