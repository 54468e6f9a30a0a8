//! # Three-State Field Presence
//!
//! Loosely-typed payloads distinguish three things a two-state `Option`
//! cannot: a key that was never sent, a key sent as `null`, and a key sent
//! with a value. The distinction carries meaning on the wire. On a reply,
//! an absent `referenced_message` means the platform did not try to resolve
//! the target, while `null` means it tried and the target is gone.
//!
//! [`Presence`] keeps the three states apart from the moment a field is read
//! ([`Presence::of`]) until it is written back ([`Presence::emit`]).
//!
//! ## Serde
//!
//! `Presence<T>` serializes `Null` as `null` and `Present(v)` as `v`. Absent
//! fields must be skipped by the container:
//!
//! ```
//! use chatwire_core::Presence;
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize, Deserialize)]
//! struct Patch {
//!     #[serde(default, skip_serializing_if = "Presence::is_absent")]
//!     topic: Presence<String>,
//! }
//!
//! let p: Patch = serde_json::from_str(r#"{"topic":null}"#).unwrap();
//! assert!(p.topic.is_null());
//! assert_eq!(serde_json::to_string(&p).unwrap(), r#"{"topic":null}"#);
//! ```

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

/// The observed state of one field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Presence<T> {
    /// The key was not sent.
    Absent,
    /// The key was sent with `null`.
    Null,
    /// The key was sent with a value.
    Present(T),
}

/// The state of a [`Presence`] without its value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresenceKind {
    Absent,
    Null,
    Present,
}

impl<T> Default for Presence<T> {
    fn default() -> Self {
        Self::Absent
    }
}

impl<'a> Presence<&'a Value> {
    /// Classify `key` on a JSON object.
    pub fn of(map: &'a Map<String, Value>, key: &str) -> Self {
        Self::from_slot(map.get(key))
    }

    /// Classify an optional slot lookup.
    pub fn from_slot(slot: Option<&'a Value>) -> Self {
        match slot {
            None => Self::Absent,
            Some(Value::Null) => Self::Null,
            Some(v) => Self::Present(v),
        }
    }
}

impl<T> Presence<T> {
    pub fn kind(&self) -> PresenceKind {
        match self {
            Self::Absent => PresenceKind::Absent,
            Self::Null => PresenceKind::Null,
            Self::Present(_) => PresenceKind::Present,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, Self::Absent)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present(_))
    }

    pub fn as_ref(&self) -> Presence<&T> {
        match self {
            Self::Absent => Presence::Absent,
            Self::Null => Presence::Null,
            Self::Present(v) => Presence::Present(v),
        }
    }

    /// The value, if present. Absent and null both yield `None`; use
    /// [`Presence::kind`] when the difference matters.
    pub fn present(&self) -> Option<&T> {
        match self {
            Self::Present(v) => Some(v),
            _ => None,
        }
    }

    pub fn into_present(self) -> Option<T> {
        match self {
            Self::Present(v) => Some(v),
            _ => None,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Presence<U> {
        match self {
            Self::Absent => Presence::Absent,
            Self::Null => Presence::Null,
            Self::Present(v) => Presence::Present(f(v)),
        }
    }

    /// Map the present value through a fallible conversion, keeping the
    /// absent/null state untouched.
    pub fn try_map<U, E>(self, f: impl FnOnce(T) -> Result<U, E>) -> Result<Presence<U>, E> {
        Ok(match self {
            Self::Absent => Presence::Absent,
            Self::Null => Presence::Null,
            Self::Present(v) => Presence::Present(f(v)?),
        })
    }

    /// Write this field into a wire object. Absent fields are omitted, null
    /// fields are written as `null`, present fields are written through
    /// `encode`.
    pub fn emit(&self, map: &mut Map<String, Value>, key: &str, encode: impl FnOnce(&T) -> Value) {
        match self {
            Self::Absent => {}
            Self::Null => {
                map.insert(key.to_string(), Value::Null);
            }
            Self::Present(v) => {
                map.insert(key.to_string(), encode(v));
            }
        }
    }
}

impl<T: Serialize> Serialize for Presence<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Absent | Self::Null => serializer.serialize_none(),
            Self::Present(v) => serializer.serialize_some(v),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Presence<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(|opt| match opt {
            None => Self::Null,
            Some(v) => Self::Present(v),
        })
    }
}
