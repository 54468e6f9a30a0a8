//! # chatwire-core: Foundational Types for the Chat Wire Protocol
//!
//! This crate is the leaf of the chatwire workspace. It defines the
//! primitives every validation and normalization path is built from, and it
//! depends on nothing internal.
//!
//! ## Key Design Principles
//!
//! 1. **Three-state presence.** Every field read from a loosely-typed
//!    payload is classified as [`Presence::Absent`], [`Presence::Null`], or
//!    [`Presence::Present`]. There is no `Option` shortcut that collapses
//!    "not sent" and "sent as null" into one state.
//!
//! 2. **Every diagnostic carries a path.** [`ValidationError`] variants hold
//!    a [`FieldPath`] rendered as a JSON Pointer, so a caller can point at
//!    the offending byte range of a payload without re-walking it.
//!
//! 3. **Bitfields never drop bits.** [`BitfieldSpec::decode`] splits a raw
//!    integer into named flags plus the bits no flag claims, and
//!    [`FlagSet::bits`] puts both back together.
//!
//! 4. **Wire primitives keep their wire form.** [`Snowflake`] re-emits as a
//!    decimal string and [`Timestamp`] re-emits the exact string it was
//!    parsed from.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `chatwire-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod bitfield;
pub mod canonical;
pub mod error;
pub mod path;
pub mod presence;
pub mod snowflake;
pub mod temporal;

// Re-export primary types for ergonomic imports.
pub use bitfield::{
    BitfieldSpec, FlagDef, FlagSet, ATTACHMENT_FLAGS, EMBED_FLAGS, MESSAGE_FLAGS, USER_FLAGS,
};
pub use canonical::CanonicalBytes;
pub use error::{
    BitfieldError, CanonicalizationError, ChatwireError, ErrorCode, PrimitiveError,
    ValidationError, ValidationReport,
};
pub use path::{FieldPath, Segment};
pub use presence::{Presence, PresenceKind};
pub use snowflake::{Snowflake, PLATFORM_EPOCH_MS};
pub use temporal::Timestamp;
