//! # chatwire-schema: Validation & Normalization Engine
//!
//! Validates loosely-typed chat protocol payloads against an immutable
//! variant registry and turns accepted payloads into typed canonical
//! objects that re-serialize without losing anything the sender wrote.
//!
//! ## Registry (`registry`, `protocol`)
//!
//! A [`SchemaRegistry`] maps `(family, tag)` to a [`VariantSchema`] and
//! holds the [`ValidatorConfig`] it was built with. It is built once, never
//! mutated, and shared by reference across threads.
//! [`standard_registry`] installs every documented message kind, component
//! type, button style, and embedded record.
//!
//! ## Validation (`resolver`, `fields`, `components`)
//!
//! - [`resolve`] picks the variant from the discriminant.
//! - The field validator applies presence policy, nullability, type, and
//!   cross-field rules to each resolved record.
//! - The component tree validator enforces nesting depth, row limits, and
//!   row composition per [`Surface`].
//!
//! ## Canonical Form (`model`, `normalize`, `serialize`)
//!
//! [`normalize_message`] produces a [`CanonicalMessage`] where every field
//! keeps its absent/null/present state and unknown keys are retained in
//! `extras`. [`ToWire`] writes it back out.
//!
//! ## Crate Policy
//!
//! - Depends only on `chatwire-core` internally.
//! - No global state; every entry point takes the registry by reference.
//! - Schema work never starts before [`guard`] has bounded the payload's
//!   size and nesting.

pub mod components;
pub mod config;
pub mod engine;
pub mod export;
pub mod model;
pub mod normalize;
pub mod protocol;
pub mod registry;
pub mod resolver;
pub mod serialize;

mod fields;

pub use components::Surface;
pub use config::{ConfigError, ErrorMode, Strictness, ValidatorConfig};
pub use engine::{
    canonical_bytes, guard, normalize_components, normalize_message, serialize_components,
    serialize_message, validate_batch, validate_components, validate_message,
};
pub use export::{record_to_json_schema, registry_to_json_schemas, variant_to_json_schema};
pub use model::{
    CanonicalComponent, CanonicalMessage, MessageBody, MessageHeader, MessageKind, ReferencedMessage,
};
pub use normalize::Normalizer;
pub use protocol::standard_registry;
pub use registry::{
    CrossFieldRule, Family, FieldSpec, Predicate, PresencePolicy, RecordSchema, RegistryBuilder,
    RegistryError, SchemaRegistry, Tag, TypeDescriptor, VariantSchema,
};
pub use resolver::{resolve, Resolution, ResolveContext};
pub use serialize::ToWire;
