//! # Discriminant Resolver
//!
//! Maps a raw object to the variant schema its discriminant selects.
//! Resolution is a single registry lookup keyed by the context's family and
//! the integer tag; no payload field other than the discriminant is read.
//!
//! ## Unregistered Tags
//!
//! In strict mode an unregistered tag is an `UnknownVariant` error. In
//! lenient mode it resolves to [`Resolution::Unrecognized`]: the caller
//! keeps the raw payload and validates whatever the family's generic
//! fallback describes. A missing or null discriminant is always an error.

use chatwire_core::{FieldPath, Presence, ValidationError};
use serde_json::{Map, Value};

use crate::config::Strictness;
use crate::registry::{Family, SchemaRegistry, Tag, VariantSchema};

/// Where an object sits in the payload, which decides its family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveContext {
    Message,
    TopLevelComponent,
    ActionRowChild,
    ButtonStyle,
}

impl ResolveContext {
    pub fn family(self) -> Family {
        match self {
            Self::Message => Family::Message,
            Self::TopLevelComponent | Self::ActionRowChild => Family::Component,
            Self::ButtonStyle => Family::ButtonStyle,
        }
    }

    pub fn describe(self) -> &'static str {
        match self {
            Self::Message => "message",
            Self::TopLevelComponent => "top-level component",
            Self::ActionRowChild => "action row child",
            Self::ButtonStyle => "button style",
        }
    }
}

/// Outcome of a successful resolution.
#[derive(Debug, Clone, Copy)]
pub enum Resolution<'r> {
    Known(&'r VariantSchema),
    /// Lenient fallback for an unregistered tag.
    Unrecognized {
        tag: Tag,
        generic: Option<&'r VariantSchema>,
    },
}

impl<'r> Resolution<'r> {
    /// The schema to validate against, if any.
    pub fn schema(&self) -> Option<&'r VariantSchema> {
        match *self {
            Self::Known(schema) => Some(schema),
            Self::Unrecognized { generic, .. } => generic,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }
}

/// Read the discriminant of `record` for `family`, if it is a
/// non-negative integer.
pub fn discriminant_of(record: &Map<String, Value>, family: Family) -> Option<Tag> {
    record.get(family.discriminant_field()).and_then(Value::as_u64)
}

/// Resolve `record` in `ctx`. `path` locates the record itself.
pub fn resolve<'r>(
    registry: &'r SchemaRegistry,
    record: &Map<String, Value>,
    ctx: ResolveContext,
    path: &FieldPath,
) -> Result<Resolution<'r>, ValidationError> {
    let family = ctx.family();
    let field = family.discriminant_field();

    let raw = match Presence::of(record, field) {
        Presence::Present(v) => v,
        Presence::Absent | Presence::Null => {
            return Err(ValidationError::MissingDiscriminant {
                path: path.clone(),
                field: field.to_string(),
                context: ctx.describe().to_string(),
            })
        }
    };
    let tag = raw.as_u64().ok_or_else(|| ValidationError::TypeMismatch {
        path: path.key(field),
        expected: "non-negative integer discriminant".to_string(),
        found: crate::fields::json_kind(raw).to_string(),
    })?;

    if let Ok(schema) = registry.lookup(family, tag) {
        tracing::trace!(%family, tag, variant = schema.name(), "resolved discriminant");
        return Ok(Resolution::Known(schema));
    }

    match registry.config().strictness {
        Strictness::Strict => Err(ValidationError::UnknownVariant {
            path: path.key(field),
            context: ctx.describe().to_string(),
            tag: tag.to_string(),
        }),
        Strictness::Lenient => {
            tracing::debug!(
                %family,
                tag,
                path = %path,
                "unregistered discriminant, keeping raw payload"
            );
            Ok(Resolution::Unrecognized {
                tag,
                generic: registry.generic(family),
            })
        }
    }
}
