//! # Engine Entry Points
//!
//! The public validation surface. Every entry point runs an iterative
//! size and depth guard over the raw payload before any recursive descent,
//! so a hostile payload cannot exhaust the stack of the validator itself.
//!
//! ## Pipeline
//!
//! ```text
//! raw Value ─▶ guard ─▶ resolve + validate ─▶ normalize ─▶ CanonicalMessage
//!                                                           │
//!                         wire Value ◀── serialize ◀────────┘
//! ```
//!
//! Validation and normalization are separate passes. Normalization only
//! runs on a payload the validator accepted, so callers get either a full
//! canonical object or a [`ValidationReport`], never a partial object.
//!
//! ## Concurrency
//!
//! All entry points take the registry by shared reference and keep their
//! state on the stack. [`validate_batch`] fans a slice of payloads out over
//! scoped threads; results keep input order.

use std::num::NonZeroUsize;
use std::thread;

use chatwire_core::{
    CanonicalBytes, CanonicalizationError, FieldPath, ValidationError, ValidationReport,
};
use serde_json::Value;

use crate::components::Surface;
use crate::config::ValidatorConfig;
use crate::fields::{json_kind, Pass};
use crate::model::{CanonicalComponent, CanonicalMessage};
use crate::normalize::Normalizer;
use crate::registry::SchemaRegistry;
use crate::serialize::ToWire;

// ---------------------------------------------------------------------------
// Guard
// ---------------------------------------------------------------------------

/// Bytes a scalar contributes to the estimated wire size.
fn scalar_size(value: &Value) -> usize {
    match value {
        Value::Null => 4,
        Value::Bool(true) => 4,
        Value::Bool(false) => 5,
        Value::Number(n) => match (n.as_u64(), n.as_i64()) {
            (Some(u), _) => u.checked_ilog10().map_or(1, |d| d as usize + 1),
            (None, Some(i)) => i.unsigned_abs().checked_ilog10().map_or(1, |d| d as usize + 1) + 1,
            // Floats: conservative upper bound for the shortest repr.
            (None, None) => 24,
        },
        Value::String(s) => s.len() + 2,
        Value::Array(_) | Value::Object(_) => 2,
    }
}

/// Reject payloads that exceed the configured size or nesting limits.
///
/// Walks the tree with an explicit stack. The first string over
/// `max_string_bytes` or the first value nested deeper than
/// `max_value_depth` is reported at its own path; an estimated total size
/// over `max_payload_bytes` is reported at the root.
pub fn guard(payload: &Value, config: &ValidatorConfig) -> Result<(), ValidationError> {
    let mut stack: Vec<(&Value, FieldPath, usize)> = vec![(payload, FieldPath::root(), 0)];
    let mut size = 0usize;

    while let Some((value, path, depth)) = stack.pop() {
        if depth > config.max_value_depth {
            return Err(ValidationError::PayloadTooLarge {
                path,
                limit: config.max_value_depth,
                actual: depth,
            });
        }
        size = size.saturating_add(scalar_size(value));

        match value {
            Value::String(s) if s.len() > config.max_string_bytes => {
                return Err(ValidationError::PayloadTooLarge {
                    path,
                    limit: config.max_string_bytes,
                    actual: s.len(),
                });
            }
            Value::Array(items) => {
                size = size.saturating_add(items.len().saturating_sub(1));
                for (i, item) in items.iter().enumerate() {
                    stack.push((item, path.index(i), depth + 1));
                }
            }
            Value::Object(map) => {
                size = size.saturating_add(map.len().saturating_sub(1));
                for (key, item) in map {
                    // "key":
                    size = size.saturating_add(key.len() + 3);
                    stack.push((item, path.key(key.as_str()), depth + 1));
                }
            }
            _ => {}
        }

        if size > config.max_payload_bytes {
            return Err(ValidationError::PayloadTooLarge {
                path: FieldPath::root(),
                limit: config.max_payload_bytes,
                actual: size,
            });
        }
    }
    Ok(())
}

fn not_an_object(payload: &Value, expected: &str) -> ValidationReport {
    ValidationReport::single(ValidationError::TypeMismatch {
        path: FieldPath::root(),
        expected: expected.to_string(),
        found: json_kind(payload).to_string(),
    })
}

// ---------------------------------------------------------------------------
// Messages
// ---------------------------------------------------------------------------

/// Validate a raw message payload.
///
/// # Errors
///
/// Returns every error found (collect mode) or the first one (fail-fast).
pub fn validate_message(registry: &SchemaRegistry, payload: &Value) -> Result<(), ValidationReport> {
    guard(payload, registry.config())?;
    let Some(map) = payload.as_object() else {
        return Err(not_an_object(payload, "message object"));
    };
    let mut pass = Pass::new(registry);
    // Halt only means fail-fast stopped early; the sink holds the error.
    let _ = pass.check_message(map, &FieldPath::root(), 0);
    pass.finish()
}

/// Validate, then build the canonical form.
pub fn normalize_message(
    registry: &SchemaRegistry,
    payload: &Value,
) -> Result<CanonicalMessage, ValidationReport> {
    validate_message(registry, payload)?;
    Normalizer::new(registry)
        .message(payload, &FieldPath::root(), 0)
        .map_err(ValidationReport::single)
}

/// Re-emit a canonical message as wire JSON.
pub fn serialize_message(message: &CanonicalMessage) -> Value {
    message.to_wire()
}

/// RFC 8785 bytes of the serialized message, for byte-exact comparison.
pub fn canonical_bytes(message: &CanonicalMessage) -> Result<CanonicalBytes, CanonicalizationError> {
    CanonicalBytes::new(&message.to_wire())
}

// ---------------------------------------------------------------------------
// Component trees
// ---------------------------------------------------------------------------

/// Validate a standalone top-level component list rendered on `surface`.
pub fn validate_components(
    registry: &SchemaRegistry,
    payload: &Value,
    surface: Surface,
) -> Result<(), ValidationReport> {
    guard(payload, registry.config())?;
    let Some(nodes) = payload.as_array() else {
        return Err(not_an_object(payload, "component array"));
    };
    let mut pass = Pass::new(registry);
    let _ = pass.check_tree(nodes, surface, &FieldPath::root());
    pass.finish()
}

pub fn normalize_components(
    registry: &SchemaRegistry,
    payload: &Value,
    surface: Surface,
) -> Result<Vec<CanonicalComponent>, ValidationReport> {
    validate_components(registry, payload, surface)?;
    Normalizer::new(registry)
        .components(payload, &FieldPath::root())
        .map_err(ValidationReport::single)
}

pub fn serialize_components(components: &[CanonicalComponent]) -> Value {
    Value::Array(components.iter().map(ToWire::to_wire).collect())
}

// ---------------------------------------------------------------------------
// Batches
// ---------------------------------------------------------------------------

/// Normalize independent message payloads in parallel. Results are in
/// input order, one per payload.
pub fn validate_batch(
    registry: &SchemaRegistry,
    payloads: &[Value],
) -> Vec<Result<CanonicalMessage, ValidationReport>> {
    if payloads.is_empty() {
        return Vec::new();
    }
    let workers = thread::available_parallelism()
        .map_or(1, NonZeroUsize::get)
        .min(payloads.len());
    let chunk = payloads.len().div_ceil(workers);
    tracing::debug!(payloads = payloads.len(), workers, "validating batch");

    thread::scope(|scope| {
        let handles: Vec<_> = payloads
            .chunks(chunk)
            .map(|slice| {
                scope.spawn(move || {
                    slice
                        .iter()
                        .map(|p| normalize_message(registry, p))
                        .collect::<Vec<_>>()
                })
            })
            .collect();

        handles
            .into_iter()
            .flat_map(|h| match h.join() {
                Ok(results) => results,
                Err(panic) => std::panic::resume_unwind(panic),
            })
            .collect()
    })
}
