//! # Field Validator
//!
//! Checks one resolved record against its field specs and cross-field
//! rules. Each field is classified as absent, null, or present before any
//! type check runs, and the presence policy is applied to that
//! classification:
//!
//! | policy                 | absent         | null                     | present      |
//! |------------------------|----------------|--------------------------|--------------|
//! | `Required`             | `MissingField` | ok if nullable           | type check   |
//! | `Optional`             | ok             | ok if nullable           | type check   |
//! | `ConditionallyRequired`| `MissingField` while the predicate holds, otherwise as `Optional` |||
//! | `Forbidden`            | ok             | `InvalidVariantCombination` | `InvalidVariantCombination` |
//!
//! A null sent for a non-nullable field is a `TypeMismatch`.
//!
//! ## Error Collection
//!
//! Every check reports through a [`Collector`]. In fail-fast mode the first
//! push returns [`Halt`] and `?` unwinds the walk; in collect mode every
//! push returns `Ok` and the walk continues to the end.

use chatwire_core::{FieldPath, Presence, Snowflake, Timestamp, ValidationError, ValidationReport};
use serde_json::{Map, Value};

use crate::config::ErrorMode;
use crate::registry::{
    CrossFieldRule, Family, FieldSpec, PresencePolicy, SchemaRegistry, TypeDescriptor,
    VariantSchema,
};
use crate::resolver::{resolve, ResolveContext};

/// JSON kind name for diagnostics.
pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Integer view of a JSON number. Values above `i64::MAX` saturate so they
/// are typed as integers; the range check then rejects them.
pub(crate) fn as_integer(value: &Value) -> Option<i64> {
    value
        .as_i64()
        .or_else(|| value.as_u64().map(|_| i64::MAX))
}

fn char_len(s: &str) -> i64 {
    i64::try_from(s.chars().count()).unwrap_or(i64::MAX)
}

fn to_i64(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

// ---------------------------------------------------------------------------
// Collector
// ---------------------------------------------------------------------------

/// Signals that fail-fast mode recorded its one error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Halt;

pub(crate) type Flow = Result<(), Halt>;

/// Error sink honoring the configured [`ErrorMode`].
#[derive(Debug)]
pub(crate) struct Collector {
    mode: ErrorMode,
    errors: Vec<ValidationError>,
}

impl Collector {
    pub(crate) fn new(mode: ErrorMode) -> Self {
        Self {
            mode,
            errors: Vec::new(),
        }
    }

    pub(crate) fn push(&mut self, error: ValidationError) -> Flow {
        self.errors.push(error);
        match self.mode {
            ErrorMode::FailFast => Err(Halt),
            ErrorMode::Collect => Ok(()),
        }
    }

    pub(crate) fn finish(self) -> Result<(), ValidationReport> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(ValidationReport::new(self.errors))
        }
    }
}

// ---------------------------------------------------------------------------
// Validation pass
// ---------------------------------------------------------------------------

/// One validation walk over one payload.
pub(crate) struct Pass<'r> {
    pub(crate) registry: &'r SchemaRegistry,
    pub(crate) sink: Collector,
}

impl<'r> Pass<'r> {
    pub(crate) fn new(registry: &'r SchemaRegistry) -> Self {
        Self {
            registry,
            sink: Collector::new(registry.config().error_mode),
        }
    }

    pub(crate) fn finish(self) -> Result<(), ValidationReport> {
        self.sink.finish()
    }

    /// Resolve and check a message object. `ref_depth` counts how many
    /// `referenced_message` hops led here.
    pub(crate) fn check_message(
        &mut self,
        map: &Map<String, Value>,
        path: &FieldPath,
        ref_depth: usize,
    ) -> Flow {
        let resolution = match resolve(self.registry, map, ResolveContext::Message, path) {
            Ok(r) => r,
            Err(e) => return self.sink.push(e),
        };
        match resolution.schema() {
            Some(schema) => self.check_variant(map, schema, path, ref_depth),
            None => Ok(()),
        }
    }

    /// Check every effective field and rule of a variant.
    pub(crate) fn check_variant(
        &mut self,
        map: &Map<String, Value>,
        schema: &VariantSchema,
        path: &FieldPath,
        ref_depth: usize,
    ) -> Flow {
        self.check_fields(map, schema.effective_fields(), path, ref_depth)?;
        self.check_rules(map, schema.rules(), path)
    }

    pub(crate) fn check_fields<'s>(
        &mut self,
        map: &Map<String, Value>,
        specs: impl IntoIterator<Item = &'s FieldSpec>,
        path: &FieldPath,
        ref_depth: usize,
    ) -> Flow {
        for spec in specs {
            self.check_field(map, spec, path, ref_depth)?;
        }
        Ok(())
    }

    fn check_field(
        &mut self,
        map: &Map<String, Value>,
        spec: &FieldSpec,
        path: &FieldPath,
        ref_depth: usize,
    ) -> Flow {
        let slot = Presence::of(map, spec.name);
        let field_path = path.key(spec.name);

        match spec.effective_presence() {
            PresencePolicy::Forbidden => {
                if !slot.is_absent() {
                    self.sink.push(ValidationError::InvalidVariantCombination {
                        path: field_path,
                        reason: format!("'{}' is not allowed for this variant", spec.name),
                    })?;
                }
                return Ok(());
            }
            PresencePolicy::Required => {
                if slot.is_absent() {
                    return self.sink.push(ValidationError::MissingField { path: field_path });
                }
            }
            PresencePolicy::ConditionallyRequired(predicate) => {
                if !slot.is_present() && predicate.eval(map) {
                    return self.sink.push(ValidationError::MissingField { path: field_path });
                }
            }
            PresencePolicy::Optional => {}
        }

        match slot {
            Presence::Absent => Ok(()),
            Presence::Null if spec.is_nullable() => Ok(()),
            Presence::Null => self.sink.push(ValidationError::TypeMismatch {
                path: field_path,
                expected: spec.ty.describe(),
                found: "null".to_string(),
            }),
            Presence::Present(value) => self.check_value(value, &spec.ty, &field_path, ref_depth),
        }
    }

    /// Type-check one value. `path` locates the value itself.
    pub(crate) fn check_value(
        &mut self,
        value: &Value,
        ty: &TypeDescriptor,
        path: &FieldPath,
        ref_depth: usize,
    ) -> Flow {
        if !shape_matches(value, ty) {
            return self.mismatch(value, ty, path);
        }

        match ty {
            TypeDescriptor::Bool
            | TypeDescriptor::Number
            | TypeDescriptor::Any
            | TypeDescriptor::Flags(_)
            | TypeDescriptor::Children => Ok(()),

            TypeDescriptor::Integer { min, max } => match value.as_i64() {
                Some(actual) => self.check_range(actual, *min, *max, path),
                // Above i64::MAX: out of range for every integer field,
                // including those bounded at i64::MAX itself.
                None => self.sink.push(ValidationError::OutOfRange {
                    path: path.clone(),
                    actual: i64::MAX,
                    min: *min,
                    max: *max,
                }),
            },

            TypeDescriptor::String { max_chars } => match (value.as_str(), max_chars) {
                (Some(s), Some(max)) => self.check_range(char_len(s), 0, to_i64(*max), path),
                _ => Ok(()),
            },

            TypeDescriptor::Snowflake => match Snowflake::from_value(value) {
                Ok(_) => Ok(()),
                Err(_) => self.mismatch(value, ty, path),
            },

            TypeDescriptor::Timestamp => match value.as_str().map(Timestamp::parse) {
                Some(Ok(_)) => Ok(()),
                _ => self.mismatch(value, ty, path),
            },

            TypeDescriptor::Record(name) => {
                let (Some(map), Some(record)) = (value.as_object(), self.registry.record(name))
                else {
                    return Ok(());
                };
                self.check_fields(map, record.fields(), path, ref_depth)?;
                self.check_rules(map, record.rules(), path)
            }

            TypeDescriptor::Variant(family) => {
                let Some(map) = value.as_object() else {
                    return Ok(());
                };
                self.check_nested_variant(map, *family, path, ref_depth)
            }

            TypeDescriptor::Components => match value.as_array() {
                Some(nodes) => self.check_tree(nodes, crate::components::Surface::Message, path),
                None => Ok(()),
            },

            TypeDescriptor::Array {
                items,
                min_items,
                max_items,
            } => {
                let Some(elements) = value.as_array() else {
                    return Ok(());
                };
                let len = elements.len();
                let max = max_items.unwrap_or(usize::MAX);
                if len < *min_items || len > max {
                    self.sink.push(ValidationError::OutOfRange {
                        path: path.clone(),
                        actual: to_i64(len),
                        min: to_i64(*min_items),
                        max: to_i64(max),
                    })?;
                }
                for (i, element) in elements.iter().enumerate() {
                    self.check_value(element, items, &path.index(i), ref_depth)?;
                }
                Ok(())
            }

            TypeDescriptor::OneOf(options) => {
                match options.iter().find(|option| shape_matches(value, option)) {
                    Some(option) => self.check_value(value, option, path, ref_depth),
                    None => self.mismatch(value, ty, path),
                }
            }
        }
    }

    fn check_nested_variant(
        &mut self,
        map: &Map<String, Value>,
        family: Family,
        path: &FieldPath,
        ref_depth: usize,
    ) -> Flow {
        if family != Family::Message {
            return match resolve(self.registry, map, context_for(family), path) {
                Ok(r) => match r.schema() {
                    Some(schema) => self.check_variant(map, schema, path, ref_depth),
                    None => Ok(()),
                },
                Err(e) => self.sink.push(e),
            };
        }

        let depth = ref_depth + 1;
        let limit = self.registry.config().max_reference_depth;
        if depth > limit {
            return self.sink.push(ValidationError::PayloadTooLarge {
                path: path.clone(),
                limit,
                actual: depth,
            });
        }
        self.check_message(map, path, depth)
    }

    pub(crate) fn check_rules(
        &mut self,
        map: &Map<String, Value>,
        rules: &[CrossFieldRule],
        path: &FieldPath,
    ) -> Flow {
        for rule in rules {
            self.check_rule(map, rule, path)?;
        }
        Ok(())
    }

    fn check_rule(&mut self, map: &Map<String, Value>, rule: &CrossFieldRule, path: &FieldPath) -> Flow {
        match rule {
            CrossFieldRule::ExactlyOneOf { keys, selected } => {
                if !Presence::of(map, selected).is_present() {
                    self.sink.push(ValidationError::InvalidVariantCombination {
                        path: path.key(*selected),
                        reason: format!("this variant requires '{selected}'"),
                    })?;
                }
                for key in keys.iter().filter(|k| *k != selected) {
                    if !Presence::of(map, key).is_absent() {
                        self.sink.push(ValidationError::InvalidVariantCombination {
                            path: path.key(*key),
                            reason: format!("'{key}' cannot be combined with '{selected}'"),
                        })?;
                    }
                }
                Ok(())
            }

            CrossFieldRule::MinNotAboveMax { min, max } => {
                let lo = map.get(*min).and_then(as_integer);
                let hi = map.get(*max).and_then(as_integer);
                match (lo, hi) {
                    (Some(lo), Some(hi)) if lo > hi => self.sink.push(ValidationError::OutOfRange {
                        path: path.key(*min),
                        actual: lo,
                        min: 0,
                        max: hi,
                    }),
                    _ => Ok(()),
                }
            }

            CrossFieldRule::AtMostArrayLen { field, array } => {
                let value = map.get(*field).and_then(as_integer);
                let len = map.get(*array).and_then(Value::as_array).map(Vec::len);
                match (value, len) {
                    (Some(v), Some(len)) if v > to_i64(len) => {
                        self.sink.push(ValidationError::OutOfRange {
                            path: path.key(*field),
                            actual: v,
                            min: 0,
                            max: to_i64(len),
                        })
                    }
                    _ => Ok(()),
                }
            }

            CrossFieldRule::TotalTextLength { paths, limit } => {
                let mut total = 0usize;
                for p in paths.iter() {
                    let segments: Vec<&str> = p.split('.').collect();
                    sum_text(map, &segments, &mut total);
                }
                if total > *limit {
                    self.sink.push(ValidationError::OutOfRange {
                        path: path.clone(),
                        actual: to_i64(total),
                        min: 0,
                        max: to_i64(*limit),
                    })
                } else {
                    Ok(())
                }
            }
        }
    }

    fn mismatch(&mut self, value: &Value, ty: &TypeDescriptor, path: &FieldPath) -> Flow {
        self.sink.push(ValidationError::TypeMismatch {
            path: path.clone(),
            expected: ty.describe(),
            found: json_kind(value).to_string(),
        })
    }

    fn check_range(&mut self, actual: i64, min: i64, max: i64, path: &FieldPath) -> Flow {
        if actual < min || actual > max {
            self.sink.push(ValidationError::OutOfRange {
                path: path.clone(),
                actual,
                min,
                max,
            })
        } else {
            Ok(())
        }
    }
}

fn context_for(family: Family) -> ResolveContext {
    match family {
        Family::Message => ResolveContext::Message,
        Family::Component => ResolveContext::TopLevelComponent,
        Family::ButtonStyle => ResolveContext::ButtonStyle,
    }
}

/// Whether the JSON kind of `value` can hold a `ty`. Content checks
/// (ranges, snowflake digits, timestamp syntax) happen afterwards.
fn shape_matches(value: &Value, ty: &TypeDescriptor) -> bool {
    match ty {
        TypeDescriptor::Bool => value.is_boolean(),
        TypeDescriptor::Integer { .. } => as_integer(value).is_some(),
        TypeDescriptor::Number => value.is_number(),
        TypeDescriptor::String { .. } | TypeDescriptor::Timestamp => value.is_string(),
        TypeDescriptor::Snowflake => value.is_string() || value.is_u64(),
        TypeDescriptor::Flags(_) => value.is_u64(),
        TypeDescriptor::Any => true,
        TypeDescriptor::Record(_) | TypeDescriptor::Variant(_) => value.is_object(),
        TypeDescriptor::Components | TypeDescriptor::Children | TypeDescriptor::Array { .. } => {
            value.is_array()
        }
        TypeDescriptor::OneOf(options) => options.iter().any(|o| shape_matches(value, o)),
    }
}

/// Add the character count of every string at `segments` under `map`.
/// A segment ending in `[]` fans out over the array it names.
fn sum_text(map: &Map<String, Value>, segments: &[&str], total: &mut usize) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };
    if let Some(array_key) = head.strip_suffix("[]") {
        let Some(items) = map.get(array_key).and_then(Value::as_array) else {
            return;
        };
        for item in items {
            if let Some(obj) = item.as_object() {
                sum_text(obj, rest, total);
            }
        }
        return;
    }
    match (map.get(*head), rest.is_empty()) {
        (Some(Value::String(s)), true) => *total += s.chars().count(),
        (Some(Value::Object(obj)), false) => sum_text(obj, rest, total),
        _ => {}
    }
}
