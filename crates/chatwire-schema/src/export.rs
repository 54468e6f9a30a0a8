//! # JSON Schema Export
//!
//! Renders registered variants as Draft 2020-12 JSON Schema documents for
//! external tooling. Each document is self-contained: records referenced by
//! any field are emitted under `$defs` and linked with `$ref`.
//!
//! ## Fidelity
//!
//! The export is a relaxation of the engine, never a tightening. Every
//! payload the engine accepts validates against the exported document.
//! What JSON Schema cannot express is left out:
//!
//! - Cross-field rules other than button action exclusivity (min/max
//!   ordering, option counts, combined embed text) appear only in
//!   `$comment`.
//! - Component trees are exported as arrays of discriminated objects; depth
//!   and row composition are not described.
//! - Every object keeps `additionalProperties: true`, matching the
//!   forward-compatible extras handling.

use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use crate::registry::{
    CrossFieldRule, Family, FieldSpec, Predicate, PresencePolicy, RecordSchema, SchemaRegistry,
    TypeDescriptor, VariantSchema,
};

const DRAFT: &str = "https://json-schema.org/draft/2020-12/schema";

const SNOWFLAKE_PATTERN: &str = "^[0-9]+$";

fn type_schema(ty: &TypeDescriptor) -> Value {
    match ty {
        TypeDescriptor::Bool => json!({"type": "boolean"}),
        TypeDescriptor::Integer { min, max } => {
            let mut schema = json!({"type": "integer"});
            // Integers past i64 saturate in the engine, so open ends stay open.
            if *min != i64::MIN {
                schema["minimum"] = json!(min);
            }
            if *max != i64::MAX {
                schema["maximum"] = json!(max);
            }
            schema
        }
        TypeDescriptor::Number => json!({"type": "number"}),
        TypeDescriptor::String { max_chars: Some(max) } => json!({"type": "string", "maxLength": max}),
        TypeDescriptor::String { max_chars: None } => json!({"type": "string"}),
        TypeDescriptor::Snowflake => json!({
            "anyOf": [
                {"type": "string", "pattern": SNOWFLAKE_PATTERN},
                {"type": "integer", "minimum": 0}
            ]
        }),
        TypeDescriptor::Timestamp => json!({"type": "string", "format": "date-time"}),
        TypeDescriptor::Flags(spec) => json!({
            "type": "integer",
            "minimum": 0,
            "description": spec.name()
        }),
        TypeDescriptor::Any => json!(true),
        TypeDescriptor::Record(name) => json!({"$ref": format!("#/$defs/{name}")}),
        TypeDescriptor::Variant(family) => discriminated_object(*family),
        TypeDescriptor::Components | TypeDescriptor::Children => json!({
            "type": "array",
            "items": discriminated_object(Family::Component)
        }),
        TypeDescriptor::Array {
            items,
            min_items,
            max_items,
        } => {
            let mut schema = json!({"type": "array", "items": type_schema(items)});
            if *min_items > 0 {
                schema["minItems"] = json!(min_items);
            }
            if let Some(max) = max_items {
                schema["maxItems"] = json!(max);
            }
            schema
        }
        TypeDescriptor::OneOf(options) => json!({
            "anyOf": options.iter().map(type_schema).collect::<Vec<_>>()
        }),
    }
}

/// Any object carrying an integer discriminant for `family`.
fn discriminated_object(family: Family) -> Value {
    let field = family.discriminant_field();
    json!({
        "type": "object",
        "properties": {field: {"type": "integer", "minimum": 0}},
        "required": [field]
    })
}

fn field_schema(spec: &FieldSpec) -> Value {
    if matches!(spec.effective_presence(), PresencePolicy::Forbidden) {
        return Value::Bool(false);
    }
    let base = type_schema(&spec.ty);
    if spec.is_nullable() && base != Value::Bool(true) {
        json!({"anyOf": [base, {"type": "null"}]})
    } else {
        base
    }
}

/// Schema matching objects where `predicate` holds. Dotted paths nest.
fn predicate_schema(predicate: &Predicate) -> Value {
    let (path, leaf) = match predicate {
        Predicate::Present(path) => (*path, json!({"not": {"type": "null"}})),
        Predicate::Null(path) => (*path, json!({"type": "null"})),
        Predicate::Equals(path, value) => (*path, json!({"const": value})),
        Predicate::Not(inner) => {
            return json!({"not": predicate_schema(inner)});
        }
    };
    path.rsplit('.').fold(leaf, |inner, segment| {
        json!({
            "type": "object",
            "properties": {segment: inner},
            "required": [segment]
        })
    })
}

/// Properties, `required`, and conditional requirements for a field list.
fn object_schema<'s>(
    specs: impl IntoIterator<Item = &'s FieldSpec>,
    rules: &[CrossFieldRule],
) -> Map<String, Value> {
    let mut properties = Map::new();
    let mut required = Vec::new();
    let mut conditions = Vec::new();

    for spec in specs {
        properties.insert(spec.name.to_string(), field_schema(spec));
        match spec.effective_presence() {
            PresencePolicy::Required => required.push(Value::from(spec.name)),
            PresencePolicy::ConditionallyRequired(predicate) => conditions.push(json!({
                "if": predicate_schema(predicate),
                "then": {"required": [spec.name]}
            })),
            PresencePolicy::Optional | PresencePolicy::Forbidden => {}
        }
    }

    let mut notes = Vec::new();
    for rule in rules {
        match rule {
            CrossFieldRule::ExactlyOneOf { keys, selected } => {
                required.push(Value::from(*selected));
                for key in keys.iter().filter(|k| *k != selected) {
                    properties.insert(key.to_string(), Value::Bool(false));
                }
            }
            CrossFieldRule::MinNotAboveMax { min, max } => {
                notes.push(format!("{min} <= {max}"));
            }
            CrossFieldRule::AtMostArrayLen { field, array } => {
                notes.push(format!("{field} <= len({array})"));
            }
            CrossFieldRule::TotalTextLength { paths, limit } => {
                notes.push(format!("chars({}) <= {limit}", paths.join(" + ")));
            }
        }
    }

    let mut schema = Map::new();
    schema.insert("type".into(), json!("object"));
    schema.insert("properties".into(), Value::Object(properties));
    if !required.is_empty() {
        schema.insert("required".into(), Value::Array(required));
    }
    if !conditions.is_empty() {
        schema.insert("allOf".into(), Value::Array(conditions));
    }
    if !notes.is_empty() {
        schema.insert("$comment".into(), json!(notes.join("; ")));
    }
    schema.insert("additionalProperties".into(), json!(true));
    schema
}

fn record_body(record: &RecordSchema) -> Value {
    let mut schema = object_schema(record.fields(), record.rules());
    schema.insert("title".into(), json!(record.name()));
    Value::Object(schema)
}

fn all_defs(registry: &SchemaRegistry) -> Map<String, Value> {
    registry
        .records()
        .into_iter()
        .map(|r| (r.name().to_string(), record_body(r)))
        .collect()
}

/// Document key for a variant: `family.tag.name`, or `family.name` for a
/// generic fallback.
pub fn document_key(schema: &VariantSchema) -> String {
    match schema.tag() {
        Some(tag) => format!("{}.{tag}.{}", schema.family(), schema.name()),
        None => format!("{}.{}", schema.family(), schema.name()),
    }
}

/// Render one variant as a standalone JSON Schema document.
pub fn variant_to_json_schema(registry: &SchemaRegistry, schema: &VariantSchema) -> Value {
    let mut doc = object_schema(schema.effective_fields(), schema.rules());

    let discriminant = schema.family().discriminant_field();
    let tag_schema = match schema.tag() {
        Some(tag) => json!({"const": tag}),
        None => json!({"type": "integer", "minimum": 0}),
    };
    if let Some(Value::Object(properties)) = doc.get_mut("properties") {
        properties.insert(discriminant.to_string(), tag_schema);
        if let Some(secondary) = schema.secondary_family() {
            properties.insert(
                secondary.discriminant_field().to_string(),
                json!({"type": "integer", "minimum": 0}),
            );
        }
    }
    let mut required = vec![Value::from(discriminant)];
    if let Some(secondary) = schema.secondary_family() {
        required.push(Value::from(secondary.discriminant_field()));
    }
    if let Some(Value::Array(existing)) = doc.remove("required") {
        required.extend(existing);
    }
    doc.insert("required".into(), Value::Array(required));

    doc.insert("$schema".into(), json!(DRAFT));
    doc.insert("title".into(), json!(document_key(schema)));
    doc.insert("$defs".into(), Value::Object(all_defs(registry)));
    Value::Object(doc)
}

/// Render one record as a standalone JSON Schema document.
pub fn record_to_json_schema(registry: &SchemaRegistry, record: &RecordSchema) -> Value {
    let mut doc = match record_body(record) {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    doc.insert("$schema".into(), json!(DRAFT));
    doc.insert("$defs".into(), Value::Object(all_defs(registry)));
    Value::Object(doc)
}

/// Every registered variant, keyed by [`document_key`].
pub fn registry_to_json_schemas(registry: &SchemaRegistry) -> BTreeMap<String, Value> {
    [Family::Message, Family::Component, Family::ButtonStyle]
        .into_iter()
        .flat_map(|family| {
            registry
                .variants(family)
                .into_iter()
                .chain(registry.generic(family))
        })
        .map(|schema| (document_key(schema), variant_to_json_schema(registry, schema)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ValidatorConfig;
    use crate::protocol::standard_registry;

    fn docs() -> BTreeMap<String, Value> {
        registry_to_json_schemas(&standard_registry(ValidatorConfig::default()).unwrap())
    }

    fn validator(docs: &BTreeMap<String, Value>, key: &str) -> jsonschema::Validator {
        let doc = docs.get(key).unwrap_or_else(|| panic!("no document {key}"));
        jsonschema::validator_for(doc).unwrap()
    }

    #[test]
    fn every_document_compiles() {
        let docs = docs();
        assert!(docs.contains_key("message.0.default"));
        assert!(docs.contains_key("message.unknown"));
        for (key, doc) in &docs {
            assert!(jsonschema::validator_for(doc).is_ok(), "{key} does not compile");
            assert_eq!(doc["additionalProperties"], json!(true));
        }
    }

    #[test]
    fn reply_document_requires_reference() {
        let docs = docs();
        let v = validator(&docs, "message.19.reply");
        assert!(v.is_valid(&json!({
            "type": 19,
            "message_reference": {"channel_id": "1"},
            "referenced_message": null,
            "author": {"id": "9", "username": "x"}
        })));
        assert!(!v.is_valid(&json!({"type": 19})));
        assert!(!v.is_valid(&json!({"type": 0, "message_reference": {"channel_id": "1"}})));
    }

    #[test]
    fn link_style_forbids_other_action_keys() {
        let docs = docs();
        let v = validator(&docs, "button_style.5.link");
        assert!(v.is_valid(&json!({"type": 2, "style": 5, "url": "https://example.com"})));
        assert!(!v.is_valid(&json!({"type": 2, "style": 5})));
        assert!(!v.is_valid(&json!({"type": 2, "style": 5, "url": "https://x", "custom_id": "a"})));
    }

    #[test]
    fn forward_reference_needs_message_id() {
        let docs = docs();
        let v = validator(&docs, "message.0.default");
        assert!(!v.is_valid(&json!({"type": 0, "message_reference": {"type": 1, "channel_id": "1"}})));
        assert!(v.is_valid(&json!({"type": 0, "message_reference": {"type": 0, "channel_id": "1"}})));
    }

    #[test]
    fn select_option_count_is_bounded() {
        let docs = docs();
        let v = validator(&docs, "component.3.string_select");
        let options: Vec<Value> = (0..26)
            .map(|i| json!({"label": format!("l{i}"), "value": format!("v{i}")}))
            .collect();
        assert!(!v.is_valid(&json!({"type": 3, "custom_id": "s", "options": options})));
        assert!(v.is_valid(&json!({"type": 3, "custom_id": "s", "options": &options[..25]})));
        assert!(docs["component.3.string_select"]["$comment"]
            .as_str()
            .unwrap()
            .contains("min_values <= max_values"));
    }

    #[test]
    fn nullable_fields_accept_null() {
        let docs = docs();
        let v = validator(&docs, "message.0.default");
        assert!(v.is_valid(&json!({"type": 0, "edited_timestamp": null})));
        assert!(!v.is_valid(&json!({"type": 0, "content": null})));
    }
}
