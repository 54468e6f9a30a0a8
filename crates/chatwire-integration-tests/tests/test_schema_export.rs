//! Cross-checks exported JSON Schema documents against the engine.
//!
//! The export is a relaxation: every payload the engine accepts must also
//! validate against the document for its variant.

use chatwire_schema::{
    export::document_key, registry_to_json_schemas, standard_registry, validate_message, Family,
    SchemaRegistry, ValidatorConfig,
};
use serde_json::{json, Value};

fn registry() -> SchemaRegistry {
    standard_registry(ValidatorConfig::default()).unwrap()
}

fn accepted_payloads() -> Vec<Value> {
    vec![
        json!({"type": 0, "content": "plain"}),
        json!({"type": 0, "id": 99, "nonce": 9223372036854775807i64, "flags": 4096}),
        json!({
            "type": 0,
            "author": {"id": "1", "username": "a", "avatar": null},
            "embeds": [{"title": "t", "image": {"url": "https://x/i.png"}, "video": {"width": 10}}],
            "reactions": [{"count": 1, "me": false, "emoji": {"id": null, "name": "x"}}]
        }),
        json!({"type": 19, "message_reference": {"channel_id": "1"}, "referenced_message": null}),
        json!({
            "type": 19,
            "message_reference": {"type": 0, "message_id": "2", "channel_id": "1"},
            "referenced_message": {"type": 0, "content": "orig"}
        }),
        json!({
            "type": 0,
            "message_reference": {"type": 1, "message_id": "2", "channel_id": "1"},
            "message_snapshots": [{"message": {}}]
        }),
        json!({"type": 20, "interaction": {"id": "5", "name": "ping"}}),
        json!({
            "type": 0,
            "components": [
                {"type": 1, "components": [{"type": 2, "style": 6, "sku_id": "3"}]},
                {"type": 1, "components": [{"type": 3, "custom_id": "s", "options": [{"label": "a", "value": "a"}]}]}
            ]
        }),
    ]
}

fn document_for(registry: &SchemaRegistry, docs: &std::collections::BTreeMap<String, Value>, payload: &Value) -> Value {
    let tag = payload["type"].as_u64().unwrap();
    let key = match registry.lookup(Family::Message, tag) {
        Ok(schema) => document_key(schema),
        Err(_) => "message.unknown".to_string(),
    };
    docs[&key].clone()
}

#[test]
fn engine_accepted_payloads_validate_against_export() {
    let reg = registry();
    let docs = registry_to_json_schemas(&reg);
    for payload in accepted_payloads() {
        assert!(validate_message(&reg, &payload).is_ok(), "engine rejected {payload}");
        let doc = document_for(&reg, &docs, &payload);
        let validator = jsonschema::validator_for(&doc).unwrap();
        let errors: Vec<String> = validator.iter_errors(&payload).map(|e| e.to_string()).collect();
        assert!(errors.is_empty(), "{payload} failed export: {errors:?}");
    }
}

#[test]
fn unknown_kind_validates_against_generic_document() {
    let reg = registry();
    let docs = registry_to_json_schemas(&reg);
    let payload = json!({"type": 9999, "content": "future", "new_field": [1]});
    let validator = jsonschema::validator_for(&docs["message.unknown"]).unwrap();
    assert!(validator.is_valid(&payload));
}

#[test]
fn every_button_style_has_a_document() {
    let docs = registry_to_json_schemas(&registry());
    for key in [
        "button_style.1.primary",
        "button_style.2.secondary",
        "button_style.3.success",
        "button_style.4.danger",
        "button_style.5.link",
        "button_style.6.premium",
    ] {
        assert!(docs.contains_key(key), "missing {key}");
    }
    let premium = jsonschema::validator_for(&docs["button_style.6.premium"]).unwrap();
    assert!(!premium.is_valid(&json!({"type": 2, "style": 6, "sku_id": "1", "label": "x"})));
}
