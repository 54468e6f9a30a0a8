//! Tests for reply and thread-starter reference handling.
//!
//! A reply distinguishes three states for `referenced_message`: never
//! resolved (key absent), deleted (key null), and resolved (an embedded
//! message). The states must survive normalization and re-serialization.

use chatwire_core::{ErrorCode, Presence, Snowflake};
use chatwire_schema::{
    normalize_message, serialize_message, standard_registry, validate_message, MessageBody,
    MessageKind, ReferencedMessage, SchemaRegistry, ValidatorConfig,
};
use serde_json::{json, Value};

fn registry() -> SchemaRegistry {
    standard_registry(ValidatorConfig::default()).unwrap()
}

fn reply(referenced: Option<Value>) -> Value {
    let mut payload = json!({
        "type": 19,
        "id": "1100",
        "channel_id": "1",
        "content": "agreed",
        "message_reference": {"channel_id": "1", "message_id": "1000"}
    });
    if let Some(r) = referenced {
        payload["referenced_message"] = r;
    }
    payload
}

// ---------------------------------------------------------------------------
// Three states
// ---------------------------------------------------------------------------

#[test]
fn null_reference_means_deleted() {
    let msg = normalize_message(&registry(), &reply(Some(Value::Null))).unwrap();
    assert_eq!(msg.kind, MessageKind::Reply);
    assert_eq!(
        msg.body,
        MessageBody::Reply {
            referenced: ReferencedMessage::Deleted
        }
    );
}

#[test]
fn absent_reference_means_not_attempted() {
    let msg = normalize_message(&registry(), &reply(None)).unwrap();
    assert_eq!(
        msg.body,
        MessageBody::Reply {
            referenced: ReferencedMessage::NotAttempted
        }
    );
}

#[test]
fn null_and_absent_reference_payloads_differ() {
    let reg = registry();
    let with_null = json!({"type": 19, "message_reference": {"channel_id": "1"}, "referenced_message": null});
    let without = json!({"type": 19, "message_reference": {"channel_id": "1"}});
    let a = normalize_message(&reg, &with_null).unwrap();
    let b = normalize_message(&reg, &without).unwrap();
    assert_ne!(a, b);
    assert_eq!(a.header, b.header);
}

#[test]
fn embedded_reference_is_resolved() {
    let original = json!({"type": 0, "id": "1000", "content": "shall we?", "pinned": false});
    let msg = normalize_message(&registry(), &reply(Some(original))).unwrap();
    let Some(ReferencedMessage::Resolved(inner)) = msg.referenced() else {
        panic!("expected a resolved reference, got {:?}", msg.referenced());
    };
    assert_eq!(inner.header.id, Presence::Present(Snowflake::new(1000)));
    assert_eq!(inner.header.pinned, Presence::Present(false));
}

#[test]
fn states_survive_serialization() {
    let reg = registry();
    for referenced in [None, Some(Value::Null), Some(json!({"type": 0, "content": "x"}))] {
        let payload = reply(referenced);
        let wire = serialize_message(&normalize_message(&reg, &payload).unwrap());
        assert_eq!(wire, payload);
    }
}

// ---------------------------------------------------------------------------
// Reference requirements
// ---------------------------------------------------------------------------

#[test]
fn reply_without_message_reference_fails() {
    let report = validate_message(&registry(), &json!({"type": 19, "content": "hi"})).unwrap_err();
    assert_eq!(report.codes(), vec![ErrorCode::MissingField]);
    assert!(report.at("/message_reference").is_some());
}

#[test]
fn thread_starter_follows_reply_rules() {
    let reg = registry();
    let msg = normalize_message(
        &reg,
        &json!({"type": 21, "message_reference": {"channel_id": "5"}, "referenced_message": null}),
    )
    .unwrap();
    assert_eq!(
        msg.body,
        MessageBody::ThreadStarter {
            referenced: ReferencedMessage::Deleted
        }
    );
    assert!(validate_message(&reg, &json!({"type": 21})).is_err());
}

#[test]
fn reference_chains_stop_at_configured_depth() {
    let payload = reply(Some(json!({
        "type": 19,
        "message_reference": {"channel_id": "1"},
        "referenced_message": {"type": 0}
    })));
    let report = validate_message(&registry(), &payload).unwrap_err();
    let err = report.at("/referenced_message/referenced_message").unwrap();
    assert_eq!(err.code(), ErrorCode::PayloadTooLarge);

    let deeper = standard_registry(ValidatorConfig {
        max_reference_depth: 2,
        ..ValidatorConfig::default()
    })
    .unwrap();
    assert!(validate_message(&deeper, &payload).is_ok());
}

#[test]
fn forwarded_reference_requires_snapshots() {
    let reg = registry();
    let forward = json!({
        "type": 0,
        "message_reference": {"type": 1, "channel_id": "1", "message_id": "2"}
    });
    let report = validate_message(&reg, &forward).unwrap_err();
    assert!(report.at("/message_snapshots").is_some());

    let mut complete = forward.clone();
    complete["message_snapshots"] = json!([{"message": {"content": "fwd"}}]);
    assert!(validate_message(&reg, &complete).is_ok());
}

#[test]
fn forward_reference_needs_message_id() {
    let payload = json!({
        "type": 0,
        "message_reference": {"type": 1, "channel_id": "1"},
        "message_snapshots": []
    });
    let report = validate_message(&registry(), &payload).unwrap_err();
    assert_eq!(
        report.at("/message_reference/message_id").map(|e| e.code()),
        Some(ErrorCode::MissingField)
    );
}
