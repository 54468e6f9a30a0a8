//! Round-trip tests: normalize, serialize, normalize again.
//!
//! For every accepted payload the second normalization must equal the
//! first, and the canonical bytes of both serializations must match.

use chatwire_core::{CanonicalBytes, ErrorCode, FlagSet, MESSAGE_FLAGS};
use chatwire_schema::{
    canonical_bytes, normalize_message, serialize_message, standard_registry, validate_batch,
    SchemaRegistry, ValidatorConfig,
};
use proptest::prelude::*;
use serde_json::{json, Map, Value};

fn registry() -> SchemaRegistry {
    standard_registry(ValidatorConfig::default()).unwrap()
}

fn assert_idempotent(reg: &SchemaRegistry, payload: &Value) {
    let first = normalize_message(reg, payload).unwrap();
    let wire = serialize_message(&first);
    let second = normalize_message(reg, &wire).unwrap();
    assert_eq!(first, second);
    assert_eq!(
        canonical_bytes(&first).unwrap().as_bytes(),
        canonical_bytes(&second).unwrap().as_bytes()
    );
}

// ---------------------------------------------------------------------------
// Fixed payloads
// ---------------------------------------------------------------------------

#[test]
fn rich_message_round_trips() {
    let payload = json!({
        "type": 0,
        "id": "1212121212121212121",
        "channel_id": "33",
        "guild_id": "44",
        "author": {"id": "55", "username": "builder", "global_name": null, "bot": true, "public_flags": 65536},
        "content": "deploy finished",
        "timestamp": "2025-03-01T12:00:00.000000+00:00",
        "edited_timestamp": null,
        "tts": false,
        "mention_everyone": false,
        "mentions": [],
        "mention_roles": ["66"],
        "attachments": [{
            "id": "77",
            "filename": "log.txt",
            "size": 1024,
            "url": "https://cdn.example.com/log.txt",
            "height": null,
            "width": null,
            "flags": 8
        }],
        "embeds": [{
            "type": "rich",
            "title": "Build #12",
            "color": 3066993,
            "fields": [{"name": "status", "value": "green", "inline": true}],
            "footer": {"text": "ci"},
            "thumbnail": {"url": "https://example.com/t.png", "width": 64, "height": 64}
        }],
        "reactions": [{
            "count": 3,
            "count_details": {"burst": 1, "normal": 2},
            "me": true,
            "me_burst": false,
            "emoji": {"id": "88", "name": "ship", "animated": false},
            "burst_colors": ["#ff0000"]
        }],
        "nonce": "abc-123",
        "pinned": false,
        "flags": 4,
        "components": [{
            "type": 1,
            "components": [{"type": 2, "style": 5, "label": "Open", "url": "https://example.com"}]
        }],
        "position": 0
    });
    let reg = registry();
    assert!(chatwire_schema::validate_message(&reg, &payload).is_ok());
    assert_idempotent(&reg, &payload);
    assert_eq!(serialize_message(&normalize_message(&reg, &payload).unwrap()), payload);
}

#[test]
fn integer_snowflakes_converge_after_one_pass() {
    let reg = registry();
    let payload = json!({"type": 0, "id": 1234, "channel_id": "9"});
    let first = serialize_message(&normalize_message(&reg, &payload).unwrap());
    assert_eq!(first["id"], json!("1234"));
    assert_idempotent(&reg, &payload);
}

#[test]
fn integers_beyond_i64_fail_validation_and_normalization_alike() {
    let reg = registry();
    let payload = json!({"type": 0, "position": u64::MAX});
    let report = chatwire_schema::validate_message(&reg, &payload).unwrap_err();
    assert_eq!(report.codes(), vec![ErrorCode::OutOfRange]);
    assert!(report.at("/position").is_some());
    assert_eq!(normalize_message(&reg, &payload).unwrap_err(), report);

    let largest = json!({"type": 0, "position": i64::MAX});
    assert_idempotent(&reg, &largest);
}

#[test]
fn key_order_does_not_change_canonical_bytes() {
    let reg = registry();
    let a: Value =
        serde_json::from_str(r#"{"type":0,"content":"x","tts":true,"pinned":false}"#).unwrap();
    let b: Value =
        serde_json::from_str(r#"{"pinned":false,"tts":true,"content":"x","type":0}"#).unwrap();
    let ca = canonical_bytes(&normalize_message(&reg, &a).unwrap()).unwrap();
    let cb = canonical_bytes(&normalize_message(&reg, &b).unwrap()).unwrap();
    assert_eq!(ca.as_bytes(), cb.as_bytes());
    assert_eq!(ca.as_bytes(), CanonicalBytes::new(&a).unwrap().as_bytes());
}

#[test]
fn batch_matches_sequential_results() {
    let reg = registry();
    let payloads: Vec<Value> = (0..64)
        .map(|i| match i % 4 {
            0 => json!({"type": 19, "message_reference": {"channel_id": "1"}, "referenced_message": null}),
            1 => json!({"type": 0, "content": format!("n{i}")}),
            2 => json!({"type": 9999, "id": i.to_string()}),
            _ => json!({"type": 0, "tts": "no"}),
        })
        .collect();
    let parallel = validate_batch(&reg, &payloads);
    let sequential: Vec<_> = payloads.iter().map(|p| normalize_message(&reg, p)).collect();
    assert_eq!(parallel, sequential);
}

// ---------------------------------------------------------------------------
// Property tests
// ---------------------------------------------------------------------------

fn presence<T: Into<Value> + Clone + std::fmt::Debug + 'static>(
    inner: impl Strategy<Value = T> + 'static,
) -> impl Strategy<Value = Option<Value>> {
    prop_oneof![
        Just(None),
        Just(Some(Value::Null)),
        inner.prop_map(|v| Some(v.into())),
    ]
}

fn timestamp() -> impl Strategy<Value = String> {
    (2015u32..2030, 1u32..13, 1u32..29, 0u32..24, 0u32..60)
        .prop_map(|(y, mo, d, h, mi)| format!("{y}-{mo:02}-{d:02}T{h:02}:{mi:02}:00.000000+00:00"))
}

prop_compose! {
    fn arb_message()(
        kind in prop_oneof![Just(0u64), Just(7), Just(18), Just(46), 1000u64..5000],
        content in proptest::option::of("[a-zA-Z0-9 .,!?]{0,60}"),
        edited in presence(timestamp()),
        flags in proptest::option::of(any::<u64>()),
        nonce in proptest::option::of(prop_oneof![
            any::<i64>().prop_map(Value::from),
            "[a-z0-9]{1,25}".prop_map(Value::from),
        ]),
        extras in proptest::collection::btree_map("x_[a-z]{1,6}", any::<i32>(), 0..4),
    ) -> Value {
        let mut map = Map::new();
        map.insert("type".into(), Value::from(kind));
        if let Some(c) = content {
            map.insert("content".into(), Value::from(c));
        }
        if let Some(e) = edited {
            map.insert("edited_timestamp".into(), e);
        }
        if let Some(f) = flags {
            map.insert("flags".into(), Value::from(f));
        }
        if let Some(n) = nonce {
            map.insert("nonce".into(), n);
        }
        for (k, v) in extras {
            map.insert(k, Value::from(v));
        }
        Value::Object(map)
    }
}

proptest! {
    #[test]
    fn normalization_is_idempotent(payload in arb_message()) {
        let reg = registry();
        let first = normalize_message(&reg, &payload).unwrap();
        let second = normalize_message(&reg, &serialize_message(&first)).unwrap();
        prop_assert_eq!(&first, &second);
    }

    #[test]
    fn serialization_reproduces_accepted_payloads(payload in arb_message()) {
        let reg = registry();
        let msg = normalize_message(&reg, &payload).unwrap();
        prop_assert_eq!(serialize_message(&msg), payload);
    }

    #[test]
    fn message_flags_keep_every_bit(raw in any::<u64>()) {
        let set: FlagSet = MESSAGE_FLAGS.decode(raw);
        prop_assert_eq!(set.bits(), raw);
    }
}
