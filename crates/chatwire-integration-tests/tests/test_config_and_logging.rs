//! Tests for configuration loading and diagnostic logging.
//!
//! Configuration is read from YAML files and fixed at registry build time.
//! Lenient fallbacks and over-limit settings are reported through
//! `tracing`; these tests capture the JSON log stream to check them.

use std::io::{self, Write};
use std::sync::{Arc, Mutex};

use chatwire_core::ErrorCode;
use chatwire_schema::{
    normalize_message, standard_registry, validate_message, ConfigError, ErrorMode, Strictness,
    ValidatorConfig,
};
use serde_json::json;
use tracing_subscriber::EnvFilter;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Run `f` with a JSON subscriber at `filter`, returning what it logged.
fn capture_logs(filter: &str, f: impl FnOnce()) -> String {
    let sink = Captured::default();
    let writer = sink.clone();
    let subscriber = tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::new(filter))
        .with_writer(move || writer.clone())
        .finish();
    tracing::subscriber::with_default(subscriber, f);
    sink.text()
}

fn write_config(yaml: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    file
}

// ---------------------------------------------------------------------------
// Configuration files
// ---------------------------------------------------------------------------

#[test]
fn config_file_drives_registry_behavior() {
    let file = write_config("strictness: strict\nerror_mode: fail_fast\nmax_rows: 2\n");
    let config = ValidatorConfig::from_file(file.path()).unwrap();
    assert_eq!(config.strictness, Strictness::Strict);
    assert_eq!(config.error_mode, ErrorMode::FailFast);
    assert_eq!(config.max_rows, 2);
    assert_eq!(config.max_row_children, 5);

    let reg = standard_registry(config).unwrap();
    let row = json!({"type": 1, "components": [{"type": 2, "style": 1, "label": "a", "custom_id": "a"}]});
    let mut second = row.clone();
    second["components"][0]["custom_id"] = json!("b");
    let mut third = row.clone();
    third["components"][0]["custom_id"] = json!("c");

    let payload = json!({"type": 0, "components": [row, second, third]});
    let report = validate_message(&reg, &payload).unwrap_err();
    assert_eq!(report.codes(), vec![ErrorCode::TooManyChildren]);

    let unknown = validate_message(&reg, &json!({"type": 9999})).unwrap_err();
    assert_eq!(unknown.codes(), vec![ErrorCode::UnknownVariant]);
}

#[test]
fn empty_config_file_uses_defaults() {
    let file = write_config("{}\n");
    assert_eq!(
        ValidatorConfig::from_file(file.path()).unwrap(),
        ValidatorConfig::default()
    );
}

#[test]
fn zero_limit_is_rejected() {
    let file = write_config("max_row_children: 0\n");
    match ValidatorConfig::from_file(file.path()) {
        Err(ConfigError::InvalidLimit { field, value, .. }) => {
            assert_eq!(field, "max_row_children");
            assert_eq!(value, 0);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn misspelled_key_is_a_parse_error() {
    let file = write_config("max_rowz: 3\n");
    assert!(matches!(
        ValidatorConfig::from_file(file.path()),
        Err(ConfigError::Parse(_))
    ));
}

#[test]
fn missing_file_is_a_read_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ValidatorConfig::from_file(&dir.path().join("absent.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::Read { .. }));
    assert!(err.to_string().contains("absent.yaml"));
}

// ---------------------------------------------------------------------------
// Logging
// ---------------------------------------------------------------------------

#[test]
fn over_platform_limit_warns_but_applies() {
    let mut loaded = None;
    let logs = capture_logs("warn", || {
        loaded = Some(ValidatorConfig::from_yaml_str("max_rows: 10\n").unwrap());
    });
    assert_eq!(loaded.unwrap().max_rows, 10);
    assert!(logs.contains("max_rows exceeds the platform limit"), "logs: {logs}");
    assert!(logs.contains("\"level\":\"WARN\""), "logs: {logs}");
}

#[test]
fn lenient_fallback_is_logged_at_debug() {
    let reg = standard_registry(ValidatorConfig::lenient()).unwrap();
    let logs = capture_logs("chatwire_schema=debug", || {
        normalize_message(&reg, &json!({"type": 9999})).unwrap();
    });
    assert!(logs.contains("unregistered discriminant"), "logs: {logs}");
    assert!(logs.contains("9999"), "logs: {logs}");
}

#[test]
fn strict_rejection_is_not_logged_as_fallback() {
    let reg = standard_registry(ValidatorConfig::strict()).unwrap();
    let logs = capture_logs("chatwire_schema=debug", || {
        let _ = validate_message(&reg, &json!({"type": 9999}));
    });
    assert!(!logs.contains("unregistered discriminant"), "logs: {logs}");
}
