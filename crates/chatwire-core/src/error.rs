//! # Error Hierarchy
//!
//! Structured error types for chatwire, built with `thiserror`.
//!
//! Validation failures use a closed ten-kind taxonomy ([`ValidationError`]).
//! Each variant carries the [`FieldPath`] of the offending field and enough
//! context (expected vs. found, limit vs. actual) to act on without
//! re-reading the payload. A validation call returns either the first error
//! (fail-fast) or every error it found (collect) inside a
//! [`ValidationReport`].

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::path::FieldPath;

/// Top-level error type for chatwire.
#[derive(Error, Debug)]
pub enum ChatwireError {
    /// A payload failed validation.
    #[error("validation failed:\n{0}")]
    Validation(#[from] ValidationReport),

    /// Bitfield encode failure.
    #[error("bitfield error: {0}")]
    Bitfield(#[from] BitfieldError),

    /// Canonical byte production failure.
    #[error("canonicalization error: {0}")]
    Canonicalization(#[from] CanonicalizationError),

    /// A wire primitive could not be parsed.
    #[error("invalid primitive: {0}")]
    Primitive(#[from] PrimitiveError),

    /// Schema registry construction failure.
    #[error("registry error: {0}")]
    Registry(String),

    /// Validator configuration failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Stable, machine-readable code for each [`ValidationError`] kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    MissingField,
    TypeMismatch,
    MissingDiscriminant,
    UnknownVariant,
    InvalidVariantCombination,
    OutOfRange,
    NestedContainerNotAllowed,
    TooManyChildren,
    InvalidRowComposition,
    PayloadTooLarge,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::TypeMismatch => "type_mismatch",
            Self::MissingDiscriminant => "missing_discriminant",
            Self::UnknownVariant => "unknown_variant",
            Self::InvalidVariantCombination => "invalid_variant_combination",
            Self::OutOfRange => "out_of_range",
            Self::NestedContainerNotAllowed => "nested_container_not_allowed",
            Self::TooManyChildren => "too_many_children",
            Self::InvalidRowComposition => "invalid_row_composition",
            Self::PayloadTooLarge => "payload_too_large",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single validation failure.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// A required field was absent, or a conditionally required field was
    /// not present while its condition held.
    #[error("{path}: missing required field")]
    MissingField { path: FieldPath },

    /// A value's JSON shape does not match the declared type.
    #[error("{path}: expected {expected}, found {found}")]
    TypeMismatch {
        path: FieldPath,
        expected: String,
        found: String,
    },

    /// The context requires a discriminant field and none was sent.
    #[error("{path}: missing discriminant '{field}' for {context}")]
    MissingDiscriminant {
        path: FieldPath,
        field: String,
        context: String,
    },

    /// The discriminant value is not registered for this context.
    #[error("{path}: unknown {context} variant {tag}")]
    UnknownVariant {
        path: FieldPath,
        context: String,
        tag: String,
    },

    /// Fields that cannot appear together (or must appear together) for
    /// the resolved variant.
    #[error("{path}: invalid variant combination: {reason}")]
    InvalidVariantCombination { path: FieldPath, reason: String },

    /// A numeric value, length, or count fell outside its bounds.
    #[error("{path}: value {actual} outside allowed range [{min}, {max}]")]
    OutOfRange {
        path: FieldPath,
        actual: i64,
        min: i64,
        max: i64,
    },

    /// A container component appeared as the child of another container.
    #[error("{path}: container not allowed at depth {depth}")]
    NestedContainerNotAllowed { path: FieldPath, depth: usize },

    /// A container holds more children than its arity allows.
    #[error("{path}: {found} children exceed the limit of {limit}")]
    TooManyChildren {
        path: FieldPath,
        limit: usize,
        found: usize,
    },

    /// A row mixes control kinds it cannot mix.
    #[error("{path}: invalid row composition: {reason}")]
    InvalidRowComposition { path: FieldPath, reason: String },

    /// A payload, string, or nesting depth exceeded its configured limit.
    #[error("{path}: payload too large ({actual} exceeds limit of {limit})")]
    PayloadTooLarge {
        path: FieldPath,
        limit: usize,
        actual: usize,
    },
}

impl ValidationError {
    /// The machine-readable code for this error's kind.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::MissingField { .. } => ErrorCode::MissingField,
            Self::TypeMismatch { .. } => ErrorCode::TypeMismatch,
            Self::MissingDiscriminant { .. } => ErrorCode::MissingDiscriminant,
            Self::UnknownVariant { .. } => ErrorCode::UnknownVariant,
            Self::InvalidVariantCombination { .. } => ErrorCode::InvalidVariantCombination,
            Self::OutOfRange { .. } => ErrorCode::OutOfRange,
            Self::NestedContainerNotAllowed { .. } => ErrorCode::NestedContainerNotAllowed,
            Self::TooManyChildren { .. } => ErrorCode::TooManyChildren,
            Self::InvalidRowComposition { .. } => ErrorCode::InvalidRowComposition,
            Self::PayloadTooLarge { .. } => ErrorCode::PayloadTooLarge,
        }
    }

    /// The location of the offending field.
    pub fn path(&self) -> &FieldPath {
        match self {
            Self::MissingField { path }
            | Self::TypeMismatch { path, .. }
            | Self::MissingDiscriminant { path, .. }
            | Self::UnknownVariant { path, .. }
            | Self::InvalidVariantCombination { path, .. }
            | Self::OutOfRange { path, .. }
            | Self::NestedContainerNotAllowed { path, .. }
            | Self::TooManyChildren { path, .. }
            | Self::InvalidRowComposition { path, .. }
            | Self::PayloadTooLarge { path, .. } => path,
        }
    }
}

/// Ordered collection of validation errors from one call.
///
/// In fail-fast mode a report holds exactly one error. In collect mode it
/// holds every error in the order the validator encountered them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationReport {
    errors: Vec<ValidationError>,
}

impl ValidationReport {
    pub fn new(errors: Vec<ValidationError>) -> Self {
        Self { errors }
    }

    pub fn single(error: ValidationError) -> Self {
        Self {
            errors: vec![error],
        }
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[ValidationError] {
        &self.errors
    }

    pub fn first(&self) -> Option<&ValidationError> {
        self.errors.first()
    }

    /// Returns true if any error in the report has the given code.
    pub fn contains(&self, code: ErrorCode) -> bool {
        self.errors.iter().any(|e| e.code() == code)
    }

    /// Find the first error reported at the given JSON Pointer.
    pub fn at(&self, pointer: &str) -> Option<&ValidationError> {
        self.errors.iter().find(|e| e.path().to_pointer() == pointer)
    }

    pub fn codes(&self) -> Vec<ErrorCode> {
        self.errors.iter().map(ValidationError::code).collect()
    }

    pub fn into_inner(self) -> Vec<ValidationError> {
        self.errors
    }
}

impl fmt::Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, e) in self.errors.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "  [{}] {e}", e.code())?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationReport {}

impl From<ValidationError> for ValidationReport {
    fn from(error: ValidationError) -> Self {
        Self::single(error)
    }
}

impl IntoIterator for ValidationReport {
    type Item = ValidationError;
    type IntoIter = std::vec::IntoIter<ValidationError>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

/// Errors during canonical serialization.
#[derive(Error, Debug)]
pub enum CanonicalizationError {
    /// JSON serialization failed during canonicalization.
    #[error("serialization failed: {0}")]
    SerializationFailed(#[from] serde_json::Error),
}

/// Errors parsing wire primitives.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PrimitiveError {
    /// Snowflakes are unsigned 64-bit integers, sent as decimal strings.
    #[error("invalid snowflake: \"{0}\" (expected a decimal unsigned 64-bit integer)")]
    InvalidSnowflake(String),

    /// Timestamp string is not RFC 3339 / ISO 8601.
    #[error("invalid timestamp: \"{value}\" ({reason})")]
    InvalidTimestamp { value: String, reason: String },
}

/// Errors encoding named flags.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BitfieldError {
    /// The flag name is not declared by the bitfield.
    #[error("unknown flag '{flag}' for bitfield {bitfield}")]
    UnknownFlag {
        bitfield: &'static str,
        flag: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn out_of_range_display_includes_path_and_bounds() {
        let err = ValidationError::OutOfRange {
            path: FieldPath::root().key("max_values"),
            actual: 26,
            min: 1,
            max: 25,
        };
        let msg = err.to_string();
        assert!(msg.contains("/max_values"));
        assert!(msg.contains("26"));
        assert!(msg.contains("[1, 25]"));
        assert_eq!(err.code(), ErrorCode::OutOfRange);
    }

    #[test]
    fn every_variant_reports_its_path() {
        let path = FieldPath::root().key("components").index(1);
        let errors = vec![
            ValidationError::MissingField { path: path.clone() },
            ValidationError::NestedContainerNotAllowed {
                path: path.clone(),
                depth: 2,
            },
            ValidationError::TooManyChildren {
                path: path.clone(),
                limit: 5,
                found: 6,
            },
        ];
        for e in &errors {
            assert_eq!(e.path(), &path);
        }
    }

    #[test]
    fn error_code_serializes_snake_case() {
        let v = serde_json::to_value(ErrorCode::NestedContainerNotAllowed).unwrap();
        assert_eq!(v, "nested_container_not_allowed");
        assert_eq!(
            ErrorCode::NestedContainerNotAllowed.as_str(),
            "nested_container_not_allowed"
        );
    }

    #[test]
    fn report_lookup_by_pointer() {
        let report = ValidationReport::new(vec![
            ValidationError::MissingField {
                path: FieldPath::root().key("id"),
            },
            ValidationError::OutOfRange {
                path: FieldPath::root().key("max_values"),
                actual: 26,
                min: 1,
                max: 25,
            },
        ]);
        assert_eq!(report.len(), 2);
        assert!(report.contains(ErrorCode::OutOfRange));
        assert!(!report.contains(ErrorCode::PayloadTooLarge));
        let hit = report.at("/max_values").expect("error at /max_values");
        assert_eq!(hit.code(), ErrorCode::OutOfRange);
        assert!(report.at("/nope").is_none());
    }

    #[test]
    fn report_display_prefixes_codes() {
        let report = ValidationReport::single(ValidationError::MissingField {
            path: FieldPath::root().key("type"),
        });
        assert_eq!(report.to_string(), "  [missing_field] /type: missing required field");
    }

    #[test]
    fn chatwire_error_wraps_report() {
        let report = ValidationReport::single(ValidationError::MissingField {
            path: FieldPath::root(),
        });
        let err: ChatwireError = report.into();
        assert!(err.to_string().starts_with("validation failed"));
    }
}
