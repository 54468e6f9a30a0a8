//! # Validator Configuration
//!
//! Runtime knobs for the validation engine: strictness toward unregistered
//! discriminants, error reporting mode, and every size and depth limit the
//! engine enforces. A [`ValidatorConfig`] is fixed when the registry is
//! built and cannot change afterwards.
//!
//! ## File Format
//!
//! Configuration is YAML. Every key is optional and falls back to the
//! platform defaults below; unknown keys are rejected so a typo does not
//! silently leave a limit at its default.
//!
//! ```yaml
//! strictness: strict        # strict | lenient
//! error_mode: fail_fast     # fail_fast | collect
//! max_rows: 5
//! max_row_children: 5
//! max_string_bytes: 16384
//! ```

use std::path::Path;

use chatwire_core::ChatwireError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Rows a message may carry, as enforced by the platform.
pub const PROTOCOL_MAX_ROWS: usize = 5;

/// Components an action row may hold, as enforced by the platform.
pub const PROTOCOL_MAX_ROW_CHILDREN: usize = 5;

/// How the resolver treats a discriminant with no registered variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strictness {
    /// Unregistered discriminants fail with `UnknownVariant`.
    Strict,
    /// Unregistered discriminants resolve to a generic fallback and the raw
    /// payload is kept.
    #[default]
    Lenient,
}

/// Whether validation stops at the first error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorMode {
    FailFast,
    #[default]
    Collect,
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ValidatorConfig {
    pub strictness: Strictness,
    pub error_mode: ErrorMode,
    /// Deepest component level the tree walk visits. Level 1 is a top-level
    /// row, level 2 is a row's child; deeper levels exist only below nested
    /// containers, which are always rejected.
    pub max_component_depth: usize,
    /// Top-level rows per message.
    pub max_rows: usize,
    /// Children per action row.
    pub max_row_children: usize,
    /// Longest string value, in UTF-8 bytes.
    pub max_string_bytes: usize,
    /// Estimated serialized size of a whole payload, in bytes.
    pub max_payload_bytes: usize,
    /// Deepest JSON nesting accepted before any schema work starts.
    pub max_value_depth: usize,
    /// How many `referenced_message` levels are followed.
    pub max_reference_depth: usize,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            strictness: Strictness::Lenient,
            error_mode: ErrorMode::Collect,
            max_component_depth: 2,
            max_rows: PROTOCOL_MAX_ROWS,
            max_row_children: PROTOCOL_MAX_ROW_CHILDREN,
            max_string_bytes: 16 * 1024,
            max_payload_bytes: 1024 * 1024,
            max_value_depth: 64,
            max_reference_depth: 1,
        }
    }
}

impl ValidatorConfig {
    /// Defaults with strict discriminant handling.
    pub fn strict() -> Self {
        Self {
            strictness: Strictness::Strict,
            ..Self::default()
        }
    }

    /// Defaults with lenient discriminant handling.
    pub fn lenient() -> Self {
        Self::default()
    }

    pub fn with_strictness(mut self, strictness: Strictness) -> Self {
        self.strictness = strictness;
        self
    }

    pub fn with_error_mode(mut self, error_mode: ErrorMode) -> Self {
        self.error_mode = error_mode;
        self
    }

    pub fn is_strict(&self) -> bool {
        self.strictness == Strictness::Strict
    }

    /// Parse and check a YAML configuration document.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and check a YAML configuration file.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml_str(&content)
    }

    /// Reject limits that would make every payload invalid.
    ///
    /// Limits above the platform's own (`max_rows > 5`) are accepted with a
    /// warning: the engine will pass payloads the platform later refuses.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let positive = [
            ("max_rows", self.max_rows),
            ("max_row_children", self.max_row_children),
            ("max_string_bytes", self.max_string_bytes),
            ("max_payload_bytes", self.max_payload_bytes),
            ("max_value_depth", self.max_value_depth),
        ];
        for (field, value) in positive {
            if value == 0 {
                return Err(ConfigError::InvalidLimit {
                    field,
                    value,
                    reason: "must be greater than zero",
                });
            }
        }
        if self.max_component_depth < 2 {
            return Err(ConfigError::InvalidLimit {
                field: "max_component_depth",
                value: self.max_component_depth,
                reason: "rows need at least one level of children",
            });
        }

        if self.max_rows > PROTOCOL_MAX_ROWS {
            tracing::warn!(
                max_rows = self.max_rows,
                protocol_limit = PROTOCOL_MAX_ROWS,
                "max_rows exceeds the platform limit"
            );
        }
        if self.max_row_children > PROTOCOL_MAX_ROW_CHILDREN {
            tracing::warn!(
                max_row_children = self.max_row_children,
                protocol_limit = PROTOCOL_MAX_ROW_CHILDREN,
                "max_row_children exceeds the platform limit"
            );
        }
        Ok(())
    }
}

/// Configuration load failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("cannot read config file '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config YAML: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid limit {field} = {value}: {reason}")]
    InvalidLimit {
        field: &'static str,
        value: usize,
        reason: &'static str,
    },
}

impl From<ConfigError> for ChatwireError {
    fn from(e: ConfigError) -> Self {
        ChatwireError::Config(e.to_string())
    }
}
