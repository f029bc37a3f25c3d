//! Object model configuration
//!
//! Bound to a schema when it is compiled. Every field has a default, so an
//! empty JSON document is a valid configuration.

use serde::{Deserialize, Serialize};

use crate::schema::{SchemaError, SchemaResult};

/// Behaviour switches shared by every instance of a compiled schema
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Separator used when an array is typecast to a string (default: ",")
    #[serde(default = "default_array_separator")]
    pub array_separator: String,

    /// Numeric dates below this magnitude are epoch seconds, otherwise
    /// epoch milliseconds (default: 10_000_000_000)
    #[serde(default = "default_epoch_seconds_limit")]
    pub epoch_seconds_limit: f64,

    /// Allow "parent.child" paths in get/set (default: false)
    #[serde(default)]
    pub dot_notation: bool,

    /// Match property names case-insensitively (default: false)
    #[serde(default)]
    pub keys_ignore_case: bool,

    /// Keep a per-instance log of rejected writes (default: true)
    #[serde(default = "default_record_rejections")]
    pub record_rejections: bool,
}

fn default_array_separator() -> String {
    ",".to_string()
}

fn default_epoch_seconds_limit() -> f64 {
    10_000_000_000.0
}

fn default_record_rejections() -> bool {
    true
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            array_separator: default_array_separator(),
            epoch_seconds_limit: default_epoch_seconds_limit(),
            dot_notation: false,
            keys_ignore_case: false,
            record_rejections: default_record_rejections(),
        }
    }
}

impl ModelConfig {
    /// Parses a configuration from a JSON document.
    pub fn from_json_str(content: &str) -> SchemaResult<Self> {
        serde_json::from_str(content).map_err(|e| SchemaError::MalformedConfig {
            reason: e.to_string(),
        })
    }

    /// Returns a copy with dot notation enabled
    pub fn with_dot_notation(mut self) -> Self {
        self.dot_notation = true;
        self
    }

    /// Returns a copy with case-insensitive property names
    pub fn with_keys_ignore_case(mut self) -> Self {
        self.keys_ignore_case = true;
        self
    }
}
