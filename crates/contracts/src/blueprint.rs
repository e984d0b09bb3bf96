//! TeeBlueprint - Config Loader output
//!
//! Describes a complete fan-out configuration: input chunking and output routing.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete fan-out configuration blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeeBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Input settings
    #[serde(default)]
    pub input: InputConfig,

    /// Output routing
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

/// How the input stream is cut into broadcast writes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    /// Maximum bytes per broadcast write
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
        }
    }
}

fn default_chunk_size() -> usize {
    8192
}

/// Sink output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink name
    pub name: String,

    /// Sink type
    pub sink_type: SinkType,

    /// Type-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl SinkConfig {
    /// Create a sink config without parameters
    pub fn new(name: impl Into<String>, sink_type: SinkType) -> Self {
        Self {
            name: name.into(),
            sink_type,
            params: HashMap::new(),
        }
    }

    /// Add a type-specific parameter
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Sink type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// Process standard output
    Stdout,
    /// File output
    File,
    /// Network output (TCP)
    Network,
    /// Tracing log output
    Log,
    /// In-memory buffer
    Memory,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blueprint_defaults() {
        let bp: TeeBlueprint = serde_json::from_str(r#"{}"#).unwrap();
        assert_eq!(bp.version, ConfigVersion::V1);
        assert_eq!(bp.input.chunk_size, 8192);
        assert!(bp.sinks.is_empty());
    }

    #[test]
    fn test_sink_type_snake_case() {
        let sink: SinkConfig =
            serde_json::from_str(r#"{ "name": "out", "sink_type": "stdout" }"#).unwrap();
        assert_eq!(sink.sink_type, SinkType::Stdout);
        assert!(sink.params.is_empty());
    }

    #[test]
    fn test_sink_config_builder() {
        let sink = SinkConfig::new("archive", SinkType::File).with_param("path", "/tmp/out.log");
        assert_eq!(sink.params.get("path").map(String::as_str), Some("/tmp/out.log"));
    }
}
