//! Layered error definitions
//!
//! Categorized by source: config / sink / general

use thiserror::Error;

/// Unified error type
#[derive(Debug, Error)]
pub enum ContractError {
    // ===== Configuration Errors =====
    /// Configuration parse error
    #[error("config parse error: {message}")]
    ConfigParse {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Configuration validation error
    #[error("config validation error at '{field}': {message}")]
    ConfigValidation { field: String, message: String },

    // ===== Sink Errors =====
    /// Sink write error
    #[error("sink '{sink_name}' write error: {message}")]
    SinkWrite { sink_name: String, message: String },

    /// Sink accepted fewer bytes than it was given
    #[error("sink '{sink_name}' short write: wrote {written} of {expected} bytes")]
    ShortWrite {
        sink_name: String,
        written: usize,
        expected: usize,
    },

    /// Sink connection error
    #[error("sink '{sink_name}' connection error: {message}")]
    SinkConnection { sink_name: String, message: String },

    /// Write attempted on a sink that was already closed
    #[error("sink '{sink_name}' is closed")]
    SinkClosed { sink_name: String },

    /// Sink write task panicked
    #[error("sink '{sink_name}' panicked: {message}")]
    SinkPanicked { sink_name: String, message: String },

    // ===== General Errors =====
    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Other error
    #[error("{0}")]
    Other(String),
}

impl ContractError {
    /// Create configuration parse error
    pub fn config_parse(message: impl Into<String>) -> Self {
        Self::ConfigParse {
            message: message.into(),
            source: None,
        }
    }

    /// Create configuration validation error
    pub fn config_validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ConfigValidation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create sink write error
    pub fn sink_write(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkWrite {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Create short write error
    pub fn short_write(sink_name: impl Into<String>, written: usize, expected: usize) -> Self {
        Self::ShortWrite {
            sink_name: sink_name.into(),
            written,
            expected,
        }
    }

    /// Create sink connection error
    pub fn sink_connection(sink_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SinkConnection {
            sink_name: sink_name.into(),
            message: message.into(),
        }
    }

    /// Create sink closed error
    pub fn sink_closed(sink_name: impl Into<String>) -> Self {
        Self::SinkClosed {
            sink_name: sink_name.into(),
        }
    }

    /// Whether this error was produced by a sink (as opposed to configuration)
    pub fn is_sink_error(&self) -> bool {
        matches!(
            self,
            Self::SinkWrite { .. }
                | Self::ShortWrite { .. }
                | Self::SinkConnection { .. }
                | Self::SinkClosed { .. }
                | Self::SinkPanicked { .. }
                | Self::Io(_)
        )
    }
}
