//! Configuration parsing errors.

/// Configuration parsing errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// The document could not be parsed
    #[error("Failed to parse {source_format} configuration: {message}")]
    Parse {
        /// Document syntax (yaml, json)
        source_format: &'static str,
        /// Parser message
        message: String,
    },

    /// A field holds an unsupported value
    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Field name
        field: String,
        /// Reason for rejection
        reason: String,
    },
}

impl ConfigError {
    /// Create a YAML parse error.
    pub fn yaml(message: impl Into<String>) -> Self {
        ConfigError::Parse {
            source_format: "yaml",
            message: message.into(),
        }
    }

    /// Create a JSON parse error.
    pub fn json(message: impl Into<String>) -> Self {
        ConfigError::Parse {
            source_format: "json",
            message: message.into(),
        }
    }
}
