//! Configuration error types

/// Errors that can occur while loading validator configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid JSON or does not match the schema.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),

    /// A value parsed but is not usable.
    #[error("invalid config for '{field}': {message}")]
    Invalid { field: String, message: String },
}

impl ConfigError {
    /// Creates a new invalid value error.
    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Invalid {
            field: field.into(),
            message: message.into(),
        }
    }
}
