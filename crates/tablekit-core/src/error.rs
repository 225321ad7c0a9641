//! Error types for tablekit core.

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors raised while validating runtime configuration.
///
/// Runtime operations (emitting, polling, submitting) never fail; only
/// setup paths return these.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// A configuration value is outside its allowed range.
    #[error("Invalid value for '{field}': {message}")]
    InvalidValue { field: String, message: String },

    /// A required configuration value is missing.
    #[error("Missing required value '{0}'")]
    Missing(String),
}

impl ConfigError {
    /// Create an invalid-value error.
    pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }

    /// Create a missing-value error.
    pub fn missing(field: impl Into<String>) -> Self {
        Self::Missing(field.into())
    }
}
