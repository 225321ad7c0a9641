//! Error types for the table model.
//!
//! Interactive operations (selecting, navigating, filtering from user input)
//! never surface these: invalid ids are no-ops and malformed filters fail
//! open. Errors are only returned from setup paths such as loading
//! configuration or converting host records.

pub use tablekit_core::ConfigError;

use crate::record::RecordId;

/// Result type alias for table setup operations.
pub type Result<T> = std::result::Result<T, TableError>;

/// Top-level error for table setup.
#[derive(Debug, thiserror::Error)]
pub enum TableError {
    /// Invalid configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A configuration document could not be parsed.
    #[error("Failed to parse {format} configuration: {message}")]
    ConfigParse {
        format: &'static str,
        message: String,
    },

    /// A host record could not be converted.
    #[error("Record error: {0}")]
    Record(#[from] RecordError),
}

impl From<toml::de::Error> for TableError {
    fn from(err: toml::de::Error) -> Self {
        Self::ConfigParse {
            format: "TOML",
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for TableError {
    fn from(err: serde_json::Error) -> Self {
        Self::ConfigParse {
            format: "JSON",
            message: err.to_string(),
        }
    }
}

/// Errors converting host data into records.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RecordError {
    /// The record is not a JSON object.
    #[error("Record must be an object, got {0}")]
    NotAnObject(String),

    /// A record list is not a JSON array.
    #[error("Records must be an array, got {0}")]
    NotAnArray(String),

    /// The id column is absent.
    #[error("Record is missing the '{0}' field")]
    MissingId(String),

    /// The id is present but not an integer.
    #[error("Record id must be an integer, got {0}")]
    InvalidId(String),

    /// Two records share an id.
    #[error("Duplicate record id {0}")]
    DuplicateId(RecordId),
}

/// A filter expression that could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Filter parse error at offset {offset}: {message}")]
pub struct FilterError {
    /// Byte offset into the expression text.
    pub offset: usize,
    /// What went wrong.
    pub message: String,
}

impl FilterError {
    /// Create a parse error at `offset`.
    pub fn new(offset: usize, message: impl Into<String>) -> Self {
        Self {
            offset,
            message: message.into(),
        }
    }
}

/// A filter expression that failed for one record.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EvalError {
    /// The expression names something that is neither a column nor `group`.
    #[error("Unknown name '{0}'")]
    UnknownName(String),

    /// An ordering comparison between values that cannot be ordered.
    #[error("Cannot compare {left} with {right}")]
    TypeMismatch {
        left: &'static str,
        right: &'static str,
    },
}
