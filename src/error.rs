//! Error types for the vault deduplication library.

use thiserror::Error;

/// Errors that can occur while loading, cleaning or saving a vault export.
///
/// Every variant is fatal to a run: nothing is retried and no partial output
/// is written.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VaultError {
    /// A record is missing the field that decides its variant.
    #[error("malformed record {record}: {reason}")]
    MalformedRecord { record: String, reason: String },

    /// The inner document is missing, unreadable or structurally invalid.
    #[error("format error in {context}: {reason}")]
    Format { context: String, reason: String },

    /// Two records with different variants or equality keys were merged.
    #[error("cannot merge {left} with {right}: {reason}")]
    MergeMismatch {
        left: String,
        right: String,
        reason: String,
    },

    /// No adapter is registered under the requested format name.
    #[error("unsupported format '{format}' (supported: {supported})")]
    UnsupportedFormat { format: String, supported: String },

    /// Error serializing/deserializing JSON
    #[error("JSON error: {0}")]
    Json(String),

    /// Filesystem failure while staging or committing output
    #[error("I/O error on {path}: {reason}")]
    Io { path: String, reason: String },
}

impl VaultError {
    pub(crate) fn format(context: impl Into<String>, reason: impl Into<String>) -> Self {
        VaultError::Format {
            context: context.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn malformed(record: impl Into<String>, reason: impl Into<String>) -> Self {
        VaultError::MalformedRecord {
            record: record.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for VaultError {
    fn from(err: serde_json::Error) -> Self {
        VaultError::Json(err.to_string())
    }
}

/// Result type alias for vault operations.
pub type VaultResult<T> = Result<T, VaultError>;
