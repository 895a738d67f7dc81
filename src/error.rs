//! Error types and handling.
//!
//! The retry engine distinguishes transient failures (retried without
//! limit at the submission layer) from permanent ones (fatal to a single
//! issue or to the run). Classification lives on [`JimError::is_transient`]
//! rather than on string matching of error messages.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, JimError>;

/// Errors raised by the migration pipeline.
#[derive(Debug, Error)]
pub enum JimError {
    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A field-level validation failure.
    #[error("Invalid {field}: {message}")]
    Validation { field: String, message: String },

    /// The source export response contained no issue records.
    #[error("Malformed export for {context}: response contained no issues")]
    MalformedExport { context: String },

    /// The destination reported a failed import that will not succeed on retry.
    #[error("Permanent import failure: {message}")]
    PermanentImport { message: String },

    /// The destination reported a failed import caused by a transient
    /// server-side condition; the submission is retried.
    #[error("Transient import failure: {message}")]
    TransientImport { message: String },

    /// An import job stayed pending past the per-issue polling budget.
    #[error("Import job still pending after {seconds}s")]
    PollTimeout { seconds: u64 },

    /// A non-success HTTP response from the source or destination.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// Prerequisite entity creation failed for one or more entities.
    #[error("Failed to create prerequisite entities: {0}")]
    Preparation(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl JimError {
    /// Create a validation error for a named field.
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    /// True when retrying the failed operation may succeed.
    ///
    /// Network-level failures, server-side (5xx) responses, transient
    /// import failures, and polling timeouts are retried; everything
    /// else short-circuits the retry loop.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Http(_) | Self::TransientImport { .. } | Self::PollTimeout { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_errors_are_transient() {
        let err = JimError::Api {
            status: 502,
            message: "bad gateway".to_string(),
        };
        assert!(err.is_transient());
    }

    #[test]
    fn client_errors_are_permanent() {
        let err = JimError::Api {
            status: 422,
            message: "validation failed".to_string(),
        };
        assert!(!err.is_transient());
    }

    #[test]
    fn import_classification_is_explicit() {
        assert!(
            JimError::TransientImport {
                message: "internal error".to_string()
            }
            .is_transient()
        );
        assert!(
            !JimError::PermanentImport {
                message: "bad field".to_string()
            }
            .is_transient()
        );
        assert!(JimError::PollTimeout { seconds: 120 }.is_transient());
    }
}
