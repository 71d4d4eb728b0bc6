//! Error types for loom-core.

use thiserror::Error;

/// Result type alias using loom-core's Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur during knowledge integration.
#[derive(Error, Debug)]
pub enum Error {
    /// Synthesis collaborator call failed (HTTP error, malformed payload)
    #[error("Synthesis collaborator error: {message}")]
    Collaborator {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Timeout during a collaborator call
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// Persistence failure. Loss of synthesized output is not locally
    /// recoverable, so this surfaces as a hard failure of the run.
    #[error("Integration storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a collaborator error.
    pub fn collaborator(message: impl Into<String>) -> Self {
        Self::Collaborator {
            message: message.into(),
            source: None,
        }
    }

    /// Create a collaborator error with source.
    pub fn collaborator_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Collaborator {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a timeout error.
    pub fn timeout(duration_ms: u64) -> Self {
        Self::Timeout { duration_ms }
    }
}
