//! Error types for the Mentor tutoring engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the Mentor domain layer.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait.
#[derive(Error, Debug, Clone, Serialize)]
pub enum MentorError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// An attempted state mutation that would break a session invariant
    #[error("Invariant violation: {0}")]
    Invariant(String),

    /// External capability failure (wraps [`CapabilityError`])
    #[error("Capability error: {0}")]
    Capability(#[from] CapabilityError),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl MentorError {
    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Invariant error
    pub fn invariant(message: impl Into<String>) -> Self {
        Self::Invariant(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl From<serde_json::Error> for MentorError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for MentorError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from anyhow::Error (transitional, should be removed eventually)
impl From<anyhow::Error> for MentorError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, MentorError>`.
pub type Result<T> = std::result::Result<T, MentorError>;

/// Errors produced at the external-capability boundary.
///
/// Every call to a language-model capability is fallible in exactly these
/// ways: the call itself failed, it timed out, or it returned data that
/// does not satisfy the declared output schema. The orchestrator treats
/// all three as "abort the turn safely" - none of them may corrupt
/// session state.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum CapabilityError {
    /// The capability invocation itself failed (network, process, API).
    #[error("Capability '{capability}' execution failed: {message}")]
    ExecutionFailed { capability: String, message: String },

    /// The capability did not respond within the configured deadline.
    #[error("Capability '{capability}' timed out after {seconds}s")]
    Timeout { capability: String, seconds: u64 },

    /// The capability returned output that fails schema validation.
    ///
    /// Carries the capability and schema names for diagnostics; required
    /// fields are never silently defaulted.
    #[error("Capability '{capability}' returned invalid output for schema '{schema}': {message}")]
    InvalidOutput {
        capability: String,
        schema: String,
        message: String,
    },
}

impl CapabilityError {
    /// Creates an ExecutionFailed error
    pub fn execution_failed(capability: impl Into<String>, message: impl Into<String>) -> Self {
        Self::ExecutionFailed {
            capability: capability.into(),
            message: message.into(),
        }
    }

    /// Creates an InvalidOutput error
    pub fn invalid_output(
        capability: impl Into<String>,
        schema: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidOutput {
            capability: capability.into(),
            schema: schema.into(),
            message: message.into(),
        }
    }
}
