//! Error types for sievekit operations

use thiserror::Error;

/// Errors raised while translating between the simple model and the filter tree.
///
/// Only the first two variants are recoverable: the public facade degrades them
/// to an empty value. `Internal` marks a defect and always reaches the caller.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SieveError {
    /// The representation is structurally malformed.
    #[error("InvalidInputError: {message}")]
    InvalidInput { message: String },

    /// The representation is well formed but encodes something this format refuses to model.
    #[error("UnsupportedRepresentationError: {message}")]
    UnsupportedRepresentation { message: String },

    #[error("InternalError: {message}")]
    Internal { message: String },
}

impl SieveError {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    pub fn unsupported(message: impl Into<String>) -> Self {
        Self::UnsupportedRepresentation {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Stable error name, as exposed to callers of the JSON facade.
    pub fn name(&self) -> &'static str {
        match self {
            Self::InvalidInput { .. } => "InvalidInputError",
            Self::UnsupportedRepresentation { .. } => "UnsupportedRepresentationError",
            Self::Internal { .. } => "InternalError",
        }
    }

    /// Human-readable message without the name prefix.
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidInput { message }
            | Self::UnsupportedRepresentation { message }
            | Self::Internal { message } => message,
        }
    }

    /// Whether the facade may replace this error with an empty value.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Internal { .. })
    }
}

impl From<serde_json::Error> for SieveError {
    fn from(err: serde_json::Error) -> Self {
        Self::invalid_input(err.to_string())
    }
}

/// Result type alias for sievekit operations.
pub type SieveResult<T> = Result<T, SieveError>;

// =============================================================================
// TESTS
// =============================================================================
