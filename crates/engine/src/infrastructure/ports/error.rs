//! Error types for port operations.

/// Local persistence medium errors.
///
/// These never cross the core boundary: the progress store logs them and
/// degrades to defaults, so a broken disk cannot crash a learning session.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// The medium could not be read or written - includes operation name for
    /// tracing.
    #[error("Storage error in {operation}: {message}")]
    Io {
        operation: &'static str,
        message: String,
    },

    /// Serialization/deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StorageError {
    /// Create an Io error with operation context.
    pub fn io(operation: &'static str, message: impl ToString) -> Self {
        Self::Io {
            operation,
            message: message.to_string(),
        }
    }

    /// Create a Serialization error.
    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }
}

/// Remote progress service errors.
///
/// Absence of a remote record is not an error - ports return `Ok(None)` for
/// first-time users.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RemoteError {
    #[error("Remote request failed: {0}")]
    RequestFailed(String),

    #[error("Invalid remote response: {0}")]
    InvalidResponse(String),
}

impl RemoteError {
    pub fn request_failed(message: impl ToString) -> Self {
        Self::RequestFailed(message.to_string())
    }

    pub fn invalid_response(message: impl ToString) -> Self {
        Self::InvalidResponse(message.to_string())
    }
}
