//! Error types for port operations.

#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    /// Transport failure before any status was received
    #[error("LLM request failed: {0}")]
    RequestFailed(String),
    /// The backend answered with a non-success status
    #[error("LLM backend returned {status}: {body}")]
    Status {
        status: u16,
        body: String,
        /// Seconds from a `Retry-After` header, when present
        retry_after: Option<u64>,
    },
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
    /// No endpoint or credential configured
    #[error("LLM backend not configured")]
    NotConfigured,
}

impl LlmError {
    /// Whether a later attempt can succeed. Rate limits, timeouts and server
    /// errors are transient; other client errors and missing configuration are not.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::RequestFailed(_) | Self::InvalidResponse(_) => true,
            Self::Status { status, .. } => {
                matches!(status, 408 | 409 | 425 | 429 | 500..=599)
            }
            Self::NotConfigured => false,
        }
    }

    /// Server-requested wait, if any.
    pub fn retry_after(&self) -> Option<u64> {
        match self {
            Self::Status { retry_after, .. } => *retry_after,
            _ => None,
        }
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ImageGenError {
    #[error("Generation failed: {0}")]
    GenerationFailed(String),
    #[error("Image payload could not be decoded: {0}")]
    Decode(String),
    #[error("Service unavailable")]
    Unavailable,
}

/// Document store failures - includes the operation for tracing.
#[derive(Debug, Clone, thiserror::Error)]
pub enum StoreError {
    #[error("Store error in {operation}: {message}")]
    Write {
        operation: &'static str,
        message: String,
    },
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl StoreError {
    pub fn write(operation: &'static str, message: impl ToString) -> Self {
        Self::Write {
            operation,
            message: message.to_string(),
        }
    }

    pub fn serialization(message: impl ToString) -> Self {
        Self::Serialization(message.to_string())
    }
}

/// Asset store failures.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AssetError {
    #[error("Asset storage failed for '{path}': {message}")]
    Io { path: String, message: String },
    #[error("Invalid asset path: {0}")]
    InvalidPath(String),
}

impl AssetError {
    pub fn io(path: impl Into<String>, message: impl ToString) -> Self {
        Self::Io {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
