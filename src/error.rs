use crate::pipeline::StepId;
use thiserror::Error;

/// Central error type for the upload processing core
#[derive(Error, Debug)]
pub enum ShareError {
    // ============================================================================
    // Upload Errors
    // ============================================================================
    #[error("File too large: {size} bytes exceeds the {limit} byte limit")]
    SizeExceeded { size: u64, limit: u64 },

    #[error("Upload failed: {reason}")]
    ProcessingFailed {
        stage: Option<StepId>,
        reason: String,
    },

    #[error("Another upload is already in progress")]
    UploadInProgress,

    // ============================================================================
    // Pipeline Errors
    // ============================================================================
    #[error("Invalid state transition: {0}")]
    InvalidStateTransition(String),

    #[error("Unknown processing step: {0}")]
    UnknownStep(String),

    #[error("Stage failed: {0}")]
    StageFailed(String),

    #[error("Pipeline error: {0}")]
    PipelineError(String),

    // ============================================================================
    // Download Code Errors
    // ============================================================================
    #[error("Invalid download code: {0}")]
    InvalidCode(String),

    #[error("Download code does not match")]
    CodeMismatch,

    #[error("Download code has expired")]
    CodeExpired,

    // ============================================================================
    // Generic/System Errors
    // ============================================================================
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Mutex lock error")]
    LockError,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Builder pattern validation error
    #[error("Builder error: {0}")]
    BuilderError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ShareError {
    /// Whether the caller can recover by selecting another file
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            ShareError::SizeExceeded { .. }
                | ShareError::ProcessingFailed { .. }
                | ShareError::UploadInProgress
        )
    }
}

// Implement conversion from PoisonError for Mutex locks
impl<T> From<std::sync::PoisonError<T>> for ShareError {
    fn from(_: std::sync::PoisonError<T>) -> Self {
        ShareError::LockError
    }
}

// Conversion to String for presentation layers
impl From<ShareError> for String {
    fn from(error: ShareError) -> Self {
        error.to_string()
    }
}

// Helper type alias for Results
pub type ShareResult<T> = Result<T, ShareError>;
