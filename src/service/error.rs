use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::config::ConfigError;
use crate::decision::{DecisionError, VerificationResult};
use crate::embedding::{EmbeddingError, EncoderVersion};
use crate::index::IndexError;
use crate::scoring::ScoringError;

/// Who should act on a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// The input was bad; retrying the same request will fail again.
    Client,
    /// Transient; the same request may succeed later.
    Retryable,
    /// The deployment is misconfigured; requests will keep failing.
    Fatal,
    /// Unexpected server-side failure.
    Internal,
}

/// Per-request verification failures.
#[derive(Debug, Error)]
pub enum VerifyError {
    #[error("image could not be encoded: {0}")]
    InvalidImage(#[source] EmbeddingError),

    #[error("encoder failed: {0}")]
    Encoder(#[source] EmbeddingError),

    #[error("encoder is saturated ({capacity} requests in flight), retry later")]
    Busy { capacity: usize },

    #[error("verification timed out after {timeout:?}")]
    TimedOut { timeout: Duration },

    #[error("verification was cancelled")]
    Cancelled,

    #[error("verification service is shutting down")]
    ShuttingDown,

    #[error("encoder and reference index disagree: {0}")]
    Inconsistent(#[from] ScoringError),

    #[error("encoder task failed: {reason}")]
    TaskFailed { reason: String },
}

impl VerifyError {
    /// Splits encoder errors into bad input and server-side failures.
    pub fn from_encoding(err: EmbeddingError) -> Self {
        if err.is_input_error() {
            VerifyError::InvalidImage(err)
        } else {
            VerifyError::Encoder(err)
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            VerifyError::InvalidImage(_) | VerifyError::Cancelled => ErrorKind::Client,
            VerifyError::Busy { .. } | VerifyError::TimedOut { .. } | VerifyError::ShuttingDown => {
                ErrorKind::Retryable
            }
            VerifyError::Inconsistent(_) => ErrorKind::Fatal,
            VerifyError::Encoder(_) | VerifyError::TaskFailed { .. } => ErrorKind::Internal,
        }
    }

    #[inline]
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Retryable
    }
}

impl VerificationResult {
    /// Not-verified record describing `err`, for callers that must always return a body.
    pub fn operational_failure(err: &VerifyError) -> Self {
        let message = match err.kind() {
            ErrorKind::Client => match err {
                VerifyError::Cancelled => "Verification was cancelled.",
                _ => "The image could not be processed. Please upload a valid JPEG, PNG or WebP image.",
            },
            ErrorKind::Retryable => "Verification is temporarily unavailable. Please try again shortly.",
            ErrorKind::Fatal | ErrorKind::Internal => {
                "Verification failed due to an internal error."
            }
        };
        VerificationResult::unavailable(message)
    }
}

/// Errors that prevent the service from starting. None of them are retried.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to load encoder: {0}")]
    ModelLoad(#[source] EmbeddingError),

    #[error("failed to build reference index: {0}")]
    Index(#[from] IndexError),

    #[error("invalid decision policy: {0}")]
    Policy(#[from] DecisionError),

    #[error("reference index was built by encoder {index}, service encoder is {encoder}")]
    EncoderMismatch {
        encoder: EncoderVersion,
        index: EncoderVersion,
    },

    #[error("reference index dimension {index} does not match encoder dimension {encoder}")]
    DimensionMismatch { encoder: usize, index: usize },
}

/// A rebuild that did not replace the current index.
#[derive(Debug, Error)]
pub enum RebuildError {
    #[error("failed to build reference index: {0}")]
    Index(#[from] IndexError),

    #[error("rebuilt index has encoder {index}, service encoder is {encoder}")]
    EncoderMismatch {
        encoder: EncoderVersion,
        index: EncoderVersion,
    },

    #[error("verification service is shutting down")]
    ShuttingDown,

    #[error("rebuild task failed: {reason}")]
    TaskFailed { reason: String },
}
