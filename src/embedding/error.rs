use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("embedding model not found at path: {path}")]
    ModelNotFound { path: PathBuf },

    #[error("failed to load embedding model: {reason}")]
    ModelLoadFailed { reason: String },

    /// The input image cannot be turned into the tensor the model expects.
    #[error("invalid image: {reason}")]
    InvalidImage { reason: String },

    #[error("embedding inference failed: {reason}")]
    InferenceFailed { reason: String },

    #[error("tokenization failed: {reason}")]
    TokenizationFailed { reason: String },

    /// The model produced a vector that cannot be unit-normalized.
    #[error("degenerate embedding: {reason}")]
    DegenerateEmbedding { reason: String },

    #[error("invalid model configuration: {reason}")]
    InvalidConfig { reason: String },
}

impl EmbeddingError {
    /// Returns `true` if the failure was caused by the caller's input rather than the encoder.
    pub fn is_input_error(&self) -> bool {
        matches!(self, EmbeddingError::InvalidImage { .. })
    }

    /// Returns `true` for failures that can only happen while loading the model.
    pub fn is_load_error(&self) -> bool {
        matches!(
            self,
            EmbeddingError::ModelNotFound { .. }
                | EmbeddingError::ModelLoadFailed { .. }
                | EmbeddingError::InvalidConfig { .. }
        )
    }
}

impl From<candle_core::Error> for EmbeddingError {
    fn from(err: candle_core::Error) -> Self {
        EmbeddingError::InferenceFailed {
            reason: err.to_string(),
        }
    }
}

impl From<std::io::Error> for EmbeddingError {
    fn from(err: std::io::Error) -> Self {
        EmbeddingError::ModelLoadFailed {
            reason: err.to_string(),
        }
    }
}
