use thiserror::Error;

use crate::embedding::EncoderVersion;

/// Query/index inconsistencies. These indicate a misconfigured deployment, not bad input.
#[derive(Debug, Error)]
pub enum ScoringError {
    #[error("query dimension {actual} does not match index dimension {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("query encoder {query} does not match index encoder {index}")]
    EncoderMismatch {
        query: EncoderVersion,
        index: EncoderVersion,
    },

    #[error("reference index is empty")]
    EmptyIndex,
}
