use std::path::PathBuf;
use thiserror::Error;

use crate::embedding::EncoderVersion;

#[derive(Debug, Error)]
pub enum IndexError {
    #[error("reference corpus not found: {path}")]
    CorpusNotFound { path: PathBuf },

    #[error("reference corpus is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    #[error("failed to read reference corpus {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No reference image could be loaded; the service must not come online.
    #[error("no usable reference images in {path} ({skipped} skipped)")]
    EmptyCorpus { path: PathBuf, skipped: usize },

    #[error("reference entry {identifier} has dimension {actual}, expected {expected}")]
    DimensionMismatch {
        identifier: String,
        expected: usize,
        actual: usize,
    },

    #[error("reference entry {identifier} was produced by encoder {actual}, expected {expected}")]
    EncoderMismatch {
        identifier: String,
        expected: EncoderVersion,
        actual: EncoderVersion,
    },
}
