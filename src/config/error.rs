//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Top-K value is neither a positive integer nor `auto`.
    #[error("invalid top-k '{value}': {reason}")]
    InvalidTopK { value: String, reason: String },

    /// Threshold string could not be parsed as a number.
    #[error("failed to parse threshold '{value}': {source}")]
    ThresholdParseError {
        value: String,
        #[source]
        source: std::num::ParseFloatError,
    },

    /// Threshold is outside 0-100 (or not finite).
    #[error("invalid threshold {value}: must be between 0 and 100")]
    InvalidThreshold { value: f32 },

    /// An integer setting could not be parsed.
    #[error("failed to parse {name} '{value}': {source}")]
    IntegerParseError {
        name: &'static str,
        value: String,
        #[source]
        source: std::num::ParseIntError,
    },

    /// An integer setting that must be positive was zero.
    #[error("{name} must be greater than zero")]
    ZeroValue { name: &'static str },

    /// Specified path does not exist on the filesystem.
    #[error("path does not exist: {path}")]
    PathNotFound { path: PathBuf },

    /// Path exists but is not a file (when a file was expected).
    #[error("path is not a file: {path}")]
    NotAFile { path: PathBuf },

    /// Path exists but is not a directory (when a directory was expected).
    #[error("path is not a directory: {path}")]
    NotADirectory { path: PathBuf },
}
