//! Cross-cutting, shared constants.
//!
//! Prefer deriving secondary constants from primary ones to avoid drift.
//!
//! # Dimension Invariants
//!
//! The embedding dimension is treated as a process-wide invariant across the
//! embedding, index and scoring modules. If you need a different dimension:
//!
//! 1. Use [`DimConfig`] to pass dimensions through initialization
//! 2. Use [`validate_embedding_dim`] at module boundaries to catch mismatches early
//! 3. The compile-time constants remain as defaults

/// Output dimension of the CLIP ViT-B/32 projection head.
pub const DEFAULT_EMBEDDING_DIM: usize = 512;

/// Square input resolution expected by the CLIP vision tower.
pub const DEFAULT_IMAGE_SIZE: usize = 224;

/// Max text tokens accepted by the CLIP text tower.
pub const DEFAULT_MAX_LABEL_TOKENS: usize = 77;

/// Per-channel normalization used by the CLIP image processor (RGB order).
pub const CLIP_PIXEL_MEAN: [f32; 3] = [0.481_454_66, 0.457_827_5, 0.408_210_73];
pub const CLIP_PIXEL_STD: [f32; 3] = [0.268_629_54, 0.261_302_58, 0.275_777_11];

/// Tolerance for the unit-norm invariant on embeddings.
pub const UNIT_NORM_TOLERANCE: f32 = 1e-3;

pub const DEFAULT_TOP_K: usize = 3;

/// Confidence (0-100) at or above which an image is verified.
pub const DEFAULT_CONFIDENCE_THRESHOLD: f32 = 80.0;

/// Confidence (0-100) at or above which a rejected image is reported as a possible match.
pub const DEFAULT_POSSIBLE_MATCH_FLOOR: f32 = 50.0;

pub const DEFAULT_ENCODER_QUEUE_DEPTH: usize = 8;

pub const DEFAULT_VERIFY_TIMEOUT_MS: u64 = 30_000;

pub const DEFAULT_REFERENCE_DIR: &str = "reference_art";

pub const DEFAULT_ARTIST_NAME: &str = "the artist";

/// Runtime dimension configuration for modules that support dynamic embedding sizes.
///
/// The [`validate`](DimConfig::validate) method rejects degenerate dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DimConfig {
    /// The embedding vector dimension (number of floats).
    pub embedding_dim: usize,
}

impl Default for DimConfig {
    fn default() -> Self {
        Self {
            embedding_dim: DEFAULT_EMBEDDING_DIM,
        }
    }
}

impl DimConfig {
    /// Creates a new dimension configuration with the specified embedding dimension.
    pub fn new(embedding_dim: usize) -> Self {
        Self { embedding_dim }
    }

    /// Returns an error if `embedding_dim` is zero.
    pub fn validate(&self) -> Result<(), DimValidationError> {
        if self.embedding_dim == 0 {
            return Err(DimValidationError::ZeroDimension);
        }
        Ok(())
    }
}

/// Error returned when dimension validation fails.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DimValidationError {
    /// Embedding dimension cannot be zero.
    ZeroDimension,
    /// Runtime dimension does not match expected dimension.
    DimensionMismatch { expected: usize, actual: usize },
}

impl std::fmt::Display for DimValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZeroDimension => write!(f, "embedding dimension cannot be zero"),
            Self::DimensionMismatch { expected, actual } => {
                write!(
                    f,
                    "dimension mismatch: expected {}, got {}",
                    expected, actual
                )
            }
        }
    }
}

impl std::error::Error for DimValidationError {}

/// Validates that a runtime embedding dimension matches the expected dimension.
///
/// Use this at module boundaries to catch dimension mismatches early, rather than
/// truncating or padding vectors somewhere deep in the scoring path.
///
/// # Example
///
/// ```
/// use artcheck::constants::{validate_embedding_dim, DEFAULT_EMBEDDING_DIM};
///
/// let encoder_dim = 512;
/// validate_embedding_dim(encoder_dim, DEFAULT_EMBEDDING_DIM).unwrap();
/// ```
pub fn validate_embedding_dim(actual: usize, expected: usize) -> Result<(), DimValidationError> {
    if actual != expected {
        return Err(DimValidationError::DimensionMismatch { expected, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dim_config_default() {
        let config = DimConfig::default();
        assert_eq!(config.embedding_dim, DEFAULT_EMBEDDING_DIM);
    }

    #[test]
    fn test_dim_config_validate_success() {
        assert!(DimConfig::new(512).validate().is_ok());
        assert!(DimConfig::new(3).validate().is_ok());
    }

    #[test]
    fn test_dim_config_validate_zero() {
        let config = DimConfig::new(0);
        assert_eq!(config.validate(), Err(DimValidationError::ZeroDimension));
    }

    #[test]
    fn test_validate_embedding_dim_mismatch() {
        assert!(validate_embedding_dim(512, 512).is_ok());
        assert_eq!(
            validate_embedding_dim(768, 512),
            Err(DimValidationError::DimensionMismatch {
                expected: 512,
                actual: 768
            })
        );
    }

    #[test]
    fn test_thresholds_are_ordered() {
        assert!(DEFAULT_POSSIBLE_MATCH_FLOOR < DEFAULT_CONFIDENCE_THRESHOLD);
        assert!((0.0..=100.0).contains(&DEFAULT_CONFIDENCE_THRESHOLD));
    }

    #[test]
    fn test_error_display() {
        let err = DimValidationError::ZeroDimension;
        assert_eq!(err.to_string(), "embedding dimension cannot be zero");

        let err = DimValidationError::DimensionMismatch {
            expected: 512,
            actual: 768,
        };
        assert!(err.to_string().contains("512"));
        assert!(err.to_string().contains("768"));
    }
}
