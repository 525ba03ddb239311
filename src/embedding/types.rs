use std::sync::Arc;

use image::DynamicImage;
use serde::Serialize;

use super::error::EmbeddingError;

/// Identifies the encoder (backend, weights, dimension) that produced an embedding.
///
/// Embeddings from different versions live in different vector spaces and must never
/// be compared with each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct EncoderVersion(u64);

impl EncoderVersion {
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn as_u64(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EncoderVersion {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// Unit-normalized embedding tagged with the version of the encoder that produced it.
///
/// The values are behind an `Arc` so that index entries and ranked results can share
/// them without copying.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    values: Arc<[f32]>,
    version: EncoderVersion,
}

impl Embedding {
    /// L2-normalizes `values` and tags them with `version`.
    ///
    /// Fails on empty, non-finite or all-zero input.
    pub fn from_raw(mut values: Vec<f32>, version: EncoderVersion) -> Result<Self, EmbeddingError> {
        if values.is_empty() {
            return Err(EmbeddingError::DegenerateEmbedding {
                reason: "embedding has no components".to_string(),
            });
        }

        if let Some(index) = values.iter().position(|v| !v.is_finite()) {
            return Err(EmbeddingError::DegenerateEmbedding {
                reason: format!("non-finite component at index {index}"),
            });
        }

        if !normalize_l2_in_place(&mut values) {
            return Err(EmbeddingError::DegenerateEmbedding {
                reason: "embedding has zero norm".to_string(),
            });
        }

        Ok(Self {
            values: values.into(),
            version,
        })
    }

    #[inline]
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn version(&self) -> EncoderVersion {
        self.version
    }

    pub fn norm(&self) -> f32 {
        self.values.iter().map(|x| x * x).sum::<f32>().sqrt()
    }
}

/// Normalizes a vector in place; returns `false` (leaving it untouched) if its norm is zero.
pub fn normalize_l2_in_place(values: &mut [f32]) -> bool {
    let sum: f32 = values.iter().map(|x| x * x).sum();
    if !sum.is_finite() || sum <= 0.0 {
        return false;
    }

    let norm = sum.sqrt();
    for value in values.iter_mut() {
        *value /= norm;
    }
    true
}

/// Turns decoded images into embeddings.
///
/// Implementations are shared across threads and must hold no per-call mutable state
/// outside of their own synchronization.
pub trait ImageEncoder: Send + Sync {
    /// Encodes a single decoded image.
    fn encode(&self, image: &DynamicImage) -> Result<Embedding, EmbeddingError>;

    /// Dimension of every embedding this encoder produces.
    fn embedding_dim(&self) -> usize;

    /// Version tag attached to every embedding this encoder produces.
    fn version(&self) -> EncoderVersion;
}

impl<T: ImageEncoder + ?Sized> ImageEncoder for Arc<T> {
    fn encode(&self, image: &DynamicImage) -> Result<Embedding, EmbeddingError> {
        (**self).encode(image)
    }

    fn embedding_dim(&self) -> usize {
        (**self).embedding_dim()
    }

    fn version(&self) -> EncoderVersion {
        (**self).version()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VERSION: EncoderVersion = EncoderVersion::from_raw(7);

    #[test]
    fn test_from_raw_normalizes() {
        let embedding = Embedding::from_raw(vec![3.0, 4.0], VERSION).unwrap();
        assert!((embedding.values()[0] - 0.6).abs() < 1e-6);
        assert!((embedding.values()[1] - 0.8).abs() < 1e-6);
        assert!((embedding.norm() - 1.0).abs() < 1e-6);
        assert_eq!(embedding.dim(), 2);
        assert_eq!(embedding.version(), VERSION);
    }

    #[test]
    fn test_from_raw_rejects_zero_vector() {
        let err = Embedding::from_raw(vec![0.0; 4], VERSION).unwrap_err();
        assert!(matches!(err, EmbeddingError::DegenerateEmbedding { .. }));
    }

    #[test]
    fn test_from_raw_rejects_empty() {
        let err = Embedding::from_raw(vec![], VERSION).unwrap_err();
        assert!(matches!(err, EmbeddingError::DegenerateEmbedding { .. }));
    }

    #[test]
    fn test_from_raw_rejects_nan() {
        let err = Embedding::from_raw(vec![1.0, f32::NAN], VERSION).unwrap_err();
        assert!(err.to_string().contains("index 1"));
    }

    #[test]
    fn test_normalize_l2_in_place_zero_is_untouched() {
        let mut values = [0.0f32; 3];
        assert!(!normalize_l2_in_place(&mut values));
        assert_eq!(values, [0.0; 3]);
    }

    #[test]
    fn test_encoder_version_display_is_fixed_width_hex() {
        assert_eq!(EncoderVersion::from_raw(0xab).to_string(), "00000000000000ab");
    }
}
