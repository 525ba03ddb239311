//! Embedding model and types.
//!
//! - [`clip`] provides the CLIP image/label encoder.
//! - [`types`] holds [`Embedding`], [`EncoderVersion`] and the [`ImageEncoder`] seam.

/// CLIP encoder (image + label towers).
pub mod clip;
/// Device selection (CPU / Metal / CUDA).
pub mod device;
mod error;
#[cfg(any(test, feature = "mock"))]
mod mock;
/// Embedding value types and the encoder trait.
pub mod types;

pub use clip::{CLIP_EMBEDDING_DIM, CLIP_IMAGE_SIZE, ClipEncoder, ClipEncoderConfig};
pub use error::EmbeddingError;
#[cfg(any(test, feature = "mock"))]
pub use mock::MockImageEncoder;
pub use types::{Embedding, EncoderVersion, ImageEncoder, normalize_l2_in_place};
