use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use image::DynamicImage;

use super::clip::{ClipEncoder, ClipEncoderConfig};
use super::error::EmbeddingError;
use super::types::{Embedding, EncoderVersion, ImageEncoder};

/// Stub-backed encoder with knobs for latency and version skew.
pub struct MockImageEncoder {
    inner: ClipEncoder,
    delay: Duration,
    version_override: Option<EncoderVersion>,
    calls: AtomicUsize,
}

impl std::fmt::Debug for MockImageEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MockImageEncoder")
            .field("delay", &self.delay)
            .field("version", &self.version())
            .field("calls", &self.calls())
            .finish()
    }
}

impl MockImageEncoder {
    pub fn new() -> Self {
        Self::from_config(ClipEncoderConfig::stub())
    }

    pub fn with_embedding_dim(embedding_dim: usize) -> Self {
        Self::from_config(ClipEncoderConfig::stub().with_embedding_dim(embedding_dim))
    }

    fn from_config(config: ClipEncoderConfig) -> Self {
        Self {
            inner: ClipEncoder::load(config).expect("stub encoder always loads"),
            delay: Duration::ZERO,
            version_override: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Every encode blocks the calling thread for `delay` before producing output.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Tags output with `version` instead of the stub's own version.
    pub fn with_version(mut self, version: EncoderVersion) -> Self {
        self.version_override = Some(version);
        self
    }

    /// Number of completed or failed encode calls.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockImageEncoder {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageEncoder for MockImageEncoder {
    fn encode(&self, image: &DynamicImage) -> Result<Embedding, EmbeddingError> {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        self.calls.fetch_add(1, Ordering::SeqCst);

        let embedding = self.inner.encode(image)?;
        match self.version_override {
            Some(version) => Embedding::from_raw(embedding.values().to_vec(), version),
            None => Ok(embedding),
        }
    }

    fn embedding_dim(&self) -> usize {
        self.inner.embedding_dim()
    }

    fn version(&self) -> EncoderVersion {
        self.version_override.unwrap_or(self.inner.version())
    }
}
