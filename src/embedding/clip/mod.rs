//! CLIP ViT-B/32 encoder (safetensors weights + optional tokenizer).
//!
//! Use [`ClipEncoderConfig::stub`] for tests/examples without model files.

/// Encoder configuration.
pub mod config;
/// Image-to-tensor preprocessing.
pub mod preprocess;
mod stub;


pub use config::{CLIP_EMBEDDING_DIM, CLIP_IMAGE_SIZE, CLIP_MAX_LABEL_TOKENS, ClipEncoderConfig};

use std::sync::Arc;

use candle_core::{DType, Device, Tensor};
use candle_nn::VarBuilder;
use candle_transformers::models::clip::{ClipConfig, ClipModel};
use image::DynamicImage;
use parking_lot::Mutex;
use tokenizers::Tokenizer;
use tracing::{debug, info, warn};

use crate::constants::validate_embedding_dim;
use crate::embedding::device::select_device;
use crate::embedding::error::EmbeddingError;
use crate::embedding::types::{Embedding, EncoderVersion, ImageEncoder};
use crate::hashing::hash_encoder_identity;

const STUB_IDENTITY: &str = "rgb-histogram-8x8x8";

/// The text tower pools at this token, so it must survive truncation.
const CLIP_END_OF_TEXT: &str = "<|endoftext|>";

/// Truncates `tokens` to `max` and keeps `eos` as the final token.
fn fit_label_tokens(tokens: &mut Vec<u32>, max: usize, eos: u32) {
    if tokens.len() <= max {
        return;
    }
    tokens.truncate(max.saturating_sub(1));
    tokens.push(eos);
}

enum EncoderBackend {
    Model {
        model: Arc<Mutex<ClipModel>>,
        tokenizer: Option<Arc<Tokenizer>>,
        device: Device,
    },
    Stub,
}

/// Shared CLIP image/label encoder.
///
/// Loaded once at startup and shared by reference. Forward passes are serialized on an
/// internal mutex, so the encoder is safe to call from many threads even when the
/// backing device is not.
pub struct ClipEncoder {
    backend: EncoderBackend,
    config: ClipEncoderConfig,
    version: EncoderVersion,
}

impl std::fmt::Debug for ClipEncoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClipEncoder")
            .field(
                "backend",
                &match &self.backend {
                    EncoderBackend::Model { device, .. } => format!("Model({:?})", device),
                    EncoderBackend::Stub => "Stub".to_string(),
                },
            )
            .field("embedding_dim", &self.config.embedding_dim)
            .field("image_size", &self.config.image_size)
            .field("version", &self.version)
            .finish()
    }
}

impl ClipEncoder {
    /// Loads the encoder from a config (stub mode is supported).
    pub fn load(config: ClipEncoderConfig) -> Result<Self, EmbeddingError> {
        config.validate()?;

        if config.testing_stub {
            warn!("CLIP encoder running in STUB mode (testing only)");
            let version = EncoderVersion::from_raw(hash_encoder_identity(
                "stub",
                STUB_IDENTITY,
                config.embedding_dim,
            ));
            return Ok(Self {
                backend: EncoderBackend::Stub,
                config,
                version,
            });
        }

        if !config.model_available() {
            return Err(EmbeddingError::ModelNotFound {
                path: config.model_path.clone(),
            });
        }

        let device = select_device();
        debug!(?device, "Selected compute device for CLIP");

        let model = Self::load_model(&config, &device)?;

        let tokenizer = if config.tokenizer_available() {
            Some(Arc::new(Self::load_tokenizer(&config)?))
        } else {
            warn!(
                tokenizer_path = %config.tokenizer_path.display(),
                "No CLIP tokenizer found, label encoding disabled"
            );
            None
        };

        let version = Self::fingerprint(&config)?;

        info!(
            model_path = %config.model_path.display(),
            embedding_dim = config.embedding_dim,
            image_size = config.image_size,
            labels = tokenizer.is_some(),
            %version,
            "CLIP model loaded successfully"
        );

        Ok(Self {
            backend: EncoderBackend::Model {
                model: Arc::new(Mutex::new(model)),
                tokenizer,
                device,
            },
            config,
            version,
        })
    }

    /// Loads a stub encoder (infallible in practice; see [`ClipEncoderConfig::stub`]).
    pub fn stub() -> Result<Self, EmbeddingError> {
        Self::load(ClipEncoderConfig::stub())
    }

    fn load_model(config: &ClipEncoderConfig, device: &Device) -> Result<ClipModel, EmbeddingError> {
        let clip_config = ClipConfig::vit_base_patch32();

        // SAFETY: the weights file is mapped read-only and must not be modified while
        // the process is running.
        let vb = unsafe {
            VarBuilder::from_mmaped_safetensors(&[&config.model_path], DType::F32, device)
        }
        .map_err(|e| EmbeddingError::ModelLoadFailed {
            reason: format!("Failed to map safetensors: {}", e),
        })?;

        ClipModel::new(vb, &clip_config).map_err(|e| EmbeddingError::ModelLoadFailed {
            reason: format!("Failed to build CLIP model: {}", e),
        })
    }

    fn load_tokenizer(config: &ClipEncoderConfig) -> Result<Tokenizer, EmbeddingError> {
        Tokenizer::from_file(&config.tokenizer_path).map_err(|e| {
            EmbeddingError::TokenizationFailed {
                reason: format!("Failed to load tokenizer: {}", e),
            }
        })
    }

    fn fingerprint(config: &ClipEncoderConfig) -> Result<EncoderVersion, EmbeddingError> {
        let metadata = std::fs::metadata(&config.model_path)?;
        let identity = format!("{}:{}", config.model_path.display(), metadata.len());
        Ok(EncoderVersion::from_raw(hash_encoder_identity(
            "clip-vit-base-patch32",
            &identity,
            config.embedding_dim,
        )))
    }

    /// Encodes a decoded image into a unit-normalized embedding.
    pub fn encode(&self, image: &DynamicImage) -> Result<Embedding, EmbeddingError> {
        preprocess::validate_image(image)?;

        let raw = match &self.backend {
            EncoderBackend::Model { model, device, .. } => {
                self.image_features(image, model, device)?
            }
            EncoderBackend::Stub => {
                debug!(
                    width = image.width(),
                    height = image.height(),
                    "Generating stub image embedding"
                );
                stub::color_histogram(image, self.config.embedding_dim)
            }
        };

        self.finish(raw)
    }

    /// Encodes a text label into the same space as images.
    ///
    /// Requires a tokenizer when running a real model.
    pub fn encode_label(&self, label: &str) -> Result<Embedding, EmbeddingError> {
        let raw = match &self.backend {
            EncoderBackend::Model {
                model,
                tokenizer: Some(tokenizer),
                device,
            } => self.text_features(label, model, tokenizer, device)?,
            EncoderBackend::Model {
                tokenizer: None, ..
            } => {
                return Err(EmbeddingError::TokenizationFailed {
                    reason: "no tokenizer loaded".to_string(),
                });
            }
            EncoderBackend::Stub => {
                debug!(label_len = label.len(), "Generating stub label embedding");
                stub::label_vector(label, self.config.embedding_dim)
            }
        };

        self.finish(raw)
    }

    fn image_features(
        &self,
        image: &DynamicImage,
        model: &Mutex<ClipModel>,
        device: &Device,
    ) -> Result<Vec<f32>, EmbeddingError> {
        let pixels = preprocess::pixel_tensor(image, self.config.image_size, device)?;

        debug!(
            width = image.width(),
            height = image.height(),
            "Generating image embedding (vision forward pass)"
        );

        let features = model
            .lock()
            .get_image_features(&pixels)
            .map_err(|e| EmbeddingError::InferenceFailed {
                reason: format!("Vision forward pass failed: {}", e),
            })?;

        Self::first_row(&features)
    }

    fn text_features(
        &self,
        label: &str,
        model: &Mutex<ClipModel>,
        tokenizer: &Tokenizer,
        device: &Device,
    ) -> Result<Vec<f32>, EmbeddingError> {
        let encoding =
            tokenizer
                .encode(label, true)
                .map_err(|e| EmbeddingError::TokenizationFailed {
                    reason: e.to_string(),
                })?;

        let mut tokens: Vec<u32> = encoding.get_ids().to_vec();
        if tokens.is_empty() {
            return Err(EmbeddingError::TokenizationFailed {
                reason: "label produced no tokens".to_string(),
            });
        }
        let eos = tokenizer
            .token_to_id(CLIP_END_OF_TEXT)
            .or_else(|| tokens.last().copied())
            .unwrap_or_default();
        fit_label_tokens(&mut tokens, self.config.max_label_tokens, eos);

        let input_ids = Tensor::new(&tokens[..], device)?.unsqueeze(0)?;

        let features = model
            .lock()
            .get_text_features(&input_ids)
            .map_err(|e| EmbeddingError::InferenceFailed {
                reason: format!("Text forward pass failed: {}", e),
            })?;

        Self::first_row(&features)
    }

    // features shape: [1, projection_dim]
    fn first_row(features: &Tensor) -> Result<Vec<f32>, EmbeddingError> {
        let row = features
            .squeeze(0)?
            .to_dtype(DType::F32)?
            .to_vec1::<f32>()
            .map_err(|e| EmbeddingError::InferenceFailed {
                reason: format!("Failed to convert features to vec: {}", e),
            })?;
        Ok(row)
    }

    fn finish(&self, raw: Vec<f32>) -> Result<Embedding, EmbeddingError> {
        validate_embedding_dim(raw.len(), self.config.embedding_dim).map_err(|e| {
            EmbeddingError::InvalidConfig {
                reason: e.to_string(),
            }
        })?;
        Embedding::from_raw(raw, self.version)
    }

    /// Returns the configured output embedding dimension.
    pub fn embedding_dim(&self) -> usize {
        self.config.embedding_dim
    }

    pub fn version(&self) -> EncoderVersion {
        self.version
    }

    /// Returns `true` if running in stub mode.
    pub fn is_stub(&self) -> bool {
        matches!(self.backend, EncoderBackend::Stub)
    }

    /// Returns `true` if a model is loaded.
    pub fn has_model(&self) -> bool {
        matches!(self.backend, EncoderBackend::Model { .. })
    }

    /// Returns `true` if [`encode_label`](Self::encode_label) is available.
    pub fn supports_labels(&self) -> bool {
        match &self.backend {
            EncoderBackend::Model { tokenizer, .. } => tokenizer.is_some(),
            EncoderBackend::Stub => true,
        }
    }

    pub fn config(&self) -> &ClipEncoderConfig {
        &self.config
    }
}

impl ImageEncoder for ClipEncoder {
    fn encode(&self, image: &DynamicImage) -> Result<Embedding, EmbeddingError> {
        ClipEncoder::encode(self, image)
    }

    fn embedding_dim(&self) -> usize {
        self.config.embedding_dim
    }

    fn version(&self) -> EncoderVersion {
        self.version
    }
}
