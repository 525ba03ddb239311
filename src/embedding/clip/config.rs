use std::path::PathBuf;

use crate::embedding::error::EmbeddingError;

/// Default CLIP embedding dimension.
pub const CLIP_EMBEDDING_DIM: usize = crate::constants::DEFAULT_EMBEDDING_DIM;

/// Default CLIP input resolution.
pub const CLIP_IMAGE_SIZE: usize = crate::constants::DEFAULT_IMAGE_SIZE;

/// Default max label length in tokens.
pub const CLIP_MAX_LABEL_TOKENS: usize = crate::constants::DEFAULT_MAX_LABEL_TOKENS;

#[derive(Debug, Clone)]
/// Configuration for [`ClipEncoder`](super::ClipEncoder).
pub struct ClipEncoderConfig {
    /// Path to the CLIP `model.safetensors` file.
    pub model_path: PathBuf,
    /// Path to `tokenizer.json` (only needed for label encoding).
    pub tokenizer_path: PathBuf,
    /// Output embedding dimension.
    pub embedding_dim: usize,
    /// Square input resolution for the vision tower.
    pub image_size: usize,
    /// Labels longer than this are truncated.
    pub max_label_tokens: usize,
    /// If true, run the deterministic stub backend (no model files required).
    pub testing_stub: bool,
}

impl Default for ClipEncoderConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::new(),
            tokenizer_path: PathBuf::new(),
            embedding_dim: CLIP_EMBEDDING_DIM,
            image_size: CLIP_IMAGE_SIZE,
            max_label_tokens: CLIP_MAX_LABEL_TOKENS,
            testing_stub: false,
        }
    }
}

impl ClipEncoderConfig {
    /// Env var used to locate the model weights.
    pub const ENV_MODEL_PATH: &'static str = "ARTCHECK_MODEL_PATH";
    /// Env var used to locate the tokenizer file.
    pub const ENV_TOKENIZER_PATH: &'static str = "ARTCHECK_TOKENIZER_PATH";

    /// Loads config from environment variables (missing values become empty paths).
    pub fn from_env() -> Self {
        let model_path = read_path_var(Self::ENV_MODEL_PATH).unwrap_or_default();
        let tokenizer_path = read_path_var(Self::ENV_TOKENIZER_PATH)
            .unwrap_or_else(|| sibling_tokenizer(&model_path));

        Self {
            model_path,
            tokenizer_path,
            ..Default::default()
        }
    }

    /// Creates a config for a weights file, inferring `tokenizer.json` from its directory.
    pub fn new<P: Into<PathBuf>>(model_path: P) -> Self {
        let model_path = model_path.into();
        let tokenizer_path = sibling_tokenizer(&model_path);

        Self {
            model_path,
            tokenizer_path,
            ..Default::default()
        }
    }

    /// Creates a stub config (no model files; produces deterministic embeddings).
    pub fn stub() -> Self {
        Self {
            testing_stub: true,
            ..Default::default()
        }
    }

    pub fn with_tokenizer<P: Into<PathBuf>>(mut self, tokenizer_path: P) -> Self {
        self.tokenizer_path = tokenizer_path.into();
        self
    }

    pub fn with_embedding_dim(mut self, embedding_dim: usize) -> Self {
        self.embedding_dim = embedding_dim;
        self
    }

    /// Validates dimensions, and required paths in non-stub mode.
    pub fn validate(&self) -> Result<(), EmbeddingError> {
        crate::constants::DimConfig::new(self.embedding_dim)
            .validate()
            .map_err(|e| EmbeddingError::InvalidConfig {
                reason: e.to_string(),
            })?;

        if self.image_size == 0 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "image_size must be positive".to_string(),
            });
        }

        // room for the start and end markers
        if self.max_label_tokens < 2 {
            return Err(EmbeddingError::InvalidConfig {
                reason: "max_label_tokens must be at least 2".to_string(),
            });
        }

        if self.testing_stub {
            return Ok(());
        }

        if self.model_path.as_os_str().is_empty() {
            return Err(EmbeddingError::InvalidConfig {
                reason: "model_path is required (stubbing is disabled)".to_string(),
            });
        }

        if !self.model_path.exists() {
            return Err(EmbeddingError::ModelNotFound {
                path: self.model_path.clone(),
            });
        }

        Ok(())
    }

    /// Returns `true` if the model file path exists.
    pub fn model_available(&self) -> bool {
        !self.model_path.as_os_str().is_empty() && self.model_path.is_file()
    }

    /// Returns `true` if the tokenizer path exists.
    pub fn tokenizer_available(&self) -> bool {
        !self.tokenizer_path.as_os_str().is_empty() && self.tokenizer_path.is_file()
    }
}

fn read_path_var(name: &str) -> Option<PathBuf> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .map(PathBuf::from)
}

fn sibling_tokenizer(model_path: &std::path::Path) -> PathBuf {
    if model_path.as_os_str().is_empty() {
        return PathBuf::new();
    }
    model_path
        .parent()
        .map(|p| p.join("tokenizer.json"))
        .unwrap_or_default()
}
