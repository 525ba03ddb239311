//! Environment-backed configuration.
//!
//! Every setting has a default. Override with `ARTCHECK_*` environment variables.

pub mod error;


pub use error::ConfigError;

use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::constants::{
    DEFAULT_ARTIST_NAME, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_ENCODER_QUEUE_DEPTH,
    DEFAULT_REFERENCE_DIR, DEFAULT_VERIFY_TIMEOUT_MS,
};
use crate::embedding::ClipEncoderConfig;
use crate::scoring::TopK;

/// Service configuration loaded from environment variables.
///
/// Use [`Config::from_env`] to read `ARTCHECK_*` overrides on top of defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory of reference artwork. Default: `./reference_art`.
    pub reference_dir: PathBuf,

    /// CLIP `model.safetensors`. Unset runs the model-free stub encoder.
    pub model_path: Option<PathBuf>,

    /// CLIP `tokenizer.json`. Default: next to the model file.
    pub tokenizer_path: Option<PathBuf>,

    /// Artist named in result messages. Default: `the artist`.
    pub artist_name: String,

    /// Matches averaged into the aggregate score. Default: `3`.
    pub top_k: TopK,

    /// Minimum confidence (0-100) to verify. Default: `80`.
    pub threshold: f32,

    /// Max queued plus running encodes before requests get `Busy`. Default: `8`.
    pub encoder_queue_depth: usize,

    /// Per-request deadline. Default: 30s.
    pub verify_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            reference_dir: PathBuf::from(DEFAULT_REFERENCE_DIR),
            model_path: None,
            tokenizer_path: None,
            artist_name: DEFAULT_ARTIST_NAME.to_string(),
            top_k: TopK::default(),
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            encoder_queue_depth: DEFAULT_ENCODER_QUEUE_DEPTH,
            verify_timeout: Duration::from_millis(DEFAULT_VERIFY_TIMEOUT_MS),
        }
    }
}

impl Config {
    const ENV_REFERENCE_DIR: &'static str = "ARTCHECK_REFERENCE_DIR";
    const ENV_MODEL_PATH: &'static str = ClipEncoderConfig::ENV_MODEL_PATH;
    const ENV_TOKENIZER_PATH: &'static str = ClipEncoderConfig::ENV_TOKENIZER_PATH;
    const ENV_ARTIST_NAME: &'static str = "ARTCHECK_ARTIST_NAME";
    const ENV_TOP_K: &'static str = "ARTCHECK_TOP_K";
    const ENV_THRESHOLD: &'static str = "ARTCHECK_THRESHOLD";
    const ENV_ENCODER_QUEUE: &'static str = "ARTCHECK_ENCODER_QUEUE";
    const ENV_VERIFY_TIMEOUT_MS: &'static str = "ARTCHECK_VERIFY_TIMEOUT_MS";

    /// Loads configuration from environment variables (falling back to defaults).
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let reference_dir =
            Self::parse_path_from_env(Self::ENV_REFERENCE_DIR, defaults.reference_dir);
        let model_path = Self::parse_optional_path_from_env(Self::ENV_MODEL_PATH);
        let tokenizer_path = Self::parse_optional_path_from_env(Self::ENV_TOKENIZER_PATH);
        let artist_name = Self::parse_string_from_env(Self::ENV_ARTIST_NAME, defaults.artist_name);
        let top_k = Self::parse_top_k_from_env(defaults.top_k)?;
        let threshold = Self::parse_threshold_from_env(defaults.threshold)?;
        let encoder_queue_depth = Self::parse_positive_from_env(
            Self::ENV_ENCODER_QUEUE,
            "encoder queue depth",
            defaults.encoder_queue_depth as u64,
        )? as usize;
        let verify_timeout = Duration::from_millis(Self::parse_positive_from_env(
            Self::ENV_VERIFY_TIMEOUT_MS,
            "verify timeout",
            defaults.verify_timeout.as_millis() as u64,
        )?);

        Ok(Self {
            reference_dir,
            model_path,
            tokenizer_path,
            artist_name,
            top_k,
            threshold,
            encoder_queue_depth,
            verify_timeout,
        })
    }

    /// Validates paths and ranges (does not create directories).
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.reference_dir.exists() {
            return Err(ConfigError::PathNotFound {
                path: self.reference_dir.clone(),
            });
        }
        if !self.reference_dir.is_dir() {
            return Err(ConfigError::NotADirectory {
                path: self.reference_dir.clone(),
            });
        }

        for path in [&self.model_path, &self.tokenizer_path].into_iter().flatten() {
            Self::require_file(path)?;
        }

        self.validate_settings()
    }

    /// Validates the numeric settings only, for services assembled from a pre-built index.
    pub fn validate_settings(&self) -> Result<(), ConfigError> {
        if !self.threshold.is_finite() || !(0.0..=100.0).contains(&self.threshold) {
            return Err(ConfigError::InvalidThreshold {
                value: self.threshold,
            });
        }

        if self.encoder_queue_depth == 0 {
            return Err(ConfigError::ZeroValue {
                name: "encoder queue depth",
            });
        }

        if self.verify_timeout.is_zero() {
            return Err(ConfigError::ZeroValue {
                name: "verify timeout",
            });
        }

        if let TopK::Fixed(0) = self.top_k {
            return Err(ConfigError::InvalidTopK {
                value: "0".to_string(),
                reason: "top-k must be at least 1".to_string(),
            });
        }

        Ok(())
    }

    /// Encoder settings derived from this config; stub mode when no model is set.
    pub fn encoder_config(&self) -> ClipEncoderConfig {
        match &self.model_path {
            Some(model_path) => {
                let config = ClipEncoderConfig::new(model_path);
                match &self.tokenizer_path {
                    Some(tokenizer_path) => config.with_tokenizer(tokenizer_path),
                    None => config,
                }
            }
            None => ClipEncoderConfig::stub(),
        }
    }

    /// Returns `true` if no model path is configured.
    pub fn uses_stub_encoder(&self) -> bool {
        self.model_path.is_none()
    }

    fn require_file(path: &Path) -> Result<(), ConfigError> {
        if !path.exists() {
            return Err(ConfigError::PathNotFound {
                path: path.to_path_buf(),
            });
        }
        if !path.is_file() {
            return Err(ConfigError::NotAFile {
                path: path.to_path_buf(),
            });
        }
        Ok(())
    }

    fn parse_top_k_from_env(default: TopK) -> Result<TopK, ConfigError> {
        match env::var(Self::ENV_TOP_K) {
            Ok(value) => value
                .parse()
                .map_err(|reason| ConfigError::InvalidTopK { value, reason }),
            Err(_) => Ok(default),
        }
    }

    fn parse_threshold_from_env(default: f32) -> Result<f32, ConfigError> {
        match env::var(Self::ENV_THRESHOLD) {
            Ok(value) => {
                let threshold: f32 =
                    value
                        .trim()
                        .parse()
                        .map_err(|e| ConfigError::ThresholdParseError {
                            value: value.clone(),
                            source: e,
                        })?;

                if !threshold.is_finite() || !(0.0..=100.0).contains(&threshold) {
                    return Err(ConfigError::InvalidThreshold { value: threshold });
                }

                Ok(threshold)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_positive_from_env(
        var_name: &str,
        name: &'static str,
        default: u64,
    ) -> Result<u64, ConfigError> {
        match env::var(var_name) {
            Ok(value) => {
                let parsed: u64 =
                    value
                        .trim()
                        .parse()
                        .map_err(|e| ConfigError::IntegerParseError {
                            name,
                            value: value.clone(),
                            source: e,
                        })?;

                if parsed == 0 {
                    return Err(ConfigError::ZeroValue { name });
                }

                Ok(parsed)
            }
            Err(_) => Ok(default),
        }
    }

    fn parse_path_from_env(var_name: &str, default: PathBuf) -> PathBuf {
        Self::parse_optional_path_from_env(var_name).unwrap_or(default)
    }

    fn parse_optional_path_from_env(var_name: &str) -> Option<PathBuf> {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from)
    }

    fn parse_string_from_env(var_name: &str, default: String) -> String {
        env::var(var_name)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(default)
    }
}
