//! artcheck: verifies whether a photo shows artwork by a known street artist.
//!
//! A query image is embedded with CLIP, compared against an index of the artist's
//! reference works, and the top-K similarity is calibrated into a 0-100 confidence
//! that a threshold turns into a verdict.
//!
//! # Public API Surface
//!
//! - [`VerificationService`] - async entry point (`verify`, `rebuild_index`, `shutdown`)
//! - [`Config`], [`ConfigError`] - `ARTCHECK_*` environment configuration
//! - [`ClipEncoder`], [`ImageEncoder`], [`Embedding`] - encoding
//! - [`ReferenceIndex`], [`IndexHandle`] - reference corpus
//! - [`SimilarityScorer`], [`TopK`] - similarity scoring
//! - [`DecisionPolicy`], [`Calibration`], [`VerificationResult`] - verdicts
//!
//! ## Test/Mock Support
//! [`MockImageEncoder`] is available behind `#[cfg(any(test, feature = "mock"))]`.

pub mod config;
pub mod constants;
pub mod decision;
pub mod embedding;
pub mod hashing;
pub mod index;
pub mod scoring;
pub mod service;

pub use config::{Config, ConfigError};
pub use constants::{DimConfig, DimValidationError, validate_embedding_dim};
pub use decision::{
    Calibration, Confidence, DecisionError, DecisionPolicy, Verdict, VerificationResult,
};
#[cfg(any(test, feature = "mock"))]
pub use embedding::MockImageEncoder;
pub use embedding::{
    ClipEncoder, ClipEncoderConfig, Embedding, EmbeddingError, EncoderVersion, ImageEncoder,
};
pub use hashing::{hash_encoder_identity, hash_label, hash_to_u64};
pub use index::{IndexError, IndexHandle, ReferenceEntry, ReferenceIndex};
pub use scoring::{RankedMatch, ScoreOutcome, ScoringError, SimilarityScorer, TopK};
pub use service::{
    EncoderGate, ErrorKind, RebuildError, StartupError, VerificationService, VerifyError,
};
