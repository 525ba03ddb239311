use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use image::DynamicImage;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::decision::{Calibration, DecisionPolicy, VerificationResult};
use crate::embedding::{ClipEncoder, ImageEncoder};
use crate::index::{IndexHandle, ReferenceIndex};
use crate::scoring::SimilarityScorer;

use super::error::{RebuildError, StartupError, VerifyError};
use super::gate::{EncoderGate, GateError};

impl From<GateError> for VerifyError {
    fn from(err: GateError) -> Self {
        match err {
            GateError::Full { capacity } => VerifyError::Busy { capacity },
            GateError::Closed => VerifyError::ShuttingDown,
        }
    }
}

/// Verifies query images against the reference corpus.
///
/// Owns the encoder (shared with in-flight blocking tasks through an `Arc`) and the
/// swappable index. All methods take `&self`; wrap the service in an `Arc` to share it
/// across tasks.
pub struct VerificationService<E: ImageEncoder + 'static = ClipEncoder> {
    encoder: Arc<E>,
    index: IndexHandle,
    scorer: SimilarityScorer,
    policy: DecisionPolicy,
    gate: EncoderGate,
    timeout: Duration,
    corpus_dir: PathBuf,
    rebuild_lock: tokio::sync::Mutex<()>,
}

impl<E: ImageEncoder + std::fmt::Debug + 'static> std::fmt::Debug for VerificationService<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VerificationService")
            .field("encoder", &self.encoder)
            .field("references", &self.reference_count())
            .field("generation", &self.index_generation())
            .field("threshold", &self.policy.threshold())
            .field("queue_depth", &self.gate.capacity())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl VerificationService<ClipEncoder> {
    /// Loads the CLIP encoder and builds the index from `config`.
    ///
    /// Blocking: loads model weights and encodes the whole corpus. Call it from
    /// `spawn_blocking` inside a runtime.
    pub fn start(config: Config) -> Result<Self, StartupError> {
        config.validate()?;

        if config.uses_stub_encoder() {
            warn!("No model path configured, using the stub encoder (results are not meaningful)");
        }

        let encoder = ClipEncoder::load(config.encoder_config()).map_err(StartupError::ModelLoad)?;
        Self::with_encoder(Arc::new(encoder), config)
    }
}

impl<E: ImageEncoder + 'static> VerificationService<E> {
    /// Builds the index from `config.reference_dir` with an already-loaded encoder.
    ///
    /// Blocking, like [`VerificationService::start`].
    pub fn with_encoder(encoder: Arc<E>, config: Config) -> Result<Self, StartupError> {
        config.validate_settings()?;

        let started = Instant::now();
        let index = ReferenceIndex::build(&config.reference_dir, &*encoder)?;

        info!(
            references = index.len(),
            skipped = index.skipped().len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Reference corpus loaded"
        );

        Self::from_parts(encoder, index, config)
    }

    /// Assembles a service from a loaded encoder and a pre-built index.
    pub fn from_parts(
        encoder: Arc<E>,
        index: ReferenceIndex,
        config: Config,
    ) -> Result<Self, StartupError> {
        config.validate_settings()?;

        if index.dim() != encoder.embedding_dim() {
            return Err(StartupError::DimensionMismatch {
                encoder: encoder.embedding_dim(),
                index: index.dim(),
            });
        }
        if index.version() != encoder.version() {
            return Err(StartupError::EncoderMismatch {
                encoder: encoder.version(),
                index: index.version(),
            });
        }

        let policy = DecisionPolicy::new(
            Calibration::default(),
            config.threshold,
            config.artist_name.clone(),
        )?;

        info!(
            references = index.len(),
            top_k = %config.top_k,
            threshold = config.threshold,
            queue_depth = config.encoder_queue_depth,
            timeout_ms = config.verify_timeout.as_millis() as u64,
            encoder = %encoder.version(),
            "Verification service ready"
        );

        Ok(Self {
            encoder,
            index: IndexHandle::new(index),
            scorer: SimilarityScorer::new(config.top_k),
            policy,
            gate: EncoderGate::new(config.encoder_queue_depth),
            timeout: config.verify_timeout,
            corpus_dir: config.reference_dir,
            rebuild_lock: tokio::sync::Mutex::new(()),
        })
    }

    /// Verifies one decoded image.
    pub async fn verify(&self, image: DynamicImage) -> Result<VerificationResult, VerifyError> {
        self.verify_with_cancel(image, &CancellationToken::new())
            .await
    }

    /// Like [`verify`](Self::verify), abandoning the request once `cancel` fires.
    ///
    /// An abandoned encode still runs to completion on the blocking pool and then
    /// releases its gate permit; its output is discarded.
    pub async fn verify_with_cancel(
        &self,
        image: DynamicImage,
        cancel: &CancellationToken,
    ) -> Result<VerificationResult, VerifyError> {
        let started = Instant::now();
        let permit = self.gate.try_enter().inspect_err(|e| {
            debug!(error = %e, "Rejected verification request at the encoder gate");
        })?;

        let encoder = Arc::clone(&self.encoder);
        let encode = tokio::task::spawn_blocking(move || {
            // locals drop in reverse order: the encoder goes before the permit
            let _permit = permit;
            let encoder = encoder;
            encoder.encode(&image)
        });

        let embedding = tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                debug!("Verification cancelled while encoding");
                return Err(VerifyError::Cancelled);
            }
            joined = tokio::time::timeout(self.timeout, encode) => match joined {
                Err(_) => {
                    warn!(timeout_ms = self.timeout.as_millis() as u64, "Verification timed out");
                    return Err(VerifyError::TimedOut { timeout: self.timeout });
                }
                Ok(Err(join_err)) => {
                    error!(error = %join_err, "Encoder task failed");
                    return Err(VerifyError::TaskFailed { reason: join_err.to_string() });
                }
                Ok(Ok(encoded)) => encoded.map_err(VerifyError::from_encoding)?,
            },
        };

        let index = self.index.load();
        let outcome = self.scorer.score(&embedding, &index).inspect_err(|e| {
            error!(error = %e, "Query embedding is inconsistent with the reference index");
        })?;
        let result = self.policy.decide(&outcome);

        debug!(
            verified = result.is_verified,
            confidence = %result.confidence,
            best_match = result.best_match.as_deref(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Verification complete"
        );

        Ok(result)
    }

    /// Rebuilds the index from the corpus directory and swaps it in.
    ///
    /// Requests keep scoring against the old index until the swap; on failure the old
    /// index stays. Returns the new reference count.
    pub async fn rebuild_index(&self) -> Result<usize, RebuildError> {
        let _rebuilding = self.rebuild_lock.lock().await;

        let permit = self.gate.enter().await.map_err(|_| RebuildError::ShuttingDown)?;
        let encoder = Arc::clone(&self.encoder);
        let corpus_dir = self.corpus_dir.clone();

        info!(corpus = %corpus_dir.display(), "Rebuilding reference index");

        let built = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            let encoder = encoder;
            ReferenceIndex::build(&corpus_dir, &*encoder)
        })
        .await
        .map_err(|e| RebuildError::TaskFailed {
            reason: e.to_string(),
        })?;

        let next = built.inspect_err(|e| {
            warn!(error = %e, "Index rebuild failed, keeping the current index");
        })?;

        if next.version() != self.encoder.version() {
            return Err(RebuildError::EncoderMismatch {
                encoder: self.encoder.version(),
                index: next.version(),
            });
        }

        let references = next.len();
        let previous = self.index.swap(Arc::new(next));

        info!(
            references,
            previous = previous.len(),
            generation = self.index.generation(),
            "Reference index swapped"
        );

        Ok(references)
    }

    /// Stops admitting requests and rebuilds, then waits for in-flight encodes.
    ///
    /// Requests arriving after this starts fail with [`VerifyError::ShuttingDown`].
    /// Once it returns no blocking task holds the encoder; the model itself is freed
    /// when the last handle to the service drops.
    pub async fn shutdown(&self) {
        info!(
            in_flight = self.gate.in_flight(),
            "Shutting down verification service"
        );
        self.gate.drain().await;

        info!(
            encoder_handles = Arc::strong_count(&self.encoder),
            "Verification service stopped"
        );
    }

    /// Number of entries in the current index.
    pub fn reference_count(&self) -> usize {
        self.index.load().len()
    }

    /// Snapshot of the current index.
    pub fn index(&self) -> Arc<ReferenceIndex> {
        self.index.load()
    }

    /// Number of successful rebuilds.
    pub fn index_generation(&self) -> u64 {
        self.index.generation()
    }

    pub fn encoder(&self) -> &Arc<E> {
        &self.encoder
    }

    pub fn policy(&self) -> &DecisionPolicy {
        &self.policy
    }

    pub fn corpus_dir(&self) -> &Path {
        &self.corpus_dir
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Encodes currently holding a gate permit.
    pub fn in_flight(&self) -> usize {
        self.gate.in_flight()
    }

    /// Returns `true` once [`shutdown`](Self::shutdown) has started.
    pub fn is_shutting_down(&self) -> bool {
        self.gate.is_closed()
    }
}
