//! Immutable reference index built from a corpus directory.
//!
//! The index is built once (or per explicit rebuild) and never mutated afterwards.
//! Per-file decode or encode failures are skipped and recorded; only an index with
//! zero usable entries is an error.

pub mod error;
pub mod handle;

#[cfg(test)]
mod tests;

pub use error::IndexError;
pub use handle::IndexHandle;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use image::{DynamicImage, ImageReader};
use tracing::{debug, info, warn};

use crate::embedding::{Embedding, EncoderVersion, ImageEncoder};

/// File extensions (lowercase) recognized as reference images.
pub const SUPPORTED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp"];

/// Returns `true` if `path` has a supported image extension (case-insensitive).
pub fn is_supported_image(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SUPPORTED_EXTENSIONS
                .iter()
                .any(|supported| ext.eq_ignore_ascii_case(supported))
        })
}

/// A reference image's identifier and embedding.
#[derive(Debug, Clone)]
pub struct ReferenceEntry {
    identifier: Arc<str>,
    embedding: Embedding,
}

impl ReferenceEntry {
    pub fn new(identifier: impl Into<Arc<str>>, embedding: Embedding) -> Self {
        Self {
            identifier: identifier.into(),
            embedding,
        }
    }

    #[inline]
    pub fn identifier(&self) -> &Arc<str> {
        &self.identifier
    }

    #[inline]
    pub fn embedding(&self) -> &Embedding {
        &self.embedding
    }
}

/// A corpus file that was left out of the index.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Ordered, immutable set of reference embeddings.
///
/// Invariants: non-empty, and every entry shares one dimension and one encoder version.
#[derive(Debug)]
pub struct ReferenceIndex {
    entries: Vec<ReferenceEntry>,
    dim: usize,
    version: EncoderVersion,
    source: Option<PathBuf>,
    built_at: DateTime<Utc>,
    skipped: Vec<SkippedFile>,
}

impl ReferenceIndex {
    /// Encodes every supported image in `corpus_dir`, in file-name order.
    pub fn build<E>(corpus_dir: impl AsRef<Path>, encoder: &E) -> Result<Self, IndexError>
    where
        E: ImageEncoder + ?Sized,
    {
        let corpus_dir = corpus_dir.as_ref();
        let files = list_corpus(corpus_dir)?;

        info!(
            corpus = %corpus_dir.display(),
            files = files.len(),
            "Loading reference images"
        );

        let mut entries = Vec::with_capacity(files.len());
        let mut skipped = Vec::new();

        for path in files {
            let identifier = file_identifier(&path);

            let image = match load_image(&path) {
                Ok(image) => image,
                Err(reason) => {
                    warn!(file = %identifier, %reason, "Skipping unreadable reference image");
                    skipped.push(SkippedFile { path, reason });
                    continue;
                }
            };

            match encoder.encode(&image) {
                Ok(embedding) => {
                    debug!(file = %identifier, "Encoded reference image");
                    entries.push(ReferenceEntry::new(identifier, embedding));
                }
                Err(e) => {
                    warn!(file = %identifier, error = %e, "Skipping reference image that failed to encode");
                    skipped.push(SkippedFile {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        if entries.is_empty() {
            return Err(IndexError::EmptyCorpus {
                path: corpus_dir.to_path_buf(),
                skipped: skipped.len(),
            });
        }

        let index = Self::assemble(entries, Some(corpus_dir.to_path_buf()), skipped)?;

        info!(
            entries = index.len(),
            skipped = index.skipped.len(),
            dim = index.dim,
            version = %index.version,
            "Reference index built"
        );

        Ok(index)
    }

    /// Builds an index from pre-computed entries (e.g. embeddings cached by a caller).
    pub fn from_entries(entries: Vec<ReferenceEntry>) -> Result<Self, IndexError> {
        if entries.is_empty() {
            return Err(IndexError::EmptyCorpus {
                path: PathBuf::new(),
                skipped: 0,
            });
        }
        Self::assemble(entries, None, Vec::new())
    }

    fn assemble(
        entries: Vec<ReferenceEntry>,
        source: Option<PathBuf>,
        skipped: Vec<SkippedFile>,
    ) -> Result<Self, IndexError> {
        let first = entries[0].embedding();
        let (dim, version) = (first.dim(), first.version());

        for entry in &entries[1..] {
            let embedding = entry.embedding();
            if embedding.dim() != dim {
                return Err(IndexError::DimensionMismatch {
                    identifier: entry.identifier().to_string(),
                    expected: dim,
                    actual: embedding.dim(),
                });
            }
            if embedding.version() != version {
                return Err(IndexError::EncoderMismatch {
                    identifier: entry.identifier().to_string(),
                    expected: version,
                    actual: embedding.version(),
                });
            }
        }

        Ok(Self {
            entries,
            dim,
            version,
            source,
            built_at: Utc::now(),
            skipped,
        })
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Always `false` for a constructed index.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn entries(&self) -> &[ReferenceEntry] {
        &self.entries
    }

    pub fn iter(&self) -> impl Iterator<Item = &ReferenceEntry> {
        self.entries.iter()
    }

    pub fn get(&self, identifier: &str) -> Option<&ReferenceEntry> {
        self.entries
            .iter()
            .find(|entry| &*entry.identifier == identifier)
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    #[inline]
    pub fn version(&self) -> EncoderVersion {
        self.version
    }

    /// Corpus directory the index was built from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    pub fn built_at(&self) -> DateTime<Utc> {
        self.built_at
    }

    /// Corpus files that were skipped during the build.
    pub fn skipped(&self) -> &[SkippedFile] {
        &self.skipped
    }
}

fn list_corpus(dir: &Path) -> Result<Vec<PathBuf>, IndexError> {
    if !dir.exists() {
        return Err(IndexError::CorpusNotFound {
            path: dir.to_path_buf(),
        });
    }
    if !dir.is_dir() {
        return Err(IndexError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }

    let io_err = |source| IndexError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_file() && is_supported_image(&path) {
            files.push(path);
        }
    }

    // read_dir order is platform-dependent; insertion order must not be
    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

fn load_image(path: &Path) -> Result<DynamicImage, String> {
    ImageReader::open(path)
        .and_then(|reader| reader.with_guessed_format())
        .map_err(|e| e.to_string())?
        .decode()
        .map_err(|e| e.to_string())
}

fn file_identifier(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
