use std::sync::Arc;

use tracing::debug;

use crate::embedding::Embedding;
use crate::index::ReferenceIndex;

use super::error::ScoringError;
use super::types::{RankedMatch, ScoreOutcome, TopK};

/// Dot product of two equal-length vectors (cosine similarity for unit vectors).
#[inline]
pub fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len());
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Stateless scorer; cheap to clone and safe to share across requests.
#[derive(Debug, Clone, Default)]
pub struct SimilarityScorer {
    top_k: TopK,
}

impl SimilarityScorer {
    pub fn new(top_k: TopK) -> Self {
        Self { top_k }
    }

    pub fn top_k(&self) -> TopK {
        self.top_k
    }

    /// Scores `query` against every entry of `index`.
    pub fn score(
        &self,
        query: &Embedding,
        index: &ReferenceIndex,
    ) -> Result<ScoreOutcome, ScoringError> {
        if index.is_empty() {
            return Err(ScoringError::EmptyIndex);
        }

        if query.dim() != index.dim() {
            return Err(ScoringError::DimensionMismatch {
                expected: index.dim(),
                actual: query.dim(),
            });
        }

        if query.version() != index.version() {
            return Err(ScoringError::EncoderMismatch {
                query: query.version(),
                index: index.version(),
            });
        }

        let mut ranked: Vec<RankedMatch> = index
            .iter()
            .map(|entry| RankedMatch {
                identifier: Arc::clone(entry.identifier()),
                similarity: dot_product(query.values(), entry.embedding().values()),
            })
            .collect();

        // sort_by is stable: equal similarities keep index order
        ranked.sort_by(|a, b| b.similarity.total_cmp(&a.similarity));

        let top_k = self.top_k.resolve(ranked.len());
        let aggregate =
            ranked[..top_k].iter().map(|m| m.similarity).sum::<f32>() / top_k as f32;

        debug!(
            entries = ranked.len(),
            top_k,
            aggregate,
            best = ranked[0].similarity,
            best_match = %ranked[0].identifier,
            "Scored query against reference index"
        );

        Ok(ScoreOutcome {
            aggregate,
            top_k,
            ranked,
        })
    }
}
