//! Query-vs-index similarity scoring.
//!
//! Similarity is the dot product of unit vectors (cosine similarity). Every reference
//! entry is scored (linear scan; the corpus is tens of images), ranked descending with
//! ties kept in index order, and the top K similarities are averaged into one
//! aggregate score.

pub mod error;
pub mod scorer;
pub mod types;


pub use error::ScoringError;
pub use scorer::{SimilarityScorer, dot_product};
pub use types::{RankedMatch, ScoreOutcome, TopK};
