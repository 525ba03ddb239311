use std::str::FromStr;
use std::sync::Arc;

use serde::Serialize;

/// How many of the best matches are averaged into the aggregate score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TopK {
    /// Average the best `k` matches (all of them if the index is smaller).
    Fixed(usize),
    /// Roughly a tenth of the corpus, at least 3 and at most 10.
    Scaled,
}

impl TopK {
    const SCALED_MIN: usize = 3;
    const SCALED_MAX: usize = 10;

    /// Resolves the effective K for an index of `index_len` entries (always `>= 1`).
    pub fn resolve(self, index_len: usize) -> usize {
        let k = match self {
            TopK::Fixed(k) => k,
            TopK::Scaled => (index_len / 10 + 1).clamp(Self::SCALED_MIN, Self::SCALED_MAX),
        };
        k.min(index_len).max(1)
    }
}

impl Default for TopK {
    fn default() -> Self {
        TopK::Fixed(crate::constants::DEFAULT_TOP_K)
    }
}

impl std::fmt::Display for TopK {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TopK::Fixed(k) => write!(f, "{k}"),
            TopK::Scaled => write!(f, "auto"),
        }
    }
}

impl FromStr for TopK {
    type Err = String;

    /// Accepts a positive integer, or `auto` for [`TopK::Scaled`].
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            return Ok(TopK::Scaled);
        }
        match s.parse::<usize>() {
            Ok(0) => Err("top-k must be at least 1".to_string()),
            Ok(k) => Ok(TopK::Fixed(k)),
            Err(e) => Err(format!("expected a positive integer or 'auto': {e}")),
        }
    }
}

/// One reference entry's similarity to the query.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedMatch {
    pub identifier: Arc<str>,
    pub similarity: f32,
}

/// Ranked similarities plus the top-K aggregate.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreOutcome {
    /// Mean of the `top_k` best similarities.
    pub aggregate: f32,
    /// Effective K used for the aggregate.
    pub top_k: usize,
    /// Every reference entry, best first; ties keep index order.
    pub ranked: Vec<RankedMatch>,
}

impl ScoreOutcome {
    /// The single best match.
    pub fn best(&self) -> Option<&RankedMatch> {
        self.ranked.first()
    }

    /// The matches that went into the aggregate.
    pub fn top(&self) -> &[RankedMatch] {
        &self.ranked[..self.top_k.min(self.ranked.len())]
    }
}
