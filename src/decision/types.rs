use serde::Serialize;

/// Confidence percent in `0.0..=100.0`, rounded to one decimal.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize)]
#[serde(transparent)]
pub struct Confidence(f32);

impl Confidence {
    pub const ZERO: Confidence = Confidence(0.0);
    pub const MAX: Confidence = Confidence(100.0);

    /// Clamps to `0..=100` and rounds to one decimal. NaN becomes zero.
    pub fn new(percent: f32) -> Self {
        if percent.is_nan() {
            return Self::ZERO;
        }
        Self((percent.clamp(0.0, 100.0) * 10.0).round() / 10.0)
    }

    #[inline]
    pub fn value(self) -> f32 {
        self.0
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}%", self.0)
    }
}

/// Outcome category of a verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// Confidence met the threshold.
    Verified,
    /// Resembles the corpus but below the threshold.
    Possible,
    NotRecognized,
    /// The check could not be carried out.
    Unavailable,
}

/// Per-request verification record.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VerificationResult {
    pub is_verified: bool,
    pub confidence: Confidence,
    pub verdict: Verdict,
    pub message: String,
    /// Identifier of the top-ranked reference (present whenever scoring ran).
    pub best_match: Option<String>,
    /// Best single similarity, 4 decimals.
    pub raw_similarity: Option<f32>,
    /// Top-K mean similarity, 4 decimals.
    pub avg_top_k_similarity: Option<f32>,
}

impl VerificationResult {
    /// A not-verified record carrying only a message.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self {
            is_verified: false,
            confidence: Confidence::ZERO,
            verdict: Verdict::Unavailable,
            message: message.into(),
            best_match: None,
            raw_similarity: None,
            avg_top_k_similarity: None,
        }
    }
}

pub(super) fn round4(value: f32) -> f32 {
    (value * 10_000.0).round() / 10_000.0
}
