use tracing::debug;

use crate::constants::{
    DEFAULT_ARTIST_NAME, DEFAULT_CONFIDENCE_THRESHOLD, DEFAULT_POSSIBLE_MATCH_FLOOR,
};
use crate::scoring::ScoreOutcome;

use super::calibration::Calibration;
use super::error::DecisionError;
use super::types::{Confidence, Verdict, VerificationResult, round4};

/// Turns a score into a verdict, confidence and message.
#[derive(Debug, Clone)]
pub struct DecisionPolicy {
    calibration: Calibration,
    threshold: f32,
    possible_floor: f32,
    artist_name: String,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self {
            calibration: Calibration::default(),
            threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            possible_floor: DEFAULT_POSSIBLE_MATCH_FLOOR,
            artist_name: DEFAULT_ARTIST_NAME.to_string(),
        }
    }
}

impl DecisionPolicy {
    pub fn new(
        calibration: Calibration,
        threshold: f32,
        artist_name: impl Into<String>,
    ) -> Result<Self, DecisionError> {
        if !(0.0..=100.0).contains(&threshold) {
            return Err(DecisionError::InvalidThreshold { value: threshold });
        }
        Ok(Self {
            calibration,
            threshold,
            possible_floor: DEFAULT_POSSIBLE_MATCH_FLOOR.min(threshold),
            artist_name: artist_name.into(),
        })
    }

    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    pub fn artist_name(&self) -> &str {
        &self.artist_name
    }

    pub fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    /// Decides on a scored query. Verification compares the rounded confidence.
    pub fn decide(&self, outcome: &ScoreOutcome) -> VerificationResult {
        let confidence = Confidence::new(self.calibration.calibrate(outcome.aggregate));

        let verdict = if confidence.value() >= self.threshold {
            Verdict::Verified
        } else if confidence.value() >= self.possible_floor {
            Verdict::Possible
        } else {
            Verdict::NotRecognized
        };

        let best = outcome.best();

        debug!(
            aggregate = outcome.aggregate,
            %confidence,
            ?verdict,
            best_match = best.map(|m| &*m.identifier),
            "Verification decided"
        );

        VerificationResult {
            is_verified: verdict == Verdict::Verified,
            confidence,
            verdict,
            message: self.message(verdict),
            best_match: best.map(|m| m.identifier.to_string()),
            raw_similarity: best.map(|m| round4(m.similarity)),
            avg_top_k_similarity: Some(round4(outcome.aggregate)),
        }
    }

    fn message(&self, verdict: Verdict) -> String {
        let artist = &self.artist_name;
        match verdict {
            Verdict::Verified => format!("Verified! This looks like {artist}'s artwork."),
            Verdict::Possible => format!(
                "Possible match, but not confident enough to verify as {artist}'s artwork."
            ),
            Verdict::NotRecognized => format!("Not recognized as {artist}'s artwork."),
            Verdict::Unavailable => "Verification is unavailable.".to_string(),
        }
    }
}
