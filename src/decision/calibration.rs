use super::error::DecisionError;

/// Default knots, raw similarity to confidence percent.
///
/// Below 0.40 the image is treated as unrelated, 0.55..0.70 is "same subject",
/// and 0.80 and up is reserved for near-duplicates of a reference work.
pub const DEFAULT_KNOTS: &[(f32, f32)] = &[
    (0.00, 0.0),
    (0.40, 25.0),
    (0.55, 50.0),
    (0.70, 75.0),
    (0.80, 90.0),
    (1.00, 100.0),
];

/// Monotonic piecewise-linear map from raw similarity to a 0-100 confidence.
///
/// Inputs outside the knot range are clamped to the first/last knot.
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    knots: Vec<(f32, f32)>,
}

impl Calibration {
    /// Validates and wraps `knots`.
    ///
    /// Needs at least two knots, raw values strictly increasing, confidences
    /// non-decreasing and within `0..=100`.
    pub fn new(knots: Vec<(f32, f32)>) -> Result<Self, DecisionError> {
        let invalid = |reason: String| DecisionError::InvalidCalibration { reason };

        if knots.len() < 2 {
            return Err(invalid(format!(
                "need at least 2 knots, got {}",
                knots.len()
            )));
        }

        for &(raw, confidence) in &knots {
            if !raw.is_finite() || !confidence.is_finite() {
                return Err(invalid(format!("non-finite knot ({raw}, {confidence})")));
            }
            if !(0.0..=100.0).contains(&confidence) {
                return Err(invalid(format!(
                    "confidence {confidence} outside 0..=100"
                )));
            }
        }

        for pair in knots.windows(2) {
            let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
            if x1 <= x0 {
                return Err(invalid(format!(
                    "raw similarity must be strictly increasing ({x0} then {x1})"
                )));
            }
            if y1 < y0 {
                return Err(invalid(format!(
                    "confidence must be non-decreasing ({y0} then {y1})"
                )));
            }
        }

        Ok(Self { knots })
    }

    pub fn knots(&self) -> &[(f32, f32)] {
        &self.knots
    }

    /// Maps a raw similarity to an (unrounded) confidence percent.
    pub fn calibrate(&self, raw: f32) -> f32 {
        let first = self.knots[0];
        let last = self.knots[self.knots.len() - 1];

        if raw.is_nan() || raw <= first.0 {
            return first.1;
        }
        if raw >= last.0 {
            return last.1;
        }

        // first.0 < raw < last.0, so 1 <= i < len
        let i = self.knots.partition_point(|&(x, _)| x <= raw);
        let (x0, y0) = self.knots[i - 1];
        let (x1, y1) = self.knots[i];

        y0 + (raw - x0) / (x1 - x0) * (y1 - y0)
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            knots: DEFAULT_KNOTS.to_vec(),
        }
    }
}
