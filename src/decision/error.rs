use thiserror::Error;

/// Invalid decision-policy settings, rejected at construction.
#[derive(Debug, Error)]
pub enum DecisionError {
    #[error("invalid calibration: {reason}")]
    InvalidCalibration { reason: String },

    #[error("threshold must be within 0..=100, got {value}")]
    InvalidThreshold { value: f32 },
}
