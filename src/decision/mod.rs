//! Calibration and verdicts.
//!
//! Raw similarities are not probabilities; the [`Calibration`] curve maps them onto a
//! 0-100 confidence that the [`DecisionPolicy`] thresholds.

pub mod calibration;
pub mod error;
pub mod policy;
pub mod types;

#[cfg(test)]
mod tests;

pub use calibration::{Calibration, DEFAULT_KNOTS};
pub use error::DecisionError;
pub use policy::DecisionPolicy;
pub use types::{Confidence, Verdict, VerificationResult};
