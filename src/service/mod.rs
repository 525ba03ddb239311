//! The verification service: encoder, index, scorer and policy behind one async API.
//!
//! Requests are admitted through an [`EncoderGate`]; the encode runs on the blocking
//! pool while scoring and the decision run on the caller's task.

pub mod error;
pub mod gate;
pub mod verifier;


pub use error::{ErrorKind, RebuildError, StartupError, VerifyError};
pub use gate::{EncoderGate, GateError};
pub use verifier::VerificationService;
