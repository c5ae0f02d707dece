//! Engine error types.
//!
//! Evaluation itself never fails; these cover loading policy documents and
//! decoding dynamic metadata, whose callers decide how to recover.

use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised outside the per-frame path.
#[derive(Debug, Error)]
pub enum EngineError {
    /// I/O error reading a policy file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML parsing error.
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Policy values out of range.
    #[error("invalid policy: {0}")]
    Policy(#[from] csc_core::Error),

    /// HDR10+ payload could not be decoded.
    #[error("malformed HDR10+ metadata: {reason}")]
    DynamicMetadata {
        /// What was wrong with the payload.
        reason: &'static str,
    },
}
