//! Error types for setup-time validation.
//!
//! Nothing on the audio path returns these: processing calls clamp control
//! values and panic on programming errors instead.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DspError {
    #[error("invalid sample rate: {0}")]
    InvalidSampleRate(f64),

    #[error("invalid maximum block size: {0}")]
    InvalidBlockSize(usize),

    #[error("invalid channel count {0} (expected 1..={max})", max = crate::MAX_CHANNELS)]
    InvalidChannelCount(usize),

    #[error("maintenance interval must be non-zero, got {0:?}")]
    InvalidInterval(std::time::Duration),

    #[error("failed to spawn maintenance thread: {0}")]
    Spawn(#[from] std::io::Error),
}

pub type DspResult<T> = Result<T, DspError>;
