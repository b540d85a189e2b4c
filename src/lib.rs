//! Realtime-safe building blocks for audio effect plugins.
//!
//! The `dsp` module holds the per-sample processors (filters, crossover, delay,
//! smoothing, metering) and the `SampleBuffer` they operate on. The `engine`
//! module holds the non-realtime plumbing that lets a control thread hand
//! resources to the audio thread and retire them safely.

pub mod config;
pub mod dsp;
pub mod engine;
pub mod error;

pub use config::{DspConfig, ProcessSpec};
pub use error::{DspError, DspResult};

/// Hard ceiling on the number of channels any buffer or processor handles.
pub const MAX_CHANNELS: usize = 8;
