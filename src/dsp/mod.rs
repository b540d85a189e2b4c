//! Low-level DSP primitives.
//!
//! Every processor here is generic over a [`Sample`] type and splits its work
//! into a setup half (`prepare`, may allocate) and a realtime half (`reset`,
//! `process_*`, setters), which never allocates, locks or logs.

/// Block gain with click-free linear ramps.
pub mod amplify;
/// Multichannel sample storage with a "cleared" fast path.
pub mod buffer;
/// Linkwitz-Riley band splitting.
pub mod crossover;
/// Fractional delay line with per-lane vector delays.
pub mod delay;
/// TPT state-variable filter with multiple responses.
pub mod filter;
/// Transposed direct-form IIR filter and matched coefficient design.
pub mod iir;
/// Windowed RMS metering with a lock-free reader feed.
pub mod meter;
/// Dry/wet crossfading.
pub mod mix;
/// Processor trait and block context.
pub mod processor;
/// Scalar and vector sample types.
pub mod sample;
/// Parameter smoothing.
pub mod smoothing;
/// Mid/side matrixing and stereo width.
pub mod stereo;

pub use buffer::SampleBuffer;
pub use crossover::{CrossoverType, LinkwitzRiley};
pub use delay::DelayLine;
pub use filter::{FilterType, SvtFilter};
pub use iir::{Coefficients, IirFilter, MatchedType};
pub use meter::{MeterReading, VolumeMeter};
pub use processor::{ProcessContext, Processor};
pub use sample::Sample;
pub use smoothing::{SmoothedValue, SmoothingKind};
