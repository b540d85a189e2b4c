use std::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{error::DspError, DspResult, MAX_CHANNELS};

/// Describes the stream a processor is prepared for.
///
/// Handed to every `prepare` call by the host:
/// - sample_rate: Audio sample rate in Hz (e.g., 48000.0)
/// - maximum_block_size: Largest block `process` will ever see
/// - num_channels: Channel count, between 1 and `MAX_CHANNELS`
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ProcessSpec {
    pub sample_rate: f64,
    pub maximum_block_size: usize,
    pub num_channels: usize,
}

impl ProcessSpec {
    /// Validate and build a spec.
    pub fn new(sample_rate: f64, maximum_block_size: usize, num_channels: usize) -> DspResult<Self> {
        if !(sample_rate.is_finite() && sample_rate > 0.0) {
            return Err(DspError::InvalidSampleRate(sample_rate));
        }
        if maximum_block_size == 0 {
            return Err(DspError::InvalidBlockSize(maximum_block_size));
        }
        if num_channels == 0 || num_channels > MAX_CHANNELS {
            return Err(DspError::InvalidChannelCount(num_channels));
        }

        Ok(Self {
            sample_rate,
            maximum_block_size,
            num_channels,
        })
    }

    /// Stereo spec, the common plugin case.
    pub fn stereo(sample_rate: f64, maximum_block_size: usize) -> DspResult<Self> {
        Self::new(sample_rate, maximum_block_size, 2)
    }
}

impl Default for ProcessSpec {
    fn default() -> Self {
        Self {
            sample_rate: 44_100.0,
            maximum_block_size: 512,
            num_channels: 2,
        }
    }
}

/// Ramp length used by smoothed parameters unless configured otherwise.
pub const DEFAULT_SMOOTHING_SECONDS: f64 = 0.01;
pub const DEFAULT_METER_WINDOW_SECONDS: f64 = 0.1;
pub const DEFAULT_RELEASE_INTERVAL: Duration = Duration::from_secs(1);

/// Tunables shared by the smoothing, metering and release helpers.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct DspConfig {
    /// Ramp length for smoothed filter and gain parameters.
    pub smoothing_seconds: f64,
    /// Length of the RMS averaging window used by the volume meter.
    pub meter_window_seconds: f64,
    /// How often the release pool sweeps for unreferenced objects.
    pub release_interval: Duration,
}

impl Default for DspConfig {
    fn default() -> Self {
        Self {
            smoothing_seconds: DEFAULT_SMOOTHING_SECONDS,
            meter_window_seconds: DEFAULT_METER_WINDOW_SECONDS,
            release_interval: DEFAULT_RELEASE_INTERVAL,
        }
    }
}
