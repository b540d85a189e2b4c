//! Block gain with click-free ramps.

/*
Gain Ramps
==========

Applying a new gain to a whole block at once creates a step discontinuity at
the block boundary. If the previous block ended at gain 0.2 and the next
starts at 0.8, the waveform jumps and we hear a click.

A linear ramp spreads the change across the block:

    increment = (new_gain - last_gain) / block_len

    sample[0]   × last_gain
    sample[1]   × (last_gain + increment)
    ...
    sample[n-1] × (new_gain - increment)

The next block then starts exactly at `new_gain`, so gain is continuous
across block boundaries.

Gain in Decibels
----------------

    dB = 20 × log₁₀(gain)

    ×1.0   =   0 dB  (unity)
    ×0.5   ≈  -6 dB
    ×0.1   = -20 dB
    ×2.0   ≈  +6 dB

State
-----

The caller owns `last_gain`. These helpers update it to the new gain once the
ramp is applied, unless `update` is false (useful when the same ramp is
applied to several independent slices).
*/

use crate::dsp::{buffer::SampleBuffer, sample::Sample};

/// Multiply a signal by a constant gain (in-place).
#[inline]
pub fn apply_gain<T: Sample>(signal: &mut [T], gain: f64) {
    let g = T::splat(gain);
    for sample in signal.iter_mut() {
        *sample *= g;
    }
}

/// Ramp linearly from `*last_gain` to `gain` across `signal`.
///
/// When the gains are equal this is a plain constant gain.
pub fn apply_smooth_gain<T: Sample>(signal: &mut [T], gain: f64, last_gain: &mut f64, update: bool) {
    if *last_gain == gain {
        apply_gain(signal, gain);
        return;
    }

    let mut current = *last_gain;
    let increment = (gain - current) / signal.len().max(1) as f64;

    for sample in signal.iter_mut() {
        *sample *= T::splat(current);
        current += increment;
    }

    if update {
        *last_gain = gain;
    }
}

/// Ramp every channel of `buffer` from `*last_gain` to `gain` in lockstep.
pub fn apply_smooth_gain_buffer<T: Sample>(
    buffer: &mut SampleBuffer<T>,
    gain: f64,
    last_gain: &mut f64,
    update: bool,
) {
    if *last_gain == gain {
        buffer.apply_gain(gain);
        return;
    }

    let start = *last_gain;
    for channel in buffer.channels_mut() {
        let mut ramp = start;
        apply_smooth_gain(channel, gain, &mut ramp, false);
    }

    if update {
        *last_gain = gain;
    }
}
