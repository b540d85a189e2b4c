//! Mid/side matrixing and stereo width.

/*
Mid/Side
========

A stereo pair (L, R) can be rewritten as what the channels share ("mid") and
how they differ ("side"):

    mid  = (L + R) / 2
    side = (L − R) / 2

and back:

    L = mid + side
    R = mid − side

Scaling the side channel before decoding changes the perceived width:

    side × 0.0  →  mono (L = R = mid)
    side × 1.0  →  unchanged
    side × 2.0  →  wider than the source

Encoding happens in place: after `ms_encode` channel 0 holds mid and
channel 1 holds side.

Mono to Stereo
--------------

A mono source has no side signal to widen. `MonoToStereo` synthesises one
from a short delayed copy of the left channel (a Haas-style trick): the
delayed copy is added to side, so it lands in L with one polarity and in R
with the other, while mid stays untouched.

Rotation Enhancer
-----------------

`gruhn_enhance` treats each (L, R) sample pair as a point in the plane, with
angle measured from the R axis towards L, and rotates it by `amount · 90°`
while keeping its distance from the origin. A centred mono source (L = R,
45°) lands hard right at 0.5 and returns to both channels at 1.0 with the
left channel's polarity flipped. Loudness is preserved sample by sample.
*/

use std::f64::consts::FRAC_PI_2;

use crate::{
    config::{DspConfig, ProcessSpec, DEFAULT_SMOOTHING_SECONDS},
    dsp::{
        amplify::apply_smooth_gain,
        buffer::SampleBuffer,
        delay::DelayLine,
        processor::Processor,
        sample::Sample,
        smoothing::SmoothedValue,
    },
};

/// Encode L/R into M/S in place, scaling side by `side_gain`.
///
/// # Panics
/// Panics if the buffer has fewer than two channels.
pub fn ms_encode<T: Sample>(buffer: &mut SampleBuffer<T>, side_gain: f64) {
    let half = T::splat(0.5);
    let side_scale = T::splat(0.5 * side_gain);
    let (left, right) = buffer.stereo_mut();

    for (l, r) in left.iter_mut().zip(right.iter_mut()) {
        let mid = (*l + *r) * half;
        let side = (*l - *r) * side_scale;
        *l = mid;
        *r = side;
    }
}

/// Decode M/S back to L/R in place.
///
/// # Panics
/// Panics if the buffer has fewer than two channels.
pub fn ms_decode<T: Sample>(buffer: &mut SampleBuffer<T>) {
    let (mid, side) = buffer.stereo_mut();

    for (m, s) in mid.iter_mut().zip(side.iter_mut()) {
        let left = *m + *s;
        let right = *m - *s;
        *m = left;
        *s = right;
    }
}

/// Rotate every (L, R) pair by `amount · 90°`, keeping its radius.
///
/// `amount` is expected in `[0, 1]`. Stateless.
///
/// # Panics
/// Panics if the buffer has fewer than two channels.
pub fn gruhn_enhance<T: Sample>(buffer: &mut SampleBuffer<T>, amount: f64) {
    let rotation = amount * FRAC_PI_2;
    let (left, right) = buffer.stereo_mut();

    let rotate = |l: f64, r: f64| {
        let radius = l.hypot(r);
        let angle = l.atan2(r) - rotation;
        (angle.sin() * radius, angle.cos() * radius)
    };

    for (l, r) in left.iter_mut().zip(right.iter_mut()) {
        let (l0, r0) = (*l, *r);
        *l = T::from_fn(|i| rotate(l0.lane(i), r0.lane(i)).0);
        *r = T::from_fn(|i| rotate(l0.lane(i), r0.lane(i)).1);
    }
}

/// Stereo width control with a ramped width change between blocks.
#[derive(Debug, Clone)]
pub struct StereoWidth {
    last_width: f64,
}

impl Default for StereoWidth {
    fn default() -> Self {
        Self::new()
    }
}

impl StereoWidth {
    pub fn new() -> Self {
        Self { last_width: 1.0 }
    }

    /// Forget the previous width so the next block starts at unity.
    pub fn reset(&mut self) {
        self.last_width = 1.0;
    }

    pub fn width(&self) -> f64 {
        self.last_width
    }

    /// Scale the side signal by `width`.
    ///
    /// - is_ms: The buffer already holds mid/side; otherwise it is encoded
    ///   and decoded around the width change
    pub fn process<T: Sample>(&mut self, buffer: &mut SampleBuffer<T>, width: f64, is_ms: bool) {
        process_width(buffer, width, is_ms, &mut self.last_width, true);
    }
}

/// Stateless width change. `last_width` ramps to `width` across the block.
pub fn process_width<T: Sample>(
    buffer: &mut SampleBuffer<T>,
    width: f64,
    is_ms: bool,
    last_width: &mut f64,
    update: bool,
) {
    if !is_ms {
        ms_encode(buffer, 1.0);
    }

    let (_, side) = buffer.stereo_mut();
    apply_smooth_gain(side, width, last_width, update);

    if !is_ms {
        ms_decode(buffer);
    }
}

/// Synthesises a stereo image from a mono source.
#[derive(Debug, Clone)]
pub struct MonoToStereo<T: Sample> {
    delay: DelayLine<T>,
    amount: SmoothedValue,
    sample_rate: f64,
    delay_ms: f64,
    ramp_seconds: f64,
}

impl<T: Sample> Default for MonoToStereo<T> {
    fn default() -> Self {
        Self::new(4_410)
    }
}

impl<T: Sample> MonoToStereo<T> {
    pub fn new(max_delay_samples: usize) -> Self {
        Self {
            delay: DelayLine::new(max_delay_samples),
            amount: SmoothedValue::linear(0.0),
            sample_rate: 44_100.0,
            delay_ms: 0.0,
            ramp_seconds: DEFAULT_SMOOTHING_SECONDS,
        }
    }

    /// Ramp length for amount changes. Applied on the next `prepare`.
    pub fn with_smoothing_time(mut self, ramp_seconds: f64) -> Self {
        self.ramp_seconds = ramp_seconds;
        self
    }

    pub fn with_config(self, config: &DspConfig) -> Self {
        self.with_smoothing_time(config.smoothing_seconds)
    }

    /// Delay applied to the left copy feeding the side channel.
    pub fn set_delay_ms(&mut self, delay_ms: f64) {
        self.delay_ms = delay_ms;
        self.delay.set_delay_ms(delay_ms);
    }

    /// Amount of synthesised side signal (0.0 = untouched).
    pub fn set_amount(&mut self, amount: f64) {
        self.amount.set_target(amount);
    }

    pub fn amount(&self) -> f64 {
        self.amount.target()
    }
}

impl<T: Sample> Processor<T> for MonoToStereo<T> {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.sample_rate = spec.sample_rate;
        self.delay.prepare(spec);
        self.delay.set_delay_ms(self.delay_ms);
        self.amount.reset(spec.sample_rate, self.ramp_seconds);
    }

    fn reset(&mut self) {
        self.delay.reset();
    }

    /// # Panics
    /// Panics if the block has fewer than two channels.
    fn process_block(&mut self, block: &mut SampleBuffer<T>) {
        let half = T::splat(0.5);
        let (left, right) = block.stereo_mut();

        for (l, r) in left.iter_mut().zip(right.iter_mut()) {
            let amount = T::splat(self.amount.next_value());

            self.delay.push_sample(0, *l);
            let delayed = amount * self.delay.pop_sample(0, None, true);

            let mid = (*l + *r) * half;
            let side = (*l - *r) * half + delayed * half;

            *l = mid + side;
            *r = mid - side;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn stereo(left: &[f64], right: &[f64]) -> SampleBuffer<f64> {
        SampleBuffer::from_channels(&[left, right])
    }

    #[test]
    fn test_encode_decode_restores_input() {
        let mut buffer = stereo(&[1.0, 0.5, -0.25], &[0.0, 0.5, 0.75]);

        ms_encode(&mut buffer, 1.0);
        assert_eq!(buffer.read_channel(0), &[0.5, 0.5, 0.25]);
        assert_eq!(buffer.read_channel(1), &[0.5, 0.0, -0.5]);

        ms_decode(&mut buffer);
        assert_eq!(buffer.read_channel(0), &[1.0, 0.5, -0.25]);
        assert_eq!(buffer.read_channel(1), &[0.0, 0.5, 0.75]);
    }

    #[test]
    fn test_side_gain_scales_side_only() {
        let mut buffer = stereo(&[1.0], &[0.0]);
        ms_encode(&mut buffer, 0.5);
        assert_eq!(buffer.read_channel(0), &[0.5]);
        assert_eq!(buffer.read_channel(1), &[0.25]);
    }

    #[test]
    fn test_zero_width_is_mono() {
        let mut width = StereoWidth::new();
        let mut last = 0.0;
        let mut buffer = stereo(&[1.0, -1.0], &[0.0, 0.5]);

        process_width(&mut buffer, 0.0, false, &mut last, true);

        assert_eq!(buffer.read_channel(0), buffer.read_channel(1));
        assert_eq!(buffer.read_channel(0), &[0.5, -0.25]);

        // Unity width leaves the image alone.
        let mut buffer = stereo(&[1.0, -1.0], &[0.0, 0.5]);
        width.process(&mut buffer, 1.0, false);
        assert_eq!(buffer.read_channel(0), &[1.0, -1.0]);
        assert_eq!(buffer.read_channel(1), &[0.0, 0.5]);
    }

    #[test]
    fn test_width_change_is_ramped() {
        let mut width = StereoWidth::new();
        let mut buffer = SampleBuffer::<f64>::new(2, 4);
        buffer.write_channel(0).fill(0.0);
        buffer.write_channel(1).fill(1.0);

        // Already M/S: channel 1 is side.
        width.process(&mut buffer, 0.0, true);

        assert_eq!(buffer.read_channel(1), &[1.0, 0.75, 0.5, 0.25]);
        assert_eq!(width.width(), 0.0);
    }

    #[test]
    fn test_mono_to_stereo_keeps_mid() {
        let mut widener = MonoToStereo::<f64>::new(480);
        widener.prepare(&ProcessSpec::new(48_000.0, 64, 2).unwrap());
        widener.set_delay_ms(1.0);
        widener.set_amount(1.0);

        let signal: Vec<f64> = (0..64).map(|i| (i as f64 * 0.3).sin()).collect();
        let mut block = stereo(&signal, &signal);
        widener.process_block(&mut block);

        let (l, r) = (block.read_channel(0), block.read_channel(1));
        for i in 0..64 {
            assert_abs_diff_eq!((l[i] + r[i]) * 0.5, signal[i], epsilon = 1e-12);
        }
        assert!((l[63] - r[63]).abs() > 1e-3);
    }

    #[test]
    fn test_mono_to_stereo_silent_at_zero_amount() {
        let mut widener = MonoToStereo::<f32>::default();
        widener.prepare(&ProcessSpec::new(44_100.0, 16, 2).unwrap());
        widener.set_delay_ms(5.0);

        let mut block = SampleBuffer::<f32>::new(2, 16);
        block.write_channel(0).fill(0.5);
        block.write_channel(1).fill(0.5);
        widener.process_block(&mut block);

        assert!(block.read_channel(0).iter().all(|&s| (s - 0.5).abs() < 1e-6));
        assert!(block.read_channel(1).iter().all(|&s| (s - 0.5).abs() < 1e-6));
    }

    #[test]
    fn test_gruhn_zero_amount_is_identity() {
        let left = [0.5, -0.25, 0.0, 0.0, 1.0, -0.75];
        let right = [0.5, 0.75, -0.3, 0.0, 0.0, -0.75];
        let mut buffer = stereo(&left, &right);

        gruhn_enhance(&mut buffer, 0.0);

        for i in 0..left.len() {
            assert_abs_diff_eq!(buffer.read_channel(0)[i], left[i], epsilon = 1e-12);
            assert_abs_diff_eq!(buffer.read_channel(1)[i], right[i], epsilon = 1e-12);
        }
    }

    #[test]
    fn test_gruhn_preserves_radius() {
        let left: Vec<f64> = (0..64).map(|i| (i as f64 * 0.37).sin()).collect();
        let right: Vec<f64> = (0..64).map(|i| (i as f64 * 0.21).cos() * 0.5).collect();

        for amount in [0.25, 0.5, 1.0] {
            let mut buffer = stereo(&left, &right);
            gruhn_enhance(&mut buffer, amount);

            let (l, r) = (buffer.read_channel(0), buffer.read_channel(1));
            for i in 0..64 {
                assert_abs_diff_eq!(l[i].hypot(r[i]), left[i].hypot(right[i]), epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_gruhn_quarter_turn() {
        // Hard left rotates onto the right channel.
        let mut buffer = stereo(&[1.0, -0.5], &[0.0, 0.0]);
        gruhn_enhance(&mut buffer, 1.0);

        assert_abs_diff_eq!(buffer.read_channel(0)[0], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(buffer.read_channel(1)[0], 1.0, epsilon = 1e-12);
        assert_abs_diff_eq!(buffer.read_channel(0)[1], 0.0, epsilon = 1e-12);
        assert_abs_diff_eq!(buffer.read_channel(1)[1], -0.5, epsilon = 1e-12);
    }

    #[test]
    fn test_mono_to_stereo_amount_ramp_from_config() {
        let config = DspConfig {
            smoothing_seconds: 0.001,
            ..DspConfig::default()
        };
        let mut widener = MonoToStereo::<f64>::new(480).with_config(&config);
        widener.prepare(&ProcessSpec::new(48_000.0, 64, 2).unwrap());
        widener.set_delay_ms(0.0);
        widener.set_amount(1.0);

        // 48-sample ramp: fully applied by the end of a 64-sample block.
        let mut block = SampleBuffer::<f64>::new(2, 64);
        block.write_channel(0).fill(1.0);
        widener.process_block(&mut block);

        assert_abs_diff_eq!(block.read_channel(0)[63], 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(block.read_channel(1)[63], -0.5, epsilon = 1e-12);
    }
}
