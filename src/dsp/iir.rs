//! Transposed direct-form IIR filtering with matched coefficient design.

/*
Transposed Direct Form II
=========================

A general IIR filter of order N is described by two coefficient lists:

    H(z) = (b0 + b1·z⁻¹ + ... + bN·z⁻ᴺ) / (1 + a1·z⁻¹ + ... + aN·z⁻ᴺ)

The transposed direct form keeps N state values per channel (lv1..lvN) and
evaluates one sample as:

    y    = b0·x + lv1
    lv1  = b1·x − a1·y + lv2
    lv2  = b2·x − a2·y + lv3
    ...
    lvN  = bN·x − aN·y

Orders 1 to 3 are unrolled into locals; higher orders walk the state array.

Shared Coefficients
-------------------

Coefficients live behind an `Arc` so one designed set can drive many filter
instances (one per voice or band) and so a control thread can build a new set
and swap it in. `set_coefficients` hands the old `Arc` back to the caller,
who passes it to a `ReleasePool` instead of dropping it on the audio thread.

Matched Second-Order Design
---------------------------

The bilinear transform squeezes the whole analog frequency axis into
[0, Nyquist], so a lowpass at 18 kHz (at 48 kHz) "cramps": its response near
Nyquist falls far below the analog prototype's. Vicanek's matched design
avoids this:

  1. Poles come from impulse invariance:

         w0  = 2π·fc/fs        q = 1/(2·Q)
         r   = exp(−q·w0)                       (pole radius)
         a1  = −2r·cos(√(1−q²)·w0)              (cosh form when q > 1)
         a2  = r²

  2. The zeros are chosen so the digital magnitude equals the analog
     magnitude at DC and at Nyquist.

The first-order lowpass/highpass and shelving sets use the same idea with a
single pole.
*/

use std::f64::consts::PI;
use std::sync::Arc;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    config::ProcessSpec,
    dsp::{buffer::SampleBuffer, processor::Processor, sample::Sample},
};

/// Normalised IIR coefficients stored as `[b0..bN, a1..aN]`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Coefficients {
    order: usize,
    raw: Vec<f64>,
}

/// Response shapes produced by the matched designer.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchedType {
    Lowpass,
    Highpass,
    Bandpass,
    FirstOrderLowpass,
    FirstOrderHighpass,
    LowShelf,
    HighShelf,
}

/// Radius of the impulse-invariant pole pair for a cutoff and resonance.
///
/// Transients of a second-order section decay as `radius^n`.
pub fn pole_radius(sample_rate: f64, cutoff_hz: f64, resonance: f64) -> f64 {
    let w0 = 2.0 * PI * cutoff_hz / sample_rate;
    let q = 1.0 / (2.0 * resonance);
    (-q * w0).exp()
}

impl Coefficients {
    /// Build from numerator `b` and denominator `a`, normalising by `a[0]`.
    ///
    /// # Panics
    /// Panics if the lists differ in length, describe an order below 1, or
    /// `a[0]` is zero.
    pub fn new(b: &[f64], a: &[f64]) -> Self {
        assert_eq!(b.len(), a.len(), "numerator and denominator lengths differ");
        assert!(b.len() >= 2, "filter order must be at least 1");
        assert!(a[0] != 0.0, "a0 must be non-zero");

        let order = b.len() - 1;
        let norm = 1.0 / a[0];

        let mut raw = Vec::with_capacity(order * 2 + 1);
        raw.extend(b.iter().map(|&v| v * norm));
        raw.extend(a[1..].iter().map(|&v| v * norm));

        Self { order, raw }
    }

    /// Design a matched filter.
    ///
    /// `resonance` is ignored by the first-order and shelving shapes, `gain`
    /// (linear) only applies to the shelves.
    pub fn matched(
        filter_type: MatchedType,
        sample_rate: f64,
        cutoff_hz: f64,
        resonance: f64,
        gain: f64,
    ) -> Self {
        debug_assert!(sample_rate > 0.0);
        debug_assert!(cutoff_hz > 0.0 && cutoff_hz < sample_rate * 0.5);
        debug_assert!(resonance > 0.0);

        let f0 = cutoff_hz / (sample_rate * 0.5);
        let freq2 = f0 * f0;

        match filter_type {
            MatchedType::Lowpass | MatchedType::Highpass | MatchedType::Bandpass => {
                let w0 = 2.0 * PI * cutoff_hz / sample_rate;
                let q = 1.0 / (2.0 * resonance);
                let tmp = (-q * w0).exp();

                let a1 = if q <= 1.0 {
                    -2.0 * tmp * ((1.0 - q * q).sqrt() * w0).cos()
                } else {
                    -2.0 * tmp * ((q * q - 1.0).sqrt() * w0).cosh()
                };
                let a2 = tmp * tmp;

                let fac = (1.0 - freq2) * (1.0 - freq2);
                let denom = (fac + freq2 / (resonance * resonance)).sqrt();

                let (b0, b1, b2) = match filter_type {
                    MatchedType::Lowpass => {
                        let r0 = 1.0 + a1 + a2;
                        let r1 = (1.0 - a1 + a2) * freq2 / denom;
                        let b0 = (r0 + r1) / 2.0;
                        (b0, r0 - b0, 0.0)
                    }
                    MatchedType::Highpass => {
                        let r1 = (1.0 - a1 + a2) / denom;
                        let b0 = r1 / 4.0;
                        (b0, -2.0 * b0, b0)
                    }
                    _ => {
                        let r0 = (1.0 + a1 + a2) / (PI * f0 * resonance);
                        let r1 = (1.0 - a1 + a2) * (f0 / resonance) / denom;
                        let b1 = -r1 / 2.0;
                        let b0 = (r0 - b1) / 2.0;
                        (b0, b1, -b0 - b1)
                    }
                };

                Self::new(&[b0, b1, b2], &[1.0, a1, a2])
            }

            MatchedType::FirstOrderLowpass => {
                let fc = cutoff_hz / sample_rate;
                let a1 = -(-2.0 * PI * fc).exp();
                let gain_nyquist = (fc * fc / (0.25 + fc * fc)).sqrt();
                let b0 = 0.5 * (gain_nyquist * (1.0 - a1) + 1.0 + a1);
                Self::new(&[b0, 1.0 + a1 - b0], &[1.0, a1])
            }

            MatchedType::FirstOrderHighpass => {
                let fc = cutoff_hz / sample_rate;
                let a1 = -(-2.0 * PI * fc).exp();
                let gain_nyquist = (0.25 / (0.25 + fc * fc)).sqrt();
                let b0 = 0.5 * gain_nyquist * (1.0 - a1);
                Self::new(&[b0, -b0], &[1.0, a1])
            }

            MatchedType::HighShelf => {
                let (a1, b) = shelf_poles(gain, freq2);
                let b0 = (1.0 + a1) / (1.0 + b);
                Self::new(&[b0, b * b0], &[1.0, a1])
            }

            MatchedType::LowShelf => {
                let (a1, b) = shelf_poles(1.0 / gain, freq2);
                let b0 = gain * (1.0 + a1) / (1.0 + b);
                Self::new(&[b0, b * b0], &[1.0, a1])
            }
        }
    }

    pub fn lowpass(sample_rate: f64, cutoff_hz: f64, resonance: f64) -> Self {
        Self::matched(MatchedType::Lowpass, sample_rate, cutoff_hz, resonance, 1.0)
    }

    pub fn highpass(sample_rate: f64, cutoff_hz: f64, resonance: f64) -> Self {
        Self::matched(MatchedType::Highpass, sample_rate, cutoff_hz, resonance, 1.0)
    }

    pub fn bandpass(sample_rate: f64, cutoff_hz: f64, resonance: f64) -> Self {
        Self::matched(MatchedType::Bandpass, sample_rate, cutoff_hz, resonance, 1.0)
    }

    pub fn first_order_lowpass(sample_rate: f64, cutoff_hz: f64) -> Self {
        Self::matched(MatchedType::FirstOrderLowpass, sample_rate, cutoff_hz, 1.0, 1.0)
    }

    pub fn first_order_highpass(sample_rate: f64, cutoff_hz: f64) -> Self {
        Self::matched(MatchedType::FirstOrderHighpass, sample_rate, cutoff_hz, 1.0, 1.0)
    }

    pub fn low_shelf(sample_rate: f64, cutoff_hz: f64, gain: f64) -> Self {
        Self::matched(MatchedType::LowShelf, sample_rate, cutoff_hz, 1.0, gain)
    }

    pub fn high_shelf(sample_rate: f64, cutoff_hz: f64, gain: f64) -> Self {
        Self::matched(MatchedType::HighShelf, sample_rate, cutoff_hz, 1.0, gain)
    }

    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    /// `[b0..bN, a1..aN]`
    #[inline]
    pub fn raw(&self) -> &[f64] {
        &self.raw
    }

    pub fn b(&self) -> &[f64] {
        &self.raw[..=self.order]
    }

    /// Denominator without the implicit leading 1.
    pub fn a(&self) -> &[f64] {
        &self.raw[self.order + 1..]
    }

    /// Magnitude response at `frequency` Hz.
    pub fn magnitude_at(&self, frequency: f64, sample_rate: f64) -> f64 {
        let w = 2.0 * PI * frequency / sample_rate;

        let eval = |taps: &[f64], leading: f64, offset: usize| {
            let (mut re, mut im) = (leading, 0.0);
            for (k, &c) in taps.iter().enumerate() {
                let phase = w * (k + offset) as f64;
                re += c * phase.cos();
                im -= c * phase.sin();
            }
            (re * re + im * im).sqrt()
        };

        eval(self.b(), 0.0, 0) / eval(self.a(), 1.0, 1)
    }
}

/// Pole and zero coefficients of a first-order matched shelf.
fn shelf_poles(gain: f64, freq2: f64) -> (f64, f64) {
    let pi_sqr_2 = 2.0 / (PI * PI);
    let alpha = pi_sqr_2 * (1.0 + 1.0 / (gain * freq2)) - 0.5;
    let beta = pi_sqr_2 * (1.0 + gain / freq2) - 0.5;

    let a1 = -alpha / (1.0 + alpha + (1.0 + 2.0 * alpha).sqrt());
    let b = -beta / (1.0 + beta + (1.0 + 2.0 * beta).sqrt());
    (a1, b)
}

/// Direct-form filter driven by shared coefficients.
#[derive(Debug, Clone)]
pub struct IirFilter<T: Sample> {
    coefficients: Arc<Coefficients>,
    order: usize,
    num_channels: usize,
    // `order + 1` slots per channel; the last slot stays zero.
    state: Vec<T>,
}

impl<T: Sample> IirFilter<T> {
    pub fn new(coefficients: Arc<Coefficients>) -> Self {
        let order = coefficients.order();
        Self {
            coefficients,
            order,
            num_channels: 1,
            state: vec![T::zero(); order + 1],
        }
    }

    pub fn coefficients(&self) -> &Arc<Coefficients> {
        &self.coefficients
    }

    /// Install a new coefficient set and return the previous one.
    ///
    /// Swapping to a set of the same order keeps the filter state and never
    /// allocates. A different order resizes and clears the state.
    pub fn set_coefficients(&mut self, coefficients: Arc<Coefficients>) -> Arc<Coefficients> {
        let old = std::mem::replace(&mut self.coefficients, coefficients);

        if self.coefficients.order() != self.order {
            self.order = self.coefficients.order();
            self.state = vec![T::zero(); self.num_channels * (self.order + 1)];
        }

        old
    }

    pub fn num_channels(&self) -> usize {
        self.num_channels
    }

    #[inline]
    fn state_range(&self, channel: usize) -> std::ops::Range<usize> {
        assert!(
            channel < self.num_channels,
            "channel {channel} out of range ({} prepared)",
            self.num_channels
        );
        let stride = self.order + 1;
        channel * stride..(channel + 1) * stride
    }

    /// Filter one sample on `channel`.
    #[inline]
    pub fn process_sample(&mut self, channel: usize, input: T) -> T {
        let order = self.order;
        let range = self.state_range(channel);
        let c = self.coefficients.raw();
        let state = &mut self.state[range];

        let output = input * T::splat(c[0]) + state[0];

        for j in 0..order - 1 {
            state[j] = input * T::splat(c[j + 1]) - output * T::splat(c[order + j + 1]) + state[j + 1];
        }
        state[order - 1] = input * T::splat(c[order]) - output * T::splat(c[order * 2]);

        output
    }

    /// Filter one channel slice in place.
    pub fn process_channel(&mut self, channel: usize, samples: &mut [T]) {
        let order = self.order;
        let range = self.state_range(channel);
        let c = self.coefficients.raw();
        let state = &mut self.state[range];

        match order {
            1 => {
                let (b0, b1, a1) = (T::splat(c[0]), T::splat(c[1]), T::splat(c[2]));
                let mut lv1 = state[0];

                for sample in samples.iter_mut() {
                    let input = *sample;
                    let output = input * b0 + lv1;
                    *sample = output;

                    lv1 = input * b1 - output * a1;
                }

                state[0] = lv1;
            }

            2 => {
                let (b0, b1, b2) = (T::splat(c[0]), T::splat(c[1]), T::splat(c[2]));
                let (a1, a2) = (T::splat(c[3]), T::splat(c[4]));
                let (mut lv1, mut lv2) = (state[0], state[1]);

                for sample in samples.iter_mut() {
                    let input = *sample;
                    let output = input * b0 + lv1;
                    *sample = output;

                    lv1 = input * b1 - output * a1 + lv2;
                    lv2 = input * b2 - output * a2;
                }

                state[0] = lv1;
                state[1] = lv2;
            }

            3 => {
                let (b0, b1, b2, b3) = (T::splat(c[0]), T::splat(c[1]), T::splat(c[2]), T::splat(c[3]));
                let (a1, a2, a3) = (T::splat(c[4]), T::splat(c[5]), T::splat(c[6]));
                let (mut lv1, mut lv2, mut lv3) = (state[0], state[1], state[2]);

                for sample in samples.iter_mut() {
                    let input = *sample;
                    let output = input * b0 + lv1;
                    *sample = output;

                    lv1 = input * b1 - output * a1 + lv2;
                    lv2 = input * b2 - output * a2 + lv3;
                    lv3 = input * b3 - output * a3;
                }

                state[0] = lv1;
                state[1] = lv2;
                state[2] = lv3;
            }

            _ => {
                for sample in samples.iter_mut() {
                    let input = *sample;
                    let output = input * T::splat(c[0]) + state[0];
                    *sample = output;

                    for j in 0..order - 1 {
                        state[j] = input * T::splat(c[j + 1]) - output * T::splat(c[order + j + 1])
                            + state[j + 1];
                    }
                    state[order - 1] = input * T::splat(c[order]) - output * T::splat(c[order * 2]);
                }
            }
        }
    }
}

impl<T: Sample> Processor<T> for IirFilter<T> {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.num_channels = spec.num_channels;
        self.state = vec![T::zero(); spec.num_channels * (self.order + 1)];

        log::debug!(
            "iir filter prepared: order {} x {} ch",
            self.order,
            spec.num_channels
        );
    }

    fn reset(&mut self) {
        self.state.fill(T::zero());
    }

    fn process_block(&mut self, block: &mut SampleBuffer<T>) {
        assert!(
            block.num_channels() <= self.num_channels,
            "block has more channels than prepared state"
        );

        for (ch, samples) in block.channels_mut().enumerate() {
            self.process_channel(ch, samples);
        }
    }
}
