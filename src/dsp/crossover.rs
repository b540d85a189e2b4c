//! Linkwitz-Riley band splitting.

/*
Linkwitz-Riley Crossover
========================

A crossover splits a signal into a low band and a high band. Multiband
effects process each band separately and sum them back together, so the
split must be inaudible when nothing is done to the bands.

A 4th-order Linkwitz-Riley (LR4) split is two identical 2nd-order
Butterworth sections in series (R2 = √2, i.e. Q = 1/√2):

    low  = LP(LP(x))
    high = HP(HP(x))

Both branches are −6 dB at the cutoff and, crucially, are in phase with
each other at every frequency. Their sum is not the input itself but an
allpass version of it:

    low + high = AP(x)        |AP| = 1 everywhere

so the recombined signal has a flat magnitude response.

Both Bands From One Pass
------------------------

`process_sample_split` computes the first stage once and reuses it:

    (yH, yB, yL) = stage1(x)
    allpass      = yL − R2·yB + yH
    low          = stage2_lowpass(yL)
    high         = allpass − low

which is cheaper than running two full cascades and makes low + high equal to
the allpass output by construction.
*/

use std::f64::consts::{PI, SQRT_2};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    config::ProcessSpec,
    dsp::{
        buffer::SampleBuffer,
        processor::{ProcessContext, Processor},
        sample::Sample,
    },
};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CrossoverType {
    #[default]
    Lowpass,
    Highpass,
    Allpass,
}

/// Per-channel integrator memories for both cascaded stages.
#[derive(Debug, Clone, Copy, Default)]
struct StageState<T> {
    s1: T,
    s2: T,
    s3: T,
    s4: T,
}

#[derive(Debug, Clone)]
pub struct LinkwitzRiley<T: Sample> {
    sample_rate: f64,
    cutoff_hz: f64,
    crossover_type: CrossoverType,

    g: T,
    r2: T,
    h: T,

    state: Vec<StageState<T>>,
}

impl<T: Sample> Default for LinkwitzRiley<T> {
    fn default() -> Self {
        Self::new(CrossoverType::Lowpass)
    }
}

impl<T: Sample> LinkwitzRiley<T> {
    pub fn new(crossover_type: CrossoverType) -> Self {
        let mut filter = Self {
            sample_rate: 44_100.0,
            cutoff_hz: 2_000.0,
            crossover_type,
            g: T::zero(),
            r2: T::zero(),
            h: T::zero(),
            state: Vec::new(),
        };
        filter.update();
        filter
    }

    pub fn set_type(&mut self, crossover_type: CrossoverType) {
        self.crossover_type = crossover_type;
    }

    pub fn crossover_type(&self) -> CrossoverType {
        self.crossover_type
    }

    /// Set the split frequency.
    ///
    /// Must lie strictly between 0 and Nyquist. Out-of-range values trip a
    /// debug assertion once prepared, and are clamped just inside that range
    /// at whatever sample rate is current. The requested value is kept, so a
    /// cutoff set before `prepare` is judged against the prepared rate.
    pub fn set_cutoff(&mut self, cutoff_hz: f64) {
        debug_assert!(cutoff_hz > 0.0, "crossover cutoff {cutoff_hz} must be positive");
        debug_assert!(
            self.state.is_empty() || cutoff_hz < self.sample_rate * 0.5,
            "crossover cutoff {cutoff_hz} above Nyquist at {} Hz",
            self.sample_rate
        );

        self.cutoff_hz = cutoff_hz;
        self.update();
    }

    /// Cutoff in effect at the current sample rate.
    pub fn cutoff(&self) -> f64 {
        self.cutoff_hz.clamp(1.0e-3, self.sample_rate * 0.5 * 0.999)
    }

    fn update(&mut self) {
        let g = (PI * self.cutoff() / self.sample_rate).tan();
        let r2 = SQRT_2;
        let h = 1.0 / (1.0 + r2 * g + g * g);

        self.g = T::splat(g);
        self.r2 = T::splat(r2);
        self.h = T::splat(h);
    }

    /// First TPT stage: returns (yH, yB, yL).
    #[inline]
    fn first_stage(&mut self, channel: usize, x: T) -> (T, T, T) {
        let (g, r2, h) = (self.g, self.r2, self.h);
        let st = &mut self.state[channel];

        let yh = (x - (r2 + g) * st.s1 - st.s2) * h;

        let yb = g * yh + st.s1;
        st.s1 = g * yh + yb;

        let yl = g * yb + st.s2;
        st.s2 = g * yb + yl;

        (yh, yb, yl)
    }

    /// Second TPT stage: returns (yH2, yL2).
    #[inline]
    fn second_stage(&mut self, channel: usize, x: T) -> (T, T) {
        let (g, r2, h) = (self.g, self.r2, self.h);
        let st = &mut self.state[channel];

        let yh = (x - (r2 + g) * st.s3 - st.s4) * h;

        let yb = g * yh + st.s3;
        st.s3 = g * yh + yb;

        let yl = g * yb + st.s4;
        st.s4 = g * yb + yl;

        (yh, yl)
    }

    /// Filter one sample with the selected branch.
    #[inline]
    pub fn process_sample(&mut self, channel: usize, input: T) -> T {
        let (yh, yb, yl) = self.first_stage(channel, input);

        match self.crossover_type {
            CrossoverType::Allpass => yl - self.r2 * yb + yh,
            CrossoverType::Lowpass => self.second_stage(channel, yl).1,
            CrossoverType::Highpass => self.second_stage(channel, yh).0,
        }
    }

    /// Split one sample into `(low, high)` bands that sum to the allpass
    /// response.
    #[inline]
    pub fn process_sample_split(&mut self, channel: usize, input: T) -> (T, T) {
        let (yh, yb, yl) = self.first_stage(channel, input);
        let (_, low) = self.second_stage(channel, yl);

        let allpass = yl - self.r2 * yb + yh;
        (low, allpass - low)
    }

    /// Split a whole block into separate low and high outputs.
    ///
    /// # Panics
    /// Panics if the three blocks differ in shape or exceed the prepared
    /// channel count.
    pub fn process_split(
        &mut self,
        input: &SampleBuffer<T>,
        low: &mut SampleBuffer<T>,
        high: &mut SampleBuffer<T>,
    ) {
        let num_channels = input.num_channels();
        assert!(num_channels <= self.state.len(), "block has more channels than prepared state");
        assert_eq!(low.num_channels(), num_channels);
        assert_eq!(high.num_channels(), num_channels);
        assert_eq!(low.num_samples(), input.num_samples());
        assert_eq!(high.num_samples(), input.num_samples());

        for ch in 0..num_channels {
            let src = input.read_channel(ch);
            let lo = low.write_channel(ch);
            let hi = high.write_channel(ch);

            for ((&x, l), h) in src.iter().zip(lo.iter_mut()).zip(hi.iter_mut()) {
                (*l, *h) = self.process_sample_split(ch, x);
            }
        }
    }
}

impl<T: Sample> Processor<T> for LinkwitzRiley<T> {
    fn prepare(&mut self, spec: &ProcessSpec) {
        debug_assert!(spec.sample_rate > 0.0);
        debug_assert!(spec.num_channels > 0);

        self.sample_rate = spec.sample_rate;
        self.update();

        self.state.resize(spec.num_channels, StageState::default());
        self.reset();

        log::debug!(
            "linkwitz-riley prepared: {} ch @ {} Hz, cutoff {} Hz",
            spec.num_channels,
            spec.sample_rate,
            self.cutoff()
        );
    }

    fn reset(&mut self) {
        self.state.fill(StageState::default());
    }

    fn process_block(&mut self, block: &mut SampleBuffer<T>) {
        assert!(
            block.num_channels() <= self.state.len(),
            "block has more channels than prepared state"
        );

        for (ch, samples) in block.channels_mut().enumerate() {
            for sample in samples.iter_mut() {
                *sample = self.process_sample(ch, *sample);
            }
        }
    }

    fn process(&mut self, context: ProcessContext<'_, T>) {
        let ProcessContext {
            input,
            output,
            bypassed,
        } = context;

        if bypassed {
            output.make_copy_of(input);
            return;
        }

        assert!(
            input.num_channels() <= self.state.len(),
            "block has more channels than prepared state"
        );

        for ch in 0..output.num_channels() {
            let src = input.read_channel(ch);
            let dst = output.write_channel(ch);
            for (d, &x) in dst.iter_mut().zip(src) {
                *d = self.process_sample(ch, x);
            }
        }
    }
}
