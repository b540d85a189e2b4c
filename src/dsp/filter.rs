//! Topology-preserving state-variable filter.

/*
TPT State-Variable Filter
=========================

A state-variable filter is two integrators in a feedback loop. Discretising
those integrators with the trapezoidal rule while keeping the loop structure
intact ("topology-preserving transform", TPT) gives a filter whose two state
values stay physically meaningful: they are the integrator outputs. Because
of that, cutoff and resonance may change every sample without the filter
blowing up or zippering, which is exactly where a direct-form biquad struggles.

Coefficients
------------

    g  = tan(π · fc / fs)          pre-warped integrator gain
    R2 = 1 / resonance             damping (2ζ)
    h  = 1 / (1 + R2·g + g²)       resolves the zero-delay feedback loop

Per Sample
----------

    yHP = h · (x − s1·(g + R2) − s2)
    yBP = g·yHP + s1        s1 ← g·yHP + yBP
    yLP = g·yBP + s2        s2 ← g·yBP + yLP

One State, Many Responses
-------------------------

Every response below is a linear combination of the same three taps plus the
input. They are views onto one state evolution, not separate filters.

| type                  | output          |
| --------------------- | --------------- |
| lowpass               | yLP             |
| highpass              | yHP             |
| bandpass              | yBP             |
| notch                 | yLP + yHP       |
| peak                  | yLP − yHP       |
| first-order lowpass   | yLP + yBP       |
| first-order highpass  | yHP + yBP       |
| allpass               | x − 2·R2·yBP    |

The weights are chosen once when the type (or R2) changes, so the per-sample
output is a fixed multiply-add with no branch on the filter type.

Smoothing
---------

With `with_smoothing`, cutoff ramps multiplicatively and resonance linearly.
While either ramp runs, coefficients are recomputed every sample.
*/

use std::f64::consts::{FRAC_1_SQRT_2, PI};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    config::{DspConfig, ProcessSpec, DEFAULT_SMOOTHING_SECONDS},
    dsp::{
        buffer::SampleBuffer,
        processor::Processor,
        sample::Sample,
        smoothing::SmoothedValue,
    },
};


#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FilterType {
    #[default]
    Lowpass,
    Bandpass,
    Highpass,
    Notch,
    Peak,
    FirstOrderLowpass,
    FirstOrderHighpass,
    Allpass,
}

/// Every tap the core produces for one input sample.
#[derive(Debug, Clone, Copy)]
pub struct FilterOutputs<T> {
    pub highpass: T,
    pub bandpass: T,
    pub lowpass: T,
}

/// Weights applied to (yHP, yBP, yLP, x) to form the selected response.
#[derive(Debug, Clone, Copy)]
struct OutputTap<T> {
    hp: T,
    bp: T,
    lp: T,
    dry: T,
}

impl<T: Sample> OutputTap<T> {
    fn for_type(filter_type: FilterType, r2: f64) -> Self {
        let (hp, bp, lp, dry) = match filter_type {
            FilterType::Lowpass => (0.0, 0.0, 1.0, 0.0),
            FilterType::Highpass => (1.0, 0.0, 0.0, 0.0),
            FilterType::Bandpass => (0.0, 1.0, 0.0, 0.0),
            FilterType::Notch => (1.0, 0.0, 1.0, 0.0),
            FilterType::Peak => (-1.0, 0.0, 1.0, 0.0),
            FilterType::FirstOrderLowpass => (0.0, 1.0, 1.0, 0.0),
            FilterType::FirstOrderHighpass => (1.0, 1.0, 0.0, 0.0),
            FilterType::Allpass => (0.0, -2.0 * r2, 0.0, 1.0),
        };

        Self {
            hp: T::splat(hp),
            bp: T::splat(bp),
            lp: T::splat(lp),
            dry: T::splat(dry),
        }
    }

    #[inline]
    fn apply(&self, out: &FilterOutputs<T>, x: T) -> T {
        self.hp * out.highpass + self.bp * out.bandpass + self.lp * out.lowpass + self.dry * x
    }
}

#[derive(Debug, Clone)]
struct ParamSmoothers {
    cutoff: SmoothedValue,
    resonance: SmoothedValue,
    ramp_seconds: f64,
}

#[derive(Debug, Clone)]
pub struct SvtFilter<T: Sample> {
    sample_rate: f64,
    cutoff_hz: f64,
    resonance: f64,
    gain: f64,
    filter_type: FilterType,

    g: T,
    h: T,
    r2: T,
    gain_t: T,
    tap: OutputTap<T>,

    s1: Vec<T>, // First integrator's memory, per channel
    s2: Vec<T>, // Second integrator's memory, per channel

    smoothers: Option<ParamSmoothers>,
}

impl<T: Sample> Default for SvtFilter<T> {
    fn default() -> Self {
        Self::new(FilterType::Lowpass)
    }
}

impl<T: Sample> SvtFilter<T> {
    pub fn new(filter_type: FilterType) -> Self {
        let mut filter = Self {
            sample_rate: 44_100.0,
            cutoff_hz: 1_000.0,
            resonance: FRAC_1_SQRT_2,
            gain: 1.0,
            filter_type,
            g: T::zero(),
            h: T::zero(),
            r2: T::zero(),
            gain_t: T::splat(1.0),
            tap: OutputTap::for_type(filter_type, 0.0),
            s1: vec![T::zero(); 2],
            s2: vec![T::zero(); 2],
            smoothers: None,
        };
        filter.update();
        filter
    }

    pub fn lowpass(cutoff_hz: f64) -> Self {
        let mut filter = Self::new(FilterType::Lowpass);
        filter.set_cutoff(cutoff_hz);
        filter
    }

    pub fn highpass(cutoff_hz: f64) -> Self {
        let mut filter = Self::new(FilterType::Highpass);
        filter.set_cutoff(cutoff_hz);
        filter
    }

    pub fn bandpass(cutoff_hz: f64) -> Self {
        let mut filter = Self::new(FilterType::Bandpass);
        filter.set_cutoff(cutoff_hz);
        filter
    }

    pub fn notch(cutoff_hz: f64) -> Self {
        let mut filter = Self::new(FilterType::Notch);
        filter.set_cutoff(cutoff_hz);
        filter
    }

    pub fn allpass(cutoff_hz: f64) -> Self {
        let mut filter = Self::new(FilterType::Allpass);
        filter.set_cutoff(cutoff_hz);
        filter
    }

    /// Ramp cutoff and resonance changes over 10 ms instead of applying them
    /// instantly.
    pub fn with_smoothing(self) -> Self {
        self.with_smoothing_time(DEFAULT_SMOOTHING_SECONDS)
    }

    /// Smoothing with the ramp length from `config`.
    pub fn with_config(self, config: &DspConfig) -> Self {
        self.with_smoothing_time(config.smoothing_seconds)
    }

    /// Like `with_smoothing` with a custom ramp length.
    pub fn with_smoothing_time(mut self, ramp_seconds: f64) -> Self {
        self.smoothers = Some(ParamSmoothers {
            cutoff: SmoothedValue::multiplicative(self.cutoff_hz),
            resonance: SmoothedValue::linear(self.resonance),
            ramp_seconds,
        });
        self
    }

    fn update(&mut self) {
        let g = (PI * self.cutoff_hz / self.sample_rate).tan();
        let r2 = 1.0 / self.resonance;
        let h = 1.0 / (1.0 + r2 * g + g * g);

        self.g = T::splat(g);
        self.r2 = T::splat(r2);
        self.h = T::splat(h);
        self.tap = OutputTap::for_type(self.filter_type, r2);
    }

    pub fn set_type(&mut self, filter_type: FilterType) {
        self.filter_type = filter_type;
        self.tap = OutputTap::for_type(filter_type, 1.0 / self.resonance);
    }

    pub fn set_cutoff(&mut self, cutoff_hz: f64) {
        match &mut self.smoothers {
            Some(sm) => {
                sm.cutoff.set_target(cutoff_hz);
                if !sm.cutoff.is_smoothing() {
                    self.cutoff_hz = cutoff_hz;
                }
            }
            None => self.cutoff_hz = cutoff_hz,
        }
        self.update();
    }

    pub fn set_resonance(&mut self, resonance: f64) {
        debug_assert!(resonance > 0.0, "resonance must be positive");
        match &mut self.smoothers {
            Some(sm) => {
                sm.resonance.set_target(resonance);
                if !sm.resonance.is_smoothing() {
                    self.resonance = resonance;
                }
            }
            None => self.resonance = resonance,
        }
        self.update();
    }

    /// Linear gain applied to the input before filtering.
    pub fn set_gain(&mut self, gain: f64) {
        self.gain = gain;
        self.gain_t = T::splat(gain);
    }

    pub fn filter_type(&self) -> FilterType {
        self.filter_type
    }

    /// Target cutoff in Hz (the ramp destination when smoothing).
    pub fn cutoff(&self) -> f64 {
        match &self.smoothers {
            Some(sm) => sm.cutoff.target(),
            None => self.cutoff_hz,
        }
    }

    pub fn resonance(&self) -> f64 {
        match &self.smoothers {
            Some(sm) => sm.resonance.target(),
            None => self.resonance,
        }
    }

    pub fn gain(&self) -> f64 {
        self.gain
    }

    pub fn num_channels(&self) -> usize {
        self.s1.len()
    }

    fn is_smoothing(&self) -> bool {
        self.smoothers
            .as_ref()
            .is_some_and(|sm| sm.cutoff.is_smoothing() || sm.resonance.is_smoothing())
    }

    fn advance_smoothers(&mut self) {
        if let Some(sm) = &mut self.smoothers {
            self.cutoff_hz = sm.cutoff.next_value();
            self.resonance = sm.resonance.next_value();
        }
        self.update();
    }

    /// Run the two-integrator core and return every tap.
    #[inline]
    pub fn tick(&mut self, channel: usize, x: T) -> FilterOutputs<T> {
        let s1 = &mut self.s1[channel];
        let s2 = &mut self.s2[channel];
        let g = self.g;

        let highpass = self.h * (x - *s1 * (g + self.r2) - *s2);

        let bandpass = g * highpass + *s1;
        *s1 = g * highpass + bandpass;

        let lowpass = g * bandpass + *s2;
        *s2 = g * bandpass + lowpass;

        FilterOutputs {
            highpass,
            bandpass,
            lowpass,
        }
    }

    /// Filter one sample of one channel with the selected response.
    #[inline]
    pub fn process_sample(&mut self, channel: usize, input: T) -> T {
        let x = input * self.gain_t;
        let outputs = self.tick(channel, x);
        self.tap.apply(&outputs, x)
    }

    pub fn process_channel(&mut self, channel: usize, samples: &mut [T]) {
        for sample in samples.iter_mut() {
            *sample = self.process_sample(channel, *sample);
        }
    }
}

impl<T: Sample> Processor<T> for SvtFilter<T> {
    fn prepare(&mut self, spec: &ProcessSpec) {
        self.sample_rate = spec.sample_rate;

        self.s1.resize(spec.num_channels, T::zero());
        self.s2.resize(spec.num_channels, T::zero());

        if let Some(sm) = &mut self.smoothers {
            sm.cutoff.reset(spec.sample_rate, sm.ramp_seconds);
            sm.resonance.reset(spec.sample_rate, sm.ramp_seconds);
            sm.cutoff.set_current_and_target(self.cutoff_hz);
            sm.resonance.set_current_and_target(self.resonance);
        }

        self.reset();
        self.update();

        log::debug!(
            "svt filter prepared: {} ch @ {} Hz, {:?}",
            spec.num_channels,
            spec.sample_rate,
            self.filter_type
        );
    }

    fn reset(&mut self) {
        self.s1.fill(T::zero());
        self.s2.fill(T::zero());
    }

    fn process_block(&mut self, block: &mut SampleBuffer<T>) {
        let num_channels = block.num_channels();
        assert!(num_channels <= self.s1.len(), "block has more channels than prepared state");

        if self.is_smoothing() {
            for i in 0..block.num_samples() {
                self.advance_smoothers();
                for ch in 0..num_channels {
                    let sample = &mut block.write_channel(ch)[i];
                    *sample = self.process_sample(ch, *sample);
                }
            }
            return;
        }

        for (ch, samples) in block.channels_mut().enumerate() {
            self.process_channel(ch, samples);
        }
    }
}
