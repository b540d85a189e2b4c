//! Control-rate parameter ramps.

/*
Parameter Smoothing
===================

Jumping a cutoff from 200 Hz to 5 kHz between two samples produces an audible
click ("zipper noise"). A smoother spreads the change across a short ramp,
typically 10 ms, so the processor sees a continuous sequence of values.

Two ramp shapes are offered:

  Linear          value moves by a constant step each sample
                    step = (target - current) / ramp_samples
                  Right for quantities heard linearly (resonance, gain).

  Multiplicative  value is multiplied by a constant factor each sample
                    factor = exp((ln(target) - ln(current)) / ramp_samples)
                  Right for frequencies, which are heard logarithmically.
                  Both endpoints must be positive.

In both cases the final step lands exactly on the target so floating point
drift never leaves the smoother "almost done".
*/

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SmoothingKind {
    #[default]
    Linear,
    Multiplicative,
}

#[derive(Debug, Clone)]
pub struct SmoothedValue {
    kind: SmoothingKind,
    current: f64,
    target: f64,
    step: f64,
    countdown: usize,
    ramp_samples: usize,
}

impl SmoothedValue {
    pub fn new(kind: SmoothingKind, initial: f64) -> Self {
        Self {
            kind,
            current: initial,
            target: initial,
            step: 0.0,
            countdown: 0,
            ramp_samples: 0,
        }
    }

    pub fn linear(initial: f64) -> Self {
        Self::new(SmoothingKind::Linear, initial)
    }

    pub fn multiplicative(initial: f64) -> Self {
        Self::new(SmoothingKind::Multiplicative, initial)
    }

    /// Set the ramp length and snap to the target.
    pub fn reset(&mut self, sample_rate: f64, ramp_seconds: f64) {
        self.ramp_samples = (sample_rate * ramp_seconds).floor().max(0.0) as usize;
        self.set_current_and_target(self.target);
    }

    /// Jump straight to `value` with no ramp.
    pub fn set_current_and_target(&mut self, value: f64) {
        self.current = value;
        self.target = value;
        self.countdown = 0;
    }

    /// Start a ramp from the current value towards `value`.
    pub fn set_target(&mut self, value: f64) {
        if value == self.target {
            return;
        }

        if self.ramp_samples == 0 {
            self.set_current_and_target(value);
            return;
        }

        self.target = value;
        self.countdown = self.ramp_samples;
        self.step = match self.kind {
            SmoothingKind::Linear => (self.target - self.current) / self.countdown as f64,
            SmoothingKind::Multiplicative => {
                debug_assert!(self.current > 0.0 && self.target > 0.0);
                ((self.target.ln() - self.current.ln()) / self.countdown as f64).exp()
            }
        };
    }

    /// Advance one sample and return the new value.
    #[inline]
    pub fn next_value(&mut self) -> f64 {
        if self.countdown == 0 {
            return self.target;
        }

        self.countdown -= 1;
        if self.countdown == 0 {
            self.current = self.target;
        } else {
            match self.kind {
                SmoothingKind::Linear => self.current += self.step,
                SmoothingKind::Multiplicative => self.current *= self.step,
            }
        }
        self.current
    }

    /// Advance `samples` steps at once and return the value reached.
    pub fn skip(&mut self, samples: usize) -> f64 {
        if samples >= self.countdown {
            self.set_current_and_target(self.target);
            return self.target;
        }

        match self.kind {
            SmoothingKind::Linear => self.current += self.step * samples as f64,
            SmoothingKind::Multiplicative => self.current *= self.step.powi(samples as i32),
        }
        self.countdown -= samples;
        self.current
    }

    #[inline]
    pub fn is_smoothing(&self) -> bool {
        self.countdown > 0
    }

    #[inline]
    pub fn current(&self) -> f64 {
        self.current
    }

    #[inline]
    pub fn target(&self) -> f64 {
        self.target
    }
}
