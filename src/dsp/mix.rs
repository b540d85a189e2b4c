//! Dry/wet crossfading.

/*
Dry/Wet Mixing
==============

An effect's output is usually a blend of the untouched input ("dry") and the
processed signal ("wet"):

    output = dry × (1 - mix) + wet × mix

      mix = 0.0  →  input only, effect inaudible
      mix = 0.5  →  equal blend
      mix = 1.0  →  effect only

The weights always sum to 1.0, so two full-scale signals never sum past
full scale.

Linear vs Equal-Power
---------------------

This is a LINEAR crossfade. With two uncorrelated signals the perceived
loudness dips slightly around mix = 0.5. Dry and wet paths of an insert
effect are strongly correlated (the wet path is a filtered or delayed copy of
the dry one), where a linear fade is the right choice: an equal-power fade
would bump correlated signals by up to +3 dB in the middle.

Capturing the Dry Signal
------------------------

Processors here run in place, so the dry signal is gone once the effect has
run. `DryWetMixer` solves this by copying the block before processing
(`push_dry`) and blending it back afterwards (`mix_wet`), with the mix amount
ramped so automation does not click.
*/

use crate::{
    config::{DspConfig, ProcessSpec},
    dsp::{
        buffer::SampleBuffer,
        sample::Sample,
        smoothing::SmoothedValue,
    },
};

/// Mix two signals using a linear crossfade.
///
/// output = (A × (1-balance)) + (B × balance)
#[inline]
pub fn mix<T: Sample>(a: &[T], b: &[T], balance: f64, out: &mut [T]) {
    debug_assert_eq!(a.len(), b.len());
    debug_assert_eq!(a.len(), out.len());

    let balance = balance.clamp(0.0, 1.0);
    let weight_a = T::splat(1.0 - balance);
    let weight_b = T::splat(balance);

    for ((&sa, &sb), o) in a.iter().zip(b.iter()).zip(out.iter_mut()) {
        *o = sa * weight_a + sb * weight_b;
    }
}

/// Blend `dry` into `wet` in place with wet proportion `mix`.
#[inline]
pub fn mix_in_place<T: Sample>(dry: &[T], wet: &mut [T], mix: f64) {
    debug_assert_eq!(dry.len(), wet.len());

    let mix = mix.clamp(0.0, 1.0);
    if mix >= 1.0 {
        return;
    }

    let dry_amount = T::splat(1.0 - mix);
    let wet_amount = T::splat(mix);
    for (w, &d) in wet.iter_mut().zip(dry.iter()) {
        *w = d * dry_amount + *w * wet_amount;
    }
}

/// Stateful dry/wet stage with a smoothed mix amount.
#[derive(Debug)]
pub struct DryWetMixer<T: Sample> {
    dry: SampleBuffer<T>,
    mix: SmoothedValue,
    ramp_seconds: f64,
}

impl<T: Sample> DryWetMixer<T> {
    pub fn new(ramp_seconds: f64) -> Self {
        Self {
            dry: SampleBuffer::default(),
            mix: SmoothedValue::linear(1.0),
            ramp_seconds,
        }
    }

    pub fn from_config(config: &DspConfig) -> Self {
        Self::new(config.smoothing_seconds)
    }

    /// Allocate the dry capture buffer. Not realtime-safe.
    pub fn prepare(&mut self, spec: &ProcessSpec) {
        self.dry.set_size(spec.num_channels, spec.maximum_block_size);
        self.mix.reset(spec.sample_rate, self.ramp_seconds);
    }

    /// Set the wet proportion (0.0 = dry only, 1.0 = wet only).
    pub fn set_wet_mix(&mut self, mix: f64) {
        self.mix.set_target(mix.clamp(0.0, 1.0));
    }

    pub fn wet_mix(&self) -> f64 {
        self.mix.target()
    }

    pub fn reset(&mut self) {
        self.mix.set_current_and_target(self.mix.target());
        self.dry.clear();
    }

    /// Capture the unprocessed block.
    ///
    /// # Panics
    /// Panics if the block is larger than the prepared size.
    pub fn push_dry(&mut self, block: &SampleBuffer<T>) {
        for ch in 0..block.num_channels() {
            self.dry.copy_from(ch, 0, block.read_channel(ch));
        }
    }

    /// Blend the captured dry block back into the processed block.
    pub fn mix_wet(&mut self, block: &mut SampleBuffer<T>) {
        let len = block.num_samples();

        if !self.mix.is_smoothing() {
            let mix = self.mix.target();
            for ch in 0..block.num_channels() {
                mix_in_place(&self.dry.read_channel(ch)[..len], block.write_channel(ch), mix);
            }
            return;
        }

        for i in 0..len {
            let mix = self.mix.next_value();
            let wet_amount = T::splat(mix);
            let dry_amount = T::splat(1.0 - mix);
            for ch in 0..block.num_channels() {
                let d = self.dry.read_channel(ch)[i];
                let w = &mut block.write_channel(ch)[i];
                *w = d * dry_amount + *w * wet_amount;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mix_all_a() {
        let a = [1.0f32, 0.5, -0.5, -1.0];
        let b = [0.0f32; 4];
        let mut out = [0.0; 4];

        mix(&a, &b, 0.0, &mut out);

        assert_eq!(out, a);
    }

    #[test]
    fn test_mix_equal() {
        let a = [1.0f64; 4];
        let b = [0.0f64; 4];
        let mut out = [0.0; 4];

        mix(&a, &b, 0.5, &mut out);

        assert_eq!(out, [0.5; 4]);
    }

    #[test]
    fn test_balance_clamped() {
        let a = [1.0f32];
        let b = [0.0f32];
        let mut out = [0.0; 1];

        mix(&a, &b, 2.0, &mut out);
        assert_eq!(out[0], 0.0);

        mix(&a, &b, -1.0, &mut out);
        assert_eq!(out[0], 1.0);
    }

    #[test]
    fn test_mix_in_place_all_dry() {
        let dry = [1.0f32, 0.5, -0.5, -1.0];
        let mut wet = [0.0f32; 4];

        mix_in_place(&dry, &mut wet, 0.0);

        assert_eq!(wet, dry);
    }

    #[test]
    fn test_mix_in_place_all_wet_untouched() {
        let dry = [0.0f32; 4];
        let mut wet = [1.0f32, 0.5, -0.5, -1.0];
        let original = wet;

        mix_in_place(&dry, &mut wet, 1.0);

        assert_eq!(wet, original);
    }

    #[test]
    fn test_mixer_blends_captured_dry() {
        let spec = ProcessSpec::new(48_000.0, 4, 1).unwrap();
        let mut mixer = DryWetMixer::<f32>::new(0.0);
        mixer.prepare(&spec);
        mixer.set_wet_mix(0.25);

        let mut block = SampleBuffer::<f32>::new(1, 4);
        block.write_channel(0).fill(1.0);
        mixer.push_dry(&block);

        // "Effect" silences the block.
        block.clear();
        mixer.mix_wet(&mut block);

        assert!(block.read_channel(0).iter().all(|&s| (s - 0.75).abs() < 1e-6));
    }

    #[test]
    fn test_mixer_ramps_mix_changes() {
        let spec = ProcessSpec::new(1_000.0, 4, 1).unwrap();
        let mut mixer = DryWetMixer::<f64>::new(0.004);
        mixer.prepare(&spec);
        mixer.set_wet_mix(0.0);

        let mut block = SampleBuffer::<f64>::new(1, 4);
        block.write_channel(0).fill(1.0);
        mixer.push_dry(&block);
        block.write_channel(0).fill(0.0);
        mixer.mix_wet(&mut block);

        let out = block.read_channel(0);
        assert!(out[0] > 0.0 && out[0] < out[1]);
        assert_eq!(out[3], 1.0);
    }
}
