//! Benchmarks for per-block processors.

mod amplify;
mod crossover;
mod delay;
mod filter;
mod iir;
mod mix;

pub use amplify::bench_amplify;
pub use crossover::bench_crossover;
pub use delay::bench_delay;
pub use filter::bench_filter;
pub use iir::bench_iir;
pub use mix::bench_mix;

/// Deterministic stereo test block (sawtooth left, sine right).
pub fn test_block(size: usize) -> strix_dsp::dsp::SampleBuffer<f32> {
    let left: Vec<f32> = (0..size)
        .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
        .collect();
    let right: Vec<f32> = (0..size).map(|i| (i as f32 * 0.1).sin()).collect();
    strix_dsp::dsp::SampleBuffer::from_channels(&[&left[..], &right[..]])
}
