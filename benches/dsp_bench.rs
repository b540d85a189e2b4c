//! Benchmarks for the processing primitives.
//!
//! Run with: cargo bench
//!
//! These benchmarks measure the cost of each processor per block to make sure
//! they stay well within real-time audio deadlines.
//!
//! Reference timing at 48kHz sample rate:
//!   - 64 samples  = 1.33ms deadline
//!   - 128 samples = 2.67ms deadline
//!   - 256 samples = 5.33ms deadline
//!   - 512 samples = 10.67ms deadline
//!
//! Benchmark groups:
//!   - dsp/*        Per-block processors (filter, crossover, iir, delay, etc.)

use criterion::{criterion_group, criterion_main};

mod dsp;

/// Common buffer sizes used in audio applications.
pub const BLOCK_SIZES: &[usize] = &[64, 128, 256, 512];

criterion_group!(
    benches,
    dsp::bench_amplify,
    dsp::bench_filter,
    dsp::bench_crossover,
    dsp::bench_iir,
    dsp::bench_delay,
    dsp::bench_mix,
);
criterion_main!(benches);
