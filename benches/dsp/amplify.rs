//! Benchmarks for gain primitives.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use strix_dsp::dsp::amplify;

use super::test_block;
use crate::BLOCK_SIZES;

pub fn bench_amplify(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/amplify");

    for &size in BLOCK_SIZES {
        let block = test_block(size);
        let signal = block.read_channel(0).to_vec();

        let mut signal_copy = signal.clone();
        group.bench_with_input(BenchmarkId::new("apply_gain", size), &size, |b, _| {
            b.iter(|| {
                signal_copy.copy_from_slice(&signal);
                amplify::apply_gain(black_box(&mut signal_copy), black_box(0.5))
            })
        });

        // Ramp between two targets every iteration
        let mut last_gain = 1.0;
        let mut toggle = false;
        group.bench_with_input(BenchmarkId::new("smooth_gain", size), &size, |b, _| {
            b.iter(|| {
                toggle = !toggle;
                signal_copy.copy_from_slice(&signal);
                amplify::apply_smooth_gain(
                    black_box(&mut signal_copy),
                    if toggle { 0.25 } else { 1.0 },
                    &mut last_gain,
                    true,
                )
            })
        });

        let mut buffer = block.clone();
        let mut last_gain = 1.0;
        group.bench_with_input(BenchmarkId::new("smooth_gain_buffer", size), &size, |b, _| {
            b.iter(|| {
                toggle = !toggle;
                buffer.make_copy_of(&block);
                amplify::apply_smooth_gain_buffer(
                    black_box(&mut buffer),
                    if toggle { 0.25 } else { 1.0 },
                    &mut last_gain,
                    true,
                )
            })
        });
    }

    group.finish();
}
