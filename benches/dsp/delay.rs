//! Benchmarks for delay line operations.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use strix_dsp::{
    dsp::{DelayLine, Processor},
    ProcessSpec,
};

use super::test_block;
use crate::BLOCK_SIZES;

pub fn bench_delay(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/delay");

    // Delay times in samples
    let delay_times: &[f64] = &[
        480.0,   // 10ms at 48kHz
        4800.0,  // 100ms at 48kHz
        48000.0, // 1 second at 48kHz
    ];

    for &size in BLOCK_SIZES {
        let spec = ProcessSpec::stereo(48_000.0, size).unwrap();
        let input = test_block(size);
        let mut buffer = input.clone();

        for &delay_samples in delay_times {
            let mut delay = DelayLine::<f32>::new(48_000);
            delay.prepare(&spec);
            delay.set_delay(delay_samples);

            group.bench_with_input(
                BenchmarkId::new(format!("block_{}ms", (delay_samples / 48.0) as u32), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        buffer.make_copy_of(&input);
                        delay.process_block(black_box(&mut buffer));
                    })
                },
            );
        }

        // Modulated fractional read, chorus-like
        let mut delay = DelayLine::<f32>::new(1024);
        delay.prepare(&spec);
        group.bench_with_input(BenchmarkId::new("read_modulated", size), &size, |b, _| {
            b.iter(|| {
                let mut sum = 0.0f32;
                for (i, &x) in input.read_channel(0).iter().enumerate() {
                    delay.push_sample(0, x);
                    let delay_time = 480.0 + (i as f64 * 0.1).sin() * 48.0;
                    sum += delay.pop_sample(0, Some(black_box(delay_time)), true);
                }
                sum
            })
        });
    }

    group.finish();
}
