//! Benchmarks for the Linkwitz-Riley crossover.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use strix_dsp::{
    dsp::{CrossoverType, LinkwitzRiley, Processor, SampleBuffer},
    ProcessSpec,
};

use super::test_block;
use crate::BLOCK_SIZES;

pub fn bench_crossover(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/crossover");

    for &size in BLOCK_SIZES {
        let spec = ProcessSpec::stereo(48_000.0, size).unwrap();
        let input = test_block(size);

        let mut crossover = LinkwitzRiley::<f32>::new(CrossoverType::Lowpass);
        crossover.prepare(&spec);
        crossover.set_cutoff(1200.0);
        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("lowpass", size), &size, |b, _| {
            b.iter(|| {
                buffer.make_copy_of(&input);
                crossover.process_block(black_box(&mut buffer));
            })
        });

        // Both bands from one pass
        let mut low = SampleBuffer::<f32>::new(2, size);
        let mut high = SampleBuffer::<f32>::new(2, size);
        crossover.reset();
        group.bench_with_input(BenchmarkId::new("split", size), &size, |b, _| {
            b.iter(|| {
                crossover.process_split(black_box(&input), &mut low, &mut high);
            })
        });
    }

    group.finish();
}
