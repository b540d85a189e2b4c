//! Benchmarks for the state-variable filter.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use strix_dsp::{
    dsp::{FilterType, Processor, SampleBuffer, SvtFilter},
    ProcessSpec,
};
use wide::f64x4;

use super::test_block;
use crate::BLOCK_SIZES;

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    for &size in BLOCK_SIZES {
        let spec = ProcessSpec::stereo(48_000.0, size).unwrap();
        let input = test_block(size);
        let mut buffer = input.clone();

        for (name, filter_type) in [
            ("lowpass", FilterType::Lowpass),
            ("highpass", FilterType::Highpass),
            ("bandpass", FilterType::Bandpass),
            ("notch", FilterType::Notch),
        ] {
            let mut filter = SvtFilter::<f32>::new(filter_type);
            filter.prepare(&spec);
            filter.set_cutoff(1000.0);
            filter.set_resonance(0.5);

            group.bench_with_input(BenchmarkId::new(name, size), &size, |b, _| {
                b.iter(|| {
                    buffer.make_copy_of(&input);
                    filter.process_block(black_box(&mut buffer));
                })
            });
        }

        // Per-sample smoothing path with the cutoff moving every block
        let mut filter = SvtFilter::<f32>::lowpass(1000.0).with_smoothing();
        filter.prepare(&spec);
        let mut toggle = false;
        group.bench_with_input(BenchmarkId::new("lowpass_smoothed", size), &size, |b, _| {
            b.iter(|| {
                toggle = !toggle;
                filter.set_cutoff(if toggle { 800.0 } else { 1200.0 });
                buffer.make_copy_of(&input);
                filter.process_block(black_box(&mut buffer));
            })
        });

        // Four lanes per sample
        let mut filter = SvtFilter::<f64x4>::lowpass(1000.0);
        filter.prepare(&spec);
        let mut lanes = SampleBuffer::<f64x4>::new(2, size);
        group.bench_with_input(BenchmarkId::new("lowpass_f64x4", size), &size, |b, _| {
            b.iter(|| {
                for (i, s) in lanes.write_channel(0).iter_mut().enumerate() {
                    *s = f64x4::splat(input.read_channel(0)[i] as f64);
                }
                filter.process_block(black_box(&mut lanes));
            })
        });
    }

    group.finish();
}
