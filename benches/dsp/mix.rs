//! Benchmarks for signal mixing operations.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use strix_dsp::{
    dsp::{mix, mix::DryWetMixer, stereo::StereoWidth},
    ProcessSpec,
};

use super::test_block;
use crate::BLOCK_SIZES;

pub fn bench_mix(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/mix");

    for &size in BLOCK_SIZES {
        let block = test_block(size);
        let signal_a = block.read_channel(0).to_vec();
        let signal_b = block.read_channel(1).to_vec();
        let mut output = vec![0.0f32; size];

        // Linear crossfade into a separate output
        group.bench_with_input(BenchmarkId::new("crossfade", size), &size, |b, _| {
            b.iter(|| {
                mix::mix(
                    black_box(&signal_a),
                    black_box(&signal_b),
                    black_box(0.5),
                    black_box(&mut output),
                );
            })
        });

        // Dry/wet in place
        let mut wet = signal_b.clone();
        group.bench_with_input(BenchmarkId::new("dry_wet", size), &size, |b, _| {
            b.iter(|| {
                wet.copy_from_slice(&signal_b);
                mix::mix_in_place(black_box(&signal_a), black_box(&mut wet), black_box(0.3));
            })
        });

        // Ramped mixer with the dry copy
        let spec = ProcessSpec::stereo(48_000.0, size).unwrap();
        let mut mixer = DryWetMixer::<f32>::new(0.01);
        mixer.prepare(&spec);
        let mut buffer = block.clone();
        let mut toggle = false;
        group.bench_with_input(BenchmarkId::new("dry_wet_mixer", size), &size, |b, _| {
            b.iter(|| {
                toggle = !toggle;
                mixer.set_wet_mix(if toggle { 0.25 } else { 0.75 });
                buffer.make_copy_of(&block);
                mixer.push_dry(&buffer);
                mixer.mix_wet(black_box(&mut buffer));
            })
        });

        // Stereo width with a moving target
        let mut width = StereoWidth::new();
        group.bench_with_input(BenchmarkId::new("width", size), &size, |b, _| {
            b.iter(|| {
                toggle = !toggle;
                buffer.make_copy_of(&block);
                width.process(black_box(&mut buffer), if toggle { 0.5 } else { 1.5 }, false);
            })
        });
    }

    group.finish();
}
