//! Benchmarks for the transposed direct-form IIR.

use std::{hint::black_box, sync::Arc};

use criterion::{BenchmarkId, Criterion};
use strix_dsp::{
    dsp::{Coefficients, IirFilter, Processor},
    ProcessSpec,
};

use super::test_block;
use crate::BLOCK_SIZES;

pub fn bench_iir(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/iir");

    let second = Arc::new(Coefficients::lowpass(48_000.0, 1000.0, 0.707));
    let first = Arc::new(Coefficients::first_order_lowpass(48_000.0, 1000.0));

    // Two cascaded sections folded into one order-4 set take the generic loop
    let section = Coefficients::lowpass(48_000.0, 1000.0, 0.54);
    let mut a = vec![1.0];
    a.extend_from_slice(section.a());
    let fourth = Arc::new(Coefficients::new(
        &convolve(section.b(), section.b()),
        &convolve(&a, &a),
    ));

    for &size in BLOCK_SIZES {
        let spec = ProcessSpec::stereo(48_000.0, size).unwrap();
        let input = test_block(size);
        let mut buffer = input.clone();

        for (name, coefficients) in [
            ("first_order", &first),
            ("second_order", &second),
            ("fourth_order", &fourth),
        ] {
            let mut filter = IirFilter::<f32>::new(Arc::clone(coefficients));
            filter.prepare(&spec);

            group.bench_with_input(BenchmarkId::new(name, size), &size, |bench, _| {
                bench.iter(|| {
                    buffer.make_copy_of(&input);
                    filter.process_block(black_box(&mut buffer));
                })
            });
        }
    }

    group.finish();
}

fn convolve(x: &[f64], y: &[f64]) -> Vec<f64> {
    let mut out = vec![0.0; x.len() + y.len() - 1];
    for (i, &xi) in x.iter().enumerate() {
        for (j, &yj) in y.iter().enumerate() {
            out[i + j] += xi * yj;
        }
    }
    out
}
