//! Benchmarks for the pin RC filter and output VCA curve.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use synthi_matrix::{
    dsp::{
        filter::RcLowpass,
        vca::{dial_to_voltage, vca_voltage_to_gain},
    },
    matrix::PinColor,
};

use crate::BLOCK_SIZES;

pub fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/filter");

    for &size in BLOCK_SIZES {
        let input: Vec<f32> = (0..size)
            .map(|i| (i as f32 / size as f32) * 2.0 - 1.0)
            .collect();

        for color in [PinColor::White, PinColor::Red] {
            let mut filter = RcLowpass::new(color.cutoff_hz());
            let mut buffer = input.clone();
            group.bench_with_input(
                BenchmarkId::new(color.label().to_lowercase(), size),
                &size,
                |b, _| {
                    b.iter(|| {
                        buffer.copy_from_slice(&input);
                        filter.render(black_box(&mut buffer), black_box(48_000.0));
                    })
                },
            );
        }

        // Per-sample VCA law, as the output bus runs it
        let cv: Vec<f32> = (0..size).map(|i| (i as f32 * 0.01).sin()).collect();
        let mut buffer = vec![0.0f32; size];
        group.bench_with_input(BenchmarkId::new("vca", size), &size, |b, _| {
            b.iter(|| {
                for (out, &v) in buffer.iter_mut().zip(&cv) {
                    *out = vca_voltage_to_gain(dial_to_voltage(black_box(7.0)) + v * 4.0);
                }
            })
        });
    }

    group.finish();
}
