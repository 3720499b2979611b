//! Benchmarks for the CV chain's shaping stages.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use synthi_matrix::dsp::{distortion, slew::ThermalSlew};

use crate::BLOCK_SIZES;

pub fn bench_distortion(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/cv_chain");

    for &size in BLOCK_SIZES {
        // Control signal swinging past the knee
        let input: Vec<f32> = (0..size).map(|i| 2.0 * (i as f32 * 0.05).sin()).collect();

        let mut buffer = input.clone();
        group.bench_with_input(BenchmarkId::new("headroom_clip", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&input);
                distortion::headroom_clip_buffer(
                    black_box(&mut buffer),
                    black_box(1.0),
                    black_box(1.5),
                );
            })
        });

        // Steps large enough to take the slow branch
        let steps: Vec<f32> = (0..size)
            .map(|i| if (i / 32) % 2 == 0 { 1.0 } else { -1.0 })
            .collect();
        let mut slew = ThermalSlew::new(48_000.0, 0.0005, 0.015, 0.03, 0.25);
        let mut buffer = steps.clone();
        group.bench_with_input(BenchmarkId::new("thermal_slew", size), &size, |b, _| {
            b.iter(|| {
                buffer.copy_from_slice(&steps);
                slew.render(black_box(&mut buffer));
            })
        });
    }

    group.finish();
}
