//! Benchmarks for oscillator waveform generation.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use synthi_matrix::dsp::{noise::NoiseSource, oscillator::MultiOscillator};

use crate::BLOCK_SIZES;

pub fn bench_oscillator(c: &mut Criterion) {
    let mut group = c.benchmark_group("dsp/oscillator");

    for &size in BLOCK_SIZES {
        let mut buffer = vec![0.0f32; size];

        // All four shapes from one phase
        let mut osc = MultiOscillator::new();
        group.bench_with_input(BenchmarkId::new("four_shapes", size), &size, |b, _| {
            b.iter(|| {
                for out in buffer.iter_mut() {
                    let waves = osc.next(black_box(440.0), 48_000.0, 0.5, 0.5);
                    *out = waves.sine + waves.saw + waves.triangle + waves.pulse;
                }
            })
        });

        // Asymmetric sine takes the shaped path
        let mut osc = MultiOscillator::new();
        group.bench_with_input(BenchmarkId::new("shaped_sine", size), &size, |b, _| {
            b.iter(|| {
                for out in buffer.iter_mut() {
                    *out = osc.next(black_box(440.0), 48_000.0, 0.5, 0.8).sine;
                }
            })
        });

        let mut noise = NoiseSource::with_seed(1);
        group.bench_with_input(BenchmarkId::new("noise", size), &size, |b, _| {
            b.iter(|| {
                for out in buffer.iter_mut() {
                    *out = noise.next(black_box(0.5));
                }
            })
        });
    }

    group.finish();
}
