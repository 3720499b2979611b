//! Rendering cost of patched graphs.
//!
//! Every pin adds a filter and a gain stage, so a dense patch is mostly
//! pin stages rather than oscillators.

use std::hint::black_box;

use criterion::{BenchmarkId, Criterion};
use synthi_matrix::{
    dsp::Waveform,
    graph::{GraphLayout, GraphRenderer, SignalGraph},
    EngineConfig, MatrixKind, Synthesizer,
};

use crate::BLOCK_SIZES;

/// Audio panel: first oscillator row.
const OSC_ROW: usize = 19;

/// Every oscillator playing into all eight buses, plus a frequency CV pin
/// from noise on each. Returns the renderer with the patch applied.
fn full_patch(oscillators: usize) -> GraphRenderer {
    let (graph, mut renderer, _scope) = SignalGraph::build(GraphLayout::default(), 48_000.0);
    renderer.render_block(64);
    let mut synth = Synthesizer::new(graph, EngineConfig::default());
    for osc in 0..oscillators {
        let _ = synth.set_level(osc, Waveform::Sine, 1.0);
        for bus in 0..8 {
            let _ = synth.toggle(MatrixKind::Audio, OSC_ROW + osc * 2, bus, true, None);
        }
        let _ = synth.toggle(MatrixKind::Control, 0, osc, true, None);
    }
    renderer.render_block(64);
    renderer
}

pub fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/render");

    for &size in BLOCK_SIZES {
        for oscillators in [1, 4, 12] {
            let mut renderer = full_patch(oscillators);
            group.bench_with_input(
                BenchmarkId::new(format!("{oscillators}_osc"), size),
                &size,
                |b, &size| {
                    b.iter(|| {
                        black_box(renderer.render_block(black_box(size)));
                    })
                },
            );
        }
    }

    group.finish();
}
