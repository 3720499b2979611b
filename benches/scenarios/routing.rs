//! Control-side cost of pushing and pulling pins.

use std::hint::black_box;

use criterion::Criterion;
use synthi_matrix::{
    graph::{GraphLayout, SignalGraph},
    EngineConfig, MatrixKind, PinColor, Synthesizer,
};

pub fn bench_routing(c: &mut Criterion) {
    let mut group = c.benchmark_group("scenarios/routing");

    let (graph, mut renderer, _scope) = SignalGraph::build(GraphLayout::default(), 48_000.0);
    renderer.render_block(64);
    let mut synth = Synthesizer::new(graph, EngineConfig::default());

    // Push and pull one pin; rendering in between keeps the rings drained
    group.bench_function("toggle_pin", |b| {
        b.iter(|| {
            let _ = synth.toggle(MatrixKind::Audio, black_box(19), black_box(0), true, None);
            let _ = synth.toggle(MatrixKind::Audio, 19, 0, false, None);
            renderer.render_block(1024);
        })
    });

    synth
        .toggle(MatrixKind::Audio, 19, 0, true, None)
        .expect("pin on the grid");
    let mut color = PinColor::White;
    group.bench_function("recolour_pin", |b| {
        b.iter(|| {
            color = color.next();
            synth.on_color_change(MatrixKind::Audio, 19, 0, black_box(color));
            renderer.render_block(64);
        })
    });

    group.bench_function("pin_gain", |b| {
        b.iter(|| synth.pin_gain(MatrixKind::Audio, black_box(19), black_box(3), None))
    });

    group.finish();
}
