use synthi_matrix::{
    dsp::Waveform,
    graph::{GraphController, GraphLayout, GraphRenderer, SignalGraph},
    EngineConfig, MatrixKind, Synthesizer,
};

const SR: f32 = 48_000.0;
const BLOCK: usize = 512;

// Audio panel
const OSC1_SINE_SAW: usize = 19;
const BUS1: usize = 0;
// Control panel
const INPUT1: usize = 2;
const OSC1_FREQ: usize = 0;
const BUS1_LEVEL: usize = 12;

fn running() -> (Synthesizer<GraphController>, GraphRenderer) {
    let (graph, mut renderer, _scope) = SignalGraph::build(GraphLayout::default(), SR);
    renderer.render_block(BLOCK);
    (Synthesizer::new(graph, EngineConfig::default()), renderer)
}

/// Render `blocks` blocks, holding input amplifier 1 at `input`, and return
/// everything bus 1 produced.
fn render(renderer: &mut GraphRenderer, blocks: usize, input: f32) -> Vec<f32> {
    let held = vec![input; BLOCK];
    let mut out = Vec::with_capacity(blocks * BLOCK);
    for _ in 0..blocks {
        renderer.set_input(0, &held);
        renderer.render_block(BLOCK);
        out.extend_from_slice(renderer.bus_output(BUS1));
    }
    out
}

fn peak(samples: &[f32]) -> f32 {
    samples.iter().fold(0.0f32, |m, s| m.max(s.abs()))
}

fn rising_crossings(samples: &[f32]) -> usize {
    samples
        .windows(2)
        .filter(|w| w[0] < 0.0 && w[1] >= 0.0)
        .count()
}

fn sine_to_bus(synth: &mut Synthesizer<GraphController>, hz: f32) {
    synth.set_frequency(0, hz).unwrap();
    synth.set_level(0, Waveform::Sine, 1.0).unwrap();
    assert_eq!(
        synth.toggle(MatrixKind::Audio, OSC1_SINE_SAW, BUS1, true, None),
        Ok(true)
    );
}

#[test]
fn renders_silence_with_empty_matrix() {
    let (_synth, mut renderer) = running();
    let out = render(&mut renderer, 8, 0.0);
    assert!(out.iter().all(|&s| s == 0.0));
}

#[test]
fn oscillator_pin_reaches_output_bus() {
    let (mut synth, mut renderer) = running();
    sine_to_bus(&mut synth, 440.0);

    let out = render(&mut renderer, 20, 0.0);
    let level = peak(&out[BLOCK * 4..]);
    assert!(level > 0.8 && level <= 1.05, "peak {level}");
}

#[test]
fn pulled_pin_fades_to_silence() {
    let (mut synth, mut renderer) = running();
    sine_to_bus(&mut synth, 440.0);
    render(&mut renderer, 8, 0.0);

    synth
        .toggle(MatrixKind::Audio, OSC1_SINE_SAW, BUS1, false, None)
        .unwrap();
    let out = render(&mut renderer, 4, 0.0);
    // The fade itself never jumps
    assert!(out.windows(2).all(|w| (w[1] - w[0]).abs() < 0.2));
    assert!(out[BLOCK * 2..].iter().all(|&s| s == 0.0));
}

#[test]
fn level_cv_opens_a_closed_output() {
    let (mut synth, mut renderer) = running();
    synth.set_output_level(BUS1, 0.0).unwrap();
    sine_to_bus(&mut synth, 440.0);
    let closed = render(&mut renderer, 10, 0.0);
    assert_eq!(peak(&closed[BLOCK * 4..]), 0.0);

    // +3 units = +12 V lifts the closed dial back to unity
    assert_eq!(
        synth.toggle(MatrixKind::Control, INPUT1, BUS1_LEVEL, true, None),
        Ok(true)
    );
    let open = render(&mut renderer, 10, 3.0);
    assert!(peak(&open[BLOCK * 4..]) > 0.8);
}

#[test]
fn one_volt_of_frequency_cv_raises_an_octave() {
    let (mut synth, mut renderer) = running();
    sine_to_bus(&mut synth, 220.0);
    render(&mut renderer, 10, 0.0);
    let base = rising_crossings(&render(&mut renderer, 94, 0.0));
    assert!((218..=222).contains(&base), "{base} cycles");

    // 0.25 units = 1 V = 1200 cents
    assert_eq!(
        synth.toggle(MatrixKind::Control, INPUT1, OSC1_FREQ, true, None),
        Ok(true)
    );
    render(&mut renderer, 20, 0.25);
    let raised = rising_crossings(&render(&mut renderer, 94, 0.25));
    assert!((436..=444).contains(&raised), "{raised} cycles");
}
