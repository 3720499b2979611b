//! The instrument as one object.
//!
//! [`Synthesizer`] owns the rack and both patch bays, wires routing changes
//! into dormancy, and replays frequency CV pins that were pushed before the
//! audio graph came up. Everything here runs on the control thread.

pub mod patch;

use tracing::{info, warn};

use crate::{
    blueprint::{panels, Blueprint, DestinationKind},
    config::EngineConfig,
    dsp::Waveform,
    error::{GraphError, RoutingError},
    graph::{node::DEFAULT_BUS_DIAL, AudioGraph},
    matrix::{MatrixKind, PatchBay, PatchEntry, PinColor},
    synth::{DormancyTracker, OscillatorVoiceState, Rack},
};

pub use patch::{Patch, VoicePreset};

pub struct Synthesizer<G: AudioGraph> {
    rack: Rack<G>,
    audio: PatchBay,
    control: PatchBay,
    dormancy: DormancyTracker,
    config: EngineConfig,
    output_levels: Vec<f32>,
    ready: bool,
}

impl<G: AudioGraph> Synthesizer<G> {
    /// Build the instrument with the two built-in panels.
    pub fn new(graph: G, config: EngineConfig) -> Self {
        Self::with_blueprints(graph, config, panels::audio_panel(), panels::control_panel())
    }

    pub fn with_blueprints(
        graph: G,
        config: EngineConfig,
        audio: Blueprint,
        control: Blueprint,
    ) -> Self {
        let rack = Rack::new(graph, config.voices, config.cv);
        let audio = PatchBay::new(MatrixKind::Audio, audio, config.audio.clone(), config.ramps);
        let control = PatchBay::new(
            MatrixKind::Control,
            control,
            config.control.clone(),
            config.ramps,
        );
        let ready = rack.is_ready();
        Self {
            rack,
            audio,
            control,
            dormancy: DormancyTracker::new(config.voices.oscillators),
            output_levels: vec![DEFAULT_BUS_DIAL; config.voices.output_buses],
            config,
            ready,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn rack(&self) -> &Rack<G> {
        &self.rack
    }

    pub fn graph(&self) -> &G {
        self.rack.graph()
    }

    pub fn graph_mut(&mut self) -> &mut G {
        self.rack.graph_mut()
    }

    pub fn matrix(&self, kind: MatrixKind) -> &PatchBay {
        match kind {
            MatrixKind::Audio => &self.audio,
            MatrixKind::Control => &self.control,
        }
    }

    pub fn dormancy(&self) -> &DormancyTracker {
        &self.dormancy
    }

    fn split(&mut self, kind: MatrixKind) -> (&mut PatchBay, &mut Rack<G>) {
        let bay = match kind {
            MatrixKind::Audio => &mut self.audio,
            MatrixKind::Control => &mut self.control,
        };
        (bay, &mut self.rack)
    }

    pub fn toggle(
        &mut self,
        kind: MatrixKind,
        row: usize,
        col: usize,
        activate: bool,
        color: Option<PinColor>,
    ) -> Result<bool, RoutingError> {
        let (bay, rack) = self.split(kind);
        let result = bay.toggle(rack, row, col, activate, color);
        self.after_routing();
        result
    }

    /// Gain a pin would get, or `None` if the cell carries nothing.
    pub fn pin_gain(
        &self,
        kind: MatrixKind,
        row: usize,
        col: usize,
        color: Option<PinColor>,
    ) -> Option<f32> {
        let bay = self.matrix(kind);
        let (_, destination) = bay.mapping().endpoints(row, col)?;
        Some(bay.pin_gain(row, col, &destination, color))
    }

    pub fn on_color_change(&mut self, kind: MatrixKind, row: usize, col: usize, color: PinColor) {
        let (bay, rack) = self.split(kind);
        bay.on_color_change(rack, row, col, color);
    }

    pub fn active_connection_count_to(
        &self,
        kind: MatrixKind,
        predicate: impl Fn(&DestinationKind) -> bool,
    ) -> usize {
        self.matrix(kind).active_connection_count_to(predicate)
    }

    pub fn serialize(&self, kind: MatrixKind) -> Vec<PatchEntry> {
        self.matrix(kind).serialize()
    }

    pub fn restore(&mut self, kind: MatrixKind, entries: &[PatchEntry]) -> usize {
        let (bay, rack) = self.split(kind);
        let restored = bay.restore(rack, entries);
        self.after_routing();
        restored
    }

    pub fn reload(&mut self, kind: MatrixKind, blueprint: Blueprint) {
        let (bay, rack) = self.split(kind);
        bay.reload(rack, blueprint);
        self.after_routing();
    }

    /// Check whether the graph has come up since the last call and, if so,
    /// replay pending frequency CV pins. Returns true on the transition.
    pub fn poll_readiness(&mut self) -> bool {
        if self.ready || !self.rack.is_ready() {
            return false;
        }
        self.signal_ready();
        true
    }

    /// The graph is running: build every pending frequency CV pin. Returns
    /// how many went live.
    pub fn signal_ready(&mut self) -> usize {
        self.ready = true;
        let pending = self.rack.take_pending();
        let mut built = 0;
        for (kind, osc) in pending {
            let (bay, rack) = self.split(kind);
            built += bay.retry_pending(rack, osc);
        }
        info!(built, "audio ready");
        self.after_routing();
        built
    }

    pub fn set_dormant(&mut self, osc: usize, dormant: bool) -> Result<(), GraphError> {
        self.rack.set_dormant(osc, dormant, self.config.ramps.dormancy)
    }

    pub fn set_frequency(&mut self, osc: usize, hz: f32) -> Result<(), GraphError> {
        self.rack.set_frequency(osc, hz, self.config.ramps.parameter)
    }

    pub fn set_level(&mut self, osc: usize, waveform: Waveform, level: f32) -> Result<(), GraphError> {
        self.rack
            .set_level(osc, waveform, level, self.config.ramps.parameter)
    }

    pub fn set_pulse_width(&mut self, osc: usize, width: f32) -> Result<(), GraphError> {
        self.rack
            .set_pulse_width(osc, width, self.config.ramps.parameter)
    }

    pub fn set_sine_symmetry(&mut self, osc: usize, symmetry: f32) -> Result<(), GraphError> {
        self.rack
            .set_sine_symmetry(osc, symmetry, self.config.ramps.parameter)
    }

    /// Move an output channel's level dial (0-10).
    pub fn set_output_level(&mut self, bus: usize, dial: f32) -> Result<(), GraphError> {
        let Some(level) = self.output_levels.get_mut(bus) else {
            return Ok(());
        };
        *level = dial.clamp(0.0, 10.0);
        self.rack
            .set_output_level(bus, *level, self.config.ramps.parameter)
    }

    pub fn output_level(&self, bus: usize) -> Option<f32> {
        self.output_levels.get(bus).copied()
    }

    /// Capture both matrices and every touched oscillator.
    pub fn snapshot(&self, name: impl Into<String>) -> Patch {
        Patch {
            name: name.into(),
            audio: self.audio.serialize(),
            control: self.control.serialize(),
            oscillators: self
                .rack
                .oscillator_states()
                .map(|(index, state)| VoicePreset {
                    index,
                    state: *state,
                })
                .collect(),
            output_levels: self.output_levels.clone(),
        }
    }

    /// Recall a patch: knobs first, then routing. Returns the number of live
    /// pins across both matrices.
    pub fn load_patch(&mut self, patch: &Patch) -> usize {
        for preset in &patch.oscillators {
            self.apply_voice(preset.index, &preset.state);
        }
        for (bus, &dial) in patch.output_levels.iter().enumerate() {
            if let Err(err) = self.set_output_level(bus, dial) {
                warn!(bus, %err, "could not set output level");
            }
        }
        self.restore(MatrixKind::Audio, &patch.audio) + self.restore(MatrixKind::Control, &patch.control)
    }

    fn apply_voice(&mut self, osc: usize, state: &OscillatorVoiceState) {
        if let Err(err) = self.rack.apply_state(osc, state, 0.0) {
            warn!(osc, %err, "could not apply voice state");
        }
    }

    /// Feed routing events to the dormancy tracker and put idle voices to
    /// sleep (or wake busy ones).
    fn after_routing(&mut self) {
        for event in self.audio.drain_events().chain(self.control.drain_events()) {
            self.dormancy.apply(&event);
        }
        if !self.config.dormancy {
            return;
        }

        let realized: Vec<usize> = self.rack.realized_oscillators().collect();
        for osc in realized {
            let idle = self.dormancy.is_idle(osc);
            let dormant = self
                .rack
                .oscillator(osc)
                .is_some_and(|voice| voice.is_dormant());
            if idle != dormant {
                if let Err(err) = self.rack.set_dormant(osc, idle, self.config.ramps.dormancy) {
                    warn!(osc, %err, "could not change dormancy");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{GraphController, GraphLayout, Param, SignalGraph};

    fn synth(ready: bool) -> Synthesizer<GraphController> {
        let (graph, _renderer, _scope) = SignalGraph::build(GraphLayout::default(), 48_000.0);
        if ready {
            graph.mark_ready();
        }
        Synthesizer::new(graph, EngineConfig::default())
    }

    #[test]
    fn test_pin_gain_for_hidden_cell_is_none() {
        let synth = synth(true);
        assert_eq!(synth.pin_gain(MatrixKind::Audio, 18, 3, None), None);
        let gain = synth.pin_gain(MatrixKind::Audio, 19, 3, Some(PinColor::Green));
        assert!((gain.unwrap() - 100.0 / 68.0).abs() < 1e-5);
    }

    #[test]
    fn test_poll_readiness_fires_once() {
        let mut synth = synth(false);
        assert!(!synth.poll_readiness());
        synth.graph().mark_ready();
        assert!(synth.poll_readiness());
        assert!(!synth.poll_readiness());
    }

    #[test]
    fn test_modulated_voice_without_outputs_sleeps() {
        let mut synth = synth(true);
        synth.set_level(4, Waveform::Sine, 1.0).unwrap();
        // Noise 1 into oscillator 5 frequency: the voice exists but is unheard
        assert_eq!(synth.toggle(MatrixKind::Control, 0, 4, true, None), Ok(true));
        let voice = synth.rack().oscillator(4).unwrap();
        assert!(voice.is_realized());
        assert!(voice.is_dormant());

        // Oscillator 5 sine/saw (audio row 27) into bus 1 wakes it
        synth.toggle(MatrixKind::Audio, 27, 0, true, None).unwrap();
        let voice = synth.rack().oscillator(4).unwrap();
        assert!(!voice.is_dormant());
        let generator = voice.generator().unwrap();
        assert_eq!(
            synth.graph().param_target(generator, Param::Level(Waveform::Sine)),
            Some(1.0)
        );
    }

    #[test]
    fn test_reload_keeps_routes_of_the_other_matrix() {
        let mut synth = synth(true);
        // Oscillator 1 into bus 1 (audio) and into bus 1 level CV (control)
        synth.toggle(MatrixKind::Audio, 19, 0, true, None).unwrap();
        synth.toggle(MatrixKind::Control, 10, 12, true, None).unwrap();
        assert_eq!(synth.dormancy().routes(0), 2);

        synth.reload(MatrixKind::Control, crate::blueprint::panels::control_panel());
        assert_eq!(synth.dormancy().routes(0), 1);
        assert!(!synth.rack().oscillator(0).unwrap().is_dormant());

        synth.reload(MatrixKind::Audio, crate::blueprint::panels::audio_panel());
        assert_eq!(synth.dormancy().routes(0), 0);
        assert!(synth.rack().oscillator(0).unwrap().is_dormant());
    }

    #[test]
    fn test_dormancy_can_be_disabled() {
        let (graph, _renderer, _scope) = SignalGraph::build(GraphLayout::default(), 48_000.0);
        graph.mark_ready();
        let config = EngineConfig {
            dormancy: false,
            ..EngineConfig::default()
        };
        let mut synth = Synthesizer::new(graph, config);
        synth.toggle(MatrixKind::Control, 0, 4, true, None).unwrap();
        assert!(!synth.rack().oscillator(4).unwrap().is_dormant());
    }

    #[test]
    fn test_output_level_is_tracked() {
        let mut synth = synth(true);
        synth.set_output_level(2, 12.0).unwrap();
        assert_eq!(synth.output_level(2), Some(10.0));
        synth.set_output_level(2, 4.0).unwrap();
        let bus = synth.graph().output_bus_output(2).unwrap().node;
        assert_eq!(synth.graph().param_target(bus, Param::OutputLevel), Some(4.0));
        assert!(synth.set_output_level(99, 1.0).is_ok());
    }

    #[test]
    fn test_snapshot_and_load() {
        let mut synth = synth(true);
        synth.set_frequency(0, 440.0).unwrap();
        synth.set_level(0, Waveform::Saw, 0.5).unwrap();
        synth.toggle(MatrixKind::Audio, 19, 0, true, Some(PinColor::Grey)).unwrap();
        synth.set_output_level(0, 6.0).unwrap();
        let patch = synth.snapshot("test");

        let mut other = self::synth(true);
        assert_eq!(other.load_patch(&patch), 1);
        assert_eq!(other.snapshot("test"), patch);
        assert_eq!(other.rack().oscillator(0).unwrap().state().frequency, 440.0);
    }
}
