//! The modules behind the matrices.
//!
//! Both patch bays resolve their rows and columns against one shared rack,
//! so an oscillator patched on the audio panel and modulated from the
//! control panel is the same voice with the same nodes.

use std::collections::BTreeSet;

use tracing::debug;

use crate::{
    blueprint::{DestinationKind, Source},
    config::{CvChainConfig, VoiceCounts},
    dsp::Waveform,
    error::GraphError,
    graph::{AudioGraph, NodeHandle, NoiseParams, Param, PortRef},
    matrix::{connection::DestinationLink, MatrixKind},
    synth::voice::{OscillatorVoice, OscillatorVoiceState},
};

const NOISE_SEED: u64 = 0x5EED_0001;
const DEFAULT_NOISE_COLOUR: f32 = 0.5;

pub struct Rack<G: AudioGraph> {
    graph: G,
    cv: CvChainConfig,
    counts: VoiceCounts,
    oscillators: Vec<Option<OscillatorVoice>>,
    noise: Vec<Option<NodeHandle>>,
    pending: BTreeSet<(MatrixKind, usize)>,
}

impl<G: AudioGraph> Rack<G> {
    pub fn new(graph: G, counts: VoiceCounts, cv: CvChainConfig) -> Self {
        Self {
            graph,
            cv,
            counts,
            oscillators: vec![None; counts.oscillators],
            noise: vec![None; counts.noise_generators],
            pending: BTreeSet::new(),
        }
    }

    pub fn graph(&self) -> &G {
        &self.graph
    }

    pub fn graph_mut(&mut self) -> &mut G {
        &mut self.graph
    }

    pub fn counts(&self) -> VoiceCounts {
        self.counts
    }

    pub fn is_ready(&self) -> bool {
        self.graph.is_ready()
    }

    /// The voice, if it has been touched at all.
    pub fn oscillator(&self, osc: usize) -> Option<&OscillatorVoice> {
        self.oscillators.get(osc)?.as_ref()
    }

    /// The voice, created on first access. `None` past the oscillator count.
    pub fn oscillator_mut(&mut self, osc: usize) -> Option<&mut OscillatorVoice> {
        let slot = self.oscillators.get_mut(osc)?;
        Some(slot.get_or_insert_with(OscillatorVoice::new))
    }

    /// Indices of every voice that has audio nodes.
    pub fn realized_oscillators(&self) -> impl Iterator<Item = usize> + '_ {
        self.oscillators
            .iter()
            .enumerate()
            .filter(|(_, v)| v.as_ref().is_some_and(OscillatorVoice::is_realized))
            .map(|(i, _)| i)
    }

    pub fn oscillator_states(&self) -> impl Iterator<Item = (usize, &OscillatorVoiceState)> + '_ {
        self.oscillators
            .iter()
            .enumerate()
            .filter_map(|(i, v)| v.as_ref().map(|v| (i, v.state())))
    }

    /// Run `f` on a voice with the graph alongside it.
    fn with_voice<T>(
        &mut self,
        osc: usize,
        f: impl FnOnce(&mut OscillatorVoice, &mut G, &CvChainConfig) -> Result<T, GraphError>,
    ) -> Option<Result<T, GraphError>> {
        let voice = self.oscillators.get_mut(osc)?.get_or_insert_with(OscillatorVoice::new);
        Some(f(voice, &mut self.graph, &self.cv))
    }

    pub fn set_frequency(&mut self, osc: usize, hz: f32, ramp: f32) -> Result<(), GraphError> {
        self.with_voice(osc, |v, g, _| v.set_frequency(g, hz, ramp))
            .unwrap_or(Ok(()))
    }

    pub fn set_level(
        &mut self,
        osc: usize,
        waveform: Waveform,
        level: f32,
        ramp: f32,
    ) -> Result<(), GraphError> {
        self.with_voice(osc, |v, g, _| v.set_level(g, waveform, level, ramp))
            .unwrap_or(Ok(()))
    }

    pub fn set_pulse_width(&mut self, osc: usize, width: f32, ramp: f32) -> Result<(), GraphError> {
        self.with_voice(osc, |v, g, _| v.set_pulse_width(g, width, ramp))
            .unwrap_or(Ok(()))
    }

    pub fn set_sine_symmetry(
        &mut self,
        osc: usize,
        symmetry: f32,
        ramp: f32,
    ) -> Result<(), GraphError> {
        self.with_voice(osc, |v, g, _| v.set_sine_symmetry(g, symmetry, ramp))
            .unwrap_or(Ok(()))
    }

    pub fn apply_state(
        &mut self,
        osc: usize,
        state: &OscillatorVoiceState,
        ramp: f32,
    ) -> Result<(), GraphError> {
        self.with_voice(osc, |v, g, _| v.apply_state(g, state, ramp))
            .unwrap_or(Ok(()))
    }

    pub fn set_dormant(&mut self, osc: usize, dormant: bool, ramp: f32) -> Result<(), GraphError> {
        self.with_voice(osc, |v, g, _| v.set_dormant(g, dormant, ramp))
            .unwrap_or(Ok(()))
    }

    pub fn set_output_level(&mut self, bus: usize, dial: f32, ramp: f32) -> Result<(), GraphError> {
        let Some(port) = self.graph.output_bus_output(bus) else {
            return Ok(());
        };
        self.graph
            .set_param(port.node, Param::OutputLevel, dial.clamp(0.0, 10.0), ramp)
    }

    /// Output port carrying `source`, realizing voices as needed.
    pub fn resolve_source(&mut self, source: &Source) -> Option<PortRef> {
        let resolved = match *source {
            Source::OscillatorChannel { osc, channel } => self
                .with_voice(osc, |v, g, _| v.output(g, channel))
                .and_then(|r| realized(source, r)),
            Source::NoiseGenerator { index } => self.noise_output(index),
            Source::InputAmplifier { channel } => self.graph.input_amplifier_output(channel),
            Source::OutputBus { bus } => self.graph.output_bus_output(bus),
        };
        if resolved.is_none() {
            debug!(source = %source.label(), "source unavailable");
        }
        resolved
    }

    /// Where a pin on `destination` should deliver its signal.
    pub fn resolve_destination(&mut self, destination: &DestinationKind) -> Option<DestinationLink> {
        let resolved = match *destination {
            DestinationKind::OutputBus { bus } => {
                self.graph.output_bus_input(bus).map(DestinationLink::Direct)
            }
            DestinationKind::Oscilloscope { axis } => {
                self.graph.oscilloscope_input(axis).map(DestinationLink::Direct)
            }
            DestinationKind::OscillatorHardSync { osc } => self
                .with_voice(osc, |v, g, _| v.sync_input(g))
                .and_then(|r| r.ok())
                .map(DestinationLink::Direct),
            DestinationKind::OscillatorFreqCv { osc } => self
                .with_voice(osc, |v, g, cv| v.ensure_cv_chain(g, cv))
                .and_then(|r| r.ok())
                .map(DestinationLink::Direct),
            DestinationKind::OutputLevelCv { bus } => self
                .graph
                .output_bus_output(bus)
                .map(|_| DestinationLink::LevelCv { bus }),
            DestinationKind::OutputVoltageInput { bus } => {
                self.graph.output_voltage_input(bus).map(DestinationLink::Direct)
            }
        };
        if resolved.is_none() {
            debug!(destination = %destination.label(), "destination unavailable");
        }
        resolved
    }

    fn noise_output(&mut self, index: usize) -> Option<PortRef> {
        let slot = self.noise.get_mut(index)?;
        if let Some(node) = *slot {
            return Some(PortRef::new(node, 0));
        }
        let params = NoiseParams {
            seed: NOISE_SEED + index as u64,
            colour: DEFAULT_NOISE_COLOUR,
            level: 1.0,
        };
        let node = self.graph.create_noise_voice(&params).ok()?;
        *slot = Some(node);
        Some(PortRef::new(node, 0))
    }

    /// Remember a frequency CV pin that arrived before the graph was up.
    pub fn mark_pending(&mut self, matrix: MatrixKind, osc: usize) {
        if self.pending.insert((matrix, osc)) {
            debug!(?matrix, osc, "frequency CV queued until audio is ready");
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    pub fn pending(&self) -> &BTreeSet<(MatrixKind, usize)> {
        &self.pending
    }

    pub fn take_pending(&mut self) -> BTreeSet<(MatrixKind, usize)> {
        std::mem::take(&mut self.pending)
    }
}

fn realized(source: &Source, result: Result<PortRef, GraphError>) -> Option<PortRef> {
    result
        .map_err(|err| debug!(source = %source.label(), %err, "could not realize voice"))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        blueprint::{OscChannel, ScopeAxis},
        graph::{GraphController, GraphLayout, NodeKind, SignalGraph},
    };

    fn rack() -> Rack<GraphController> {
        let (graph, _renderer, _scope) = SignalGraph::build(GraphLayout::default(), 48_000.0);
        graph.mark_ready();
        Rack::new(graph, VoiceCounts::default(), CvChainConfig::default())
    }

    #[test]
    fn test_voices_are_created_lazily() {
        let mut rack = rack();
        assert!(rack.oscillator(3).is_none());
        assert!(rack.oscillator_mut(3).is_some());
        assert!(rack.oscillator(3).is_some());
        assert!(rack.oscillator_mut(12).is_none());
        assert_eq!(rack.realized_oscillators().count(), 0);
    }

    #[test]
    fn test_oscillator_source_realizes_voice() {
        let mut rack = rack();
        let source = Source::OscillatorChannel {
            osc: 2,
            channel: OscChannel::TriPulse,
        };
        let port = rack.resolve_source(&source).unwrap();
        assert_eq!(port.port, 1);
        assert_eq!(rack.realized_oscillators().collect::<Vec<_>>(), vec![2]);
        // Same voice, same node
        assert_eq!(rack.resolve_source(&source), Some(port));
    }

    #[test]
    fn test_noise_is_shared() {
        let mut rack = rack();
        let a = rack.resolve_source(&Source::NoiseGenerator { index: 1 }).unwrap();
        let b = rack.resolve_source(&Source::NoiseGenerator { index: 1 }).unwrap();
        assert_eq!(a, b);
        assert_eq!(rack.graph().count_of(NodeKind::Noise), 1);
        assert!(rack.resolve_source(&Source::NoiseGenerator { index: 2 }).is_none());
    }

    #[test]
    fn test_destinations_resolve() {
        let mut rack = rack();
        assert!(matches!(
            rack.resolve_destination(&DestinationKind::OutputBus { bus: 0 }),
            Some(DestinationLink::Direct(_))
        ));
        assert!(matches!(
            rack.resolve_destination(&DestinationKind::Oscilloscope { axis: ScopeAxis::X }),
            Some(DestinationLink::Direct(_))
        ));
        assert_eq!(
            rack.resolve_destination(&DestinationKind::OutputLevelCv { bus: 7 }),
            Some(DestinationLink::LevelCv { bus: 7 })
        );
        assert_eq!(
            rack.resolve_destination(&DestinationKind::OutputLevelCv { bus: 8 }),
            None
        );
        assert_eq!(
            rack.resolve_destination(&DestinationKind::OscillatorFreqCv { osc: 40 }),
            None
        );
    }

    #[test]
    fn test_freq_cv_builds_chain_once() {
        let mut rack = rack();
        let kind = DestinationKind::OscillatorFreqCv { osc: 0 };
        let first = rack.resolve_destination(&kind);
        let second = rack.resolve_destination(&kind);
        assert_eq!(first, second);
        assert_eq!(rack.graph().count_of(NodeKind::Slew), 1);
        assert_eq!(rack.graph().count_of(NodeKind::Clip), 1);
    }

    #[test]
    fn test_pending_is_deduplicated() {
        let mut rack = rack();
        rack.mark_pending(MatrixKind::Control, 2);
        rack.mark_pending(MatrixKind::Control, 2);
        rack.mark_pending(MatrixKind::Audio, 2);
        assert_eq!(rack.pending().len(), 2);
        let taken = rack.take_pending();
        assert_eq!(taken.len(), 2);
        assert!(!rack.has_pending());
    }

    #[test]
    fn test_nothing_resolves_before_ready() {
        let (graph, _renderer, _scope) = SignalGraph::build(GraphLayout::default(), 48_000.0);
        let mut rack = Rack::new(graph, VoiceCounts::default(), CvChainConfig::default());
        let source = Source::OscillatorChannel {
            osc: 0,
            channel: OscChannel::SineSaw,
        };
        assert!(rack.resolve_source(&source).is_none());
        assert!(rack.resolve_source(&Source::NoiseGenerator { index: 0 }).is_none());
        // Fixed panel ports exist regardless
        assert!(rack.resolve_source(&Source::InputAmplifier { channel: 0 }).is_some());
    }
}
