//! Oscillator voices as the control side sees them.
//!
//! A voice always has a state (the knob positions). It only has audio nodes
//! once something has been patched to it: the generator is created the first
//! time a pin needs one of its ports, and the frequency CV chain the first
//! time a pin lands on its FREQ column.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    blueprint::OscChannel,
    config::CvChainConfig,
    dsp::Waveform,
    error::GraphError,
    graph::{
        port::{OSC_PITCH_INPUT, OSC_SYNC_INPUT},
        AudioGraph, NodeHandle, OscillatorParams, Param, PortRef,
    },
    synth::cv::CENTS_PER_UNIT,
};

pub const DEFAULT_FREQUENCY: f32 = 261.63;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct WaveLevels {
    pub sine: f32,
    pub saw: f32,
    pub tri: f32,
    pub pulse: f32,
}

impl WaveLevels {
    pub fn get(&self, waveform: Waveform) -> f32 {
        match waveform {
            Waveform::Sine => self.sine,
            Waveform::Saw => self.saw,
            Waveform::Triangle => self.tri,
            Waveform::Pulse => self.pulse,
        }
    }

    pub fn set(&mut self, waveform: Waveform, level: f32) {
        let slot = match waveform {
            Waveform::Sine => &mut self.sine,
            Waveform::Saw => &mut self.saw,
            Waveform::Triangle => &mut self.tri,
            Waveform::Pulse => &mut self.pulse,
        };
        *slot = level.clamp(0.0, 1.0);
    }

    pub fn as_array(&self) -> [f32; 4] {
        [self.sine, self.saw, self.tri, self.pulse]
    }
}

/// Knob positions of one oscillator.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OscillatorVoiceState {
    pub frequency: f32,
    pub levels: WaveLevels,
    pub pulse_width: f32,
    pub sine_symmetry: f32,
}

impl Default for OscillatorVoiceState {
    fn default() -> Self {
        Self {
            frequency: DEFAULT_FREQUENCY,
            levels: WaveLevels::default(),
            pulse_width: 0.5,
            sine_symmetry: 0.5,
        }
    }
}

impl OscillatorVoiceState {
    pub fn params(&self) -> OscillatorParams {
        OscillatorParams {
            frequency: self.frequency,
            levels: self.levels.as_array(),
            pulse_width: self.pulse_width,
            sine_symmetry: self.sine_symmetry,
        }
    }
}

/// Stages between a frequency CV pin and the generator's pitch input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CvChain {
    pub slew: Option<NodeHandle>,
    pub clip: Option<NodeHandle>,
    /// Scales CV units to cents.
    pub cents: NodeHandle,
}

impl CvChain {
    /// Where frequency CV pins land.
    pub fn input(&self) -> PortRef {
        let first = self.slew.or(self.clip).unwrap_or(self.cents);
        PortRef::new(first, 0)
    }

    pub fn stages(&self) -> impl Iterator<Item = NodeHandle> {
        [self.slew, self.clip, Some(self.cents)].into_iter().flatten()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OscillatorNodes {
    pub generator: NodeHandle,
    pub cv: Option<CvChain>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VoiceNode {
    #[default]
    Unrealized,
    Realized(OscillatorNodes),
}

#[derive(Debug, Clone, Default)]
pub struct OscillatorVoice {
    state: OscillatorVoiceState,
    node: VoiceNode,
    dormant: bool,
}

impl OscillatorVoice {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_state(state: OscillatorVoiceState) -> Self {
        Self {
            state,
            ..Self::default()
        }
    }

    pub fn state(&self) -> &OscillatorVoiceState {
        &self.state
    }

    pub fn node(&self) -> &VoiceNode {
        &self.node
    }

    pub fn is_dormant(&self) -> bool {
        self.dormant
    }

    pub fn is_realized(&self) -> bool {
        matches!(self.node, VoiceNode::Realized(_))
    }

    pub fn generator(&self) -> Option<NodeHandle> {
        match self.node {
            VoiceNode::Realized(nodes) => Some(nodes.generator),
            VoiceNode::Unrealized => None,
        }
    }

    pub fn cv_chain(&self) -> Option<CvChain> {
        match self.node {
            VoiceNode::Realized(nodes) => nodes.cv,
            VoiceNode::Unrealized => None,
        }
    }

    /// Create the generator if it does not exist yet.
    pub fn realize<G: AudioGraph>(&mut self, graph: &mut G) -> Result<NodeHandle, GraphError> {
        if let Some(generator) = self.generator() {
            return Ok(generator);
        }
        let mut params = self.state.params();
        if self.dormant {
            params.levels = [0.0; 4];
        }
        let generator = graph.create_oscillator_voice(&params)?;
        self.node = VoiceNode::Realized(OscillatorNodes {
            generator,
            cv: None,
        });
        Ok(generator)
    }

    pub fn output<G: AudioGraph>(
        &mut self,
        graph: &mut G,
        channel: OscChannel,
    ) -> Result<PortRef, GraphError> {
        let generator = self.realize(graph)?;
        Ok(PortRef::new(generator, channel.output_port()))
    }

    pub fn sync_input<G: AudioGraph>(&mut self, graph: &mut G) -> Result<PortRef, GraphError> {
        let generator = self.realize(graph)?;
        Ok(PortRef::new(generator, OSC_SYNC_INPUT))
    }

    /// Build the frequency CV chain if needed and return its input.
    ///
    /// Stages created before a failure are released again, so the voice is
    /// either left with a complete chain or none at all.
    pub fn ensure_cv_chain<G: AudioGraph>(
        &mut self,
        graph: &mut G,
        config: &CvChainConfig,
    ) -> Result<PortRef, GraphError> {
        let generator = self.realize(graph)?;
        if let Some(chain) = self.cv_chain() {
            return Ok(chain.input());
        }

        let mut created = Vec::with_capacity(3);
        let chain = match build_cv_chain(graph, config, generator, &mut created) {
            Ok(chain) => chain,
            Err(err) => {
                for stage in created {
                    let _ = graph.release(stage, 0.0);
                }
                return Err(err);
            }
        };

        self.node = VoiceNode::Realized(OscillatorNodes {
            generator,
            cv: Some(chain),
        });
        Ok(chain.input())
    }

    pub fn set_frequency<G: AudioGraph>(
        &mut self,
        graph: &mut G,
        frequency: f32,
        ramp: f32,
    ) -> Result<(), GraphError> {
        self.state.frequency = frequency.max(0.0);
        match self.generator() {
            Some(node) => graph.set_param(node, Param::Frequency, self.state.frequency, ramp),
            None => Ok(()),
        }
    }

    /// Store a waveform level. While dormant the generator stays silent and
    /// the new level is applied on wake.
    pub fn set_level<G: AudioGraph>(
        &mut self,
        graph: &mut G,
        waveform: Waveform,
        level: f32,
        ramp: f32,
    ) -> Result<(), GraphError> {
        self.state.levels.set(waveform, level);
        match self.generator() {
            Some(node) if !self.dormant => graph.set_param(
                node,
                Param::Level(waveform),
                self.state.levels.get(waveform),
                ramp,
            ),
            _ => Ok(()),
        }
    }

    pub fn set_pulse_width<G: AudioGraph>(
        &mut self,
        graph: &mut G,
        width: f32,
        ramp: f32,
    ) -> Result<(), GraphError> {
        self.state.pulse_width = width.clamp(0.0, 1.0);
        match self.generator() {
            Some(node) => graph.set_param(node, Param::PulseWidth, self.state.pulse_width, ramp),
            None => Ok(()),
        }
    }

    pub fn set_sine_symmetry<G: AudioGraph>(
        &mut self,
        graph: &mut G,
        symmetry: f32,
        ramp: f32,
    ) -> Result<(), GraphError> {
        self.state.sine_symmetry = symmetry.clamp(0.0, 1.0);
        match self.generator() {
            Some(node) => {
                graph.set_param(node, Param::SineSymmetry, self.state.sine_symmetry, ramp)
            }
            None => Ok(()),
        }
    }

    /// Replace every knob at once, pushing the changes to a live generator.
    pub fn apply_state<G: AudioGraph>(
        &mut self,
        graph: &mut G,
        state: &OscillatorVoiceState,
        ramp: f32,
    ) -> Result<(), GraphError> {
        self.set_frequency(graph, state.frequency, ramp)?;
        self.set_pulse_width(graph, state.pulse_width, ramp)?;
        self.set_sine_symmetry(graph, state.sine_symmetry, ramp)?;
        for waveform in Waveform::ALL {
            self.set_level(graph, waveform, state.levels.get(waveform), ramp)?;
        }
        Ok(())
    }

    /// Silence (or restore) the generator without touching the stored levels.
    pub fn set_dormant<G: AudioGraph>(
        &mut self,
        graph: &mut G,
        dormant: bool,
        ramp: f32,
    ) -> Result<(), GraphError> {
        if self.dormant == dormant {
            return Ok(());
        }
        self.dormant = dormant;
        let Some(node) = self.generator() else {
            return Ok(());
        };
        for waveform in Waveform::ALL {
            let level = if dormant {
                0.0
            } else {
                self.state.levels.get(waveform)
            };
            graph.set_param(node, Param::Level(waveform), level, ramp)?;
        }
        Ok(())
    }
}

fn build_cv_chain<G: AudioGraph>(
    graph: &mut G,
    config: &CvChainConfig,
    generator: NodeHandle,
    created: &mut Vec<NodeHandle>,
) -> Result<CvChain, GraphError> {
    let slew = match config.thermal_slew {
        Some(slew) => {
            let node = graph.create_slew_stage(&slew.into())?;
            created.push(node);
            Some(node)
        }
        None => None,
    };
    let clip = match config.soft_clip {
        Some(clip) => {
            let node = graph.create_clip_stage(clip.knee, clip.limit)?;
            created.push(node);
            Some(node)
        }
        None => None,
    };
    let cents = graph.create_gain_stage(CENTS_PER_UNIT)?;
    created.push(cents);

    let chain = CvChain { slew, clip, cents };
    let stages: Vec<NodeHandle> = chain.stages().collect();
    for pair in stages.windows(2) {
        graph.connect(PortRef::new(pair[0], 0), PortRef::new(pair[1], 0))?;
    }
    graph.connect(
        PortRef::new(cents, 0),
        PortRef::new(generator, OSC_PITCH_INPUT),
    )?;
    Ok(chain)
}
