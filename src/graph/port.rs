use crate::{
    blueprint::ScopeAxis,
    dsp::Waveform,
    error::GraphError,
};

/// Opaque id of a node in the audio graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeHandle(pub u32);

/// One input or output socket of a node.
///
/// Whether `port` names an input or an output depends on which side of a
/// connection the reference is used on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PortRef {
    pub node: NodeHandle,
    pub port: usize,
}

impl PortRef {
    pub fn new(node: NodeHandle, port: usize) -> Self {
        Self { node, port }
    }
}

/// Oscillator output carrying the sine + sawtooth mix.
pub const OSC_SINE_SAW: usize = 0;
/// Oscillator output carrying the triangle + pulse mix.
pub const OSC_TRI_PULSE: usize = 1;
/// Oscillator input that resets the phase on a rising zero crossing.
pub const OSC_SYNC_INPUT: usize = 0;
/// Oscillator input summed into the pitch offset, in cents.
pub const OSC_PITCH_INPUT: usize = 1;

/// Output bus input fed by the audio matrix.
pub const BUS_AUDIO_INPUT: usize = 0;
/// Output bus level CV, in digital units (1.0 = 4 V).
pub const BUS_LEVEL_CV_INPUT: usize = 1;
/// Output bus voltage input, added after the VCA.
pub const BUS_VOLTAGE_INPUT: usize = 2;

/// Parameters that can be set (with a ramp) on graph nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Param {
    /// Gain stage multiplier.
    Gain,
    /// Filter stage corner frequency (Hz).
    Cutoff,
    /// Oscillator base frequency (Hz).
    Frequency,
    /// Oscillator waveform level (0-1).
    Level(Waveform),
    /// Oscillator pulse duty cycle (0-1).
    PulseWidth,
    /// Oscillator sine symmetry (0-1).
    SineSymmetry,
    /// Noise colour, 0 = pink, 1 = white.
    Colour,
    /// Noise or output bus level. Buses take the 0-10 dial value.
    OutputLevel,
}

/// Initial settings of an oscillator voice.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OscillatorParams {
    pub frequency: f32,
    pub levels: [f32; 4],
    pub pulse_width: f32,
    pub sine_symmetry: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NoiseParams {
    pub seed: u64,
    pub colour: f32,
    pub level: f32,
}

/// Thermal lag stage settings.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SlewParams {
    pub fast_tau: f32,
    pub rise_tau: f32,
    pub fall_tau: f32,
    pub threshold: f32,
}

/// The audio engine as seen by the routing layer.
///
/// The patch bay never owns the engine's lifecycle; it asks for stages,
/// wires them, and releases them. Creation calls fail with
/// [`GraphError::NotReady`] until the real-time side is running.
pub trait AudioGraph {
    fn is_ready(&self) -> bool;

    fn sample_rate(&self) -> f32;

    fn create_oscillator_voice(
        &mut self,
        params: &OscillatorParams,
    ) -> Result<NodeHandle, GraphError>;

    fn create_noise_voice(&mut self, params: &NoiseParams) -> Result<NodeHandle, GraphError>;

    fn create_filter_stage(&mut self, cutoff_hz: f32) -> Result<NodeHandle, GraphError>;

    fn create_gain_stage(&mut self, gain: f32) -> Result<NodeHandle, GraphError>;

    fn create_slew_stage(&mut self, params: &SlewParams) -> Result<NodeHandle, GraphError>;

    fn create_clip_stage(&mut self, knee: f32, limit: f32) -> Result<NodeHandle, GraphError>;

    fn input_amplifier_output(&self, channel: usize) -> Option<PortRef>;

    fn output_bus_output(&self, bus: usize) -> Option<PortRef>;

    fn output_bus_input(&self, bus: usize) -> Option<PortRef>;

    fn output_voltage_input(&self, bus: usize) -> Option<PortRef>;

    fn oscilloscope_input(&self, axis: ScopeAxis) -> Option<PortRef>;

    /// Feed `from` into a bus's level CV. Returns false if the bus is unknown
    /// or the link could not be made.
    fn connect_output_level_cv(&mut self, bus: usize, from: PortRef) -> bool;

    fn disconnect_output_level_cv(&mut self, bus: usize, from: PortRef);

    fn connect(&mut self, from: PortRef, to: PortRef) -> Result<(), GraphError>;

    fn disconnect(&mut self, from: PortRef, to: PortRef) -> Result<(), GraphError>;

    /// Move a parameter to `value` over `ramp_seconds`.
    fn set_param(
        &mut self,
        node: NodeHandle,
        param: Param,
        value: f32,
        ramp_seconds: f32,
    ) -> Result<(), GraphError>;

    /// Drop a node and every wire touching it once `fade_seconds` have passed.
    fn release(&mut self, node: NodeHandle, fade_seconds: f32) -> Result<(), GraphError>;
}
