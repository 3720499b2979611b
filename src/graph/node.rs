//! Node kinds the reference renderer knows how to run.
//!
//! Every node is built on the control thread, boxed, and moved into the
//! renderer through the command ring. Once inside, it only ever touches its
//! own state and the buffers the renderer hands it.

use crate::{
    dsp::{
        distortion::headroom_clip,
        filter::RcLowpass,
        noise::NoiseSource,
        oscillator::{cents_to_ratio, MultiOscillator},
        slew::ThermalSlew,
        smooth::LinearRamp,
        vca::{dial_to_voltage, vca_voltage_to_gain, VOLTS_PER_UNIT},
    },
    graph::port::{
        NoiseParams, OscillatorParams, Param, SlewParams, BUS_AUDIO_INPUT, BUS_LEVEL_CV_INPUT,
        BUS_VOLTAGE_INPUT, OSC_PITCH_INPUT, OSC_SINE_SAW, OSC_SYNC_INPUT, OSC_TRI_PULSE,
    },
};

/// Most input ports any node kind has.
pub const MAX_INPUTS: usize = 3;

/// Dial position output buses start at.
pub const DEFAULT_BUS_DIAL: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Oscillator,
    Noise,
    InputAmplifier,
    OutputBus,
    Oscilloscope,
    Filter,
    Gain,
    Slew,
    Clip,
}

impl NodeKind {
    pub const fn inputs(self) -> usize {
        match self {
            NodeKind::Oscillator => 2,
            NodeKind::Noise | NodeKind::InputAmplifier => 0,
            NodeKind::OutputBus => 3,
            NodeKind::Oscilloscope => 2,
            NodeKind::Filter | NodeKind::Gain | NodeKind::Slew | NodeKind::Clip => 1,
        }
    }

    pub const fn outputs(self) -> usize {
        match self {
            NodeKind::Oscillator => 2,
            NodeKind::Oscilloscope => 0,
            _ => 1,
        }
    }

    /// Whether `param` can be set on this kind of node.
    pub fn accepts(self, param: Param) -> bool {
        matches!(
            (self, param),
            (NodeKind::Gain, Param::Gain)
                | (NodeKind::Filter, Param::Cutoff)
                | (NodeKind::Oscillator, Param::Frequency)
                | (NodeKind::Oscillator, Param::Level(_))
                | (NodeKind::Oscillator, Param::PulseWidth)
                | (NodeKind::Oscillator, Param::SineSymmetry)
                | (NodeKind::Noise, Param::Colour)
                | (NodeKind::Noise, Param::OutputLevel)
                | (NodeKind::OutputBus, Param::OutputLevel)
        )
    }
}

pub struct OscillatorNode {
    core: MultiOscillator,
    frequency: LinearRamp,
    levels: [LinearRamp; 4],
    pulse_width: LinearRamp,
    symmetry: LinearRamp,
}

impl OscillatorNode {
    pub fn new(params: &OscillatorParams) -> Self {
        Self {
            core: MultiOscillator::new(),
            frequency: LinearRamp::new(params.frequency),
            levels: params.levels.map(LinearRamp::new),
            pulse_width: LinearRamp::new(params.pulse_width),
            symmetry: LinearRamp::new(params.sine_symmetry),
        }
    }

    fn process(
        &mut self,
        inputs: &[Vec<f32>],
        outputs: &mut [Vec<f32>],
        frames: usize,
        sample_rate: f32,
    ) {
        let (sine_saw, tri_pulse) = outputs.split_at_mut(OSC_TRI_PULSE);
        let sine_saw = &mut sine_saw[OSC_SINE_SAW];
        let tri_pulse = &mut tri_pulse[0];

        for i in 0..frames {
            self.core.sync(inputs[OSC_SYNC_INPUT][i]);

            let cents = inputs[OSC_PITCH_INPUT][i];
            let frequency = self.frequency.next() * cents_to_ratio(cents);
            let waves = self.core.next(
                frequency,
                sample_rate,
                self.pulse_width.next(),
                self.symmetry.next(),
            );

            let [sine, saw, tri, pulse] = &mut self.levels;
            sine_saw[i] = waves.sine * sine.next() + waves.saw * saw.next();
            tri_pulse[i] = waves.triangle * tri.next() + waves.pulse * pulse.next();
        }
    }

    fn set_param(&mut self, param: Param, value: f32, ramp: u32) {
        match param {
            Param::Frequency => self.frequency.ramp_to(value.max(0.0), ramp),
            Param::Level(waveform) => {
                self.levels[waveform.index()].ramp_to(value.clamp(0.0, 1.0), ramp)
            }
            Param::PulseWidth => self.pulse_width.ramp_to(value.clamp(0.0, 1.0), ramp),
            Param::SineSymmetry => self.symmetry.ramp_to(value.clamp(0.0, 1.0), ramp),
            _ => {}
        }
    }
}

pub struct NoiseNode {
    source: NoiseSource,
    colour: LinearRamp,
    level: LinearRamp,
}

impl NoiseNode {
    pub fn new(params: &NoiseParams) -> Self {
        Self {
            source: NoiseSource::with_seed(params.seed),
            colour: LinearRamp::new(params.colour),
            level: LinearRamp::new(params.level),
        }
    }
}

/// Output channel: VCA on the audio input, then the voltage input added on.
pub struct OutputBusNode {
    dial: LinearRamp,
}

impl OutputBusNode {
    pub fn new() -> Self {
        Self {
            dial: LinearRamp::new(DEFAULT_BUS_DIAL),
        }
    }

    fn process(&mut self, inputs: &[Vec<f32>], out: &mut [f32]) {
        let audio = &inputs[BUS_AUDIO_INPUT];
        let level_cv = &inputs[BUS_LEVEL_CV_INPUT];
        let voltage = &inputs[BUS_VOLTAGE_INPUT];
        for (i, sample) in out.iter_mut().enumerate() {
            let control = dial_to_voltage(self.dial.next()) + level_cv[i] * VOLTS_PER_UNIT;
            *sample = audio[i] * vca_voltage_to_gain(control) + voltage[i];
        }
    }
}

impl Default for OutputBusNode {
    fn default() -> Self {
        Self::new()
    }
}

pub enum RtNode {
    Oscillator(OscillatorNode),
    Noise(NoiseNode),
    /// Output buffer is filled from outside before each block.
    InputAmplifier,
    OutputBus(OutputBusNode),
    /// Inputs are tapped by the renderer, nothing is produced.
    Oscilloscope,
    Filter(RcLowpass),
    Gain(LinearRamp),
    Slew(ThermalSlew),
    Clip { knee: f32, limit: f32 },
}

impl RtNode {
    pub fn oscillator(params: &OscillatorParams) -> Self {
        RtNode::Oscillator(OscillatorNode::new(params))
    }

    pub fn noise(params: &NoiseParams) -> Self {
        RtNode::Noise(NoiseNode::new(params))
    }

    pub fn filter(cutoff_hz: f32) -> Self {
        RtNode::Filter(RcLowpass::new(cutoff_hz))
    }

    pub fn gain(gain: f32) -> Self {
        RtNode::Gain(LinearRamp::new(gain))
    }

    pub fn slew(params: &SlewParams, sample_rate: f32) -> Self {
        RtNode::Slew(ThermalSlew::new(
            sample_rate,
            params.fast_tau,
            params.rise_tau,
            params.fall_tau,
            params.threshold,
        ))
    }

    pub fn clip(knee: f32, limit: f32) -> Self {
        RtNode::Clip { knee, limit }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            RtNode::Oscillator(_) => NodeKind::Oscillator,
            RtNode::Noise(_) => NodeKind::Noise,
            RtNode::InputAmplifier => NodeKind::InputAmplifier,
            RtNode::OutputBus(_) => NodeKind::OutputBus,
            RtNode::Oscilloscope => NodeKind::Oscilloscope,
            RtNode::Filter(_) => NodeKind::Filter,
            RtNode::Gain(_) => NodeKind::Gain,
            RtNode::Slew(_) => NodeKind::Slew,
            RtNode::Clip { .. } => NodeKind::Clip,
        }
    }

    /// Render `frames` samples. `inputs` holds one summed buffer per input
    /// port, `outputs` one buffer per output port.
    pub fn process(
        &mut self,
        inputs: &[Vec<f32>],
        outputs: &mut [Vec<f32>],
        frames: usize,
        sample_rate: f32,
    ) {
        match self {
            RtNode::Oscillator(osc) => osc.process(inputs, outputs, frames, sample_rate),
            RtNode::Noise(noise) => {
                for sample in &mut outputs[0][..frames] {
                    *sample = noise.source.next(noise.colour.next()) * noise.level.next();
                }
            }
            RtNode::InputAmplifier | RtNode::Oscilloscope => {}
            RtNode::OutputBus(bus) => bus.process(inputs, &mut outputs[0][..frames]),
            RtNode::Filter(filter) => {
                filter.process(&inputs[0][..frames], &mut outputs[0][..frames], sample_rate)
            }
            RtNode::Gain(gain) => {
                for (out, &x) in outputs[0][..frames].iter_mut().zip(&inputs[0][..frames]) {
                    *out = x * gain.next();
                }
            }
            RtNode::Slew(slew) => {
                for (out, &x) in outputs[0][..frames].iter_mut().zip(&inputs[0][..frames]) {
                    *out = slew.next_sample(x);
                }
            }
            RtNode::Clip { knee, limit } => {
                for (out, &x) in outputs[0][..frames].iter_mut().zip(&inputs[0][..frames]) {
                    *out = headroom_clip(x, *knee, *limit);
                }
            }
        }
    }

    /// Apply a parameter change. Parameters the node does not have are ignored.
    pub fn set_param(&mut self, param: Param, value: f32, ramp: u32) {
        match (self, param) {
            (RtNode::Oscillator(osc), param) => osc.set_param(param, value, ramp),
            (RtNode::Noise(noise), Param::Colour) => {
                noise.colour.ramp_to(value.clamp(0.0, 1.0), ramp)
            }
            (RtNode::Noise(noise), Param::OutputLevel) => noise.level.ramp_to(value.max(0.0), ramp),
            (RtNode::OutputBus(bus), Param::OutputLevel) => {
                bus.dial.ramp_to(value.clamp(0.0, 10.0), ramp)
            }
            (RtNode::Filter(filter), Param::Cutoff) => filter.ramp_cutoff(value, ramp),
            (RtNode::Gain(gain), Param::Gain) => gain.ramp_to(value, ramp),
            _ => {}
        }
    }
}
