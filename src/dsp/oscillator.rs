use std::f32::consts::TAU;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Multi-Waveform Oscillator
=========================

Each voice runs one phase accumulator and derives four shapes from it, the
way the instrument's oscillator cards do:

  sine      with a symmetry control that skews the positive and negative
            half cycles (0.5 = pure sine)
  sawtooth  rising ramp, -1 to +1
  triangle  symmetric, -1 to +1
  pulse     duty cycle set by the pulse width (0.5 = square)

The four shapes are mixed into two outputs, matching the two output sockets
on the hardware:

  output 0 = sine  · level_sine + saw   · level_saw
  output 1 = tri   · level_tri  + pulse · level_pulse

Hard sync: a rising zero crossing on the sync input resets the phase, so the
voice locks to the period of whatever is patched into it.

Pitch: the base frequency is offset in cents by the pitch input,

    f = base · 2^(cents / 1200)
*/

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Waveform {
    Sine,
    Saw,
    Triangle,
    Pulse,
}

impl Waveform {
    pub const ALL: [Waveform; 4] = [
        Waveform::Sine,
        Waveform::Saw,
        Waveform::Triangle,
        Waveform::Pulse,
    ];

    pub fn index(self) -> usize {
        match self {
            Waveform::Sine => 0,
            Waveform::Saw => 1,
            Waveform::Triangle => 2,
            Waveform::Pulse => 3,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Waveform::Sine => "SINE",
            Waveform::Saw => "SAW",
            Waveform::Triangle => "TRI",
            Waveform::Pulse => "PULSE",
        }
    }
}

/// All four raw shapes for one sample.
#[derive(Debug, Clone, Copy)]
pub struct WaveSet {
    pub sine: f32,
    pub saw: f32,
    pub triangle: f32,
    pub pulse: f32,
}

impl WaveSet {
    pub fn get(&self, waveform: Waveform) -> f32 {
        match waveform {
            Waveform::Sine => self.sine,
            Waveform::Saw => self.saw,
            Waveform::Triangle => self.triangle,
            Waveform::Pulse => self.pulse,
        }
    }
}

/// Convert a pitch offset in cents to a frequency ratio.
#[inline]
pub fn cents_to_ratio(cents: f32) -> f32 {
    2.0_f32.powf(cents / 1200.0)
}

pub struct MultiOscillator {
    phase: f32,
    last_sync: f32,
}

impl MultiOscillator {
    pub fn new() -> Self {
        Self {
            phase: 0.0,
            last_sync: 0.0,
        }
    }

    pub fn phase(&self) -> f32 {
        self.phase
    }

    /// Reset the phase when `sync` crosses zero going up.
    #[inline]
    pub fn sync(&mut self, sync: f32) {
        if self.last_sync <= 0.0 && sync > 0.0 {
            self.phase = 0.0;
        }
        self.last_sync = sync;
    }

    /// Evaluate all shapes at the current phase, then advance.
    #[inline]
    pub fn next(
        &mut self,
        frequency: f32,
        sample_rate: f32,
        pulse_width: f32,
        symmetry: f32,
    ) -> WaveSet {
        let p = self.phase;
        let set = WaveSet {
            sine: skewed_sine(p, symmetry),
            saw: 2.0 * p - 1.0,
            triangle: 1.0 - 4.0 * (p - 0.5).abs(),
            pulse: if p < pulse_width.clamp(0.01, 0.99) {
                1.0
            } else {
                -1.0
            },
        };

        let nyquist = sample_rate * 0.5;
        self.phase += frequency.clamp(0.0, nyquist) / sample_rate;
        if self.phase >= 1.0 {
            self.phase -= self.phase.floor();
        }

        set
    }
}

impl Default for MultiOscillator {
    fn default() -> Self {
        Self::new()
    }
}

/// Sine whose positive half occupies `symmetry` of the period.
#[inline]
fn skewed_sine(phase: f32, symmetry: f32) -> f32 {
    let s = symmetry.clamp(0.01, 0.99);
    let warped = if phase < s {
        0.5 * phase / s
    } else {
        0.5 + 0.5 * (phase - s) / (1.0 - s)
    };
    (warped * TAU).sin()
}
