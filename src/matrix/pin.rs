//! Electrical model of a patch pin.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/*
Virtual-Earth Pins
==================

Every matrix column feeds the inverting input of a summing amplifier. A pin
pushed into the matrix drops a resistor between the row (source) and that
virtual-earth node, so the signal arriving at the destination is scaled by

    gain = Rf / Rpin

where Rf is the destination's feedback resistor (100 kΩ for most inputs).
Pins are colour coded by their resistor:

  colour   Rpin      tolerance   typical use
  ------   -------   ---------   --------------------------------
  white    100 kΩ    ±10 %       general audio, unity gain
  grey     100 kΩ    ±0.5 %      precision, pitch control
  green     68 kΩ    ±10 %       slight boost
  red      2.7 kΩ    ±10 %       large boost, envelope/CV amplification

Each pin also sees the bus's stray capacitance (about 100 pF), which turns
the resistor into an RC low-pass. See `dsp/filter.rs`.

Tolerance
---------

Real resistors are never exactly their nominal value. With tolerance
enabled, each pin position gets its own fixed deviation:

    Rpin' = Rpin · (1 + tol · (2u - 1))

where u in [0, 1) is a pure function of the pin's seed. The same pin
position therefore always gets the same gain, across runs and reloads.
*/

/// Stray capacitance of a matrix bus, in farads.
pub const BUS_CAPACITANCE: f32 = 100e-12;

/// Feedback resistance of a standard destination input, in ohms.
pub const STANDARD_RF: f32 = 100_000.0;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum PinColor {
    #[default]
    White,
    Grey,
    Green,
    Red,
}

impl PinColor {
    pub const ALL: [PinColor; 4] = [
        PinColor::White,
        PinColor::Grey,
        PinColor::Green,
        PinColor::Red,
    ];

    /// Series resistance in ohms.
    pub const fn resistance(self) -> f32 {
        match self {
            PinColor::White => 100_000.0,
            PinColor::Grey => 100_000.0,
            PinColor::Green => 68_000.0,
            PinColor::Red => 2_700.0,
        }
    }

    /// Relative resistor tolerance (0.1 = ±10 %).
    pub const fn tolerance(self) -> f32 {
        match self {
            PinColor::Grey => 0.005,
            PinColor::White | PinColor::Green | PinColor::Red => 0.10,
        }
    }

    /// Corner frequency of the pin resistor against the bus capacitance.
    pub fn cutoff_hz(self) -> f32 {
        1.0 / (std::f32::consts::TAU * self.resistance() * BUS_CAPACITANCE)
    }

    pub fn next(self) -> Self {
        match self {
            PinColor::White => PinColor::Grey,
            PinColor::Grey => PinColor::Green,
            PinColor::Green => PinColor::Red,
            PinColor::Red => PinColor::White,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PinColor::White => "WHITE",
            PinColor::Grey => "GREY",
            PinColor::Green => "GREEN",
            PinColor::Red => "RED",
        }
    }
}

/// Seed for a pin's tolerance deviation, from its canonical coordinates.
#[inline]
pub fn tolerance_seed(canonical_row: u32, canonical_col: u32) -> u64 {
    canonical_row as u64 * 1000 + canonical_col as u64
}

/// Uniform value in [0, 1) derived only from `seed` (splitmix64).
#[inline]
pub fn seeded_unit(seed: u64) -> f32 {
    let mut z = seed.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    ((z >> 40) as f32) / ((1u64 << 24) as f32)
}

/// Virtual-earth gain of a pin feeding a destination with feedback `rf`.
///
/// With `tolerance_seed` set, the pin resistance is perturbed by the
/// colour's tolerance using a deviation fixed by the seed.
pub fn gain_of(color: PinColor, rf: f32, tolerance_seed: Option<u64>) -> f32 {
    let nominal = color.resistance();
    let resistance = match tolerance_seed {
        Some(seed) => {
            let deviation = color.tolerance() * (2.0 * seeded_unit(seed) - 1.0);
            nominal * (1.0 + deviation)
        }
        None => nominal,
    };
    rf / resistance
}
