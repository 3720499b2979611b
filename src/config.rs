//! Engine configuration.
//!
//! Everything has a sensible default, so an empty RON document (`()`) is a
//! valid configuration. Missing fields fall back to their defaults.
//!
//! ```ron
//! (
//!     audio: (matrix_gain: 0.8, tolerance: true),
//!     control: (
//!         default_color: Grey,
//!         pin_overrides: [(row: 77, col: 3, gain: 2.0)],
//!     ),
//!     cv: (soft_clip: None),
//! )
//! ```

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "serde")]
use crate::error::ConfigError;
use crate::{
    blueprint::panels,
    graph::SlewParams,
    matrix::pin::{PinColor, STANDARD_RF},
};

/// A fixed gain for one pin, in canonical coordinates.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PinOverride {
    pub row: u32,
    pub col: u32,
    pub gain: f32,
}

/// Gain shaping for one matrix.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixConfig {
    /// Colour used when a toggle does not name one.
    pub default_color: PinColor,
    /// Feedback resistance of destinations without their own, in ohms.
    pub standard_rf: f32,
    pub matrix_gain: f32,
    /// Extra gain per canonical row.
    pub row_gains: BTreeMap<u32, f32>,
    /// Extra gain per canonical column.
    pub col_gains: BTreeMap<u32, f32>,
    pub pin_overrides: Vec<PinOverride>,
    pub min_gain: f32,
    pub max_gain: f32,
    /// Ceiling for red pins, which are allowed to amplify hard.
    pub red_max_gain: f32,
    /// Give each pin position its own fixed resistor deviation.
    pub tolerance: bool,
}

impl Default for MatrixConfig {
    fn default() -> Self {
        Self {
            default_color: PinColor::White,
            standard_rf: STANDARD_RF,
            matrix_gain: 1.0,
            row_gains: BTreeMap::new(),
            col_gains: BTreeMap::new(),
            pin_overrides: Vec::new(),
            min_gain: 0.0,
            max_gain: 8.0,
            red_max_gain: 50.0,
            tolerance: false,
        }
    }
}

impl MatrixConfig {
    pub fn override_for(&self, row: u32, col: u32) -> Option<f32> {
        self.pin_overrides
            .iter()
            .find(|o| o.row == row && o.col == col)
            .map(|o| o.gain)
    }

    pub fn row_gain(&self, row: u32) -> f32 {
        self.row_gains.get(&row).copied().unwrap_or(1.0)
    }

    pub fn col_gain(&self, col: u32) -> f32 {
        self.col_gains.get(&col).copied().unwrap_or(1.0)
    }
}

/// Lag of the exponential converter. Time constants in seconds, threshold
/// in digital units.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermalSlewConfig {
    pub fast_tau: f32,
    pub rise_tau: f32,
    pub fall_tau: f32,
    pub threshold: f32,
}

impl Default for ThermalSlewConfig {
    fn default() -> Self {
        Self {
            fast_tau: 0.0005,
            rise_tau: 0.015,
            fall_tau: 0.03,
            threshold: 0.25,
        }
    }
}

impl From<ThermalSlewConfig> for SlewParams {
    fn from(config: ThermalSlewConfig) -> Self {
        SlewParams {
            fast_tau: config.fast_tau,
            rise_tau: config.rise_tau,
            fall_tau: config.fall_tau,
            threshold: config.threshold,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SoftClipConfig {
    pub knee: f32,
    pub limit: f32,
}

impl Default for SoftClipConfig {
    fn default() -> Self {
        Self {
            knee: 1.0,
            limit: 1.5,
        }
    }
}

/// Stages inserted between a frequency CV pin and the oscillator.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CvChainConfig {
    pub thermal_slew: Option<ThermalSlewConfig>,
    pub soft_clip: Option<SoftClipConfig>,
}

impl Default for CvChainConfig {
    fn default() -> Self {
        Self {
            thermal_slew: Some(ThermalSlewConfig::default()),
            soft_clip: Some(SoftClipConfig::default()),
        }
    }
}

/// Ramp durations in seconds.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RampConfig {
    pub color_change: f32,
    pub disconnect: f32,
    pub dormancy: f32,
    /// Knob moves (frequency, levels, dials).
    pub parameter: f32,
}

impl Default for RampConfig {
    fn default() -> Self {
        Self {
            color_change: 0.005,
            disconnect: 0.01,
            dormancy: 0.03,
            parameter: 0.02,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VoiceCounts {
    pub oscillators: usize,
    pub noise_generators: usize,
    pub input_amplifiers: usize,
    pub output_buses: usize,
}

impl Default for VoiceCounts {
    fn default() -> Self {
        Self {
            oscillators: panels::OSCILLATORS,
            noise_generators: panels::NOISE_GENERATORS,
            input_amplifiers: panels::INPUT_AMPLIFIERS,
            output_buses: panels::OUTPUT_BUSES,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub audio: MatrixConfig,
    pub control: MatrixConfig,
    pub cv: CvChainConfig,
    pub ramps: RampConfig,
    pub voices: VoiceCounts,
    /// Silence oscillators nothing is listening to.
    pub dormancy: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            audio: MatrixConfig::default(),
            control: MatrixConfig::default(),
            cv: CvChainConfig::default(),
            ramps: RampConfig::default(),
            voices: VoiceCounts::default(),
            dormancy: true,
        }
    }
}

#[cfg(feature = "serde")]
impl EngineConfig {
    pub fn from_ron(text: &str) -> Result<Self, ConfigError> {
        Ok(ron::from_str(text)?)
    }

    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron(&text)
    }

    pub fn to_ron(&self) -> Result<String, ConfigError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }
}
