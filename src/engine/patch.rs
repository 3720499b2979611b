//! Whole-instrument snapshots: both matrices plus the oscillator knobs.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "serde")]
use crate::error::PatchError;
use crate::{matrix::PatchEntry, synth::OscillatorVoiceState};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct VoicePreset {
    pub index: usize,
    pub state: OscillatorVoiceState,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Patch {
    pub name: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub audio: Vec<PatchEntry>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub control: Vec<PatchEntry>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub oscillators: Vec<VoicePreset>,
    /// Output channel dials (0-10), by bus.
    #[cfg_attr(feature = "serde", serde(default))]
    pub output_levels: Vec<f32>,
}

#[cfg(feature = "serde")]
impl Patch {
    pub fn from_ron(text: &str) -> Result<Self, PatchError> {
        Ok(ron::from_str(text)?)
    }

    pub fn to_ron(&self) -> Result<String, PatchError> {
        Ok(ron::ser::to_string_pretty(
            self,
            ron::ser::PrettyConfig::default(),
        )?)
    }

    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self, PatchError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| PatchError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_ron(&text)
    }

    pub fn save(&self, path: impl AsRef<std::path::Path>) -> Result<(), PatchError> {
        let path = path.as_ref();
        std::fs::write(path, self.to_ron()?).map_err(|source| PatchError::Io {
            path: path.display().to_string(),
            source,
        })
    }
}
