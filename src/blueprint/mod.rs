//! Declarative description of a patch matrix.
//!
//! A blueprint says how big the grid is, how physical pin indices map to the
//! instrument's own numbering, and which row and column ranges are wired to
//! which modules. [`compile`] turns it into the lookup tables the patch bay
//! uses at runtime.

mod compile;
pub mod panels;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::BlueprintError;

pub use compile::{compile, CompiledMapping};

/// Which half of an oscillator's outputs a row carries.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OscChannel {
    /// Sine + sawtooth mix (output 0).
    SineSaw,
    /// Triangle + pulse mix (output 1).
    TriPulse,
}

impl OscChannel {
    pub fn output_port(self) -> usize {
        match self {
            OscChannel::SineSaw => 0,
            OscChannel::TriPulse => 1,
        }
    }
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScopeAxis {
    Y,
    X,
}

/// What a matrix row carries. Identity only, never an audio handle.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Source {
    OscillatorChannel { osc: usize, channel: OscChannel },
    NoiseGenerator { index: usize },
    InputAmplifier { channel: usize },
    OutputBus { bus: usize },
}

impl Source {
    pub fn label(&self) -> String {
        match self {
            Source::OscillatorChannel { osc, channel } => match channel {
                OscChannel::SineSaw => format!("OSC {} SIN/SAW", osc + 1),
                OscChannel::TriPulse => format!("OSC {} TRI/PUL", osc + 1),
            },
            Source::NoiseGenerator { index } => format!("NOISE {}", index + 1),
            Source::InputAmplifier { channel } => format!("INPUT {}", channel + 1),
            Source::OutputBus { bus } => format!("BUS {}", bus + 1),
        }
    }
}

/// Where a matrix column delivers its signal.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DestinationKind {
    OutputBus { bus: usize },
    Oscilloscope { axis: ScopeAxis },
    OscillatorHardSync { osc: usize },
    OscillatorFreqCv { osc: usize },
    OutputLevelCv { bus: usize },
    OutputVoltageInput { bus: usize },
}

impl DestinationKind {
    pub fn label(&self) -> String {
        match self {
            DestinationKind::OutputBus { bus } => format!("BUS {}", bus + 1),
            DestinationKind::Oscilloscope { axis } => match axis {
                ScopeAxis::Y => "SCOPE Y".to_string(),
                ScopeAxis::X => "SCOPE X".to_string(),
            },
            DestinationKind::OscillatorHardSync { osc } => format!("OSC {} SYNC", osc + 1),
            DestinationKind::OscillatorFreqCv { osc } => format!("OSC {} FREQ", osc + 1),
            DestinationKind::OutputLevelCv { bus } => format!("BUS {} LEVEL", bus + 1),
            DestinationKind::OutputVoltageInput { bus } => format!("BUS {} VOLTAGE", bus + 1),
        }
    }
}

/// A destination plus an optional feedback-resistance override (ohms).
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Destination {
    pub kind: DestinationKind,
    pub rf: Option<f32>,
}

impl Destination {
    pub fn new(kind: DestinationKind) -> Self {
        Self { kind, rf: None }
    }
}

/// Module family assigned to a run of rows.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceGroup {
    /// Two rows per oscillator: sine/saw then tri/pulse.
    Oscillators,
    NoiseGenerators,
    InputAmplifiers,
    OutputBuses,
}

impl SourceGroup {
    /// Rows consumed per module.
    pub fn stride(self) -> usize {
        match self {
            SourceGroup::Oscillators => 2,
            _ => 1,
        }
    }

    /// Source carried by the `offset`-th row of a slot starting at module `first`.
    pub fn source_at(self, first: usize, offset: usize) -> Source {
        let index = first.saturating_add(offset / self.stride());
        match self {
            SourceGroup::Oscillators => Source::OscillatorChannel {
                osc: index,
                channel: if offset % 2 == 0 {
                    OscChannel::SineSaw
                } else {
                    OscChannel::TriPulse
                },
            },
            SourceGroup::NoiseGenerators => Source::NoiseGenerator { index },
            SourceGroup::InputAmplifiers => Source::InputAmplifier { channel: index },
            SourceGroup::OutputBuses => Source::OutputBus { bus: index },
        }
    }
}

/// Module family assigned to a run of columns.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationGroup {
    OutputBuses,
    /// Y then X.
    Oscilloscope,
    OscillatorHardSync,
    OscillatorFreqCv,
    OutputLevelCv,
    OutputVoltageInputs,
}

impl DestinationGroup {
    pub fn kind_at(self, index: usize) -> DestinationKind {
        match self {
            DestinationGroup::OutputBuses => DestinationKind::OutputBus { bus: index },
            DestinationGroup::Oscilloscope => DestinationKind::Oscilloscope {
                axis: if index % 2 == 0 { ScopeAxis::Y } else { ScopeAxis::X },
            },
            DestinationGroup::OscillatorHardSync => {
                DestinationKind::OscillatorHardSync { osc: index }
            }
            DestinationGroup::OscillatorFreqCv => DestinationKind::OscillatorFreqCv { osc: index },
            DestinationGroup::OutputLevelCv => DestinationKind::OutputLevelCv { bus: index },
            DestinationGroup::OutputVoltageInputs => {
                DestinationKind::OutputVoltageInput { bus: index }
            }
        }
    }
}

/// `count` modules of one family, starting at canonical row `start`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSlot {
    pub start: u32,
    pub group: SourceGroup,
    pub first: usize,
    pub count: usize,
}

impl SourceSlot {
    pub fn rows(&self) -> usize {
        self.count.saturating_mul(self.group.stride())
    }
}

/// `count` destinations of one family, starting at canonical column `start`.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct DestinationSlot {
    pub start: u32,
    pub group: DestinationGroup,
    pub first: usize,
    pub count: usize,
    #[cfg_attr(feature = "serde", serde(default))]
    pub rf: Option<f32>,
}

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Blueprint {
    pub name: String,
    pub rows: usize,
    pub cols: usize,
    /// Canonical number of physical row 0.
    pub row_base: u32,
    /// Canonical number of physical column 0.
    pub col_base: u32,
    /// Canonical rows that exist physically but carry nothing.
    #[cfg_attr(feature = "serde", serde(default))]
    pub hidden_rows: Vec<u32>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub hidden_cols: Vec<u32>,
    pub sources: Vec<SourceSlot>,
    pub destinations: Vec<DestinationSlot>,
}

impl Blueprint {
    /// Physical row index of a canonical row number, if it is on the grid.
    pub fn physical_row(&self, canonical: u32) -> Option<usize> {
        physical(canonical, self.row_base, self.rows)
    }

    pub fn physical_col(&self, canonical: u32) -> Option<usize> {
        physical(canonical, self.col_base, self.cols)
    }

    /// Check that every slot lies on the grid and no cell is assigned twice.
    pub fn validate(&self) -> Result<(), BlueprintError> {
        if self.rows == 0 || self.cols == 0 {
            return Err(BlueprintError::EmptyGrid(self.name.clone()));
        }

        let mut rows_taken = vec![false; self.rows];
        for slot in &self.sources {
            let start = self.physical_row(slot.start).ok_or(BlueprintError::SlotOutOfRange {
                axis: "row",
                start: slot.start,
                base: self.row_base,
                size: self.rows,
            })?;
            claim(&mut rows_taken, start, slot.rows(), "row", slot.start, self.row_base)?;
        }

        let mut cols_taken = vec![false; self.cols];
        for slot in &self.destinations {
            let start = self.physical_col(slot.start).ok_or(BlueprintError::SlotOutOfRange {
                axis: "column",
                start: slot.start,
                base: self.col_base,
                size: self.cols,
            })?;
            claim(&mut cols_taken, start, slot.count, "column", slot.start, self.col_base)?;
        }

        Ok(())
    }

    #[cfg(feature = "serde")]
    pub fn from_ron(text: &str) -> Result<Self, BlueprintError> {
        let blueprint: Blueprint = ron::from_str(text)?;
        blueprint.validate()?;
        Ok(blueprint)
    }
}

fn physical(canonical: u32, base: u32, size: usize) -> Option<usize> {
    let index = canonical.checked_sub(base)? as usize;
    (index < size).then_some(index)
}

fn claim(
    taken: &mut [bool],
    start: usize,
    len: usize,
    axis: &'static str,
    canonical_start: u32,
    base: u32,
) -> Result<(), BlueprintError> {
    let end = start
        .checked_add(len)
        .filter(|&end| end <= taken.len())
        .ok_or(BlueprintError::SlotOutOfRange {
            axis,
            start: canonical_start,
            base,
            size: taken.len(),
        })?;
    for index in start..end {
        if std::mem::replace(&mut taken[index], true) {
            return Err(BlueprintError::Overlap { axis, index });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tiny() -> Blueprint {
        Blueprint {
            name: "tiny".into(),
            rows: 4,
            cols: 3,
            row_base: 10,
            col_base: 1,
            hidden_rows: vec![],
            hidden_cols: vec![],
            sources: vec![SourceSlot {
                start: 10,
                group: SourceGroup::Oscillators,
                first: 0,
                count: 2,
            }],
            destinations: vec![DestinationSlot {
                start: 1,
                group: DestinationGroup::OutputBuses,
                first: 0,
                count: 3,
                rf: None,
            }],
        }
    }

    #[test]
    fn test_oscillator_rows_alternate_channels() {
        let group = SourceGroup::Oscillators;
        assert_eq!(
            group.source_at(4, 0),
            Source::OscillatorChannel { osc: 4, channel: OscChannel::SineSaw }
        );
        assert_eq!(
            group.source_at(4, 3),
            Source::OscillatorChannel { osc: 5, channel: OscChannel::TriPulse }
        );
    }

    #[test]
    fn test_valid_blueprint_passes() {
        assert!(tiny().validate().is_ok());
    }

    #[test]
    fn test_slot_past_grid_edge_is_rejected() {
        let mut bp = tiny();
        bp.sources[0].count = 3; // six rows on a four-row grid
        assert!(matches!(
            bp.validate(),
            Err(BlueprintError::SlotOutOfRange { axis: "row", .. })
        ));
    }

    #[test]
    fn test_huge_slot_count_is_rejected() {
        let mut bp = tiny();
        bp.sources[0].count = usize::MAX;
        assert!(matches!(
            bp.validate(),
            Err(BlueprintError::SlotOutOfRange { axis: "row", .. })
        ));

        let mut bp = tiny();
        bp.destinations[0].count = usize::MAX;
        assert!(matches!(
            bp.validate(),
            Err(BlueprintError::SlotOutOfRange { axis: "column", .. })
        ));
    }

    #[test]
    fn test_slot_below_base_is_rejected() {
        let mut bp = tiny();
        bp.destinations[0].start = 0;
        assert!(bp.validate().is_err());
    }

    #[test]
    fn test_overlap_is_rejected() {
        let mut bp = tiny();
        bp.destinations[0].count = 2;
        bp.destinations.push(DestinationSlot {
            start: 2,
            group: DestinationGroup::Oscilloscope,
            first: 0,
            count: 2,
            rf: None,
        });
        assert!(matches!(
            bp.validate(),
            Err(BlueprintError::Overlap { axis: "column", index: 1 })
        ));
    }

    #[test]
    fn test_empty_grid_is_rejected() {
        let mut bp = tiny();
        bp.rows = 0;
        assert!(matches!(bp.validate(), Err(BlueprintError::EmptyGrid(_))));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_ron_round_trip() {
        let bp = panels::control_panel();
        let text = ron::ser::to_string_pretty(&bp, ron::ser::PrettyConfig::default()).unwrap();
        let parsed = Blueprint::from_ron(&text).unwrap();
        assert_eq!(parsed, bp);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_ron_with_huge_count_is_an_error() {
        let mut bp = tiny();
        bp.sources[0].count = usize::MAX / 2 + 1;
        let text = ron::ser::to_string_pretty(&bp, ron::ser::PrettyConfig::default()).unwrap();
        assert!(matches!(
            Blueprint::from_ron(&text),
            Err(BlueprintError::SlotOutOfRange { .. })
        ));
    }
}
