//! The instrument's two built-in matrices.
//!
//! Both panels are 63 rows by 67 columns. Rows are numbered from 67 and
//! columns from 1, as printed on the front panel.
//!
//! Audio matrix (panel 5):
//!
//!   rows  67-74    input amplifiers 1-8
//!   rows  75-82    output buses 1-8 (feedback)
//!   rows  83-84    noise generators 1-2
//!   rows  86-109   oscillators 1-12, two rows each
//!   cols   1-8     output buses 1-8
//!   cols   9-20    oscillator hard sync 1-12
//!   cols  57-58    oscilloscope Y, X
//!
//! Control matrix (panel 6):
//!
//!   rows  67-68    noise generators 1-2
//!   rows  69-76    input amplifiers 1-8
//!   rows  77-100   oscillators 1-12, two rows each
//!   rows 101-108   output buses 1-8
//!   cols   1-12    oscillator frequency CV 1-12
//!   cols  13-20    output level CV 1-8
//!   cols  21-28    output voltage inputs 1-8
//!   cols  29-30    oscilloscope Y, X
//!
//! Everything else is a physical pin with nothing behind it.

use super::{Blueprint, DestinationGroup, DestinationSlot, SourceGroup, SourceSlot};

pub const ROWS: usize = 63;
pub const COLS: usize = 67;
pub const ROW_BASE: u32 = 67;
pub const COL_BASE: u32 = 1;

pub const OSCILLATORS: usize = 12;
pub const NOISE_GENERATORS: usize = 2;
pub const INPUT_AMPLIFIERS: usize = 8;
pub const OUTPUT_BUSES: usize = 8;

fn sources(start: u32, group: SourceGroup, count: usize) -> SourceSlot {
    SourceSlot {
        start,
        group,
        first: 0,
        count,
    }
}

fn destinations(start: u32, group: DestinationGroup, count: usize) -> DestinationSlot {
    DestinationSlot {
        start,
        group,
        first: 0,
        count,
        rf: None,
    }
}

pub fn audio_panel() -> Blueprint {
    Blueprint {
        name: "panel 5 (audio)".into(),
        rows: ROWS,
        cols: COLS,
        row_base: ROW_BASE,
        col_base: COL_BASE,
        hidden_rows: vec![85],
        hidden_cols: vec![],
        sources: vec![
            sources(67, SourceGroup::InputAmplifiers, INPUT_AMPLIFIERS),
            sources(75, SourceGroup::OutputBuses, OUTPUT_BUSES),
            sources(83, SourceGroup::NoiseGenerators, NOISE_GENERATORS),
            sources(86, SourceGroup::Oscillators, OSCILLATORS),
        ],
        destinations: vec![
            destinations(1, DestinationGroup::OutputBuses, OUTPUT_BUSES),
            destinations(9, DestinationGroup::OscillatorHardSync, OSCILLATORS),
            destinations(57, DestinationGroup::Oscilloscope, 2),
        ],
    }
}

pub fn control_panel() -> Blueprint {
    Blueprint {
        name: "panel 6 (control)".into(),
        rows: ROWS,
        cols: COLS,
        row_base: ROW_BASE,
        col_base: COL_BASE,
        hidden_rows: vec![],
        hidden_cols: vec![],
        sources: vec![
            sources(67, SourceGroup::NoiseGenerators, NOISE_GENERATORS),
            sources(69, SourceGroup::InputAmplifiers, INPUT_AMPLIFIERS),
            sources(77, SourceGroup::Oscillators, OSCILLATORS),
            sources(101, SourceGroup::OutputBuses, OUTPUT_BUSES),
        ],
        destinations: vec![
            destinations(1, DestinationGroup::OscillatorFreqCv, OSCILLATORS),
            destinations(13, DestinationGroup::OutputLevelCv, OUTPUT_BUSES),
            destinations(21, DestinationGroup::OutputVoltageInputs, OUTPUT_BUSES),
            destinations(29, DestinationGroup::Oscilloscope, 2),
        ],
    }
}
