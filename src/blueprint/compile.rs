use std::{collections::BTreeSet, ops::Range};

use super::{Blueprint, Destination, DestinationKind, Source};

/// Row and column lookup tables for one matrix.
///
/// Indices are physical (0-based grid positions). A cell is routable only if
/// both its row and its column resolve; everything else is hidden.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledMapping {
    pub rows: usize,
    pub cols: usize,
    pub row_base: u32,
    pub col_base: u32,
    pub row_map: Vec<Option<Source>>,
    pub col_map: Vec<Option<Destination>>,
    pub hidden_rows: BTreeSet<usize>,
    pub hidden_cols: BTreeSet<usize>,
}

/// Build the lookup tables for `blueprint`.
///
/// Never fails: slot cells that fall off the grid are skipped, and when two
/// slots claim the same cell the first declaration wins. Use
/// [`Blueprint::validate`] to reject such blueprints up front.
pub fn compile(blueprint: &Blueprint) -> CompiledMapping {
    let mut row_map: Vec<Option<Source>> = vec![None; blueprint.rows];
    let mut col_map: Vec<Option<Destination>> = vec![None; blueprint.cols];

    for slot in &blueprint.sources {
        let (start, base) = (slot.start as u64, blueprint.row_base as u64);
        for offset in on_grid(start, slot.rows(), base, blueprint.rows) {
            let row = (start + offset as u64 - base) as usize;
            if row_map[row].is_none() {
                row_map[row] = Some(slot.group.source_at(slot.first, offset));
            }
        }
    }

    for slot in &blueprint.destinations {
        let (start, base) = (slot.start as u64, blueprint.col_base as u64);
        for offset in on_grid(start, slot.count, base, blueprint.cols) {
            let col = (start + offset as u64 - base) as usize;
            if col_map[col].is_none() {
                col_map[col] = Some(Destination {
                    kind: slot.group.kind_at(slot.first.saturating_add(offset)),
                    rf: slot.rf,
                });
            }
        }
    }

    for row in blueprint.hidden_rows.iter().filter_map(|&r| blueprint.physical_row(r)) {
        row_map[row] = None;
    }
    for col in blueprint.hidden_cols.iter().filter_map(|&c| blueprint.physical_col(c)) {
        col_map[col] = None;
    }

    let hidden_rows = unassigned(&row_map);
    let hidden_cols = unassigned(&col_map);

    CompiledMapping {
        rows: blueprint.rows,
        cols: blueprint.cols,
        row_base: blueprint.row_base,
        col_base: blueprint.col_base,
        row_map,
        col_map,
        hidden_rows,
        hidden_cols,
    }
}

/// Offsets into a slot of `len` cells starting at canonical `start` that land
/// on a grid of `size` cells starting at canonical `base`.
fn on_grid(start: u64, len: usize, base: u64, size: usize) -> Range<usize> {
    let len = len as u64;
    let first = base.saturating_sub(start).min(len);
    let end = (base + size as u64).saturating_sub(start).min(len);
    first as usize..end.max(first) as usize
}

fn unassigned<T>(map: &[Option<T>]) -> BTreeSet<usize> {
    map.iter()
        .enumerate()
        .filter(|(_, entry)| entry.is_none())
        .map(|(index, _)| index)
        .collect()
}

impl CompiledMapping {
    pub fn contains(&self, row: usize, col: usize) -> bool {
        row < self.rows && col < self.cols
    }

    pub fn source(&self, row: usize) -> Option<&Source> {
        self.row_map.get(row)?.as_ref()
    }

    pub fn destination(&self, col: usize) -> Option<&Destination> {
        self.col_map.get(col)?.as_ref()
    }

    /// Both endpoints of a cell, if it is routable.
    pub fn endpoints(&self, row: usize, col: usize) -> Option<(Source, Destination)> {
        Some((*self.source(row)?, *self.destination(col)?))
    }

    pub fn row_of(&self, source: &Source) -> Option<usize> {
        self.row_map.iter().position(|s| s.as_ref() == Some(source))
    }

    pub fn col_of(&self, kind: &DestinationKind) -> Option<usize> {
        self.col_map
            .iter()
            .position(|d| d.as_ref().map(|d| &d.kind) == Some(kind))
    }

    /// Canonical (instrument) numbering of a physical cell.
    pub fn canonical(&self, row: usize, col: usize) -> (u32, u32) {
        (self.row_base + row as u32, self.col_base + col as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blueprint::{
        panels, DestinationGroup, DestinationSlot, OscChannel, SourceGroup, SourceSlot,
    };

    fn small() -> Blueprint {
        Blueprint {
            name: "small".into(),
            rows: 6,
            cols: 4,
            row_base: 67,
            col_base: 1,
            hidden_rows: vec![68],
            hidden_cols: vec![],
            sources: vec![
                SourceSlot {
                    start: 67,
                    group: SourceGroup::NoiseGenerators,
                    first: 0,
                    count: 2,
                },
                SourceSlot {
                    start: 69,
                    group: SourceGroup::Oscillators,
                    first: 3,
                    count: 1,
                },
            ],
            destinations: vec![
                DestinationSlot {
                    start: 1,
                    group: DestinationGroup::OscillatorFreqCv,
                    first: 0,
                    count: 2,
                    rf: Some(50_000.0),
                },
                DestinationSlot {
                    start: 4,
                    group: DestinationGroup::Oscilloscope,
                    first: 0,
                    count: 1,
                    rf: None,
                },
            ],
        }
    }

    #[test]
    fn test_slots_fill_maps() {
        let mapping = compile(&small());
        assert_eq!(mapping.source(0), Some(&Source::NoiseGenerator { index: 0 }));
        assert_eq!(
            mapping.source(3),
            Some(&Source::OscillatorChannel { osc: 3, channel: OscChannel::TriPulse })
        );
        assert_eq!(
            mapping.destination(1),
            Some(&Destination {
                kind: DestinationKind::OscillatorFreqCv { osc: 1 },
                rf: Some(50_000.0),
            })
        );
    }

    #[test]
    fn test_listed_and_uncovered_cells_are_hidden() {
        let mapping = compile(&small());
        // row 1 (canonical 68) is listed, rows 4-5 are uncovered
        assert_eq!(mapping.hidden_rows, BTreeSet::from([1, 4, 5]));
        // column 2 (canonical 3) is uncovered
        assert_eq!(mapping.hidden_cols, BTreeSet::from([2]));
        assert_eq!(mapping.source(1), None);
        assert_eq!(mapping.endpoints(1, 0), None);
    }

    #[test]
    fn test_first_declaration_wins() {
        let mut bp = small();
        bp.sources.push(SourceSlot {
            start: 67,
            group: SourceGroup::InputAmplifiers,
            first: 0,
            count: 1,
        });
        let mapping = compile(&bp);
        assert_eq!(mapping.source(0), Some(&Source::NoiseGenerator { index: 0 }));
    }

    #[test]
    fn test_cells_off_the_grid_are_ignored() {
        let mut bp = small();
        bp.destinations.push(DestinationSlot {
            start: 3,
            group: DestinationGroup::OutputBuses,
            first: 0,
            count: 10,
            rf: None,
        });
        let mapping = compile(&bp);
        assert_eq!(mapping.col_map.len(), 4);
        assert_eq!(
            mapping.destination(2).map(|d| d.kind),
            Some(DestinationKind::OutputBus { bus: 0 })
        );
    }

    #[test]
    fn test_huge_slot_stops_at_grid_edge() {
        let mut bp = small();
        bp.sources.push(SourceSlot {
            start: 66,
            group: SourceGroup::InputAmplifiers,
            first: 0,
            count: usize::MAX,
        });
        bp.destinations[1].count = usize::MAX;
        let mapping = compile(&bp);
        assert_eq!(mapping.row_map.len(), 6);
        // Rows the earlier slots already hold keep their sources; the first
        // free one, canonical 71, is the sixth cell of the new slot
        assert_eq!(mapping.source(0), Some(&Source::NoiseGenerator { index: 0 }));
        assert_eq!(mapping.source(4), Some(&Source::InputAmplifier { channel: 5 }));
        assert_eq!(
            mapping.destination(3).map(|d| d.kind),
            Some(DestinationKind::Oscilloscope { axis: crate::blueprint::ScopeAxis::Y })
        );
    }

    #[test]
    fn test_compile_is_deterministic() {
        for bp in [small(), panels::audio_panel(), panels::control_panel()] {
            assert_eq!(compile(&bp), compile(&bp));
        }
    }

    #[test]
    fn test_reverse_lookup() {
        let mapping = compile(&small());
        assert_eq!(mapping.row_of(&Source::NoiseGenerator { index: 0 }), Some(0));
        // hidden rows never resolve
        assert_eq!(mapping.row_of(&Source::NoiseGenerator { index: 1 }), None);
        assert_eq!(
            mapping.col_of(&DestinationKind::Oscilloscope { axis: crate::blueprint::ScopeAxis::Y }),
            Some(3)
        );
        assert_eq!(mapping.canonical(2, 3), (69, 4));
    }
}
