//! The patch bay: pins, their electrical model, and the live connections.

/*
Connection Lifecycle
====================

Pushing a pin at (row, col) builds a two-stage chain in the audio graph:

    source ──► RC filter ──► gain ──► destination
               (pin colour)  (pin gain)

The filter models the pin resistor against the bus capacitance, the gain
stage models the virtual-earth summing ratio. Both stages belong to the pin
and are released together when it is pulled.

Pulling a pin never cuts the signal: the gain stage ramps to zero first and
the graph only retires the stages once the ramp has run. Changing a pin's
colour retunes both stages in place, again with a short ramp.

A frequency CV pin pushed before the audio graph is running cannot be built
yet. It is parked as pending (with its colour) and replayed once the graph
signals readiness. Every other pin pushed too early simply reports failure.
*/

pub mod connection;
pub mod gain;
pub mod pin;

use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{
    blueprint::{compile, Blueprint, CompiledMapping, Destination, DestinationKind, Source},
    config::{MatrixConfig, RampConfig},
    error::RoutingError,
    graph::{AudioGraph, NodeHandle, Param, PortRef},
    synth::Rack,
};

pub use connection::{Connection, ConnectionKey, DestinationLink, PatchEntry, RoutingEvent};
pub use pin::PinColor;

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MatrixKind {
    /// Panel 5.
    Audio,
    /// Panel 6.
    Control,
}

impl MatrixKind {
    pub fn label(&self) -> &'static str {
        match self {
            MatrixKind::Audio => "AUDIO",
            MatrixKind::Control => "CONTROL",
        }
    }
}

pub struct PatchBay {
    kind: MatrixKind,
    blueprint: Blueprint,
    mapping: CompiledMapping,
    config: MatrixConfig,
    ramps: RampConfig,
    connections: BTreeMap<ConnectionKey, Connection>,
    pending: BTreeMap<ConnectionKey, PinColor>,
    events: Vec<RoutingEvent>,
}

impl PatchBay {
    pub fn new(
        kind: MatrixKind,
        blueprint: Blueprint,
        config: MatrixConfig,
        ramps: RampConfig,
    ) -> Self {
        let mapping = compile(&blueprint);
        Self {
            kind,
            blueprint,
            mapping,
            config,
            ramps,
            connections: BTreeMap::new(),
            pending: BTreeMap::new(),
            events: Vec::new(),
        }
    }

    pub fn kind(&self) -> MatrixKind {
        self.kind
    }

    pub fn blueprint(&self) -> &Blueprint {
        &self.blueprint
    }

    pub fn mapping(&self) -> &CompiledMapping {
        &self.mapping
    }

    pub fn config(&self) -> &MatrixConfig {
        &self.config
    }

    pub fn connection(&self, row: usize, col: usize) -> Option<&Connection> {
        self.connections.get(&(row, col))
    }

    pub fn connections(&self) -> impl Iterator<Item = (&ConnectionKey, &Connection)> {
        self.connections.iter()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn is_pending(&self, row: usize, col: usize) -> bool {
        self.pending.contains_key(&(row, col))
    }

    /// Colour a pin currently shows, live or pending.
    pub fn pin_color_at(&self, row: usize, col: usize) -> Option<PinColor> {
        self.connections
            .get(&(row, col))
            .map(|c| c.color)
            .or_else(|| self.pending.get(&(row, col)).copied())
    }

    /// Routing changes since the last drain.
    pub fn drain_events(&mut self) -> std::vec::Drain<'_, RoutingEvent> {
        self.events.drain(..)
    }

    /// Push (`activate`) or pull a pin.
    ///
    /// Returns `Ok(true)` when the matrix ends up in the requested state or
    /// the cell carries nothing, and `Ok(false)` when the pin could not be
    /// built (graph not ready, endpoint unavailable). Only coordinates
    /// outside the grid are an error.
    pub fn toggle<G: AudioGraph>(
        &mut self,
        rack: &mut Rack<G>,
        row: usize,
        col: usize,
        activate: bool,
        color: Option<PinColor>,
    ) -> Result<bool, RoutingError> {
        if !self.mapping.contains(row, col) {
            return Err(RoutingError::InvalidCoordinate {
                row,
                col,
                rows: self.mapping.rows,
                cols: self.mapping.cols,
            });
        }
        let Some((source, destination)) = self.mapping.endpoints(row, col) else {
            return Ok(true);
        };

        if activate {
            Ok(self.activate(rack, (row, col), source, destination, color))
        } else {
            self.deactivate(rack, (row, col));
            Ok(true)
        }
    }

    fn activate<G: AudioGraph>(
        &mut self,
        rack: &mut Rack<G>,
        key: ConnectionKey,
        source: Source,
        destination: Destination,
        color: Option<PinColor>,
    ) -> bool {
        if self.connections.contains_key(&key) {
            return true;
        }
        let color = color.unwrap_or(self.config.default_color);

        if !rack.is_ready() {
            if let DestinationKind::OscillatorFreqCv { osc } = destination.kind {
                self.pending.insert(key, color);
                rack.mark_pending(self.kind, osc);
            }
            debug!(matrix = ?self.kind, row = key.0, col = key.1, "graph not ready");
            return false;
        }

        let Some(from) = rack.resolve_source(&source) else {
            return false;
        };
        let Some(link) = rack.resolve_destination(&destination.kind) else {
            return false;
        };

        let gain = self.pin_gain(key.0, key.1, &destination, Some(color));
        let Some((filter, gain_stage)) = build_pin(rack.graph_mut(), from, link, color, gain)
        else {
            debug!(
                matrix = ?self.kind,
                source = %source.label(),
                destination = %destination.kind.label(),
                "pin could not be built"
            );
            return false;
        };

        self.pending.remove(&key);
        self.connections.insert(
            key,
            Connection {
                source,
                destination: destination.kind,
                filter,
                gain_stage,
                color,
                gain,
                link,
            },
        );
        self.events.push(RoutingEvent::Connected {
            row: key.0,
            col: key.1,
            source,
            destination: destination.kind,
        });
        debug!(
            matrix = ?self.kind,
            source = %source.label(),
            destination = %destination.kind.label(),
            color = color.label(),
            gain,
            "pin connected"
        );
        true
    }

    fn deactivate<G: AudioGraph>(&mut self, rack: &mut Rack<G>, key: ConnectionKey) {
        self.pending.remove(&key);
        let Some(connection) = self.connections.remove(&key) else {
            return;
        };

        let graph = rack.graph_mut();
        let fade = self.ramps.disconnect;
        if let Err(err) = graph.set_param(connection.gain_stage, Param::Gain, 0.0, fade) {
            warn!(%err, "could not fade pin out");
        }
        for stage in [connection.gain_stage, connection.filter] {
            if let Err(err) = graph.release(stage, fade) {
                warn!(%err, ?stage, "could not release pin stage");
            }
        }
        if let DestinationLink::LevelCv { bus } = connection.link {
            graph.disconnect_output_level_cv(bus, PortRef::new(connection.gain_stage, 0));
        }

        self.events.push(RoutingEvent::Disconnected {
            row: key.0,
            col: key.1,
            source: connection.source,
            destination: connection.destination,
        });
        debug!(
            matrix = ?self.kind,
            source = %connection.source.label(),
            destination = %connection.destination.label(),
            "pin removed"
        );
    }

    /// Gain a pin of `color` at (row, col) would get into `destination`.
    pub fn pin_gain(
        &self,
        row: usize,
        col: usize,
        destination: &Destination,
        color: Option<PinColor>,
    ) -> f32 {
        let (canonical_row, canonical_col) = self.mapping.canonical(row, col);
        gain::pin_gain(
            &self.config,
            canonical_row,
            canonical_col,
            destination,
            color,
        )
    }

    /// Swap a live pin's colour in place. Pending pins just remember it;
    /// empty cells are ignored.
    pub fn on_color_change<G: AudioGraph>(
        &mut self,
        rack: &mut Rack<G>,
        row: usize,
        col: usize,
        color: PinColor,
    ) {
        if let Some(pending) = self.pending.get_mut(&(row, col)) {
            *pending = color;
            return;
        }
        let Some(destination) = self.mapping.destination(col).copied() else {
            return;
        };
        let gain = self.pin_gain(row, col, &destination, Some(color));
        let Some(connection) = self.connections.get_mut(&(row, col)) else {
            return;
        };

        let graph = rack.graph_mut();
        let ramp = self.ramps.color_change;
        if let Err(err) = graph.set_param(connection.filter, Param::Cutoff, color.cutoff_hz(), ramp)
        {
            warn!(%err, "could not retune pin filter");
        }
        if let Err(err) = graph.set_param(connection.gain_stage, Param::Gain, gain, ramp) {
            warn!(%err, "could not change pin gain");
        }
        connection.color = color;
        connection.gain = gain;
    }

    /// Live pins whose destination matches `predicate`.
    pub fn active_connection_count_to(&self, predicate: impl Fn(&DestinationKind) -> bool) -> usize {
        self.connections
            .values()
            .filter(|c| predicate(&c.destination))
            .count()
    }

    /// Every pin, live or pending, in (row, col) order.
    pub fn serialize(&self) -> Vec<PatchEntry> {
        let mut pins: BTreeMap<ConnectionKey, PinColor> = self.pending.clone();
        pins.extend(self.connections.iter().map(|(&key, c)| (key, c.color)));
        pins.into_iter()
            .map(|((row, col), pin_color)| PatchEntry {
                row,
                col,
                pin_color,
            })
            .collect()
    }

    /// Replace the routing with `entries`. Entries that are off the grid,
    /// hidden, or cannot be built are skipped. Returns the number of live
    /// pins afterwards.
    pub fn restore<G: AudioGraph>(&mut self, rack: &mut Rack<G>, entries: &[PatchEntry]) -> usize {
        self.clear(rack);
        for entry in entries {
            if let Err(err) = self.toggle(rack, entry.row, entry.col, true, Some(entry.pin_color)) {
                debug!(%err, "skipping patch entry");
            }
        }
        self.connections.len()
    }

    /// Pull every pin and forget pending ones.
    pub fn clear<G: AudioGraph>(&mut self, rack: &mut Rack<G>) {
        self.pending.clear();
        let keys: Vec<ConnectionKey> = self.connections.keys().copied().collect();
        for key in keys {
            self.deactivate(rack, key);
        }
    }

    /// Swap in a new blueprint. All pins are pulled first.
    pub fn reload<G: AudioGraph>(&mut self, rack: &mut Rack<G>, blueprint: Blueprint) {
        self.clear(rack);
        self.mapping = compile(&blueprint);
        self.blueprint = blueprint;
    }

    /// Build pending frequency CV pins aimed at `osc`. Returns how many
    /// went live.
    pub fn retry_pending<G: AudioGraph>(&mut self, rack: &mut Rack<G>, osc: usize) -> usize {
        let keys: Vec<(ConnectionKey, PinColor)> = self
            .pending
            .iter()
            .filter(|(key, _)| {
                matches!(
                    self.mapping.destination(key.1).map(|d| d.kind),
                    Some(DestinationKind::OscillatorFreqCv { osc: target }) if target == osc
                )
            })
            .map(|(&key, &color)| (key, color))
            .collect();

        let mut built = 0;
        for ((row, col), color) in keys {
            self.pending.remove(&(row, col));
            if let Ok(true) = self.toggle(rack, row, col, true, Some(color)) {
                built += 1;
            }
        }
        built
    }
}

/// Create and wire the filter and gain stages of one pin. Anything created
/// is released again if a later step fails.
fn build_pin<G: AudioGraph>(
    graph: &mut G,
    from: PortRef,
    link: DestinationLink,
    color: PinColor,
    gain: f32,
) -> Option<(NodeHandle, NodeHandle)> {
    let filter = graph
        .create_filter_stage(color.cutoff_hz())
        .map_err(|err| debug!(%err, "filter stage"))
        .ok()?;
    let gain_stage = match graph.create_gain_stage(gain) {
        Ok(node) => node,
        Err(err) => {
            debug!(%err, "gain stage");
            let _ = graph.release(filter, 0.0);
            return None;
        }
    };

    let out = PortRef::new(gain_stage, 0);
    let wired = graph
        .connect(from, PortRef::new(filter, 0))
        .and_then(|_| graph.connect(PortRef::new(filter, 0), PortRef::new(gain_stage, 0)))
        .map_err(|err| debug!(%err, "pin wiring"))
        .is_ok()
        && match link {
            DestinationLink::Direct(to) => graph
                .connect(out, to)
                .map_err(|err| debug!(%err, "pin destination"))
                .is_ok(),
            DestinationLink::LevelCv { bus } => graph.connect_output_level_cv(bus, out),
        };

    if !wired {
        let _ = graph.release(gain_stage, 0.0);
        let _ = graph.release(filter, 0.0);
        return None;
    }
    Some((filter, gain_stage))
}
