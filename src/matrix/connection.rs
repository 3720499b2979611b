//! Live pin state.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    blueprint::{DestinationKind, Source},
    graph::{NodeHandle, PortRef},
    matrix::pin::PinColor,
};

/// Physical (row, col) of a pin.
pub type ConnectionKey = (usize, usize);

/// How a pin's gain stage reaches its destination, kept for teardown.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationLink {
    /// Ordinary wire into an input port.
    Direct(PortRef),
    /// Routed through the output bus's level CV input.
    LevelCv { bus: usize },
}

/// One pin pushed into the matrix and the two stages modelling it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Connection {
    pub source: Source,
    pub destination: DestinationKind,
    pub filter: NodeHandle,
    pub gain_stage: NodeHandle,
    pub color: PinColor,
    pub gain: f32,
    pub link: DestinationLink,
}

/// One line of a saved routing: a pin and its colour.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PatchEntry {
    pub row: usize,
    pub col: usize,
    #[cfg_attr(feature = "serde", serde(default))]
    pub pin_color: PinColor,
}

/// A pin that went live or was pulled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoutingEvent {
    Connected {
        row: usize,
        col: usize,
        source: Source,
        destination: DestinationKind,
    },
    Disconnected {
        row: usize,
        col: usize,
        source: Source,
        destination: DestinationKind,
    },
}

impl RoutingEvent {
    pub fn source(&self) -> Source {
        match self {
            RoutingEvent::Connected { source, .. } | RoutingEvent::Disconnected { source, .. } => {
                *source
            }
        }
    }

    pub fn is_connect(&self) -> bool {
        matches!(self, RoutingEvent::Connected { .. })
    }
}
