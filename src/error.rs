//! Error types for routing, graph access, and configuration loading.

use thiserror::Error;

use crate::graph::{NodeHandle, Param, PortRef};

/// Failures reported by an [`AudioGraph`](crate::graph::AudioGraph) port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("audio subsystem is not ready")]
    NotReady,
    #[error("graph command queue is full")]
    QueueFull,
    #[error("signal graph has no room for more nodes or wires")]
    AtCapacity,
    #[error("unknown node {0:?}")]
    UnknownNode(NodeHandle),
    #[error("port {0:?} does not exist")]
    InvalidPort(PortRef),
    #[error("node {0:?} belongs to the fixed panel")]
    FixedNode(NodeHandle),
    #[error("node {node:?} has no parameter {param:?}")]
    UnsupportedParam { node: NodeHandle, param: Param },
}

/// Errors returned by the patch bay.
///
/// Unrouted pins and stale disconnects are not errors, and endpoints that
/// cannot be materialized are reported as `Ok(false)` from `toggle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum RoutingError {
    #[error("pin ({row}, {col}) is outside the {rows}x{cols} matrix")]
    InvalidCoordinate {
        row: usize,
        col: usize,
        rows: usize,
        cols: usize,
    },
}

#[derive(Debug, Error)]
pub enum BlueprintError {
    #[error("blueprint `{0}` has an empty grid")]
    EmptyGrid(String),
    #[error("{axis} slot starting at {start} leaves the grid (base {base}, size {size})")]
    SlotOutOfRange {
        axis: &'static str,
        start: u32,
        base: u32,
        size: usize,
    },
    #[error("{axis} {index} is assigned twice")]
    Overlap { axis: &'static str, index: usize },
    #[cfg(feature = "serde")]
    #[error("failed to parse blueprint: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[cfg(feature = "serde")]
    #[error("failed to parse RON document: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[cfg(feature = "serde")]
    #[error("failed to serialize RON document: {0}")]
    Write(#[from] ron::Error),
}

/// Failures loading or saving a whole patch.
#[derive(Debug, Error)]
pub enum PatchError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[cfg(feature = "serde")]
    #[error("failed to parse patch: {0}")]
    Parse(#[from] ron::error::SpannedError),
    #[cfg(feature = "serde")]
    #[error("failed to serialize patch: {0}")]
    Write(#[from] ron::Error),
}
