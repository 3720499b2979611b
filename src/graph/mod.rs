//! The audio graph the patch bay drives.
//!
//! [`port`] is the seam: the routing layer only ever talks to an
//! [`AudioGraph`]. The rest of the module is a reference implementation of
//! that port, a block renderer that runs on the audio thread and a
//! controller that feeds it through a lock-free command ring.

/// Control → audio thread messages.
pub mod command;
/// Controller side of the reference graph.
pub mod engine;
/// Node kinds and their per-block processing.
pub mod node;
/// The `AudioGraph` trait, handles, and port numbering.
pub mod port;
/// Audio-thread renderer with topological ordering.
pub mod render;

pub use engine::{GraphController, GraphLayout, SignalGraph};
pub use node::NodeKind;
pub use port::{
    AudioGraph, NodeHandle, NoiseParams, OscillatorParams, Param, PortRef, SlewParams,
};
pub use render::{GraphRenderer, ScopeFrame};
