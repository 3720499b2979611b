pub mod blueprint; // Panel layouts and their compiled lookup tables
pub mod config;
pub mod dsp;
pub mod engine; // The instrument facade
pub mod error;
pub mod graph; // Audio graph port and reference renderer
pub mod matrix; // Pins, connections, routing
pub mod synth; // Oscillator voices and dormancy

pub const MAX_BLOCK_SIZE: usize = 2048;

pub use config::EngineConfig;
pub use engine::{Patch, Synthesizer};
pub use matrix::{MatrixKind, PatchBay, PinColor};
