//! Oscillator voices, their frequency CV chain, and the rack that owns them.

pub mod cv;
pub mod dormancy;
pub mod rack;
pub mod voice;

pub use dormancy::DormancyTracker;
pub use rack::Rack;
pub use voice::{OscillatorVoice, OscillatorVoiceState, VoiceNode, WaveLevels};
