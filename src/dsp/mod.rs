//! Low-level DSP primitives used by the real-time graph nodes.
//!
//! These components are allocation-free and realtime-safe, making them safe to
//! embed directly inside renderer nodes. They stay focused on the
//! signal-processing math; the graph layer handles ports and routing.

/// Headroom saturation for the control path.
pub mod distortion;
/// One-pole RC low-pass modelling a patch pin on its bus.
pub mod filter;
/// Noise source with a pink-to-white colour control.
pub mod noise;
/// Four-shape oscillator core with hard sync.
pub mod oscillator;
/// Linear parameter ramps.
pub mod smooth;
/// Asymmetric thermal lag of the exponential converter.
pub mod slew;
/// Output channel VCA curve.
pub mod vca;

pub use oscillator::Waveform;
