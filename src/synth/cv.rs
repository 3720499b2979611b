//! Frequency CV scaling.
//!
//! The exponential converter tracks 1 V/octave. One digital unit on the
//! control matrix stands for 4 V, so a unit of CV moves the pitch by four
//! octaves:
//!
//!   cents = cv · 4 V/unit · 1200 cents/V = cv · 4800

pub use crate::dsp::vca::VOLTS_PER_UNIT;

pub const CENTS_PER_VOLT: f32 = 1200.0;

pub const CENTS_PER_UNIT: f32 = CENTS_PER_VOLT * VOLTS_PER_UNIT;

#[inline]
pub fn cents_for(cv: f32) -> f32 {
    cv * CENTS_PER_UNIT
}
