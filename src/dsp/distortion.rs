//! Saturation curves.
//!
//! Op-amps in the control path run out of headroom near their supply rails.
//! Up to a knee the signal passes untouched; past the knee it bends smoothly
//! towards a hard ceiling instead of clipping flat.
//!
//! # Headroom Clip
//!
//!   |x| <= knee:  f(x) = x
//!   |x| >  knee:  f(x) = sign(x) · (knee + span · tanh((|x| - knee) / span))
//!                 where span = limit - knee
//!
//! The curve is continuous with slope 1 at the knee and never exceeds `limit`.

/// Linear up to `knee`, then tanh-saturating towards `limit`.
#[inline]
pub fn headroom_clip(sample: f32, knee: f32, limit: f32) -> f32 {
    let magnitude = sample.abs();
    if magnitude <= knee {
        return sample;
    }
    let span = (limit - knee).max(f32::EPSILON);
    let bent = knee + span * ((magnitude - knee) / span).tanh();
    bent.copysign(sample)
}

/// Apply headroom clipping to an entire buffer in place.
pub fn headroom_clip_buffer(buffer: &mut [f32], knee: f32, limit: f32) {
    for sample in buffer.iter_mut() {
        *sample = headroom_clip(*sample, knee, limit);
    }
}
