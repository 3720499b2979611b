//! Click-free parameter changes.

/*
Parameter Ramps
===============

Writing a new gain straight into a running signal produces a step, and a step
in the audio band is heard as a click. Every parameter that crosses from the
control thread into the renderer is therefore applied as a linear ramp:

    value(n) = start + (target - start) * n / N      for n in 0..=N

A ramp of zero samples is an immediate jump. Starting a new ramp while one is
in flight begins from wherever the old ramp had got to, so retargeting is
always continuous.
*/

/// Convert a ramp duration into whole samples (never negative).
#[inline]
pub fn ramp_samples(seconds: f32, sample_rate: f32) -> u32 {
    (seconds.max(0.0) * sample_rate).round() as u32
}

#[derive(Debug, Clone, Copy)]
pub struct LinearRamp {
    current: f32,
    target: f32,
    step: f32,
    remaining: u32,
}

impl LinearRamp {
    pub fn new(value: f32) -> Self {
        Self {
            current: value,
            target: value,
            step: 0.0,
            remaining: 0,
        }
    }

    /// Move towards `target` over `samples` samples.
    pub fn ramp_to(&mut self, target: f32, samples: u32) {
        self.target = target;
        if samples == 0 {
            self.current = target;
            self.step = 0.0;
            self.remaining = 0;
        } else {
            self.step = (target - self.current) / samples as f32;
            self.remaining = samples;
        }
    }

    #[inline]
    pub fn next(&mut self) -> f32 {
        if self.remaining > 0 {
            self.remaining -= 1;
            self.current = if self.remaining == 0 {
                self.target
            } else {
                self.current + self.step
            };
        }
        self.current
    }

    pub fn value(&self) -> f32 {
        self.current
    }

    pub fn target(&self) -> f32 {
        self.target
    }

    pub fn is_settled(&self) -> bool {
        self.remaining == 0
    }
}
