//! Thermal slew of an exponential converter.

/*
Thermal Slew
============

The oscillator's exponential converter is a matched transistor pair held at a
constant temperature by a heater. A large jump in control voltage changes the
current through the pair, which changes its temperature, and the pitch keeps
drifting until the heater catches up. Small movements (vibrato, slow sweeps)
are followed almost immediately.

The model is a one-pole follower whose time constant depends on the size and
direction of the step:

    |delta| <= threshold   ->  fast time constant (effectively instant)
    delta   >  threshold   ->  rise time constant
    delta   < -threshold   ->  fall time constant

Rise and fall differ because heating and cooling are not symmetric.
*/

/// One-pole coefficient for a time constant in seconds.
#[inline]
pub fn one_pole_coefficient(tau_seconds: f32, sample_rate: f32) -> f32 {
    if tau_seconds <= 0.0 {
        1.0
    } else {
        1.0 - (-1.0 / (tau_seconds * sample_rate)).exp()
    }
}

pub struct ThermalSlew {
    state: f32,
    fast: f32,
    rise: f32,
    fall: f32,
    threshold: f32,
}

impl ThermalSlew {
    pub fn new(
        sample_rate: f32,
        fast_tau: f32,
        rise_tau: f32,
        fall_tau: f32,
        threshold: f32,
    ) -> Self {
        Self {
            state: 0.0,
            fast: one_pole_coefficient(fast_tau, sample_rate),
            rise: one_pole_coefficient(rise_tau, sample_rate),
            fall: one_pole_coefficient(fall_tau, sample_rate),
            threshold: threshold.abs(),
        }
    }

    #[inline]
    pub fn next_sample(&mut self, input: f32) -> f32 {
        let delta = input - self.state;
        let coeff = if delta > self.threshold {
            self.rise
        } else if delta < -self.threshold {
            self.fall
        } else {
            self.fast
        };
        self.state += coeff * delta;
        self.state
    }

    pub fn render(&mut self, buffer: &mut [f32]) {
        for sample in buffer.iter_mut() {
            *sample = self.next_sample(*sample);
        }
    }

    pub fn value(&self) -> f32 {
        self.state
    }

    pub fn reset(&mut self) {
        self.state = 0.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SR: f32 = 48_000.0;

    #[test]
    fn test_small_steps_follow_quickly() {
        let mut slew = ThermalSlew::new(SR, 0.0005, 0.1, 0.05, 0.25);
        let mut buffer = vec![0.1; 480];
        slew.render(&mut buffer);
        assert!((slew.value() - 0.1).abs() < 1e-3);
    }

    #[test]
    fn test_large_rise_lags() {
        let mut slew = ThermalSlew::new(SR, 0.0005, 0.1, 0.05, 0.25);
        let mut buffer = vec![1.0; 480]; // 10 ms
        slew.render(&mut buffer);
        assert!(
            slew.value() < 0.9,
            "a 4-octave jump should still be settling, got {}",
            slew.value()
        );
    }

    #[test]
    fn test_rise_and_fall_are_asymmetric() {
        let mut up = ThermalSlew::new(SR, 0.0005, 0.1, 0.02, 0.25);
        let mut up_buf = vec![1.0; 480];
        up.render(&mut up_buf);
        let rose = up.value();

        let mut down = ThermalSlew::new(SR, 0.0005, 0.1, 0.02, 0.25);
        let mut down_buf = vec![-1.0; 480];
        down.render(&mut down_buf);
        let fell = -down.value();

        assert!(fell > rose, "fall={} rise={}", fell, rose);
    }

    #[test]
    fn test_zero_time_constant_is_passthrough() {
        let mut slew = ThermalSlew::new(SR, 0.0, 0.0, 0.0, 0.25);
        assert_eq!(slew.next_sample(0.8), 0.8);
        assert_eq!(slew.next_sample(-0.3), -0.3);
    }
}
