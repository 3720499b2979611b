use std::f32::consts::PI;

use crate::dsp::smooth::LinearRamp;

/*
Pin RC Filter
=============

Every patch pin is a resistor feeding a summing bus that carries some stray
capacitance. Together they form a first-order RC low-pass:

    fc = 1 / (2π · R · C)

| pin   | R       | C (bus) | fc          |
| ----- | ------- | ------- | ----------- |
| white | 100 kΩ  | 100 pF  | ~15.9 kHz   |
| grey  | 100 kΩ  | 100 pF  | ~15.9 kHz   |
| green | 68 kΩ   | 100 pF  | ~23.4 kHz   |
| red   | 2.7 kΩ  | 100 pF  | ~589 kHz    |

The filter is the one-pole topology-preserving transform (TPT) version of the
analog prototype, so the cutoff can move every sample without zipper noise or
instability. A pin recoloured while live glides its cutoff rather than
jumping, recomputing the coefficient every sample of the glide. Cutoffs above the usable band are clamped just below Nyquist,
which makes a red pin effectively transparent.
*/

/// Highest cutoff as a fraction of the sample rate.
const MAX_CUTOFF_RATIO: f32 = 0.45;

/// Integrator gain for a cutoff at `sample_rate`.
#[inline]
pub fn coefficient_for(cutoff_hz: f32, sample_rate: f32) -> f32 {
    let fc = cutoff_hz.clamp(1.0, sample_rate * MAX_CUTOFF_RATIO);
    let g = (PI * fc / sample_rate).tan();
    g / (1.0 + g)
}

pub struct RcLowpass {
    s: f32, // integrator state
    cutoff: LinearRamp,
}

impl RcLowpass {
    pub fn new(cutoff_hz: f32) -> Self {
        Self {
            s: 0.0,
            cutoff: LinearRamp::new(cutoff_hz),
        }
    }

    /// Where the cutoff currently sits, mid-ramp included.
    pub fn cutoff_hz(&self) -> f32 {
        self.cutoff.value()
    }

    /// Integrator gain for the current cutoff.
    #[inline]
    pub fn coefficient(&self, sample_rate: f32) -> f32 {
        coefficient_for(self.cutoff.value(), sample_rate)
    }

    #[inline]
    pub fn next_sample(&mut self, sample: f32, g: f32) -> f32 {
        let v = (sample - self.s) * g;
        let y = v + self.s;
        self.s = y + v;
        y
    }

    /// Filter `input` into `output`, following any cutoff ramp per sample.
    pub fn process(&mut self, input: &[f32], output: &mut [f32], sample_rate: f32) {
        if self.cutoff.is_settled() {
            let g = self.coefficient(sample_rate);
            for (out, &x) in output.iter_mut().zip(input) {
                *out = self.next_sample(x, g);
            }
        } else {
            for (out, &x) in output.iter_mut().zip(input) {
                let g = coefficient_for(self.cutoff.next(), sample_rate);
                *out = self.next_sample(x, g);
            }
        }
    }

    pub fn render(&mut self, buffer: &mut [f32], sample_rate: f32) {
        if self.cutoff.is_settled() {
            let g = self.coefficient(sample_rate);
            for sample in buffer.iter_mut() {
                *sample = self.next_sample(*sample, g);
            }
        } else {
            for sample in buffer.iter_mut() {
                let g = coefficient_for(self.cutoff.next(), sample_rate);
                *sample = self.next_sample(*sample, g);
            }
        }
    }

    pub fn reset(&mut self) {
        self.s = 0.0;
    }

    pub fn set_cutoff(&mut self, cutoff: f32) {
        self.cutoff.ramp_to(cutoff, 0);
    }

    /// Glide the cutoff to `cutoff` over `samples` samples.
    pub fn ramp_cutoff(&mut self, cutoff: f32, samples: u32) {
        self.cutoff.ramp_to(cutoff, samples);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq: f32, sample_rate: f32, len: usize) -> Vec<f32> {
        (0..len)
            .map(|i| (2.0 * PI * freq * i as f32 / sample_rate).sin())
            .collect()
    }

    fn peak_after_transient(buffer: &[f32]) -> f32 {
        let skip = buffer.len().min(64);
        buffer[skip..].iter().fold(0.0f32, |acc, &x| acc.max(x.abs()))
    }

    #[test]
    fn test_dc_passes() {
        let mut filter = RcLowpass::new(1_000.0);
        let mut buffer = vec![1.0; 512];
        filter.render(&mut buffer, 48_000.0);
        assert!(buffer[511] > 0.999);
    }

    #[test]
    fn test_attenuates_above_cutoff() {
        let sample_rate = 48_000.0;
        let mut filter = RcLowpass::new(500.0);
        let mut buffer = sine(10_000.0, sample_rate, 1024);
        filter.render(&mut buffer, sample_rate);

        // One pole = 6 dB/octave, 20x the cutoff should be ~26 dB down
        let peak = peak_after_transient(&buffer);
        assert!(peak < 0.1, "expected attenuation, got peak {}", peak);
    }

    #[test]
    fn test_half_power_at_cutoff() {
        let sample_rate = 48_000.0;
        let mut filter = RcLowpass::new(1_000.0);
        let mut buffer = sine(1_000.0, sample_rate, 4096);
        filter.render(&mut buffer, sample_rate);

        let peak = peak_after_transient(&buffer[2048..]);
        assert!((peak - 0.707).abs() < 0.03, "peak at cutoff was {}", peak);
    }

    #[test]
    fn test_cutoff_above_nyquist_is_clamped() {
        let mut filter = RcLowpass::new(589_000.0);
        let g = filter.coefficient(48_000.0);
        assert!(g.is_finite());
        assert!(g > 0.8);

        let mut buffer = sine(1_000.0, 48_000.0, 512);
        let reference = buffer.clone();
        filter.render(&mut buffer, 48_000.0);
        let err = buffer[256..]
            .iter()
            .zip(&reference[256..])
            .fold(0.0f32, |acc, (a, b)| acc.max((a - b).abs()));
        assert!(err < 0.05, "wide-open filter should be nearly transparent");
    }

    #[test]
    fn test_set_cutoff_affects_filtering() {
        let sample_rate = 48_000.0;
        let mut filter = RcLowpass::new(200.0);
        let mut low = sine(2_000.0, sample_rate, 1024);
        filter.render(&mut low, sample_rate);

        filter.reset();
        filter.set_cutoff(15_000.0);
        let mut high = sine(2_000.0, sample_rate, 1024);
        filter.render(&mut high, sample_rate);

        assert!(peak_after_transient(&high) > peak_after_transient(&low) * 2.0);
    }

    #[test]
    fn test_cutoff_ramp_passes_through_midpoint() {
        let sample_rate = 48_000.0;
        let mut filter = RcLowpass::new(15_915.0);
        filter.ramp_cutoff(500.0, 240);

        let input = vec![0.0; 120];
        let mut output = vec![0.0; 120];
        filter.process(&input, &mut output, sample_rate);
        let halfway = filter.cutoff_hz();
        assert!(halfway < 15_915.0 && halfway > 500.0, "cutoff {}", halfway);
        assert!((halfway - 8_207.5).abs() < 1.0);

        filter.process(&input, &mut output, sample_rate);
        assert_eq!(filter.cutoff_hz(), 500.0);
    }
}
