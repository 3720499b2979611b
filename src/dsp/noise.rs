//! Noise source with a colour control.
//!
//! White noise comes from a 64-bit LCG (Knuth's MMIX constants). Pink noise
//! is the white signal through Paul Kellet's seven-pole filter. The colour
//! control crossfades between them: 0.0 is pink (darker, -3 dB/octave),
//! 1.0 is white (flat).

pub struct NoiseSource {
    seed: u64,
    pink: [f32; 7],
}

impl NoiseSource {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: seed.max(1),
            pink: [0.0; 7],
        }
    }

    #[inline]
    pub fn white(&mut self) -> f32 {
        self.seed = self
            .seed
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        let bits = self.seed >> 11;
        let normalized = (bits as f64) / ((1u64 << 53) as f64);
        (normalized as f32) * 2.0 - 1.0
    }

    #[inline]
    fn pink_sample(&mut self, white: f32) -> f32 {
        self.pink[0] = 0.99886 * self.pink[0] + white * 0.0555179;
        self.pink[1] = 0.99332 * self.pink[1] + white * 0.0750759;
        self.pink[2] = 0.96900 * self.pink[2] + white * 0.1538520;
        self.pink[3] = 0.86650 * self.pink[3] + white * 0.3104856;
        self.pink[4] = 0.55000 * self.pink[4] + white * 0.5329522;
        self.pink[5] = -0.7616 * self.pink[5] - white * 0.0168980;
        let sum: f32 = self.pink.iter().sum();
        self.pink[6] = white * 0.115926;
        (sum + white * 0.5362) * 0.11
    }

    #[inline]
    pub fn next(&mut self, colour: f32) -> f32 {
        let white = self.white();
        let pink = self.pink_sample(white);
        let c = colour.clamp(0.0, 1.0);
        (pink * (1.0 - c) + white * c).clamp(-1.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_stream() {
        let mut a = NoiseSource::with_seed(42);
        let mut b = NoiseSource::with_seed(42);
        for _ in 0..256 {
            assert_eq!(a.next(0.5), b.next(0.5));
        }
    }

    #[test]
    fn test_white_is_bounded_and_centered() {
        let mut noise = NoiseSource::with_seed(7);
        let samples: Vec<f32> = (0..20_000).map(|_| noise.white()).collect();
        assert!(samples.iter().all(|s| (-1.0..=1.0).contains(s)));
        let mean = samples.iter().sum::<f32>() / samples.len() as f32;
        assert!(mean.abs() < 0.05, "mean was {}", mean);
    }

    #[test]
    fn test_pink_is_smoother_than_white() {
        // Mean absolute sample-to-sample difference drops as the colour darkens
        let roughness = |colour: f32| {
            let mut noise = NoiseSource::with_seed(99);
            let mut prev = noise.next(colour);
            let mut acc = 0.0;
            for _ in 0..10_000 {
                let s = noise.next(colour);
                acc += (s - prev).abs();
                prev = s;
            }
            acc
        };
        assert!(roughness(0.0) < roughness(1.0) * 0.5);
    }
}
