//! Output channel VCA response.

/*
Output VCA
==========

Each output channel ends in an exponential VCA (CEM 3330 style). The level
dial sets a control voltage; the level CV input from the control matrix adds
to it.

  dial 0  → -12 V   (fully closed)
  dial 10 →   0 V   (unity gain)

Response zones:

  v <= -12 V        cut off, gain 0
  -12 V < v <= 0 V  10 dB per volt:  gain = 10^(v · 10 / 20)
  v > 0 V           soft saturation above unity. The excess voltage is
                    compressed before conversion:

                        ratio      = (v - 0) / 3
                        compressed = 3 · ratio / (1 + 2 · ratio)

                    so positive CV can lift the level but never runs away.
*/

const DB_PER_VOLT: f32 = 10.0;
const CUTOFF_VOLTAGE: f32 = -12.0;
const LINEAR_THRESHOLD: f32 = 0.0;
const HARD_LIMIT: f32 = 3.0;
const SOFTNESS: f32 = 2.0;

/// Volt-equivalents represented by one digital unit.
pub const VOLTS_PER_UNIT: f32 = 4.0;

/// Map the 0–10 level dial onto the VCA control voltage.
#[inline]
pub fn dial_to_voltage(dial: f32) -> f32 {
    let dial = dial.clamp(0.0, 10.0);
    CUTOFF_VOLTAGE + dial * (-CUTOFF_VOLTAGE / 10.0)
}

#[inline]
pub fn vca_voltage_to_gain(voltage: f32) -> f32 {
    if voltage <= CUTOFF_VOLTAGE {
        return 0.0;
    }
    if voltage <= LINEAR_THRESHOLD {
        return 10.0_f32.powf(voltage * DB_PER_VOLT / 20.0);
    }

    let width = HARD_LIMIT - LINEAR_THRESHOLD;
    let ratio = (voltage - LINEAR_THRESHOLD) / width;
    let compressed = width * ratio / (1.0 + ratio * SOFTNESS);
    let saturated = LINEAR_THRESHOLD + compressed;
    10.0_f32.powf(saturated * DB_PER_VOLT / 20.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dial_endpoints() {
        assert_eq!(dial_to_voltage(0.0), -12.0);
        assert_eq!(dial_to_voltage(10.0), 0.0);
        assert_eq!(dial_to_voltage(5.0), -6.0);
        assert_eq!(dial_to_voltage(42.0), 0.0);
    }

    #[test]
    fn test_unity_at_zero_volts() {
        assert!((vca_voltage_to_gain(0.0) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_ten_db_per_volt() {
        // -2 V = -20 dB = 0.1
        assert!((vca_voltage_to_gain(-2.0) - 0.1).abs() < 1e-5);
    }

    #[test]
    fn test_cutoff_is_silent() {
        assert_eq!(vca_voltage_to_gain(-12.0), 0.0);
        assert_eq!(vca_voltage_to_gain(-20.0), 0.0);
    }

    #[test]
    fn test_positive_cv_saturates() {
        let g3 = vca_voltage_to_gain(3.0);
        let g30 = vca_voltage_to_gain(30.0);
        assert!(g3 > 1.0);
        // Compressed voltage approaches 1.5 V, i.e. ~+15 dB
        assert!(g30 < 10.0_f32.powf(15.0 / 20.0));
        assert!(g30 > g3);
    }
}
