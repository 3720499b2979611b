//! Effective gain of a pin.
//!
//!   gain = clamp(pin · row · col · matrix, min, max)
//!
//! where `pin` is the virtual-earth gain of the pin's colour into the
//! destination's feedback resistance. Red pins get their own, higher
//! ceiling. An explicit override for the pin position replaces the whole
//! calculation, clamp included.

use crate::{
    blueprint::Destination,
    config::MatrixConfig,
    matrix::pin::{gain_of, tolerance_seed, PinColor},
};

pub fn pin_gain(
    config: &MatrixConfig,
    canonical_row: u32,
    canonical_col: u32,
    destination: &Destination,
    color: Option<PinColor>,
) -> f32 {
    if let Some(gain) = config.override_for(canonical_row, canonical_col) {
        return gain;
    }

    let color = color.unwrap_or(config.default_color);
    let rf = destination.rf.unwrap_or(config.standard_rf);
    let seed = config
        .tolerance
        .then(|| tolerance_seed(canonical_row, canonical_col));

    let gain = gain_of(color, rf, seed)
        * config.row_gain(canonical_row)
        * config.col_gain(canonical_col)
        * config.matrix_gain;

    let ceiling = match color {
        PinColor::Red => config.red_max_gain,
        _ => config.max_gain,
    };
    gain.clamp(config.min_gain, ceiling.max(config.min_gain))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{blueprint::DestinationKind, config::PinOverride};

    fn bus() -> Destination {
        Destination::new(DestinationKind::OutputBus { bus: 0 })
    }

    #[test]
    fn test_white_default_is_unity() {
        let config = MatrixConfig::default();
        assert!((pin_gain(&config, 86, 4, &bus(), None) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_red_uses_its_own_ceiling() {
        let config = MatrixConfig::default();
        let red = pin_gain(&config, 86, 4, &bus(), Some(PinColor::Red));
        assert!((red - 37.037).abs() < 0.01);

        // Anything else tops out at max_gain
        let mut hot = MatrixConfig::default();
        hot.matrix_gain = 20.0;
        assert_eq!(pin_gain(&hot, 86, 4, &bus(), Some(PinColor::Green)), 8.0);
        assert_eq!(pin_gain(&hot, 86, 4, &bus(), Some(PinColor::Red)), 50.0);
    }

    #[test]
    fn test_row_col_and_matrix_gains_multiply() {
        let mut config = MatrixConfig::default();
        config.row_gains.insert(86, 0.5);
        config.col_gains.insert(4, 0.5);
        config.matrix_gain = 2.0;
        let gain = pin_gain(&config, 86, 4, &bus(), Some(PinColor::White));
        assert!((gain - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_destination_rf_overrides_standard() {
        let config = MatrixConfig::default();
        let dest = Destination {
            kind: DestinationKind::OscillatorFreqCv { osc: 0 },
            rf: Some(50_000.0),
        };
        let gain = pin_gain(&config, 77, 1, &dest, Some(PinColor::White));
        assert!((gain - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_override_wins_outright() {
        let mut config = MatrixConfig::default();
        config.pin_overrides.push(PinOverride {
            row: 86,
            col: 4,
            gain: 100.0,
        });
        assert_eq!(pin_gain(&config, 86, 4, &bus(), Some(PinColor::Grey)), 100.0);
    }

    #[test]
    fn test_gain_is_deterministic_with_tolerance() {
        let mut config = MatrixConfig::default();
        config.tolerance = true;
        let a = pin_gain(&config, 90, 10, &bus(), Some(PinColor::White));
        let b = pin_gain(&config, 90, 10, &bus(), Some(PinColor::White));
        assert_eq!(a, b);
        assert!((a - 1.0).abs() < 0.12);
    }
}
