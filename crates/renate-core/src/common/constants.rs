//! Physical constants and unit conversions shared by the beam kernels.
//!
//! CODATA 2018 exact or recommended values in SI units.

pub const ELEMENTARY_CHARGE: f64 = 1.602_176_634e-19;
pub const SPEED_OF_LIGHT: f64 = 299_792_458.0;
pub const ATOMIC_MASS_UNIT: f64 = 1.660_539_066_60e-27;
pub const KEV_TO_JOULE: f64 = 1.0e3 * ELEMENTARY_CHARGE;
pub const KEV_TO_EV: f64 = 1.0e3;
pub const CM2_TO_M2: f64 = 1.0e-4;

/// Highest plasma ion charge with a mass-normalization entry.
pub const MAX_CHARGE_STATE: usize = 11;

/// Reference mass number per charge-state bucket, `charge-1` at index 0.
const IMPURITY_MASS_NORMALIZATION: [f64; MAX_CHARGE_STATE] =
    [1.0, 4.0, 7.0, 9.0, 11.0, 12.0, 14.0, 16.0, 19.0, 20.0, 23.0];

pub fn charge_state_label(charge: usize) -> String {
    format!("charge-{}", charge)
}

pub const fn impurity_mass_normalization(charge: usize) -> Option<f64> {
    if charge == 0 || charge > MAX_CHARGE_STATE {
        None
    } else {
        Some(IMPURITY_MASS_NORMALIZATION[charge - 1])
    }
}

#[cfg(test)]
mod tests {
    use super::{
        ATOMIC_MASS_UNIT, CM2_TO_M2, ELEMENTARY_CHARGE, KEV_TO_JOULE, MAX_CHARGE_STATE,
        charge_state_label, impurity_mass_normalization,
    };

    #[test]
    fn derived_constants_match_expected_relationships() {
        assert!((KEV_TO_JOULE - 1.0e3 * ELEMENTARY_CHARGE).abs() <= f64::EPSILON);
        assert_eq!(CM2_TO_M2, 1.0e-4);
        assert!(ATOMIC_MASS_UNIT > 1.66e-27 && ATOMIC_MASS_UNIT < 1.67e-27);
    }

    #[test]
    fn mass_normalization_covers_charge_one_to_eleven() {
        assert_eq!(impurity_mass_normalization(0), None);
        assert_eq!(impurity_mass_normalization(1), Some(1.0));
        assert_eq!(impurity_mass_normalization(2), Some(4.0));
        assert_eq!(impurity_mass_normalization(6), Some(12.0));
        assert_eq!(impurity_mass_normalization(MAX_CHARGE_STATE), Some(23.0));
        assert_eq!(impurity_mass_normalization(MAX_CHARGE_STATE + 1), None);
    }

    #[test]
    fn charge_state_labels_use_bucket_prefix() {
        assert_eq!(charge_state_label(1), "charge-1");
        assert_eq!(charge_state_label(11), "charge-11");
    }
}
