use crate::domain::{RenateError, RenateResult};
use serde::{Deserialize, Serialize};

/// Raw tabulated rate data for one (species, energy) pair.
///
/// Collision cubes hold rate coefficients in cm² on `temperature_axis` (eV);
/// `einstein_coeffs` holds spontaneous decay rates in 1/s indexed
/// `[from][to]`, non-zero only below the diagonal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateTable {
    pub temperature_axis: Vec<f64>,
    pub einstein_coeffs: Vec<Vec<f64>>,
    /// `[from][to][temperature]`
    pub electron_neutral_collisions: Vec<Vec<Vec<f64>>>,
    /// `[from][to][temperature]`
    pub proton_neutral_collisions: Vec<Vec<Vec<f64>>>,
    /// `[charge - 2][from][to][temperature]`
    #[serde(default)]
    pub impurity_neutral_collisions: Vec<Vec<Vec<Vec<f64>>>>,
    /// `[0 = electron, q = ion charge][from][temperature]`
    pub electron_loss_collisions: Vec<Vec<Vec<f64>>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateTableShape {
    pub atomic_levels: usize,
    pub temperature_points: usize,
    pub charge_states: usize,
    pub impurity_charge_slices: usize,
    /// Smallest level count offered by any collision cube.
    pub available_levels: usize,
}

impl RateTable {
    /// Checks internal consistency and returns the table shape.
    ///
    /// `expected_levels` is the size of the species level dictionary.
    pub fn validate(&self, expected_levels: usize) -> RenateResult<RateTableShape> {
        let temperature_points = self.validate_temperature_axis()?;
        let atomic_levels = self.validate_einstein_coeffs(expected_levels)?;

        let electron_levels = transition_cube_levels(
            "Electron Neutral Collisions",
            &self.electron_neutral_collisions,
            temperature_points,
        )?;
        let proton_levels = transition_cube_levels(
            "Proton Neutral Collisions",
            &self.proton_neutral_collisions,
            temperature_points,
        )?;

        let mut available_levels = electron_levels.min(proton_levels);
        for (slice, cube) in self.impurity_neutral_collisions.iter().enumerate() {
            let levels = transition_cube_levels(
                &format!("Impurity Neutral Collisions[charge-{}]", slice + 2),
                cube,
                temperature_points,
            )?;
            available_levels = available_levels.min(levels);
        }

        if self.electron_loss_collisions.is_empty() {
            return Err(RenateError::data_model(
                "DATA.RATE_TABLE_SHAPE",
                "Electron Loss Collisions must contain at least the electron-impact slice",
            ));
        }
        for (slice, rows) in self.electron_loss_collisions.iter().enumerate() {
            let levels = loss_slice_levels(slice, rows, temperature_points)?;
            available_levels = available_levels.min(levels);
        }

        Ok(RateTableShape {
            atomic_levels,
            temperature_points,
            charge_states: self.electron_loss_collisions.len() - 1,
            impurity_charge_slices: self.impurity_neutral_collisions.len(),
            available_levels: available_levels.min(atomic_levels),
        })
    }

    fn validate_temperature_axis(&self) -> RenateResult<usize> {
        if self.temperature_axis.is_empty() {
            return Err(RenateError::data_model(
                "DATA.TEMPERATURE_AXIS",
                "temperature axis is empty",
            ));
        }
        if let Some(index) = self.temperature_axis.iter().position(|t| !t.is_finite()) {
            return Err(RenateError::data_model(
                "DATA.TEMPERATURE_AXIS",
                format!("temperature axis holds a non-finite value at index {}", index),
            ));
        }
        if let Some(index) = self
            .temperature_axis
            .windows(2)
            .position(|pair| pair[1] <= pair[0])
        {
            return Err(RenateError::data_model(
                "DATA.TEMPERATURE_AXIS",
                format!(
                    "temperature axis must be strictly increasing (violated at index {})",
                    index + 1
                ),
            ));
        }
        Ok(self.temperature_axis.len())
    }

    fn validate_einstein_coeffs(&self, expected_levels: usize) -> RenateResult<usize> {
        let element_count: usize = self.einstein_coeffs.iter().map(Vec::len).sum();
        let side = integer_sqrt(element_count);
        let square = side * side == element_count
            && self.einstein_coeffs.len() == side
            && self.einstein_coeffs.iter().all(|row| row.len() == side);

        if !square || side != expected_levels {
            return Err(RenateError::data_model(
                "DATA.LEVEL_COUNT",
                format!(
                    "Einstein coefficient matrix holds {} entries; expected a {}x{} matrix for the species level dictionary",
                    element_count, expected_levels, expected_levels
                ),
            ));
        }

        for (from, row) in self.einstein_coeffs.iter().enumerate() {
            for (to, value) in row.iter().enumerate() {
                if !value.is_finite() || *value < 0.0 {
                    return Err(RenateError::data_model(
                        "DATA.SPONTANEOUS",
                        format!(
                            "Einstein coefficient [{}][{}] must be finite and non-negative, got {}",
                            from, to, value
                        ),
                    ));
                }
                if from <= to && *value != 0.0 {
                    return Err(RenateError::data_model(
                        "DATA.SPONTANEOUS",
                        format!(
                            "Einstein coefficient [{}][{}] = {} describes a non-decaying transition",
                            from, to, value
                        ),
                    ));
                }
            }
        }

        Ok(side)
    }
}

fn integer_sqrt(value: usize) -> usize {
    let mut root = (value as f64).sqrt() as usize;
    while root * root > value {
        root -= 1;
    }
    while (root + 1) * (root + 1) <= value {
        root += 1;
    }
    root
}

fn transition_cube_levels(
    name: &str,
    cube: &[Vec<Vec<f64>>],
    temperature_points: usize,
) -> RenateResult<usize> {
    let from_levels = cube.len();
    for (from, rows) in cube.iter().enumerate() {
        if rows.len() != from_levels {
            return Err(RenateError::data_model(
                "DATA.RATE_TABLE_SHAPE",
                format!(
                    "{} row {} has {} target levels, expected {}",
                    name,
                    from,
                    rows.len(),
                    from_levels
                ),
            ));
        }
        for (to, samples) in rows.iter().enumerate() {
            check_samples(name, &[from, to], samples, temperature_points)?;
        }
    }
    Ok(from_levels)
}

fn loss_slice_levels(
    slice: usize,
    rows: &[Vec<f64>],
    temperature_points: usize,
) -> RenateResult<usize> {
    let name = format!("Electron Loss Collisions[{}]", slice);
    for (from, samples) in rows.iter().enumerate() {
        check_samples(&name, &[from], samples, temperature_points)?;
    }
    Ok(rows.len())
}

fn check_samples(
    name: &str,
    index: &[usize],
    samples: &[f64],
    temperature_points: usize,
) -> RenateResult<()> {
    if samples.len() != temperature_points {
        return Err(RenateError::data_model(
            "DATA.RATE_TABLE_SHAPE",
            format!(
                "{}{:?} has {} temperature samples, expected {}",
                name,
                index,
                samples.len(),
                temperature_points
            ),
        ));
    }
    if samples.iter().any(|value| !value.is_finite()) {
        return Err(RenateError::data_model(
            "DATA.RATE_TABLE_VALUE",
            format!("{}{:?} holds a non-finite rate", name, index),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{RateTable, integer_sqrt};

    fn small_table() -> RateTable {
        let axis = vec![1.0, 2.0];
        let cube = vec![
            vec![vec![0.0, 0.0], vec![1.0, 2.0]],
            vec![vec![3.0, 4.0], vec![0.0, 0.0]],
        ];
        RateTable {
            temperature_axis: axis,
            einstein_coeffs: vec![vec![0.0, 0.0], vec![5.0, 0.0]],
            electron_neutral_collisions: cube.clone(),
            proton_neutral_collisions: cube.clone(),
            impurity_neutral_collisions: vec![cube],
            electron_loss_collisions: vec![
                vec![vec![1.0, 1.0], vec![2.0, 2.0]],
                vec![vec![1.0, 1.0], vec![2.0, 2.0]],
                vec![vec![1.0, 1.0], vec![2.0, 2.0]],
            ],
        }
    }

    #[test]
    fn consistent_table_reports_its_shape() {
        let shape = small_table().validate(2).expect("table should validate");
        assert_eq!(shape.atomic_levels, 2);
        assert_eq!(shape.temperature_points, 2);
        assert_eq!(shape.charge_states, 2);
        assert_eq!(shape.impurity_charge_slices, 1);
        assert_eq!(shape.available_levels, 2);
    }

    #[test]
    fn level_count_mismatch_is_a_data_model_error() {
        let error = small_table().validate(3).expect_err("level mismatch");
        assert_eq!(error.placeholder(), "DATA.LEVEL_COUNT");
    }

    #[test]
    fn upward_spontaneous_transition_is_rejected() {
        let mut table = small_table();
        table.einstein_coeffs[0][1] = 1.0;
        let error = table.validate(2).expect_err("upward decay");
        assert_eq!(error.placeholder(), "DATA.SPONTANEOUS");
    }

    #[test]
    fn ragged_cubes_are_rejected() {
        let mut table = small_table();
        table.proton_neutral_collisions[1][0].pop();
        let error = table.validate(2).expect_err("ragged cube");
        assert_eq!(error.placeholder(), "DATA.RATE_TABLE_SHAPE");

        let mut table = small_table();
        table.temperature_axis = vec![2.0, 1.0];
        let error = table.validate(2).expect_err("decreasing axis");
        assert_eq!(error.placeholder(), "DATA.TEMPERATURE_AXIS");
    }

    #[test]
    fn integer_sqrt_is_exact_for_perfect_squares() {
        assert_eq!(integer_sqrt(0), 0);
        assert_eq!(integer_sqrt(9), 3);
        assert_eq!(integer_sqrt(10), 3);
        assert_eq!(integer_sqrt(81), 9);
    }

    #[test]
    fn rate_table_json_uses_camel_case_keys() {
        let encoded = serde_json::to_value(small_table()).expect("serialize");
        assert!(encoded.get("temperatureAxis").is_some());
        assert!(encoded.get("einsteinCoeffs").is_some());
        assert!(encoded.get("electronLossCollisions").is_some());
    }
}
