use crate::common::constants::CM2_TO_M2;
use crate::domain::{RenateError, RenateResult};
use crate::numerics::{InterpolationError, RateFunction};

/// Builds one m² rate function per `from` level out of a loss slice.
pub(super) fn loss_functions(
    axis: &[f64],
    rows: &[Vec<f64>],
    ceiling: usize,
    mass_ratio: f64,
) -> RenateResult<Vec<RateFunction>> {
    rows.iter()
        .take(ceiling)
        .map(|samples| rate_function(axis, samples, mass_ratio))
        .collect()
}

/// Builds the `[from][to]` rate functions of a transition cube; the diagonal
/// is zero-valued because a level never transitions into itself.
pub(super) fn transition_functions(
    axis: &[f64],
    cube: &[Vec<Vec<f64>>],
    ceiling: usize,
    mass_ratio: f64,
) -> RenateResult<Vec<Vec<RateFunction>>> {
    let mut grid = Vec::with_capacity(ceiling);
    for (from, rows) in cube.iter().take(ceiling).enumerate() {
        let mut row = Vec::with_capacity(ceiling);
        for (to, samples) in rows.iter().take(ceiling).enumerate() {
            let function = if from == to {
                RateFunction::zero(&scaled_axis(axis, mass_ratio)).map_err(rate_function_error)?
            } else {
                rate_function(axis, samples, mass_ratio)?
            };
            row.push(function);
        }
        grid.push(row);
    }
    Ok(grid)
}

fn scaled_axis(axis: &[f64], mass_ratio: f64) -> Vec<f64> {
    axis.iter().map(|temperature| temperature * mass_ratio).collect()
}

fn rate_function(axis: &[f64], samples: &[f64], mass_ratio: f64) -> RenateResult<RateFunction> {
    RateFunction::new(axis.to_vec(), samples.to_vec())
        .and_then(|function| function.with_scaled_axis(mass_ratio))
        .map(|function| function.with_scaled_values(CM2_TO_M2))
        .map_err(rate_function_error)
}

fn rate_function_error(error: InterpolationError) -> RenateError {
    RenateError::data_model(
        "DATA.RATE_FUNCTION",
        format!("failed to build rate interpolant: {}", error),
    )
}
