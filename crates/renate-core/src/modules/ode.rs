//! Population evolution `dN/dz = N · M(z)` along the beamlet grid.
//!
//! `N` is a row vector, so component `to` evolves as
//! `Σ_from N[from] · M[from, to]`. The numerical path interpolates `M`
//! linearly between grid nodes. The analytical path diagonalizes a constant
//! matrix and is only exact when `M` does not depend on `z`.

use crate::domain::{RenateError, RenateResult, SolverKind, SolverSettings};
use crate::numerics::{
    DenseMatrix, EigenDecomposition, StepControl, eigen_decompose, integrate_interval,
    real_to_complex, transpose,
};
use num_complex::Complex64;

/// Relative spread above which the matrix is treated as position dependent.
const CONSTANT_MATRIX_TOLERANCE: f64 = 1.0e-12;

/// Imaginary residue tolerated when projecting complex populations back.
const IMAGINARY_TOLERANCE: f64 = 1.0e-8;

#[derive(Debug, Clone)]
pub struct Ode {
    grid: Vec<f64>,
    matrices: Vec<DenseMatrix>,
    initial: Vec<f64>,
}

impl Ode {
    pub fn new(grid: &[f64], matrices: &[DenseMatrix], initial: &[f64]) -> RenateResult<Self> {
        if matrices.is_empty() {
            return Err(RenateError::null_input(
                "INPUT.NULL",
                "coefficient matrix is missing",
            ));
        }
        if initial.is_empty() {
            return Err(RenateError::null_input(
                "INPUT.NULL",
                "initial condition is missing",
            ));
        }
        if grid.len() != matrices.len() {
            return Err(RenateError::configuration(
                "INPUT.DIMENSION",
                format!(
                    "{} coefficient matrices supplied for {} grid points",
                    matrices.len(),
                    grid.len()
                ),
            ));
        }
        for (step, matrix) in matrices.iter().enumerate() {
            if matrix.nrows() != initial.len() || matrix.ncols() != initial.len() {
                return Err(RenateError::configuration(
                    "INPUT.DIMENSION",
                    format!(
                        "coefficient matrix at step {} is {}x{} but the initial condition has {} levels",
                        step,
                        matrix.nrows(),
                        matrix.ncols(),
                        initial.len()
                    ),
                ));
            }
        }
        if initial.iter().any(|value| !value.is_finite()) {
            return Err(RenateError::configuration(
                "INPUT.INITIAL_CONDITION",
                "initial condition holds a non-finite population",
            ));
        }

        Ok(Self {
            grid: grid.to_vec(),
            matrices: matrices.to_vec(),
            initial: initial.to_vec(),
        })
    }

    pub fn grid(&self) -> &[f64] {
        &self.grid
    }

    pub fn levels(&self) -> usize {
        self.initial.len()
    }

    /// Dispatches on `settings.solver`.
    pub fn solve(&self, settings: &SolverSettings) -> RenateResult<Vec<Vec<f64>>> {
        match settings.solver {
            SolverKind::Numerical => self.calculate_solution(settings),
            SolverKind::Analytical => self.analytical_solution(),
        }
    }

    /// Adaptive integration through every grid node; returns `[step][level]`.
    pub fn calculate_solution(&self, settings: &SolverSettings) -> RenateResult<Vec<Vec<f64>>> {
        settings.validate()?;
        let control = StepControl {
            relative_tolerance: settings.relative_tolerance,
            absolute_tolerance: settings.absolute_tolerance,
            max_substeps: settings.max_substeps,
        };

        let levels = self.levels();
        let mut state = self.initial.clone();
        let mut solution = Vec::with_capacity(self.grid.len());
        solution.push(state.clone());

        let mut step_size = 0.0;
        let mut substeps = 0;
        for segment in 0..self.grid.len().saturating_sub(1) {
            let start = self.grid[segment];
            let end = self.grid[segment + 1];
            let left = &self.matrices[segment];
            let right = &self.matrices[segment + 1];
            let mut derivative = |z: f64, populations: &[f64], rates: &mut [f64]| {
                let weight = (z - start) / (end - start);
                for to in 0..levels {
                    let mut value = 0.0;
                    for from in 0..levels {
                        let entry = left[(from, to)] + weight * (right[(from, to)] - left[(from, to)]);
                        value += populations[from] * entry;
                    }
                    rates[to] = value;
                }
            };

            substeps += integrate_interval(&mut derivative, &mut state, start, end, &mut step_size, control)
                .map_err(|error| {
                    RenateError::computation(
                        "SOLVER.INTEGRATION",
                        format!("numerical integration failed on segment {}: {}", segment, error),
                    )
                })?;
            solution.push(state.clone());
        }

        tracing::debug!(steps = self.grid.len(), substeps, "numerical solution finished");
        Ok(solution)
    }

    /// Closed-form `N(z) = N₀ · exp(M (z - z₀))` for a z-independent matrix.
    pub fn analytical_solution(&self) -> RenateResult<Vec<Vec<f64>>> {
        if !self.is_constant() {
            return Err(RenateError::configuration(
                "SOLVER.NON_CONSTANT_MATRIX",
                "the analytical solution requires a coefficient matrix that is constant along the grid",
            ));
        }

        let decomposition = decompose(&self.matrices[0])?;
        let origin = self.grid[0];
        let initial = to_complex(&self.initial);
        self.grid
            .iter()
            .map(|&z| to_real(&decomposition.exponential_action(z - origin, &initial), z))
            .collect()
    }

    /// Chains constant-matrix solutions segment by segment, holding each
    /// segment at its left-node matrix.
    pub fn piecewise_constant_solution(&self) -> RenateResult<Vec<Vec<f64>>> {
        let mut state = self.initial.clone();
        let mut solution = Vec::with_capacity(self.grid.len());
        solution.push(state.clone());

        for segment in 0..self.grid.len().saturating_sub(1) {
            let span = self.grid[segment + 1] - self.grid[segment];
            let decomposition = decompose(&self.matrices[segment])?;
            state = to_real(
                &decomposition.exponential_action(span, &to_complex(&state)),
                self.grid[segment + 1],
            )?;
            solution.push(state.clone());
        }
        Ok(solution)
    }

    fn is_constant(&self) -> bool {
        let reference = &self.matrices[0];
        let scale = (0..reference.nrows())
            .flat_map(|row| (0..reference.ncols()).map(move |col| (row, col)))
            .map(|index| reference[index].abs())
            .fold(0.0_f64, f64::max)
            .max(f64::MIN_POSITIVE);

        self.matrices.iter().skip(1).all(|matrix| {
            (0..reference.nrows()).all(|row| {
                (0..reference.ncols())
                    .all(|col| (matrix[(row, col)] - reference[(row, col)]).abs() <= CONSTANT_MATRIX_TOLERANCE * scale)
            })
        })
    }
}

fn decompose(matrix: &DenseMatrix) -> RenateResult<EigenDecomposition> {
    // Row-vector evolution: N(z)ᵀ = exp(Mᵀ z) N₀ᵀ.
    eigen_decompose(&real_to_complex(&transpose(matrix))).map_err(|error| {
        RenateError::computation(
            "SOLVER.EIGEN",
            format!("eigendecomposition of the coefficient matrix failed: {}", error),
        )
    })
}

fn to_complex(values: &[f64]) -> Vec<Complex64> {
    values.iter().map(|&value| Complex64::new(value, 0.0)).collect()
}

fn to_real(values: &[Complex64], position: f64) -> RenateResult<Vec<f64>> {
    let magnitude = values.iter().map(|value| value.norm()).fold(0.0_f64, f64::max);
    values
        .iter()
        .map(|value| {
            if !(value.re.is_finite() && value.im.is_finite()) {
                return Err(RenateError::computation(
                    "SOLVER.NON_FINITE",
                    format!("analytical solution became non-finite at z = {}", position),
                ));
            }
            if value.im.abs() > IMAGINARY_TOLERANCE * magnitude.max(1.0) {
                return Err(RenateError::computation(
                    "SOLVER.COMPLEX_POPULATION",
                    format!(
                        "analytical solution left a complex population {} at z = {}",
                        value, position
                    ),
                ));
            }
            Ok(value.re)
        })
        .collect()
}
