//! Dense linear algebra on `faer` storage: LU inversion and a general
//! (non-symmetric) complex eigendecomposition.
//!
//! The eigensolver reduces to Hessenberg form with Householder reflections,
//! runs Wilkinson-shifted QR sweeps to a complex Schur form and back-solves
//! the triangular factor for eigenvectors.

use faer::Mat;
use num_complex::Complex64;

pub type DenseMatrix = Mat<f64>;
pub type DenseComplexMatrix = Mat<Complex64>;

const SINGULAR_PIVOT_EPSILON: f64 = 1.0e-15;
const ILL_CONDITIONED_RELATIVE_PIVOT_EPSILON: f64 = 1.0e-12;
const QR_ITERATIONS_PER_EIGENVALUE: usize = 100;
const EXCEPTIONAL_SHIFT_PERIOD: usize = 11;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LuError {
    #[error("LU factorization requires a square matrix, got {rows}x{cols}")]
    NonSquareMatrix { rows: usize, cols: usize },
    #[error("LU factorization requires a non-empty matrix")]
    EmptyMatrix,
    #[error("matrix is singular at pivot index {pivot_index}")]
    SingularMatrix { pivot_index: usize },
    #[error("matrix is ill-conditioned at pivot index {pivot_index}")]
    IllConditionedMatrix { pivot_index: usize },
    #[error("right-hand side length mismatch: expected {expected}, got {actual}")]
    RhsLengthMismatch { expected: usize, actual: usize },
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EigenError {
    #[error("eigendecomposition requires a square matrix, got {rows}x{cols}")]
    NonSquareMatrix { rows: usize, cols: usize },
    #[error("eigendecomposition requires a non-empty matrix")]
    EmptyMatrix,
    #[error("matrix contains a non-finite entry at ({row}, {col})")]
    NonFiniteEntry { row: usize, col: usize },
    #[error("shifted QR iteration did not converge after {iterations} sweeps")]
    NoConvergence { iterations: usize },
    #[error("matrix is not diagonalizable: {0}")]
    Defective(LuError),
}

pub fn real_to_complex(matrix: &DenseMatrix) -> DenseComplexMatrix {
    Mat::from_fn(matrix.nrows(), matrix.ncols(), |row, col| {
        Complex64::new(matrix[(row, col)], 0.0)
    })
}

pub fn transpose(matrix: &DenseMatrix) -> DenseMatrix {
    Mat::from_fn(matrix.ncols(), matrix.nrows(), |row, col| matrix[(col, row)])
}

#[derive(Debug, Clone, PartialEq)]
pub struct LuDecomposition {
    lu: DenseComplexMatrix,
    pivots: Vec<usize>,
    input_norm_infty: f64,
}

impl LuDecomposition {
    pub fn dimension(&self) -> usize {
        self.lu.nrows()
    }

    pub fn invert(&self) -> Result<DenseComplexMatrix, LuError> {
        let dimension = self.dimension();
        let mut inverse = DenseComplexMatrix::zeros(dimension, dimension);
        let mut basis = vec![Complex64::new(0.0, 0.0); dimension];

        for pivot_index in 0..dimension {
            let diagonal = self.lu[(pivot_index, pivot_index)];
            if is_ill_conditioned_pivot(diagonal, self.input_norm_infty) {
                return Err(LuError::IllConditionedMatrix { pivot_index });
            }
        }

        for col in 0..dimension {
            basis.fill(Complex64::new(0.0, 0.0));
            basis[col] = Complex64::new(1.0, 0.0);

            let solution = self.solve(&basis)?;
            for row in 0..dimension {
                inverse[(row, col)] = solution[row];
            }
        }

        Ok(inverse)
    }

    pub fn solve(&self, rhs: &[Complex64]) -> Result<Vec<Complex64>, LuError> {
        let dimension = self.dimension();
        if rhs.len() != dimension {
            return Err(LuError::RhsLengthMismatch {
                expected: dimension,
                actual: rhs.len(),
            });
        }

        let mut forward = vec![Complex64::new(0.0, 0.0); dimension];
        for row in 0..dimension {
            let mut value = rhs[self.pivots[row]];
            for col in 0..row {
                value -= self.lu[(row, col)] * forward[col];
            }
            forward[row] = value;
        }

        let mut solution = vec![Complex64::new(0.0, 0.0); dimension];
        for row in (0..dimension).rev() {
            let mut value = forward[row];
            for col in (row + 1)..dimension {
                value -= self.lu[(row, col)] * solution[col];
            }

            let diagonal = self.lu[(row, row)];
            if is_effectively_zero(diagonal) {
                return Err(LuError::SingularMatrix { pivot_index: row });
            }

            solution[row] = value / diagonal;
        }

        Ok(solution)
    }
}

pub fn lu_factorize(matrix: &DenseComplexMatrix) -> Result<LuDecomposition, LuError> {
    let rows = matrix.nrows();
    let cols = matrix.ncols();
    if rows == 0 || cols == 0 {
        return Err(LuError::EmptyMatrix);
    }
    if rows != cols {
        return Err(LuError::NonSquareMatrix { rows, cols });
    }

    let dimension = rows;
    let input_norm_infty = matrix_infinity_norm(matrix);
    let mut lu = matrix.clone();
    let mut pivots: Vec<usize> = (0..dimension).collect();
    let pivot_threshold_sq = SINGULAR_PIVOT_EPSILON * SINGULAR_PIVOT_EPSILON;

    for pivot_col in 0..dimension {
        let (pivot_row, pivot_norm_sq) = select_pivot_row(&lu, pivot_col);
        if pivot_norm_sq <= pivot_threshold_sq {
            return Err(LuError::SingularMatrix {
                pivot_index: pivot_col,
            });
        }

        if pivot_row != pivot_col {
            swap_rows(&mut lu, pivot_col, pivot_row);
            pivots.swap(pivot_col, pivot_row);
        }

        let pivot = lu[(pivot_col, pivot_col)];
        for row in (pivot_col + 1)..dimension {
            lu[(row, pivot_col)] /= pivot;
            let multiplier = lu[(row, pivot_col)];
            for col in (pivot_col + 1)..dimension {
                let updated = lu[(row, col)] - multiplier * lu[(pivot_col, col)];
                lu[(row, col)] = updated;
            }
        }
    }

    Ok(LuDecomposition {
        lu,
        pivots,
        input_norm_infty,
    })
}

pub fn lu_invert(matrix: &DenseComplexMatrix) -> Result<DenseComplexMatrix, LuError> {
    lu_factorize(matrix)?.invert()
}

/// `A = V diag(λ) V⁻¹` for a diagonalizable square matrix.
#[derive(Debug, Clone, PartialEq)]
pub struct EigenDecomposition {
    eigenvalues: Vec<Complex64>,
    eigenvectors: DenseComplexMatrix,
    inverse_eigenvectors: DenseComplexMatrix,
}

impl EigenDecomposition {
    pub fn dimension(&self) -> usize {
        self.eigenvalues.len()
    }

    pub fn eigenvalues(&self) -> &[Complex64] {
        &self.eigenvalues
    }

    /// Columns are unit-norm eigenvectors ordered like `eigenvalues()`.
    pub fn eigenvectors(&self) -> &DenseComplexMatrix {
        &self.eigenvectors
    }

    pub fn inverse_eigenvectors(&self) -> &DenseComplexMatrix {
        &self.inverse_eigenvectors
    }

    /// Evaluates `V · diag(exp(λ t)) · V⁻¹ · x`, i.e. `exp(A t) x`.
    pub fn exponential_action(&self, t: f64, x: &[Complex64]) -> Vec<Complex64> {
        let dimension = self.dimension();
        let mut modal = vec![Complex64::new(0.0, 0.0); dimension];
        for row in 0..dimension {
            let mut value = Complex64::new(0.0, 0.0);
            for col in 0..dimension {
                value += self.inverse_eigenvectors[(row, col)] * x[col];
            }
            modal[row] = value * (self.eigenvalues[row] * t).exp();
        }

        let mut result = vec![Complex64::new(0.0, 0.0); dimension];
        for row in 0..dimension {
            for col in 0..dimension {
                result[row] += self.eigenvectors[(row, col)] * modal[col];
            }
        }
        result
    }
}

pub fn eigen_decompose(matrix: &DenseComplexMatrix) -> Result<EigenDecomposition, EigenError> {
    let dimension = validate_eigen_input(matrix)?;
    let mut schur = matrix.clone();
    let mut basis = identity(dimension);

    reduce_to_hessenberg(&mut schur, &mut basis);
    run_shifted_qr(&mut schur, &mut basis)?;

    let eigenvalues: Vec<Complex64> = (0..dimension).map(|k| schur[(k, k)]).collect();
    let eigenvectors = schur_eigenvectors(&schur, &basis);
    let inverse_eigenvectors = lu_invert(&eigenvectors).map_err(EigenError::Defective)?;

    Ok(EigenDecomposition {
        eigenvalues,
        eigenvectors,
        inverse_eigenvectors,
    })
}

fn validate_eigen_input(matrix: &DenseComplexMatrix) -> Result<usize, EigenError> {
    let rows = matrix.nrows();
    let cols = matrix.ncols();
    if rows == 0 || cols == 0 {
        return Err(EigenError::EmptyMatrix);
    }
    if rows != cols {
        return Err(EigenError::NonSquareMatrix { rows, cols });
    }
    for row in 0..rows {
        for col in 0..cols {
            let value = matrix[(row, col)];
            if !value.re.is_finite() || !value.im.is_finite() {
                return Err(EigenError::NonFiniteEntry { row, col });
            }
        }
    }
    Ok(rows)
}

fn identity(dimension: usize) -> DenseComplexMatrix {
    Mat::from_fn(dimension, dimension, |row, col| {
        if row == col {
            Complex64::new(1.0, 0.0)
        } else {
            Complex64::new(0.0, 0.0)
        }
    })
}

fn reduce_to_hessenberg(matrix: &mut DenseComplexMatrix, basis: &mut DenseComplexMatrix) {
    let dimension = matrix.nrows();
    if dimension < 3 {
        return;
    }

    for col in 0..(dimension - 2) {
        let start = col + 1;
        let column_norm = (start..dimension)
            .map(|row| matrix[(row, col)].norm_sqr())
            .sum::<f64>()
            .sqrt();
        if column_norm <= f64::MIN_POSITIVE {
            continue;
        }

        let leading = matrix[(start, col)];
        let phase = if leading.norm() > 0.0 {
            leading / leading.norm()
        } else {
            Complex64::new(1.0, 0.0)
        };
        let alpha = -phase * column_norm;

        let mut reflector: Vec<Complex64> = (start..dimension).map(|row| matrix[(row, col)]).collect();
        reflector[0] -= alpha;
        let reflector_norm = reflector.iter().map(|v| v.norm_sqr()).sum::<f64>().sqrt();
        if reflector_norm <= f64::MIN_POSITIVE {
            continue;
        }
        for value in &mut reflector {
            *value /= reflector_norm;
        }

        // P = I - 2 v v*, applied as P A P and accumulated into the basis.
        for target in 0..dimension {
            let mut projection = Complex64::new(0.0, 0.0);
            for (offset, v) in reflector.iter().enumerate() {
                projection += v.conj() * matrix[(start + offset, target)];
            }
            for (offset, v) in reflector.iter().enumerate() {
                let updated = matrix[(start + offset, target)] - *v * projection * 2.0;
                matrix[(start + offset, target)] = updated;
            }
        }
        apply_reflector_right(matrix, &reflector, start);
        apply_reflector_right(basis, &reflector, start);

        for row in (start + 1)..dimension {
            matrix[(row, col)] = Complex64::new(0.0, 0.0);
        }
    }
}

fn apply_reflector_right(matrix: &mut DenseComplexMatrix, reflector: &[Complex64], start: usize) {
    for row in 0..matrix.nrows() {
        let mut projection = Complex64::new(0.0, 0.0);
        for (offset, v) in reflector.iter().enumerate() {
            projection += matrix[(row, start + offset)] * *v;
        }
        for (offset, v) in reflector.iter().enumerate() {
            let updated = matrix[(row, start + offset)] - projection * v.conj() * 2.0;
            matrix[(row, start + offset)] = updated;
        }
    }
}

fn run_shifted_qr(
    hessenberg: &mut DenseComplexMatrix,
    basis: &mut DenseComplexMatrix,
) -> Result<(), EigenError> {
    let dimension = hessenberg.nrows();
    if dimension < 2 {
        return Ok(());
    }

    let scale = frobenius_norm(hessenberg).max(f64::MIN_POSITIVE);
    let max_iterations = QR_ITERATIONS_PER_EIGENVALUE * dimension;
    let mut iterations = 0;
    let mut since_deflation = 0;
    let mut active_end = dimension - 1;

    while active_end > 0 {
        let mut active_start = 0;
        for row in (1..=active_end).rev() {
            if is_negligible_subdiagonal(hessenberg, row, scale) {
                hessenberg[(row, row - 1)] = Complex64::new(0.0, 0.0);
                active_start = row;
                break;
            }
        }

        if active_start == active_end {
            active_end -= 1;
            since_deflation = 0;
            continue;
        }

        iterations += 1;
        since_deflation += 1;
        if iterations > max_iterations {
            return Err(EigenError::NoConvergence { iterations });
        }

        let shift = if since_deflation % EXCEPTIONAL_SHIFT_PERIOD == 0 {
            hessenberg[(active_end, active_end)]
                + Complex64::new(hessenberg[(active_end, active_end - 1)].norm() * 0.75, 0.0)
        } else {
            wilkinson_shift(hessenberg, active_end)
        };

        qr_sweep(hessenberg, basis, active_start, active_end, shift);
    }

    Ok(())
}

fn is_negligible_subdiagonal(matrix: &DenseComplexMatrix, row: usize, scale: f64) -> bool {
    let neighbourhood = matrix[(row - 1, row - 1)].norm() + matrix[(row, row)].norm();
    let reference = if neighbourhood > 0.0 { neighbourhood } else { scale };
    matrix[(row, row - 1)].norm() <= f64::EPSILON * reference
}

fn wilkinson_shift(matrix: &DenseComplexMatrix, end: usize) -> Complex64 {
    let a = matrix[(end - 1, end - 1)];
    let b = matrix[(end - 1, end)];
    let c = matrix[(end, end - 1)];
    let d = matrix[(end, end)];

    let half_trace = (a + d) * 0.5;
    let half_gap = (a - d) * 0.5;
    let discriminant = (half_gap * half_gap + b * c).sqrt();
    let first = half_trace + discriminant;
    let second = half_trace - discriminant;
    if (first - d).norm() <= (second - d).norm() {
        first
    } else {
        second
    }
}

fn qr_sweep(
    matrix: &mut DenseComplexMatrix,
    basis: &mut DenseComplexMatrix,
    start: usize,
    end: usize,
    shift: Complex64,
) {
    let dimension = matrix.nrows();
    for index in start..=end {
        matrix[(index, index)] -= shift;
    }

    let mut rotations = Vec::with_capacity(end - start);
    for k in start..end {
        let x = matrix[(k, k)];
        let y = matrix[(k + 1, k)];
        let radius = (x.norm_sqr() + y.norm_sqr()).sqrt();
        let (c, s) = if radius <= f64::MIN_POSITIVE {
            (Complex64::new(1.0, 0.0), Complex64::new(0.0, 0.0))
        } else {
            (x / radius, y / radius)
        };

        for col in 0..dimension {
            let upper = matrix[(k, col)];
            let lower = matrix[(k + 1, col)];
            matrix[(k, col)] = c.conj() * upper + s.conj() * lower;
            matrix[(k + 1, col)] = -s * upper + c * lower;
        }
        rotations.push((c, s));
    }

    for (offset, (c, s)) in rotations.into_iter().enumerate() {
        let k = start + offset;
        rotate_columns(matrix, k, c, s);
        rotate_columns(basis, k, c, s);
    }

    for index in start..=end {
        matrix[(index, index)] += shift;
    }
}

fn rotate_columns(matrix: &mut DenseComplexMatrix, k: usize, c: Complex64, s: Complex64) {
    for row in 0..matrix.nrows() {
        let left = matrix[(row, k)];
        let right = matrix[(row, k + 1)];
        matrix[(row, k)] = left * c + right * s;
        matrix[(row, k + 1)] = -left * s.conj() + right * c.conj();
    }
}

fn schur_eigenvectors(schur: &DenseComplexMatrix, basis: &DenseComplexMatrix) -> DenseComplexMatrix {
    let dimension = schur.nrows();
    let smallest_gap = (f64::EPSILON * frobenius_norm(schur)).max(f64::MIN_POSITIVE);
    let mut eigenvectors = DenseComplexMatrix::zeros(dimension, dimension);
    let mut triangular = vec![Complex64::new(0.0, 0.0); dimension];

    for k in 0..dimension {
        triangular.fill(Complex64::new(0.0, 0.0));
        triangular[k] = Complex64::new(1.0, 0.0);
        let lambda = schur[(k, k)];

        for row in (0..k).rev() {
            let mut sum = Complex64::new(0.0, 0.0);
            for col in (row + 1)..=k {
                sum += schur[(row, col)] * triangular[col];
            }
            let mut gap = schur[(row, row)] - lambda;
            if gap.norm() < smallest_gap {
                gap = Complex64::new(smallest_gap, 0.0);
            }
            triangular[row] = -sum / gap;
        }

        let mut norm_sq = 0.0;
        for row in 0..dimension {
            let mut value = Complex64::new(0.0, 0.0);
            for col in 0..=k {
                value += basis[(row, col)] * triangular[col];
            }
            eigenvectors[(row, k)] = value;
            norm_sq += value.norm_sqr();
        }

        let norm = norm_sq.sqrt();
        if norm > 0.0 {
            for row in 0..dimension {
                eigenvectors[(row, k)] /= norm;
            }
        }
    }

    eigenvectors
}

fn select_pivot_row(matrix: &DenseComplexMatrix, pivot_col: usize) -> (usize, f64) {
    let dimension = matrix.nrows();
    let mut best_row = pivot_col;
    let mut best_norm_sq = matrix[(pivot_col, pivot_col)].norm_sqr();

    for row in (pivot_col + 1)..dimension {
        let norm_sq = matrix[(row, pivot_col)].norm_sqr();
        if norm_sq > best_norm_sq {
            best_norm_sq = norm_sq;
            best_row = row;
        }
    }

    (best_row, best_norm_sq)
}

fn swap_rows(matrix: &mut DenseComplexMatrix, lhs: usize, rhs: usize) {
    if lhs == rhs {
        return;
    }

    for col in 0..matrix.ncols() {
        let value = matrix[(lhs, col)];
        matrix[(lhs, col)] = matrix[(rhs, col)];
        matrix[(rhs, col)] = value;
    }
}

fn is_effectively_zero(value: Complex64) -> bool {
    value.norm_sqr() <= SINGULAR_PIVOT_EPSILON * SINGULAR_PIVOT_EPSILON
}

fn is_ill_conditioned_pivot(pivot: Complex64, input_norm_infty: f64) -> bool {
    pivot.norm() <= input_norm_infty * ILL_CONDITIONED_RELATIVE_PIVOT_EPSILON
}

fn matrix_infinity_norm(matrix: &DenseComplexMatrix) -> f64 {
    let mut best_row_sum: f64 = 0.0;
    for row in 0..matrix.nrows() {
        let mut row_sum = 0.0;
        for col in 0..matrix.ncols() {
            row_sum += matrix[(row, col)].norm();
        }
        best_row_sum = best_row_sum.max(row_sum);
    }
    best_row_sum
}

fn frobenius_norm(matrix: &DenseComplexMatrix) -> f64 {
    let mut sum = 0.0;
    for row in 0..matrix.nrows() {
        for col in 0..matrix.ncols() {
            sum += matrix[(row, col)].norm_sqr();
        }
    }
    sum.sqrt()
}

#[cfg(test)]
mod tests {
    use super::{
        DenseComplexMatrix, DenseMatrix, EigenError, LuError, eigen_decompose, lu_factorize,
        lu_invert, real_to_complex, transpose,
    };
    use faer::Mat;
    use num_complex::Complex64;

    fn eigenvalues(matrix: &DenseComplexMatrix) -> Result<Vec<Complex64>, EigenError> {
        eigen_decompose(matrix).map(|decomposition| decomposition.eigenvalues().to_vec())
    }

    fn real_matrix(rows: &[&[f64]]) -> DenseMatrix {
        Mat::from_fn(rows.len(), rows[0].len(), |row, col| rows[row][col])
    }

    fn complex_matrix(rows: &[&[f64]]) -> DenseComplexMatrix {
        real_to_complex(&real_matrix(rows))
    }

    fn sorted_real_parts(values: &[Complex64]) -> Vec<f64> {
        let mut parts: Vec<f64> = values.iter().map(|value| value.re).collect();
        parts.sort_by(|lhs, rhs| lhs.total_cmp(rhs));
        parts
    }

    fn assert_eigenpairs(matrix: &DenseComplexMatrix, tolerance: f64) {
        let decomposition = eigen_decompose(matrix).expect("decomposition should succeed");
        let dimension = matrix.nrows();
        for k in 0..dimension {
            let lambda = decomposition.eigenvalues()[k];
            for row in 0..dimension {
                let mut lhs = Complex64::new(0.0, 0.0);
                for col in 0..dimension {
                    lhs += matrix[(row, col)] * decomposition.eigenvectors()[(col, k)];
                }
                let rhs = lambda * decomposition.eigenvectors()[(row, k)];
                assert!(
                    (lhs - rhs).norm() <= tolerance,
                    "A v != λ v for eigenpair {} row {}: {} vs {}",
                    k,
                    row,
                    lhs,
                    rhs
                );
            }
        }
    }

    #[test]
    fn lu_inverse_multiplies_back_to_identity() {
        let matrix = complex_matrix(&[&[0.0, 2.0, 1.0], &[1.0, -2.0, 0.5], &[3.0, 1.0, -1.0]]);
        let inverse = lu_invert(&matrix).expect("matrix should be invertible");
        for row in 0..3 {
            for col in 0..3 {
                let mut value = Complex64::new(0.0, 0.0);
                for inner in 0..3 {
                    value += matrix[(row, inner)] * inverse[(inner, col)];
                }
                let expected = if row == col { 1.0 } else { 0.0 };
                assert!((value - Complex64::new(expected, 0.0)).norm() <= 1.0e-12);
            }
        }
    }

    #[test]
    fn lu_rejects_singular_and_rectangular_input() {
        let singular = complex_matrix(&[&[1.0, 2.0], &[2.0, 4.0]]);
        assert!(matches!(
            lu_factorize(&singular),
            Err(LuError::SingularMatrix { .. })
        ));

        let rectangular = DenseComplexMatrix::zeros(2, 3);
        assert_eq!(
            lu_factorize(&rectangular),
            Err(LuError::NonSquareMatrix { rows: 2, cols: 3 })
        );
    }

    #[test]
    fn eigenvalues_of_triangular_matrix_are_its_diagonal() {
        let matrix = complex_matrix(&[&[-3.0, 0.0, 0.0], &[1.0, -2.0, 0.0], &[0.5, 0.25, -1.0]]);
        let values = eigenvalues(&matrix).expect("eigenvalues should converge");
        let parts = sorted_real_parts(&values);
        for (actual, expected) in parts.iter().zip([-3.0, -2.0, -1.0]) {
            assert!((actual - expected).abs() <= 1.0e-12);
        }
        assert_eigenpairs(&matrix, 1.0e-10);
    }

    #[test]
    fn symmetric_two_by_two_has_known_spectrum() {
        let matrix = complex_matrix(&[&[2.0, 1.0], &[1.0, 2.0]]);
        let values = eigenvalues(&matrix).expect("eigenvalues should converge");
        let parts = sorted_real_parts(&values);
        assert!((parts[0] - 1.0).abs() <= 1.0e-12);
        assert!((parts[1] - 3.0).abs() <= 1.0e-12);
        assert_eigenpairs(&matrix, 1.0e-10);
    }

    #[test]
    fn rotation_generator_has_imaginary_spectrum() {
        let matrix = complex_matrix(&[&[0.0, -1.0, 0.0], &[1.0, 0.0, 0.0], &[0.0, 0.0, -0.5]]);
        let values = eigenvalues(&matrix).expect("eigenvalues should converge");
        let mut imaginary: Vec<f64> = values.iter().map(|value| value.im).collect();
        imaginary.sort_by(|lhs, rhs| lhs.total_cmp(rhs));
        assert!((imaginary[0] + 1.0).abs() <= 1.0e-10);
        assert!(imaginary[1].abs() <= 1.0e-10);
        assert!((imaginary[2] - 1.0).abs() <= 1.0e-10);
        assert_eigenpairs(&matrix, 1.0e-10);
    }

    #[test]
    fn dense_rate_matrix_eigenpairs_are_consistent() {
        let matrix = complex_matrix(&[
            &[-5.0, 1.0, 0.5, 0.2],
            &[2.0, -4.0, 0.3, 0.1],
            &[1.5, 2.0, -3.5, 0.4],
            &[0.7, 0.2, 1.1, -2.0],
        ]);
        assert_eigenpairs(&matrix, 1.0e-9);
    }

    #[test]
    fn exponential_action_matches_scalar_exponential() {
        let matrix = complex_matrix(&[&[-0.7]]);
        let decomposition = eigen_decompose(&matrix).expect("scalar decomposition");
        let result = decomposition.exponential_action(2.0, &[Complex64::new(3.0, 0.0)]);
        assert!((result[0].re - 3.0 * (-1.4_f64).exp()).abs() <= 1.0e-14);
        assert!(result[0].im.abs() <= 1.0e-14);
    }

    #[test]
    fn defective_matrix_is_reported() {
        let jordan = complex_matrix(&[&[1.0, 1.0], &[0.0, 1.0]]);
        assert!(matches!(
            eigen_decompose(&jordan),
            Err(EigenError::Defective(_))
        ));
    }

    #[test]
    fn eigen_rejects_non_finite_entries() {
        let matrix = complex_matrix(&[&[1.0, f64::NAN], &[0.0, 1.0]]);
        assert_eq!(
            eigenvalues(&matrix),
            Err(EigenError::NonFiniteEntry { row: 0, col: 1 })
        );
    }

    #[test]
    fn transpose_swaps_indices() {
        let matrix = real_matrix(&[&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]]);
        let transposed = transpose(&matrix);
        assert_eq!(transposed.nrows(), 3);
        assert_eq!(transposed.ncols(), 2);
        assert_eq!(transposed[(2, 1)], 6.0);
        assert_eq!(transposed[(0, 1)], 4.0);
    }
}
