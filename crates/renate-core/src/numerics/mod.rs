pub mod interpolation;
pub mod linalg;
pub mod runge_kutta;

pub use interpolation::{InterpolationError, RateFunction, interp_extrapolate_one, interp_loglog_one};
pub use linalg::{
    DenseComplexMatrix, DenseMatrix, EigenDecomposition, EigenError, LuDecomposition, LuError,
    eigen_decompose, lu_factorize, lu_invert, real_to_complex, transpose,
};
pub use runge_kutta::{IntegrationError, StepControl, integrate_interval};
