pub mod errors;

pub use errors::{RenateError, RenateErrorCategory, RenateResult};

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverKind {
    #[default]
    Numerical,
    Analytical,
}

impl SolverKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Numerical => "numerical",
            Self::Analytical => "analytical",
        }
    }
}

impl Display for SolverKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

impl FromStr for SolverKind {
    type Err = RenateError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "numerical" => Ok(Self::Numerical),
            "analytical" => Ok(Self::Analytical),
            other => Err(RenateError::configuration(
                "CONFIG.SOLVER",
                format!("solver '{}' is not supported (expected numerical or analytical)", other),
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SolverSettings {
    pub solver: SolverKind,
    pub relative_tolerance: f64,
    pub absolute_tolerance: f64,
    pub max_substeps: usize,
}

impl Default for SolverSettings {
    fn default() -> Self {
        Self {
            solver: SolverKind::Numerical,
            relative_tolerance: 1.0e-10,
            absolute_tolerance: 1.0e-14,
            max_substeps: 100_000,
        }
    }
}

impl SolverSettings {
    pub fn validate(&self) -> RenateResult<()> {
        if !(self.relative_tolerance.is_finite() && self.relative_tolerance > 0.0) {
            return Err(RenateError::configuration(
                "CONFIG.SOLVER_TOLERANCE",
                format!(
                    "relative tolerance must be positive, got {}",
                    self.relative_tolerance
                ),
            ));
        }
        if !(self.absolute_tolerance.is_finite() && self.absolute_tolerance > 0.0) {
            return Err(RenateError::configuration(
                "CONFIG.SOLVER_TOLERANCE",
                format!(
                    "absolute tolerance must be positive, got {}",
                    self.absolute_tolerance
                ),
            ));
        }
        if self.max_substeps == 0 {
            return Err(RenateError::configuration(
                "CONFIG.SOLVER_SUBSTEPS",
                "maximum substep count must be at least 1",
            ));
        }
        Ok(())
    }
}
