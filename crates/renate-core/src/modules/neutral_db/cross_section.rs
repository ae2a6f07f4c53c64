use crate::common::species::{AtomicLevel, AtomicLevelMap, BeamSpecies};
use crate::domain::{RenateError, RenateResult};
use crate::modules::plasma::{ComponentKind, PlasmaComponent};
use crate::numerics::interp_loglog_one;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::fs;
use std::path::Path;

/// Collision partner category, resolved once per plasma component.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CollisionTarget {
    Electron,
    Proton,
    Helium,
    Ion { charge: u32, atomic_number: u32 },
    Neutral { molecule: String },
}

impl CollisionTarget {
    pub fn from_component(component: &PlasmaComponent) -> Self {
        match component.kind() {
            ComponentKind::Electron => Self::Electron,
            ComponentKind::Ion => match (component.charge, component.atomic_number) {
                (1, 1) => Self::Proton,
                (2, 2) => Self::Helium,
                (charge, atomic_number) => Self::Ion {
                    charge: charge as u32,
                    atomic_number,
                },
            },
            ComponentKind::Neutral => Self::Neutral {
                molecule: component.molecule.clone().unwrap_or_else(|| {
                    format!("Z{}A{}", component.atomic_number, component.mass_number)
                }),
            },
        }
    }

    /// Key under which tabulated data for this target is stored.
    pub fn key(&self) -> String {
        match self {
            Self::Electron => "e".to_string(),
            Self::Proton => "p".to_string(),
            Self::Helium => "He2+".to_string(),
            Self::Ion {
                charge,
                atomic_number,
            } => format!("Z{}q{}", atomic_number, charge),
            Self::Neutral { molecule } => molecule.clone(),
        }
    }
}

impl Display for CollisionTarget {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.key())
    }
}

/// Beam-level transition against one target; `from == to` denotes loss
/// (ionization or charge exchange) out of `from`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TransitionDescriptor {
    pub species: BeamSpecies,
    pub target: CollisionTarget,
    pub from: AtomicLevel,
    pub to: AtomicLevel,
}

impl TransitionDescriptor {
    pub fn is_loss(&self) -> bool {
        self.from == self.to
    }
}

/// Cross-section provider: values in cm² at impact energies in eV/amu.
pub trait CrossSectionSource {
    fn cross_section(
        &self,
        transition: &TransitionDescriptor,
        energy_grid: &[f64],
    ) -> RenateResult<Vec<f64>>;
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrossSectionFile {
    pub species: BeamSpecies,
    pub energy_grid: Vec<f64>,
    pub transitions: Vec<TabulatedTransition>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TabulatedTransition {
    pub target: String,
    pub from: String,
    pub to: String,
    pub values: Vec<f64>,
}

/// Cross-sections tabulated on a shared energy grid, interpolated log-log.
#[derive(Debug, Clone, PartialEq)]
pub struct TabulatedCrossSections {
    species: BeamSpecies,
    energy_grid: Vec<f64>,
    tables: HashMap<(String, AtomicLevel, AtomicLevel), Vec<f64>>,
}

impl TabulatedCrossSections {
    pub fn from_file(file: CrossSectionFile) -> RenateResult<Self> {
        if file.energy_grid.is_empty()
            || file.energy_grid.iter().any(|energy| !energy.is_finite())
            || file.energy_grid.windows(2).any(|pair| pair[1] <= pair[0])
        {
            return Err(RenateError::data_model(
                "DATA.CROSS_SECTION",
                "cross-section energy grid must be non-empty, finite and strictly increasing",
            ));
        }

        let levels = AtomicLevelMap::for_species(file.species);
        let mut tables = HashMap::with_capacity(file.transitions.len());
        for transition in file.transitions {
            if transition.values.len() != file.energy_grid.len() {
                return Err(RenateError::data_model(
                    "DATA.CROSS_SECTION",
                    format!(
                        "cross-section {} {} -> {} has {} values for {} energies",
                        transition.target,
                        transition.from,
                        transition.to,
                        transition.values.len(),
                        file.energy_grid.len()
                    ),
                ));
            }
            if transition.values.iter().any(|value| !value.is_finite() || *value < 0.0) {
                return Err(RenateError::data_model(
                    "DATA.CROSS_SECTION",
                    format!(
                        "cross-section {} {} -> {} holds a negative or non-finite value",
                        transition.target, transition.from, transition.to
                    ),
                ));
            }
            let from = levels.level(&transition.from)?;
            let to = levels.level(&transition.to)?;
            tables.insert((transition.target, from, to), transition.values);
        }

        Ok(Self {
            species: file.species,
            energy_grid: file.energy_grid,
            tables,
        })
    }

    pub fn read(path: &Path) -> RenateResult<Self> {
        tracing::debug!(path = %path.display(), "reading neutral cross-sections");
        let source = fs::read_to_string(path).map_err(|error| {
            RenateError::io_system(
                "IO.CROSS_SECTION",
                format!("failed to read cross-section file '{}': {}", path.display(), error),
            )
        })?;
        let file: CrossSectionFile = serde_json::from_str(&source).map_err(|error| {
            RenateError::data_model(
                "DATA.CROSS_SECTION",
                format!("failed to parse cross-section file '{}': {}", path.display(), error),
            )
        })?;
        Self::from_file(file)
    }

    pub fn species(&self) -> BeamSpecies {
        self.species
    }
}

impl CrossSectionSource for TabulatedCrossSections {
    fn cross_section(
        &self,
        transition: &TransitionDescriptor,
        energy_grid: &[f64],
    ) -> RenateResult<Vec<f64>> {
        if transition.species != self.species {
            return Err(RenateError::configuration(
                "CONFIG.SPECIES",
                format!(
                    "cross-sections are tabulated for {}, not {}",
                    self.species, transition.species
                ),
            ));
        }
        let key = (transition.target.key(), transition.from, transition.to);
        let values = self.tables.get(&key).ok_or_else(|| {
            RenateError::data_model(
                "DATA.CROSS_SECTION",
                format!(
                    "no cross-section tabulated for {} on level {} -> {}",
                    transition.target,
                    transition.from.index(),
                    transition.to.index()
                ),
            )
        })?;
        Ok(energy_grid
            .iter()
            .map(|&energy| interp_loglog_one(energy, &self.energy_grid, values))
            .collect())
    }
}
