//! Beamlet pipeline: matrix assembly, population integration and the
//! observables derived from the population trajectory.

mod parameters;

pub use parameters::BeamletParameters;

use crate::common::constants::ELEMENTARY_CHARGE;
use crate::common::species::AtomicLevel;
use crate::domain::{RenateError, RenateResult, SolverSettings};
use crate::modules::atomic_db::AtomicDb;
use crate::modules::coefficient_matrix::CoefficientMatrix;
use crate::modules::neutral_db::NeutralDb;
use crate::modules::ode::Ode;
use crate::modules::plasma::BeamletProfiles;
use serde::Serialize;

pub const LINEAR_DENSITY_ATTENUATION: &str = "linear_density_attenuation";

pub fn level_column(label: &str) -> String {
    format!("level {}", label)
}

pub fn relative_population_column(label: &str) -> String {
    format!("rel.pop {}", label)
}

pub fn transition_column(from: &str, to: &str) -> String {
    format!("{}-->{}", from, to)
}

/// Scalar digest of a solved beamlet.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BeamletSummary {
    pub species: String,
    pub energy: f64,
    pub velocity: f64,
    pub atomic_levels: usize,
    pub grid_points: usize,
    pub level_labels: Vec<String>,
    pub final_populations: Vec<f64>,
    pub final_relative_populations: Vec<f64>,
    pub final_linear_density: f64,
    pub emission_label: String,
    pub peak_emission_density: f64,
}

/// A solved beamlet; the atomic database is borrowed, never copied.
#[derive(Debug, Clone)]
pub struct Beamlet<'db> {
    parameters: BeamletParameters,
    profiles: BeamletProfiles,
    atomic_db: &'db AtomicDb,
    coefficient_matrix: CoefficientMatrix,
    populations: Vec<Vec<f64>>,
}

impl<'db> Beamlet<'db> {
    /// Assembles the rate matrix, integrates from a ground-state beam and
    /// stores one `level <label>` column per level.
    pub fn new(
        parameters: BeamletParameters,
        profiles: BeamletProfiles,
        atomic_db: &'db AtomicDb,
        neutral_db: Option<&NeutralDb>,
        settings: &SolverSettings,
    ) -> RenateResult<Self> {
        parameters.validate()?;
        if atomic_db.species() != parameters.species || atomic_db.energy_kev() != parameters.energy {
            return Err(RenateError::configuration(
                "CONFIG.DATABASE_MISMATCH",
                format!(
                    "atomic database was built for {} at {} keV but the beamlet is {} at {} keV",
                    atomic_db.species(),
                    atomic_db.energy_kev(),
                    parameters.species,
                    parameters.energy
                ),
            ));
        }

        let velocity = parameters.velocity();
        let coefficient_matrix =
            CoefficientMatrix::assemble(&profiles, atomic_db, velocity, neutral_db)?;

        let levels = atomic_db.atomic_ceiling();
        let mut initial = vec![0.0; levels];
        initial[0] = 1.0;
        let ode = Ode::new(profiles.grid(), coefficient_matrix.matrix(), &initial)?;
        let populations = ode.solve(settings)?;

        let mut beamlet = Self {
            parameters,
            profiles,
            atomic_db,
            coefficient_matrix,
            populations,
        };
        for (level, label) in atomic_db.levels().iter() {
            let column = beamlet.population(level);
            beamlet.profiles.set_column(level_column(label), column)?;
        }

        tracing::info!(
            species = %parameters.species,
            energy = parameters.energy,
            levels,
            steps = beamlet.profiles.steps(),
            solver = %settings.solver,
            "beamlet solution finished"
        );
        Ok(beamlet)
    }

    pub fn parameters(&self) -> &BeamletParameters {
        &self.parameters
    }

    pub fn profiles(&self) -> &BeamletProfiles {
        &self.profiles
    }

    pub fn atomic_db(&self) -> &'db AtomicDb {
        self.atomic_db
    }

    pub fn coefficient_matrix(&self) -> &CoefficientMatrix {
        &self.coefficient_matrix
    }

    /// `[step][level]`
    pub fn populations(&self) -> &[Vec<f64>] {
        &self.populations
    }

    pub fn population(&self, level: AtomicLevel) -> Vec<f64> {
        self.populations
            .iter()
            .map(|state| state[level.index()])
            .collect()
    }

    /// Populations divided by the `reference` level (ground by default),
    /// stored as `rel.pop <label>` columns.
    pub fn compute_relative_populations(
        &mut self,
        reference: Option<AtomicLevel>,
    ) -> RenateResult<Vec<Vec<f64>>> {
        let reference = match reference {
            Some(level) => level,
            None => self.atomic_db.set_default_atomic_levels()?.ground,
        };
        self.atomic_db.label(reference)?;

        let denominators = self.population(reference);
        if let Some(step) = denominators.iter().position(|value| *value == 0.0) {
            return Err(RenateError::computation(
                "OBSERVABLE.ZERO_REFERENCE",
                format!("reference level population vanishes at grid step {}", step),
            ));
        }

        let atomic_db = self.atomic_db;
        let mut relative = Vec::with_capacity(atomic_db.atomic_ceiling());
        for (level, label) in atomic_db.levels().iter() {
            let column: Vec<f64> = self
                .population(level)
                .iter()
                .zip(denominators.iter())
                .map(|(population, reference)| population / reference)
                .collect();
            self.profiles
                .set_column(relative_population_column(label), column.clone())?;
            relative.push(column);
        }
        Ok(relative)
    }

    /// Photon emission per unit length for `from -> to` (the species'
    /// canonical line by default): `N_from · A[from, to] / v`.
    pub fn compute_linear_emission_density(
        &mut self,
        transition: Option<(AtomicLevel, AtomicLevel)>,
    ) -> RenateResult<Vec<f64>> {
        let (from, to) = match transition {
            Some(pair) => pair,
            None => {
                let defaults = self.atomic_db.set_default_atomic_levels()?;
                (defaults.from, defaults.to)
            }
        };
        let atomic_db = self.atomic_db;
        let from_label = atomic_db.label(from)?;
        let to_label = atomic_db.label(to)?;
        if from <= to {
            return Err(RenateError::invalid_transition(
                "TRANSITION.INVALID",
                format!(
                    "{} -> {} is not a spontaneous transition; the upper level must come first",
                    from_label, to_label
                ),
            ));
        }

        let coefficient = atomic_db.spontaneous_rate(from, to) / self.parameters.velocity();
        let emission: Vec<f64> = self
            .population(from)
            .iter()
            .map(|population| population * coefficient)
            .collect();
        self.profiles
            .set_column(transition_column(from_label, to_label), emission.clone())?;
        Ok(emission)
    }

    /// Beam particles per metre: `Σ N · I / (e v)`.
    pub fn compute_linear_density_attenuation(&mut self) -> RenateResult<Vec<f64>> {
        let scale = self.parameters.current / (ELEMENTARY_CHARGE * self.parameters.velocity());
        let density: Vec<f64> = self
            .populations
            .iter()
            .map(|state| state.iter().sum::<f64>() * scale)
            .collect();
        self.profiles
            .set_column(LINEAR_DENSITY_ATTENUATION, density.clone())?;
        Ok(density)
    }

    /// Runs every derived observable at its defaults and digests the result.
    pub fn summary(&mut self) -> RenateResult<BeamletSummary> {
        let relative = self.compute_relative_populations(None)?;
        let emission = self.compute_linear_emission_density(None)?;
        let linear_density = self.compute_linear_density_attenuation()?;
        let defaults = self.atomic_db.set_default_atomic_levels()?;

        let last = self.populations.len() - 1;
        Ok(BeamletSummary {
            species: self.parameters.species.to_string(),
            energy: self.parameters.energy,
            velocity: self.parameters.velocity(),
            atomic_levels: self.atomic_db.atomic_ceiling(),
            grid_points: self.populations.len(),
            level_labels: self.atomic_db.levels().labels().to_vec(),
            final_populations: self.populations[last].clone(),
            final_relative_populations: relative.iter().map(|column| column[last]).collect(),
            final_linear_density: linear_density[last],
            emission_label: defaults.label.to_string(),
            peak_emission_density: emission.iter().copied().fold(0.0_f64, f64::max),
        })
    }
}
