use crate::common::constants::{KEV_TO_JOULE, SPEED_OF_LIGHT};
use crate::common::species::BeamSpecies;
use crate::domain::{RenateError, RenateResult};
use serde::{Deserialize, Serialize};

/// Beam record: projectile species, kinetic energy (keV) and current (A).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeamletParameters {
    pub species: BeamSpecies,
    pub energy: f64,
    pub current: f64,
}

impl BeamletParameters {
    pub fn new(species: BeamSpecies, energy: f64, current: f64) -> RenateResult<Self> {
        let parameters = Self {
            species,
            energy,
            current,
        };
        parameters.validate()?;
        Ok(parameters)
    }

    pub fn validate(&self) -> RenateResult<()> {
        if !(self.energy.is_finite() && self.energy > 0.0) {
            return Err(RenateError::configuration(
                "CONFIG.ENERGY",
                format!("beam energy must be positive and finite, got {} keV", self.energy),
            ));
        }
        if !(self.current.is_finite() && self.current > 0.0) {
            return Err(RenateError::configuration(
                "CONFIG.CURRENT",
                format!("beam current must be positive and finite, got {} A", self.current),
            ));
        }
        Ok(())
    }

    /// Projectile rest mass in kg.
    pub fn mass(&self) -> f64 {
        self.species.mass_kg()
    }

    /// Relativistic speed in m/s.
    pub fn velocity(&self) -> f64 {
        let rest_energy = self.mass() * SPEED_OF_LIGHT * SPEED_OF_LIGHT;
        let gamma = 1.0 + self.energy * KEV_TO_JOULE / rest_energy;
        SPEED_OF_LIGHT * (1.0 - 1.0 / (gamma * gamma)).sqrt()
    }
}
