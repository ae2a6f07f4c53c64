//! Atomic level database for one projectile species at a fixed beam energy.
//!
//! Every rate function is built once at construction from the raw rate
//! table, converted to m² and, for plasma ions, stretched along the
//! temperature axis by `A / impurity_mass_normalization(q)`. The database
//! is immutable afterwards and is shared by reference with the matrix
//! assembler.

mod rate_grid;

use crate::common::constants::{charge_state_label, impurity_mass_normalization};
use crate::common::species::{AtomicLevel, AtomicLevelMap, BeamSpecies};
use crate::domain::{RenateError, RenateResult};
use crate::modules::plasma::PlasmaComponents;
use crate::modules::rates::{RateTable, RateTableSource};
use crate::numerics::{DenseMatrix, RateFunction};
use faer::Mat;
use rate_grid::{loss_functions, transition_functions};

/// Plasma ion that collides with the beam, in component-table order.
#[derive(Debug, Clone, PartialEq)]
pub struct IonTarget {
    pub component_index: usize,
    pub charge: usize,
    pub atomic_number: u32,
    pub mass_number: u32,
    pub mass_ratio: f64,
}

/// Resolved canonical emission line of the species.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultLevels {
    pub from: AtomicLevel,
    pub to: AtomicLevel,
    pub ground: AtomicLevel,
    pub label: &'static str,
}

#[derive(Debug, Clone)]
pub struct AtomicDb {
    species: BeamSpecies,
    energy_kev: f64,
    components: PlasmaComponents,
    levels: AtomicLevelMap,
    atomic_levels: usize,
    atomic_ceiling: usize,
    temperature_axis: Vec<f64>,
    spontaneous: DenseMatrix,
    charged_states: Vec<String>,
    electron_impact_loss: Vec<RateFunction>,
    electron_impact_trans: Vec<Vec<RateFunction>>,
    ion_targets: Vec<IonTarget>,
    ion_impact_loss: Vec<Vec<RateFunction>>,
    ion_impact_trans: Vec<Vec<Vec<RateFunction>>>,
}

impl AtomicDb {
    /// Loads the rate table for `(species, energy_kev)` from `source` and
    /// builds the database for the given plasma composition.
    pub fn load<S>(
        source: &S,
        species: BeamSpecies,
        energy_kev: f64,
        components: &PlasmaComponents,
        atomic_ceiling: Option<usize>,
    ) -> RenateResult<Self>
    where
        S: RateTableSource + ?Sized,
    {
        validate_energy(energy_kev)?;
        let table = source.load_rate_table(species, energy_kev)?;
        Self::from_table(species, energy_kev, &table, components, atomic_ceiling)
    }

    pub fn from_table(
        species: BeamSpecies,
        energy_kev: f64,
        table: &RateTable,
        components: &PlasmaComponents,
        atomic_ceiling: Option<usize>,
    ) -> RenateResult<Self> {
        validate_energy(energy_kev)?;
        let shape = table.validate(species.atomic_levels())?;
        tracing::debug!(
            species = %species,
            energy_kev,
            atomic_levels = shape.atomic_levels,
            temperature_points = shape.temperature_points,
            charge_states = shape.charge_states,
            "validated rate table"
        );

        let atomic_ceiling = atomic_ceiling.unwrap_or(shape.atomic_levels);
        if atomic_ceiling == 0 || atomic_ceiling > shape.available_levels {
            return Err(RenateError::data_model(
                "DATA.ATOMIC_CEILING",
                format!(
                    "atomic ceiling {} must lie in 1..={} (levels available in every rate table)",
                    atomic_ceiling, shape.available_levels
                ),
            ));
        }

        let axis = table.temperature_axis.as_slice();
        let charged_states = (1..=shape.charge_states).map(charge_state_label).collect();
        let spontaneous = Mat::from_fn(atomic_ceiling, atomic_ceiling, |from, to| {
            table.einstein_coeffs[from][to]
        });

        let electron_impact_loss =
            loss_functions(axis, &table.electron_loss_collisions[0], atomic_ceiling, 1.0)?;
        let electron_impact_trans = transition_functions(
            axis,
            &table.electron_neutral_collisions,
            atomic_ceiling,
            1.0,
        )?;

        let mut ion_targets = Vec::new();
        let mut loss_by_target = Vec::new();
        let mut trans_by_target = Vec::new();
        for (component_index, component) in components.ions() {
            let charge = component.charge as usize;
            let target = ion_target(component_index, charge, component.atomic_number, component.mass_number)?;
            if charge > shape.charge_states {
                return Err(RenateError::data_model(
                    "DATA.CHARGE_STATE",
                    format!(
                        "rate table provides loss rates up to {} only; {} requires {}",
                        charge_state_label(shape.charge_states),
                        components.name(component_index).unwrap_or("ion"),
                        charge_state_label(charge)
                    ),
                ));
            }

            let cube = if charge == 1 {
                &table.proton_neutral_collisions
            } else {
                table.impurity_neutral_collisions.get(charge - 2).ok_or_else(|| {
                    RenateError::data_model(
                        "DATA.CHARGE_STATE",
                        format!(
                            "rate table has no impurity transition slice for {}",
                            charge_state_label(charge)
                        ),
                    )
                })?
            };

            loss_by_target.push(loss_functions(
                axis,
                &table.electron_loss_collisions[charge],
                atomic_ceiling,
                target.mass_ratio,
            )?);
            trans_by_target.push(transition_functions(
                axis,
                cube,
                atomic_ceiling,
                target.mass_ratio,
            )?);
            ion_targets.push(target);
        }

        let ion_impact_loss = (0..atomic_ceiling)
            .map(|from| {
                loss_by_target
                    .iter()
                    .map(|functions| functions[from].clone())
                    .collect()
            })
            .collect();
        let ion_impact_trans = (0..atomic_ceiling)
            .map(|from| {
                (0..atomic_ceiling)
                    .map(|to| {
                        trans_by_target
                            .iter()
                            .map(|functions| functions[from][to].clone())
                            .collect()
                    })
                    .collect()
            })
            .collect();

        tracing::debug!(
            atomic_ceiling,
            ion_targets = ion_targets.len(),
            "generated rate functions"
        );

        Ok(Self {
            species,
            energy_kev,
            components: components.clone(),
            levels: AtomicLevelMap::for_species(species).truncated(atomic_ceiling),
            atomic_levels: shape.atomic_levels,
            atomic_ceiling,
            temperature_axis: table.temperature_axis.clone(),
            spontaneous,
            charged_states,
            electron_impact_loss,
            electron_impact_trans,
            ion_targets,
            ion_impact_loss,
            ion_impact_trans,
        })
    }

    pub fn species(&self) -> BeamSpecies {
        self.species
    }

    pub fn energy_kev(&self) -> f64 {
        self.energy_kev
    }

    /// Plasma composition the ion targets were resolved against.
    pub fn components(&self) -> &PlasmaComponents {
        &self.components
    }

    /// Level dictionary restricted to the atomic ceiling.
    pub fn levels(&self) -> &AtomicLevelMap {
        &self.levels
    }

    /// Level count of the species dictionary, before any ceiling.
    pub fn atomic_levels(&self) -> usize {
        self.atomic_levels
    }

    pub fn atomic_ceiling(&self) -> usize {
        self.atomic_ceiling
    }

    pub fn temperature_axis(&self) -> &[f64] {
        &self.temperature_axis
    }

    /// Einstein coefficients in 1/s indexed `[from, to]`.
    pub fn spontaneous(&self) -> &DenseMatrix {
        &self.spontaneous
    }

    pub fn spontaneous_rate(&self, from: AtomicLevel, to: AtomicLevel) -> f64 {
        self.spontaneous[(from.index(), to.index())]
    }

    pub fn charged_states(&self) -> &[String] {
        &self.charged_states
    }

    pub fn electron_impact_loss(&self) -> &[RateFunction] {
        &self.electron_impact_loss
    }

    /// `[from][to]`
    pub fn electron_impact_trans(&self) -> &[Vec<RateFunction>] {
        &self.electron_impact_trans
    }

    pub fn ion_targets(&self) -> &[IonTarget] {
        &self.ion_targets
    }

    /// `[from][target]`
    pub fn ion_impact_loss(&self) -> &[Vec<RateFunction>] {
        &self.ion_impact_loss
    }

    /// `[from][to][target]`
    pub fn ion_impact_trans(&self) -> &[Vec<Vec<RateFunction>>] {
        &self.ion_impact_trans
    }

    pub fn level(&self, label: &str) -> RenateResult<AtomicLevel> {
        self.levels.level(label)
    }

    pub fn label(&self, level: AtomicLevel) -> RenateResult<&str> {
        self.levels.label(level)
    }

    /// Resolves the species' canonical `(from, to, ground)` levels.
    pub fn set_default_atomic_levels(&self) -> RenateResult<DefaultLevels> {
        let transition = self.species.default_transition();
        Ok(DefaultLevels {
            from: self.level(transition.from_level)?,
            to: self.level(transition.to_level)?,
            ground: self.level(transition.ground_level)?,
            label: transition.label,
        })
    }
}

fn validate_energy(energy_kev: f64) -> RenateResult<()> {
    if !(energy_kev.is_finite() && energy_kev > 0.0) {
        return Err(RenateError::configuration(
            "CONFIG.ENERGY",
            format!("beam energy must be positive and finite, got {} keV", energy_kev),
        ));
    }
    Ok(())
}

fn ion_target(
    component_index: usize,
    charge: usize,
    atomic_number: u32,
    mass_number: u32,
) -> RenateResult<IonTarget> {
    let normalization = impurity_mass_normalization(charge).ok_or_else(|| {
        RenateError::configuration(
            "CONFIG.CHARGE_STATE",
            format!("{} has no mass normalization", charge_state_label(charge)),
        )
    })?;
    Ok(IonTarget {
        component_index,
        charge,
        atomic_number,
        mass_number,
        mass_ratio: f64::from(mass_number) / normalization,
    })
}
