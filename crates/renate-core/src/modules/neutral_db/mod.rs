//! Beam-on-neutral-gas collision data.
//!
//! Cross-sections are evaluated once at the beam impact energy (eV/amu) and
//! kept in m², indexed `[from][to][target]` like the plasma-ion rates.
//! The diagonal of the transition table is loss, never a level transition.

mod cross_section;

pub use cross_section::{
    CollisionTarget, CrossSectionFile, CrossSectionSource, TabulatedCrossSections,
    TabulatedTransition, TransitionDescriptor,
};

use crate::common::constants::{CM2_TO_M2, KEV_TO_EV};
use crate::common::species::{AtomicLevel, BeamSpecies};
use crate::domain::{RenateError, RenateResult};
use crate::modules::plasma::PlasmaComponents;

#[derive(Debug, Clone, PartialEq)]
pub struct NeutralTarget {
    pub component_index: usize,
    pub target: CollisionTarget,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NeutralDb {
    species: BeamSpecies,
    energy_kev: f64,
    impact_energy: f64,
    atomic_ceiling: usize,
    components: PlasmaComponents,
    targets: Vec<NeutralTarget>,
    loss: Vec<Vec<f64>>,
    transitions: Vec<Vec<Vec<f64>>>,
}

impl NeutralDb {
    pub fn new<S>(
        source: &S,
        species: BeamSpecies,
        energy_kev: f64,
        components: &PlasmaComponents,
        atomic_ceiling: usize,
    ) -> RenateResult<Self>
    where
        S: CrossSectionSource + ?Sized,
    {
        if !(energy_kev.is_finite() && energy_kev > 0.0) {
            return Err(RenateError::configuration(
                "CONFIG.ENERGY",
                format!("beam energy must be positive and finite, got {} keV", energy_kev),
            ));
        }
        if atomic_ceiling == 0 || atomic_ceiling > species.atomic_levels() {
            return Err(RenateError::data_model(
                "DATA.ATOMIC_CEILING",
                format!(
                    "atomic ceiling {} must lie in 1..={} for {}",
                    atomic_ceiling,
                    species.atomic_levels(),
                    species
                ),
            ));
        }

        let impact_energy = energy_kev * KEV_TO_EV / species.atomic_mass();
        let targets: Vec<NeutralTarget> = components
            .neutrals()
            .map(|(component_index, component)| NeutralTarget {
                component_index,
                target: CollisionTarget::from_component(component),
            })
            .collect();

        let mut loss = vec![vec![0.0; targets.len()]; atomic_ceiling];
        let mut transitions = vec![vec![vec![0.0; targets.len()]; atomic_ceiling]; atomic_ceiling];
        for (slot, neutral) in targets.iter().enumerate() {
            for from in 0..atomic_ceiling {
                for to in 0..atomic_ceiling {
                    let descriptor = TransitionDescriptor {
                        species,
                        target: neutral.target.clone(),
                        from: AtomicLevel(from),
                        to: AtomicLevel(to),
                    };
                    let value = source
                        .cross_section(&descriptor, &[impact_energy])?
                        .first()
                        .copied()
                        .ok_or_else(|| {
                            RenateError::data_model(
                                "DATA.CROSS_SECTION",
                                format!("cross-section source returned no value for {}", neutral.target),
                            )
                        })?
                        * CM2_TO_M2;
                    if from == to {
                        loss[from][slot] = value;
                    } else {
                        transitions[from][to][slot] = value;
                    }
                }
            }
        }

        tracing::debug!(
            species = %species,
            impact_energy,
            neutral_targets = targets.len(),
            "evaluated neutral cross-sections"
        );

        Ok(Self {
            species,
            energy_kev,
            impact_energy,
            atomic_ceiling,
            components: components.clone(),
            targets,
            loss,
            transitions,
        })
    }

    pub fn species(&self) -> BeamSpecies {
        self.species
    }

    /// Impact energy in eV/amu.
    pub fn impact_energy(&self) -> f64 {
        self.impact_energy
    }

    pub fn energy_kev(&self) -> f64 {
        self.energy_kev
    }

    pub fn atomic_ceiling(&self) -> usize {
        self.atomic_ceiling
    }

    pub fn components(&self) -> &PlasmaComponents {
        &self.components
    }

    pub fn targets(&self) -> &[NeutralTarget] {
        &self.targets
    }

    /// Loss cross-section (m²) out of `from` against neutral `target`.
    pub fn neutral_impact_loss(&self, from: AtomicLevel, target: usize) -> RenateResult<f64> {
        self.check_level(from)?;
        self.loss[from.index()]
            .get(target)
            .copied()
            .ok_or_else(|| self.target_error(target))
    }

    /// Transition cross-section (m²) `from -> to` against neutral `target`.
    pub fn neutral_impact_transition(
        &self,
        from: AtomicLevel,
        to: AtomicLevel,
        target: usize,
    ) -> RenateResult<f64> {
        if from == to {
            return Err(RenateError::invalid_transition(
                "TRANSITION.INVALID",
                format!(
                    "level {} -> {} is not a valid transition; the diagonal holds loss",
                    from.index(),
                    to.index()
                ),
            ));
        }
        self.check_level(from)?;
        self.check_level(to)?;
        self.transitions[from.index()][to.index()]
            .get(target)
            .copied()
            .ok_or_else(|| self.target_error(target))
    }

    fn check_level(&self, level: AtomicLevel) -> RenateResult<()> {
        if level.index() >= self.atomic_ceiling {
            return Err(RenateError::configuration(
                "CONFIG.LEVEL",
                format!(
                    "atomic level index {} is outside 0..{}",
                    level.index(),
                    self.atomic_ceiling
                ),
            ));
        }
        Ok(())
    }

    fn target_error(&self, target: usize) -> RenateError {
        RenateError::configuration(
            "CONFIG.NEUTRAL_TARGET",
            format!(
                "neutral target {} is outside 0..{}",
                target,
                self.targets.len()
            ),
        )
    }
}
