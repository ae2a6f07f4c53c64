//! Position-dependent collisional-radiative rate matrix.
//!
//! At every grid step `M[from, to]` is the rate (1/m) at which population
//! moves from `from` into `to`; the diagonal carries the total outflow of
//! `from`, including loss to the untracked ionization sink:
//!
//! `M(z) = n_e(z) E(z) + Σ_ion n_ion(z) I_ion(z) + P + Σ_neutral n_k(z) N_k`
//!
//! `E`, `I_ion` and `N_k` are collisional blocks whose rows sum to minus the
//! loss rate. `P` holds `A[from, to] / v` off the diagonal and, on it, minus
//! the sum over the `to` index of the spontaneous matrix, so its rows sum to
//! zero and every row of `M` sums to minus the flux into the ionization sink.

use crate::common::species::AtomicLevel;
use crate::domain::{RenateError, RenateResult};
use crate::modules::atomic_db::AtomicDb;
use crate::modules::neutral_db::NeutralDb;
use crate::modules::plasma::{BeamletProfiles, ComponentKind, ComponentProfile};
use crate::numerics::{DenseMatrix, RateFunction};
use faer::Mat;

#[derive(Debug, Clone)]
pub struct CoefficientMatrix {
    /// `[from][step]`
    electron_loss_collisions: Vec<Vec<f64>>,
    /// `[from][to][step]`
    electron_neutral_collisions: Vec<Vec<Vec<f64>>>,
    /// `[ion][from][step]`
    ion_loss_collisions: Vec<Vec<Vec<f64>>>,
    /// `[ion][from][to][step]`
    ion_neutral_collisions: Vec<Vec<Vec<Vec<f64>>>>,
    electron_terms: Vec<DenseMatrix>,
    ion_terms: Vec<Vec<DenseMatrix>>,
    photon_terms: DenseMatrix,
    neutral_terms: Vec<DenseMatrix>,
    matrix: Vec<DenseMatrix>,
}

impl CoefficientMatrix {
    pub fn assemble(
        profiles: &BeamletProfiles,
        atomic_db: &AtomicDb,
        velocity: f64,
        neutral_db: Option<&NeutralDb>,
    ) -> RenateResult<Self> {
        if !(velocity.is_finite() && velocity > 0.0) {
            return Err(RenateError::configuration(
                "CONFIG.VELOCITY",
                format!("beam velocity must be positive and finite, got {} m/s", velocity),
            ));
        }

        if atomic_db.components() != profiles.components() {
            return Err(RenateError::data_model(
                "DATA.COMPONENT_MISMATCH",
                format!(
                    "atomic database was built for {} plasma components but the profile table holds {}",
                    atomic_db.components().len(),
                    profiles.components().len()
                ),
            ));
        }

        let levels = atomic_db.atomic_ceiling();
        let steps = profiles.steps();

        let electron = profiles.electron();
        let electron_loss_collisions =
            interpolate_loss(atomic_db.electron_impact_loss(), &electron.temperature);
        let electron_neutral_collisions = interpolate_transitions(
            levels,
            move |from, to| &atomic_db.electron_impact_trans()[from][to],
            &electron.temperature,
        );
        let electron_terms =
            collisional_terms(levels, steps, &electron_loss_collisions, &electron_neutral_collisions);

        let mut ion_loss_collisions = Vec::with_capacity(atomic_db.ion_targets().len());
        let mut ion_neutral_collisions = Vec::with_capacity(atomic_db.ion_targets().len());
        let mut ion_terms = Vec::with_capacity(atomic_db.ion_targets().len());
        let mut ion_profiles = Vec::with_capacity(atomic_db.ion_targets().len());
        for (slot, target) in atomic_db.ion_targets().iter().enumerate() {
            let profile = component_profile(profiles, target.component_index, ComponentKind::Ion)?;
            let loss_functions: Vec<RateFunction> = atomic_db
                .ion_impact_loss()
                .iter()
                .map(|per_target| per_target[slot].clone())
                .collect();
            let loss = interpolate_loss(&loss_functions, &profile.temperature);
            let transitions = interpolate_transitions(
                levels,
                move |from, to| &atomic_db.ion_impact_trans()[from][to][slot],
                &profile.temperature,
            );
            ion_terms.push(collisional_terms(levels, steps, &loss, &transitions));
            ion_loss_collisions.push(loss);
            ion_neutral_collisions.push(transitions);
            ion_profiles.push(profile);
        }

        let photon_terms = photon_terms(atomic_db.spontaneous(), velocity);

        let mut neutral_terms = Vec::new();
        let mut neutral_profiles = Vec::new();
        match neutral_db {
            Some(neutral_db) => {
                if neutral_db.species() != atomic_db.species()
                    || neutral_db.energy_kev() != atomic_db.energy_kev()
                {
                    return Err(RenateError::configuration(
                        "CONFIG.DATABASE_MISMATCH",
                        format!(
                            "neutral database was built for {} at {} keV but the atomic database is {} at {} keV",
                            neutral_db.species(),
                            neutral_db.energy_kev(),
                            atomic_db.species(),
                            atomic_db.energy_kev()
                        ),
                    ));
                }
                if neutral_db.components() != profiles.components() {
                    return Err(RenateError::data_model(
                        "DATA.COMPONENT_MISMATCH",
                        "neutral database was built for a different plasma component table",
                    ));
                }
                if neutral_db.atomic_ceiling() != levels {
                    return Err(RenateError::data_model(
                        "DATA.ATOMIC_CEILING",
                        format!(
                            "neutral database covers {} levels but the atomic database covers {}",
                            neutral_db.atomic_ceiling(),
                            levels
                        ),
                    ));
                }
                for (slot, target) in neutral_db.targets().iter().enumerate() {
                    let profile =
                        component_profile(profiles, target.component_index, ComponentKind::Neutral)?;
                    neutral_terms.push(neutral_block(neutral_db, levels, slot)?);
                    neutral_profiles.push(profile);
                }
            }
            None if profiles.components().neutral_count() > 0 => {
                tracing::warn!(
                    neutrals = profiles.components().neutral_count(),
                    "neutral components present without a neutral database; beam-neutral collisions ignored"
                );
            }
            None => {}
        }

        let matrix = (0..steps)
            .map(|step| {
                Mat::from_fn(levels, levels, |from, to| {
                    let mut value = electron.density[step] * electron_terms[step][(from, to)]
                        + photon_terms[(from, to)];
                    for (terms, profile) in ion_terms.iter().zip(ion_profiles.iter()) {
                        value += profile.density[step] * terms[step][(from, to)];
                    }
                    for (terms, profile) in neutral_terms.iter().zip(neutral_profiles.iter()) {
                        value += profile.density[step] * terms[(from, to)];
                    }
                    value
                })
            })
            .collect();

        tracing::debug!(
            levels,
            steps,
            ions = ion_terms.len(),
            neutrals = neutral_terms.len(),
            "assembled coefficient matrix"
        );

        Ok(Self {
            electron_loss_collisions,
            electron_neutral_collisions,
            ion_loss_collisions,
            ion_neutral_collisions,
            electron_terms,
            ion_terms,
            photon_terms,
            neutral_terms,
            matrix,
        })
    }

    pub fn levels(&self) -> usize {
        self.photon_terms.nrows()
    }

    pub fn steps(&self) -> usize {
        self.matrix.len()
    }

    /// One `levels x levels` matrix per grid step.
    pub fn matrix(&self) -> &[DenseMatrix] {
        &self.matrix
    }

    pub fn entry(&self, from: usize, to: usize, step: usize) -> f64 {
        self.matrix[step][(from, to)]
    }

    pub fn electron_loss_collisions(&self) -> &[Vec<f64>] {
        &self.electron_loss_collisions
    }

    pub fn electron_neutral_collisions(&self) -> &[Vec<Vec<f64>>] {
        &self.electron_neutral_collisions
    }

    pub fn ion_loss_collisions(&self) -> &[Vec<Vec<f64>>] {
        &self.ion_loss_collisions
    }

    pub fn ion_neutral_collisions(&self) -> &[Vec<Vec<Vec<f64>>>] {
        &self.ion_neutral_collisions
    }

    pub fn electron_terms(&self) -> &[DenseMatrix] {
        &self.electron_terms
    }

    /// `[ion][step]`
    pub fn ion_terms(&self) -> &[Vec<DenseMatrix>] {
        &self.ion_terms
    }

    /// Constant along the grid.
    pub fn photon_terms(&self) -> &DenseMatrix {
        &self.photon_terms
    }

    /// One constant block per neutral target.
    pub fn neutral_terms(&self) -> &[DenseMatrix] {
        &self.neutral_terms
    }
}

fn component_profile<'a>(
    profiles: &'a BeamletProfiles,
    component_index: usize,
    expected: ComponentKind,
) -> RenateResult<&'a ComponentProfile> {
    let matches = profiles
        .components()
        .get(component_index)
        .is_some_and(|component| component.kind() == expected);
    if !matches {
        return Err(RenateError::data_model(
            "DATA.COMPONENT_MISMATCH",
            format!(
                "component {} of the profile table does not match the database ({:?} expected)",
                component_index, expected
            ),
        ));
    }
    profiles.profile(component_index).ok_or_else(|| {
        RenateError::data_model(
            "DATA.COMPONENT_MISMATCH",
            format!("profile table has no component {}", component_index),
        )
    })
}

fn interpolate_loss(functions: &[RateFunction], temperature: &[f64]) -> Vec<Vec<f64>> {
    functions
        .iter()
        .map(|function| function.evaluate_many(temperature))
        .collect()
}

fn interpolate_transitions<'a, F>(
    levels: usize,
    function: F,
    temperature: &[f64],
) -> Vec<Vec<Vec<f64>>>
where
    F: Fn(usize, usize) -> &'a RateFunction,
{
    (0..levels)
        .map(|from| {
            (0..levels)
                .map(|to| {
                    if from == to {
                        vec![0.0; temperature.len()]
                    } else {
                        function(from, to).evaluate_many(temperature)
                    }
                })
                .collect()
        })
        .collect()
}

fn collisional_terms(
    levels: usize,
    steps: usize,
    loss: &[Vec<f64>],
    transitions: &[Vec<Vec<f64>>],
) -> Vec<DenseMatrix> {
    (0..steps)
        .map(|step| {
            Mat::from_fn(levels, levels, |from, to| {
                if from == to {
                    let outgoing: f64 = (0..levels)
                        .filter(|&other| other != from)
                        .map(|other| transitions[from][other][step])
                        .sum();
                    -outgoing - loss[from][step]
                } else {
                    transitions[from][to][step]
                }
            })
        })
        .collect()
}

fn photon_terms(spontaneous: &DenseMatrix, velocity: f64) -> DenseMatrix {
    let levels = spontaneous.nrows();
    Mat::from_fn(levels, levels, |from, to| {
        if from == to {
            let decay: f64 = (0..levels).map(|lower| spontaneous[(from, lower)]).sum();
            -decay / velocity
        } else {
            spontaneous[(from, to)] / velocity
        }
    })
}

fn neutral_block(neutral_db: &NeutralDb, levels: usize, slot: usize) -> RenateResult<DenseMatrix> {
    let mut block = Mat::zeros(levels, levels);
    for from in 0..levels {
        let mut outgoing = neutral_db.neutral_impact_loss(AtomicLevel(from), slot)?;
        for to in (0..levels).filter(|&to| to != from) {
            let value = neutral_db.neutral_impact_transition(AtomicLevel(from), AtomicLevel(to), slot)?;
            block[(from, to)] = value;
            outgoing += value;
        }
        block[(from, from)] = -outgoing;
    }
    Ok(block)
}

#[cfg(test)]
mod tests {
    use super::{CoefficientMatrix, photon_terms};
    use crate::common::species::BeamSpecies;
    use crate::modules::atomic_db::AtomicDb;
    use crate::modules::neutral_db::{CrossSectionSource, NeutralDb, TransitionDescriptor};
    use crate::modules::plasma::{BeamletProfiles, ComponentProfile, PlasmaComponent, PlasmaComponents};
    use crate::domain::{RenateErrorCategory, RenateResult};
    use crate::modules::rates::RateTable;
    use approx::assert_relative_eq;
    use faer::Mat;

    fn cube(scale: f64) -> Vec<Vec<Vec<f64>>> {
        (0..3)
            .map(|from| {
                (0..3)
                    .map(|to| {
                        if from == to {
                            vec![0.0, 0.0]
                        } else {
                            let base = scale * (1 + from * 3 + to) as f64;
                            vec![base, 2.0 * base]
                        }
                    })
                    .collect()
            })
            .collect()
    }

    fn table() -> RateTable {
        RateTable {
            temperature_axis: vec![1.0, 2.0],
            einstein_coeffs: vec![
                vec![0.0, 0.0, 0.0],
                vec![3.0e6, 0.0, 0.0],
                vec![1.0e6, 2.0e6, 0.0],
            ],
            electron_neutral_collisions: cube(1.0),
            proton_neutral_collisions: cube(0.5),
            impurity_neutral_collisions: Vec::new(),
            electron_loss_collisions: vec![
                vec![vec![1.0, 2.0], vec![3.0, 4.0], vec![5.0, 6.0]],
                vec![vec![0.5, 1.0], vec![1.5, 2.0], vec![2.5, 3.0]],
            ],
        }
    }

    fn profiles(neutral: bool) -> BeamletProfiles {
        let mut rows = vec![PlasmaComponent::electron(), PlasmaComponent::ion(1, 1, 1)];
        if neutral {
            rows.push(PlasmaComponent::neutral(1, 2, "D2"));
        }
        let count = rows.len();
        let components = PlasmaComponents::new(rows).expect("components should validate");
        let profile = ComponentProfile {
            density: vec![2.0, 3.0, 4.0],
            temperature: vec![1.0, 1.5, 2.5],
        };
        BeamletProfiles::new(vec![0.0, 0.1, 0.2], components, vec![profile; count])
            .expect("profiles should validate")
    }

    fn database(profiles: &BeamletProfiles) -> AtomicDb {
        AtomicDb::from_table(BeamSpecies::Dummy, 60.0, &table(), profiles.components(), None)
            .expect("database should build")
    }

    struct FlatNeutral;

    impl CrossSectionSource for FlatNeutral {
        fn cross_section(
            &self,
            transition: &TransitionDescriptor,
            energy_grid: &[f64],
        ) -> RenateResult<Vec<f64>> {
            let value = if transition.is_loss() { 2.0e4 } else { 1.0e4 };
            Ok(vec![value; energy_grid.len()])
        }
    }

    #[test]
    fn rows_balance_against_ionization_loss() {
        let profiles = profiles(false);
        let db = database(&profiles);
        let matrix = CoefficientMatrix::assemble(&profiles, &db, 1.0e6, None)
            .expect("matrix should assemble");
        assert_eq!(matrix.steps(), 3);
        assert_eq!(matrix.levels(), 3);

        for step in 0..3 {
            let density = [2.0, 3.0, 4.0][step];
            for from in 0..3 {
                let row_sum: f64 = (0..3).map(|to| matrix.entry(from, to, step)).sum();
                let loss = density * matrix.electron_loss_collisions()[from][step]
                    + density * matrix.ion_loss_collisions()[0][from][step];
                assert_relative_eq!(row_sum, -loss, max_relative = 1.0e-9, epsilon = 1.0e-12);
            }
        }
    }

    #[test]
    fn photon_diagonal_sums_over_the_to_index() {
        let spontaneous = Mat::from_fn(3, 3, |from, to| if from > to { (from + to + 1) as f64 } else { 0.0 });
        let photon = photon_terms(&spontaneous, 2.0);
        for from in 0..3 {
            let row: f64 = (0..3).map(|to| photon[(from, to)]).sum();
            assert!(row.abs() < 1.0e-12);
        }
        // Level 2 decays into level 0 (rate 3) and level 1 (rate 4).
        assert_relative_eq!(photon[(2, 2)], -(3.0 + 4.0) / 2.0);
        assert_relative_eq!(photon[(0, 0)], 0.0);
        assert_relative_eq!(photon[(2, 1)], 4.0 / 2.0);
        assert_relative_eq!(photon[(1, 0)], 2.0 / 2.0);
        assert_relative_eq!(photon[(0, 1)], 0.0);
    }

    #[test]
    fn electron_rates_use_local_temperature_in_square_metres() {
        let profiles = profiles(false);
        let db = database(&profiles);
        let matrix = CoefficientMatrix::assemble(&profiles, &db, 1.0e6, None)
            .expect("matrix should assemble");
        // Loss row 0 is 1 + (T - 1) cm²; T = 2.5 extrapolates past the table.
        assert_relative_eq!(matrix.electron_loss_collisions()[0][0], 1.0e-4, max_relative = 1.0e-12);
        assert_relative_eq!(matrix.electron_loss_collisions()[0][2], 2.5e-4, max_relative = 1.0e-12);
        // Transition 0 -> 1 has base 2 cm² at T = 1 and doubles by T = 2.
        assert_relative_eq!(matrix.electron_neutral_collisions()[0][1][1], 3.0e-4, max_relative = 1.0e-12);
        assert_eq!(matrix.electron_neutral_collisions()[1][1][1], 0.0);
    }

    #[test]
    fn invalid_velocity_is_rejected() {
        let profiles = profiles(false);
        let db = database(&profiles);
        let error = CoefficientMatrix::assemble(&profiles, &db, 0.0, None).expect_err("zero velocity");
        assert_eq!(error.placeholder(), "CONFIG.VELOCITY");
    }

    #[test]
    fn neutral_terms_are_density_weighted_and_balanced() {
        let profiles = profiles(true);
        let db = database(&profiles);
        let without = CoefficientMatrix::assemble(&profiles, &db, 1.0e6, None)
            .expect("matrix should assemble");
        let neutral_db = NeutralDb::new(&FlatNeutral, BeamSpecies::Dummy, 60.0, profiles.components(), 3)
            .expect("neutral database should build");
        let with = CoefficientMatrix::assemble(&profiles, &db, 1.0e6, Some(&neutral_db))
            .expect("matrix should assemble");

        assert_eq!(with.neutral_terms().len(), 1);
        let block = &with.neutral_terms()[0];
        assert_relative_eq!(block[(0, 1)], 1.0);
        assert_relative_eq!(block[(0, 0)], -(2.0 + 1.0 + 1.0));

        let density = 4.0;
        assert_relative_eq!(
            with.entry(0, 1, 2) - without.entry(0, 1, 2),
            density * 1.0,
            max_relative = 1.0e-12
        );
        assert_relative_eq!(
            with.entry(2, 2, 2) - without.entry(2, 2, 2),
            -density * 4.0,
            max_relative = 1.0e-12
        );
    }

    #[test]
    fn profile_ions_unknown_to_the_database_are_rejected() {
        let db = database(&profiles(false));
        let components = PlasmaComponents::new(vec![
            PlasmaComponent::electron(),
            PlasmaComponent::ion(1, 1, 1),
            PlasmaComponent::ion(2, 2, 4),
        ])
        .expect("components should validate");
        let profile = ComponentProfile {
            density: vec![2.0, 3.0, 4.0],
            temperature: vec![1.0, 1.5, 2.5],
        };
        let mut rows = vec![profile; 3];
        rows[2].density = vec![1.0e6; 3];
        let extended = BeamletProfiles::new(vec![0.0, 0.1, 0.2], components, rows)
            .expect("profiles should validate");

        let error = CoefficientMatrix::assemble(&extended, &db, 1.0e6, None)
            .expect_err("helium ions would be dropped");
        assert_eq!(error.category(), RenateErrorCategory::DataModel);
        assert_eq!(error.placeholder(), "DATA.COMPONENT_MISMATCH");
    }

    #[test]
    fn neutral_database_must_match_beam_and_plasma() {
        let profiles = profiles(true);
        let db = database(&profiles);

        let hydrogen = NeutralDb::new(&FlatNeutral, BeamSpecies::Hydrogen, 60.0, profiles.components(), 3)
            .expect("neutral database should build");
        let error = CoefficientMatrix::assemble(&profiles, &db, 1.0e6, Some(&hydrogen))
            .expect_err("species differs");
        assert_eq!(error.placeholder(), "CONFIG.DATABASE_MISMATCH");

        let slower = NeutralDb::new(&FlatNeutral, BeamSpecies::Dummy, 40.0, profiles.components(), 3)
            .expect("neutral database should build");
        let error = CoefficientMatrix::assemble(&profiles, &db, 1.0e6, Some(&slower))
            .expect_err("energy differs");
        assert_eq!(error.placeholder(), "CONFIG.DATABASE_MISMATCH");

        let other_plasma = PlasmaComponents::new(vec![
            PlasmaComponent::electron(),
            PlasmaComponent::neutral(1, 2, "D2"),
        ])
        .expect("components should validate");
        let detached = NeutralDb::new(&FlatNeutral, BeamSpecies::Dummy, 60.0, &other_plasma, 3)
            .expect("neutral database should build");
        let error = CoefficientMatrix::assemble(&profiles, &db, 1.0e6, Some(&detached))
            .expect_err("component table differs");
        assert_eq!(error.placeholder(), "DATA.COMPONENT_MISMATCH");
    }
}
