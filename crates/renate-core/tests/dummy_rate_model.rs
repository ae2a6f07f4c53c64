use approx::assert_relative_eq;
use renate_core::common::species::{AtomicLevelMap, BeamSpecies};
use renate_core::domain::RenateErrorCategory;
use renate_core::modules::atomic_db::AtomicDb;
use renate_core::modules::beamlet::BeamletParameters;
use renate_core::modules::coefficient_matrix::CoefficientMatrix;
use renate_core::modules::plasma::{
    BeamletProfiles, ComponentProfile, PlasmaComponent, PlasmaComponents,
};
use renate_core::modules::rates::{JsonRateTableStore, RateTableSource};
use serde::Deserialize;
use std::fs;
use std::path::PathBuf;

fn fixture_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScenarioFixture {
    species: BeamSpecies,
    energy: f64,
    current: f64,
    components: Vec<PlasmaComponent>,
    grid: Vec<f64>,
    profiles: Vec<ComponentProfile>,
    expected: ExpectedValues,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExpectedValues {
    electron_impact_loss_level0: Vec<f64>,
    rate_matrix_step0: Vec<Vec<f64>>,
    rate_matrix_step6: Vec<Vec<f64>>,
}

fn load_scenario() -> ScenarioFixture {
    let path = fixture_root().join("dummy/scenario.json");
    let source = fs::read_to_string(&path).expect("scenario fixture should be readable");
    serde_json::from_str(&source).expect("scenario fixture should parse")
}

fn build_profiles(scenario: &ScenarioFixture) -> BeamletProfiles {
    let components =
        PlasmaComponents::new(scenario.components.clone()).expect("fixture components are valid");
    BeamletProfiles::new(scenario.grid.clone(), components, scenario.profiles.clone())
        .expect("fixture profiles are valid")
}

fn load_database(scenario: &ScenarioFixture, ceiling: Option<usize>) -> AtomicDb {
    let store = JsonRateTableStore::new(fixture_root());
    let components =
        PlasmaComponents::new(scenario.components.clone()).expect("fixture components are valid");
    AtomicDb::load(&store, scenario.species, scenario.energy, &components, ceiling)
        .expect("dummy database should load")
}

fn assemble(scenario: &ScenarioFixture, db: &AtomicDb) -> CoefficientMatrix {
    let parameters = BeamletParameters::new(scenario.species, scenario.energy, scenario.current)
        .expect("fixture beam is valid");
    CoefficientMatrix::assemble(&build_profiles(scenario), db, parameters.velocity(), None)
        .expect("matrix should assemble")
}

#[test]
fn level_dictionaries_are_bijective_for_every_species() {
    let expected = [
        ("dummy", 3),
        ("H", 6),
        ("D", 6),
        ("T", 6),
        ("Li", 9),
        ("Na", 8),
    ];
    for (symbol, levels) in expected {
        let species: BeamSpecies = symbol.parse().expect("supported species");
        let map = AtomicLevelMap::for_species(species);
        assert_eq!(map.len(), levels, "{}", symbol);
        for (level, label) in map.iter() {
            assert_eq!(map.level(label).expect("label should resolve"), level);
            assert_eq!(map.label(level).expect("index should resolve"), label);
        }
    }
}

#[test]
fn unsupported_species_is_a_configuration_error() {
    let error = "He".parse::<BeamSpecies>().expect_err("helium beams are not modelled");
    assert_eq!(error.category(), RenateErrorCategory::Configuration);
    assert_eq!(error.placeholder(), "CONFIG.SPECIES");
}

#[test]
fn dummy_database_matches_fixture_layout() {
    let scenario = load_scenario();
    let db = load_database(&scenario, None);
    assert_eq!(db.atomic_levels(), 3);
    assert_eq!(db.atomic_ceiling(), 3);
    assert_eq!(
        db.charged_states(),
        ["charge-1", "charge-2", "charge-3", "charge-4"]
    );
    assert_eq!(db.ion_targets().len(), 5);
    assert_eq!(db.components().len(), 6);
    assert_eq!(db.electron_impact_loss().len(), 3);
    assert_eq!(db.electron_impact_trans().len(), 3);
    assert_eq!(db.ion_impact_loss()[0].len(), 5);
    assert_eq!(db.ion_impact_trans()[2][1].len(), 5);

    for from in 0..3 {
        for to in 0..=from {
            assert_eq!(db.spontaneous()[(to, from)], 0.0);
        }
    }
}

#[test]
fn level_count_mismatch_is_reported_as_data_model_error() {
    let scenario = load_scenario();
    let store = JsonRateTableStore::new(fixture_root());
    let table = store
        .load_rate_table(BeamSpecies::Dummy, 60.0)
        .expect("fixture should load");
    let components =
        PlasmaComponents::new(scenario.components.clone()).expect("fixture components are valid");
    let error = AtomicDb::from_table(BeamSpecies::Hydrogen, 60.0, &table, &components, None)
        .expect_err("hydrogen expects six levels");
    assert_eq!(error.category(), RenateErrorCategory::DataModel);
    assert_eq!(error.placeholder(), "DATA.LEVEL_COUNT");
}

#[test]
fn mass_scaled_rates_reproduce_unscaled_values() {
    let scenario = load_scenario();
    let db = load_database(&scenario, None);
    let deuteron = &db.ion_targets()[1];
    assert_relative_eq!(deuteron.mass_ratio, 2.0);
    let triton_like = &db.ion_targets()[2];
    assert_relative_eq!(triton_like.mass_ratio, 3.0);

    let proton = &db.ion_impact_trans()[0][1][0];
    let scaled = &db.ion_impact_trans()[0][1][1];
    for temperature in [0.5, 1.0, 3.7, 10.0, 25.0] {
        assert_relative_eq!(
            scaled.evaluate(temperature * deuteron.mass_ratio),
            proton.evaluate(temperature),
            max_relative = 1.0e-12
        );
    }
}

#[test]
fn ceiling_truncation_keeps_leading_rate_functions() {
    let scenario = load_scenario();
    let full = load_database(&scenario, None);
    let truncated = load_database(&scenario, Some(2));
    assert_eq!(truncated.electron_impact_loss().len(), 2);
    assert_eq!(truncated.electron_impact_trans().len(), 2);
    assert_eq!(truncated.ion_impact_loss().len(), 2);
    assert_eq!(truncated.levels().labels(), ["1", "2"]);
    assert_eq!(truncated.spontaneous().nrows(), 2);

    for temperature in full.temperature_axis().iter().copied().chain([0.0, 12.0]) {
        for from in 0..2 {
            assert_eq!(
                truncated.electron_impact_loss()[from].evaluate(temperature),
                full.electron_impact_loss()[from].evaluate(temperature)
            );
            for to in 0..2 {
                assert_eq!(
                    truncated.electron_impact_trans()[from][to].evaluate(temperature),
                    full.electron_impact_trans()[from][to].evaluate(temperature)
                );
                for target in 0..5 {
                    assert_eq!(
                        truncated.ion_impact_trans()[from][to][target].evaluate(temperature),
                        full.ion_impact_trans()[from][to][target].evaluate(temperature)
                    );
                }
            }
        }
    }

    let error = AtomicDb::load(
        &JsonRateTableStore::new(fixture_root()),
        BeamSpecies::Dummy,
        60.0,
        &PlasmaComponents::new(scenario.components.clone()).expect("valid components"),
        Some(4),
    )
    .expect_err("only three levels are tabulated");
    assert_eq!(error.placeholder(), "DATA.ATOMIC_CEILING");
}

#[test]
fn electron_impact_loss_matches_documented_values() {
    let scenario = load_scenario();
    let db = load_database(&scenario, None);
    let matrix = assemble(&scenario, &db);
    let loss = &matrix.electron_loss_collisions()[0];
    let documented = [11.0, 111.0, 211.0, 261.0, 311.0, 811.0, 1011.0];
    for ((actual, expected), documented) in loss
        .iter()
        .zip(scenario.expected.electron_impact_loss_level0.iter())
        .zip(documented)
    {
        assert!((actual - expected).abs() < 5.0e-7);
        assert!((actual - documented * 1.0e-4).abs() < 5.0e-7);
    }
}

#[test]
fn assembled_matrix_matches_reference_slices() {
    let scenario = load_scenario();
    let db = load_database(&scenario, None);
    let matrix = assemble(&scenario, &db);
    assert_eq!(matrix.steps(), 7);

    for (step, expected) in [
        (0, &scenario.expected.rate_matrix_step0),
        (6, &scenario.expected.rate_matrix_step6),
    ] {
        for from in 0..3 {
            for to in 0..3 {
                let actual = matrix.entry(from, to, step);
                assert!(
                    (actual - expected[from][to]).abs() < 5.0e-5,
                    "M[{}, {}, {}] = {} differs from {}",
                    from,
                    to,
                    step,
                    actual,
                    expected[from][to]
                );
            }
        }
    }
}

#[test]
fn every_row_balances_against_the_ionization_sink() {
    let scenario = load_scenario();
    let db = load_database(&scenario, None);
    let profiles = build_profiles(&scenario);
    let matrix = assemble(&scenario, &db);

    for step in 0..matrix.steps() {
        for from in 0..3 {
            let row_sum: f64 = (0..3).map(|to| matrix.entry(from, to, step)).sum();
            let mut sink =
                profiles.electron().density[step] * matrix.electron_loss_collisions()[from][step];
            for (slot, target) in db.ion_targets().iter().enumerate() {
                let density = profiles
                    .profile(target.component_index)
                    .expect("ion profile")
                    .density[step];
                sink += density * matrix.ion_loss_collisions()[slot][from][step];
            }
            assert_relative_eq!(row_sum, -sink, max_relative = 1.0e-9, epsilon = 1.0e-12);
        }
    }
}

#[test]
fn truncated_assembly_only_sums_retained_levels() {
    let scenario = load_scenario();
    let full_db = load_database(&scenario, None);
    let truncated_db = load_database(&scenario, Some(2));
    let full = assemble(&scenario, &full_db);
    let truncated = assemble(&scenario, &truncated_db);
    assert_eq!(truncated.levels(), 2);

    for step in 0..7 {
        assert_relative_eq!(
            truncated.entry(0, 1, step),
            full.entry(0, 1, step),
            max_relative = 1.0e-12
        );
        // Level 0 no longer loses population into level 2.
        let dropped = scenario.profiles[0].density[step]
            * full.electron_neutral_collisions()[0][2][step];
        assert!(truncated.entry(0, 0, step) > full.entry(0, 0, step));
        assert!(truncated.entry(0, 0, step) - full.entry(0, 0, step) >= dropped);
    }
}
