use super::CliError;
use super::config::ScenarioConfig;
use anyhow::Context;
use renate_core::common::species::{AtomicLevelMap, BeamSpecies};
use renate_core::domain::SolverKind;
use renate_core::modules::atomic_db::AtomicDb;
use renate_core::modules::beamlet::Beamlet;
use renate_core::modules::neutral_db::{NeutralDb, TabulatedCrossSections};
use renate_core::modules::plasma::{BeamletProfiles, PlasmaComponents};
use renate_core::modules::rates::JsonRateTableStore;
use renate_core::modules::serialization::{
    render_coefficient_matrix, write_profile_table, write_text_artifact,
};
use std::fs;
use std::path::PathBuf;

#[derive(clap::Args)]
pub(super) struct RunArgs {
    /// Scenario file (JSON)
    #[arg(value_name = "scenario")]
    scenario: PathBuf,

    /// Rate table root, overrides the scenario entry
    #[arg(long)]
    rates: Option<PathBuf>,

    /// Output directory, overrides the scenario entry
    #[arg(long)]
    output: Option<PathBuf>,

    /// ODE solver, overrides the scenario entry
    #[arg(long, value_parser = parse_solver)]
    solver: Option<SolverKind>,
}

fn parse_solver(value: &str) -> Result<SolverKind, String> {
    value.parse::<SolverKind>().map_err(|error| error.message().to_string())
}

pub(super) fn run_scenario_command(args: RunArgs) -> Result<i32, CliError> {
    let mut config = ScenarioConfig::read(&args.scenario)?;
    if let Some(rates) = args.rates {
        config.rate_tables = rates;
    }
    if let Some(output) = args.output {
        config.output.directory = output;
    }
    if let Some(solver) = args.solver {
        config.solver.solver = solver;
    }

    let components = PlasmaComponents::new(config.components.clone())?;
    let profiles = BeamletProfiles::new(
        config.profiles.grid.clone(),
        components.clone(),
        config.profiles.components.clone(),
    )?;

    let store = JsonRateTableStore::new(config.rate_tables.clone());
    let atomic_db = AtomicDb::load(
        &store,
        config.beamlet.species,
        config.beamlet.energy,
        &components,
        config.atomic_ceiling,
    )?;

    let neutral_db = match &config.neutral_cross_sections {
        Some(path) => {
            let cross_sections = TabulatedCrossSections::read(path)?;
            Some(NeutralDb::new(
                &cross_sections,
                config.beamlet.species,
                config.beamlet.energy,
                &components,
                atomic_db.atomic_ceiling(),
            )?)
        }
        None => None,
    };

    let mut beamlet = Beamlet::new(
        config.beamlet,
        profiles,
        &atomic_db,
        neutral_db.as_ref(),
        &config.solver,
    )?;
    let summary = beamlet.summary()?;

    let output_dir = &config.output.directory;
    fs::create_dir_all(output_dir).with_context(|| {
        format!("failed to create output directory '{}'", output_dir.display())
    })?;
    write_profile_table(&output_dir.join("populations.dat"), beamlet.profiles())?;

    let summary_path = output_dir.join("summary.json");
    let encoded =
        serde_json::to_string_pretty(&summary).context("failed to encode beamlet summary")?;
    write_text_artifact(&summary_path, &encoded)
        .with_context(|| format!("failed to write '{}'", summary_path.display()))?;

    if config.output.write_matrix {
        let matrix_path = output_dir.join("coefficient_matrix.dat");
        write_text_artifact(
            &matrix_path,
            &render_coefficient_matrix(beamlet.coefficient_matrix()),
        )
        .with_context(|| format!("failed to write '{}'", matrix_path.display()))?;
    }

    println!(
        "Solved {} beamlet at {} keV over {} grid points ({} levels, {} solver)",
        summary.species,
        summary.energy,
        summary.grid_points,
        summary.atomic_levels,
        config.solver.solver
    );
    println!("Beam velocity: {:.6e} m/s", summary.velocity);
    println!(
        "Final linear density: {:.6e} 1/m",
        summary.final_linear_density
    );
    println!(
        "Peak {} emission density: {:.6e}",
        summary.emission_label, summary.peak_emission_density
    );
    println!("Outputs written to {}", output_dir.display());
    Ok(0)
}

pub(super) fn run_levels_command(species: &str) -> Result<i32, CliError> {
    let species: BeamSpecies = species.parse()?;
    let levels = AtomicLevelMap::for_species(species);
    for (level, label) in levels.iter() {
        println!("{:>3}  {}", level.index(), label);
    }
    let transition = species.default_transition();
    println!(
        "default transition {}: {} --> {} (ground {})",
        transition.label, transition.from_level, transition.to_level, transition.ground_level
    );
    Ok(0)
}
