use renate_core::domain::{RenateError, RenateResult, SolverSettings};
use renate_core::modules::beamlet::BeamletParameters;
use renate_core::modules::plasma::{ComponentProfile, PlasmaComponent};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Scenario file consumed by `renate-od run`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ScenarioConfig {
    pub beamlet: BeamletParameters,
    pub components: Vec<PlasmaComponent>,
    pub profiles: ProfileConfig,
    #[serde(default)]
    pub atomic_ceiling: Option<usize>,
    #[serde(default = "default_rate_tables")]
    pub rate_tables: PathBuf,
    #[serde(default)]
    pub neutral_cross_sections: Option<PathBuf>,
    #[serde(default)]
    pub solver: SolverSettings,
    #[serde(default)]
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct ProfileConfig {
    pub grid: Vec<f64>,
    pub components: Vec<ComponentProfile>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(super) struct OutputConfig {
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,
    #[serde(default)]
    pub write_matrix: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            write_matrix: false,
        }
    }
}

fn default_rate_tables() -> PathBuf {
    PathBuf::from("data")
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("output")
}

impl ScenarioConfig {
    /// Reads a scenario and anchors its relative paths at the file's directory.
    pub fn read(path: &Path) -> RenateResult<Self> {
        let source = fs::read_to_string(path).map_err(|error| {
            RenateError::io_system(
                "IO.SCENARIO",
                format!("failed to read scenario '{}': {}", path.display(), error),
            )
        })?;
        let mut config: Self = serde_json::from_str(&source).map_err(|error| {
            RenateError::configuration(
                "CONFIG.SCENARIO",
                format!("failed to parse scenario '{}': {}", path.display(), error),
            )
        })?;

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.rate_tables = resolve(base, &config.rate_tables);
        config.neutral_cross_sections = config
            .neutral_cross_sections
            .as_deref()
            .map(|file| resolve(base, file));
        config.output.directory = resolve(base, &config.output.directory);
        config.solver.validate()?;
        Ok(config)
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}
