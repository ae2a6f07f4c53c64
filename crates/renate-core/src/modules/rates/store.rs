use super::table::RateTable;
use crate::common::species::BeamSpecies;
use crate::domain::{RenateError, RenateResult};
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

/// Textual key of a beam energy in keV (`60.0` -> `"60"`, `60.5` -> `"60.5"`).
pub fn energy_key(energy_kev: f64) -> String {
    format!("{}", energy_kev)
}

/// Access to pre-computed rate tables keyed by species and beam energy.
pub trait RateTableSource {
    fn load_rate_table(&self, species: BeamSpecies, energy_kev: f64) -> RenateResult<RateTable>;
}

/// Reads `<root>/<species>/rates/<energy>.json`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonRateTableStore {
    root: PathBuf,
}

impl JsonRateTableStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn table_path(&self, species: BeamSpecies, energy_kev: f64) -> PathBuf {
        self.root
            .join(species.symbol())
            .join("rates")
            .join(format!("{}.json", energy_key(energy_kev)))
    }
}

impl RateTableSource for JsonRateTableStore {
    fn load_rate_table(&self, species: BeamSpecies, energy_kev: f64) -> RenateResult<RateTable> {
        let path = self.table_path(species, energy_kev);
        tracing::debug!(path = %path.display(), "reading rate table");

        let source = fs::read_to_string(&path).map_err(|error| {
            RenateError::io_system(
                "IO.RATE_TABLE",
                format!("failed to read rate table '{}': {}", path.display(), error),
            )
        })?;
        serde_json::from_str(&source).map_err(|error| {
            RenateError::data_model(
                "DATA.RATE_TABLE_FORMAT",
                format!("failed to parse rate table '{}': {}", path.display(), error),
            )
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct InMemoryRateTables {
    tables: HashMap<(BeamSpecies, String), RateTable>,
}

impl InMemoryRateTables {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, species: BeamSpecies, energy_kev: f64, table: RateTable) {
        self.tables.insert((species, energy_key(energy_kev)), table);
    }

    pub fn with_table(mut self, species: BeamSpecies, energy_kev: f64, table: RateTable) -> Self {
        self.insert(species, energy_kev, table);
        self
    }
}

impl RateTableSource for InMemoryRateTables {
    fn load_rate_table(&self, species: BeamSpecies, energy_kev: f64) -> RenateResult<RateTable> {
        let key = energy_key(energy_kev);
        self.tables
            .get(&(species, key.clone()))
            .cloned()
            .ok_or_else(|| {
                RenateError::io_system(
                    "IO.RATE_TABLE",
                    format!("no rate table registered for {} at {} keV", species, key),
                )
            })
    }
}
