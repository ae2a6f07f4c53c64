//! Beam species catalogue: level dictionaries, isotope masses and the
//! canonical emission line of every supported projectile.

use crate::common::constants::ATOMIC_MASS_UNIT;
use crate::domain::{RenateError, RenateResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

const HYDROGENIC_LEVELS: [&str; 6] = ["1", "2", "3", "4", "5", "6"];
const LITHIUM_LEVELS: [&str; 9] = ["2s", "2p", "3s", "3p", "3d", "4s", "4p", "4d", "4f"];
const SODIUM_LEVELS: [&str; 8] = ["3s", "3p", "3d", "4s", "4p", "4d", "4f", "5s"];
const DUMMY_LEVELS: [&str; 3] = ["1", "2", "3"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BeamSpecies {
    Hydrogen,
    Deuterium,
    Tritium,
    Lithium,
    Sodium,
    Dummy,
}

impl BeamSpecies {
    pub const ALL: [BeamSpecies; 6] = [
        Self::Dummy,
        Self::Hydrogen,
        Self::Deuterium,
        Self::Tritium,
        Self::Lithium,
        Self::Sodium,
    ];

    pub const fn symbol(self) -> &'static str {
        match self {
            Self::Hydrogen => "H",
            Self::Deuterium => "D",
            Self::Tritium => "T",
            Self::Lithium => "Li",
            Self::Sodium => "Na",
            Self::Dummy => "dummy",
        }
    }

    pub const fn level_labels(self) -> &'static [&'static str] {
        match self {
            Self::Hydrogen | Self::Deuterium | Self::Tritium => &HYDROGENIC_LEVELS,
            Self::Lithium => &LITHIUM_LEVELS,
            Self::Sodium => &SODIUM_LEVELS,
            Self::Dummy => &DUMMY_LEVELS,
        }
    }

    pub const fn atomic_levels(self) -> usize {
        self.level_labels().len()
    }

    /// Isotope mass in unified atomic mass units.
    pub const fn atomic_mass(self) -> f64 {
        match self {
            Self::Hydrogen => 1.007_825_032_23,
            Self::Deuterium => 2.014_101_778_12,
            Self::Tritium => 3.016_049_277_9,
            Self::Lithium => 7.016_003_436_6,
            Self::Sodium => 22.989_769_282,
            Self::Dummy => 1.0,
        }
    }

    pub fn mass_kg(self) -> f64 {
        self.atomic_mass() * ATOMIC_MASS_UNIT
    }

    pub const fn default_transition(self) -> DefaultTransition {
        match self {
            Self::Hydrogen | Self::Deuterium | Self::Tritium => DefaultTransition {
                from_level: "3",
                to_level: "2",
                ground_level: "1",
                label: "Halpha",
            },
            Self::Lithium => DefaultTransition {
                from_level: "2p",
                to_level: "2s",
                ground_level: "2s",
                label: "Li2p",
            },
            Self::Sodium => DefaultTransition {
                from_level: "3p",
                to_level: "3s",
                ground_level: "3s",
                label: "Na3p",
            },
            Self::Dummy => DefaultTransition {
                from_level: "2",
                to_level: "1",
                ground_level: "1",
                label: "dummy",
            },
        }
    }
}

impl Display for BeamSpecies {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).symbol())
    }
}

impl FromStr for BeamSpecies {
    type Err = RenateError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim();
        Self::ALL
            .into_iter()
            .find(|species| species.symbol() == normalized)
            .ok_or_else(|| {
                RenateError::configuration(
                    "CONFIG.SPECIES",
                    format!("the atomic species '{}' is not supported", normalized),
                )
            })
    }
}

impl TryFrom<String> for BeamSpecies {
    type Error = RenateError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BeamSpecies> for String {
    fn from(species: BeamSpecies) -> Self {
        species.symbol().to_string()
    }
}

/// Canonical emission line used by downstream emission-density reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultTransition {
    pub from_level: &'static str,
    pub to_level: &'static str,
    pub ground_level: &'static str,
    pub label: &'static str,
}

/// Index of an internal excitation state, `0..atomic_levels`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AtomicLevel(pub usize);

impl AtomicLevel {
    pub const GROUND: AtomicLevel = AtomicLevel(0);

    pub const fn index(self) -> usize {
        self.0
    }
}

/// Bidirectional label/index lookup built once per species.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AtomicLevelMap {
    labels: Vec<String>,
    indices: HashMap<String, AtomicLevel>,
}

impl AtomicLevelMap {
    pub fn for_species(species: BeamSpecies) -> Self {
        let labels: Vec<String> = species
            .level_labels()
            .iter()
            .map(|label| label.to_string())
            .collect();
        let indices = labels
            .iter()
            .enumerate()
            .map(|(index, label)| (label.clone(), AtomicLevel(index)))
            .collect();
        Self { labels, indices }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn level(&self, label: &str) -> RenateResult<AtomicLevel> {
        self.indices.get(label.trim()).copied().ok_or_else(|| {
            RenateError::configuration(
                "CONFIG.LEVEL",
                format!("atomic level '{}' is not defined for this species", label),
            )
        })
    }

    pub fn label(&self, level: AtomicLevel) -> RenateResult<&str> {
        self.labels
            .get(level.index())
            .map(String::as_str)
            .ok_or_else(|| {
                RenateError::configuration(
                    "CONFIG.LEVEL",
                    format!(
                        "atomic level index {} is outside 0..{}",
                        level.index(),
                        self.labels.len()
                    ),
                )
            })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn iter(&self) -> impl Iterator<Item = (AtomicLevel, &str)> {
        self.labels
            .iter()
            .enumerate()
            .map(|(index, label)| (AtomicLevel(index), label.as_str()))
    }

    /// Keeps only the lowest `ceiling` levels.
    pub fn truncated(&self, ceiling: usize) -> Self {
        let labels: Vec<String> = self.labels.iter().take(ceiling).cloned().collect();
        let indices = labels
            .iter()
            .enumerate()
            .map(|(index, label)| (label.clone(), AtomicLevel(index)))
            .collect();
        Self { labels, indices }
    }
}
