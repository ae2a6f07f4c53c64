//! Plasma composition and the spatial profiles sampled along a beamlet.

use crate::common::constants::MAX_CHARGE_STATE;
use crate::domain::{RenateError, RenateResult};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComponentKind {
    Electron,
    Ion,
    Neutral,
}

/// One plasma constituent: charge `q`, nuclear charge `Z`, mass number `A`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlasmaComponent {
    #[serde(rename = "q")]
    pub charge: i32,
    #[serde(rename = "Z")]
    pub atomic_number: u32,
    #[serde(rename = "A")]
    pub mass_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub molecule: Option<String>,
}

impl PlasmaComponent {
    pub fn electron() -> Self {
        Self {
            charge: -1,
            atomic_number: 0,
            mass_number: 0,
            molecule: None,
        }
    }

    pub fn ion(charge: i32, atomic_number: u32, mass_number: u32) -> Self {
        Self {
            charge,
            atomic_number,
            mass_number,
            molecule: None,
        }
    }

    pub fn neutral(atomic_number: u32, mass_number: u32, molecule: impl Into<String>) -> Self {
        Self {
            charge: 0,
            atomic_number,
            mass_number,
            molecule: Some(molecule.into()),
        }
    }

    pub fn kind(&self) -> ComponentKind {
        match self.charge {
            charge if charge < 0 => ComponentKind::Electron,
            0 => ComponentKind::Neutral,
            _ => ComponentKind::Ion,
        }
    }

    fn validate(&self, row: usize) -> RenateResult<()> {
        match self.kind() {
            ComponentKind::Electron => {
                if self.charge != -1 || self.atomic_number != 0 || self.mass_number != 0 {
                    return Err(RenateError::configuration(
                        "CONFIG.COMPONENT",
                        format!(
                            "component {} is not a valid electron row (q=-1, Z=0, A=0 required)",
                            row
                        ),
                    ));
                }
            }
            ComponentKind::Ion => {
                let charge = self.charge as u32;
                if self.atomic_number == 0 || charge > self.atomic_number {
                    return Err(RenateError::configuration(
                        "CONFIG.COMPONENT",
                        format!(
                            "component {} has charge {} exceeding its atomic number {}",
                            row, self.charge, self.atomic_number
                        ),
                    ));
                }
                if charge as usize > MAX_CHARGE_STATE {
                    return Err(RenateError::configuration(
                        "CONFIG.CHARGE_STATE",
                        format!(
                            "component {} has charge {}; charge states above {} are not supported",
                            row, self.charge, MAX_CHARGE_STATE
                        ),
                    ));
                }
                self.validate_mass_number(row)?;
            }
            ComponentKind::Neutral => {
                if self.atomic_number == 0 {
                    return Err(RenateError::configuration(
                        "CONFIG.COMPONENT",
                        format!("neutral component {} must have Z >= 1", row),
                    ));
                }
                self.validate_mass_number(row)?;
            }
        }
        Ok(())
    }

    fn validate_mass_number(&self, row: usize) -> RenateResult<()> {
        if self.mass_number < self.atomic_number {
            return Err(RenateError::configuration(
                "CONFIG.COMPONENT",
                format!(
                    "component {} has mass number {} below its atomic number {}",
                    row, self.mass_number, self.atomic_number
                ),
            ));
        }
        Ok(())
    }
}

/// Ordered, validated component table; the electron row is always first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlasmaComponents {
    components: Vec<PlasmaComponent>,
    names: Vec<String>,
}

impl PlasmaComponents {
    pub fn new(components: Vec<PlasmaComponent>) -> RenateResult<Self> {
        let Some(first) = components.first() else {
            return Err(RenateError::configuration(
                "CONFIG.COMPONENT",
                "plasma component table is empty",
            ));
        };
        if first.kind() != ComponentKind::Electron {
            return Err(RenateError::configuration(
                "CONFIG.COMPONENT",
                "the first plasma component must be the electron row",
            ));
        }

        let mut names = Vec::with_capacity(components.len());
        let mut ion_count = 0;
        let mut neutral_count = 0;
        for (row, component) in components.iter().enumerate() {
            component.validate(row)?;
            let name = match component.kind() {
                ComponentKind::Electron if row == 0 => "electron".to_string(),
                ComponentKind::Electron => {
                    return Err(RenateError::configuration(
                        "CONFIG.COMPONENT",
                        format!("component {} is a second electron row", row),
                    ));
                }
                ComponentKind::Ion => {
                    ion_count += 1;
                    format!("ion{}", ion_count)
                }
                ComponentKind::Neutral => {
                    neutral_count += 1;
                    format!("neutral{}", neutral_count)
                }
            };
            names.push(name);
        }

        Ok(Self { components, names })
    }

    pub fn len(&self) -> usize {
        self.components.len()
    }

    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PlasmaComponent> {
        self.components.get(index)
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &PlasmaComponent)> {
        self.components.iter().enumerate()
    }

    /// Ion rows in table order, with their component index.
    pub fn ions(&self) -> impl Iterator<Item = (usize, &PlasmaComponent)> {
        self.iter()
            .filter(|(_, component)| component.kind() == ComponentKind::Ion)
    }

    pub fn neutrals(&self) -> impl Iterator<Item = (usize, &PlasmaComponent)> {
        self.iter()
            .filter(|(_, component)| component.kind() == ComponentKind::Neutral)
    }

    pub fn ion_count(&self) -> usize {
        self.ions().count()
    }

    pub fn neutral_count(&self) -> usize {
        self.neutrals().count()
    }
}

/// Density (m⁻³) and temperature (eV) of one component along the grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComponentProfile {
    pub density: Vec<f64>,
    pub temperature: Vec<f64>,
}

/// Spatial grid with per-component profiles and derived output columns.
#[derive(Debug, Clone, PartialEq)]
pub struct BeamletProfiles {
    grid: Vec<f64>,
    components: PlasmaComponents,
    profiles: Vec<ComponentProfile>,
    columns: BTreeMap<String, Vec<f64>>,
}

impl BeamletProfiles {
    pub fn new(
        grid: Vec<f64>,
        components: PlasmaComponents,
        profiles: Vec<ComponentProfile>,
    ) -> RenateResult<Self> {
        validate_grid(&grid)?;
        if profiles.len() != components.len() {
            return Err(RenateError::configuration(
                "CONFIG.PROFILE",
                format!(
                    "{} component profiles supplied for {} plasma components",
                    profiles.len(),
                    components.len()
                ),
            ));
        }

        for (index, profile) in profiles.iter().enumerate() {
            let name = components.name(index).unwrap_or("component");
            if profile.density.len() != grid.len() || profile.temperature.len() != grid.len() {
                return Err(RenateError::configuration(
                    "CONFIG.PROFILE",
                    format!(
                        "{} profile lengths ({} density, {} temperature) differ from the grid length {}",
                        name,
                        profile.density.len(),
                        profile.temperature.len(),
                        grid.len()
                    ),
                ));
            }
            if profile.density.iter().any(|n| !n.is_finite() || *n < 0.0) {
                return Err(RenateError::configuration(
                    "CONFIG.PROFILE",
                    format!("{} density must be finite and non-negative", name),
                ));
            }
            if profile.temperature.iter().any(|t| !t.is_finite() || *t < 0.0) {
                return Err(RenateError::configuration(
                    "CONFIG.PROFILE",
                    format!("{} temperature must be finite and non-negative", name),
                ));
            }
        }

        Ok(Self {
            grid,
            components,
            profiles,
            columns: BTreeMap::new(),
        })
    }

    pub fn grid(&self) -> &[f64] {
        &self.grid
    }

    pub fn steps(&self) -> usize {
        self.grid.len()
    }

    pub fn components(&self) -> &PlasmaComponents {
        &self.components
    }

    pub fn profile(&self, component_index: usize) -> Option<&ComponentProfile> {
        self.profiles.get(component_index)
    }

    pub fn electron(&self) -> &ComponentProfile {
        &self.profiles[0]
    }

    pub fn set_column(&mut self, name: impl Into<String>, values: Vec<f64>) -> RenateResult<()> {
        let name = name.into();
        if values.len() != self.grid.len() {
            return Err(RenateError::data_model(
                "DATA.PROFILE_COLUMN",
                format!(
                    "column '{}' has {} values for a grid of {} points",
                    name,
                    values.len(),
                    self.grid.len()
                ),
            ));
        }
        self.columns.insert(name, values);
        Ok(())
    }

    pub fn column(&self, name: &str) -> Option<&[f64]> {
        self.columns.get(name).map(Vec::as_slice)
    }

    pub fn columns(&self) -> &BTreeMap<String, Vec<f64>> {
        &self.columns
    }
}

fn validate_grid(grid: &[f64]) -> RenateResult<()> {
    if grid.is_empty() {
        return Err(RenateError::configuration(
            "CONFIG.GRID",
            "beamlet grid has no points",
        ));
    }
    if grid.iter().any(|z| !z.is_finite()) {
        return Err(RenateError::configuration(
            "CONFIG.GRID",
            "beamlet grid holds a non-finite position",
        ));
    }
    let increasing = grid.windows(2).all(|pair| pair[1] > pair[0]);
    let decreasing = grid.windows(2).all(|pair| pair[1] < pair[0]);
    if !(increasing || decreasing) {
        return Err(RenateError::configuration(
            "CONFIG.GRID",
            "beamlet grid must be strictly monotonic",
        ));
    }
    Ok(())
}
