pub mod atomic_db;
pub mod beamlet;
pub mod coefficient_matrix;
pub mod neutral_db;
pub mod ode;
pub mod plasma;
pub mod rates;
pub mod serialization;

pub use atomic_db::{AtomicDb, DefaultLevels, IonTarget};
pub use beamlet::{Beamlet, BeamletParameters, BeamletSummary};
pub use coefficient_matrix::CoefficientMatrix;
pub use neutral_db::{CollisionTarget, CrossSectionSource, NeutralDb, TabulatedCrossSections};
pub use ode::Ode;
pub use plasma::{BeamletProfiles, ComponentKind, ComponentProfile, PlasmaComponent, PlasmaComponents};
pub use rates::{InMemoryRateTables, JsonRateTableStore, RateTable, RateTableSource};
