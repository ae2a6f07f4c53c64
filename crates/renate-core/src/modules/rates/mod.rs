//! Tabulated rate data consumed by the atomic database.

mod store;
mod table;

pub use store::{InMemoryRateTables, JsonRateTableStore, RateTableSource, energy_key};
pub use table::{RateTable, RateTableShape};
