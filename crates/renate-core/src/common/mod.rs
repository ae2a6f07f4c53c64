pub mod constants;
pub mod species;
