//! Collisional-radiative population model of a neutral beam crossing a
//! plasma: rate tables, atomic database, coefficient matrix assembly and
//! population integration along a beamlet.

pub mod common;
pub mod domain;
pub mod modules;
pub mod numerics;
