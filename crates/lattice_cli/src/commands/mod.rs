//! Command implementations for lattice-cli

pub mod check;
pub mod rules;
