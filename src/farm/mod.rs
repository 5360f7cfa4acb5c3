//! Delegation to the external farm-simulation and layout-optimization engines.

pub mod layout;
pub mod simulation;

pub use layout::*;
pub use simulation::*;
