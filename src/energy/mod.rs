pub mod aep;
pub mod scenarios;

pub use aep::*;
pub use scenarios::*;
