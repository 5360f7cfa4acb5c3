//! Derived quantities: wind vectors, calendar profiles, descriptive
//! statistics, height interpolation and wind-rose tables.

pub mod calendar;
pub mod interpolation;
pub mod statistics;
pub mod wind_rose;
pub mod wind_vector;

pub use calendar::*;
pub use interpolation::*;
pub use statistics::*;
pub use wind_rose::*;
pub use wind_vector::*;
