//! File loaders: time series, reanalysis years, buoy exports, power curves
//! and turbine layouts.

pub mod buoy;
pub mod csv_frame;
#[cfg(feature = "netcdf")]
pub mod netcdf_buoy;
pub mod reanalysis;
pub mod tables;

pub use buoy::*;
pub use csv_frame::*;
#[cfg(feature = "netcdf")]
pub use netcdf_buoy::*;
pub use reanalysis::*;
pub use tables::*;
