//! Offshore wind resource assessment.
//!
//! Loads reanalysis and buoy records, derives wind speed and direction,
//! checks data quality, corrects short measurements to the long term with
//! measure-correlate-predict, and estimates annual energy production from a
//! Weibull fit of the wind climate. Farm simulation and layout optimization
//! are delegated to external engines behind the traits in [`farm`].

pub mod analysis;
pub mod config;
pub mod domain;
pub mod energy;
pub mod error;
pub mod export;
pub mod farm;
pub mod ingest;
pub mod mcp;
pub mod quality;
pub mod stats;
pub mod telemetry;

pub use error::{AssessmentError, Result};
