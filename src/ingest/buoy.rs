//! Buoy measurements.
//!
//! The raw archives are NetCDF files with nested groups, read by
//! `NetcdfBuoySource` when the `netcdf` feature is enabled. [`CsvBuoySource`]
//! reads an archive that was flattened to CSV with one `group/variable`
//! column per variable.

use std::path::PathBuf;
use tracing::info;

use super::csv_frame::read_frame_csv;
use crate::domain::TimeFrame;
use crate::error::Result;

/// Variables to pull from one group of a buoy archive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuoySelection {
    pub group: String,
    pub variables: Vec<String>,
}

impl BuoySelection {
    pub fn new(group: impl Into<String>, variables: &[&str]) -> Self {
        Self {
            group: group.into(),
            variables: variables.iter().map(|v| v.to_string()).collect(),
        }
    }

    fn qualified(&self) -> Vec<String> {
        self.variables
            .iter()
            .map(|v| format!("{}/{v}", self.group))
            .collect()
    }
}

pub trait BuoySource {
    /// Table with one column per selected variable, named by the variable
    fn load(&self, selection: &BuoySelection) -> Result<TimeFrame>;
}

#[derive(Debug, Clone)]
pub struct CsvBuoySource {
    path: PathBuf,
    time_column: String,
}

impl CsvBuoySource {
    pub fn new(path: impl Into<PathBuf>, time_column: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            time_column: time_column.into(),
        }
    }
}

impl BuoySource for CsvBuoySource {
    fn load(&self, selection: &BuoySelection) -> Result<TimeFrame> {
        let frame = read_frame_csv(&self.path, &self.time_column)?;
        let qualified = selection.qualified();
        let names: Vec<&str> = qualified.iter().map(String::as_str).collect();
        let selected = frame.select_columns(&names)?;

        let out = TimeFrame::from_parts(
            selected.index().to_vec(),
            selection.variables.clone(),
            selected.rows().to_vec(),
        )?
        .sorted_by_time();
        info!(
            path = %self.path.display(),
            group = %selection.group,
            rows = out.len(),
            "loaded buoy data"
        );
        Ok(out)
    }
}
