//! Per-year reanalysis exports, e.g. `ERA5_N-9_2003.csv`.

use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::csv_frame::read_frame_csv;
use crate::domain::TimeFrame;
use crate::error::{AssessmentError, Result};

/// Year embedded in a file name: the token after the last `_`, before `.csv`
pub fn file_year(file_name: &str) -> Option<i32> {
    let stem = file_name.strip_suffix(".csv")?;
    stem.rsplit('_').next()?.parse().ok()
}

/// Files in `dir` named `{prefix}…_{year}.csv` with `year` in
/// `[start_year, end_year]`, sorted by name
pub fn reanalysis_files(dir: &Path, prefix: &str, start_year: i32, end_year: i32) -> Result<Vec<PathBuf>> {
    if start_year > end_year {
        return Err(AssessmentError::InvalidConfig(format!(
            "start year {start_year} is after end year {end_year}"
        )));
    }

    let entries = std::fs::read_dir(dir).map_err(|e| AssessmentError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| AssessmentError::io(dir, e))?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if !name.starts_with(prefix) || !name.ends_with(".csv") {
            continue;
        }
        match file_year(&name) {
            Some(year) if (start_year..=end_year).contains(&year) => files.push(entry.path()),
            Some(_) => {}
            None => warn!(file = %name, "no year in reanalysis file name, skipping"),
        }
    }
    files.sort();
    Ok(files)
}

/// Load and concatenate all yearly files in the range, in file-name order
pub fn load_reanalysis(
    dir: &Path,
    prefix: &str,
    start_year: i32,
    end_year: i32,
    time_column: &str,
) -> Result<TimeFrame> {
    let files = reanalysis_files(dir, prefix, start_year, end_year)?;
    if files.is_empty() {
        return Err(AssessmentError::InsufficientData {
            required: 1,
            available: 0,
        });
    }

    let frames = files
        .iter()
        .map(|f| read_frame_csv(f, time_column))
        .collect::<Result<Vec<_>>>()?;
    let frame = TimeFrame::concat(&frames)?;
    info!(
        dir = %dir.display(),
        files = files.len(),
        rows = frame.len(),
        start_year,
        end_year,
        "loaded reanalysis data"
    );
    Ok(frame)
}
