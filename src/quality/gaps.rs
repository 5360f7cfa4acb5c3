use chrono::NaiveDateTime;
use serde::Serialize;
use std::collections::HashMap;
use tracing::{debug, info, warn};

use crate::domain::{Frequency, TimeFrame};
use crate::error::Result;

/// Outcome of checking a table against its nominal sampling grid
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GapReport {
    pub frequency: Frequency,
    /// Rows on the complete grid between the first and last timestamp
    pub expected_rows: usize,
    /// Grid rows with no null cell
    pub complete_rows: usize,
    /// complete / expected × 100, 0 when there is no data at all
    pub availability_percent: f64,
    /// Grid rows with at least one null cell (absent rows come back all-null)
    #[serde(skip)]
    pub missing: TimeFrame,
}

impl GapReport {
    pub fn missing_timestamps(&self) -> &[NaiveDateTime] {
        self.missing.index()
    }

    pub fn has_gaps(&self) -> bool {
        !self.missing.is_empty()
    }
}

/// Reindex `frame` onto the complete grid from its first to its last
/// timestamp at `frequency`. Grid points without a row become all-null rows;
/// rows whose timestamp is not on the grid are dropped. If a timestamp occurs
/// more than once, the first row wins.
pub fn reindex(frame: &TimeFrame, frequency: Frequency) -> Result<TimeFrame> {
    let mut out = TimeFrame::new(frame.columns().iter().cloned());
    let Some((start, end)) = frame.time_span() else {
        return Ok(out);
    };

    let mut by_time: HashMap<NaiveDateTime, usize> = HashMap::with_capacity(frame.len());
    let mut repeated = 0usize;
    for (i, ts) in frame.index().iter().enumerate() {
        if by_time.insert(*ts, i).is_some() {
            repeated += 1;
        }
    }
    if repeated > 0 {
        warn!(repeated, "repeated timestamps while reindexing, keeping the first row");
        // re-insert in reverse so the first occurrence is the one kept
        by_time.clear();
        for (i, ts) in frame.index().iter().enumerate().rev() {
            by_time.insert(*ts, i);
        }
    }

    let step = frequency.step();
    let width = frame.columns().len();
    let mut t = start;
    while t <= end {
        let row = match by_time.get(&t) {
            Some(&i) => frame.rows()[i].clone(),
            None => vec![None; width],
        };
        out.push_row(t, row)?;
        t += step;
    }
    Ok(out)
}

/// Compare a table against its expected fixed-frequency index.
///
/// Never fails on an empty table; availability is then reported as 0 %.
pub fn detect_gaps(frame: &TimeFrame, frequency: Frequency) -> Result<GapReport> {
    let grid = reindex(frame, frequency)?;
    let expected_rows = grid.len();
    let complete_rows = grid.complete_rows();
    let availability_percent = if expected_rows == 0 {
        0.0
    } else {
        complete_rows as f64 / expected_rows as f64 * 100.0
    };

    let missing = grid.filter_rows(|_, row| row.iter().any(Option::is_none));

    info!(
        %frequency,
        expected_rows,
        complete_rows,
        "Data availability is {availability_percent:.2}%"
    );
    if missing.is_empty() {
        info!("no data gaps found");
    } else {
        debug!(missing = ?missing.index(), "missing time periods");
    }

    Ok(GapReport {
        frequency,
        expected_rows,
        complete_rows,
        availability_percent,
        missing,
    })
}

/// Align 10-minute style timestamps to the grid before checking for gaps:
/// sub-second precision is dropped and each timestamp rounded to the nearest step.
pub fn align_to_grid(frame: &TimeFrame, frequency: Frequency) -> Result<TimeFrame> {
    frame.map_index(|t| frequency.align(t))
}
