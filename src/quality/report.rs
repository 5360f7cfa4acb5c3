use serde::Serialize;

use super::{detect_duplicates, detect_gaps, DuplicateReport, GapReport};
use crate::domain::{Frequency, TimeFrame};
use crate::error::Result;

/// Gap and duplicate checks of one table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QualityReport {
    pub gaps: GapReport,
    pub duplicates: DuplicateReport,
}

/// Run both checks on a table as loaded.
///
/// Derived calendar columns (`year`, `month`, `hour`) must not be present
/// yet: they differ between otherwise identical rows and would hide
/// duplicates.
pub fn check_quality(frame: &TimeFrame, frequency: Frequency) -> Result<QualityReport> {
    Ok(QualityReport {
        gaps: detect_gaps(frame, frequency)?,
        duplicates: detect_duplicates(frame),
    })
}
