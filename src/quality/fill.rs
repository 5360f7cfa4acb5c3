use tracing::debug;

use crate::domain::{Frequency, TimeFrame};
use crate::error::Result;

/// Replace each null with the last non-null value above it in the same
/// column. Leading nulls stay null.
pub fn forward_fill(frame: &TimeFrame) -> Result<TimeFrame> {
    let width = frame.columns().len();
    let mut last: Vec<Option<f64>> = vec![None; width];
    let mut filled = 0usize;

    let rows: Vec<Vec<Option<f64>>> = frame
        .rows()
        .iter()
        .map(|row| {
            row.iter()
                .zip(last.iter_mut())
                .map(|(cell, prev)| match cell {
                    Some(v) => {
                        *prev = Some(*v);
                        Some(*v)
                    }
                    None => {
                        if prev.is_some() {
                            filled += 1;
                        }
                        *prev
                    }
                })
                .collect()
        })
        .collect();

    debug!(filled, "forward-filled null cells");
    TimeFrame::from_parts(frame.index().to_vec(), frame.columns().to_vec(), rows)
}

/// The first year of rows at `frequency` (8760 hourly or 52560 ten-minute rows)
pub fn first_year(frame: &TimeFrame, frequency: Frequency) -> TimeFrame {
    frame.head(frequency.rows_per_year())
}
