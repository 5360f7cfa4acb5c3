use ordered_float::OrderedFloat;
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use tracing::info;

use crate::domain::TimeFrame;

type RowKey = Vec<Option<OrderedFloat<f64>>>;

fn row_key(row: &[Option<f64>]) -> RowKey {
    row.iter().map(|c| c.map(OrderedFloat)).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateReport {
    /// Every row that has at least one identical twin, in table order
    #[serde(skip)]
    pub duplicates: TimeFrame,
    pub total_rows: usize,
    pub unique_rows: usize,
    /// unique / total × 100, 0 on an empty table
    pub availability_percent: f64,
}

impl DuplicateReport {
    pub fn has_duplicates(&self) -> bool {
        !self.duplicates.is_empty()
    }
}

/// Find rows whose cells are identical across all columns.
///
/// Only the values are compared, not the timestamps. Two nulls in the same
/// column compare equal.
pub fn detect_duplicates(frame: &TimeFrame) -> DuplicateReport {
    let mut counts: HashMap<RowKey, usize> = HashMap::with_capacity(frame.len());
    for row in frame.rows() {
        *counts.entry(row_key(row)).or_default() += 1;
    }

    let total_rows = frame.len();
    let unique_rows = counts.len();
    let duplicates = frame.filter_rows(|_, row| counts.get(&row_key(row)).is_some_and(|&c| c > 1));
    let availability_percent = if total_rows == 0 {
        0.0
    } else {
        unique_rows as f64 / total_rows as f64 * 100.0
    };

    info!(
        total_rows,
        unique_rows,
        duplicate_rows = duplicates.len(),
        "Data availability after removing duplicates: {availability_percent:.2}%"
    );

    DuplicateReport {
        duplicates,
        total_rows,
        unique_rows,
        availability_percent,
    }
}

/// Keep the first row of every group of identical rows
pub fn drop_duplicates(frame: &TimeFrame) -> TimeFrame {
    let mut seen: HashSet<RowKey> = HashSet::with_capacity(frame.len());
    frame.filter_rows(|_, row| seen.insert(row_key(row)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate, NaiveDateTime};

    fn t(h: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2022, 6, 1).unwrap().and_hms_opt(0, 0, 0).unwrap() + Duration::hours(h)
    }

    fn frame(rows: Vec<Vec<Option<f64>>>) -> TimeFrame {
        let index = (0..rows.len() as i64).map(t).collect();
        TimeFrame::from_parts(index, vec!["ws".into(), "wd".into()], rows).unwrap()
    }

    #[test]
    fn test_no_duplicates() {
        let report = detect_duplicates(&frame(vec![
            vec![Some(1.0), Some(10.0)],
            vec![Some(1.0), Some(20.0)],
            vec![Some(2.0), Some(10.0)],
        ]));
        assert!(!report.has_duplicates());
        assert_eq!(report.availability_percent, 100.0);
    }

    #[test]
    fn test_all_members_of_a_group_are_reported() {
        let report = detect_duplicates(&frame(vec![
            vec![Some(1.0), Some(10.0)],
            vec![Some(5.0), None],
            vec![Some(1.0), Some(10.0)],
            vec![Some(5.0), None],
            vec![Some(3.0), Some(30.0)],
        ]));
        assert_eq!(report.duplicates.index(), &[t(0), t(1), t(2), t(3)]);
        assert_eq!(report.unique_rows, 3);
        assert!((report.availability_percent - 60.0).abs() < 1e-12);
    }

    #[test]
    fn test_empty_table() {
        let report = detect_duplicates(&TimeFrame::new(["ws"]));
        assert_eq!(report.availability_percent, 0.0);
        assert_eq!(report.total_rows, 0);
    }

    #[test]
    fn test_drop_duplicates_keeps_first() {
        let deduped = drop_duplicates(&frame(vec![
            vec![Some(1.0), Some(10.0)],
            vec![Some(2.0), Some(20.0)],
            vec![Some(1.0), Some(10.0)],
        ]));
        assert_eq!(deduped.index(), &[t(0), t(1)]);
    }
}
