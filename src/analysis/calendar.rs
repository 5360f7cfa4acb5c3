//! Calendar decomposition and grouped means
//!
//! Splits timestamps into year / month / hour-of-day and averages columns
//! per calendar group (yearly, monthly and diurnal profiles).

use chrono::{Datelike, NaiveDateTime, Timelike};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::domain::TimeFrame;
use crate::error::Result;

/// Calendar key used for grouping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, strum::Display)]
#[strum(serialize_all = "snake_case")]
pub enum Period {
    Year,
    /// 1-12
    Month,
    /// Hour of day, 0-23
    Hour,
}

impl Period {
    pub fn key(&self, timestamp: NaiveDateTime) -> i32 {
        match self {
            Period::Year => timestamp.year(),
            Period::Month => timestamp.month() as i32,
            Period::Hour => timestamp.hour() as i32,
        }
    }
}

/// Return a copy of `frame` with `year`, `month` and `hour` columns
pub fn decompose(frame: &TimeFrame) -> Result<TimeFrame> {
    let keys = |p: Period| -> Vec<Option<f64>> {
        frame
            .index()
            .iter()
            .map(|&t| Some(f64::from(p.key(t))))
            .collect()
    };

    frame
        .with_column("year", keys(Period::Year))?
        .with_column("month", keys(Period::Month))?
        .with_column("hour", keys(Period::Hour))
}

/// Per-group means of a set of columns, groups in ascending key order
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupedMeans {
    pub period: Period,
    pub columns: Vec<String>,
    pub groups: BTreeMap<i32, Vec<Option<f64>>>,
}

impl GroupedMeans {
    /// Means of one column, keyed by group
    pub fn series(&self, column: &str) -> Option<Vec<(i32, f64)>> {
        let pos = self.columns.iter().position(|c| c == column)?;
        Some(
            self.groups
                .iter()
                .filter_map(|(&k, means)| means[pos].map(|m| (k, m)))
                .collect(),
        )
    }
}

/// Mean of each column over the whole frame, nulls skipped
pub fn overall_means(frame: &TimeFrame, columns: &[&str]) -> Result<Vec<Option<f64>>> {
    let all: Vec<usize> = (0..frame.len()).collect();
    columns
        .iter()
        .map(|c| {
            let pos = frame.column_position(c)?;
            Ok(mean_of(frame, &all, pos))
        })
        .collect()
}

/// Mean of each column per calendar group, nulls skipped
pub fn group_means(frame: &TimeFrame, period: Period, columns: &[&str]) -> Result<GroupedMeans> {
    let positions = columns
        .iter()
        .map(|c| frame.column_position(c))
        .collect::<Result<Vec<_>>>()?;

    let groups = frame
        .index()
        .iter()
        .enumerate()
        .into_group_map_by(|(_, t)| period.key(**t))
        .into_iter()
        .map(|(key, members)| {
            let rows: Vec<usize> = members.into_iter().map(|(i, _)| i).collect();
            let means = positions.iter().map(|&p| mean_of(frame, &rows, p)).collect();
            (key, means)
        })
        .collect();

    Ok(GroupedMeans {
        period,
        columns: columns.iter().map(|c| c.to_string()).collect(),
        groups,
    })
}

fn mean_of(frame: &TimeFrame, rows: &[usize], pos: usize) -> Option<f64> {
    let (sum, n) = rows
        .iter()
        .filter_map(|&i| frame.rows()[i][pos])
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (n > 0).then(|| sum / n as f64)
}
