use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::TimeFrame;
use crate::error::{AssessmentError, Result};

/// One observation of wind at a single height
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindRecord {
    pub timestamp: NaiveDateTime,
    /// Horizontal wind speed (m/s), >= 0
    pub speed: f64,
    /// Meteorological "from" bearing in degrees, [0, 360)
    pub direction: f64,
}

impl WindRecord {
    pub fn new(timestamp: NaiveDateTime, speed: f64, direction: f64) -> Result<Self> {
        if !speed.is_finite() || speed < 0.0 {
            return Err(AssessmentError::Domain(format!(
                "wind speed at {timestamp} must be finite and >= 0, got {speed}"
            )));
        }
        if !(0.0..360.0).contains(&direction) {
            return Err(AssessmentError::Domain(format!(
                "wind direction at {timestamp} must be in [0, 360), got {direction}"
            )));
        }
        Ok(Self {
            timestamp,
            speed,
            direction,
        })
    }
}

/// Time-ordered wind observations with strictly increasing timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WindSample {
    records: Vec<WindRecord>,
}

impl WindSample {
    /// Sort records by time. Later records sharing a timestamp with an
    /// earlier one are dropped.
    pub fn new(mut records: Vec<WindRecord>) -> Self {
        records.sort_by_key(|r| r.timestamp);
        let before = records.len();
        records.dedup_by_key(|r| r.timestamp);
        if records.len() != before {
            warn!(
                dropped = before - records.len(),
                "duplicate timestamps removed from wind sample"
            );
        }
        Self { records }
    }

    /// Build a sample from a speed and a direction column. Rows where either
    /// value is null are skipped.
    pub fn from_frame(frame: &TimeFrame, speed_column: &str, direction_column: &str) -> Result<Self> {
        let speeds = frame.column(speed_column)?;
        let directions = frame.column(direction_column)?;

        let records = frame
            .index()
            .iter()
            .zip(speeds.into_iter().zip(directions))
            .filter_map(|(&ts, pair)| match pair {
                (Some(s), Some(d)) => Some(WindRecord::new(ts, s, d)),
                _ => None,
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::new(records))
    }

    pub fn records(&self) -> &[WindRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn speeds(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.speed).collect()
    }

    pub fn directions(&self) -> Vec<f64> {
        self.records.iter().map(|r| r.direction).collect()
    }
}
