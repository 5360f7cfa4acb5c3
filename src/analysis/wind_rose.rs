//! Joint frequency table of direction sector and speed bin.
//!
//! This is the table a wind rose is drawn from; rendering is left to the
//! caller.

use serde::{Deserialize, Serialize};

use crate::domain::WindSample;
use crate::error::{AssessmentError, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindRoseSettings {
    /// Number of direction sectors, the first one centred on North
    pub sectors: usize,
    /// Lower edges of the speed bins (m/s), ascending; the last bin is open
    pub speed_edges: Vec<f64>,
}

impl Default for WindRoseSettings {
    fn default() -> Self {
        Self {
            sectors: 16,
            speed_edges: vec![0.0, 4.0, 8.0, 12.0, 16.0, 20.0],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindRose {
    pub sector_width: f64,
    pub speed_edges: Vec<f64>,
    /// `frequencies[sector][bin]` in percent of all samples
    pub frequencies: Vec<Vec<f64>>,
    pub sample_count: usize,
}

impl WindRose {
    pub fn build(sample: &WindSample, settings: &WindRoseSettings) -> Result<Self> {
        if settings.sectors == 0 {
            return Err(AssessmentError::Domain("wind rose needs at least one sector".into()));
        }
        if settings.speed_edges.is_empty()
            || settings.speed_edges.windows(2).any(|w| w[0] >= w[1])
        {
            return Err(AssessmentError::Domain(
                "speed bin edges must be non-empty and strictly ascending".into(),
            ));
        }

        let width = 360.0 / settings.sectors as f64;
        let mut counts = vec![vec![0usize; settings.speed_edges.len()]; settings.sectors];

        for record in sample.records() {
            let sector = (((record.direction + width / 2.0) % 360.0) / width) as usize;
            let sector = sector.min(settings.sectors - 1);
            // speeds below the first edge fall into the first bin
            let bin = settings
                .speed_edges
                .partition_point(|&e| e <= record.speed)
                .saturating_sub(1);
            counts[sector][bin] += 1;
        }

        let n = sample.len();
        let frequencies = counts
            .into_iter()
            .map(|row| {
                row.into_iter()
                    .map(|c| if n == 0 { 0.0 } else { c as f64 / n as f64 * 100.0 })
                    .collect()
            })
            .collect();

        Ok(Self {
            sector_width: width,
            speed_edges: settings.speed_edges.clone(),
            frequencies,
            sample_count: n,
        })
    }

    /// Total frequency per sector
    pub fn sector_totals(&self) -> Vec<f64> {
        self.frequencies.iter().map(|row| row.iter().sum()).collect()
    }

    /// Centre bearing of the sector with the highest frequency
    pub fn prevailing_direction(&self) -> Option<f64> {
        if self.sample_count == 0 {
            return None;
        }
        self.sector_totals()
            .iter()
            .enumerate()
            .max_by(|a, b| a.1.total_cmp(b.1))
            .map(|(i, _)| i as f64 * self.sector_width)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::WindRecord;
    use chrono::NaiveDate;

    fn sample(obs: &[(f64, f64)]) -> WindSample {
        let t0 = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        WindSample::new(
            obs.iter()
                .enumerate()
                .map(|(i, &(s, d))| {
                    WindRecord::new(t0 + chrono::Duration::hours(i as i64), s, d).unwrap()
                })
                .collect(),
        )
    }

    #[test]
    fn test_north_sector_wraps() {
        let rose = WindRose::build(
            &sample(&[(5.0, 355.0), (5.0, 5.0), (13.0, 90.0), (25.0, 180.0)]),
            &WindRoseSettings::default(),
        )
        .unwrap();

        assert_eq!(rose.frequencies[0][1], 50.0);
        assert_eq!(rose.frequencies[4][3], 25.0);
        assert_eq!(rose.frequencies[8][5], 25.0);
        let total: f64 = rose.sector_totals().iter().sum();
        assert!((total - 100.0).abs() < 1e-9);
        assert_eq!(rose.prevailing_direction(), Some(0.0));
    }

    #[test]
    fn test_invalid_settings() {
        let s = sample(&[(5.0, 10.0)]);
        let bad = WindRoseSettings {
            sectors: 0,
            ..Default::default()
        };
        assert!(WindRose::build(&s, &bad).is_err());
        let bad = WindRoseSettings {
            sectors: 8,
            speed_edges: vec![0.0, 5.0, 5.0],
        };
        assert!(WindRose::build(&s, &bad).is_err());
    }

    #[test]
    fn test_empty_sample() {
        let rose = WindRose::build(&WindSample::default(), &WindRoseSettings::default()).unwrap();
        assert_eq!(rose.prevailing_direction(), None);
        assert!(rose.sector_totals().iter().all(|&t| t == 0.0));
    }
}
