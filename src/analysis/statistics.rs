use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use tracing::info;

use super::calendar::{GroupedMeans, Period};
use crate::error::{AssessmentError, Result};
use crate::stats::LinearFit;

/// Mean and population standard deviation of a series
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesStatistics {
    pub mean: f64,
    pub std_dev: f64,
    pub count: usize,
}

impl SeriesStatistics {
    /// `None` for an empty series
    pub fn describe(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }
        Some(Self {
            mean: values.mean(),
            std_dev: values.population_std_dev(),
            count: values.len(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindStatistics {
    pub speed: SeriesStatistics,
    /// Arithmetic statistics of the bearing, not circular ones
    pub direction: SeriesStatistics,
}

/// Mean and spread of wind speed and direction over a period
pub fn wind_statistics(speeds: &[f64], directions: &[f64]) -> Result<WindStatistics> {
    let insufficient = |available| AssessmentError::InsufficientData {
        required: 1,
        available,
    };
    let speed = SeriesStatistics::describe(speeds).ok_or_else(|| insufficient(speeds.len()))?;
    let direction =
        SeriesStatistics::describe(directions).ok_or_else(|| insufficient(directions.len()))?;

    info!(
        mean_speed = speed.mean,
        std_speed = speed.std_dev,
        mean_direction = direction.mean,
        std_direction = direction.std_dev,
        "wind statistics"
    );
    Ok(WindStatistics { speed, direction })
}

/// Linear trend of yearly mean values of `column` (units per year)
pub fn yearly_trend(yearly: &GroupedMeans, column: &str) -> Result<LinearFit> {
    if yearly.period != Period::Year {
        return Err(AssessmentError::Domain(format!(
            "trend needs yearly means, got {} means",
            yearly.period
        )));
    }
    let series = yearly
        .series(column)
        .ok_or_else(|| AssessmentError::MissingColumn {
            column: column.to_string(),
        })?;
    if series.len() < 2 {
        return Err(AssessmentError::InsufficientData {
            required: 2,
            available: series.len(),
        });
    }

    let (years, means): (Vec<f64>, Vec<f64>) =
        series.into_iter().map(|(y, m)| (f64::from(y), m)).unzip();
    LinearFit::fit(&years, &means)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;

    #[test]
    fn test_population_std() {
        let s = SeriesStatistics::describe(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((s.mean - 5.0).abs() < 1e-12);
        assert!((s.std_dev - 2.0).abs() < 1e-12);
        assert_eq!(s.count, 8);
        assert!(SeriesStatistics::describe(&[]).is_none());
    }

    #[test]
    fn test_wind_statistics_requires_data() {
        assert!(wind_statistics(&[1.0], &[]).is_err());
        let stats = wind_statistics(&[8.0, 10.0], &[180.0, 200.0]).unwrap();
        assert!((stats.speed.mean - 9.0).abs() < 1e-12);
        assert!((stats.direction.std_dev - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_yearly_trend() {
        let groups: BTreeMap<i32, Vec<Option<f64>>> = (2000..2010)
            .map(|y| (y, vec![Some(9.0 + 0.01 * f64::from(y - 2000))]))
            .collect();
        let yearly = GroupedMeans {
            period: Period::Year,
            columns: vec!["WS100".into()],
            groups,
        };
        let trend = yearly_trend(&yearly, "WS100").unwrap();
        assert!((trend.slope - 0.01).abs() < 1e-9);
        assert!((trend.predict(2000.0) - 9.0).abs() < 1e-6);

        let monthly = GroupedMeans {
            period: Period::Month,
            ..yearly.clone()
        };
        assert!(yearly_trend(&monthly, "WS100").is_err());
        assert!(yearly_trend(&yearly, "WS10").is_err());
    }
}
