use serde::{Deserialize, Serialize};

use super::Power;
use crate::error::{AssessmentError, Result};

/// A single power-curve sample
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PowerCurvePoint {
    /// Hub-height wind speed (m/s)
    pub wind_speed: f64,
    pub power: Power,
}

/// Turbine power curve, sorted by strictly increasing wind speed.
///
/// Shape (monotone up to rated, flat or falling after) is assumed by
/// cut-in/cut-out extraction but not enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PowerCurve {
    points: Vec<PowerCurvePoint>,
}

impl PowerCurve {
    pub fn new(mut points: Vec<PowerCurvePoint>) -> Result<Self> {
        if points.is_empty() {
            return Err(AssessmentError::Domain("power curve has no rows".into()));
        }
        if let Some(p) = points
            .iter()
            .find(|p| !p.wind_speed.is_finite() || !p.power.as_watts().is_finite())
        {
            return Err(AssessmentError::Domain(format!(
                "power curve row is not finite: ws={}, P={}",
                p.wind_speed,
                p.power.as_watts()
            )));
        }

        if let Some(p) = points.iter().find(|p| p.power.as_watts() < 0.0) {
            return Err(AssessmentError::Domain(format!(
                "power curve power must be non-negative: ws={}, P={}",
                p.wind_speed,
                p.power.as_watts()
            )));
        }

        points.sort_by(|a, b| a.wind_speed.total_cmp(&b.wind_speed));
        if let Some(w) = points.windows(2).find(|w| w[0].wind_speed == w[1].wind_speed) {
            return Err(AssessmentError::Domain(format!(
                "power curve wind speeds must be strictly increasing, {} appears twice",
                w[0].wind_speed
            )));
        }

        Ok(Self { points })
    }

    /// Build from (wind speed, power in kW) pairs
    pub fn from_kilowatts(pairs: &[(f64, f64)]) -> Result<Self> {
        Self::new(
            pairs
                .iter()
                .map(|&(ws, kw)| PowerCurvePoint {
                    wind_speed: ws,
                    power: Power::kilowatts(kw),
                })
                .collect(),
        )
    }

    pub fn points(&self) -> &[PowerCurvePoint] {
        &self.points
    }

    fn producing(&self) -> impl Iterator<Item = &PowerCurvePoint> {
        self.points.iter().filter(|p| p.power.as_watts() > 0.0)
    }

    /// Lowest wind speed with positive power
    pub fn cut_in(&self) -> Result<f64> {
        self.producing()
            .map(|p| p.wind_speed)
            .reduce(f64::min)
            .ok_or_else(Self::no_production)
    }

    /// Highest wind speed with positive power
    pub fn cut_out(&self) -> Result<f64> {
        self.producing()
            .map(|p| p.wind_speed)
            .reduce(f64::max)
            .ok_or_else(Self::no_production)
    }

    /// Largest power on the curve
    pub fn rated_power(&self) -> Power {
        Power::watts(
            self.points
                .iter()
                .map(|p| p.power.as_watts())
                .fold(0.0, f64::max),
        )
    }

    fn no_production() -> AssessmentError {
        AssessmentError::Domain("power curve has no row with P > 0".into())
    }

    /// Piecewise-linear power at `wind_speed`, linearly extrapolated from the
    /// first/last segment outside the sampled range.
    pub fn power_at(&self, wind_speed: f64) -> Power {
        let pts = &self.points;
        if pts.len() == 1 {
            return pts[0].power;
        }

        // Segment whose right end is the first point above wind_speed, clamped
        // to the first/last segment for extrapolation.
        let upper = pts
            .partition_point(|p| p.wind_speed <= wind_speed)
            .clamp(1, pts.len() - 1);
        let (a, b) = (pts[upper - 1], pts[upper]);

        let t = (wind_speed - a.wind_speed) / (b.wind_speed - a.wind_speed);
        let (pa, pb) = (a.power.as_watts(), b.power.as_watts());
        Power::watts(pa + t * (pb - pa))
    }
}
