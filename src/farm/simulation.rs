//! Wind-farm simulation seam.
//!
//! Wake physics run in an external engine behind [`FarmSimulator`]. This
//! module builds the wind states and configuration it is called with and
//! turns its raw output into the summary table, converting units in one
//! place: engine power in kW becomes MW, engine yield in GWh becomes TWh.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use validator::Validate;

use super::layout::{Layout, TurbinePosition};
use crate::analysis::{GroupedMeans, Period};
use crate::domain::{Energy, Power, TimeFrame};
use crate::error::{AssessmentError, Result};

pub const DEFAULT_TURBULENCE_INTENSITY: f64 = 0.05;
/// kg/m³
pub const DEFAULT_AIR_DENSITY: f64 = 1.225;

/// Model choices passed to the simulation engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct FarmSimulationConfig {
    #[validate(length(min = 1))]
    pub turbine_model: String,
    #[validate(length(min = 1))]
    pub rotor_model: String,
    #[validate(length(min = 1))]
    pub wake_models: Vec<String>,
    pub partial_wakes: Option<String>,
    /// States per engine chunk
    #[validate(range(min = 1))]
    pub chunk_states: usize,
}

impl Default for FarmSimulationConfig {
    fn default() -> Self {
        Self {
            turbine_model: "IEA15MW".into(),
            rotor_model: "centre".into(),
            wake_models: vec!["Bastankhah2014_linear".into()],
            partial_wakes: None,
            chunk_states: 100,
        }
    }
}

/// Where a state sits: a point in time or a calendar group (e.g. a month)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum StateIndex {
    Time(NaiveDateTime),
    Group(i32),
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WindState {
    pub index: StateIndex,
    pub speed: f64,
    pub direction: f64,
    pub turbulence_intensity: f64,
    pub air_density: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WindStates {
    states: Vec<WindState>,
}

impl WindStates {
    fn build(entries: impl Iterator<Item = (StateIndex, f64, f64)>) -> Self {
        Self {
            states: entries
                .map(|(index, speed, direction)| WindState {
                    index,
                    speed,
                    direction,
                    turbulence_intensity: DEFAULT_TURBULENCE_INTENSITY,
                    air_density: DEFAULT_AIR_DENSITY,
                })
                .collect(),
        }
    }

    /// One state per row with both a speed and a direction; rows with a
    /// null in either are skipped.
    pub fn from_series(frame: &TimeFrame, speed_column: &str, direction_column: &str) -> Result<Self> {
        let speed = frame.column(speed_column)?;
        let direction = frame.column(direction_column)?;
        let states = Self::build(frame.index().iter().zip(speed.into_iter().zip(direction)).filter_map(
            |(t, pair)| match pair {
                (Some(s), Some(d)) => Some((StateIndex::Time(*t), s, d)),
                _ => None,
            },
        ));
        debug!(states = states.len(), skipped = frame.len() - states.len(), "wind states from series");
        Ok(states)
    }

    /// One state per month from monthly mean speed and direction
    pub fn monthly_means(means: &GroupedMeans, speed_column: &str, direction_column: &str) -> Result<Self> {
        if means.period != Period::Month {
            return Err(AssessmentError::Domain(format!(
                "monthly wind states need monthly means, got {} means",
                means.period
            )));
        }
        let missing = |c: &str| AssessmentError::MissingColumn { column: c.to_string() };
        let speed = means.series(speed_column).ok_or_else(|| missing(speed_column))?;
        let direction = means.series(direction_column).ok_or_else(|| missing(direction_column))?;

        Ok(Self::build(speed.into_iter().filter_map(|(month, s)| {
            direction
                .iter()
                .find(|(m, _)| *m == month)
                .map(|&(_, d)| (StateIndex::Group(month), s, d))
        })))
    }

    pub fn with_turbulence_intensity(mut self, ti: f64) -> Result<Self> {
        if !(ti > 0.0 && ti <= 1.0) {
            return Err(AssessmentError::InvalidConfig(format!(
                "turbulence intensity must lie in (0, 1], got {ti}"
            )));
        }
        self.states.iter_mut().for_each(|s| s.turbulence_intensity = ti);
        Ok(self)
    }

    pub fn with_air_density(mut self, rho: f64) -> Result<Self> {
        if !(rho > 0.0) {
            return Err(AssessmentError::InvalidConfig(format!(
                "air density must be positive, got {rho}"
            )));
        }
        self.states.iter_mut().for_each(|s| s.air_density = rho);
        Ok(self)
    }

    pub fn states(&self) -> &[WindState] {
        &self.states
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }
}

/// Per-turbine engine output
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TurbineResult {
    pub x: f64,
    pub y: f64,
    /// Mean rotor-equivalent wind speed, m/s
    pub mean_rews: f64,
    pub mean_power_kw: f64,
    pub yield_gwh: f64,
}

impl TurbineResult {
    pub fn position(&self) -> TurbinePosition {
        TurbinePosition::new(self.x, self.y)
    }
}

/// Engine output in the engine's own units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmRun {
    pub name: String,
    pub mean_power_kw: f64,
    /// Mean power without wake losses
    pub ambient_power_kw: f64,
    /// Fraction in [0, 1]
    pub efficiency: f64,
    pub annual_yield_gwh: f64,
    pub turbines: Vec<TurbineResult>,
}

#[cfg_attr(test, mockall::automock)]
pub trait FarmSimulator {
    fn run(&self, layout: &Layout, states: &WindStates, config: &FarmSimulationConfig) -> Result<FarmRun>;
}

/// One row of the farm summary table, in reporting units
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FarmSummary {
    pub name: String,
    #[serde(rename = "Farm power [MW]")]
    pub farm_power_mw: f64,
    #[serde(rename = "Farm ambient power [MW]")]
    pub ambient_power_mw: f64,
    #[serde(rename = "Farm efficiency [%]")]
    pub efficiency_percent: f64,
    #[serde(rename = "Annual farm yield [TWh]")]
    pub annual_yield_twh: f64,
}

impl FarmSummary {
    pub fn from_run(run: &FarmRun) -> Self {
        Self {
            name: run.name.clone(),
            farm_power_mw: Power::kilowatts(run.mean_power_kw).as_megawatts(),
            ambient_power_mw: Power::kilowatts(run.ambient_power_kw).as_megawatts(),
            efficiency_percent: run.efficiency * 100.0,
            annual_yield_twh: Energy::gigawatt_hours(run.annual_yield_gwh).as_terawatt_hours(),
        }
    }

    pub fn annual_yield(&self) -> Energy {
        Energy::terawatt_hours(self.annual_yield_twh)
    }
}

/// Validate inputs, run the engine and summarise its output
pub fn simulate_farm(
    simulator: &dyn FarmSimulator,
    layout: &Layout,
    states: &WindStates,
    config: &FarmSimulationConfig,
) -> Result<(FarmSummary, FarmRun)> {
    config.validate()?;
    if layout.is_empty() {
        return Err(AssessmentError::Domain(format!("layout '{}' has no turbines", layout.name)));
    }
    if states.is_empty() {
        return Err(AssessmentError::InsufficientData {
            required: 1,
            available: 0,
        });
    }

    info!(
        farm = %layout.name,
        turbines = layout.len(),
        states = states.len(),
        wake_models = ?config.wake_models,
        "calculating wind farm power"
    );
    let run = simulator.run(layout, states, config)?;
    let summary = FarmSummary::from_run(&run);
    info!(
        farm = %summary.name,
        power_mw = summary.farm_power_mw,
        efficiency_percent = summary.efficiency_percent,
        yield_twh = summary.annual_yield_twh,
        "farm simulation finished"
    );
    Ok((summary, run))
}

/// Positions closer than this are treated as the same turbine
const POSITION_TOLERANCE_M: f64 = 1e-3;

/// Total yield of the turbines that belong to `own_layout`.
///
/// Used when neighbouring farms are simulated alongside a cluster to capture
/// their external wakes: only the cluster's own turbines are counted.
pub fn cluster_yield(turbines: &[TurbineResult], own_layout: &Layout) -> Energy {
    let (matched, total) = turbines
        .iter()
        .filter(|t| own_layout.contains_position(&t.position(), POSITION_TOLERANCE_M))
        .fold((0usize, 0.0), |(n, sum), t| (n + 1, sum + t.yield_gwh));
    debug!(matched, expected = own_layout.len(), "matched cluster turbines");
    Energy::gigawatt_hours(total)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::group_means;
    use chrono::{Duration, NaiveDate};

    fn t(h: i64) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap() + Duration::hours(h)
    }

    fn run() -> FarmRun {
        FarmRun {
            name: "N-9 cluster".into(),
            mean_power_kw: 1_500_000.0,
            ambient_power_kw: 1_800_000.0,
            efficiency: 0.8333,
            annual_yield_gwh: 13_140.0,
            turbines: vec![
                TurbineResult { x: 0.0, y: 0.0, mean_rews: 9.5, mean_power_kw: 7000.0, yield_gwh: 61.0 },
                TurbineResult { x: 800.0, y: 0.0, mean_rews: 9.1, mean_power_kw: 6500.0, yield_gwh: 57.0 },
                TurbineResult { x: 9000.0, y: 0.0, mean_rews: 9.8, mean_power_kw: 7200.0, yield_gwh: 63.0 },
            ],
        }
    }

    #[test]
    fn test_summary_units() {
        let summary = FarmSummary::from_run(&run());
        assert!((summary.farm_power_mw - 1500.0).abs() < 1e-9);
        assert!((summary.ambient_power_mw - 1800.0).abs() < 1e-9);
        assert!((summary.efficiency_percent - 83.33).abs() < 1e-9);
        assert!((summary.annual_yield_twh - 13.14).abs() < 1e-9);
    }

    #[test]
    fn test_cluster_yield_counts_own_turbines_only() {
        let own = Layout::new("N-9.1", vec![TurbinePosition::new(0.0, 0.0), TurbinePosition::new(800.0, 0.0)]);
        let energy = cluster_yield(&run().turbines, &own);
        assert!((energy.as_gigawatt_hours() - 118.0).abs() < 1e-9);
    }

    #[test]
    fn test_states_from_series_use_fixed_ti_and_density() {
        let frame = TimeFrame::from_parts(
            vec![t(0), t(1), t(2)],
            vec!["long-term_WS150".into(), "long-term_WD150".into()],
            vec![vec![Some(8.0), Some(200.0)], vec![None, Some(210.0)], vec![Some(9.0), Some(220.0)]],
        )
        .unwrap();
        let states = WindStates::from_series(&frame, "long-term_WS150", "long-term_WD150").unwrap();
        assert_eq!(states.len(), 2);
        assert_eq!(states.states()[1].index, StateIndex::Time(t(2)));
        assert!(states.states().iter().all(|s| s.turbulence_intensity == 0.05 && s.air_density == 1.225));

        let states = states.with_turbulence_intensity(0.08).unwrap();
        assert_eq!(states.states()[0].turbulence_intensity, 0.08);
        assert!(states.clone().with_turbulence_intensity(0.0).is_err());
        assert!(states.with_air_density(-1.0).is_err());
    }

    #[test]
    fn test_monthly_states() {
        let frame = TimeFrame::from_parts(
            vec![t(0), t(24 * 40)],
            vec!["WS".into(), "WD".into()],
            vec![vec![Some(8.0), Some(200.0)], vec![Some(10.0), Some(250.0)]],
        )
        .unwrap();
        let monthly = group_means(&frame, Period::Month, &["WS", "WD"]).unwrap();
        let states = WindStates::monthly_means(&monthly, "WS", "WD").unwrap();
        assert_eq!(states.len(), 2);
        assert_eq!(states.states()[1].index, StateIndex::Group(2));

        let yearly = group_means(&frame, Period::Year, &["WS", "WD"]).unwrap();
        assert!(WindStates::monthly_means(&yearly, "WS", "WD").is_err());
    }

    #[test]
    fn test_simulate_farm_passes_inputs_through() {
        let layout = Layout::new("N-9.1", vec![TurbinePosition::new(0.0, 0.0)]);
        let frame = TimeFrame::from_parts(vec![t(0)], vec!["ws".into(), "wd".into()], vec![vec![Some(9.0), Some(270.0)]])
            .unwrap();
        let states = WindStates::from_series(&frame, "ws", "wd").unwrap();

        let mut simulator = MockFarmSimulator::new();
        simulator
            .expect_run()
            .withf(|layout, states, config| {
                layout.len() == 1 && states.len() == 1 && config.turbine_model == "IEA15MW"
            })
            .times(1)
            .returning(|_, _, _| Ok(run()));

        let (summary, raw) =
            simulate_farm(&simulator, &layout, &states, &FarmSimulationConfig::default()).unwrap();
        assert_eq!(raw.turbines.len(), 3);
        assert!((summary.annual_yield().as_terawatt_hours() - 13.14).abs() < 1e-9);
    }

    #[test]
    fn test_simulate_farm_rejects_bad_inputs() {
        let mut simulator = MockFarmSimulator::new();
        simulator.expect_run().never();
        let states = WindStates::default();
        let layout = Layout::new("empty", vec![]);
        assert!(simulate_farm(&simulator, &layout, &states, &FarmSimulationConfig::default()).is_err());

        let layout = Layout::new("one", vec![TurbinePosition::new(0.0, 0.0)]);
        let config = FarmSimulationConfig {
            wake_models: vec![],
            ..Default::default()
        };
        assert!(matches!(
            simulate_farm(&simulator, &layout, &states, &config),
            Err(AssessmentError::InvalidConfig(_))
        ));
    }
}
