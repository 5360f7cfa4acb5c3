use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use validator::Validate;

use crate::domain::{Energy, Frequency, PowerUnit};
use crate::energy::{AepSettings, TurbineSite, DEFAULT_REFERENCE_CONSUMPTION_TWH};
use crate::farm::{FarmSimulationConfig, LayoutOptimizerConfig};
use crate::mcp::McpSettings;
use crate::stats::QuadratureSettings;

pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct Config {
    pub data: DataConfig,
    pub qc: QcConfig,
    #[validate(nested)]
    pub aep: AepConfig,
    #[validate(nested)]
    pub mcp: McpSettings,
    #[validate(nested)]
    pub farm: FarmSimulationConfig,
    #[validate(nested)]
    pub layout: LayoutOptimizerConfig,
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    pub reanalysis_dir: PathBuf,
    pub file_prefix: String,
    pub start_year: i32,
    pub end_year: i32,
    pub time_column: String,
    /// Levels with `u{level}` / `v{level}` component columns, e.g. "100"
    pub wind_levels: Vec<String>,
    pub power_curve: PathBuf,
    pub power_unit: PowerUnit,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            reanalysis_dir: PathBuf::from("data/era5"),
            file_prefix: "ERA5_N-9_".into(),
            start_year: 2000,
            end_year: 2023,
            time_column: "Time [UTC]".into(),
            wind_levels: vec!["100".into(), "10".into()],
            power_curve: PathBuf::from("data/power_curve.csv"),
            power_unit: PowerUnit::Kilowatt,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct QcConfig {
    pub frequency: Frequency,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct AepConfig {
    pub sites: Vec<TurbineSite>,
    #[validate(range(exclusive_min = 0.0))]
    pub reference_consumption_twh: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub epsabs: f64,
    #[validate(range(exclusive_min = 0.0))]
    pub epsrel: f64,
    #[validate(range(min = 1))]
    pub limit: usize,
}

impl Default for AepConfig {
    fn default() -> Self {
        let quadrature = QuadratureSettings::default();
        Self {
            sites: vec![
                TurbineSite::new("N-9.1", 144),
                TurbineSite::new("N-9.2", 130),
                TurbineSite::new("N-9.3", 92),
            ],
            reference_consumption_twh: DEFAULT_REFERENCE_CONSUMPTION_TWH,
            epsabs: quadrature.epsabs,
            epsrel: quadrature.epsrel,
            limit: quadrature.limit,
        }
    }
}

impl AepConfig {
    pub fn settings(&self) -> AepSettings {
        AepSettings {
            quadrature: QuadratureSettings {
                epsabs: self.epsabs,
                epsrel: self.epsrel,
                limit: self.limit,
            },
            reference_consumption: Energy::terawatt_hours(self.reference_consumption_twh),
        }
    }
}

/// Output directory and file names of the CSV exports
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub aep_summary: String,
    pub no_wake_yield: String,
    pub long_term_series: String,
    pub missing_rows: String,
    pub duplicate_rows: String,
    pub yearly_means: String,
    pub monthly_means: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("output"),
            aep_summary: "aep_summary.csv".into(),
            no_wake_yield: "total_farmyield_nowakes.csv".into(),
            long_term_series: "long_term_series.csv".into(),
            missing_rows: "missing_data.csv".into(),
            duplicate_rows: "duplicates.csv".into(),
            yearly_means: "yearly_means.csv".into(),
            monthly_means: "monthly_means.csv".into(),
        }
    }
}

impl OutputConfig {
    pub fn path(&self, file: &str) -> PathBuf {
        self.dir.join(file)
    }
}

impl Config {
    /// Defaults, then `config/default.toml`, then `OWA__`-prefixed environment
    /// variables (`OWA__AEP__LIMIT=200`).
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(DEFAULT_CONFIG_PATH))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let figment = Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("OWA__").split("__"));
        let config: Config = figment
            .extract()
            .with_context(|| format!("loading configuration from {}", path.display()))?;
        config.validate().context("validating configuration")?;
        Ok(config)
    }
}
