//! Linear measure-correlate-predict.
//!
//! A short on-site record (target) is regressed on a long reference record
//! over their common period, and the fitted line is then applied to the whole
//! reference series to give a long-term corrected target series. Directions
//! are shifted by the constant difference of the two mean bearings.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;
use std::collections::HashMap;
use tracing::{debug, info, warn};
use validator::Validate;

use super::split::train_test_split;
use crate::analysis::{group_means, wrap_degrees, GroupedMeans, Period};
use crate::domain::TimeFrame;
use crate::error::{AssessmentError, Result};
use crate::stats::{LinearFit, RegressionMetrics};

/// Suffix given to target columns whose name already exists in the reference
pub const TARGET_SUFFIX: &str = "_target";
/// Prefix of the corrected output columns
pub const LONG_TERM_PREFIX: &str = "long-term_";

/// Left join of `target` onto the timestamps of `reference`.
///
/// The reference drives the index; target cells with no matching timestamp
/// are null. Target columns clashing with a reference column get
/// [`TARGET_SUFFIX`]. Repeated target timestamps resolve to the first row.
pub fn align(reference: &TimeFrame, target: &TimeFrame) -> Result<TimeFrame> {
    let mut by_time: HashMap<NaiveDateTime, usize> = HashMap::with_capacity(target.len());
    for (i, ts) in target.index().iter().enumerate() {
        by_time.entry(*ts).or_insert(i);
    }

    let mut aligned = reference.clone();
    for (pos, name) in target.columns().iter().enumerate() {
        let values = reference
            .index()
            .iter()
            .map(|ts| by_time.get(ts).and_then(|&i| target.rows()[i][pos]))
            .collect();
        let name = if reference.has_column(name) {
            format!("{name}{TARGET_SUFFIX}")
        } else {
            name.clone()
        };
        aligned = aligned.with_column(&name, values)?;
    }

    debug!(
        reference_rows = reference.len(),
        matched = reference.index().iter().filter(|t| by_time.contains_key(*t)).count(),
        "aligned target onto reference index"
    );
    Ok(aligned)
}

/// Column names of the two records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct McpColumns {
    pub reference_speed: String,
    pub reference_direction: String,
    pub target_speed: String,
    pub target_direction: String,
}

impl Default for McpColumns {
    fn default() -> Self {
        Self {
            reference_speed: "WS100".into(),
            reference_direction: "WD100".into(),
            target_speed: "WS150".into(),
            target_direction: "WD150".into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(default)]
pub struct McpSettings {
    /// Share of paired rows held out for evaluation
    #[validate(range(exclusive_min = 0.0, exclusive_max = 1.0))]
    pub test_fraction: f64,
    pub seed: u64,
    pub columns: McpColumns,
}

impl Default for McpSettings {
    fn default() -> Self {
        Self {
            test_fraction: 0.3,
            seed: 42,
            columns: McpColumns::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct McpOutcome {
    pub fit: LinearFit,
    /// Accuracy on the held-out rows
    pub metrics: RegressionMetrics,
    pub train_size: usize,
    pub test_size: usize,
    /// Degrees added to every reference bearing
    pub direction_offset: f64,
    /// Reference index, reference and target columns plus the two
    /// long-term corrected columns
    pub series: TimeFrame,
    pub speed_column: String,
    pub direction_column: String,
    /// Mean of the observed target speed
    pub measured_mean_speed: f64,
    /// Mean of the long-term corrected speed
    pub corrected_mean_speed: f64,
    /// Monthly means of measured and corrected speed, in that column order
    pub monthly: GroupedMeans,
}

#[derive(Debug, Clone, Default)]
pub struct McpCorrector {
    settings: McpSettings,
}

impl McpCorrector {
    pub fn new(settings: McpSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &McpSettings {
        &self.settings
    }

    /// Fit the target record against the reference and predict the
    /// long-term target series over the whole reference span.
    ///
    /// Fails with [`AssessmentError::InsufficientData`] when fewer than two
    /// rows have both a reference and a target speed.
    pub fn correct(&self, reference: &TimeFrame, target: &TimeFrame) -> Result<McpOutcome> {
        let cols = &self.settings.columns;
        let aligned = align(reference, target)?;

        let target_name = |name: &str| {
            if reference.has_column(name) {
                format!("{name}{TARGET_SUFFIX}")
            } else {
                name.to_string()
            }
        };
        let target_speed_col = target_name(&cols.target_speed);
        let target_dir_col = target_name(&cols.target_direction);

        let ref_speed = aligned.column(&cols.reference_speed)?;
        let ref_dir = aligned.column(&cols.reference_direction)?;
        let tgt_speed = aligned.column(&target_speed_col)?;
        let tgt_dir = aligned.column(&target_dir_col)?;

        let (x, y): (Vec<f64>, Vec<f64>) = ref_speed
            .iter()
            .zip(&tgt_speed)
            .filter_map(|pair| match pair {
                (Some(r), Some(t)) => Some((*r, *t)),
                _ => None,
            })
            .unzip();
        if x.len() < 2 {
            return Err(AssessmentError::InsufficientData {
                required: 2,
                available: x.len(),
            });
        }

        let split = train_test_split(x.len(), self.settings.test_fraction, self.settings.seed)?;
        let pick = |values: &[f64], rows: &[usize]| -> Vec<f64> { rows.iter().map(|&i| values[i]).collect() };

        let fit = LinearFit::fit(&pick(&x, &split.train), &pick(&y, &split.train))?;
        let y_test = pick(&y, &split.test);
        let predicted = fit.predict_all(&pick(&x, &split.test));
        let metrics = RegressionMetrics::calculate(&y_test, &predicted)?;
        info!(
            slope = fit.slope,
            intercept = fit.intercept,
            train = split.train.len(),
            test = split.test.len(),
            "MCP model evaluation: {metrics}"
        );

        let corrected_speed: Vec<Option<f64>> =
            ref_speed.iter().map(|s| s.map(|s| fit.predict(s))).collect();

        let observed_dirs: Vec<f64> = tgt_dir.iter().flatten().copied().collect();
        let reference_dirs: Vec<f64> = ref_dir.iter().flatten().copied().collect();
        let direction_offset = if observed_dirs.is_empty() || reference_dirs.is_empty() {
            warn!("no overlapping directions, wind direction is left uncorrected");
            0.0
        } else {
            observed_dirs.as_slice().mean() - reference_dirs.as_slice().mean()
        };
        let corrected_dir: Vec<Option<f64>> = ref_dir
            .iter()
            .map(|d| d.map(|d| wrap_degrees(d + direction_offset)))
            .collect();

        let speed_column = format!("{LONG_TERM_PREFIX}{}", cols.target_speed);
        let direction_column = format!("{LONG_TERM_PREFIX}{}", cols.target_direction);
        let series = aligned
            .with_column(&speed_column, corrected_speed)?
            .with_column(&direction_column, corrected_dir)?;

        let measured_mean_speed = y.as_slice().mean();
        let corrected_mean_speed = series.values(&speed_column)?.mean();
        info!(
            direction_offset,
            measured_mean_speed,
            corrected_mean_speed,
            "long-term correction applied"
        );

        let monthly = group_means(&series, Period::Month, &[&target_speed_col, &speed_column])?;

        Ok(McpOutcome {
            fit,
            metrics,
            train_size: split.train.len(),
            test_size: split.test.len(),
            direction_offset,
            series,
            speed_column,
            direction_column,
            measured_mean_speed,
            corrected_mean_speed,
            monthly,
        })
    }
}
