//! Regression Metrics and Evaluation
//!
//! Error metrics used to judge a long-term correction model on held-out
//! data: MAE, RMSE and the squared correlation between measured and
//! predicted values.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::regression::pearson_r;
use crate::error::{AssessmentError, Result};

/// Accuracy of predictions against held-out observations
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Mean Absolute Error
    pub mae: f64,
    /// Root Mean Square Error
    pub rmse: f64,
    /// Squared Pearson correlation between measured and predicted values.
    /// 0.0 when undefined (fewer than two points or a constant series).
    pub r_squared: f64,
    /// Number of samples evaluated
    pub sample_count: usize,
    /// Largest absolute error
    pub max_error: f64,
    /// Mean error (predicted - measured)
    pub bias: f64,
}

impl RegressionMetrics {
    /// Calculate metrics from measured and predicted values
    pub fn calculate(measured: &[f64], predicted: &[f64]) -> Result<Self> {
        if measured.len() != predicted.len() {
            return Err(AssessmentError::Domain(format!(
                "dimension mismatch: measured={}, predicted={}",
                measured.len(),
                predicted.len()
            )));
        }

        if measured.is_empty() {
            return Err(AssessmentError::InsufficientData {
                required: 1,
                available: 0,
            });
        }

        let n = measured.len() as f64;
        let errors: Vec<f64> = measured
            .iter()
            .zip(predicted)
            .map(|(m, p)| p - m)
            .collect();

        let mae = errors.iter().map(|e| e.abs()).sum::<f64>() / n;
        let rmse = (errors.iter().map(|e| e * e).sum::<f64>() / n).sqrt();
        let bias = errors.iter().sum::<f64>() / n;
        let max_error = errors.iter().map(|e| e.abs()).fold(0.0f64, f64::max);

        let r_squared = pearson_r(measured, predicted)
            .map(|r| r * r)
            .unwrap_or(0.0);

        Ok(Self {
            mae,
            rmse,
            r_squared,
            sample_count: measured.len(),
            max_error,
            bias,
        })
    }
}

impl fmt::Display for RegressionMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MAE={:.3}, RMSE={:.3}, R²={:.3} (n={})",
            self.mae, self.rmse, self.r_squared, self.sample_count
        )
    }
}
