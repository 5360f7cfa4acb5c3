use serde::{Deserialize, Serialize};
use statrs::statistics::Statistics;

use crate::error::{AssessmentError, Result};

/// Ordinary least squares fit of `y = slope * x + intercept`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// Number of points the fit was computed from
    pub sample_count: usize,
}

impl LinearFit {
    /// Fit a line through the points.
    ///
    /// When `x` has no spread (a single point, or all x equal) the slope is
    /// undetermined; the minimum-norm solution is returned: slope 0 and
    /// intercept = mean(y).
    pub fn fit(x: &[f64], y: &[f64]) -> Result<Self> {
        if x.len() != y.len() {
            return Err(AssessmentError::Domain(format!(
                "regression inputs differ in length: x={}, y={}",
                x.len(),
                y.len()
            )));
        }
        if x.is_empty() {
            return Err(AssessmentError::InsufficientData {
                required: 1,
                available: 0,
            });
        }

        let mean_x = x.mean();
        let mean_y = y.mean();

        let (sxx, sxy) = x
            .iter()
            .zip(y)
            .fold((0.0, 0.0), |(sxx, sxy), (xi, yi)| {
                let dx = xi - mean_x;
                (sxx + dx * dx, sxy + dx * (yi - mean_y))
            });

        let slope = if sxx > f64::EPSILON * x.len() as f64 {
            sxy / sxx
        } else {
            0.0
        };

        Ok(Self {
            slope,
            intercept: mean_y - slope * mean_x,
            sample_count: x.len(),
        })
    }

    pub fn predict(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }

    pub fn predict_all(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.predict(x)).collect()
    }
}

/// Pearson correlation coefficient. `None` with fewer than two points or
/// when either series is constant.
pub fn pearson_r(x: &[f64], y: &[f64]) -> Option<f64> {
    if x.len() != y.len() || x.len() < 2 {
        return None;
    }

    let mean_x = x.mean();
    let mean_y = y.mean();
    let (sxx, syy, sxy) = x.iter().zip(y).fold((0.0, 0.0, 0.0), |acc, (xi, yi)| {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        (acc.0 + dx * dx, acc.1 + dy * dy, acc.2 + dx * dy)
    });

    let denom = (sxx * syy).sqrt();
    if denom <= f64::EPSILON {
        return None;
    }
    Some((sxy / denom).clamp(-1.0, 1.0))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_exact_line() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [3.0, 5.0, 7.0, 9.0];
        let fit = LinearFit::fit(&x, &y).unwrap();
        assert!((fit.slope - 2.0).abs() < 1e-12);
        assert!((fit.intercept - 1.0).abs() < 1e-12);
        assert_eq!(fit.predict_all(&[10.0]), vec![21.0]);
    }

    #[test]
    fn test_degenerate_x_gives_flat_line() {
        let fit = LinearFit::fit(&[5.0, 5.0], &[7.0, 9.0]).unwrap();
        assert_eq!(fit.slope, 0.0);
        assert_eq!(fit.intercept, 8.0);

        let single = LinearFit::fit(&[5.0], &[7.0]).unwrap();
        assert_eq!(single.predict(5.0), 7.0);
    }

    #[test]
    fn test_fit_errors() {
        assert!(matches!(
            LinearFit::fit(&[], &[]),
            Err(AssessmentError::InsufficientData { .. })
        ));
        assert!(matches!(
            LinearFit::fit(&[1.0], &[1.0, 2.0]),
            Err(AssessmentError::Domain(_))
        ));
    }

    #[test]
    fn test_pearson() {
        let r = pearson_r(&[1.0, 2.0, 3.0], &[2.0, 4.0, 6.5]).unwrap();
        assert!(r > 0.99);
        let r = pearson_r(&[1.0, 2.0, 3.0], &[3.0, 2.0, 1.0]).unwrap();
        assert!((r + 1.0).abs() < 1e-12);
        assert_eq!(pearson_r(&[1.0], &[1.0]), None);
        assert_eq!(pearson_r(&[1.0, 2.0], &[3.0, 3.0]), None);
    }

    proptest! {
        #[test]
        fn prop_recovers_noise_free_line(
            slope in -5.0f64..5.0,
            intercept in -10.0f64..10.0,
            xs in prop::collection::vec(0.0f64..30.0, 3..40),
        ) {
            prop_assume!(xs.iter().any(|x| (x - xs[0]).abs() > 0.1));
            let ys: Vec<f64> = xs.iter().map(|x| slope * x + intercept).collect();
            let fit = LinearFit::fit(&xs, &ys).unwrap();
            prop_assert!((fit.slope - slope).abs() < 1e-6);
            prop_assert!((fit.intercept - intercept).abs() < 1e-6);
        }
    }
}
