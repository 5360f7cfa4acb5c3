//! Two-parameter Weibull fit (location fixed at 0) by maximum likelihood.
//!
//! With location 0 the likelihood equations reduce to a single equation in
//! the shape `k`:
//!
//! ```text
//! g(k) = Σ xᵏ ln x / Σ xᵏ − 1/k − mean(ln x) = 0
//! ```
//!
//! `g` is strictly increasing in `k`, so the root is bracketed and solved
//! with a Newton iteration that falls back to bisection whenever a step
//! leaves the bracket. The scale follows in closed form,
//! `λ = (Σ xᵏ / n)^(1/k)`.

use serde::{Deserialize, Serialize};
use statrs::distribution::{Continuous, ContinuousCDF, Weibull};
use statrs::function::gamma::gamma;
use statrs::statistics::Statistics;
use tracing::{debug, warn};

use crate::error::{AssessmentError, Result};

const MAX_ITERATIONS: usize = 100;
const TOLERANCE: f64 = 1e-10;

/// Fitted Weibull shape (k) and scale (λ), location 0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeibullFit {
    pub shape: f64,
    pub scale: f64,
    /// Number of strictly positive values used in the fit
    pub sample_size: usize,
}

impl WeibullFit {
    /// Maximum-likelihood fit to wind speeds.
    ///
    /// Zero and non-finite speeds carry no information for a location-0
    /// Weibull (ln 0 is undefined) and are excluded. Needs at least two
    /// distinct positive values.
    pub fn fit(speeds: &[f64]) -> Result<Self> {
        let xs: Vec<f64> = speeds
            .iter()
            .copied()
            .filter(|v| v.is_finite() && *v > 0.0)
            .collect();

        if xs.len() < speeds.len() {
            warn!(
                excluded = speeds.len() - xs.len(),
                total = speeds.len(),
                "zero or non-finite wind speeds excluded from Weibull fit"
            );
        }

        let mut distinct = xs.clone();
        distinct.sort_by(f64::total_cmp);
        distinct.dedup();
        if distinct.len() < 2 {
            return Err(AssessmentError::Fit(format!(
                "need at least 2 distinct positive wind speeds, got {}",
                distinct.len()
            )));
        }

        let equation = LikelihoodEquation::new(&xs);
        let shape = equation.solve()?;
        let scale = equation.scale(shape);

        if !(shape.is_finite() && shape > 0.0 && scale.is_finite() && scale > 0.0) {
            return Err(AssessmentError::Fit(format!(
                "fit produced invalid parameters: shape={shape}, scale={scale}"
            )));
        }

        debug!(shape, scale, n = xs.len(), "Weibull fit converged");
        Ok(Self {
            shape,
            scale,
            sample_size: xs.len(),
        })
    }

    /// The fitted distribution
    pub fn distribution(&self) -> Result<Weibull> {
        Weibull::new(self.shape, self.scale)
            .map_err(|e| AssessmentError::Fit(format!("invalid Weibull parameters: {e}")))
    }

    pub fn pdf(&self, x: f64) -> f64 {
        self.distribution().map(|d| d.pdf(x)).unwrap_or(f64::NAN)
    }

    pub fn cdf(&self, x: f64) -> f64 {
        self.distribution().map(|d| d.cdf(x)).unwrap_or(f64::NAN)
    }

    /// Mean wind speed implied by the fit, λ Γ(1 + 1/k)
    pub fn mean(&self) -> f64 {
        self.scale * gamma(1.0 + 1.0 / self.shape)
    }
}

/// Sums of the likelihood equation, evaluated on x / max(x) to keep xᵏ in range.
struct LikelihoodEquation {
    logs: Vec<f64>,
    log_max: f64,
    mean_log: f64,
    n: f64,
}

impl LikelihoodEquation {
    fn new(xs: &[f64]) -> Self {
        let logs: Vec<f64> = xs.iter().map(|x| x.ln()).collect();
        let log_max = logs.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let mean_log = logs.iter().mean();
        Self {
            n: logs.len() as f64,
            logs,
            log_max,
            mean_log,
        }
    }

    /// (Σ yᵏ, Σ yᵏ ln x, Σ yᵏ (ln x)²) with y = x / max(x)
    fn sums(&self, k: f64) -> (f64, f64, f64) {
        self.logs.iter().fold((0.0, 0.0, 0.0), |(s0, s1, s2), &lx| {
            let w = (k * (lx - self.log_max)).exp();
            (s0 + w, s1 + w * lx, s2 + w * lx * lx)
        })
    }

    fn value(&self, k: f64) -> f64 {
        let (s0, s1, _) = self.sums(k);
        s1 / s0 - 1.0 / k - self.mean_log
    }

    fn value_and_slope(&self, k: f64) -> (f64, f64) {
        let (s0, s1, s2) = self.sums(k);
        let g = s1 / s0 - 1.0 / k - self.mean_log;
        let dg = (s2 * s0 - s1 * s1) / (s0 * s0) + 1.0 / (k * k);
        (g, dg)
    }

    fn scale(&self, k: f64) -> f64 {
        let (s0, _, _) = self.sums(k);
        (s0 / self.n).powf(1.0 / k) * self.log_max.exp()
    }

    /// Moment-based starting guess for the shape
    fn initial_guess(&self) -> f64 {
        let xs: Vec<f64> = self.logs.iter().map(|l| l.exp()).collect();
        let mean = xs.iter().mean();
        let std = xs.iter().population_std_dev();
        if mean > 0.0 && std > 0.0 {
            (std / mean).powf(-1.086).clamp(0.1, 50.0)
        } else {
            2.0
        }
    }

    fn bracket(&self) -> Result<(f64, f64)> {
        let mut lo = 0.01;
        while self.value(lo) > 0.0 {
            lo /= 2.0;
            if lo < 1e-8 {
                return Err(AssessmentError::Fit("could not bracket shape from below".into()));
            }
        }

        let mut hi = 10.0;
        while self.value(hi) < 0.0 {
            hi *= 2.0;
            if hi > 1e6 {
                return Err(AssessmentError::Fit("could not bracket shape from above".into()));
            }
        }
        Ok((lo, hi))
    }

    fn solve(&self) -> Result<f64> {
        let (mut lo, mut hi) = self.bracket()?;
        let mut k = self.initial_guess().clamp(lo, hi);

        for iteration in 0..MAX_ITERATIONS {
            let (g, dg) = self.value_and_slope(k);
            if !g.is_finite() {
                return Err(AssessmentError::Fit(format!(
                    "likelihood equation not finite at shape={k}"
                )));
            }

            if g < 0.0 {
                lo = k;
            } else {
                hi = k;
            }

            let newton = k - g / dg;
            let next = if dg > 0.0 && newton > lo && newton < hi {
                newton
            } else {
                0.5 * (lo + hi)
            };

            if (next - k).abs() <= TOLERANCE * k.max(1.0) {
                debug!(iterations = iteration + 1, "shape equation solved");
                return Ok(next);
            }
            k = next;
        }

        Err(AssessmentError::Fit(format!(
            "shape did not converge within {MAX_ITERATIONS} iterations (last estimate {k})"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_distr::Distribution;

    fn weibull_sample(shape: f64, scale: f64, n: usize, seed: u64) -> Vec<f64> {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let dist = rand_distr::Weibull::new(scale, shape).unwrap();
        (0..n).map(|_| dist.sample(&mut rng)).collect()
    }

    #[test]
    fn test_recovers_parameters() {
        let speeds = weibull_sample(2.0, 9.0, 20_000, 7);
        let fit = WeibullFit::fit(&speeds).unwrap();
        assert!((fit.shape - 2.0).abs() < 0.05, "shape {}", fit.shape);
        assert!((fit.scale - 9.0).abs() < 0.15, "scale {}", fit.scale);
        assert_eq!(fit.sample_size, 20_000);
    }

    #[test]
    fn test_mle_stationarity() {
        // At the MLE, λᵏ = mean(xᵏ)
        let speeds = [3.1, 4.7, 5.2, 6.8, 7.7, 8.0, 9.4, 11.2, 12.5, 14.0];
        let fit = WeibullFit::fit(&speeds).unwrap();
        let mean_pow = speeds.iter().map(|x| x.powf(fit.shape)).sum::<f64>() / speeds.len() as f64;
        assert!((fit.scale.powf(fit.shape) - mean_pow).abs() / mean_pow < 1e-8);
    }

    #[test]
    fn test_zeros_are_excluded() {
        let fit = WeibullFit::fit(&[0.0, 0.0, 4.0, 6.0, 8.0, 10.0]).unwrap();
        assert_eq!(fit.sample_size, 4);
    }

    #[test]
    fn test_degenerate_samples() {
        assert!(matches!(WeibullFit::fit(&[]), Err(AssessmentError::Fit(_))));
        assert!(matches!(WeibullFit::fit(&[5.0]), Err(AssessmentError::Fit(_))));
        assert!(matches!(
            WeibullFit::fit(&[5.0, 5.0, 5.0, 0.0]),
            Err(AssessmentError::Fit(_))
        ));
    }

    #[test]
    fn test_pdf_and_mean() {
        let fit = WeibullFit {
            shape: 2.0,
            scale: 9.0,
            sample_size: 0,
        };
        // Rayleigh special case: mean = λ √π / 2
        assert!((fit.mean() - 9.0 * std::f64::consts::PI.sqrt() / 2.0).abs() < 1e-9);
        let x = 5.0_f64;
        let expected = (2.0 / 9.0) * (x / 9.0) * (-(x / 9.0).powi(2)).exp();
        assert!((fit.pdf(x) - expected).abs() < 1e-12);
        assert!((fit.cdf(9.0) - (1.0 - (-1.0f64).exp())).abs() < 1e-12);
    }
}
