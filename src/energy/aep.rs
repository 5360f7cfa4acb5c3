//! Annual energy production from a Weibull fit and a power curve.
//!
//! The fitted wind-speed density is integrated against the interpolated
//! power curve between cut-in and cut-out, giving mean power per turbine;
//! multiplying by 8760 h gives single-turbine annual energy. Energies are
//! carried in Wh ([`Energy`]) and converted only when reported: GWh for a
//! single turbine, TWh for sites, totals and the reference consumption.

use serde::{Deserialize, Serialize};
use statrs::distribution::Continuous;
use tracing::{debug, info, warn};

use crate::domain::{Energy, PowerCurve, HOURS_PER_YEAR};
use crate::error::{AssessmentError, Result};
use crate::stats::{integrate, QuadratureSettings, WeibullFit};

/// Annual electricity consumption of Germany, the default reference figure
pub const DEFAULT_REFERENCE_CONSUMPTION_TWH: f64 = 507.0;

/// A site (wind-farm area) and the number of turbines planned on it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurbineSite {
    pub name: String,
    pub turbines: u32,
}

impl TurbineSite {
    pub fn new(name: impl Into<String>, turbines: u32) -> Self {
        Self {
            name: name.into(),
            turbines,
        }
    }
}

/// Annual energy of one site
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SiteAep {
    pub site: TurbineSite,
    pub energy: Energy,
}

/// Outcome of one AEP estimation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AepResult {
    pub weibull: WeibullFit,
    pub cut_in: f64,
    pub cut_out: f64,
    /// Annual energy of a single turbine
    pub single_turbine: Energy,
    /// Quadrature error estimate, annualised like `single_turbine`
    pub single_turbine_error: Energy,
    pub integration_converged: bool,
    pub sites: Vec<SiteAep>,
    /// Sum over all sites
    pub total: Energy,
    pub reference_consumption: Energy,
    /// `total` as a percentage of `reference_consumption`
    pub share_of_reference_percent: f64,
}

impl AepResult {
    pub fn single_turbine_gwh(&self) -> f64 {
        self.single_turbine.as_gigawatt_hours()
    }

    pub fn single_turbine_error_gwh(&self) -> f64 {
        self.single_turbine_error.as_gigawatt_hours()
    }

    pub fn total_twh(&self) -> f64 {
        self.total.as_terawatt_hours()
    }

    pub fn total_turbines(&self) -> u32 {
        self.sites.iter().map(|s| s.site.turbines).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AepSettings {
    pub quadrature: QuadratureSettings,
    pub reference_consumption: Energy,
}

impl Default for AepSettings {
    fn default() -> Self {
        Self {
            quadrature: QuadratureSettings::default(),
            reference_consumption: Energy::terawatt_hours(DEFAULT_REFERENCE_CONSUMPTION_TWH),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct AepEstimator {
    settings: AepSettings,
}

impl AepEstimator {
    pub fn new(settings: AepSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &AepSettings {
        &self.settings
    }

    /// Estimate single-turbine and per-site annual energy.
    ///
    /// Fails with a domain error when the power curve never produces, and
    /// with a fit error when the speeds cannot be fitted.
    pub fn estimate(
        &self,
        speeds: &[f64],
        curve: &PowerCurve,
        sites: &[TurbineSite],
    ) -> Result<AepResult> {
        let cut_in = curve.cut_in()?;
        let cut_out = curve.cut_out()?;
        debug!(cut_in, cut_out, "power curve operating range");

        let weibull = WeibullFit::fit(speeds)?;
        let density = weibull.distribution()?;

        let integral = integrate(
            |ws| curve.power_at(ws).as_watts() * density.pdf(ws),
            cut_in,
            cut_out,
            &self.settings.quadrature,
        );
        if !integral.converged {
            warn!(
                subintervals = integral.subintervals,
                abs_error = integral.abs_error,
                "power integration hit the subdivision limit before reaching tolerance"
            );
        }
        if !integral.value.is_finite() {
            return Err(AssessmentError::Fit(format!(
                "power integral is not finite (shape={}, scale={})",
                weibull.shape, weibull.scale
            )));
        }

        // integral.value is mean power in W
        let single_turbine = Energy::watt_hours(integral.value * HOURS_PER_YEAR);
        let single_turbine_error = Energy::watt_hours(integral.abs_error * HOURS_PER_YEAR);

        let sites: Vec<SiteAep> = sites
            .iter()
            .map(|site| SiteAep {
                site: site.clone(),
                energy: single_turbine * f64::from(site.turbines),
            })
            .collect();
        let total: Energy = sites.iter().map(|s| s.energy).sum();
        let share_of_reference_percent = total.percent_of(self.settings.reference_consumption);

        info!(
            shape = weibull.shape,
            scale = weibull.scale,
            single_turbine_gwh = single_turbine.as_gigawatt_hours(),
            error_gwh = single_turbine_error.as_gigawatt_hours(),
            total_twh = total.as_terawatt_hours(),
            share_percent = share_of_reference_percent,
            "annual energy production estimated"
        );

        Ok(AepResult {
            weibull,
            cut_in,
            cut_out,
            single_turbine,
            single_turbine_error,
            integration_converged: integral.converged,
            sites,
            total,
            reference_consumption: self.settings.reference_consumption,
            share_of_reference_percent,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_distr::Distribution;

    /// 0 below 3 m/s, linear ramp to 10 MW at 12 m/s, flat to 25 m/s, 0 above
    fn reference_curve() -> PowerCurve {
        let mut pairs: Vec<(f64, f64)> = (0..=30)
            .map(|ws| {
                let ws = ws as f64;
                let kw = if ws < 3.0 || ws > 25.0 {
                    0.0
                } else if ws < 12.0 {
                    10_000.0 * (ws - 3.0) / 9.0
                } else {
                    10_000.0
                };
                (ws, kw)
            })
            .collect();
        // make 3 m/s the first producing sample
        pairs[3].1 = 1.0;
        PowerCurve::from_kilowatts(&pairs).unwrap()
    }

    fn weibull_speeds(n: usize) -> Vec<f64> {
        let mut rng = rand::rngs::StdRng::seed_from_u64(42);
        let dist = rand_distr::Weibull::new(9.0, 2.0).unwrap();
        (0..n).map(|_| dist.sample(&mut rng)).collect()
    }

    #[test]
    fn test_single_turbine_energy_below_nameplate() {
        let result = AepEstimator::default()
            .estimate(&weibull_speeds(5_000), &reference_curve(), &[])
            .unwrap();

        let nameplate = Energy::kilowatt_hours(10_000.0 * 8760.0);
        assert!(result.single_turbine > Energy::default());
        assert!(result.single_turbine < nameplate);
        assert!(result.integration_converged);
        assert_eq!(result.cut_in, 3.0);
        assert_eq!(result.cut_out, 25.0);
        // capacity factor of a 10 MW machine in a k=2, λ=9 climate
        let cf = result.single_turbine.as_watt_hours() / nameplate.as_watt_hours();
        assert!(cf > 0.3 && cf < 0.7, "capacity factor {cf}");
    }

    #[test]
    fn test_sites_scale_linearly_and_sum() {
        let sites = vec![
            TurbineSite::new("N-9.1", 144),
            TurbineSite::new("N-9.2", 130),
            TurbineSite::new("N-9.3", 92),
        ];
        let result = AepEstimator::default()
            .estimate(&weibull_speeds(2_000), &reference_curve(), &sites)
            .unwrap();

        assert_eq!(result.total_turbines(), 366);
        let one = result.single_turbine.as_watt_hours();
        for s in &result.sites {
            let expected = one * f64::from(s.site.turbines);
            assert!((s.energy.as_watt_hours() - expected).abs() <= expected * 1e-12);
        }
        let expected_total = one * 366.0;
        assert!((result.total.as_watt_hours() - expected_total).abs() <= expected_total * 1e-12);

        let share = result.total_twh() / DEFAULT_REFERENCE_CONSUMPTION_TWH * 100.0;
        assert!((result.share_of_reference_percent - share).abs() < 1e-9);
        assert!((result.single_turbine_gwh() * 1e-3 - result.single_turbine.as_terawatt_hours()).abs() < 1e-12);
    }

    #[test]
    fn test_curve_without_production_is_domain_error() {
        let curve = PowerCurve::from_kilowatts(&[(3.0, 0.0), (12.0, 0.0), (25.0, 0.0)]).unwrap();
        let err = AepEstimator::default()
            .estimate(&weibull_speeds(100), &curve, &[])
            .unwrap_err();
        assert!(matches!(err, AssessmentError::Domain(_)));
    }

    #[test]
    fn test_degenerate_sample_is_fit_error() {
        let err = AepEstimator::default()
            .estimate(&[7.0, 7.0, 7.0], &reference_curve(), &[])
            .unwrap_err();
        assert!(matches!(err, AssessmentError::Fit(_)));
    }

    #[test]
    fn test_error_estimate_is_annualised() {
        let result = AepEstimator::default()
            .estimate(&weibull_speeds(1_000), &reference_curve(), &[])
            .unwrap();
        // tolerance of 1e-5 W (absolute) or 1e-5 relative, times 8760 h
        let bound = (1e-5f64).max(1e-5 * result.single_turbine.as_watt_hours() / 8760.0) * 8760.0;
        assert!(result.single_turbine_error.as_watt_hours() <= bound);
    }
}
