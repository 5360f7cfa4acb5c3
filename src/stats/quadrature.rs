//! Globally adaptive Gauss–Kronrod (10/21-point) integration.
//!
//! The interval with the largest error estimate is bisected until the
//! summed error meets `max(epsabs, epsrel * |integral|)` or the subdivision
//! limit is reached. Error estimation follows the QUADPACK `qk21` rule.

use serde::{Deserialize, Serialize};

/// Kronrod abscissae on [0, 1]; odd indices are also the 10-point Gauss nodes
const XGK: [f64; 11] = [
    0.995_657_163_025_808_080_735_527_280_689_003,
    0.973_906_528_517_171_720_077_964_012_084_452,
    0.930_157_491_355_708_226_001_207_180_059_508,
    0.865_063_366_688_984_510_732_096_688_423_493,
    0.780_817_726_586_416_897_063_717_578_345_042,
    0.679_409_568_299_024_406_234_327_365_114_874,
    0.562_757_134_668_604_683_339_000_099_272_694,
    0.433_395_394_129_247_190_799_265_943_165_784,
    0.294_392_862_701_460_198_131_126_603_103_866,
    0.148_874_338_981_631_210_884_826_001_129_720,
    0.0,
];

const WGK: [f64; 11] = [
    0.011_694_638_867_371_874_278_064_396_062_192,
    0.032_558_162_307_964_727_478_818_972_459_390,
    0.054_755_896_574_351_996_031_381_300_244_580,
    0.075_039_674_810_919_952_767_043_140_916_190,
    0.093_125_454_583_697_605_535_065_465_083_366,
    0.109_387_158_802_297_641_899_210_590_325_805,
    0.123_491_976_262_065_851_077_208_980_222_523,
    0.134_709_217_311_473_325_928_054_001_771_707,
    0.142_775_938_577_060_080_797_094_273_138_717,
    0.147_739_104_901_338_491_374_841_515_972_068,
    0.149_445_554_002_916_905_664_936_468_389_821,
];

const WG: [f64; 5] = [
    0.066_671_344_308_688_137_593_568_809_893_332,
    0.149_451_349_150_580_593_145_776_339_657_697,
    0.219_086_362_515_982_043_995_534_934_228_163,
    0.269_266_719_309_996_355_091_226_921_569_469,
    0.295_524_224_714_752_870_173_892_994_651_338,
];

/// Tolerances and subdivision cap
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QuadratureSettings {
    pub epsabs: f64,
    pub epsrel: f64,
    /// Maximum number of subintervals
    pub limit: usize,
}

impl Default for QuadratureSettings {
    fn default() -> Self {
        Self {
            epsabs: 1e-5,
            epsrel: 1e-5,
            limit: 100,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Integral {
    pub value: f64,
    /// Estimated absolute error of `value`
    pub abs_error: f64,
    pub subintervals: usize,
    /// False when the limit was hit before the tolerance was met
    pub converged: bool,
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    a: f64,
    b: f64,
    value: f64,
    error: f64,
}

impl Segment {
    fn evaluate<F: Fn(f64) -> f64>(f: &F, a: f64, b: f64) -> Self {
        let (value, error) = kronrod21(f, a, b);
        Self { a, b, value, error }
    }
}

/// Integrate `f` over `[a, b]`
pub fn integrate<F>(f: F, a: f64, b: f64, settings: &QuadratureSettings) -> Integral
where
    F: Fn(f64) -> f64,
{
    if a == b {
        return Integral {
            value: 0.0,
            abs_error: 0.0,
            subintervals: 0,
            converged: true,
        };
    }
    if a > b {
        let r = integrate(f, b, a, settings);
        return Integral {
            value: -r.value,
            ..r
        };
    }

    let limit = settings.limit.max(1);
    let mut segments = vec![Segment::evaluate(&f, a, b)];

    loop {
        let value: f64 = segments.iter().map(|s| s.value).sum();
        let error: f64 = segments.iter().map(|s| s.error).sum();
        let tolerance = settings.epsabs.max(settings.epsrel * value.abs());

        if error <= tolerance {
            return Integral {
                value,
                abs_error: error,
                subintervals: segments.len(),
                converged: true,
            };
        }

        let worst = segments
            .iter()
            .enumerate()
            .max_by(|(_, x), (_, y)| x.error.total_cmp(&y.error))
            .map(|(i, _)| i)
            .unwrap_or(0);
        let seg = segments[worst];
        let mid = 0.5 * (seg.a + seg.b);

        // Stop when the limit is reached or the worst interval cannot be split further.
        if segments.len() >= limit || mid <= seg.a || mid >= seg.b {
            return Integral {
                value,
                abs_error: error,
                subintervals: segments.len(),
                converged: false,
            };
        }

        segments.swap_remove(worst);
        segments.push(Segment::evaluate(&f, seg.a, mid));
        segments.push(Segment::evaluate(&f, mid, seg.b));
    }
}

/// 21-point Kronrod estimate with 10-point Gauss embedded error estimate
fn kronrod21<F: Fn(f64) -> f64>(f: &F, a: f64, b: f64) -> (f64, f64) {
    let center = 0.5 * (a + b);
    let half = 0.5 * (b - a);
    let abs_half = half.abs();

    let fc = f(center);
    let mut res_gauss = 0.0;
    let mut res_kronrod = fc * WGK[10];
    let mut res_abs = res_kronrod.abs();

    let mut fv1 = [0.0; 10];
    let mut fv2 = [0.0; 10];

    for j in 0..10 {
        let dx = half * XGK[j];
        let f1 = f(center - dx);
        let f2 = f(center + dx);
        fv1[j] = f1;
        fv2[j] = f2;
        if j % 2 == 1 {
            res_gauss += WG[j / 2] * (f1 + f2);
        }
        res_kronrod += WGK[j] * (f1 + f2);
        res_abs += WGK[j] * (f1.abs() + f2.abs());
    }

    let mean = res_kronrod * 0.5;
    let mut res_asc = WGK[10] * (fc - mean).abs();
    for j in 0..10 {
        res_asc += WGK[j] * ((fv1[j] - mean).abs() + (fv2[j] - mean).abs());
    }

    let result = res_kronrod * half;
    res_abs *= abs_half;
    res_asc *= abs_half;

    let mut error = ((res_kronrod - res_gauss) * half).abs();
    if res_asc != 0.0 && error != 0.0 {
        error = res_asc * (200.0 * error / res_asc).powf(1.5).min(1.0);
    }
    if res_abs > f64::MIN_POSITIVE / (50.0 * f64::EPSILON) {
        error = error.max(50.0 * f64::EPSILON * res_abs);
    }

    (result, error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::polynomial(|x: f64| x * x, 0.0, 3.0, 9.0)]
    #[case::sine(|x: f64| x.sin(), 0.0, std::f64::consts::PI, 2.0)]
    #[case::exp(|x: f64| (-x).exp(), 0.0, 20.0, 1.0 - (-20.0f64).exp())]
    #[case::kink(|x: f64| (x - 1.0).abs(), 0.0, 3.0, 2.5)]
    fn test_known_integrals(
        #[case] f: fn(f64) -> f64,
        #[case] a: f64,
        #[case] b: f64,
        #[case] expected: f64,
    ) {
        let r = integrate(f, a, b, &QuadratureSettings::default());
        assert!(r.converged);
        assert!((r.value - expected).abs() < 1e-6, "{} != {}", r.value, expected);
        assert!(r.abs_error <= 1e-5 || r.abs_error <= 1e-5 * expected.abs());
    }

    #[test]
    fn test_reversed_and_empty_interval() {
        let s = QuadratureSettings::default();
        let r = integrate(|x| x, 2.0, 0.0, &s);
        assert!((r.value + 2.0).abs() < 1e-12);
        assert_eq!(integrate(|x| x, 1.0, 1.0, &s).value, 0.0);
    }

    #[test]
    fn test_limit_reports_non_convergence() {
        let s = QuadratureSettings {
            epsabs: 0.0,
            epsrel: 0.0,
            limit: 3,
        };
        let r = integrate(|x: f64| x.sqrt().sin() / x.sqrt().max(1e-300), 0.0, 50.0, &s);
        assert!(!r.converged);
        assert_eq!(r.subintervals, 3);
    }
}
