use chrono::{DurationRound, NaiveDateTime, SubsecRound};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Mul, Sub};

use crate::error::{AssessmentError, Result};

/// Hours in a (non-leap) year, used to annualise mean power.
pub const HOURS_PER_YEAR: f64 = 8760.0;

// ============================================================================
// Sampling frequency
// ============================================================================

/// Nominal sampling interval of a time-indexed source.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Frequency {
    /// Reanalysis data (one row per hour)
    #[default]
    Hourly,
    /// Buoy / lidar data (one row per 10 minutes)
    TenMinutes,
}

impl Frequency {
    pub fn step(&self) -> chrono::Duration {
        match self {
            Frequency::Hourly => chrono::Duration::hours(1),
            Frequency::TenMinutes => chrono::Duration::minutes(10),
        }
    }

    /// Number of rows covering one non-leap year
    pub fn rows_per_year(&self) -> usize {
        match self {
            Frequency::Hourly => 8_760,
            Frequency::TenMinutes => 52_560,
        }
    }

    /// Drop sub-second precision, then round to the nearest sampling step.
    ///
    /// A timestamp exactly halfway between two grid points goes to the one
    /// whose step count since the epoch is even.
    pub fn align(&self, timestamp: NaiveDateTime) -> Result<NaiveDateTime> {
        let step = self.step();
        let t = timestamp.trunc_subsecs(0);
        let floor = t
            .duration_trunc(step)
            .map_err(|e| AssessmentError::Domain(format!("cannot align {timestamp}: {e}")))?;

        let aligned = match ((t - floor) * 2).cmp(&step) {
            Ordering::Less => floor,
            Ordering::Greater => floor + step,
            Ordering::Equal => {
                let steps = floor.and_utc().timestamp().div_euclid(step.num_seconds());
                if steps.rem_euclid(2) == 0 {
                    floor
                } else {
                    floor + step
                }
            }
        };
        Ok(aligned)
    }
}

// ============================================================================
// Physical Quantity Types
// ============================================================================

/// Unit of the power column in a power-curve file.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
pub enum PowerUnit {
    #[serde(rename = "W")]
    #[strum(serialize = "W")]
    Watt,
    #[default]
    #[serde(rename = "kW")]
    #[strum(serialize = "kW")]
    Kilowatt,
}

impl PowerUnit {
    pub fn to_power(&self, value: f64) -> Power {
        match self {
            PowerUnit::Watt => Power::watts(value),
            PowerUnit::Kilowatt => Power::kilowatts(value),
        }
    }
}

/// Power in Watts (W)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, PartialOrd)]
pub struct Power(pub f64);

impl Power {
    pub fn watts(w: f64) -> Self {
        Self(w)
    }

    pub fn kilowatts(kw: f64) -> Self {
        Self(kw * 1e3)
    }

    pub fn megawatts(mw: f64) -> Self {
        Self(mw * 1e6)
    }

    pub fn as_watts(&self) -> f64 {
        self.0
    }

    pub fn as_kilowatts(&self) -> f64 {
        self.0 / 1e3
    }

    pub fn as_megawatts(&self) -> f64 {
        self.0 / 1e6
    }

    /// Energy delivered when this power is held for `hours`
    pub fn over_hours(&self, hours: f64) -> Energy {
        Energy::watt_hours(self.0 * hours)
    }
}

impl fmt::Display for Power {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.abs() >= 1e6 {
            write!(f, "{:.2} MW", self.as_megawatts())
        } else if self.0.abs() >= 1e3 {
            write!(f, "{:.2} kW", self.as_kilowatts())
        } else {
            write!(f, "{:.1} W", self.0)
        }
    }
}

impl Add for Power {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Power {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

/// Energy in Watt-hours (Wh).
///
/// This is the only unit energies are carried in. Conversions to the
/// reporting units (GWh for a single turbine, TWh for farms and national
/// consumption) happen through the `as_*` accessors and nowhere else.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, PartialOrd)]
pub struct Energy(pub f64);

impl Energy {
    pub fn watt_hours(wh: f64) -> Self {
        Self(wh)
    }

    pub fn kilowatt_hours(kwh: f64) -> Self {
        Self(kwh * 1e3)
    }

    pub fn gigawatt_hours(gwh: f64) -> Self {
        Self(gwh * 1e9)
    }

    pub fn terawatt_hours(twh: f64) -> Self {
        Self(twh * 1e12)
    }

    pub fn as_watt_hours(&self) -> f64 {
        self.0
    }

    pub fn as_kilowatt_hours(&self) -> f64 {
        self.0 / 1e3
    }

    pub fn as_megawatt_hours(&self) -> f64 {
        self.0 / 1e6
    }

    pub fn as_gigawatt_hours(&self) -> f64 {
        self.0 / 1e9
    }

    pub fn as_terawatt_hours(&self) -> f64 {
        self.0 / 1e12
    }

    /// Share of `reference` in percent
    pub fn percent_of(&self, reference: Energy) -> f64 {
        if reference.0 == 0.0 {
            return 0.0;
        }
        self.0 / reference.0 * 100.0
    }
}

impl fmt::Display for Energy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let abs = self.0.abs();
        if abs >= 1e12 {
            write!(f, "{:.4} TWh", self.as_terawatt_hours())
        } else if abs >= 1e9 {
            write!(f, "{:.4} GWh", self.as_gigawatt_hours())
        } else if abs >= 1e6 {
            write!(f, "{:.2} MWh", self.as_megawatt_hours())
        } else if abs >= 1e3 {
            write!(f, "{:.2} kWh", self.as_kilowatt_hours())
        } else {
            write!(f, "{:.1} Wh", self.0)
        }
    }
}

impl Add for Energy {
    type Output = Self;
    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Energy {
    type Output = Self;
    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Mul<f64> for Energy {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self::Output {
        Self(self.0 * rhs)
    }
}

impl Sum for Energy {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Energy::default(), Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(h: u32, m: u32, s: u32, milli: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 3, 1)
            .unwrap()
            .and_hms_milli_opt(h, m, s, milli)
            .unwrap()
    }

    #[test]
    fn test_frequency_step_and_year() {
        assert_eq!(Frequency::Hourly.step(), chrono::Duration::hours(1));
        assert_eq!(Frequency::TenMinutes.rows_per_year(), 52_560);
        assert_eq!(Frequency::Hourly.rows_per_year(), 8_760);
        assert_eq!("ten_minutes".parse::<Frequency>().unwrap(), Frequency::TenMinutes);
        assert_eq!(Frequency::Hourly.to_string(), "hourly");
    }

    #[test]
    fn test_frequency_align_rounds_to_nearest_step() {
        let f = Frequency::TenMinutes;
        assert_eq!(f.align(at(12, 9, 59, 900)).unwrap(), at(12, 10, 0, 0));
        assert_eq!(f.align(at(12, 14, 10, 0)).unwrap(), at(12, 10, 0, 0));
        assert_eq!(f.align(at(12, 16, 0, 0)).unwrap(), at(12, 20, 0, 0));
    }

    #[test]
    fn test_frequency_align_midpoint_goes_to_even_step() {
        let f = Frequency::TenMinutes;
        // 00:00 is an even step count since the epoch, 00:10 odd, 00:20 even
        assert_eq!(f.align(at(0, 5, 0, 0)).unwrap(), at(0, 0, 0, 0));
        assert_eq!(f.align(at(0, 15, 0, 0)).unwrap(), at(0, 20, 0, 0));
        assert_eq!(f.align(at(0, 5, 0, 400)).unwrap(), at(0, 0, 0, 0));
        assert_eq!(Frequency::Hourly.align(at(1, 30, 0, 0)).unwrap(), at(2, 0, 0, 0));
        assert_eq!(Frequency::Hourly.align(at(2, 30, 0, 0)).unwrap(), at(2, 0, 0, 0));
    }

    #[test]
    fn test_power_conversions() {
        let power = Power::kilowatts(10_000.0);
        assert_eq!(power.as_watts(), 1e7);
        assert_eq!(power.as_megawatts(), 10.0);
        assert_eq!(format!("{}", power), "10.00 MW");
        assert_eq!(format!("{}", Power::watts(500.0)), "500.0 W");
    }

    #[test]
    fn test_energy_reporting_units() {
        let e = Power::kilowatts(15_000.0).over_hours(HOURS_PER_YEAR);
        assert_eq!(e.as_watt_hours(), 15e6 * 8760.0);
        assert!((e.as_gigawatt_hours() - 131.4).abs() < 1e-9);
        assert!((e.as_terawatt_hours() - 0.1314).abs() < 1e-12);
        assert_eq!(Energy::terawatt_hours(1.0).as_gigawatt_hours(), 1000.0);
    }

    #[test]
    fn test_energy_arithmetic() {
        let total: Energy = vec![Energy::gigawatt_hours(1.0), Energy::gigawatt_hours(2.0)]
            .into_iter()
            .sum();
        assert_eq!(total.as_gigawatt_hours(), 3.0);
        assert_eq!((total * 2.0).as_gigawatt_hours(), 6.0);
        assert_eq!((total - Energy::gigawatt_hours(1.0)).as_gigawatt_hours(), 2.0);
        let share = Energy::terawatt_hours(50.7).percent_of(Energy::terawatt_hours(507.0));
        assert!((share - 10.0).abs() < 1e-9);
        assert_eq!(Energy::gigawatt_hours(1.0).percent_of(Energy::default()), 0.0);
    }

    #[test]
    fn test_power_unit_parsing() {
        assert_eq!("kW".parse::<PowerUnit>().unwrap(), PowerUnit::Kilowatt);
        assert_eq!(PowerUnit::Watt.to_power(5.0).as_watts(), 5.0);
        assert_eq!(PowerUnit::default().to_power(5.0).as_watts(), 5000.0);
    }
}
