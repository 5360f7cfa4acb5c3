//! Buoy archives stored as NetCDF-4 with nested groups.
//!
//! A [`BuoySelection`] group such as `"BUOY6/ZX_LIDAR_WLS7_130"` is resolved
//! one group level at a time from the root. The time coordinate is taken from
//! the deepest group on that path that defines it, so a time axis shared by
//! sibling instrument groups can live in their parent. Time values are decoded
//! from the CF `units` attribute (`"<unit> since <epoch>"`).

use chrono::{Duration, NaiveDateTime};
use std::path::PathBuf;
use tracing::{debug, info};

use super::buoy::{BuoySelection, BuoySource};
use super::csv_frame::parse_timestamp;
use crate::domain::TimeFrame;
use crate::error::{AssessmentError, Result};

pub const DEFAULT_TIME_VARIABLE: &str = "time";

/// Values at or beyond this magnitude are fill values
const FILL_THRESHOLD: f64 = 1.0e30;

#[derive(Debug, Clone)]
pub struct NetcdfBuoySource {
    path: PathBuf,
    time_variable: String,
}

impl NetcdfBuoySource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            time_variable: DEFAULT_TIME_VARIABLE.to_string(),
        }
    }

    pub fn with_time_variable(mut self, name: impl Into<String>) -> Self {
        self.time_variable = name.into();
        self
    }

    fn descend(
        &self,
        group: &netcdf::Group<'_>,
        rest: &[&str],
        selection: &BuoySelection,
        found: &mut GroupData,
    ) -> Result<()> {
        if let Some(var) = group.variable(&self.time_variable) {
            found.time = Some(read_times(&var, &self.time_variable)?);
        }

        match rest.split_first() {
            Some((head, tail)) => {
                let child = group.group(head).ok_or_else(|| {
                    AssessmentError::Domain(format!(
                        "group '{head}' not found in {} (selection '{}')",
                        self.path.display(),
                        selection.group
                    ))
                })?;
                self.descend(&child, tail, selection, found)
            }
            None => {
                for name in &selection.variables {
                    let var = group.variable(name).ok_or_else(|| AssessmentError::MissingColumn {
                        column: format!("{}/{name}", selection.group),
                    })?;
                    found.columns.push(read_values(&var, name)?);
                }
                Ok(())
            }
        }
    }
}

#[derive(Default)]
struct GroupData {
    time: Option<Vec<NaiveDateTime>>,
    columns: Vec<Vec<Option<f64>>>,
}

impl BuoySource for NetcdfBuoySource {
    fn load(&self, selection: &BuoySelection) -> Result<TimeFrame> {
        let file = netcdf::open(&self.path)?;
        let root = file.root().ok_or_else(|| {
            AssessmentError::Domain(format!("{} has no group structure", self.path.display()))
        })?;

        let path: Vec<&str> = selection.group.split('/').filter(|g| !g.is_empty()).collect();
        let mut found = GroupData::default();
        self.descend(&root, &path, selection, &mut found)?;

        let times = found.time.ok_or_else(|| AssessmentError::MissingColumn {
            column: format!("{}/{}", selection.group, self.time_variable),
        })?;
        for (name, column) in selection.variables.iter().zip(&found.columns) {
            if column.len() != times.len() {
                return Err(AssessmentError::Domain(format!(
                    "variable '{name}' has {} values but the time axis has {}",
                    column.len(),
                    times.len()
                )));
            }
        }

        let rows = (0..times.len())
            .map(|i| found.columns.iter().map(|c| c[i]).collect())
            .collect();
        let out = TimeFrame::from_parts(times, selection.variables.clone(), rows)?.sorted_by_time();
        info!(
            path = %self.path.display(),
            group = %selection.group,
            rows = out.len(),
            "loaded buoy data"
        );
        Ok(out)
    }
}

fn attr_f64(var: &netcdf::Variable<'_>, name: &str) -> Option<f64> {
    var.attribute_value(name)
        .and_then(|r| r.ok())
        .and_then(|v| match v {
            netcdf::AttributeValue::Double(d) => Some(d),
            netcdf::AttributeValue::Float(f) => Some(f64::from(f)),
            netcdf::AttributeValue::Int(i) => Some(f64::from(i)),
            netcdf::AttributeValue::Short(s) => Some(f64::from(s)),
            _ => None,
        })
}

fn attr_str(var: &netcdf::Variable<'_>, name: &str) -> Option<String> {
    var.attribute_value(name)
        .and_then(|r| r.ok())
        .and_then(|v| match v {
            netcdf::AttributeValue::Str(s) => Some(s),
            _ => None,
        })
}

/// One-dimensional series with packing and fill values applied
fn read_values(var: &netcdf::Variable<'_>, name: &str) -> Result<Vec<Option<f64>>> {
    let dims = var.dimensions().len();
    if dims != 1 {
        return Err(AssessmentError::Domain(format!(
            "variable '{name}' has {dims} dimensions, expected a time series"
        )));
    }

    let raw: Vec<f64> = var.get_values(..)?;
    let scale = attr_f64(var, "scale_factor").unwrap_or(1.0);
    let offset = attr_f64(var, "add_offset").unwrap_or(0.0);
    let fill = attr_f64(var, "_FillValue");

    let values = raw
        .into_iter()
        .map(|v| {
            let missing = !v.is_finite() || v.abs() >= FILL_THRESHOLD || fill == Some(v);
            (!missing).then(|| v * scale + offset)
        })
        .collect();
    debug!(variable = name, scale, offset, "read variable");
    Ok(values)
}

fn read_times(var: &netcdf::Variable<'_>, name: &str) -> Result<Vec<NaiveDateTime>> {
    let units = attr_str(var, "units").ok_or_else(|| {
        AssessmentError::Domain(format!("time variable '{name}' has no units attribute"))
    })?;
    let (unit_seconds, epoch) = parse_time_units(&units)?;

    let raw: Vec<f64> = var.get_values(..)?;
    raw.into_iter()
        .map(|v| {
            if !v.is_finite() {
                return Err(AssessmentError::Domain(format!(
                    "time variable '{name}' holds a non-finite value"
                )));
            }
            let millis = (v * unit_seconds * 1e3).round() as i64;
            Ok(epoch + Duration::milliseconds(millis))
        })
        .collect()
}

/// Split CF time units such as `"seconds since 1970-01-01 00:00:00"` into the
/// unit length in seconds and the epoch.
pub fn parse_time_units(units: &str) -> Result<(f64, NaiveDateTime)> {
    let invalid = || AssessmentError::Domain(format!("unsupported time units '{units}'"));
    let (unit, epoch) = units.split_once(" since ").ok_or_else(invalid)?;

    let seconds = match unit.trim().to_ascii_lowercase().as_str() {
        "seconds" | "second" | "secs" | "sec" | "s" => 1.0,
        "minutes" | "minute" | "mins" | "min" => 60.0,
        "hours" | "hour" | "hrs" | "hr" | "h" => 3_600.0,
        "days" | "day" | "d" => 86_400.0,
        _ => return Err(invalid()),
    };
    let epoch = parse_timestamp(epoch).ok_or_else(invalid)?;
    Ok((seconds, epoch))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::path::Path;
    use tempfile::tempdir;

    fn t0() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2023, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap()
    }

    /// BUOY6 holds the shared time axis, BUOY6/ZX_LIDAR the wind variables
    fn write_archive(path: &Path) {
        let mut file = netcdf::create(path).unwrap();
        let mut buoy = file.add_group("BUOY6").unwrap();
        buoy.add_dimension("time", 3).unwrap();
        {
            let mut time = buoy.add_variable::<f64>("time", &["time"]).unwrap();
            time.put_attribute("units", "minutes since 2023-01-01 00:00:00").unwrap();
            time.put_values(&[20.0, 0.0, 10.0], ..).unwrap();
        }

        let mut lidar = buoy.add_group("ZX_LIDAR").unwrap();
        lidar.add_dimension("time", 3).unwrap();
        {
            let mut ws = lidar.add_variable::<f64>("WS150", &["time"]).unwrap();
            ws.put_attribute("_FillValue", -999.0f64).unwrap();
            ws.put_values(&[9.0, 7.0, -999.0], ..).unwrap();
        }
        {
            let mut wd = lidar.add_variable::<f64>("WD150", &["time"]).unwrap();
            wd.put_attribute("scale_factor", 0.5f64).unwrap();
            wd.put_values(&[400.0, 380.0, 390.0], ..).unwrap();
        }
    }

    #[test]
    fn test_nested_group_selection() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("buoy6.nc");
        write_archive(&path);

        let frame = NetcdfBuoySource::new(&path)
            .load(&BuoySelection::new("BUOY6/ZX_LIDAR", &["WS150", "WD150"]))
            .unwrap();

        assert_eq!(
            frame.index(),
            &[t0(), t0() + Duration::minutes(10), t0() + Duration::minutes(20)]
        );
        assert_eq!(frame.column("WS150").unwrap(), vec![Some(7.0), None, Some(9.0)]);
        assert_eq!(frame.values("WD150").unwrap(), vec![190.0, 195.0, 200.0]);
    }

    #[test]
    fn test_unknown_group_and_variable() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("buoy6.nc");
        write_archive(&path);
        let source = NetcdfBuoySource::new(&path);

        let err = source
            .load(&BuoySelection::new("BUOY6/METEO", &["T"]))
            .unwrap_err();
        assert!(matches!(err, AssessmentError::Domain(_)));

        let err = source
            .load(&BuoySelection::new("BUOY6/ZX_LIDAR", &["WS100"]))
            .unwrap_err();
        assert!(matches!(err, AssessmentError::MissingColumn { .. }));
    }

    #[test]
    fn test_parse_time_units() {
        let (s, epoch) = parse_time_units("seconds since 1970-01-01 00:00:00").unwrap();
        assert_eq!(s, 1.0);
        assert_eq!(epoch, NaiveDate::from_ymd_opt(1970, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap());

        let (s, epoch) = parse_time_units("days since 2023-01-01").unwrap();
        assert_eq!(s, 86_400.0);
        assert_eq!(epoch, t0());

        assert!(parse_time_units("fortnights since 2023-01-01").is_err());
        assert!(parse_time_units("seconds").is_err());
    }
}
