//! CSV exports of summary tables and corrected series.
//!
//! Files are written to a caller-chosen path, overwriting any existing file.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

use crate::analysis::GroupedMeans;
use crate::domain::{Energy, TimeFrame};
use crate::energy::{AepResult, YieldComparison};
use crate::error::{AssessmentError, Result};
use crate::farm::{FarmSummary, Layout, TurbineResult};

const TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

fn writer(path: &Path) -> Result<csv::Writer<std::fs::File>> {
    Ok(csv::Writer::from_path(path)?)
}

fn finish(mut wtr: csv::Writer<std::fs::File>, path: &Path, rows: usize) -> Result<()> {
    wtr.flush().map_err(|e| AssessmentError::io(path, e))?;
    info!(path = %path.display(), rows, "wrote CSV");
    Ok(())
}

fn cell(v: Option<f64>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

/// Write a time series with the timestamp as first column; nulls are empty cells
pub fn write_frame_csv(path: impl AsRef<Path>, frame: &TimeFrame, time_column: &str) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = writer(path)?;
    wtr.write_record(std::iter::once(time_column).chain(frame.columns().iter().map(String::as_str)))?;
    for (ts, row) in frame.index().iter().zip(frame.rows()) {
        wtr.write_record(
            std::iter::once(ts.format(TIME_FORMAT).to_string()).chain(row.iter().map(|v| cell(*v))),
        )?;
    }
    finish(wtr, path, frame.len())
}

/// One-row AEP summary: single-turbine energy in GWh, sites and total in TWh
pub fn write_aep_summary(path: impl AsRef<Path>, result: &AepResult) -> Result<()> {
    let path = path.as_ref();
    let mut header = vec![
        "Single turbine AEP [GWh]".to_string(),
        "Single turbine AEP error [GWh]".to_string(),
        "Weibull shape".to_string(),
        "Weibull scale [m/s]".to_string(),
    ];
    let mut values = vec![
        result.single_turbine_gwh(),
        result.single_turbine_error_gwh(),
        result.weibull.shape,
        result.weibull.scale,
    ];
    for site in &result.sites {
        header.push(format!("AEP {} [TWh]", site.site.name));
        values.push(site.energy.as_terawatt_hours());
    }
    header.push("Total AEP [TWh]".into());
    values.push(result.total_twh());
    header.push("Share of reference consumption [%]".into());
    values.push(result.share_of_reference_percent);

    let mut wtr = writer(path)?;
    wtr.write_record(&header)?;
    wtr.write_record(values.iter().map(f64::to_string))?;
    finish(wtr, path, 1)
}

#[derive(Debug, Serialize, Deserialize)]
struct NoWakeYieldRow {
    #[serde(rename = "Energy Yield no wakes [TWh]")]
    yield_twh: f64,
}

/// Wake-free farm yield, read back later when the wake scenarios are compared
pub fn write_no_wake_yield(path: impl AsRef<Path>, energy: Energy) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = writer(path)?;
    wtr.serialize(NoWakeYieldRow {
        yield_twh: energy.as_terawatt_hours(),
    })?;
    finish(wtr, path, 1)
}

pub fn read_no_wake_yield(path: impl AsRef<Path>) -> Result<Energy> {
    let path = path.as_ref();
    let mut rdr = csv::Reader::from_path(path)?;
    let row = rdr
        .deserialize::<NoWakeYieldRow>()
        .next()
        .ok_or_else(|| AssessmentError::Parse {
            row: 2,
            column: "Energy Yield no wakes [TWh]".into(),
            message: format!("{} has no data row", path.display()),
        })??;
    Ok(Energy::terawatt_hours(row.yield_twh))
}

pub fn write_layout_csv(path: impl AsRef<Path>, layout: &Layout) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = writer(path)?;
    for p in &layout.positions {
        wtr.serialize(p)?;
    }
    if layout.is_empty() {
        wtr.write_record(["x", "y"])?;
    }
    finish(wtr, path, layout.len())
}

pub fn write_farm_summary(path: impl AsRef<Path>, summaries: &[FarmSummary]) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = writer(path)?;
    for s in summaries {
        wtr.serialize(s)?;
    }
    finish(wtr, path, summaries.len())
}

pub fn write_turbine_results(path: impl AsRef<Path>, turbines: &[TurbineResult]) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = writer(path)?;
    for t in turbines {
        wtr.serialize(t)?;
    }
    finish(wtr, path, turbines.len())
}

/// Grouped means with the group key as first column
pub fn write_grouped_means(path: impl AsRef<Path>, means: &GroupedMeans) -> Result<()> {
    let path = path.as_ref();
    let key = means.period.to_string();
    let mut wtr = writer(path)?;
    wtr.write_record(std::iter::once(key.as_str()).chain(means.columns.iter().map(String::as_str)))?;
    for (k, row) in &means.groups {
        wtr.write_record(std::iter::once(k.to_string()).chain(row.iter().map(|v| cell(*v))))?;
    }
    finish(wtr, path, means.groups.len())
}

pub fn write_yield_comparison(path: impl AsRef<Path>, comparison: &YieldComparison) -> Result<()> {
    let path = path.as_ref();
    let mut wtr = writer(path)?;
    wtr.write_record([
        "Energy yield no wakes [TWh]",
        "Energy yield internal wakes [TWh]",
        "Energy yield internal and external wakes [TWh]",
        "Internal wake loss [%]",
        "Total wake loss [%]",
    ])?;
    wtr.write_record([
        comparison.no_wakes.as_terawatt_hours().to_string(),
        comparison.internal_wakes.as_terawatt_hours().to_string(),
        comparison.external_wakes.as_terawatt_hours().to_string(),
        comparison.internal_loss_percent.to_string(),
        comparison.total_loss_percent.to_string(),
    ])?;
    finish(wtr, path, 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::farm::TurbinePosition;
    use crate::ingest::{read_frame_csv, read_layout};
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_no_wake_yield_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("total_farmyield_nowakes.csv");
        write_no_wake_yield(&path, Energy::terawatt_hours(21.5)).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("Energy Yield no wakes [TWh]\n"));
        let energy = read_no_wake_yield(&path).unwrap();
        assert!((energy.as_terawatt_hours() - 21.5).abs() < 1e-12);
    }

    #[test]
    fn test_frame_written_with_empty_nulls() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("series.csv");
        let t0 = NaiveDate::from_ymd_opt(2023, 3, 1).unwrap().and_hms_opt(12, 0, 0).unwrap();
        let frame = TimeFrame::from_parts(
            vec![t0],
            vec!["long-term_WS150".into(), "long-term_WD150".into()],
            vec![vec![Some(9.25), None]],
        )
        .unwrap();
        write_frame_csv(&path, &frame, "time").unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "time,long-term_WS150,long-term_WD150\n2023-03-01 12:00:00,9.25,\n");
        assert_eq!(read_frame_csv(&path, "time").unwrap(), frame);
    }

    #[test]
    fn test_layout_csv() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("NoWake_Layout_N-9.3.csv");
        let layout = Layout::new(
            "NoWake_Layout_N-9.3",
            vec![TurbinePosition::new(1.5, 2.0), TurbinePosition::new(800.0, -3.0)],
        );
        write_layout_csv(&path, &layout).unwrap();
        assert!(fs::read_to_string(&path).unwrap().starts_with("x,y\n"));
        assert_eq!(read_layout(&path).unwrap(), layout);
    }

    #[test]
    fn test_farm_summary_headers() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("summary.csv");
        let summary = FarmSummary {
            name: "N-9".into(),
            farm_power_mw: 1500.0,
            ambient_power_mw: 1800.0,
            efficiency_percent: 83.3,
            annual_yield_twh: 13.1,
        };
        write_farm_summary(&path, &[summary]).unwrap();
        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with(
            "name,Farm power [MW],Farm ambient power [MW],Farm efficiency [%],Annual farm yield [TWh]\n"
        ));
    }
}
