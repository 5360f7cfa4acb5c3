use serde::Deserialize;
use std::path::Path;
use tracing::debug;

use crate::domain::{PowerCurve, PowerCurvePoint, PowerUnit};
use crate::error::{AssessmentError, Result};
use crate::farm::{Layout, TurbinePosition};

#[derive(Debug, Deserialize)]
struct PowerCurveRow {
    ws: f64,
    #[serde(rename = "P")]
    power: f64,
}

fn open(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    let file = std::fs::File::open(path).map_err(|e| AssessmentError::io(path, e))?;
    Ok(csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(file))
}

/// Read a power curve with columns `ws` (m/s) and `P` in `unit`
pub fn read_power_curve(path: impl AsRef<Path>, unit: PowerUnit) -> Result<PowerCurve> {
    let path = path.as_ref();
    let points = open(path)?
        .deserialize::<PowerCurveRow>()
        .map(|row| {
            let row = row?;
            Ok(PowerCurvePoint {
                wind_speed: row.ws,
                power: unit.to_power(row.power),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(path = %path.display(), points = points.len(), %unit, "read power curve");
    PowerCurve::new(points)
}

/// Read an `x`,`y` turbine layout; the layout is named after the file stem
pub fn read_layout(path: impl AsRef<Path>) -> Result<Layout> {
    let path = path.as_ref();
    let positions = open(path)?
        .deserialize::<TurbinePosition>()
        .collect::<std::result::Result<Vec<_>, csv::Error>>()?;
    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    debug!(path = %path.display(), turbines = positions.len(), "read layout");
    Ok(Layout::new(name, positions))
}

/// Read several layouts and join them into one cluster, in the given order
pub fn read_layouts<P: AsRef<Path>>(name: &str, paths: &[P]) -> Result<Layout> {
    let layouts = paths.iter().map(read_layout).collect::<Result<Vec<_>>>()?;
    Ok(Layout::concat(name, &layouts))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_power_curve_in_kilowatts() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("power_curve.csv");
        fs::write(&path, "ws,P\n3,0\n4,70\n12,15000\n25,15000\n26,0\n").unwrap();

        let curve = read_power_curve(&path, PowerUnit::Kilowatt).unwrap();
        assert_eq!(curve.points().len(), 5);
        assert_eq!(curve.rated_power().as_megawatts(), 15.0);
        assert_eq!(curve.cut_in().unwrap(), 4.0);
        assert_eq!(curve.cut_out().unwrap(), 25.0);

        let curve = read_power_curve(&path, PowerUnit::Watt).unwrap();
        assert_eq!(curve.rated_power().as_watts(), 15000.0);
    }

    #[test]
    fn test_power_curve_missing_column() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        fs::write(&path, "speed,P\n3,0\n").unwrap();
        assert!(matches!(
            read_power_curve(&path, PowerUnit::Kilowatt),
            Err(AssessmentError::Csv(_))
        ));
    }

    #[test]
    fn test_read_layouts_concatenates() {
        let dir = tempdir().unwrap();
        let a = dir.path().join("NoWake_Layout_N-9.1.csv");
        let b = dir.path().join("NoWake_Layout_N-9.2.csv");
        fs::write(&a, "x,y\n0,0\n1000,0\n").unwrap();
        fs::write(&b, ",x,y\n0,5000,5000\n").unwrap();

        assert_eq!(read_layout(&a).unwrap().name, "NoWake_Layout_N-9.1");
        let cluster = read_layouts("N-9 cluster", &[&a, &b]).unwrap();
        assert_eq!(cluster.len(), 3);
        assert_eq!(cluster.positions[2], TurbinePosition::new(5000.0, 5000.0));
        assert!(read_layout(dir.path().join("missing.csv")).is_err());
    }
}
