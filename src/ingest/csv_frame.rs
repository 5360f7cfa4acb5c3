use chrono::NaiveDateTime;
use std::io::Read;
use std::path::Path;
use tracing::debug;

use crate::domain::TimeFrame;
use crate::error::{AssessmentError, Result};

const TIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parse a timestamp in one of the accepted layouts. A trailing `Z` is
/// ignored; all timestamps are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<NaiveDateTime> {
    let s = raw.trim();
    let s = s.strip_suffix('Z').unwrap_or(s);
    TIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .or_else(|| {
            chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// Empty cells and NaN spellings are null
fn parse_cell(raw: &str) -> std::result::Result<Option<f64>, std::num::ParseFloatError> {
    let s = raw.trim();
    if s.is_empty() || s.eq_ignore_ascii_case("nan") || s.eq_ignore_ascii_case("na") {
        return Ok(None);
    }
    let v: f64 = s.parse()?;
    Ok(v.is_finite().then_some(v))
}

/// Read a CSV with a header row into a [`TimeFrame`]. Every column other than
/// `time_column` must be numeric.
pub fn read_frame<R: Read>(reader: R, time_column: &str) -> Result<TimeFrame> {
    let mut csv = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let headers = csv.headers()?.clone();

    let time_pos = headers
        .iter()
        .position(|h| h == time_column)
        .ok_or_else(|| AssessmentError::MissingColumn {
            column: time_column.to_string(),
        })?;
    let value_columns: Vec<(usize, &str)> = headers
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != time_pos)
        .collect();

    let mut frame = TimeFrame::new(value_columns.iter().map(|(_, name)| *name));
    for (row_no, record) in csv.records().enumerate() {
        let record = record?;
        // 1-based, counting the header
        let line = row_no + 2;
        let raw_time = record.get(time_pos).unwrap_or_default();
        let timestamp = parse_timestamp(raw_time).ok_or_else(|| AssessmentError::Parse {
            row: line,
            column: time_column.to_string(),
            message: format!("unrecognised timestamp '{raw_time}'"),
        })?;

        let row = value_columns
            .iter()
            .map(|&(pos, name)| {
                parse_cell(record.get(pos).unwrap_or_default()).map_err(|e| AssessmentError::Parse {
                    row: line,
                    column: name.to_string(),
                    message: e.to_string(),
                })
            })
            .collect::<Result<Vec<_>>>()?;
        frame.push_row(timestamp, row)?;
    }
    Ok(frame)
}

pub fn read_frame_csv(path: impl AsRef<Path>, time_column: &str) -> Result<TimeFrame> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| AssessmentError::io(path, e))?;
    let frame = read_frame(file, time_column)?;
    debug!(path = %path.display(), rows = frame.len(), columns = frame.columns().len(), "read time series");
    Ok(frame)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rstest::rstest;

    #[rstest]
    #[case("2023-01-01 10:00:00")]
    #[case("2023-01-01T10:00:00")]
    #[case("2023-01-01 10:00")]
    #[case("2023-01-01T10:00:00Z")]
    #[case("2023-01-01 10:00:00.000")]
    fn test_timestamp_layouts(#[case] raw: &str) {
        let expected = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap().and_hms_opt(10, 0, 0).unwrap();
        assert_eq!(parse_timestamp(raw), Some(expected));
    }

    #[test]
    fn test_fractional_seconds_are_kept() {
        let ts = parse_timestamp("2023-01-01 10:00:00.250").unwrap();
        assert_eq!(ts.and_utc().timestamp_subsec_millis(), 250);
    }

    #[test]
    fn test_read_frame() {
        let data = "Time [UTC],u100,v100\n\
                    2020-01-01 00:00:00,1.5,-2.0\n\
                    2020-01-01 01:00:00,,NaN\n";
        let frame = read_frame(data.as_bytes(), "Time [UTC]").unwrap();
        assert_eq!(frame.columns(), &["u100".to_string(), "v100".to_string()]);
        assert_eq!(frame.len(), 2);
        assert_eq!(frame.column("v100").unwrap(), vec![Some(-2.0), None]);
    }

    #[test]
    fn test_missing_time_column() {
        let err = read_frame("a,b\n1,2\n".as_bytes(), "time").unwrap_err();
        assert!(matches!(err, AssessmentError::MissingColumn { .. }));
    }

    #[test]
    fn test_bad_cell_names_row_and_column() {
        let data = "time,ws\n2020-01-01 00:00,3.0\n2020-01-01 01:00,calm\n";
        match read_frame(data.as_bytes(), "time").unwrap_err() {
            AssessmentError::Parse { row, column, .. } => {
                assert_eq!(row, 3);
                assert_eq!(column, "ws");
            }
            other => panic!("unexpected error {other}"),
        }
    }
}
