//! Wind speed and direction from orthogonal components.
//!
//! `u` is the eastward and `v` the northward component. Direction is the
//! meteorological "from" bearing (0° = North, 90° = East):
//! `(atan2(u, v) · 180/π + 180) mod 360`.

use tracing::debug;

use crate::domain::TimeFrame;
use crate::error::Result;

pub fn wind_speed(u: f64, v: f64) -> f64 {
    u.hypot(v)
}

pub fn wind_direction(u: f64, v: f64) -> f64 {
    wrap_degrees(u.atan2(v).to_degrees() + 180.0)
}

/// Wrap an angle into [0, 360)
pub fn wrap_degrees(deg: f64) -> f64 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid rounds tiny negative inputs up to exactly 360.0
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Return a copy of `frame` with `WS{label}` and `WD{label}` computed from the
/// `u` and `v` columns. A null component gives null speed and direction.
pub fn derive_wind(frame: &TimeFrame, u_column: &str, v_column: &str, label: &str) -> Result<TimeFrame> {
    let u = frame.column(u_column)?;
    let v = frame.column(v_column)?;

    let (speed, direction): (Vec<_>, Vec<_>) = u
        .into_iter()
        .zip(v)
        .map(|pair| match pair {
            (Some(u), Some(v)) => (Some(wind_speed(u, v)), Some(wind_direction(u, v))),
            _ => (None, None),
        })
        .unzip();

    debug!(u_column, v_column, label, rows = frame.len(), "derived wind vector");
    frame
        .with_column(&format!("WS{label}"), speed)?
        .with_column(&format!("WD{label}"), direction)
}
