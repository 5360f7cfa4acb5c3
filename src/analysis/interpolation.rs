use crate::error::{AssessmentError, Result};

/// Linear interpolation between two measurement heights.
///
/// For every position, `lower + (target - h_lower) / (h_upper - h_lower) * (upper - lower)`.
/// Targets outside `[h_lower, h_upper]` extrapolate. A null on either side
/// gives a null result.
pub fn interpolate_height(
    lower: &[Option<f64>],
    upper: &[Option<f64>],
    h_lower: f64,
    h_upper: f64,
    target: f64,
) -> Result<Vec<Option<f64>>> {
    if lower.len() != upper.len() {
        return Err(AssessmentError::Domain(format!(
            "height series differ in length: {} vs {}",
            lower.len(),
            upper.len()
        )));
    }
    if h_upper == h_lower {
        return Err(AssessmentError::Domain(format!(
            "interpolation heights must differ, both are {h_lower} m"
        )));
    }

    let factor = (target - h_lower) / (h_upper - h_lower);
    Ok(lower
        .iter()
        .zip(upper)
        .map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) => Some(a + factor * (b - a)),
            _ => None,
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interpolates_and_extrapolates() {
        let lower = [Some(8.0), Some(10.0), None];
        let upper = [Some(10.0), Some(10.0), Some(3.0)];
        let mid = interpolate_height(&lower, &upper, 100.0, 200.0, 150.0).unwrap();
        assert_eq!(mid, vec![Some(9.0), Some(10.0), None]);

        let above = interpolate_height(&lower, &upper, 100.0, 200.0, 250.0).unwrap();
        assert_eq!(above[0], Some(11.0));
    }

    #[test]
    fn test_equal_heights_rejected() {
        assert!(interpolate_height(&[Some(1.0)], &[Some(2.0)], 100.0, 100.0, 150.0).is_err());
        assert!(interpolate_height(&[Some(1.0)], &[], 100.0, 200.0, 150.0).is_err());
    }
}
