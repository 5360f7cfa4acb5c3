use std::path::PathBuf;

use thiserror::Error;

/// Errors raised by the assessment pipeline.
///
/// The first three variants are the analytical failure kinds; they are
/// raised at the point of failure and never retried. The remaining
/// variants cover file and configuration plumbing.
#[derive(Debug, Error)]
pub enum AssessmentError {
    /// Malformed input domain, e.g. a power curve without any positive-power row.
    #[error("Domain error: {0}")]
    Domain(String),

    /// Degenerate or non-convergent distribution fit.
    #[error("Fit error: {0}")]
    Fit(String),

    /// Too few valid observations for a regression.
    #[error("Insufficient data: need at least {required} valid observations, got {available}")]
    InsufficientData { required: usize, available: usize },

    #[error("Missing column '{column}'")]
    MissingColumn { column: String },

    #[error("Parse error at row {row}, column '{column}': {message}")]
    Parse {
        row: usize,
        column: String,
        message: String,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[cfg(feature = "netcdf")]
    #[error("NetCDF error: {0}")]
    NetCdf(#[from] netcdf::Error),
}

pub type Result<T> = std::result::Result<T, AssessmentError>;

impl AssessmentError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AssessmentError::Io {
            path: path.into(),
            source,
        }
    }

    /// Stable identifier of the error kind, used in log fields.
    pub fn kind(&self) -> &'static str {
        match self {
            AssessmentError::Domain(_) => "DomainError",
            AssessmentError::Fit(_) => "FitError",
            AssessmentError::InsufficientData { .. } => "InsufficientDataError",
            AssessmentError::MissingColumn { .. } => "MissingColumn",
            AssessmentError::Parse { .. } => "ParseError",
            AssessmentError::InvalidConfig(_) => "InvalidConfig",
            AssessmentError::Io { .. } => "IoError",
            AssessmentError::Csv(_) => "CsvError",
            #[cfg(feature = "netcdf")]
            AssessmentError::NetCdf(_) => "NetCdfError",
        }
    }
}

impl From<validator::ValidationErrors> for AssessmentError {
    fn from(errors: validator::ValidationErrors) -> Self {
        AssessmentError::InvalidConfig(errors.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(AssessmentError::Domain("x".into()).kind(), "DomainError");
        assert_eq!(AssessmentError::Fit("x".into()).kind(), "FitError");
        assert_eq!(
            AssessmentError::InsufficientData {
                required: 2,
                available: 1
            }
            .kind(),
            "InsufficientDataError"
        );
    }

    #[test]
    fn test_error_display() {
        let error = AssessmentError::InsufficientData {
            required: 2,
            available: 0,
        };
        assert_eq!(
            error.to_string(),
            "Insufficient data: need at least 2 valid observations, got 0"
        );

        let error = AssessmentError::MissingColumn {
            column: "u100".to_string(),
        };
        assert_eq!(error.to_string(), "Missing column 'u100'");
    }
}
