use std::path::PathBuf;

/// Result type alias for salarylens operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the salary pipeline
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The input dataset could not be read, parsed or normalized.
    ///
    /// Fatal for the whole session: nothing is loaded partially.
    #[error("Dataset unavailable ({}): {reason}", path.display())]
    DataUnavailable {
        /// Source that failed to load
        path: PathBuf,
        /// What went wrong
        reason: String,
    },

    /// A salary range whose lower bound exceeds its upper bound
    #[error("Invalid salary range: min {min} is greater than max {max}")]
    InvalidRange {
        /// Requested lower bound
        min: f64,
        /// Requested upper bound
        max: f64,
    },

    /// `DataFrame` errors raised while filtering or aggregating
    #[error("DataFrame error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Create a data-unavailable error for `path`
    pub fn data_unavailable(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::DataUnavailable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Whether the error should end the session rather than just reject a change
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::DataUnavailable { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::data_unavailable("salaries.csv", "file not found");
        assert_eq!(
            err.to_string(),
            "Dataset unavailable (salaries.csv): file not found"
        );

        let err = Error::InvalidRange {
            min: 10.0,
            max: 5.0,
        };
        assert_eq!(
            err.to_string(),
            "Invalid salary range: min 10 is greater than max 5"
        );

        let err = Error::config("top_n must be positive");
        assert_eq!(err.to_string(), "Configuration error: top_n must be positive");
    }

    #[test]
    fn test_fatality() {
        assert!(Error::data_unavailable("x.csv", "bad").is_fatal());
        assert!(!Error::InvalidRange { min: 2.0, max: 1.0 }.is_fatal());
        assert!(!Error::config("nope").is_fatal());
    }
}
