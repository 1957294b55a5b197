//! Error types for Tessera

use thiserror::Error;

/// Main error type for Tessera operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("No extent supplied and no features to derive one from")]
    MissingExtent,

    #[error("Invalid extent: ({min_x}, {min_y}) - ({max_x}, {max_y})")]
    InvalidExtent {
        min_x: f64,
        min_y: f64,
        max_x: f64,
        max_y: f64,
    },

    #[error("Invalid cell size: {name} = {value} ({reason})")]
    InvalidSize {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Coordinate frame mismatch: {0} vs {1}")]
    CoordinateFrameMismatch(String, String),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Weight expression error: {0}")]
    Expression(String),

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Shorthand for a non-positive or otherwise unusable sizing value.
    pub fn invalid_size(name: &'static str, value: impl ToString, reason: impl Into<String>) -> Self {
        Error::InvalidSize {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    /// Whether this error is a configuration error raised before any cell exists.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::MissingExtent
                | Error::InvalidExtent { .. }
                | Error::InvalidSize { .. }
                | Error::CoordinateFrameMismatch(..)
                | Error::InvalidParameter { .. }
                | Error::Expression(_)
        )
    }
}

/// Result type alias for Tessera operations
pub type Result<T> = std::result::Result<T, Error>;
