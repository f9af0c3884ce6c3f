//! # Centralized Error Handling
//!
//! Unified error types for the entire crate using `thiserror`.

use std::path::PathBuf;
use thiserror::Error;

use crate::model::fit::FitError;

/// Main error type for pangrowth operations
#[derive(Error, Debug)]
pub enum PangrowthError {
    /// I/O errors (file missing, permission denied, read/write failures)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed presence/absence matrix (ragged rows, non 0/1 flags, empty table)
    #[error("Input shape error at line {line}: {message}")]
    InputShape { line: usize, message: String },

    /// Curve fit did not converge for a sample set
    #[error("Fit convergence error: {message}")]
    FitConvergence { message: String },

    /// Not enough data to run the analysis (no iterations, a single genome)
    #[error("Degenerate input: {message}")]
    DegenerateInput { message: String },

    /// Configuration errors (invalid CLI arguments)
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// File not found errors
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },
}

/// Type alias for Results using PangrowthError
pub type Result<T> = std::result::Result<T, PangrowthError>;

impl PangrowthError {
    /// Create an input shape error for a 1-based line number
    pub fn input_shape(line: usize, message: impl Into<String>) -> Self {
        Self::InputShape {
            line,
            message: message.into(),
        }
    }

    /// Create a fit convergence error
    pub fn fit(message: impl Into<String>) -> Self {
        Self::FitConvergence {
            message: message.into(),
        }
    }

    /// Create a degenerate input error
    pub fn degenerate(message: impl Into<String>) -> Self {
        Self::DegenerateInput {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

impl From<FitError> for PangrowthError {
    fn from(err: FitError) -> Self {
        Self::FitConvergence {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = PangrowthError::input_shape(3, "expected 4 columns, found 2");
        assert_eq!(
            err.to_string(),
            "Input shape error at line 3: expected 4 columns, found 2"
        );

        let err = PangrowthError::degenerate("need at least 2 genomes");
        assert!(err.to_string().starts_with("Degenerate input"));
    }

    #[test]
    fn test_fit_error_conversion() {
        let err: PangrowthError = FitError::InsufficientPoints { distinct_x: 1 }.into();
        match err {
            PangrowthError::FitConvergence { message } => {
                assert!(message.contains("distinct"));
            }
            other => panic!("unexpected variant: {other:?}"),
        }
    }
}
