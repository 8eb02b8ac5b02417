//! Error types for the ceres-ssf crate.

use ceres_arma::ArmaError;
use ceres_matrix::MatrixError;

/// Error type for state-space construction, filtering and smoothing.
///
/// As in the lower crates, shape errors are fatal to the call while
/// [`SsfError::Infeasible`] (and the wrapped infeasibility errors) mark a
/// parameter point an optimizer should reject. See
/// [`SsfError::is_infeasible()`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SsfError {
    /// Returned when an argument has the wrong extent.
    #[error("dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Name of the mismatched argument.
        what: &'static str,
        /// Expected extent.
        expected: usize,
        /// Supplied extent.
        actual: usize,
    },

    /// Returned when the observation series is empty.
    #[error("observation series is empty")]
    EmptyData,

    /// Returned when an observation is infinite. Missing values are `NaN`.
    #[error("invalid observation {value} at position {pos}")]
    InvalidObservation {
        /// Position of the observation.
        pos: usize,
        /// Offending value.
        value: f64,
    },

    /// Returned when an innovation variance is negative or non-finite, or
    /// numerically zero while the innovation is not.
    #[error("infeasible innovation variance {variance} at position {pos}")]
    Infeasible {
        /// Position at which the recursion stopped.
        pos: usize,
        /// Offending innovation variance.
        variance: f64,
    },

    /// Returned when smoothing is requested on results filtered without
    /// history.
    #[error("filtering history was not retained")]
    HistoryNotRetained,

    /// Returned when a model or option parameter is out of range.
    #[error("invalid parameter {name} = {value}")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// Rejected value.
        value: f64,
    },

    /// Wrapped linear-algebra error.
    #[error(transparent)]
    Matrix(#[from] MatrixError),

    /// Wrapped ARMA model error.
    #[error(transparent)]
    Arma(#[from] ArmaError),
}

impl SsfError {
    /// Returns `true` for numerical infeasibility of the current
    /// parameters, as opposed to malformed input.
    pub fn is_infeasible(&self) -> bool {
        match self {
            Self::Infeasible { .. } => true,
            Self::Matrix(err) => err.is_infeasible(),
            Self::Arma(err) => err.is_infeasible(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infeasible_display() {
        let err = SsfError::Infeasible {
            pos: 7,
            variance: -0.5,
        };
        assert_eq!(
            err.to_string(),
            "infeasible innovation variance -0.5 at position 7"
        );
        assert!(err.is_infeasible());
    }

    #[test]
    fn wrapped_errors_keep_classification() {
        let err: SsfError = ArmaError::NonStationary.into();
        assert!(err.is_infeasible());
        let err: SsfError = MatrixError::NotSquare { rows: 2, cols: 3 }.into();
        assert!(!err.is_infeasible());
        assert_eq!(err.to_string(), "matrix is not square (2x3)");
    }

    #[test]
    fn shape_errors_are_fatal() {
        let err = SsfError::DimensionMismatch {
            what: "observations",
            expected: 1,
            actual: 2,
        };
        assert!(!err.is_infeasible());
        assert!(!SsfError::HistoryNotRetained.is_infeasible());
    }
}
