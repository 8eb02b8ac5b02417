//! Error types for the ceres-arma crate.

use ceres_matrix::MatrixError;

/// Error type for all fallible operations in the ceres-arma crate.
///
/// This enum covers validation failures, numerical issues, and optimization
/// problems that may occur while building ARMA models, evaluating their
/// exact likelihood, and fitting them to data.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ArmaError {
    /// Returned when the input data is empty.
    #[error("input data is empty")]
    EmptyData,

    /// Returned when the input data has fewer observations than required.
    #[error("insufficient data: got {n} observations, need at least {min}")]
    InsufficientData {
        /// Number of observations provided.
        n: usize,
        /// Minimum number of observations required.
        min: usize,
    },

    /// Returned when the input data contains non-finite values (NaN or infinity).
    #[error("input data contains non-finite values")]
    NonFiniteData,

    /// Returned when the input data has zero variance.
    #[error("input data is constant (zero variance)")]
    ConstantData,

    /// Returned when the ARMA model violates stationarity constraints.
    #[error("model is non-stationary")]
    NonStationary,

    /// Returned when an innovation variance is not strictly positive and finite.
    #[error("invalid innovation variance {variance}")]
    InvalidVariance {
        /// Rejected variance.
        variance: f64,
    },

    /// Returned when a lag polynomial does not start with a constant term of 1.
    #[error("lag polynomial must have constant term 1, got {constant}")]
    InvalidPolynomial {
        /// Constant term found.
        constant: f64,
    },

    /// Returned when a series does not match the length a filter was
    /// initialized for.
    #[error("series length {actual} does not match initialized length {expected}")]
    LengthMismatch {
        /// Length passed to `initialize`.
        expected: usize,
        /// Length of the series.
        actual: usize,
    },

    /// Returned when a filter is used before `initialize`.
    #[error("filter used before initialization")]
    NotInitialized,

    /// Returned when a fit option is out of range.
    #[error("invalid option {name} = {value}")]
    InvalidOption {
        /// Option name.
        name: &'static str,
        /// Rejected value.
        value: f64,
    },

    /// Returned when the optimization algorithm fails to converge.
    #[error("optimisation failed to converge")]
    OptimizationFailed,

    /// Returned when all candidate ARMA models fail to fit.
    #[error("all ARMA candidates failed (max_p={max_p}, max_q={max_q})")]
    AllCandidatesFailed {
        /// Maximum AR order attempted.
        max_p: usize,
        /// Maximum MA order attempted.
        max_q: usize,
    },

    /// A matrix operation failed.
    #[error(transparent)]
    Matrix(#[from] MatrixError),
}

impl ArmaError {
    /// Returns `true` when the error marks an infeasible parameter point
    /// (non-stationary model, failed factorization) rather than bad input.
    pub fn is_infeasible(&self) -> bool {
        match self {
            Self::NonStationary => true,
            Self::Matrix(err) => err.is_infeasible(),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_and_infeasibility() {
        let cases = [
            (ArmaError::EmptyData, "input data is empty", false),
            (
                ArmaError::InsufficientData { n: 5, min: 10 },
                "insufficient data: got 5 observations, need at least 10",
                false,
            ),
            (ArmaError::NonStationary, "model is non-stationary", true),
            (
                ArmaError::LengthMismatch { expected: 10, actual: 8 },
                "series length 8 does not match initialized length 10",
                false,
            ),
            (
                ArmaError::AllCandidatesFailed { max_p: 3, max_q: 2 },
                "all ARMA candidates failed (max_p=3, max_q=2)",
                false,
            ),
        ];
        for (err, message, infeasible) in cases {
            assert_eq!(err.to_string(), message);
            assert_eq!(err.is_infeasible(), infeasible, "{err:?}");
        }
    }

    #[test]
    fn matrix_errors_pass_through() {
        let pivot = ArmaError::from(MatrixError::NotPositiveDefinite { index: 3, pivot: -1.0 });
        assert_eq!(pivot.to_string(), "matrix is not positive definite (pivot -1 at index 3)");
        assert!(pivot.is_infeasible());
        assert!(!ArmaError::from(MatrixError::NotSquare { rows: 2, cols: 3 }).is_infeasible());
    }

    #[test]
    fn usable_across_threads() {
        fn check<T: Send + Sync + std::error::Error + 'static>() {}
        check::<ArmaError>();
    }
}
