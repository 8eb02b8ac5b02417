//! Error types for the ceres-matrix crate.

/// Error type for all fallible operations in the ceres-matrix crate.
///
/// Variants fall into two families: shape errors (malformed ranges,
/// mismatched dimensions), which are always fatal to the call, and
/// numerical infeasibility (non-positive-definite or singular input),
/// which callers running an optimizer treat as a rejected trial point.
/// See [`MatrixError::is_infeasible()`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MatrixError {
    /// Returned when a row or column range does not fit the matrix.
    #[error("invalid {axis} range {start}..{end} for extent {len}")]
    InvalidRange {
        /// `"row"` or `"column"`.
        axis: &'static str,
        /// First index of the requested range.
        start: usize,
        /// One past the last index of the requested range.
        end: usize,
        /// Extent of the matrix along that axis.
        len: usize,
    },

    /// Returned when two operands have incompatible shapes.
    #[error("dimension mismatch in {operation}: {left:?} vs {right:?}")]
    DimensionMismatch {
        /// Name of the operation that rejected the operands.
        operation: &'static str,
        /// Shape `(rows, cols)` of the left operand.
        left: (usize, usize),
        /// Shape `(rows, cols)` of the right operand.
        right: (usize, usize),
    },

    /// Returned when an operation requires a square matrix.
    #[error("matrix is not square ({rows}x{cols})")]
    NotSquare {
        /// Number of rows.
        rows: usize,
        /// Number of columns.
        cols: usize,
    },

    /// Returned when a raw buffer does not match the requested dimensions.
    #[error("buffer length {actual} does not match {expected} elements")]
    BufferLength {
        /// Number of elements required by the dimensions.
        expected: usize,
        /// Number of elements supplied.
        actual: usize,
    },

    /// Returned when a Cholesky pivot is negative beyond the tolerance.
    #[error("matrix is not positive definite (pivot {pivot} at index {index})")]
    NotPositiveDefinite {
        /// Diagonal index of the failing pivot.
        index: usize,
        /// Value of the pivot before the square root.
        pivot: f64,
    },

    /// Returned when a numerically zero Cholesky column still carries
    /// off-diagonal residuals above the tolerance.
    #[error("quasi-zero pivot at column {col} leaves residual {value} at row {row}")]
    QuasiZeroResidual {
        /// Row of the offending residual.
        row: usize,
        /// Column whose pivot was treated as zero.
        col: usize,
        /// Residual value.
        value: f64,
    },

    /// Returned when a zero tolerance is negative or not finite.
    #[error("invalid zero tolerance {tolerance}")]
    InvalidTolerance {
        /// Rejected tolerance.
        tolerance: f64,
    },

    /// Returned when a matrix is singular to working precision.
    #[error("matrix is singular (zero pivot at index {index})")]
    Singular {
        /// Index of the first zero pivot.
        index: usize,
    },
}

impl MatrixError {
    /// Returns `true` when the error signals numerical infeasibility
    /// rather than a malformed call.
    pub fn is_infeasible(&self) -> bool {
        matches!(
            self,
            Self::NotPositiveDefinite { .. } | Self::QuasiZeroResidual { .. } | Self::Singular { .. }
        )
    }
}
