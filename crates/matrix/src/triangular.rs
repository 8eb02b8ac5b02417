//! Lower-triangular solves and inversion.

use ndarray::{Array2, ArrayView2, ArrayViewMut1};

use crate::error::MatrixError;
use crate::matrix::{Matrix, square_order};

/// Solves `L x = b` in place (forward substitution). Only the lower
/// triangle of `l` is read.
///
/// # Errors
///
/// * [`MatrixError::DimensionMismatch`] when `b` does not match `l`.
/// * [`MatrixError::Singular`] on a zero diagonal element.
pub fn solve_lower(l: ArrayView2<'_, f64>, mut b: ArrayViewMut1<'_, f64>) -> Result<(), MatrixError> {
    let n = square_order(&l)?;
    if b.len() != n {
        return Err(MatrixError::DimensionMismatch {
            operation: "solve_lower",
            left: (n, n),
            right: (b.len(), 1),
        });
    }
    for i in 0..n {
        let mut acc = b[i];
        for k in 0..i {
            acc -= l[[i, k]] * b[k];
        }
        let d = l[[i, i]];
        if d == 0.0 {
            return Err(MatrixError::Singular { index: i });
        }
        b[i] = acc / d;
    }
    Ok(())
}

/// Solves `Lᵗ x = b` in place (back substitution against the transpose
/// of a lower-triangular factor).
///
/// # Errors
///
/// * [`MatrixError::DimensionMismatch`] when `b` does not match `l`.
/// * [`MatrixError::Singular`] on a zero diagonal element.
pub fn solve_lower_transpose(
    l: ArrayView2<'_, f64>,
    mut b: ArrayViewMut1<'_, f64>,
) -> Result<(), MatrixError> {
    let n = square_order(&l)?;
    if b.len() != n {
        return Err(MatrixError::DimensionMismatch {
            operation: "solve_lower_transpose",
            left: (n, n),
            right: (b.len(), 1),
        });
    }
    for i in (0..n).rev() {
        let mut acc = b[i];
        for k in i + 1..n {
            acc -= l[[k, i]] * b[k];
        }
        let d = l[[i, i]];
        if d == 0.0 {
            return Err(MatrixError::Singular { index: i });
        }
        b[i] = acc / d;
    }
    Ok(())
}

/// Inverse of a lower-triangular matrix (itself lower triangular).
///
/// # Errors
///
/// * [`MatrixError::NotSquare`] when `l` is not square.
/// * [`MatrixError::Singular`] on a zero diagonal element.
pub fn lower_inverse(l: ArrayView2<'_, f64>) -> Result<Matrix, MatrixError> {
    let n = square_order(&l)?;
    let mut inv = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        if l[[i, i]] == 0.0 {
            return Err(MatrixError::Singular { index: i });
        }
    }
    // Column j of the inverse solves L x = e_j; entries above j are zero.
    for j in 0..n {
        inv[[j, j]] = 1.0 / l[[j, j]];
        for i in j + 1..n {
            let mut acc = 0.0;
            for k in j..i {
                acc -= l[[i, k]] * inv[[k, j]];
            }
            inv[[i, j]] = acc / l[[i, i]];
        }
    }
    Ok(Matrix::from_array(inv))
}
