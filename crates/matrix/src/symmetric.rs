//! Algorithms on symmetric matrices.
//!
//! * [`cholesky_lower()`] factors a positive semi-definite matrix in place.
//!   It is written once against `ArrayViewMut2`, so row-major, column-major
//!   and transposed windows all run the same arithmetic in the same order
//!   and produce bit-identical factors.
//! * [`xxt()`], [`xtx()`], [`llt()`], [`uut()`] and [`xtsx()`] compute the
//!   lower triangle of a symmetric product and mirror it, so the result is
//!   exactly symmetric.
//! * [`inverse()`] inverts through the Cholesky factor and falls back to
//!   [`LuDecomposition`] when the factorization or the triangular inverse
//!   fails.

use ndarray::{Array2, ArrayView2, ArrayViewMut2};
use rand::Rng;
use rand_distr::StandardNormal;
use tracing::debug;

use crate::error::MatrixError;
use crate::lu::LuDecomposition;
use crate::matrix::{Matrix, mirror_lower, square_order};
use crate::triangular::lower_inverse;

/// Scale factor of the default zero tolerance.
const TOLERANCE_FACTOR: f64 = 64.0;

/// Default zero tolerance for [`cholesky_lower()`]:
/// `64 * n * EPS * max(1, max|M_ii|)`.
pub fn default_tolerance(m: &ArrayView2<'_, f64>) -> f64 {
    let n = m.nrows().min(m.ncols());
    let scale = m.diag().iter().fold(1.0_f64, |acc, v| acc.max(v.abs()));
    TOLERANCE_FACTOR * n as f64 * f64::EPSILON * scale
}

/// In-place lower Cholesky factorization with the default tolerance.
///
/// See [`cholesky_lower_with_tolerance()`].
pub fn cholesky_lower(m: ArrayViewMut2<'_, f64>) -> Result<(), MatrixError> {
    let tol = default_tolerance(&m.view());
    cholesky_lower_with_tolerance(m, tol)
}

/// In-place lower Cholesky factorization of a symmetric positive
/// semi-definite matrix.
///
/// Only the lower triangle of `m` is read. On success it holds `L` with
/// `L Lᵗ = M` and the strict upper triangle is zeroed. For each pivot
/// `a = M[i,i] - Σ L[i,k]²`:
///
/// * `a < -tol` fails with [`MatrixError::NotPositiveDefinite`];
/// * `|a| <= tol` zeroes column `i`; every updated entry below the pivot
///   must itself be within `tol`, else [`MatrixError::QuasiZeroResidual`];
/// * otherwise the column is scaled by `sqrt(a)`.
///
/// On error the contents of `m` are unspecified.
///
/// # Errors
///
/// * [`MatrixError::NotSquare`] when `m` is not square.
/// * [`MatrixError::InvalidTolerance`] when `tol` is negative or not finite.
/// * [`MatrixError::NotPositiveDefinite`] on a negative or non-finite pivot.
/// * [`MatrixError::QuasiZeroResidual`] on a zero pivot with a residual.
pub fn cholesky_lower_with_tolerance(mut m: ArrayViewMut2<'_, f64>, tol: f64) -> Result<(), MatrixError> {
    let n = square_order(&m.view())?;
    if !tol.is_finite() || tol < 0.0 {
        return Err(MatrixError::InvalidTolerance { tolerance: tol });
    }

    for i in 0..n {
        let mut aii = m[[i, i]];
        for k in 0..i {
            let lik = m[[i, k]];
            aii -= lik * lik;
        }
        if !aii.is_finite() || aii < -tol {
            return Err(MatrixError::NotPositiveDefinite { index: i, pivot: aii });
        }

        if aii <= tol {
            m[[i, i]] = 0.0;
            for j in i + 1..n {
                let mut aji = m[[j, i]];
                for k in 0..i {
                    aji -= m[[j, k]] * m[[i, k]];
                }
                if aji.abs() > tol {
                    return Err(MatrixError::QuasiZeroResidual {
                        row: j,
                        col: i,
                        value: aji,
                    });
                }
                m[[j, i]] = 0.0;
            }
        } else {
            let lii = aii.sqrt();
            m[[i, i]] = lii;
            for j in i + 1..n {
                let mut aji = m[[j, i]];
                for k in 0..i {
                    aji -= m[[j, k]] * m[[i, k]];
                }
                m[[j, i]] = aji / lii;
            }
        }
    }

    for i in 0..n {
        for j in i + 1..n {
            m[[i, j]] = 0.0;
        }
    }
    Ok(())
}

/// Options for Cholesky factorization.
///
/// # Example
///
/// ```
/// use ceres_matrix::{CholeskyOptions, Matrix};
///
/// let mut m = Matrix::from_row_major(2, 2, vec![4.0, 2.0, 2.0, 3.0]).unwrap();
/// CholeskyOptions::new()
///     .with_zero_tolerance(1e-12)
///     .factor(m.view_mut())
///     .unwrap();
/// assert_eq!(m.get(0, 0), 2.0);
/// ```
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CholeskyOptions {
    /// Fixed zero tolerance; `None` uses [`default_tolerance()`].
    zero_tolerance: Option<f64>,
}

impl CholeskyOptions {
    /// Creates options using the default, size-scaled tolerance.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a fixed zero tolerance.
    pub fn with_zero_tolerance(mut self, tol: f64) -> Self {
        self.zero_tolerance = Some(tol);
        self
    }

    /// Returns the fixed zero tolerance, if any.
    pub fn zero_tolerance(&self) -> Option<f64> {
        self.zero_tolerance
    }

    /// Validates the options.
    pub fn validate(&self) -> Result<(), MatrixError> {
        match self.zero_tolerance {
            Some(tol) if !tol.is_finite() || tol < 0.0 => {
                Err(MatrixError::InvalidTolerance { tolerance: tol })
            }
            _ => Ok(()),
        }
    }

    /// Factors `m` in place with these options.
    pub fn factor(&self, m: ArrayViewMut2<'_, f64>) -> Result<(), MatrixError> {
        match self.zero_tolerance {
            Some(tol) => cholesky_lower_with_tolerance(m, tol),
            None => cholesky_lower(m),
        }
    }
}

/// `X Xᵗ` for any `r x c` window `X`.
pub fn xxt(x: ArrayView2<'_, f64>) -> Matrix {
    let n = x.nrows();
    let mut out = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        let xi = x.row(i);
        for j in 0..=i {
            out[[i, j]] = xi.dot(&x.row(j));
        }
    }
    mirror_lower(out.view_mut());
    Matrix::from_array(out)
}

/// `Xᵗ X` for any `r x c` window `X`.
pub fn xtx(x: ArrayView2<'_, f64>) -> Matrix {
    xxt(x.t())
}

/// `L Lᵗ` for a lower-triangular `L`; the upper triangle of `l` is ignored.
///
/// # Errors
///
/// [`MatrixError::NotSquare`] when `l` is not square.
pub fn llt(l: ArrayView2<'_, f64>) -> Result<Matrix, MatrixError> {
    let n = square_order(&l)?;
    let mut out = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut acc = 0.0;
            for k in 0..=j {
                acc += l[[i, k]] * l[[j, k]];
            }
            out[[i, j]] = acc;
        }
    }
    mirror_lower(out.view_mut());
    Ok(Matrix::from_array(out))
}

/// `U Uᵗ` for an upper-triangular `U`; the lower triangle of `u` is ignored.
///
/// # Errors
///
/// [`MatrixError::NotSquare`] when `u` is not square.
pub fn uut(u: ArrayView2<'_, f64>) -> Result<Matrix, MatrixError> {
    let n = square_order(&u)?;
    let mut out = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..=i {
            let mut acc = 0.0;
            for k in i..n {
                acc += u[[i, k]] * u[[j, k]];
            }
            out[[i, j]] = acc;
        }
    }
    mirror_lower(out.view_mut());
    Ok(Matrix::from_array(out))
}

/// `Xᵗ S X` for a symmetric `n x n` window `S` and an `n x m` window `X`.
///
/// # Errors
///
/// * [`MatrixError::NotSquare`] when `s` is not square.
/// * [`MatrixError::DimensionMismatch`] when `x` has not `n` rows.
pub fn xtsx(s: ArrayView2<'_, f64>, x: ArrayView2<'_, f64>) -> Result<Matrix, MatrixError> {
    let n = square_order(&s)?;
    if x.nrows() != n {
        return Err(MatrixError::DimensionMismatch {
            operation: "xtsx",
            left: s.dim(),
            right: x.dim(),
        });
    }
    let sx = s.dot(&x);
    let m = x.ncols();
    let mut out = Array2::<f64>::zeros((m, m));
    for i in 0..m {
        let xi = x.column(i);
        for j in 0..=i {
            out[[i, j]] = xi.dot(&sx.column(j));
        }
    }
    mirror_lower(out.view_mut());
    Ok(Matrix::from_array(out))
}

/// Fills a square window with a random symmetric positive semi-definite
/// matrix `X Xᵗ`, `X` having independent standard normal entries.
///
/// # Errors
///
/// [`MatrixError::NotSquare`] when `m` is not square.
pub fn randomize<R: Rng + ?Sized>(mut m: ArrayViewMut2<'_, f64>, rng: &mut R) -> Result<(), MatrixError> {
    let n = square_order(&m.view())?;
    let x = Array2::from_shape_simple_fn((n, n), || rng.sample::<f64, _>(StandardNormal));
    m.assign(xxt(x.view()).as_array());
    Ok(())
}

/// Inverse of a symmetric matrix.
///
/// Tries `S⁻¹ = L⁻ᵗ L⁻¹` from the Cholesky factor first. When the matrix
/// is not positive definite (negative pivot, residual, or a zero pivot
/// making `L` singular) the inverse is computed by LU with partial
/// pivoting instead.
///
/// # Errors
///
/// * [`MatrixError::NotSquare`] when `s` is not square.
/// * [`MatrixError::Singular`] when the LU fallback finds a zero pivot.
#[tracing::instrument(level = "trace", skip(s), fields(n = s.nrows()))]
pub fn inverse(s: ArrayView2<'_, f64>) -> Result<Matrix, MatrixError> {
    square_order(&s)?;
    match cholesky_inverse(s) {
        Ok(inv) => Ok(inv),
        Err(err) => {
            debug!(error = %err, "Cholesky inversion failed, falling back to LU");
            LuDecomposition::new(s)?.inverse()
        }
    }
}

fn cholesky_inverse(s: ArrayView2<'_, f64>) -> Result<Matrix, MatrixError> {
    let mut l = s.to_owned();
    cholesky_lower(l.view_mut())?;
    let l_inv = lower_inverse(l.view())?;
    Ok(xtx(l_inv.view()))
}
