//! LU decomposition with partial pivoting (Doolittle ordering).
//!
//! Used as the general-purpose fallback of [`crate::symmetric::inverse()`]
//! and for the small dense systems met elsewhere (autocovariances,
//! Lyapunov equations).

use ndarray::{Array1, Array2, ArrayView1, ArrayView2};

use crate::error::MatrixError;
use crate::matrix::{Matrix, square_order};

/// Pivots smaller than `PIVOT_FACTOR * n * EPS * max|A|` are treated as zero.
const PIVOT_FACTOR: f64 = 1e3;

/// Packed `L\U` factors of a square matrix with its row permutation.
///
/// `L` is unit lower triangular (diagonal not stored), `U` upper
/// triangular, and `P A = L U` where row `i` of `P A` is row
/// `pivots[i]` of `A`.
#[derive(Clone, Debug)]
pub struct LuDecomposition {
    lu: Array2<f64>,
    pivots: Vec<usize>,
    sign: f64,
}

impl LuDecomposition {
    /// Factors `a`.
    ///
    /// # Errors
    ///
    /// * [`MatrixError::NotSquare`] when `a` is not square.
    /// * [`MatrixError::Singular`] when a pivot vanishes to working
    ///   precision.
    pub fn new(a: ArrayView2<'_, f64>) -> Result<Self, MatrixError> {
        let n = square_order(&a)?;
        let mut lu = a.to_owned();
        let mut pivots: Vec<usize> = (0..n).collect();
        let mut sign = 1.0;

        let scale = lu.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()));
        let tol = PIVOT_FACTOR * n as f64 * f64::EPSILON * scale;

        for k in 0..n {
            let mut best = k;
            let mut best_abs = lu[[k, k]].abs();
            for i in k + 1..n {
                let v = lu[[i, k]].abs();
                if v > best_abs {
                    best = i;
                    best_abs = v;
                }
            }
            if best_abs <= tol || !best_abs.is_finite() {
                return Err(MatrixError::Singular { index: k });
            }
            if best != k {
                for j in 0..n {
                    lu.swap([k, j], [best, j]);
                }
                pivots.swap(k, best);
                sign = -sign;
            }
            let pivot = lu[[k, k]];
            for i in k + 1..n {
                let factor = lu[[i, k]] / pivot;
                lu[[i, k]] = factor;
                if factor != 0.0 {
                    for j in k + 1..n {
                        let ukj = lu[[k, j]];
                        lu[[i, j]] -= factor * ukj;
                    }
                }
            }
        }

        Ok(Self { lu, pivots, sign })
    }

    /// Order of the factored matrix.
    pub fn order(&self) -> usize {
        self.pivots.len()
    }

    /// Solves `A x = b`.
    ///
    /// # Errors
    ///
    /// [`MatrixError::DimensionMismatch`] when `b` has the wrong length.
    pub fn solve(&self, b: ArrayView1<'_, f64>) -> Result<Array1<f64>, MatrixError> {
        let n = self.order();
        if b.len() != n {
            return Err(MatrixError::DimensionMismatch {
                operation: "lu_solve",
                left: (n, n),
                right: (b.len(), 1),
            });
        }
        let mut x: Array1<f64> = self.pivots.iter().map(|&p| b[p]).collect();
        for i in 0..n {
            let mut acc = x[i];
            for k in 0..i {
                acc -= self.lu[[i, k]] * x[k];
            }
            x[i] = acc;
        }
        for i in (0..n).rev() {
            let mut acc = x[i];
            for k in i + 1..n {
                acc -= self.lu[[i, k]] * x[k];
            }
            x[i] = acc / self.lu[[i, i]];
        }
        Ok(x)
    }

    /// Solves `A X = B` column by column.
    ///
    /// # Errors
    ///
    /// [`MatrixError::DimensionMismatch`] when `B` has the wrong number of rows.
    pub fn solve_matrix(&self, b: ArrayView2<'_, f64>) -> Result<Matrix, MatrixError> {
        let n = self.order();
        if b.nrows() != n {
            return Err(MatrixError::DimensionMismatch {
                operation: "lu_solve_matrix",
                left: (n, n),
                right: b.dim(),
            });
        }
        let mut out = Array2::zeros(b.dim());
        for (j, col) in b.columns().into_iter().enumerate() {
            let x = self.solve(col)?;
            out.column_mut(j).assign(&x);
        }
        Ok(Matrix::from_array(out))
    }

    /// Inverse of the factored matrix (solve against the identity).
    pub fn inverse(&self) -> Result<Matrix, MatrixError> {
        let n = self.order();
        self.solve_matrix(Array2::<f64>::eye(n).view())
    }

    /// Determinant of the factored matrix.
    pub fn determinant(&self) -> f64 {
        self.lu.diag().iter().product::<f64>() * self.sign
    }

    /// `ln |det A|`.
    pub fn log_abs_determinant(&self) -> f64 {
        self.lu.diag().iter().map(|d| d.abs().ln()).sum()
    }
}
