//! Symmetric band matrices in lower band storage.
//!
//! A symmetric `n x n` matrix whose entries vanish beyond distance
//! `width - 1` from the diagonal is stored as an `n x width` array with
//! `band[[i, k]] = A[i, i - k]`. Column 0 holds the diagonal. Slots with
//! `k > i` fall outside the matrix and stay zero.
//!
//! [`BandMatrix::cholesky()`] factors in place and hands the same buffer
//! back as a [`BandCholesky`].

use ndarray::{Array2, ArrayViewMut1};

use crate::error::MatrixError;
use crate::matrix::Matrix;

/// Symmetric band matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct BandMatrix {
    band: Array2<f64>,
}

/// Lower Cholesky factor of a [`BandMatrix`], same storage.
#[derive(Clone, Debug, PartialEq)]
pub struct BandCholesky {
    band: Array2<f64>,
}

impl BandMatrix {
    /// Zero band matrix of order `n` and band width `width` (`width = 1`
    /// is diagonal).
    pub fn new(n: usize, width: usize) -> Self {
        Self {
            band: Array2::zeros((n, width.max(1))),
        }
    }

    /// Matrix order.
    pub fn order(&self) -> usize {
        self.band.nrows()
    }

    /// Band width (number of stored diagonals).
    pub fn width(&self) -> usize {
        self.band.ncols()
    }

    /// Element `(i, j)`; zero outside the band.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        let (hi, lo) = if i >= j { (i, j) } else { (j, i) };
        band_entry(&self.band, hi, lo)
    }

    /// Sets `A[i, j]` (and `A[j, i]`).
    ///
    /// # Errors
    ///
    /// [`MatrixError::InvalidRange`] when `(i, j)` lies outside the band.
    pub fn set(&mut self, i: usize, j: usize, value: f64) -> Result<(), MatrixError> {
        let (hi, lo) = if i >= j { (i, j) } else { (j, i) };
        let k = hi - lo;
        if hi >= self.order() || k >= self.width() {
            return Err(MatrixError::InvalidRange {
                axis: "band",
                start: lo,
                end: hi + 1,
                len: self.order(),
            });
        }
        self.band[[hi, k]] = value;
        Ok(())
    }

    /// Band Cholesky factorization in place, `O(n * width²)`.
    ///
    /// # Errors
    ///
    /// [`MatrixError::NotPositiveDefinite`] on a non-positive or non-finite
    /// pivot.
    pub fn cholesky(mut self) -> Result<BandCholesky, MatrixError> {
        let n = self.order();
        let w = self.width();
        for i in 0..n {
            let first = (i + 1).saturating_sub(w);
            for j in first..i {
                // L[i,j] = (A[i,j] - Σ_{m<j} L[i,m] L[j,m]) / L[j,j]
                let mut acc = self.band[[i, i - j]];
                for m in first..j {
                    acc -= self.band[[i, i - m]] * self.band[[j, j - m]];
                }
                self.band[[i, i - j]] = acc / self.band[[j, 0]];
            }
            let mut pivot = self.band[[i, 0]];
            for m in first..i {
                let lim = self.band[[i, i - m]];
                pivot -= lim * lim;
            }
            if !pivot.is_finite() || pivot <= 0.0 {
                return Err(MatrixError::NotPositiveDefinite { index: i, pivot });
            }
            self.band[[i, 0]] = pivot.sqrt();
        }
        Ok(BandCholesky { band: self.band })
    }

    /// Dense symmetric copy.
    pub fn to_dense(&self) -> Matrix {
        let n = self.order();
        let mut out = Matrix::square(n);
        for i in 0..n {
            for j in 0..n {
                out.set(i, j, self.get(i, j));
            }
        }
        out
    }
}

impl BandCholesky {
    /// Matrix order.
    pub fn order(&self) -> usize {
        self.band.nrows()
    }

    /// Band width.
    pub fn width(&self) -> usize {
        self.band.ncols()
    }

    /// Element `(i, j)` of the lower factor.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        if i < j { 0.0 } else { band_entry(&self.band, i, j) }
    }

    /// Forward substitution `L x = b` in place against the factor.
    ///
    /// # Errors
    ///
    /// [`MatrixError::DimensionMismatch`] when `b` has the wrong length.
    pub fn solve_lower_in_place(&self, mut b: ArrayViewMut1<'_, f64>) -> Result<(), MatrixError> {
        let n = self.order();
        if b.len() != n {
            return Err(MatrixError::DimensionMismatch {
                operation: "band_solve_lower",
                left: (n, self.width()),
                right: (b.len(), 1),
            });
        }
        let w = self.width();
        for i in 0..n {
            let first = (i + 1).saturating_sub(w);
            let mut acc = b[i];
            for m in first..i {
                acc -= self.band[[i, i - m]] * b[m];
            }
            b[i] = acc / self.band[[i, 0]];
        }
        Ok(())
    }

    /// `ln |A| = 2 Σ ln L_ii`.
    pub fn log_determinant(&self) -> f64 {
        2.0 * self.band.column(0).iter().map(|d| d.ln()).sum::<f64>()
    }

    /// Dense lower-triangular copy.
    pub fn to_dense(&self) -> Matrix {
        let n = self.order();
        let mut out = Matrix::square(n);
        for i in 0..n {
            for j in 0..n {
                out.set(i, j, self.get(i, j));
            }
        }
        out
    }
}

fn band_entry(band: &Array2<f64>, hi: usize, lo: usize) -> f64 {
    let k = hi - lo;
    if hi >= band.nrows() || k >= band.ncols() {
        0.0
    } else {
        band[[hi, k]]
    }
}
