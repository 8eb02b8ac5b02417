//! Owning dense matrix with borrowed strided windows.
//!
//! A [`Matrix`] owns a flat buffer. Every window handed out by
//! [`Matrix::extract()`], [`Matrix::transpose()`], [`Matrix::row()`] and
//! friends is an `ndarray` view over that same buffer: an offset plus a
//! row stride and a column stride. Element `(r, c)` of a window lives at
//! `offset + r * row_stride + c * col_stride`, and the borrow checker ties
//! the window's lifetime to the owner. Nothing here copies unless the
//! method name says so (`to_row_major_vec`, `clone`, `to_owned`).

use std::ops::{Index, IndexMut, Range};

use ndarray::iter::Lanes;
use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2, Ix1, ShapeBuilder, s};

use crate::error::MatrixError;

/// Dense `rows x cols` matrix of `f64`.
#[derive(Clone, Debug, PartialEq)]
pub struct Matrix {
    data: Array2<f64>,
}

impl Matrix {
    /// Returns a zero-initialized `rows x cols` matrix.
    pub fn new(rows: usize, cols: usize) -> Self {
        Self {
            data: Array2::zeros((rows, cols)),
        }
    }

    /// Returns a zero-initialized `n x n` matrix.
    pub fn square(n: usize) -> Self {
        Self::new(n, n)
    }

    /// Returns the `n x n` identity matrix.
    pub fn identity(n: usize) -> Self {
        Self {
            data: Array2::eye(n),
        }
    }

    /// Builds a matrix from a row-major buffer.
    ///
    /// # Errors
    ///
    /// [`MatrixError::BufferLength`] when `values.len() != rows * cols`.
    pub fn from_row_major(rows: usize, cols: usize, values: Vec<f64>) -> Result<Self, MatrixError> {
        let actual = values.len();
        check_len(rows, cols, actual)?;
        let data = Array2::from_shape_vec((rows, cols), values).map_err(|_| MatrixError::BufferLength {
            expected: rows * cols,
            actual,
        })?;
        Ok(Self { data })
    }

    /// Builds a matrix from a column-major buffer.
    ///
    /// The resulting matrix keeps the column-major layout (unit row
    /// stride), which is useful for exercising strided code paths.
    ///
    /// # Errors
    ///
    /// [`MatrixError::BufferLength`] when `values.len() != rows * cols`.
    pub fn from_col_major(rows: usize, cols: usize, values: Vec<f64>) -> Result<Self, MatrixError> {
        let actual = values.len();
        check_len(rows, cols, actual)?;
        let data = Array2::from_shape_vec((rows, cols).f(), values).map_err(|_| MatrixError::BufferLength {
            expected: rows * cols,
            actual,
        })?;
        Ok(Self { data })
    }

    /// Wraps an existing `ndarray` array without copying.
    pub fn from_array(data: Array2<f64>) -> Self {
        Self { data }
    }

    /// Number of rows.
    pub fn nrows(&self) -> usize {
        self.data.nrows()
    }

    /// Number of columns.
    pub fn ncols(&self) -> usize {
        self.data.ncols()
    }

    /// Returns `true` when the matrix is square.
    pub fn is_square(&self) -> bool {
        self.data.nrows() == self.data.ncols()
    }

    /// Returns the element at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.data[[row, col]]
    }

    /// Sets the element at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics if the index is out of bounds.
    pub fn set(&mut self, row: usize, col: usize, value: f64) {
        self.data[[row, col]] = value;
    }

    /// Borrows the whole matrix as a view.
    pub fn view(&self) -> ArrayView2<'_, f64> {
        self.data.view()
    }

    /// Borrows the whole matrix as a mutable view.
    pub fn view_mut(&mut self) -> ArrayViewMut2<'_, f64> {
        self.data.view_mut()
    }

    /// Returns the underlying array.
    pub fn as_array(&self) -> &Array2<f64> {
        &self.data
    }

    /// Consumes the matrix and returns the underlying array.
    pub fn into_array(self) -> Array2<f64> {
        self.data
    }

    /// Copies the elements out in row-major order.
    pub fn to_row_major_vec(&self) -> Vec<f64> {
        self.data.iter().copied().collect()
    }

    /// Returns the window `rows x cols` sharing this matrix's buffer.
    ///
    /// # Errors
    ///
    /// [`MatrixError::InvalidRange`] when a range is reversed or exceeds
    /// the matrix extent.
    pub fn extract(&self, rows: Range<usize>, cols: Range<usize>) -> Result<ArrayView2<'_, f64>, MatrixError> {
        check_range("row", &rows, self.nrows())?;
        check_range("column", &cols, self.ncols())?;
        Ok(self.data.slice(s![rows, cols]))
    }

    /// Mutable counterpart of [`Matrix::extract()`].
    ///
    /// # Errors
    ///
    /// [`MatrixError::InvalidRange`] when a range is reversed or exceeds
    /// the matrix extent.
    pub fn extract_mut(
        &mut self,
        rows: Range<usize>,
        cols: Range<usize>,
    ) -> Result<ArrayViewMut2<'_, f64>, MatrixError> {
        check_range("row", &rows, self.nrows())?;
        check_range("column", &cols, self.ncols())?;
        Ok(self.data.slice_mut(s![rows, cols]))
    }

    /// Transposed view (strides swapped, no copy).
    pub fn transpose(&self) -> ArrayView2<'_, f64> {
        self.data.t()
    }

    /// Row `i` as a strided 1-D view.
    ///
    /// # Errors
    ///
    /// [`MatrixError::InvalidRange`] when `i >= nrows`.
    pub fn row(&self, i: usize) -> Result<ArrayView1<'_, f64>, MatrixError> {
        check_index("row", i, self.nrows())?;
        Ok(self.data.row(i))
    }

    /// Mutable row `i`.
    ///
    /// # Errors
    ///
    /// [`MatrixError::InvalidRange`] when `i >= nrows`.
    pub fn row_mut(&mut self, i: usize) -> Result<ArrayViewMut1<'_, f64>, MatrixError> {
        check_index("row", i, self.nrows())?;
        Ok(self.data.row_mut(i))
    }

    /// Column `j` as a strided 1-D view.
    ///
    /// # Errors
    ///
    /// [`MatrixError::InvalidRange`] when `j >= ncols`.
    pub fn column(&self, j: usize) -> Result<ArrayView1<'_, f64>, MatrixError> {
        check_index("column", j, self.ncols())?;
        Ok(self.data.column(j))
    }

    /// Mutable column `j`.
    ///
    /// # Errors
    ///
    /// [`MatrixError::InvalidRange`] when `j >= ncols`.
    pub fn column_mut(&mut self, j: usize) -> Result<ArrayViewMut1<'_, f64>, MatrixError> {
        check_index("column", j, self.ncols())?;
        Ok(self.data.column_mut(j))
    }

    /// Main diagonal (stride `row_stride + col_stride`).
    pub fn diagonal(&self) -> ArrayView1<'_, f64> {
        self.data.diag()
    }

    /// Mutable main diagonal.
    pub fn diagonal_mut(&mut self) -> ArrayViewMut1<'_, f64> {
        self.data.diag_mut()
    }

    /// Sub-diagonal `k`: `k > 0` lies below the main diagonal
    /// (elements `(i + k, i)`), `k < 0` above it (elements `(i, i - k)`).
    ///
    /// # Errors
    ///
    /// [`MatrixError::InvalidRange`] when `|k|` exceeds the matrix extent.
    pub fn subdiagonal(&self, k: isize) -> Result<ArrayView1<'_, f64>, MatrixError> {
        let off = k.unsigned_abs();
        if k >= 0 {
            check_range("row", &(off..self.nrows()), self.nrows())?;
            Ok(self.data.slice(s![off.., ..]).into_diag())
        } else {
            check_range("column", &(off..self.ncols()), self.ncols())?;
            Ok(self.data.slice(s![.., off..]).into_diag())
        }
    }

    /// Forward-only cursor over the rows.
    pub fn rows(&self) -> Lanes<'_, f64, Ix1> {
        self.data.rows()
    }

    /// Forward-only cursor over the columns.
    pub fn columns(&self) -> Lanes<'_, f64, Ix1> {
        self.data.columns()
    }

    /// Returns `true` when `|M[i,j] - M[j,i]| <= tol` for every pair.
    pub fn is_symmetric(&self, tol: f64) -> bool {
        if !self.is_square() {
            return false;
        }
        let n = self.nrows();
        (0..n).all(|i| (0..i).all(|j| (self.data[[i, j]] - self.data[[j, i]]).abs() <= tol))
    }

    /// Largest absolute element, `0.0` for an empty matrix.
    pub fn max_abs(&self) -> f64 {
        self.data.iter().fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }
}

impl Index<(usize, usize)> for Matrix {
    type Output = f64;

    fn index(&self, (row, col): (usize, usize)) -> &f64 {
        &self.data[[row, col]]
    }
}

impl IndexMut<(usize, usize)> for Matrix {
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut f64 {
        &mut self.data[[row, col]]
    }
}

impl From<Array2<f64>> for Matrix {
    fn from(data: Array2<f64>) -> Self {
        Self { data }
    }
}

fn check_len(rows: usize, cols: usize, actual: usize) -> Result<(), MatrixError> {
    let expected = rows * cols;
    if expected != actual {
        return Err(MatrixError::BufferLength { expected, actual });
    }
    Ok(())
}

fn check_range(axis: &'static str, range: &Range<usize>, len: usize) -> Result<(), MatrixError> {
    if range.start > range.end || range.end > len {
        return Err(MatrixError::InvalidRange {
            axis,
            start: range.start,
            end: range.end,
            len,
        });
    }
    Ok(())
}

fn check_index(axis: &'static str, index: usize, len: usize) -> Result<(), MatrixError> {
    if index >= len {
        return Err(MatrixError::InvalidRange {
            axis,
            start: index,
            end: index + 1,
            len,
        });
    }
    Ok(())
}

/// Checks that `m` is square and returns its order.
pub(crate) fn square_order(m: &ArrayView2<'_, f64>) -> Result<usize, MatrixError> {
    let (rows, cols) = m.dim();
    if rows != cols {
        return Err(MatrixError::NotSquare { rows, cols });
    }
    Ok(rows)
}

/// Copies `lower` triangle onto the upper one, in place.
pub(crate) fn mirror_lower(mut m: ArrayViewMut2<'_, f64>) {
    let n = m.nrows();
    for i in 0..n {
        for j in 0..i {
            m[[j, i]] = m[[i, j]];
        }
    }
}
