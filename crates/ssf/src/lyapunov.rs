//! Discrete Lyapunov equation `P = T P Tᵗ + V`.

use ceres_matrix::{LuDecomposition, MatrixError};
use ndarray::{Array1, Array2, ArrayView2};

use crate::error::SsfError;

/// Solves `P = T P Tᵗ + V` for the stationary covariance `P`.
///
/// The equation is vectorized as `(I - T ⊗ T) vec(P) = vec(V)` and solved
/// by LU. A transition with an eigenvalue on or outside the unit circle
/// makes the system singular, reported as an infeasible
/// [`MatrixError::Singular`].
///
/// # Example
///
/// ```
/// use ceres_ssf::solve_discrete_lyapunov;
/// use ndarray::array;
///
/// // AR(1) with φ = 0.5: γ0 = 1 / (1 - φ²).
/// let p = solve_discrete_lyapunov(array![[0.5]].view(), array![[1.0]].view()).unwrap();
/// assert!((p[[0, 0]] - 4.0 / 3.0).abs() < 1e-12);
/// ```
#[tracing::instrument(level = "trace", skip_all, fields(dim = t.nrows()))]
pub fn solve_discrete_lyapunov(t: ArrayView2<'_, f64>, v: ArrayView2<'_, f64>) -> Result<Array2<f64>, SsfError> {
    let d = t.nrows();
    if t.ncols() != d {
        return Err(MatrixError::NotSquare { rows: d, cols: t.ncols() }.into());
    }
    if v.dim() != (d, d) {
        return Err(MatrixError::DimensionMismatch {
            operation: "lyapunov",
            left: t.dim(),
            right: v.dim(),
        }
        .into());
    }
    if d == 0 {
        return Ok(Array2::zeros((0, 0)));
    }

    let n = d * d;
    let mut a = Array2::<f64>::zeros((n, n));
    for i in 0..d {
        for j in 0..d {
            let row = i * d + j;
            for k in 0..d {
                for l in 0..d {
                    a[[row, k * d + l]] = -t[[i, k]] * t[[j, l]];
                }
            }
            a[[row, row]] += 1.0;
        }
    }
    let rhs: Array1<f64> = v.iter().copied().collect();
    let lu = LuDecomposition::new(a.view())?;
    let x = lu.solve(rhs.view())?;

    let mut p = Array2::zeros((d, d));
    for i in 0..d {
        for j in 0..d {
            p[[i, j]] = 0.5 * (x[i * d + j] + x[j * d + i]);
        }
    }
    Ok(p)
}
