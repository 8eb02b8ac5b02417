//! Exact-likelihood filter through a pre-sample correction
//! (Ljung and Box 1979).
//!
//! Running the ARMA recursion
//! `a_t = y_t - Σ φ_i y_{t-i} - Σ θ_j a_{t-j}` with the `k = p + q`
//! pre-sample values `x = (y_{-1..-p}, ε_{-1..-q})` set to zero gives the
//! conditional residuals `a0`. The recursion is linear, so the true
//! innovations are `a0 + D x` where column `c` of `D` is the response to a
//! unit pre-sample value `c`. Writing `x = R u` with `R Rᵗ = Cov(x)/σ²`
//! and `K = D R`, integrating `u` out leaves
//!
//! * `M = I + KᵗK` (k x k, independent of n) and its Cholesky factor `C`;
//! * `û = -M⁻¹Kᵗa0` and `a = a0 + K û`;
//! * `ssq = (|a|² + |û|²)/σ²` and `ln|Cov| = n ln σ² + ln|M|`.
//!
//! Residuals are returned as `[a; û] / σ`, so the capacity is `n + k`.

use ceres_matrix::{Matrix, cholesky_lower, solve_lower, solve_lower_transpose, xtx};
use ndarray::{Array1, Array2};

use crate::ansley::check_length;
use crate::error::ArmaError;
use crate::filter::ArmaFilter;
use crate::model::ArmaModel;

#[derive(Clone, Debug)]
struct Prepared {
    n: usize,
    phi: Vec<f64>,
    theta: Vec<f64>,
    sigma: f64,
    /// `K = D R`, `n x k`.
    k: Array2<f64>,
    /// Cholesky factor of `I + KᵗK`.
    c: Matrix,
}

/// Exact ARMA filter with a `(p+q) x (p+q)` correction system.
#[derive(Clone, Debug, Default)]
pub struct LjungBoxFilter {
    prepared: Option<Prepared>,
    log_det: f64,
}

impl LjungBoxFilter {
    /// Uninitialized filter.
    pub fn new() -> Self {
        Self::default()
    }
}

/// ARMA recursion over `y` with pre-sample values `ys` (`y_{-1}, y_{-2}, …`)
/// and `es` (`ε_{-1}, ε_{-2}, …`).
fn recursion(phi: &[f64], theta: &[f64], y: &[f64], ys: &[f64], es: &[f64]) -> Vec<f64> {
    let n = y.len();
    let mut a = vec![0.0; n];
    for t in 0..n {
        let mut v = y[t];
        for (i, c) in phi.iter().enumerate() {
            let lag = i + 1;
            v -= c * if t >= lag { y[t - lag] } else { ys[lag - t - 1] };
        }
        for (j, c) in theta.iter().enumerate() {
            let lag = j + 1;
            v -= c * if t >= lag { a[t - lag] } else { es[lag - t - 1] };
        }
        a[t] = v;
    }
    a
}

impl ArmaFilter for LjungBoxFilter {
    #[tracing::instrument(level = "trace", skip(self, model), fields(p = model.p(), q = model.q()))]
    fn initialize(&mut self, model: &ArmaModel, n: usize) -> Result<usize, ArmaError> {
        if n == 0 {
            return Err(ArmaError::EmptyData);
        }
        self.prepared = None;
        let p = model.p();
        let q = model.q();
        let k = p + q;
        let phi = model.phi().to_vec();
        let theta = model.theta().to_vec();

        let mut r = model.presample_covariance()?;
        cholesky_lower(r.view_mut())?;

        let zeros_y = vec![0.0; p];
        let zeros_e = vec![0.0; q];
        let y0 = vec![0.0; n];
        let mut d = Array2::<f64>::zeros((n, k));
        for c in 0..k {
            let mut ys = zeros_y.clone();
            let mut es = zeros_e.clone();
            if c < p {
                ys[c] = 1.0;
            } else {
                es[c - p] = 1.0;
            }
            let response = recursion(&phi, &theta, &y0, &ys, &es);
            d.column_mut(c).assign(&Array1::from(response));
        }
        let kmat = d.dot(&r);

        let mut m = xtx(kmat.view());
        for i in 0..k {
            m[(i, i)] += 1.0;
        }
        cholesky_lower(m.view_mut())?;
        let ln_m = 2.0 * m.diagonal().iter().map(|v| v.ln()).sum::<f64>();

        self.log_det = n as f64 * model.variance().ln() + ln_m;
        self.prepared = Some(Prepared {
            n,
            phi,
            theta,
            sigma: model.sigma(),
            k: kmat,
            c: m,
        });
        Ok(n + k)
    }

    fn filter(&self, series: &[f64]) -> Result<Vec<f64>, ArmaError> {
        let prep = self.prepared.as_ref().ok_or(ArmaError::NotInitialized)?;
        check_length(prep.n, series.len())?;
        let p = prep.phi.len();
        let q = prep.theta.len();

        let a0 = Array1::from(recursion(&prep.phi, &prep.theta, series, &vec![0.0; p], &vec![0.0; q]));
        let mut u = prep.k.t().dot(&a0);
        solve_lower(prep.c.view(), u.view_mut())?;
        solve_lower_transpose(prep.c.view(), u.view_mut())?;
        u.mapv_inplace(|v| -v);
        let a = a0 + prep.k.dot(&u);

        Ok(a.iter().chain(u.iter()).map(|v| v / prep.sigma).collect())
    }

    fn log_determinant(&self) -> f64 {
        self.log_det
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn capacity_includes_presample() {
        let model = ArmaModel::new(vec![], vec![0.5, 0.2], 1.0).unwrap();
        let mut f = LjungBoxFilter::new();
        assert_eq!(f.initialize(&model, 10).unwrap(), 12);
        let e = f.filter(&[0.3; 10]).unwrap();
        assert_eq!(e.len(), 12);
    }

    #[test]
    fn ma1_single_observation() {
        // Var(y_0) = σ²(1 + θ²): ssq = y²/(1+θ²), logdet = ln(1+θ²).
        let theta = 0.8;
        let model = ArmaModel::new(vec![], vec![theta], 1.0).unwrap();
        let mut f = LjungBoxFilter::new();
        f.initialize(&model, 1).unwrap();
        let e = f.filter(&[2.0]).unwrap();
        let ssq: f64 = e.iter().map(|v| v * v).sum();
        assert_abs_diff_eq!(ssq, 4.0 / (1.0 + theta * theta), epsilon = 1e-14);
        assert_abs_diff_eq!(f.log_determinant(), (1.0_f64 + theta * theta).ln(), epsilon = 1e-14);
    }

    #[test]
    fn white_noise_has_no_correction() {
        let model = ArmaModel::white_noise(4.0).unwrap();
        let mut f = LjungBoxFilter::new();
        assert_eq!(f.initialize(&model, 3).unwrap(), 3);
        assert_eq!(f.filter(&[2.0, -1.0, 0.5]).unwrap(), vec![1.0, -0.5, 0.25]);
        assert_abs_diff_eq!(f.log_determinant(), 3.0 * 4.0_f64.ln(), epsilon = 1e-14);
    }

    #[test]
    fn presample_covariance_arma11() {
        let model = ArmaModel::new(vec![0.5], vec![0.4], 3.0).unwrap();
        let omega = model.presample_covariance().unwrap();
        let gamma0 = (1.0 + 2.0 * 0.5 * 0.4 + 0.16) / 0.75;
        assert_abs_diff_eq!(omega[[0, 0]], gamma0, epsilon = 1e-13);
        assert_eq!(omega[[0, 1]], 1.0);
        assert_eq!(omega[[1, 1]], 1.0);
    }

    #[test]
    fn length_mismatch() {
        let model = ArmaModel::new(vec![0.2], vec![], 1.0).unwrap();
        let mut f = LjungBoxFilter::new();
        f.initialize(&model, 4).unwrap();
        assert!(matches!(
            f.filter(&[1.0; 5]),
            Err(ArmaError::LengthMismatch { .. })
        ));
    }
}
