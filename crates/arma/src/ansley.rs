//! Banded exact-likelihood filter (Ansley 1979).
//!
//! With `w_t = y_t` for `t < p` and `w_t = Φ(B) y_t` afterwards, the
//! covariance of `w` is a band matrix of width `r = max(p, q + 1)`:
//!
//! * `s, t < p`: `γ_{|s-t|}`;
//! * `s >= p > t`: `σ² Σ_{j=s-t}^{q} θ_j ψ_{j-(s-t)}`;
//! * `s, t >= p`: `σ² Σ_j θ_j θ_{j+|s-t|}`.
//!
//! Its band Cholesky factor `L` gives `e = L⁻¹ w` and `ln|Cov| = ln|L|²`
//! (the AR transform has unit determinant).

use ceres_matrix::{BandCholesky, BandMatrix};
use ndarray::aview_mut1;

use crate::error::ArmaError;
use crate::filter::ArmaFilter;
use crate::model::ArmaModel;

#[derive(Clone, Debug)]
enum State {
    Empty,
    WhiteNoise { n: usize, sigma: f64 },
    Banded { n: usize, phi: Vec<f64>, factor: BandCholesky },
}

/// Exact ARMA filter through a band Cholesky factorization.
#[derive(Clone, Debug)]
pub struct AnsleyFilter {
    state: State,
    log_det: f64,
}

impl AnsleyFilter {
    /// Uninitialized filter.
    pub fn new() -> Self {
        Self {
            state: State::Empty,
            log_det: 0.0,
        }
    }
}

impl Default for AnsleyFilter {
    fn default() -> Self {
        Self::new()
    }
}

impl ArmaFilter for AnsleyFilter {
    #[tracing::instrument(level = "trace", skip(self, model), fields(p = model.p(), q = model.q()))]
    fn initialize(&mut self, model: &ArmaModel, n: usize) -> Result<usize, ArmaError> {
        if n == 0 {
            return Err(ArmaError::EmptyData);
        }
        self.state = State::Empty;
        let var = model.variance();

        if model.is_white_noise() {
            self.log_det = n as f64 * var.ln();
            self.state = State::WhiteNoise {
                n,
                sigma: model.sigma(),
            };
            return Ok(n);
        }

        let p = model.p();
        let q = model.q();
        let r = p.max(q + 1);
        let gamma = model.autocovariances(p.max(1))?;
        let psi = model.psi_weights(q + 1);
        let cross = |h: usize| -> f64 {
            if h > q {
                0.0
            } else {
                var * (h..=q).map(|j| model.theta_at(j) * psi[j - h]).sum::<f64>()
            }
        };
        let ma = |h: usize| -> f64 {
            if h > q {
                0.0
            } else {
                var * (0..=q - h).map(|j| model.theta_at(j) * model.theta_at(j + h)).sum::<f64>()
            }
        };

        let mut band = BandMatrix::new(n, r);
        for i in 0..n {
            for k in 0..r.min(i + 1) {
                let j = i - k;
                let value = if i < p {
                    gamma[k]
                } else if j < p {
                    cross(k)
                } else {
                    ma(k)
                };
                band.set(i, j, value)?;
            }
        }
        let factor = band.cholesky()?;
        self.log_det = factor.log_determinant();
        self.state = State::Banded {
            n,
            phi: model.phi().to_vec(),
            factor,
        };
        Ok(n)
    }

    fn filter(&self, series: &[f64]) -> Result<Vec<f64>, ArmaError> {
        match &self.state {
            State::Empty => Err(ArmaError::NotInitialized),
            State::WhiteNoise { n, sigma } => {
                check_length(*n, series.len())?;
                Ok(series.iter().map(|y| y / sigma).collect())
            }
            State::Banded { n, phi, factor } => {
                check_length(*n, series.len())?;
                let p = phi.len();
                let mut w: Vec<f64> = series.to_vec();
                for t in p..*n {
                    let mut v = series[t];
                    for (i, c) in phi.iter().enumerate() {
                        v -= c * series[t - i - 1];
                    }
                    w[t] = v;
                }
                factor.solve_lower_in_place(aview_mut1(&mut w))?;
                Ok(w)
            }
        }
    }

    fn log_determinant(&self) -> f64 {
        self.log_det
    }
}

pub(crate) fn check_length(expected: usize, actual: usize) -> Result<(), ArmaError> {
    if expected != actual {
        return Err(ArmaError::LengthMismatch { expected, actual });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn ar1_residuals() {
        let model = ArmaModel::new(vec![0.5], vec![], 1.0).unwrap();
        let y = [1.0, 0.5, 1.5, -0.2];
        let mut f = AnsleyFilter::new();
        assert_eq!(f.initialize(&model, 4).unwrap(), 4);
        let e = f.filter(&y).unwrap();
        assert_abs_diff_eq!(e[0], 0.75_f64.sqrt(), epsilon = 1e-14);
        assert_abs_diff_eq!(e[1], 0.0, epsilon = 1e-14);
        assert_abs_diff_eq!(e[2], 1.25, epsilon = 1e-14);
        assert_abs_diff_eq!(e[3], -0.95, epsilon = 1e-14);
        assert_abs_diff_eq!(f.log_determinant(), (4.0_f64 / 3.0).ln(), epsilon = 1e-14);
    }

    #[test]
    fn white_noise_is_scaling() {
        let model = ArmaModel::white_noise(4.0).unwrap();
        let y = [1.0, -3.0, 0.7];
        let mut f = AnsleyFilter::new();
        f.initialize(&model, 3).unwrap();
        let e = f.filter(&y).unwrap();
        assert_eq!(e, vec![1.0 / 2.0, -3.0 / 2.0, 0.7 / 2.0]);
        assert_abs_diff_eq!(f.log_determinant(), 3.0 * 4.0_f64.ln(), epsilon = 1e-14);
    }

    #[test]
    fn ma1_log_determinant() {
        // |Cov| of MA(1) with unit variance over n points:
        // D_n = (1 + θ²) D_{n-1} - θ² D_{n-2}.
        let theta = 0.6_f64;
        let model = ArmaModel::new(vec![], vec![theta], 1.0).unwrap();
        let mut f = AnsleyFilter::new();
        f.initialize(&model, 5).unwrap();
        let (mut d0, mut d1) = (1.0, 1.0 + theta * theta);
        for _ in 2..=5 {
            let d2 = (1.0 + theta * theta) * d1 - theta * theta * d0;
            d0 = d1;
            d1 = d2;
        }
        assert_abs_diff_eq!(f.log_determinant(), d1.ln(), epsilon = 1e-12);
    }

    #[test]
    fn wrong_length_and_empty() {
        let model = ArmaModel::new(vec![0.3], vec![0.2], 1.0).unwrap();
        let mut f = AnsleyFilter::new();
        assert!(matches!(f.filter(&[1.0]), Err(ArmaError::NotInitialized)));
        assert!(matches!(f.initialize(&model, 0), Err(ArmaError::EmptyData)));
        f.initialize(&model, 3).unwrap();
        assert!(matches!(
            f.filter(&[1.0, 2.0]),
            Err(ArmaError::LengthMismatch {
                expected: 3,
                actual: 2
            })
        ));
    }

    #[test]
    fn non_stationary_is_infeasible() {
        let model = ArmaModel::new(vec![1.1], vec![], 1.0).unwrap();
        let err = AnsleyFilter::new().initialize(&model, 10).unwrap_err();
        assert!(err.is_infeasible());
    }
}
