//! ARMA(p,q) process definition and its second-order structure.

use ceres_matrix::{LuDecomposition, MatrixError, cholesky_lower};
use ndarray::{Array1, Array2};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::error::ArmaError;
use crate::polynomial::Polynomial;

/// Zero-mean ARMA(p,q) process
/// `y_t = Σ φ_i y_{t-i} + ε_t + Σ θ_j ε_{t-j}`, `ε_t ~ N(0, σ²)`.
///
/// # Example
///
/// ```
/// use ceres_arma::ArmaModel;
///
/// let model = ArmaModel::new(vec![0.5], vec![], 1.0).unwrap();
/// let gamma = model.autocovariances(2).unwrap();
/// assert!((gamma[0] - 4.0 / 3.0).abs() < 1e-12);
/// assert!((gamma[1] - 2.0 / 3.0).abs() < 1e-12);
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct ArmaModel {
    phi: Vec<f64>,
    theta: Vec<f64>,
    variance: f64,
}

impl ArmaModel {
    /// Builds a model from AR coefficients `phi`, MA coefficients `theta`
    /// and innovation variance `variance`.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`ArmaError::InvalidVariance`] | `variance` not finite or `<= 0` |
    /// | [`ArmaError::NonFiniteData`] | a coefficient is NaN or infinite |
    pub fn new(phi: Vec<f64>, theta: Vec<f64>, variance: f64) -> Result<Self, ArmaError> {
        if !variance.is_finite() || variance <= 0.0 {
            return Err(ArmaError::InvalidVariance { variance });
        }
        if phi.iter().chain(&theta).any(|c| !c.is_finite()) {
            return Err(ArmaError::NonFiniteData);
        }
        Ok(Self {
            phi,
            theta,
            variance,
        })
    }

    /// White noise with the given variance.
    pub fn white_noise(variance: f64) -> Result<Self, ArmaError> {
        Self::new(Vec::new(), Vec::new(), variance)
    }

    /// Builds a model from its AR polynomial `Φ(B)` and MA polynomial
    /// `Θ(B)`, both with constant term 1.
    ///
    /// # Errors
    ///
    /// [`ArmaError::InvalidPolynomial`] when a constant term is not 1, plus
    /// the errors of [`ArmaModel::new()`].
    pub fn from_polynomials(ar: &Polynomial, ma: &Polynomial, variance: f64) -> Result<Self, ArmaError> {
        for poly in [ar, ma] {
            let c0 = poly.get(0);
            if c0 != 1.0 {
                return Err(ArmaError::InvalidPolynomial { constant: c0 });
            }
        }
        let phi = (1..=ar.degree()).map(|i| -ar.get(i)).collect();
        let theta = (1..=ma.degree()).map(|i| ma.get(i)).collect();
        Self::new(phi, theta, variance)
    }

    /// Same coefficients with another innovation variance.
    pub fn with_variance(&self, variance: f64) -> Result<Self, ArmaError> {
        Self::new(self.phi.clone(), self.theta.clone(), variance)
    }

    /// AR order.
    pub fn p(&self) -> usize {
        self.phi.len()
    }

    /// MA order.
    pub fn q(&self) -> usize {
        self.theta.len()
    }

    /// AR coefficients.
    pub fn phi(&self) -> &[f64] {
        &self.phi
    }

    /// MA coefficients.
    pub fn theta(&self) -> &[f64] {
        &self.theta
    }

    /// Innovation variance `σ²`.
    pub fn variance(&self) -> f64 {
        self.variance
    }

    /// Innovation standard deviation `σ`.
    pub fn sigma(&self) -> f64 {
        self.variance.sqrt()
    }

    /// `Φ(B) = 1 - Σ φ_i Bⁱ`.
    pub fn ar_polynomial(&self) -> Polynomial {
        Polynomial::from_ar(&self.phi)
    }

    /// `Θ(B) = 1 + Σ θ_j Bʲ`.
    pub fn ma_polynomial(&self) -> Polynomial {
        Polynomial::from_ma(&self.theta)
    }

    /// `true` for p = q = 0.
    pub fn is_white_noise(&self) -> bool {
        self.phi.is_empty() && self.theta.is_empty()
    }

    /// `true` when the AR polynomial has all roots outside the unit circle.
    pub fn is_stationary(&self) -> bool {
        self.ar_polynomial().is_stationary()
    }

    /// `true` when the MA polynomial has all roots outside the unit circle.
    pub fn is_invertible(&self) -> bool {
        self.ma_polynomial().is_stationary()
    }

    /// `θ_j` with `θ_0 = 1` and zero beyond q.
    pub(crate) fn theta_at(&self, j: usize) -> f64 {
        match j {
            0 => 1.0,
            j if j <= self.theta.len() => self.theta[j - 1],
            _ => 0.0,
        }
    }

    /// First `count` weights of the MA(∞) representation
    /// `y_t = Σ ψ_j ε_{t-j}`: `ψ_0 = 1`, `ψ_j = θ_j + Σ φ_i ψ_{j-i}`.
    pub fn psi_weights(&self, count: usize) -> Vec<f64> {
        let mut psi = vec![0.0; count];
        for j in 0..count {
            let mut v = self.theta_at(j);
            for (i, phi) in self.phi.iter().enumerate().take(j) {
                v += phi * psi[j - i - 1];
            }
            psi[j] = v;
        }
        psi
    }

    /// Autocovariances `γ_0 … γ_{count-1}`.
    ///
    /// Solves the `(p+1)` linear equations
    /// `γ_k - Σ φ_i γ_{|k-i|} = σ² Σ_{j=k}^{q} θ_j ψ_{j-k}` for
    /// `γ_0 … γ_p`, then extends by the same recursion.
    ///
    /// # Errors
    ///
    /// [`ArmaError::NonStationary`] when the AR polynomial is not
    /// stationary or the system is singular.
    pub fn autocovariances(&self, count: usize) -> Result<Vec<f64>, ArmaError> {
        if !self.is_stationary() {
            return Err(ArmaError::NonStationary);
        }
        let p = self.p();
        let q = self.q();
        let psi = self.psi_weights(q + 1);
        let rhs = |k: usize| -> f64 {
            if k > q {
                0.0
            } else {
                self.variance * (k..=q).map(|j| self.theta_at(j) * psi[j - k]).sum::<f64>()
            }
        };

        let mut a = Array2::<f64>::zeros((p + 1, p + 1));
        let mut b = Array1::<f64>::zeros(p + 1);
        for k in 0..=p {
            a[[k, k]] += 1.0;
            for (i, phi) in self.phi.iter().enumerate() {
                let lag = k.abs_diff(i + 1);
                a[[k, lag]] -= phi;
            }
            b[k] = rhs(k);
        }
        let lu = LuDecomposition::new(a.view()).map_err(|err| match err {
            MatrixError::Singular { .. } => ArmaError::NonStationary,
            other => ArmaError::Matrix(other),
        })?;
        let head = lu.solve(b.view())?;

        let mut gamma = vec![0.0; count.max(p + 1)];
        for (g, h) in gamma.iter_mut().zip(head.iter()) {
            *g = *h;
        }
        for k in p + 1..gamma.len() {
            let mut v = rhs(k);
            for (i, phi) in self.phi.iter().enumerate() {
                v += phi * gamma[k - i - 1];
            }
            gamma[k] = v;
        }
        gamma.truncate(count);
        Ok(gamma)
    }

    /// Unit-variance covariance of the pre-sample vector
    /// `(y_{-1..-p}, ε_{-1..-q})`.
    pub(crate) fn presample_covariance(&self) -> Result<Array2<f64>, ArmaError> {
        let p = self.p();
        let q = self.q();
        let unit = self.with_variance(1.0)?;
        let gamma = unit.autocovariances(p.max(1))?;
        let psi = unit.psi_weights(q + 1);
        let mut omega = Array2::<f64>::zeros((p + q, p + q));
        for i in 0..p {
            for j in 0..p {
                omega[[i, j]] = gamma[i.abs_diff(j)];
            }
            // cov(y_{-(i+1)}, ε_{-(j+1)}) = ψ_{j-i} for j >= i.
            for j in i..q {
                omega[[i, p + j]] = psi[j - i];
                omega[[p + j, i]] = psi[j - i];
            }
        }
        for j in 0..q {
            omega[[p + j, p + j]] = 1.0;
        }
        Ok(omega)
    }

    /// Draws `n` consecutive values of the stationary process.
    ///
    /// The pre-sample `(y_{-1..-p}, ε_{-1..-q})` is drawn from its exact
    /// joint distribution, so the path is stationary from its first value.
    ///
    /// # Errors
    ///
    /// [`ArmaError::NonStationary`] when the AR polynomial is not
    /// stationary.
    pub fn sample_path<R: Rng + ?Sized>(&self, n: usize, rng: &mut R) -> Result<Vec<f64>, ArmaError> {
        let p = self.p();
        let k = p + self.q();
        let sigma = self.sigma();
        let mut start = vec![0.0; k];
        if k > 0 {
            let mut r = self.presample_covariance()?;
            cholesky_lower(r.view_mut())?;
            let u: Vec<f64> = (0..k).map(|_| StandardNormal.sample(rng)).collect();
            for (i, x) in start.iter_mut().enumerate() {
                *x = sigma * (0..=i).map(|j| r[[i, j]] * u[j]).sum::<f64>();
            }
        }
        let (ys, es) = start.split_at(p);

        let mut y = Vec::with_capacity(n);
        let mut eps = Vec::with_capacity(n);
        for t in 0..n {
            let e: f64 = sigma * Distribution::<f64>::sample(&StandardNormal, rng);
            let mut v = e;
            for (i, c) in self.phi.iter().enumerate() {
                let lag = i + 1;
                v += c * if t >= lag { y[t - lag] } else { ys[lag - t - 1] };
            }
            for (j, c) in self.theta.iter().enumerate() {
                let lag = j + 1;
                v += c * if t >= lag { eps[t - lag] } else { es[lag - t - 1] };
            }
            y.push(v);
            eps.push(e);
        }
        Ok(y)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn rejects_bad_variance() {
        assert!(matches!(
            ArmaModel::new(vec![0.5], vec![], 0.0),
            Err(ArmaError::InvalidVariance { .. })
        ));
        assert!(matches!(
            ArmaModel::white_noise(f64::NAN),
            Err(ArmaError::InvalidVariance { .. })
        ));
        assert!(matches!(
            ArmaModel::new(vec![f64::NAN], vec![], 1.0),
            Err(ArmaError::NonFiniteData)
        ));
    }

    #[test]
    fn polynomial_round_trip() {
        let m = ArmaModel::new(vec![0.5, -0.2], vec![0.3], 2.0).unwrap();
        let back = ArmaModel::from_polynomials(&m.ar_polynomial(), &m.ma_polynomial(), 2.0).unwrap();
        assert_eq!(m, back);
        let bad = Polynomial::new(vec![2.0, 1.0]);
        assert!(matches!(
            ArmaModel::from_polynomials(&bad, &Polynomial::one(), 1.0),
            Err(ArmaError::InvalidPolynomial { .. })
        ));
    }

    #[test]
    fn psi_weights_arma11() {
        // psi_j = (phi + theta) phi^{j-1} for j >= 1.
        let m = ArmaModel::new(vec![0.5], vec![0.4], 1.0).unwrap();
        let psi = m.psi_weights(4);
        assert_abs_diff_eq!(psi[0], 1.0);
        assert_abs_diff_eq!(psi[1], 0.9, epsilon = 1e-15);
        assert_abs_diff_eq!(psi[2], 0.45, epsilon = 1e-15);
        assert_abs_diff_eq!(psi[3], 0.225, epsilon = 1e-15);
    }

    #[test]
    fn autocovariances_ma2() {
        let m = ArmaModel::new(vec![], vec![0.5, -0.25], 2.0).unwrap();
        let g = m.autocovariances(4).unwrap();
        assert_abs_diff_eq!(g[0], 2.0 * (1.0 + 0.25 + 0.0625), epsilon = 1e-14);
        assert_abs_diff_eq!(g[1], 2.0 * (0.5 - 0.125), epsilon = 1e-14);
        assert_abs_diff_eq!(g[2], 2.0 * -0.25, epsilon = 1e-14);
        assert_abs_diff_eq!(g[3], 0.0);
    }

    #[test]
    fn autocovariances_arma11() {
        let (phi, theta) = (0.5, 0.4);
        let m = ArmaModel::new(vec![phi], vec![theta], 1.0).unwrap();
        let g = m.autocovariances(3).unwrap();
        let g0 = (1.0 + 2.0 * phi * theta + theta * theta) / (1.0 - phi * phi);
        let g1 = (1.0 + phi * theta) * (phi + theta) / (1.0 - phi * phi);
        assert_abs_diff_eq!(g[0], g0, epsilon = 1e-13);
        assert_abs_diff_eq!(g[1], g1, epsilon = 1e-13);
        assert_abs_diff_eq!(g[2], phi * g1, epsilon = 1e-13);
    }

    #[test]
    fn autocovariances_ar2_yule_walker() {
        let m = ArmaModel::new(vec![0.6, -0.3], vec![], 1.0).unwrap();
        let g = m.autocovariances(5).unwrap();
        for k in 2..5 {
            assert_abs_diff_eq!(g[k], 0.6 * g[k - 1] - 0.3 * g[k - 2], epsilon = 1e-13);
        }
        assert_abs_diff_eq!(g[0], 0.6 * g[1] - 0.3 * g[2] + 1.0, epsilon = 1e-13);
    }

    #[test]
    fn non_stationary_rejected() {
        let m = ArmaModel::new(vec![1.0], vec![], 1.0).unwrap();
        assert!(matches!(m.autocovariances(3), Err(ArmaError::NonStationary)));
        assert!(!m.is_stationary());
        assert!(ArmaModel::new(vec![], vec![2.0], 1.0).map(|m| !m.is_invertible()).unwrap());
    }

    #[test]
    fn truncates_to_count() {
        let m = ArmaModel::new(vec![0.5, 0.1], vec![], 1.0).unwrap();
        assert_eq!(m.autocovariances(1).unwrap().len(), 1);
        assert!(m.autocovariances(0).unwrap().is_empty());
    }

    #[test]
    fn sample_path_starts_stationary() {
        use rand::SeedableRng;

        // Var(y_0) = 1 / (1 - 0.81) without any burn-in.
        let m = ArmaModel::new(vec![0.9], vec![], 1.0).unwrap();
        let mut rng = rand::rngs::StdRng::seed_from_u64(17);
        let first: Vec<f64> = (0..4000).map(|_| m.sample_path(1, &mut rng).unwrap()[0]).collect();
        let var = first.iter().map(|v| v * v).sum::<f64>() / first.len() as f64;
        assert!((var - 1.0 / 0.19).abs() < 0.6, "var = {var}");
    }

    #[test]
    fn sample_path_rejects_unit_root() {
        use rand::SeedableRng;

        let m = ArmaModel::new(vec![1.0], vec![0.2], 1.0).unwrap();
        let mut rng = rand::rngs::StdRng::seed_from_u64(1);
        assert!(matches!(m.sample_path(5, &mut rng), Err(ArmaError::NonStationary)));
        let wn = ArmaModel::white_noise(4.0).unwrap();
        assert_eq!(wn.sample_path(3, &mut rng).unwrap().len(), 3);
    }
}
