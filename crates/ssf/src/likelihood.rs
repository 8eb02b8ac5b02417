//! Diffuse Gaussian log-likelihood accumulated by the Kalman filter.

use std::f64::consts::PI;

/// Likelihood terms of one filtering run.
///
/// Ordinary updates contribute `ln f + v²/f`; diffuse updates contribute
/// `ln f∞`. Observations that are missing or exactly constrained
/// (`f ≈ 0`) contribute nothing.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DiffuseLikelihood {
    n_obs: usize,
    n_diffuse: usize,
    ssq: f64,
    log_det: f64,
    diffuse_log_det: f64,
}

impl DiffuseLikelihood {
    pub(crate) fn add(&mut self, v: f64, f: f64) {
        self.n_obs += 1;
        self.ssq += v * v / f;
        self.log_det += f.ln();
    }

    pub(crate) fn add_diffuse(&mut self, f_inf: f64) {
        self.n_obs += 1;
        self.n_diffuse += 1;
        self.diffuse_log_det += f_inf.ln();
    }

    /// Observations that entered the likelihood, diffuse ones included.
    pub fn n_obs(&self) -> usize {
        self.n_obs
    }

    /// Observations absorbed by the diffuse initialization.
    pub fn n_diffuse(&self) -> usize {
        self.n_diffuse
    }

    /// `n_obs - n_diffuse`.
    pub fn n_effective(&self) -> usize {
        self.n_obs - self.n_diffuse
    }

    /// `Σ v²/f` over ordinary updates.
    pub fn ssq(&self) -> f64 {
        self.ssq
    }

    /// `Σ ln f` over ordinary updates.
    pub fn log_det(&self) -> f64 {
        self.log_det
    }

    /// `Σ ln f∞` over diffuse updates.
    pub fn diffuse_log_det(&self) -> f64 {
        self.diffuse_log_det
    }

    /// `-½(n_obs ln 2π + log_det + ssq + diffuse_log_det)`.
    pub fn log_likelihood(&self) -> f64 {
        -0.5 * (self.n_obs as f64 * (2.0 * PI).ln() + self.log_det + self.ssq + self.diffuse_log_det)
    }

    /// ML estimate of a common scale of the stationary covariances,
    /// `ssq / n_effective`. `NaN` when every observation was diffuse.
    pub fn sigma2(&self) -> f64 {
        self.ssq / self.n_effective() as f64
    }

    /// Log-likelihood with the scale concentrated out.
    pub fn concentrated_log_likelihood(&self) -> f64 {
        let m = self.n_effective() as f64;
        -0.5 * (self.n_obs as f64 * (2.0 * PI).ln()
            + m * (1.0 + self.sigma2().ln())
            + self.log_det
            + self.diffuse_log_det)
    }
}
