//! Basic structural models with fully diffuse initial states.

use ndarray::{ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2};

use crate::error::SsfError;
use crate::model::{Dynamics, Initialization, Measurement};

fn check_variance(name: &'static str, value: f64) -> Result<(), SsfError> {
    if !value.is_finite() || value < 0.0 {
        return Err(SsfError::InvalidParameter { name, value });
    }
    Ok(())
}

/// Random walk plus noise:
/// `y = μ + e`, `μ[pos+1] = μ[pos] + u`.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalLevel {
    level_variance: f64,
    noise_variance: f64,
}

impl LocalLevel {
    /// # Errors
    ///
    /// [`SsfError::InvalidParameter`] for a negative or non-finite variance.
    pub fn new(level_variance: f64, noise_variance: f64) -> Result<Self, SsfError> {
        check_variance("level_variance", level_variance)?;
        check_variance("noise_variance", noise_variance)?;
        Ok(Self {
            level_variance,
            noise_variance,
        })
    }

    /// Variance of the level disturbance.
    pub fn level_variance(&self) -> f64 {
        self.level_variance
    }

    /// Variance of the observation noise.
    pub fn noise_variance(&self) -> f64 {
        self.noise_variance
    }
}

impl Initialization for LocalLevel {
    fn state_dim(&self) -> usize {
        1
    }

    fn diffuse_dim(&self) -> usize {
        1
    }

    fn pf0(&self, _pf: ArrayViewMut2<'_, f64>) {}

    fn diffuse_constraints(&self, mut b: ArrayViewMut2<'_, f64>) {
        b[[0, 0]] = 1.0;
    }
}

impl Dynamics for LocalLevel {
    fn is_time_invariant(&self) -> bool {
        true
    }

    fn noise_dim(&self) -> usize {
        1
    }

    fn t(&self, _pos: usize, mut t: ArrayViewMut2<'_, f64>) {
        t[[0, 0]] = 1.0;
    }

    fn s(&self, _pos: usize, mut s: ArrayViewMut2<'_, f64>) {
        s[[0, 0]] = self.level_variance.sqrt();
    }

    fn tx(&self, _pos: usize, _x: ArrayViewMut1<'_, f64>) {}

    fn xt(&self, _pos: usize, _x: ArrayViewMut1<'_, f64>) {}

    fn tvt(&self, _pos: usize, _v: ArrayViewMut2<'_, f64>) {}

    fn add_v(&self, _pos: usize, mut p: ArrayViewMut2<'_, f64>) {
        p[[0, 0]] += self.level_variance;
    }
}

impl Measurement for LocalLevel {
    fn z(&self, _pos: usize, _eq: usize, mut z: ArrayViewMut1<'_, f64>) {
        z[0] = 1.0;
    }

    fn error_variance(&self, _pos: usize, _eq: usize) -> f64 {
        self.noise_variance
    }

    fn zx(&self, _pos: usize, _eq: usize, x: ArrayView1<'_, f64>) -> f64 {
        x[0]
    }

    fn zvz(&self, _pos: usize, _eq: usize, v: ArrayView2<'_, f64>) -> f64 {
        v[[0, 0]]
    }
}

/// Local linear trend:
/// `y = μ + e`, `μ[pos+1] = μ + β + u`, `β[pos+1] = β + w`.
#[derive(Clone, Debug, PartialEq)]
pub struct LocalLinearTrend {
    level_variance: f64,
    slope_variance: f64,
    noise_variance: f64,
}

impl LocalLinearTrend {
    /// # Errors
    ///
    /// [`SsfError::InvalidParameter`] for a negative or non-finite variance.
    pub fn new(level_variance: f64, slope_variance: f64, noise_variance: f64) -> Result<Self, SsfError> {
        check_variance("level_variance", level_variance)?;
        check_variance("slope_variance", slope_variance)?;
        check_variance("noise_variance", noise_variance)?;
        Ok(Self {
            level_variance,
            slope_variance,
            noise_variance,
        })
    }

    /// Variance of the level disturbance.
    pub fn level_variance(&self) -> f64 {
        self.level_variance
    }

    /// Variance of the slope disturbance.
    pub fn slope_variance(&self) -> f64 {
        self.slope_variance
    }

    /// Variance of the observation noise.
    pub fn noise_variance(&self) -> f64 {
        self.noise_variance
    }
}

impl Initialization for LocalLinearTrend {
    fn state_dim(&self) -> usize {
        2
    }

    fn diffuse_dim(&self) -> usize {
        2
    }

    fn pf0(&self, _pf: ArrayViewMut2<'_, f64>) {}

    fn diffuse_constraints(&self, mut b: ArrayViewMut2<'_, f64>) {
        b[[0, 0]] = 1.0;
        b[[1, 1]] = 1.0;
    }
}

impl Dynamics for LocalLinearTrend {
    fn is_time_invariant(&self) -> bool {
        true
    }

    fn noise_dim(&self) -> usize {
        2
    }

    fn t(&self, _pos: usize, mut t: ArrayViewMut2<'_, f64>) {
        t[[0, 0]] = 1.0;
        t[[0, 1]] = 1.0;
        t[[1, 1]] = 1.0;
    }

    fn s(&self, _pos: usize, mut s: ArrayViewMut2<'_, f64>) {
        s[[0, 0]] = self.level_variance.sqrt();
        s[[1, 1]] = self.slope_variance.sqrt();
    }

    fn tx(&self, _pos: usize, mut x: ArrayViewMut1<'_, f64>) {
        x[0] += x[1];
    }

    fn xt(&self, _pos: usize, mut x: ArrayViewMut1<'_, f64>) {
        x[1] += x[0];
    }

    fn add_v(&self, _pos: usize, mut p: ArrayViewMut2<'_, f64>) {
        p[[0, 0]] += self.level_variance;
        p[[1, 1]] += self.slope_variance;
    }
}

impl Measurement for LocalLinearTrend {
    fn z(&self, _pos: usize, _eq: usize, mut z: ArrayViewMut1<'_, f64>) {
        z[0] = 1.0;
    }

    fn error_variance(&self, _pos: usize, _eq: usize) -> f64 {
        self.noise_variance
    }

    fn zx(&self, _pos: usize, _eq: usize, x: ArrayView1<'_, f64>) -> f64 {
        x[0]
    }

    fn zvz(&self, _pos: usize, _eq: usize, v: ArrayView2<'_, f64>) -> f64 {
        v[[0, 0]]
    }

    fn xpzd(&self, _pos: usize, _eq: usize, mut x: ArrayViewMut1<'_, f64>, d: f64) {
        x[0] += d;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{diffuse_covariance, transition};
    use ndarray::{Array2, array};

    #[test]
    fn rejects_negative_variance() {
        assert!(matches!(
            LocalLevel::new(-1.0, 1.0),
            Err(SsfError::InvalidParameter {
                name: "level_variance",
                ..
            })
        ));
        assert!(LocalLinearTrend::new(1.0, f64::NAN, 1.0).is_err());
    }

    #[test]
    fn trend_fast_paths_match_dense() {
        let m = LocalLinearTrend::new(0.3, 0.1, 1.0).unwrap();
        let t = transition(&m, 0, 2);
        assert_eq!(t, array![[1.0, 1.0], [0.0, 1.0]]);

        let mut p = array![[2.0, 0.5], [0.5, 1.0]];
        let expected = t.dot(&p).dot(&t.t());
        m.tvt(0, p.view_mut());
        assert_eq!(p, expected);

        let mut x = array![1.0, 2.0];
        m.xt(0, x.view_mut());
        assert_eq!(x, array![1.0, 3.0]);

        let mut v = Array2::zeros((2, 2));
        m.v(0, v.view_mut());
        let mut w = Array2::zeros((2, 2));
        m.add_v(0, w.view_mut());
        for (a, b) in v.iter().zip(w.iter()) {
            assert!((a - b).abs() < 1e-15);
        }
    }

    #[test]
    fn fully_diffuse() {
        let m = LocalLinearTrend::new(0.0, 0.0, 1.0).unwrap();
        assert_eq!(diffuse_covariance(&m), Array2::eye(2));
        let l = LocalLevel::new(1.0, 0.0).unwrap();
        assert_eq!(diffuse_covariance(&l), array![[1.0]]);
    }
}
