//! The exact diffuse smoother against a large proper prior, and on
//! temporally aggregated data.

use approx::assert_abs_diff_eq;
use ceres_ssf::{
    Cumulator, Dynamics, Initialization, KalmanFilter, LocalLevel, LocalLinearTrend, Measurement,
    Ssf, run_univariate, simulate, smooth,
};
use ndarray::{ArrayView1, ArrayViewMut1, ArrayViewMut2};
use rand::SeedableRng;

/// `inner` with its diffuse part replaced by a proper prior of scale `kappa`.
struct Proper<M> {
    inner: M,
    kappa: f64,
}

impl<M: Ssf> Initialization for Proper<M> {
    fn state_dim(&self) -> usize {
        self.inner.state_dim()
    }
    fn pf0(&self, mut pf: ArrayViewMut2<'_, f64>) {
        self.inner.pf0(pf.view_mut());
        let mut pi = ndarray::Array2::zeros(pf.raw_dim());
        self.inner.pi0(pi.view_mut());
        pf.scaled_add(self.kappa, &pi);
    }
}

impl<M: Ssf> Dynamics for Proper<M> {
    fn is_time_invariant(&self) -> bool {
        self.inner.is_time_invariant()
    }
    fn noise_dim(&self) -> usize {
        self.inner.noise_dim()
    }
    fn t(&self, pos: usize, t: ArrayViewMut2<'_, f64>) {
        self.inner.t(pos, t);
    }
    fn s(&self, pos: usize, s: ArrayViewMut2<'_, f64>) {
        self.inner.s(pos, s);
    }
}

impl<M: Ssf> Measurement for Proper<M> {
    fn z(&self, pos: usize, eq: usize, z: ArrayViewMut1<'_, f64>) {
        self.inner.z(pos, eq, z);
    }
    fn error_variance(&self, pos: usize, eq: usize) -> f64 {
        self.inner.error_variance(pos, eq)
    }
    fn zx(&self, pos: usize, eq: usize, x: ArrayView1<'_, f64>) -> f64 {
        self.inner.zx(pos, eq, x)
    }
}

/// Largest absolute difference between the exact diffuse smoother and the
/// proper-prior smoother with scale `kappa`.
fn distance_to_proper<M: Ssf + Clone>(model: &M, y: &[f64], kappa: f64) -> f64 {
    let exact = run_univariate(model, y).unwrap();
    let proper = Proper {
        inner: model.clone(),
        kappa,
    };
    let approx = run_univariate(&proper, y).unwrap();
    assert_eq!(approx.filtered.diffuse_end(), 0);
    let mut worst: f64 = 0.0;
    for pos in 0..y.len() {
        for (a, b) in exact.smoothed.state(pos).iter().zip(approx.smoothed.state(pos)) {
            worst = worst.max((a - b).abs());
        }
        for (a, b) in exact.smoothed.variance(pos).iter().zip(approx.smoothed.variance(pos)) {
            worst = worst.max((a - b).abs());
        }
    }
    worst
}

/// The proper prior converges to the diffuse limit as `1/kappa` while its
/// rounding error grows as `kappa²`, so the comparison uses a moderate
/// scale and checks the trend towards the exact result.
fn assert_close_to_proper<M: Ssf + Clone>(model: &M, y: &[f64]) {
    let coarse = distance_to_proper(model, y, 1e2);
    let fine = distance_to_proper(model, y, 1e4);
    assert!(fine < 1e-3, "distance {fine} at kappa 1e4");
    assert!(fine < coarse / 10.0, "no convergence: {coarse} -> {fine}");
}

#[test]
fn level_matches_large_prior() {
    let model = LocalLevel::new(0.3, 0.8).unwrap();
    assert_close_to_proper(&model, &[0.4, 1.1, f64::NAN, 0.9, 1.6, 1.2]);
}

#[test]
fn trend_matches_large_prior() {
    let model = LocalLinearTrend::new(0.2, 0.05, 0.6).unwrap();
    assert_close_to_proper(&model, &[1.0, 1.8, 3.1, f64::NAN, 4.6, 6.2, 6.9, 8.3]);
}

#[test]
fn trend_with_missing_start() {
    // The diffuse phase spans the gap and ends only at the third position.
    let model = LocalLinearTrend::new(0.2, 0.05, 0.6).unwrap();
    let y = [f64::NAN, 1.0, f64::NAN, 2.5, 3.0];
    let out = run_univariate(&model, &y).unwrap();
    assert_eq!(out.filtered.diffuse_end(), 4);
    assert_close_to_proper(&model, &y);
}

#[test]
fn exact_line_is_recovered() {
    let model = LocalLinearTrend::new(0.1, 0.01, 0.5).unwrap();
    let y: Vec<f64> = (0..8).map(|t| 1.0 + 2.0 * t as f64).collect();
    let out = run_univariate(&model, &y).unwrap();
    assert_abs_diff_eq!(out.likelihood.ssq(), 0.0, epsilon = 1e-18);
    for pos in 0..y.len() {
        assert_abs_diff_eq!(out.smoothed.state(pos)[0], y[pos], epsilon = 1e-9);
        assert_abs_diff_eq!(out.smoothed.state(pos)[1], 2.0, epsilon = 1e-9);
    }
}

#[test]
fn cumulated_flows_reproduce_totals() {
    let base = LocalLevel::new(0.5, 0.0).unwrap();
    let model = Cumulator::new(base, 3).unwrap();
    let totals = [3.0, 4.5, 2.0, 6.0, 5.1];
    let mut y = vec![f64::NAN; 3 * totals.len()];
    for (i, total) in totals.iter().enumerate() {
        y[3 * i + 2] = *total;
    }

    let filtered = KalmanFilter::default().filter_univariate(&model, &y).unwrap();
    assert_eq!(filtered.diffuse_end(), 3);
    assert_abs_diff_eq!(filtered.likelihood().diffuse_log_det(), 9.0_f64.ln(), epsilon = 1e-12);

    let smoothed = smooth(&model, &filtered).unwrap();
    let signal = smoothed.signal(&model, 0);
    for (i, total) in totals.iter().enumerate() {
        assert_abs_diff_eq!(signal[3 * i + 2], *total, epsilon = 1e-8);
    }
    // The high-frequency levels of a period add up to its total.
    let level = smoothed.component(1);
    for (i, total) in totals.iter().enumerate() {
        let sum: f64 = (0..3).map(|k| level[3 * i + k]).sum();
        assert_abs_diff_eq!(sum, *total, epsilon = 1e-8);
    }
}

#[test]
fn smoothing_simulated_trend() {
    let model = LocalLinearTrend::new(0.3, 0.02, 1.0).unwrap();
    let mut rng = rand::rngs::StdRng::seed_from_u64(21);
    let y = simulate(&model, 40, &mut rng).unwrap();
    let series: Vec<f64> = y.column(0).to_vec();
    let out = run_univariate(&model, &series).unwrap();
    assert_eq!(out.smoothed.len(), 40);
    for pos in 0..40 {
        let v = out.smoothed.variance(pos);
        assert!(v[[0, 0]] > 0.0 && v[[1, 1]] > 0.0);
        // Smoothing never increases the filtered uncertainty.
        let f = out.filtered.filtered_variances().unwrap();
        assert!(v[[0, 0]] <= f[[pos, 0, 0]] + 1e-10);
    }
}
