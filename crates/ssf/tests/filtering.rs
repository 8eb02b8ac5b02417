//! The diffuse filter reproduces the exact likelihoods computed elsewhere.

use approx::{assert_abs_diff_eq, assert_relative_eq};
use ceres_arma::{ArmaFilterKind, ArmaLikelihood, ArmaModel, ArmaSpec};
use ceres_ssf::{
    ArimaSsf, ArmaSsf, Component, Composite, KalmanFilter, KalmanOptions, LocalLevel,
    LocalLinearTrend, SsfError, log_likelihoods,
};
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};

fn noise(n: usize, seed: u64) -> Vec<f64> {
    let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
    (0..n).map(|_| StandardNormal.sample(&mut rng)).collect()
}

fn assert_matches_arma(model: &ArmaModel, y: &[f64]) {
    let exact = ArmaLikelihood::evaluate(model, y, ArmaFilterKind::Ansley).unwrap();
    let ssf = ArmaSsf::new(model).unwrap();
    let res = KalmanFilter::default().filter_univariate(&ssf, y).unwrap();
    let ll = res.likelihood();
    assert_eq!(res.diffuse_end(), 0);
    assert_eq!(ll.n_diffuse(), 0);
    assert_eq!(ll.n_obs(), y.len());
    assert_relative_eq!(ll.ssq(), exact.ssq(), max_relative = 1e-9);
    assert_relative_eq!(ll.log_det(), exact.log_determinant(), max_relative = 1e-9, epsilon = 1e-10);
    assert_relative_eq!(ll.log_likelihood(), exact.log_likelihood(), max_relative = 1e-9);
}

#[test]
fn arma_likelihood_agrees_with_band_cholesky() {
    assert_matches_arma(&ArmaModel::new(vec![0.6], vec![0.3], 1.7).unwrap(), &noise(40, 1));
    assert_matches_arma(&ArmaModel::new(vec![], vec![0.5, -0.3], 0.8).unwrap(), &noise(30, 2));
    assert_matches_arma(&ArmaModel::new(vec![0.4, -0.3], vec![0.7], 2.5).unwrap(), &noise(25, 3));
}

#[test]
fn kalman_likelihood_at_fitted_arma() {
    let truth = ArmaModel::new(vec![0.5], vec![0.3], 1.0).unwrap();
    let y = truth
        .sample_path(200, &mut rand::rngs::StdRng::seed_from_u64(8))
        .unwrap();
    let fit = ArmaSpec::new(1, 1).fit(&y).unwrap();
    let centred: Vec<f64> = y.iter().map(|v| v - fit.mean()).collect();

    let ssf = ArmaSsf::new(fit.model()).unwrap();
    let kalman = KalmanFilter::default()
        .log_likelihood(&ssf, ndarray::aview1(centred.as_slice()).insert_axis(ndarray::Axis(1)))
        .unwrap();
    assert_relative_eq!(kalman.log_likelihood(), fit.log_likelihood(), max_relative = 1e-9);
    assert_relative_eq!(kalman.sigma2(), 1.0, max_relative = 1e-9);
}

#[test]
fn ar1_innovations() {
    let model = ArmaModel::new(vec![0.5], vec![], 1.0).unwrap();
    let ssf = ArmaSsf::new(&model).unwrap();
    let res = KalmanFilter::default()
        .filter_univariate(&ssf, &[1.0, 0.5, 1.5, -0.2])
        .unwrap();
    let std = res.standardized_residuals().unwrap();
    let expected = [0.75_f64.sqrt(), 0.0, 1.25, -0.95];
    for (a, b) in std.iter().zip(expected) {
        assert_abs_diff_eq!(*a, b, epsilon = 1e-12);
    }
    assert_abs_diff_eq!(res.likelihood().log_det(), (4.0_f64 / 3.0).ln(), epsilon = 1e-12);
}

#[test]
fn integrated_model_equals_differenced_arma() {
    let model = ArmaModel::new(vec![0.5], vec![-0.2], 1.3).unwrap();
    let w = noise(30, 4);
    let mut y = vec![10.0];
    for v in &w {
        let last = *y.last().unwrap();
        y.push(last + v);
    }
    let dy: Vec<f64> = y.windows(2).map(|p| p[1] - p[0]).collect();

    let ssf = ArimaSsf::integrated(&model, 1).unwrap();
    let res = KalmanFilter::default().filter_univariate(&ssf, &y).unwrap();
    let ll = res.likelihood();
    let exact = ArmaLikelihood::evaluate(&model, &dy, ArmaFilterKind::Ansley).unwrap();

    assert_eq!(res.diffuse_end(), 1);
    assert_eq!(ll.n_diffuse(), 1);
    assert_eq!(ll.n_effective(), dy.len());
    assert_abs_diff_eq!(ll.diffuse_log_det(), 0.0, epsilon = 1e-12);
    assert_relative_eq!(ll.ssq(), exact.ssq(), max_relative = 1e-9);
    assert_relative_eq!(ll.log_det(), exact.log_determinant(), max_relative = 1e-9, epsilon = 1e-10);
}

#[test]
fn level_plus_white_noise_component() {
    // White noise as an ARMA component is the observation error of the
    // local level.
    let y = noise(20, 5);
    let direct = LocalLevel::new(0.4, 2.0).unwrap();
    let parts: Vec<Component> = vec![
        Box::new(LocalLevel::new(0.4, 0.0).unwrap()),
        Box::new(ArmaSsf::new(&ArmaModel::white_noise(2.0).unwrap()).unwrap()),
    ];
    let composite = Composite::new(parts).unwrap();

    let kf = KalmanFilter::default();
    let a = kf.filter_univariate(&direct, &y).unwrap();
    let b = kf.filter_univariate(&composite, &y).unwrap();
    assert_eq!(a.likelihood().n_obs(), b.likelihood().n_obs());
    assert_relative_eq!(a.likelihood().ssq(), b.likelihood().ssq(), max_relative = 1e-10);
    assert_relative_eq!(a.likelihood().log_det(), b.likelihood().log_det(), max_relative = 1e-10);
    let sa = a.filtered_states().unwrap();
    let sb = b.filtered_states().unwrap();
    for pos in 0..y.len() {
        assert_abs_diff_eq!(sa[[pos, 0]], sb[[pos, 0]], epsilon = 1e-10);
    }
}

#[test]
fn trend_on_noisy_data() {
    let model = LocalLinearTrend::new(0.1, 0.01, 0.5).unwrap();
    let y: Vec<f64> = noise(50, 6)
        .iter()
        .enumerate()
        .map(|(t, e)| 0.3 * t as f64 + e)
        .collect();
    let res = KalmanFilter::default().filter_univariate(&model, &y).unwrap();
    let ll = res.likelihood();
    assert_eq!(res.diffuse_end(), 2);
    assert_eq!(ll.n_effective(), 48);
    assert!(ll.log_likelihood().is_finite());
    assert!(ll.sigma2() > 0.0);
    // The concentrated likelihood is the maximum over the scale.
    assert!(ll.concentrated_log_likelihood() >= ll.log_likelihood() - 1e-12);
}

#[test]
fn multivariate_observations() {
    // Two equations on the same model behave like two consecutive
    // observations without a transition in between.
    struct Twice(LocalLevel);

    impl ceres_ssf::Initialization for Twice {
        fn state_dim(&self) -> usize {
            1
        }
        fn diffuse_dim(&self) -> usize {
            1
        }
        fn pf0(&self, _pf: ndarray::ArrayViewMut2<'_, f64>) {}
        fn diffuse_constraints(&self, mut b: ndarray::ArrayViewMut2<'_, f64>) {
            b[[0, 0]] = 1.0;
        }
    }

    impl ceres_ssf::Dynamics for Twice {
        fn is_time_invariant(&self) -> bool {
            true
        }
        fn noise_dim(&self) -> usize {
            1
        }
        fn t(&self, _pos: usize, mut t: ndarray::ArrayViewMut2<'_, f64>) {
            t[[0, 0]] = 1.0;
        }
        fn s(&self, _pos: usize, mut s: ndarray::ArrayViewMut2<'_, f64>) {
            s[[0, 0]] = self.0.level_variance().sqrt();
        }
    }

    impl ceres_ssf::Measurement for Twice {
        fn equations(&self) -> usize {
            2
        }
        fn z(&self, _pos: usize, _eq: usize, mut z: ndarray::ArrayViewMut1<'_, f64>) {
            z[0] = 1.0;
        }
        fn error_variance(&self, _pos: usize, _eq: usize) -> f64 {
            self.0.noise_variance()
        }
    }

    let model = Twice(LocalLevel::new(0.5, 1.0).unwrap());
    let y = ndarray::array![[1.0, 2.0], [f64::NAN, 0.5]];
    let res = KalmanFilter::default().filter(&model, y.view()).unwrap();
    let ll = res.likelihood();
    assert_eq!(ll.n_obs(), 3);
    assert_eq!(ll.n_diffuse(), 1);
    // Second equation at pos 0: P = 1, F = 2, v = 1.
    // Pos 1: P = 0.5 + 0.5 = 1, F = 2, v = 0.5 - 1.5 = -1.
    assert_abs_diff_eq!(ll.ssq(), 0.5 + 0.5, epsilon = 1e-14);
    assert_abs_diff_eq!(ll.log_det(), 2.0 * 2.0_f64.ln(), epsilon = 1e-14);
}

#[test]
fn batch_keeps_order_and_failures() {
    let model = ArmaSsf::new(&ArmaModel::new(vec![0.5], vec![], 1.0).unwrap()).unwrap();
    let series: Vec<Vec<f64>> = (0..8).map(|i| noise(15 + i, 100 + i as u64)).collect();
    let mut with_bad = series.clone();
    with_bad.push(vec![1.0, f64::INFINITY]);

    let out = log_likelihoods(&model, &with_bad, &KalmanOptions::default());
    assert_eq!(out.len(), 9);
    for (y, ll) in series.iter().zip(&out) {
        assert_eq!(ll.as_ref().unwrap().n_obs(), y.len());
    }
    assert!(matches!(out[8], Err(SsfError::InvalidObservation { pos: 1, .. })));
}

#[test]
fn unit_root_arma_rejected() {
    let model = ArmaModel::new(vec![1.0], vec![], 1.0).unwrap();
    let err = ArmaSsf::new(&model).unwrap_err();
    assert!(err.is_infeasible(), "{err}");
}
