//! Exact maximum likelihood for ARMA orders.
//!
//! The innovation variance is profiled out: for unit-variance coefficients
//! the filter's `ssq / n` is its ML estimate, so Nelder-Mead (`argmin`)
//! searches only the `p + q` PACF parameters, starting from white noise.

use argmin::core::{CostFunction, Executor};
use argmin::solver::neldermead::NelderMead;
use tracing::{debug, warn};

use crate::config::FitOptions;
use crate::error::ArmaError;
use crate::filter::{ArmaFilter, ArmaFilterKind, ArmaFilterStrategy};
use crate::fit::ArmaFit;
use crate::likelihood::ArmaLikelihood;
use crate::model::ArmaModel;
use crate::params::unconstrained_to_coeffs;
use crate::spec::ArmaSpec;

/// Offset of the non-origin simplex vertices, in PACF parameter units.
const SIMPLEX_STEP: f64 = 0.5;

/// Checks `data` for an ARMA(p,q) fit and returns it centred, with its mean.
fn centre(p: usize, q: usize, data: &[f64]) -> Result<(Vec<f64>, f64), ArmaError> {
    let Some(first) = data.first() else {
        return Err(ArmaError::EmptyData);
    };
    if !data.iter().all(|x| x.is_finite()) {
        return Err(ArmaError::NonFiniteData);
    }
    let min = p.max(q).max(1) + 1;
    if data.len() < min {
        return Err(ArmaError::InsufficientData { n: data.len(), min });
    }
    if data.iter().all(|x| x == first) {
        return Err(ArmaError::ConstantData);
    }
    let mean = data.iter().sum::<f64>() / data.len() as f64;
    Ok((data.iter().map(|x| x - mean).collect(), mean))
}

/// Unit-variance model from unconstrained parameters `[α; β]`. Both halves
/// go through the PACF map, so `Φ(B)` is stationary and `Θ(B)` (sign
/// flipped to the MA convention) is invertible.
fn unit_model(params: &[f64], p: usize) -> Result<ArmaModel, ArmaError> {
    let (alpha, beta) = params.split_at(p);
    let theta = unconstrained_to_coeffs(beta).into_iter().map(|m| -m).collect();
    ArmaModel::new(unconstrained_to_coeffs(alpha), theta, 1.0)
}

/// Negative concentrated log-likelihood; infeasible points cost `f64::MAX`.
#[derive(Clone, Copy)]
struct ProfileCost<'a> {
    centred: &'a [f64],
    p: usize,
    kind: ArmaFilterKind,
}

impl ProfileCost<'_> {
    fn profile(&self, params: &[f64]) -> Result<ArmaLikelihood, ArmaError> {
        ArmaLikelihood::evaluate(&unit_model(params, self.p)?, self.centred, self.kind)
    }
}

impl CostFunction for ProfileCost<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, params: &Vec<f64>) -> Result<f64, argmin::core::Error> {
        let value = self
            .profile(params)
            .map(|ll| -ll.concentrated_log_likelihood())
            .ok()
            .filter(|v| v.is_finite());
        Ok(value.unwrap_or(f64::MAX))
    }
}

fn minimise(cost: ProfileCost<'_>, dim: usize, options: &FitOptions) -> Result<Vec<f64>, ArmaError> {
    let simplex: Vec<Vec<f64>> = std::iter::once(vec![0.0; dim])
        .chain((0..dim).map(|i| {
            let mut vertex = vec![0.0; dim];
            vertex[i] = SIMPLEX_STEP;
            vertex
        }))
        .collect();
    let solver = NelderMead::new(simplex)
        .with_sd_tolerance(options.sd_tolerance())
        .map_err(|_| ArmaError::OptimizationFailed)?;
    let max_iters = options.max_iters();
    let outcome = Executor::new(cost, solver)
        .configure(|state| state.max_iters(max_iters))
        .run()
        .map_err(|err| {
            warn!(dim, error = %err, "Nelder-Mead run failed");
            ArmaError::OptimizationFailed
        })?;
    outcome
        .state()
        .best_param
        .clone()
        .ok_or(ArmaError::OptimizationFailed)
}

/// Centres `data`, maximises the concentrated exact likelihood of the
/// selected filter and rescales the optimum by its `ssq / n`.
#[tracing::instrument(level = "debug", skip(data, options), fields(n = data.len()))]
pub(crate) fn fit_arma(p: usize, q: usize, data: &[f64], options: &FitOptions) -> Result<ArmaFit, ArmaError> {
    options.validate()?;
    let (centred, mean) = centre(p, q, data)?;
    let kind = options.filter_for(p, q, centred.len());
    let cost = ProfileCost {
        centred: &centred,
        p,
        kind,
    };

    let best = if p + q == 0 {
        Vec::new()
    } else {
        minimise(cost, p + q, options)?
    };
    let profile = cost.profile(&best)?;
    let log_likelihood = profile.concentrated_log_likelihood();
    if !log_likelihood.is_finite() {
        warn!(p, q, "non-finite likelihood at the optimum");
        return Err(ArmaError::OptimizationFailed);
    }
    let model = unit_model(&best, p)?.with_variance(profile.sigma2())?;
    debug!(p, q, ?kind, log_likelihood, sigma2 = model.variance(), "ARMA fit converged");

    // Residuals on the data scale from the banded filter, whatever filter
    // drove the search.
    let mut banded = ArmaFilterStrategy::new(ArmaFilterKind::Ansley);
    banded.initialize(&model, centred.len())?;
    let sigma = model.sigma();
    let residuals = banded.filter(&centred)?.into_iter().map(|e| e * sigma).collect();

    Ok(ArmaFit::new(ArmaSpec::new(p, q), model, residuals, log_likelihood, mean))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rand::SeedableRng;

    fn path(phi: &[f64], theta: &[f64], n: usize, seed: u64) -> Vec<f64> {
        let model = ArmaModel::new(phi.to_vec(), theta.to_vec(), 1.0).unwrap();
        model
            .sample_path(n, &mut rand::rngs::StdRng::seed_from_u64(seed))
            .unwrap()
    }

    #[test]
    fn centre_checks_in_order() {
        assert!(matches!(centre(0, 3, &[f64::NAN]), Err(ArmaError::NonFiniteData)));
        assert!(matches!(
            centre(0, 3, &[1.0, 2.0, 3.0]),
            Err(ArmaError::InsufficientData { min: 4, .. })
        ));
        let (c, mean) = centre(0, 0, &[1.0, 3.0]).unwrap();
        assert_eq!(mean, 2.0);
        assert_eq!(c, vec![-1.0, 1.0]);
    }

    #[test]
    fn options_are_validated_first() {
        let opts = FitOptions::new().with_max_iters(0);
        let result = fit_arma(1, 0, &[], &opts);
        assert!(matches!(result, Err(ArmaError::InvalidOption { .. })));
    }

    #[test]
    fn white_noise_skips_the_search() {
        let y = path(&[], &[], 200, 42);
        let fit = fit_arma(0, 0, &y, &FitOptions::default()).unwrap();
        let n = y.len() as f64;
        let mean = y.iter().sum::<f64>() / n;
        let sigma2 = y.iter().map(|v| (v - mean) * (v - mean)).sum::<f64>() / n;
        assert_relative_eq!(fit.sigma2(), sigma2, max_relative = 1e-12);
        let closed = -0.5 * n * ((2.0 * std::f64::consts::PI).ln() + sigma2.ln() + 1.0);
        assert_relative_eq!(fit.log_likelihood(), closed, max_relative = 1e-12);
    }

    #[test]
    fn ar1_recovery_and_residual_length() {
        let y = path(&[0.7], &[], 1000, 123);
        let fit = fit_arma(1, 0, &y, &FitOptions::default()).unwrap();
        assert!((fit.ar()[0] - 0.7).abs() < 0.1, "phi = {}", fit.ar()[0]);
        assert_eq!(fit.residuals().len(), y.len());
    }

    #[test]
    fn optimum_beats_the_starting_point() {
        let y = path(&[0.5], &[0.4], 300, 9);
        let (centred, _) = centre(1, 1, &y).unwrap();
        let cost = ProfileCost {
            centred: &centred,
            p: 1,
            kind: ArmaFilterKind::Ansley,
        };
        let start = cost.cost(&vec![0.0, 0.0]).unwrap();
        let fit = fit_arma(1, 1, &y, &FitOptions::new().with_filter(ArmaFilterKind::Ansley)).unwrap();
        assert!(-fit.log_likelihood() < start);
    }

    #[test]
    fn params_give_stationary_invertible_model() {
        let model = unit_model(&[2.0, -1.0, 3.0, 0.5], 2).unwrap();
        assert_eq!((model.p(), model.q()), (2, 2));
        assert_eq!(model.variance(), 1.0);
        assert!(model.is_stationary());
        assert!(model.is_invertible());
    }
}
