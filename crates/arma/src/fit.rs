//! Fitted ARMA model results.

use ndarray::Array2;
use rand::Rng;

use crate::error::ArmaError;
use crate::model::ArmaModel;
use crate::spec::ArmaSpec;

/// Maximum-likelihood estimate returned by [`ArmaSpec::fit()`].
///
/// The model describes the centred data. [`ArmaFit::log_likelihood()`]
/// is the exact likelihood of the centred sample at the estimate, as
/// computed by the filter chosen in [`FitOptions`](crate::FitOptions).
#[derive(Clone, Debug)]
pub struct ArmaFit {
    spec: ArmaSpec,
    model: ArmaModel,
    residuals: Vec<f64>,
    log_likelihood: f64,
    mean: f64,
}

impl ArmaFit {
    pub(crate) fn new(
        spec: ArmaSpec,
        model: ArmaModel,
        residuals: Vec<f64>,
        log_likelihood: f64,
        mean: f64,
    ) -> Self {
        Self {
            spec,
            model,
            residuals,
            log_likelihood,
            mean,
        }
    }

    /// Order that was fitted.
    pub fn spec(&self) -> ArmaSpec {
        self.spec
    }

    /// `(p, q)`.
    pub fn order(&self) -> (usize, usize) {
        (self.spec.p(), self.spec.q())
    }

    /// Estimated process for the centred data.
    pub fn model(&self) -> &ArmaModel {
        &self.model
    }

    pub fn ar(&self) -> &[f64] {
        self.model.phi()
    }

    pub fn ma(&self) -> &[f64] {
        self.model.theta()
    }

    /// Innovation variance, `ssq / n` of the unit-variance filter at the
    /// optimum.
    pub fn sigma2(&self) -> f64 {
        self.model.variance()
    }

    /// Prediction errors of the banded filter on the data scale.
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    /// Concentrated exact log-likelihood at the estimate.
    pub fn log_likelihood(&self) -> f64 {
        self.log_likelihood
    }

    /// Sample mean removed before fitting.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Akaike Information Criterion, `2k - 2 ln L` with
    /// `k =` [`ArmaSpec::parameter_count()`].
    pub fn aic(&self) -> f64 {
        let k = self.spec.parameter_count() as f64;
        2.0 * k - 2.0 * self.log_likelihood
    }

    /// Draws `n_sim` independent paths of length `n` from the fitted
    /// process, shifted by the sample mean. Column `j` is path `j`.
    ///
    /// Each path starts in the stationary distribution
    /// (see [`ArmaModel::sample_path()`]).
    ///
    /// # Errors
    ///
    /// Propagates [`ArmaModel::sample_path()`] errors.
    pub fn simulate<R: Rng + ?Sized>(&self, n: usize, n_sim: usize, rng: &mut R) -> Result<Array2<f64>, ArmaError> {
        let mut paths = Array2::from_elem((n, n_sim), self.mean);
        for mut column in paths.columns_mut() {
            let path = self.model.sample_path(n, rng)?;
            column.iter_mut().zip(path).for_each(|(y, v)| *y += v);
        }
        Ok(paths)
    }
}
