//! Exact Gaussian likelihood of an ARMA sample.

use std::f64::consts::PI;

use crate::error::ArmaError;
use crate::filter::{ArmaFilter, ArmaFilterKind, ArmaFilterStrategy};
use crate::model::ArmaModel;

/// Terms of the exact log-likelihood of one sample.
#[derive(Clone, Debug, PartialEq)]
pub struct ArmaLikelihood {
    n: usize,
    log_det: f64,
    ssq: f64,
    residuals: Vec<f64>,
}

impl ArmaLikelihood {
    /// Evaluates `model` on `series` with the given filter kind.
    ///
    /// # Errors
    ///
    /// [`ArmaError::EmptyData`] for an empty series, and the filter's
    /// infeasibility errors.
    pub fn evaluate(model: &ArmaModel, series: &[f64], kind: ArmaFilterKind) -> Result<Self, ArmaError> {
        let mut filter = ArmaFilterStrategy::new(kind);
        filter.initialize(model, series.len())?;
        Self::from_filter(&filter, series)
    }

    /// Evaluates `model` on `series` with the filter chosen by
    /// [`ArmaFilterKind::select()`].
    pub fn evaluate_auto(model: &ArmaModel, series: &[f64]) -> Result<Self, ArmaError> {
        let filter = ArmaFilterStrategy::for_model(model, series.len())?;
        Self::from_filter(&filter, series)
    }

    /// Runs an initialized filter over `series`.
    pub fn from_filter<F: ArmaFilter>(filter: &F, series: &[f64]) -> Result<Self, ArmaError> {
        let residuals = filter.filter(series)?;
        let ssq = residuals.iter().map(|e| e * e).sum();
        Ok(Self {
            n: series.len(),
            log_det: filter.log_determinant(),
            ssq,
            residuals,
        })
    }

    /// Number of observations.
    pub fn n(&self) -> usize {
        self.n
    }

    /// `ln |Cov(y)|`.
    pub fn log_determinant(&self) -> f64 {
        self.log_det
    }

    /// Sum of squared whitened residuals.
    pub fn ssq(&self) -> f64 {
        self.ssq
    }

    /// Whitened residuals as produced by the filter.
    pub fn residuals(&self) -> &[f64] {
        &self.residuals
    }

    /// `-½(n ln 2π + logDet + ssq)`.
    pub fn log_likelihood(&self) -> f64 {
        -0.5 * (self.n as f64 * (2.0 * PI).ln() + self.log_det + self.ssq)
    }

    /// ML estimate of a common scale factor of the covariance, `ssq / n`.
    /// For a unit-variance model this is the innovation variance.
    pub fn sigma2(&self) -> f64 {
        self.ssq / self.n as f64
    }

    /// Log-likelihood with the scale factor concentrated out:
    /// `-½(n (ln 2π + 1 + ln(ssq/n)) + logDet)`.
    pub fn concentrated_log_likelihood(&self) -> f64 {
        let n = self.n as f64;
        -0.5 * (n * ((2.0 * PI).ln() + 1.0 + self.sigma2().ln()) + self.log_det)
    }
}
