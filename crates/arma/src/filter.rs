//! Exact-likelihood ARMA filters and the strategy choosing between them.
//!
//! A filter turns a length-`n` sample of an ARMA process into a vector of
//! whitened residuals `e` and `ln |Cov(y)|` such that the Gaussian
//! log-likelihood is `-½(n ln 2π + logDet + eᵗe)`.

use tracing::debug;

use crate::ansley::AnsleyFilter;
use crate::error::ArmaError;
use crate::ljung_box::LjungBoxFilter;
use crate::model::ArmaModel;

/// Common interface of the exact-likelihood filters.
pub trait ArmaFilter {
    /// Prepares the filter for `model` and series length `n`; returns the
    /// length of the residual vector [`ArmaFilter::filter()`] produces.
    ///
    /// # Errors
    ///
    /// Infeasible models (see [`ArmaError::is_infeasible()`]) and `n = 0`.
    fn initialize(&mut self, model: &ArmaModel, n: usize) -> Result<usize, ArmaError>;

    /// Whitened residuals of `series`.
    ///
    /// # Errors
    ///
    /// * [`ArmaError::NotInitialized`] before [`ArmaFilter::initialize()`].
    /// * [`ArmaError::LengthMismatch`] when `series` has the wrong length.
    fn filter(&self, series: &[f64]) -> Result<Vec<f64>, ArmaError>;

    /// `ln |Cov(y)|` of the initialized model.
    fn log_determinant(&self) -> f64;
}

/// The two filter algorithms.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ArmaFilterKind {
    /// Banded Cholesky of the covariance of the AR-filtered series.
    Ansley,
    /// Conditional residuals plus a small pre-sample correction.
    LjungBox,
}

impl ArmaFilterKind {
    /// Picks the cheaper algorithm for an ARMA(p,q) model and `n`
    /// observations: pure MA models whose correction is small relative
    /// to the sample go to [`ArmaFilterKind::LjungBox`], everything else to
    /// [`ArmaFilterKind::Ansley`].
    ///
    /// ```
    /// use ceres_arma::ArmaFilterKind;
    ///
    /// assert_eq!(ArmaFilterKind::select(0, 2, 100), ArmaFilterKind::LjungBox);
    /// assert_eq!(ArmaFilterKind::select(1, 1, 100), ArmaFilterKind::Ansley);
    /// assert_eq!(ArmaFilterKind::select(0, 12, 100), ArmaFilterKind::Ansley);
    /// ```
    pub fn select(p: usize, q: usize, n: usize) -> Self {
        if p == 0 && q > 0 && q * q < n {
            Self::LjungBox
        } else {
            Self::Ansley
        }
    }
}

/// Filter chosen at construction, dispatching to the concrete algorithm.
#[derive(Clone, Debug)]
pub enum ArmaFilterStrategy {
    /// [`AnsleyFilter`].
    Ansley(AnsleyFilter),
    /// [`LjungBoxFilter`].
    LjungBox(LjungBoxFilter),
}

impl ArmaFilterStrategy {
    /// Uninitialized filter of the given kind.
    pub fn new(kind: ArmaFilterKind) -> Self {
        match kind {
            ArmaFilterKind::Ansley => Self::Ansley(AnsleyFilter::new()),
            ArmaFilterKind::LjungBox => Self::LjungBox(LjungBoxFilter::new()),
        }
    }

    /// Selects the filter for `model` and `n` with
    /// [`ArmaFilterKind::select()`] and initializes it.
    pub fn for_model(model: &ArmaModel, n: usize) -> Result<Self, ArmaError> {
        let kind = ArmaFilterKind::select(model.p(), model.q(), n);
        debug!(p = model.p(), q = model.q(), n, ?kind, "selected ARMA filter");
        let mut strategy = Self::new(kind);
        strategy.initialize(model, n)?;
        Ok(strategy)
    }

    /// Kind of the wrapped filter.
    pub fn kind(&self) -> ArmaFilterKind {
        match self {
            Self::Ansley(_) => ArmaFilterKind::Ansley,
            Self::LjungBox(_) => ArmaFilterKind::LjungBox,
        }
    }
}

impl ArmaFilter for ArmaFilterStrategy {
    fn initialize(&mut self, model: &ArmaModel, n: usize) -> Result<usize, ArmaError> {
        match self {
            Self::Ansley(f) => f.initialize(model, n),
            Self::LjungBox(f) => f.initialize(model, n),
        }
    }

    fn filter(&self, series: &[f64]) -> Result<Vec<f64>, ArmaError> {
        match self {
            Self::Ansley(f) => f.filter(series),
            Self::LjungBox(f) => f.filter(series),
        }
    }

    fn log_determinant(&self) -> f64 {
        match self {
            Self::Ansley(f) => f.log_determinant(),
            Self::LjungBox(f) => f.log_determinant(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_rule() {
        assert_eq!(ArmaFilterKind::select(0, 0, 10), ArmaFilterKind::Ansley);
        assert_eq!(ArmaFilterKind::select(0, 1, 2), ArmaFilterKind::LjungBox);
        assert_eq!(ArmaFilterKind::select(0, 3, 9), ArmaFilterKind::Ansley);
        assert_eq!(ArmaFilterKind::select(2, 0, 1000), ArmaFilterKind::Ansley);
    }

    #[test]
    fn strategy_reports_kind() {
        let model = ArmaModel::new(vec![], vec![0.4], 1.0).unwrap();
        let s = ArmaFilterStrategy::for_model(&model, 50).unwrap();
        assert_eq!(s.kind(), ArmaFilterKind::LjungBox);
        assert_eq!(
            ArmaFilterStrategy::new(ArmaFilterKind::Ansley).kind(),
            ArmaFilterKind::Ansley
        );
    }

    #[test]
    fn uninitialized_filter_errors() {
        let s = ArmaFilterStrategy::new(ArmaFilterKind::LjungBox);
        assert!(matches!(s.filter(&[1.0]), Err(ArmaError::NotInitialized)));
    }
}
