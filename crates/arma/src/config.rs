//! Configuration for ARMA maximum-likelihood fits.

use crate::error::ArmaError;
use crate::filter::ArmaFilterKind;

/// Options for [`ArmaSpec::fit_with()`](crate::ArmaSpec::fit_with).
///
/// Use the builder methods to customise parameters.
///
/// # Example
///
/// ```
/// use ceres_arma::{ArmaFilterKind, FitOptions};
///
/// let options = FitOptions::new()
///     .with_filter(ArmaFilterKind::LjungBox)
///     .with_max_iters(500);
///
/// assert!(options.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FitOptions {
    /// Likelihood filter; `None` selects per model and sample size.
    filter: Option<ArmaFilterKind>,
    /// Nelder-Mead iteration cap.
    max_iters: u64,
    /// Simplex standard-deviation tolerance.
    sd_tolerance: f64,
}

impl FitOptions {
    /// Creates options with the defaults: automatic filter choice,
    /// `max_iters = 1000`, `sd_tolerance = 1e-8`.
    pub fn new() -> Self {
        Self {
            filter: None,
            max_iters: 1000,
            sd_tolerance: 1e-8,
        }
    }

    /// Forces a likelihood filter.
    pub fn with_filter(mut self, kind: ArmaFilterKind) -> Self {
        self.filter = Some(kind);
        self
    }

    /// Restores the automatic filter choice.
    pub fn with_auto_filter(mut self) -> Self {
        self.filter = None;
        self
    }

    /// Sets the iteration cap.
    pub fn with_max_iters(mut self, max_iters: u64) -> Self {
        self.max_iters = max_iters;
        self
    }

    /// Sets the simplex tolerance.
    pub fn with_sd_tolerance(mut self, tol: f64) -> Self {
        self.sd_tolerance = tol;
        self
    }

    /// Returns the forced filter, if any.
    pub fn filter(&self) -> Option<ArmaFilterKind> {
        self.filter
    }

    /// Returns the iteration cap.
    pub fn max_iters(&self) -> u64 {
        self.max_iters
    }

    /// Returns the simplex tolerance.
    pub fn sd_tolerance(&self) -> f64 {
        self.sd_tolerance
    }

    /// Filter kind used for an ARMA(p,q) fit on `n` observations.
    pub fn filter_for(&self, p: usize, q: usize, n: usize) -> ArmaFilterKind {
        self.filter.unwrap_or_else(|| ArmaFilterKind::select(p, q, n))
    }

    /// Validates this configuration.
    ///
    /// Returns an error if `max_iters` is zero or the tolerance is not
    /// finite and positive.
    pub fn validate(&self) -> Result<(), ArmaError> {
        if self.max_iters == 0 {
            return Err(ArmaError::InvalidOption {
                name: "max_iters",
                value: 0.0,
            });
        }
        if !self.sd_tolerance.is_finite() || self.sd_tolerance <= 0.0 {
            return Err(ArmaError::InvalidOption {
                name: "sd_tolerance",
                value: self.sd_tolerance,
            });
        }
        Ok(())
    }
}

impl Default for FitOptions {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = FitOptions::default();
        assert_eq!(opts.filter(), None);
        assert_eq!(opts.max_iters(), 1000);
        assert!((opts.sd_tolerance() - 1e-8).abs() < f64::EPSILON);
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_filter_resolution() {
        let auto = FitOptions::new();
        assert_eq!(auto.filter_for(0, 1, 100), ArmaFilterKind::LjungBox);
        let forced = auto.with_filter(ArmaFilterKind::Ansley);
        assert_eq!(forced.filter_for(0, 1, 100), ArmaFilterKind::Ansley);
        assert_eq!(forced.with_auto_filter().filter(), None);
    }

    #[test]
    fn test_invalid() {
        assert!(FitOptions::new().with_max_iters(0).validate().is_err());
        assert!(FitOptions::new().with_sd_tolerance(0.0).validate().is_err());
        assert!(FitOptions::new().with_sd_tolerance(f64::NAN).validate().is_err());
    }
}
