//! Options for the Kalman recursion.

use crate::error::SsfError;

/// Tolerances and storage policy of [`KalmanFilter`](crate::KalmanFilter).
///
/// # Example
///
/// ```
/// use ceres_ssf::KalmanOptions;
///
/// let options = KalmanOptions::new()
///     .with_variance_tolerance(1e-10)
///     .with_history(false);
///
/// assert!(options.validate().is_ok());
/// assert!(!options.retain_history());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct KalmanOptions {
    /// Innovation variances at or below this are exact constraints.
    variance_tolerance: f64,
    /// Diffuse variances at or below this are zero; `P∞` collapses when
    /// all its entries are below it.
    diffuse_tolerance: f64,
    /// Keep per-position states and covariances for smoothing.
    retain_history: bool,
}

impl KalmanOptions {
    /// Defaults: `variance_tolerance = 1e-12`, `diffuse_tolerance = 1e-9`,
    /// history retained.
    pub fn new() -> Self {
        Self {
            variance_tolerance: 1e-12,
            diffuse_tolerance: 1e-9,
            retain_history: true,
        }
    }

    /// Sets the innovation variance tolerance.
    pub fn with_variance_tolerance(mut self, tol: f64) -> Self {
        self.variance_tolerance = tol;
        self
    }

    /// Sets the diffuse tolerance.
    pub fn with_diffuse_tolerance(mut self, tol: f64) -> Self {
        self.diffuse_tolerance = tol;
        self
    }

    /// Chooses whether to keep the filtering history.
    pub fn with_history(mut self, retain: bool) -> Self {
        self.retain_history = retain;
        self
    }

    /// Returns the innovation variance tolerance.
    pub fn variance_tolerance(&self) -> f64 {
        self.variance_tolerance
    }

    /// Returns the diffuse tolerance.
    pub fn diffuse_tolerance(&self) -> f64 {
        self.diffuse_tolerance
    }

    /// Returns whether the filtering history is kept.
    pub fn retain_history(&self) -> bool {
        self.retain_history
    }

    /// Validates this configuration: both tolerances must be finite and
    /// non-negative.
    pub fn validate(&self) -> Result<(), SsfError> {
        for (name, value) in [
            ("variance_tolerance", self.variance_tolerance),
            ("diffuse_tolerance", self.diffuse_tolerance),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SsfError::InvalidParameter { name, value });
            }
        }
        Ok(())
    }
}

impl Default for KalmanOptions {
    fn default() -> Self {
        Self::new()
    }
}
