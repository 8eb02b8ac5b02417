//! One-call filtering and smoothing.

use ndarray::{ArrayView2, Axis, aview1};

use crate::config::KalmanOptions;
use crate::error::SsfError;
use crate::kalman::{FilteringResults, KalmanFilter};
use crate::likelihood::DiffuseLikelihood;
use crate::model::Ssf;
use crate::smoother::{SmoothingResults, smooth};

/// Everything a full pass over a series produces.
#[derive(Clone, Debug)]
pub struct SsfRun {
    /// Likelihood terms of the forward pass.
    pub likelihood: DiffuseLikelihood,
    /// Filter output, history included.
    pub filtered: FilteringResults,
    /// Smoothed states.
    pub smoothed: SmoothingResults,
}

/// Filters then smooths `observations` with default options.
///
/// ```
/// use ceres_ssf::{run, LocalLevel};
/// use ndarray::array;
///
/// let model = LocalLevel::new(0.5, 1.0).unwrap();
/// let out = run(&model, array![[1.0], [2.0]].view()).unwrap();
/// assert!((out.smoothed.state(0)[0] - 1.4).abs() < 1e-12);
/// ```
pub fn run<S: Ssf + ?Sized>(ssf: &S, observations: ArrayView2<'_, f64>) -> Result<SsfRun, SsfError> {
    run_with(ssf, observations, &KalmanOptions::default())
}

/// Same as [`run()`] with explicit options. History is always retained.
pub fn run_with<S: Ssf + ?Sized>(
    ssf: &S,
    observations: ArrayView2<'_, f64>,
    options: &KalmanOptions,
) -> Result<SsfRun, SsfError> {
    let filter = KalmanFilter::new(options.clone().with_history(true));
    let filtered = filter.filter(ssf, observations)?;
    let smoothed = smooth(ssf, &filtered)?;
    Ok(SsfRun {
        likelihood: filtered.likelihood().clone(),
        filtered,
        smoothed,
    })
}

/// [`run()`] on a single series.
pub fn run_univariate<S: Ssf + ?Sized>(ssf: &S, series: &[f64]) -> Result<SsfRun, SsfError> {
    run(ssf, aview1(series).insert_axis(Axis(1)))
}
