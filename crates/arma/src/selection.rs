//! AIC-based ARMA model order selection.

use rayon::prelude::*;
use tracing::debug;

use crate::config::FitOptions;
use crate::error::ArmaError;
use crate::fit::ArmaFit;
use crate::spec::ArmaSpec;

/// Selects the best ARMA(p,q) model from a grid search over orders
/// 0..=`max_p` and 0..=`max_q`, ranked by Akaike Information Criterion
/// (AIC).
///
/// Fits every candidate `(p, q)` via [`ArmaSpec::fit()`] in parallel,
/// collects those that converge, and returns the [`ArmaFit`] with the
/// lowest [`ArmaFit::aic()`]. Candidates that fail to fit are skipped
/// (logged at debug level).
///
/// # Errors
///
/// | Variant | Trigger |
/// |---------|---------|
/// | [`ArmaError::AllCandidatesFailed`] | every `(p, q)` combination failed to fit |
///
/// # Example
///
/// ```ignore
/// let best = select_best_aic(&data, 3, 2)?;
/// println!("Best order: {:?}, AIC = {}", best.order(), best.aic());
/// ```
pub fn select_best_aic(data: &[f64], max_p: usize, max_q: usize) -> Result<ArmaFit, ArmaError> {
    select_best_aic_with(data, max_p, max_q, &FitOptions::default())
}

/// [`select_best_aic()`] with explicit [`FitOptions`] for every candidate.
#[tracing::instrument(level = "debug", skip(data, options), fields(n = data.len()))]
pub fn select_best_aic_with(
    data: &[f64],
    max_p: usize,
    max_q: usize,
    options: &FitOptions,
) -> Result<ArmaFit, ArmaError> {
    let orders: Vec<(usize, usize)> = (0..=max_p)
        .flat_map(|p| (0..=max_q).map(move |q| (p, q)))
        .collect();

    let fits: Vec<ArmaFit> = orders
        .par_iter()
        .filter_map(|&(p, q)| match ArmaSpec::new(p, q).fit_with(data, options) {
            Ok(fit) if fit.aic().is_finite() => Some(fit),
            Ok(_) => {
                debug!(p, q, "skipping candidate with non-finite AIC");
                None
            }
            Err(err) => {
                debug!(p, q, error = %err, "skipping candidate that failed to fit");
                None
            }
        })
        .collect();

    // Ties resolve to the smaller model (grid order is preserved by collect).
    fits.into_iter()
        .reduce(|best, fit| if fit.aic() < best.aic() { fit } else { best })
        .ok_or(ArmaError::AllCandidatesFailed { max_p, max_q })
}
