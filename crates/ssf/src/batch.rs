//! Likelihood evaluation of many series against one model.

use ndarray::{Axis, aview1};
use rayon::prelude::*;
use tracing::debug;

use crate::config::KalmanOptions;
use crate::error::SsfError;
use crate::kalman::KalmanFilter;
use crate::likelihood::DiffuseLikelihood;
use crate::model::Ssf;

/// Filters every series in parallel and returns the likelihoods in input
/// order. A failing series does not stop the others.
#[tracing::instrument(level = "debug", skip_all, fields(series = series.len()))]
pub fn log_likelihoods<S>(
    ssf: &S,
    series: &[Vec<f64>],
    options: &KalmanOptions,
) -> Vec<Result<DiffuseLikelihood, SsfError>>
where
    S: Ssf + Sync + ?Sized,
{
    let filter = KalmanFilter::new(options.clone().with_history(false));
    series
        .par_iter()
        .enumerate()
        .map(|(i, y)| {
            let out = filter.log_likelihood(ssf, aview1(y.as_slice()).insert_axis(Axis(1)));
            if let Err(err) = &out {
                debug!(series = i, error = %err, "series failed");
            }
            out
        })
        .collect()
}
