//! Diffuse Kalman filter with univariate treatment of the equations.
//!
//! Per position the state is predicted, then each equation updates it in
//! turn. While the diffuse covariance `P∞` is non-zero an observation
//! with `f∞ = Z P∞ Zᵗ > 0` goes through the diffuse update
//!
//! ```text
//! a  += M∞ v / f∞
//! P* += M∞ M∞ᵗ f* / f∞² - (M* M∞ᵗ + M∞ M*ᵗ) / f∞
//! P∞ -= M∞ M∞ᵗ / f∞
//! ```
//!
//! with `M = P Zᵗ`. Once `P∞` vanishes the recursion is the ordinary one.

use ndarray::{Array1, Array2, Array3, ArrayView2, ArrayView3, Axis, aview1, s};
use tracing::debug;

use crate::config::KalmanOptions;
use crate::error::SsfError;
use crate::likelihood::DiffuseLikelihood;
use crate::model::{Ssf, diffuse_covariance, stationary_covariance};

/// How an observation entered the recursion.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum UpdateKind {
    /// Missing (`NaN`): no update.
    Missing,
    /// Innovation variance and innovation both numerically zero: exact
    /// constraint, no update.
    Constrained,
    /// Diffuse update, `f∞ > 0`.
    Diffuse,
    /// Ordinary update.
    Ordinary,
}

/// Per-position quantities kept for smoothing.
#[derive(Clone, Debug)]
pub(crate) struct History {
    pub(crate) predicted_states: Array2<f64>,
    pub(crate) predicted_variances: Array3<f64>,
    /// Predicted `P∞` for positions before the end of the diffuse phase.
    pub(crate) diffuse_variances: Vec<Array2<f64>>,
    pub(crate) filtered_states: Array2<f64>,
    pub(crate) filtered_variances: Array3<f64>,
    pub(crate) innovations: Array2<f64>,
    pub(crate) variances: Array2<f64>,
    pub(crate) diffuse_f: Array2<f64>,
    /// `M* = P* Zᵗ`, indexed `(pos, eq, i)`.
    pub(crate) gains: Array3<f64>,
    /// `M∞ = P∞ Zᵗ`, zero outside diffuse updates.
    pub(crate) diffuse_gains: Array3<f64>,
    pub(crate) kinds: Array2<UpdateKind>,
}

impl History {
    fn new(n: usize, equations: usize, d: usize) -> Self {
        Self {
            predicted_states: Array2::zeros((n, d)),
            predicted_variances: Array3::zeros((n, d, d)),
            diffuse_variances: Vec::new(),
            filtered_states: Array2::zeros((n, d)),
            filtered_variances: Array3::zeros((n, d, d)),
            innovations: Array2::from_elem((n, equations), f64::NAN),
            variances: Array2::from_elem((n, equations), f64::NAN),
            diffuse_f: Array2::zeros((n, equations)),
            gains: Array3::zeros((n, equations, d)),
            diffuse_gains: Array3::zeros((n, equations, d)),
            kinds: Array2::from_elem((n, equations), UpdateKind::Missing),
        }
    }
}

/// Output of [`KalmanFilter::filter()`].
#[derive(Clone, Debug)]
pub struct FilteringResults {
    len: usize,
    state_dim: usize,
    equations: usize,
    diffuse_end: usize,
    likelihood: DiffuseLikelihood,
    history: Option<History>,
}

impl FilteringResults {
    /// Number of positions.
    pub fn len(&self) -> usize {
        self.len
    }

    /// `true` for an empty run (never produced by the filter).
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// State dimension.
    pub fn state_dim(&self) -> usize {
        self.state_dim
    }

    /// Equations per position.
    pub fn equations(&self) -> usize {
        self.equations
    }

    /// First position filtered by the ordinary recursion: 0 without diffuse
    /// part, `len()` when the diffuse part was never resolved.
    pub fn diffuse_end(&self) -> usize {
        self.diffuse_end
    }

    /// Accumulated likelihood terms.
    pub fn likelihood(&self) -> &DiffuseLikelihood {
        &self.likelihood
    }

    /// `true` when per-position history was kept.
    pub fn has_history(&self) -> bool {
        self.history.is_some()
    }

    /// Predicted states `a(pos|pos-1)`, one row per position.
    pub fn predicted_states(&self) -> Option<ArrayView2<'_, f64>> {
        self.history.as_ref().map(|h| h.predicted_states.view())
    }

    /// Predicted covariances `P*(pos|pos-1)`, indexed `(pos, i, j)`.
    pub fn predicted_variances(&self) -> Option<ArrayView3<'_, f64>> {
        self.history.as_ref().map(|h| h.predicted_variances.view())
    }

    /// Filtered states `a(pos|pos)`.
    pub fn filtered_states(&self) -> Option<ArrayView2<'_, f64>> {
        self.history.as_ref().map(|h| h.filtered_states.view())
    }

    /// Filtered covariances `P*(pos|pos)`.
    pub fn filtered_variances(&self) -> Option<ArrayView3<'_, f64>> {
        self.history.as_ref().map(|h| h.filtered_variances.view())
    }

    /// Innovations `v`, `NaN` where no update took place.
    pub fn innovations(&self) -> Option<ArrayView2<'_, f64>> {
        self.history.as_ref().map(|h| h.innovations.view())
    }

    /// Innovation variances `f*`.
    pub fn innovation_variances(&self) -> Option<ArrayView2<'_, f64>> {
        self.history.as_ref().map(|h| h.variances.view())
    }

    /// Predicted diffuse covariance `P∞` at `pos`, for `pos < diffuse_end()`.
    pub fn diffuse_variance(&self, pos: usize) -> Option<ArrayView2<'_, f64>> {
        self.history
            .as_ref()
            .and_then(|h| h.diffuse_variances.get(pos))
            .map(|p| p.view())
    }

    /// How observation `(pos, eq)` entered the recursion.
    pub fn update_kind(&self, pos: usize, eq: usize) -> Option<UpdateKind> {
        self.history.as_ref().and_then(|h| h.kinds.get((pos, eq)).copied())
    }

    /// Standardized innovations `v / √f` of the ordinary updates, in order.
    pub fn standardized_residuals(&self) -> Option<Vec<f64>> {
        let h = self.history.as_ref()?;
        Some(
            h.kinds
                .iter()
                .zip(h.innovations.iter().zip(h.variances.iter()))
                .filter(|(kind, _)| **kind == UpdateKind::Ordinary)
                .map(|(_, (v, f))| v / f.sqrt())
                .collect(),
        )
    }

    pub(crate) fn history(&self) -> Result<&History, SsfError> {
        self.history.as_ref().ok_or(SsfError::HistoryNotRetained)
    }

    pub(crate) fn into_likelihood(self) -> DiffuseLikelihood {
        self.likelihood
    }
}

/// Kalman filter driver.
#[derive(Clone, Debug, Default)]
pub struct KalmanFilter {
    options: KalmanOptions,
}

impl KalmanFilter {
    /// Filter with the given options.
    pub fn new(options: KalmanOptions) -> Self {
        Self { options }
    }

    /// The options in use.
    pub fn options(&self) -> &KalmanOptions {
        &self.options
    }

    /// Filters `observations` (`n x equations`, `NaN` = missing).
    ///
    /// # Errors
    ///
    /// * [`SsfError::EmptyData`], [`SsfError::DimensionMismatch`],
    ///   [`SsfError::InvalidObservation`] for malformed input.
    /// * [`SsfError::Infeasible`] when an innovation variance is negative
    ///   or non-finite, or zero while the innovation is not.
    pub fn filter<S: Ssf + ?Sized>(
        &self,
        ssf: &S,
        observations: ArrayView2<'_, f64>,
    ) -> Result<FilteringResults, SsfError> {
        self.run(ssf, observations, self.options.retain_history())
    }

    /// Filters a single series.
    pub fn filter_univariate<S: Ssf + ?Sized>(&self, ssf: &S, series: &[f64]) -> Result<FilteringResults, SsfError> {
        self.filter(ssf, aview1(series).insert_axis(Axis(1)))
    }

    /// Likelihood only, without history.
    pub fn log_likelihood<S: Ssf + ?Sized>(
        &self,
        ssf: &S,
        observations: ArrayView2<'_, f64>,
    ) -> Result<DiffuseLikelihood, SsfError> {
        Ok(self.run(ssf, observations, false)?.into_likelihood())
    }

    #[tracing::instrument(level = "debug", skip_all, fields(n = observations.nrows(), dim = ssf.state_dim()))]
    fn run<S: Ssf + ?Sized>(
        &self,
        ssf: &S,
        observations: ArrayView2<'_, f64>,
        retain: bool,
    ) -> Result<FilteringResults, SsfError> {
        self.options.validate()?;
        let (n, equations) = observations.dim();
        if n == 0 {
            return Err(SsfError::EmptyData);
        }
        if equations != ssf.equations() {
            return Err(SsfError::DimensionMismatch {
                what: "observation columns",
                expected: ssf.equations(),
                actual: equations,
            });
        }
        if let Some(((pos, _), &value)) = observations.indexed_iter().find(|(_, v)| v.is_infinite()) {
            return Err(SsfError::InvalidObservation { pos, value });
        }

        let tol = self.options.variance_tolerance();
        let dtol = self.options.diffuse_tolerance();
        let d = ssf.state_dim();

        let mut a = Array1::zeros(d);
        ssf.a0(a.view_mut());
        let mut p = stationary_covariance(ssf);
        let mut pi = (ssf.diffuse_dim() > 0)
            .then(|| diffuse_covariance(ssf))
            .filter(|pi| max_abs(pi) > dtol);
        let mut diffuse_end = if pi.is_some() { n } else { 0 };
        let mut history = retain.then(|| History::new(n, equations, d));
        let mut likelihood = DiffuseLikelihood::default();
        let mut m = Array1::zeros(d);
        let mut mi = Array1::zeros(d);

        for pos in 0..n {
            if pos > 0 {
                ssf.tx(pos - 1, a.view_mut());
                ssf.tvt(pos - 1, p.view_mut());
                ssf.add_v(pos - 1, p.view_mut());
                symmetrize(&mut p);
                if let Some(pi) = pi.as_mut() {
                    ssf.tvt(pos - 1, pi.view_mut());
                    symmetrize(pi);
                }
            }
            if let Some(h) = history.as_mut() {
                h.predicted_states.row_mut(pos).assign(&a);
                h.predicted_variances.index_axis_mut(Axis(0), pos).assign(&p);
                if let Some(pi) = &pi {
                    h.diffuse_variances.push(pi.clone());
                }
            }

            for eq in 0..equations {
                let y = observations[[pos, eq]];
                if y.is_nan() {
                    continue;
                }
                let v = y - ssf.zx(pos, eq, a.view());
                ssf.zm(pos, eq, p.view(), m.view_mut());
                let f = ssf.zx(pos, eq, m.view()) + ssf.error_variance(pos, eq);
                if !f.is_finite() || f < -tol {
                    return Err(SsfError::Infeasible { pos, variance: f });
                }
                let fi = match pi.as_ref() {
                    Some(pi) => {
                        ssf.zm(pos, eq, pi.view(), mi.view_mut());
                        ssf.zx(pos, eq, mi.view())
                    }
                    None => 0.0,
                };
                if !fi.is_finite() {
                    return Err(SsfError::Infeasible { pos, variance: fi });
                }

                let kind = match pi.as_mut() {
                    Some(pi) if fi > dtol => {
                        a.scaled_add(v / fi, &mi);
                        let c = f / (fi * fi);
                        for ((i, j), x) in p.indexed_iter_mut() {
                            *x += mi[i] * mi[j] * c - (m[i] * mi[j] + mi[i] * m[j]) / fi;
                        }
                        for ((i, j), x) in pi.indexed_iter_mut() {
                            *x -= mi[i] * mi[j] / fi;
                        }
                        likelihood.add_diffuse(fi);
                        UpdateKind::Diffuse
                    }
                    _ if f <= tol => {
                        if v.abs() > tol.sqrt() * y.abs().max(1.0) {
                            return Err(SsfError::Infeasible { pos, variance: f });
                        }
                        UpdateKind::Constrained
                    }
                    _ => {
                        a.scaled_add(v / f, &m);
                        for ((i, j), x) in p.indexed_iter_mut() {
                            *x -= m[i] * m[j] / f;
                        }
                        likelihood.add(v, f);
                        UpdateKind::Ordinary
                    }
                };

                if let Some(h) = history.as_mut() {
                    h.kinds[[pos, eq]] = kind;
                    h.innovations[[pos, eq]] = v;
                    h.variances[[pos, eq]] = f;
                    h.diffuse_f[[pos, eq]] = fi;
                    h.gains.slice_mut(s![pos, eq, ..]).assign(&m);
                    if kind == UpdateKind::Diffuse {
                        h.diffuse_gains.slice_mut(s![pos, eq, ..]).assign(&mi);
                    }
                }
            }

            if pi.as_ref().is_some_and(|pi| max_abs(pi) <= dtol) {
                pi = None;
                diffuse_end = pos + 1;
                debug!(pos, "diffuse phase ended");
            }
            if let Some(h) = history.as_mut() {
                h.filtered_states.row_mut(pos).assign(&a);
                h.filtered_variances.index_axis_mut(Axis(0), pos).assign(&p);
            }
        }
        if pi.is_some() {
            debug!(n, "diffuse part not resolved by the data");
        }

        Ok(FilteringResults {
            len: n,
            state_dim: d,
            equations,
            diffuse_end,
            likelihood,
            history,
        })
    }
}

pub(crate) fn max_abs(m: &Array2<f64>) -> f64 {
    m.iter().fold(0.0, |acc, v| acc.max(v.abs()))
}

pub(crate) fn symmetrize(m: &mut Array2<f64>) {
    let n = m.nrows();
    for i in 0..n {
        for j in 0..i {
            let v = 0.5 * (m[[i, j]] + m[[j, i]]);
            m[[i, j]] = v;
            m[[j, i]] = v;
        }
    }
}
