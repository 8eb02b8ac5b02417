//! Fixed-interval state smoother with exact diffuse initialization.
//!
//! Runs backward over the filter history. In the ordinary part it is the
//! classic recursion
//!
//! ```text
//! r = Zᵗ v / f + Lᵗ r,          L = I - M Z / f
//! N = Zᵗ Z / f + Lᵗ N L
//! â = a + P r,  V = P - P N P
//! ```
//!
//! Inside the diffuse part `r` and `N` are expanded in powers of the
//! diffuse scale, `r = r0 + κ⁻¹ r1`-style, and the estimates are the
//! limits as the scale goes to infinity:
//!
//! ```text
//! â = a + P* r0 + P∞ r1
//! V = P* - P* N0 P* - (P∞ N1 P*)ᵗ - P∞ N1 P* - P∞ N2 P∞
//! ```

use ndarray::{Array1, Array2, Array3, ArrayView1, ArrayView2, ArrayView3, Axis, s};
use tracing::debug;

use crate::error::SsfError;
use crate::kalman::{FilteringResults, History, UpdateKind, symmetrize};
use crate::model::{Ssf, loading};

/// Smoothed states and covariances, `E[x(pos) | y(0..n)]`.
#[derive(Clone, Debug)]
pub struct SmoothingResults {
    states: Array2<f64>,
    variances: Array3<f64>,
}

impl SmoothingResults {
    /// Number of positions.
    pub fn len(&self) -> usize {
        self.states.nrows()
    }

    /// `true` when no position was smoothed.
    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    /// Smoothed states, one row per position.
    pub fn states(&self) -> ArrayView2<'_, f64> {
        self.states.view()
    }

    /// Smoothed covariances, indexed `(pos, i, j)`.
    pub fn variances(&self) -> ArrayView3<'_, f64> {
        self.variances.view()
    }

    /// Smoothed state at `pos`.
    pub fn state(&self, pos: usize) -> ArrayView1<'_, f64> {
        self.states.row(pos)
    }

    /// Smoothed covariance at `pos`.
    pub fn variance(&self, pos: usize) -> ArrayView2<'_, f64> {
        self.variances.index_axis(Axis(0), pos)
    }

    /// Series of state component `i`.
    pub fn component(&self, i: usize) -> ArrayView1<'_, f64> {
        self.states.column(i)
    }

    /// Smoothed signal `Z_eq(pos) â(pos)` for every position.
    pub fn signal<S: Ssf + ?Sized>(&self, ssf: &S, eq: usize) -> Array1<f64> {
        self.states
            .rows()
            .into_iter()
            .enumerate()
            .map(|(pos, a)| ssf.zx(pos, eq, a))
            .collect()
    }
}

/// Backward quantities of the smoother.
struct Backward {
    r0: Array1<f64>,
    r1: Array1<f64>,
    n0: Array2<f64>,
    n1: Array2<f64>,
    n2: Array2<f64>,
}

impl Backward {
    fn new(d: usize) -> Self {
        Self {
            r0: Array1::zeros(d),
            r1: Array1::zeros(d),
            n0: Array2::zeros((d, d)),
            n1: Array2::zeros((d, d)),
            n2: Array2::zeros((d, d)),
        }
    }

    /// `r <- T(pos)ᵗ r`, `N <- T(pos)ᵗ N T(pos)`.
    fn transpose_transition<S: Ssf + ?Sized>(&mut self, ssf: &S, pos: usize, diffuse: bool) {
        ssf.xt(pos, self.r0.view_mut());
        sandwich_transition(ssf, pos, &mut self.n0);
        if diffuse {
            ssf.xt(pos, self.r1.view_mut());
            sandwich_transition(ssf, pos, &mut self.n1);
            sandwich_transition(ssf, pos, &mut self.n2);
        }
    }

    fn ordinary(&mut self, z: &Array1<f64>, m: ArrayView1<'_, f64>, v: f64, f: f64, diffuse: bool) {
        let l = gain_complement(z, m, 1.0 / f);
        let r0 = z * (v / f) + l.t().dot(&self.r0);
        let n0 = outer(z, z, 1.0 / f) + l.t().dot(&self.n0).dot(&l);
        self.r0 = r0;
        self.n0 = n0;
        if diffuse {
            self.r1 = l.t().dot(&self.r1);
            self.n1 = l.t().dot(&self.n1).dot(&l);
            self.n2 = l.t().dot(&self.n2).dot(&l);
        }
    }

    fn diffuse(
        &mut self,
        z: &Array1<f64>,
        m: ArrayView1<'_, f64>,
        mi: ArrayView1<'_, f64>,
        v: f64,
        f: f64,
        fi: f64,
    ) {
        // L0 = I - K0 Z, L1 = -K1 Z with K0 = M∞/f∞, K1 = M*/f∞ - M∞ f*/f∞².
        let l0 = gain_complement(z, mi, 1.0 / fi);
        let k1 = &m / fi - &mi * (f / (fi * fi));
        let l1 = outer(&k1, z, -1.0);

        let l0t = l0.t();
        let l1t = l1.t();
        let r1 = z * (v / fi) + l0t.dot(&self.r1) + l1t.dot(&self.r0);
        let r0 = l0t.dot(&self.r0);

        let n0l0 = self.n0.dot(&l0);
        let n0l1 = self.n0.dot(&l1);
        let n1l1 = self.n1.dot(&l1);
        let n1 = outer(z, z, 1.0 / fi) + l0t.dot(&self.n1).dot(&l0) + l1t.dot(&n0l0) + l0t.dot(&n0l1);
        let n2 = outer(z, z, -f / (fi * fi))
            + l0t.dot(&self.n2).dot(&l0)
            + l0t.dot(&n1l1)
            + n1l1.t().dot(&l0)
            + l1t.dot(&n0l1);
        let n0 = l0t.dot(&n0l0);

        self.r0 = r0;
        self.r1 = r1;
        self.n0 = n0;
        self.n1 = n1;
        self.n2 = n2;
    }
}

/// Smooths the states of a filtered model.
///
/// `filtered` must come from [`crate::KalmanFilter::filter()`] on the same
/// model with history retained.
///
/// # Errors
///
/// * [`SsfError::HistoryNotRetained`] when the filter kept no history.
/// * [`SsfError::DimensionMismatch`] when `ssf` does not match the run.
#[tracing::instrument(level = "debug", skip_all, fields(n = filtered.len(), dim = filtered.state_dim()))]
pub fn smooth<S: Ssf + ?Sized>(ssf: &S, filtered: &FilteringResults) -> Result<SmoothingResults, SsfError> {
    let h = filtered.history()?;
    let d = filtered.state_dim();
    if ssf.state_dim() != d {
        return Err(SsfError::DimensionMismatch {
            what: "state dimension",
            expected: d,
            actual: ssf.state_dim(),
        });
    }
    let n = filtered.len();
    let diffuse_end = filtered.diffuse_end();

    let mut states = Array2::zeros((n, d));
    let mut variances = Array3::zeros((n, d, d));
    let mut back = Backward::new(d);

    for pos in (0..n).rev() {
        let diffuse = pos < diffuse_end;
        if pos + 1 < n {
            back.transpose_transition(ssf, pos, diffuse);
        }
        for eq in (0..filtered.equations()).rev() {
            step(ssf, h, &mut back, pos, eq, diffuse);
        }

        let a = h.predicted_states.row(pos);
        let p = h.predicted_variances.index_axis(Axis(0), pos);
        let mut state = &a + &p.dot(&back.r0);
        let mut var = &p - &p.dot(&back.n0).dot(&p);
        if let Some(pi) = h.diffuse_variances.get(pos).filter(|_| diffuse) {
            state += &pi.dot(&back.r1);
            let cross = pi.dot(&back.n1).dot(&p);
            var -= &cross;
            var -= &cross.t();
            var -= &pi.dot(&back.n2).dot(pi);
        }
        symmetrize(&mut var);
        states.row_mut(pos).assign(&state);
        variances.index_axis_mut(Axis(0), pos).assign(&var);
    }
    debug!(diffuse_end, "smoothing done");

    Ok(SmoothingResults { states, variances })
}

fn step<S: Ssf + ?Sized>(ssf: &S, h: &History, back: &mut Backward, pos: usize, eq: usize, diffuse: bool) {
    let kind = h.kinds[[pos, eq]];
    if matches!(kind, UpdateKind::Missing | UpdateKind::Constrained) {
        return;
    }
    let z = loading(ssf, pos, eq, back.r0.len());
    let v = h.innovations[[pos, eq]];
    let f = h.variances[[pos, eq]];
    let m = h.gains.slice(s![pos, eq, ..]);
    if kind == UpdateKind::Diffuse {
        let mi = h.diffuse_gains.slice(s![pos, eq, ..]);
        back.diffuse(&z, m, mi, v, f, h.diffuse_f[[pos, eq]]);
    } else {
        back.ordinary(&z, m, v, f, diffuse);
    }
}

/// `I - c m zᵗ`.
fn gain_complement(z: &Array1<f64>, m: ArrayView1<'_, f64>, c: f64) -> Array2<f64> {
    let d = z.len();
    let mut l = Array2::eye(d);
    for ((i, j), x) in l.indexed_iter_mut() {
        *x -= c * m[i] * z[j];
    }
    l
}

/// `c x yᵗ`.
fn outer(x: &Array1<f64>, y: &Array1<f64>, c: f64) -> Array2<f64> {
    Array2::from_shape_fn((x.len(), y.len()), |(i, j)| c * x[i] * y[j])
}

fn sandwich_transition<S: Ssf + ?Sized>(ssf: &S, pos: usize, n: &mut Array2<f64>) {
    for column in n.columns_mut() {
        ssf.xt(pos, column);
    }
    for row in n.rows_mut() {
        ssf.xt(pos, row);
    }
}
