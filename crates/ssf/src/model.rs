//! The state-space form contract.
//!
//! A linear Gaussian model is the triad
//!
//! ```text
//! y[pos]     = Z(pos) x[pos] + e[pos],        e ~ N(0, H(pos))
//! x[pos + 1] = T(pos) x[pos] + S(pos) u[pos], u ~ N(0, I)
//! x[0]       ~ a0 + N(0, Pf0) + B δ,          δ diffuse
//! ```
//!
//! Output buffers (`t`, `s`, `v`, `z`, `pf0`, ...) are zeroed by the
//! caller; in-place operations (`tx`, `tvt`, `xpzd`, ...) transform their
//! argument. Every state axis has the state dimension. Implementations must be
//! stateless with respect to `pos`: the same `(pos, input)` always yields
//! the same output, so one model can serve many runs concurrently.
//!
//! Only the defining methods ([`Dynamics::t`], [`Dynamics::s`],
//! [`Measurement::z`], ...) are required. The fast paths have dense
//! defaults which structured models override to avoid materializing
//! sparse matrices.

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2};

/// Initial distribution of the state.
pub trait Initialization {
    /// State dimension `d`.
    fn state_dim(&self) -> usize;

    /// Number of diffuse directions `k <= d`.
    fn diffuse_dim(&self) -> usize {
        0
    }

    /// Initial mean `a0` (zero by default).
    fn a0(&self, _a: ArrayViewMut1<'_, f64>) {}

    /// Covariance `Pf0` of the stationary part.
    fn pf0(&self, pf: ArrayViewMut2<'_, f64>);

    /// Matrix `B` (`d x k`) spanning the diffuse subspace.
    fn diffuse_constraints(&self, _b: ArrayViewMut2<'_, f64>) {}

    /// Diffuse covariance `Pi0`, `B Bᵗ` by default.
    fn pi0(&self, mut pi: ArrayViewMut2<'_, f64>) {
        let k = self.diffuse_dim();
        if k == 0 {
            return;
        }
        let mut b = Array2::zeros((pi.nrows(), k));
        self.diffuse_constraints(b.view_mut());
        pi.assign(&b.dot(&b.t()));
    }
}

/// State transition `x[pos+1] = T(pos) x[pos] + S(pos) u[pos]`.
pub trait Dynamics {
    /// `true` when `T`, `S` do not depend on `pos`.
    fn is_time_invariant(&self) -> bool;

    /// Dimension of the noise vector `u`.
    fn noise_dim(&self) -> usize;

    /// Transition matrix `T(pos)` (`d x d`).
    fn t(&self, pos: usize, t: ArrayViewMut2<'_, f64>);

    /// Noise loading `S(pos)` (`d x noise_dim`).
    fn s(&self, pos: usize, s: ArrayViewMut2<'_, f64>);

    /// Noise covariance `V(pos)`, `S Sᵗ` by default.
    fn v(&self, pos: usize, mut v: ArrayViewMut2<'_, f64>) {
        let mut s = Array2::zeros((v.nrows(), self.noise_dim()));
        self.s(pos, s.view_mut());
        v.assign(&s.dot(&s.t()));
    }

    /// `x <- T x`.
    fn tx(&self, pos: usize, mut x: ArrayViewMut1<'_, f64>) {
        let t = transition(self, pos, x.len());
        let tx = t.dot(&x);
        x.assign(&tx);
    }

    /// `x <- Tᵗ x`, i.e. the row vector `xᵗ T`.
    fn xt(&self, pos: usize, mut x: ArrayViewMut1<'_, f64>) {
        let t = transition(self, pos, x.len());
        let xt = x.dot(&t);
        x.assign(&xt);
    }

    /// `M <- T M` for a `d x m` matrix.
    fn tm(&self, pos: usize, mut m: ArrayViewMut2<'_, f64>) {
        for column in m.columns_mut() {
            self.tx(pos, column);
        }
    }

    /// `M <- M Tᵗ` for an `m x d` matrix.
    fn mt(&self, pos: usize, mut m: ArrayViewMut2<'_, f64>) {
        for row in m.rows_mut() {
            self.tx(pos, row);
        }
    }

    /// `V <- T V Tᵗ`.
    fn tvt(&self, pos: usize, mut v: ArrayViewMut2<'_, f64>) {
        self.tm(pos, v.view_mut());
        self.mt(pos, v);
    }

    /// `P <- P + V(pos)`.
    fn add_v(&self, pos: usize, mut p: ArrayViewMut2<'_, f64>) {
        let mut v = Array2::zeros(p.raw_dim());
        self.v(pos, v.view_mut());
        p += &v;
    }
}

/// Observation equations, processed one at a time.
///
/// Equation `eq` reads `y[pos, eq] = Z_eq(pos) x + e_eq` with independent
/// errors of variance [`Measurement::error_variance`].
pub trait Measurement {
    /// Number of observation equations per position.
    fn equations(&self) -> usize {
        1
    }

    /// Loading row `Z_eq(pos)` (length `d`).
    fn z(&self, pos: usize, eq: usize, z: ArrayViewMut1<'_, f64>);

    /// Observation error variance `H_eq(pos)`.
    fn error_variance(&self, _pos: usize, _eq: usize) -> f64 {
        0.0
    }

    /// `Z x`.
    fn zx(&self, pos: usize, eq: usize, x: ArrayView1<'_, f64>) -> f64 {
        loading(self, pos, eq, x.len()).dot(&x)
    }

    /// `out <- M Zᵗ` for an `m x d` matrix.
    fn zm(&self, pos: usize, eq: usize, m: ArrayView2<'_, f64>, mut out: ArrayViewMut1<'_, f64>) {
        for (o, row) in out.iter_mut().zip(m.rows()) {
            *o = self.zx(pos, eq, row);
        }
    }

    /// `Z V Zᵗ`.
    fn zvz(&self, pos: usize, eq: usize, v: ArrayView2<'_, f64>) -> f64 {
        let mut vz = Array1::zeros(v.nrows());
        self.zm(pos, eq, v, vz.view_mut());
        self.zx(pos, eq, vz.view())
    }

    /// `V <- V + d Zᵗ Z`.
    fn vpzdz(&self, pos: usize, eq: usize, mut v: ArrayViewMut2<'_, f64>, d: f64) {
        let z = loading(self, pos, eq, v.nrows());
        for ((i, j), value) in v.indexed_iter_mut() {
            *value += d * z[i] * z[j];
        }
    }

    /// `x <- x + d Zᵗ`.
    fn xpzd(&self, pos: usize, eq: usize, mut x: ArrayViewMut1<'_, f64>, d: f64) {
        let z = loading(self, pos, eq, x.len());
        x.scaled_add(d, &z);
    }
}

/// A complete state-space model.
pub trait Ssf: Initialization + Dynamics + Measurement {}

impl<T: Initialization + Dynamics + Measurement + ?Sized> Ssf for T {}

/// Dense `T(pos)`.
pub fn transition<D: Dynamics + ?Sized>(dynamics: &D, pos: usize, dim: usize) -> Array2<f64> {
    let mut t = Array2::zeros((dim, dim));
    dynamics.t(pos, t.view_mut());
    t
}

/// Dense `Z_eq(pos)`.
pub fn loading<M: Measurement + ?Sized>(measurement: &M, pos: usize, eq: usize, dim: usize) -> Array1<f64> {
    let mut z = Array1::zeros(dim);
    measurement.z(pos, eq, z.view_mut());
    z
}

/// Dense `Pf0`.
pub fn stationary_covariance<I: Initialization + ?Sized>(init: &I) -> Array2<f64> {
    let d = init.state_dim();
    let mut pf = Array2::zeros((d, d));
    init.pf0(pf.view_mut());
    pf
}

/// Dense `Pi0`.
pub fn diffuse_covariance<I: Initialization + ?Sized>(init: &I) -> Array2<f64> {
    let d = init.state_dim();
    let mut pi = Array2::zeros((d, d));
    init.pi0(pi.view_mut());
    pi
}
