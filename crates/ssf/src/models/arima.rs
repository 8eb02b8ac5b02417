//! Integrated ARMA model: a stationary ARMA block plus diffuse lags.
//!
//! With the differencing operator `δ(B) = 1 + δ_1 B + ... + δ_d B^d` and
//! `w = δ(B) y` an ARMA process, the state is
//! `(w-block, y[pos-1], ..., y[pos-d])` and
//!
//! ```text
//! y[pos] = w[pos] - δ_1 y[pos-1] - ... - δ_d y[pos-d]
//! ```
//!
//! The lags are the diffuse part of the initial state.

use ceres_arma::{ArmaError, ArmaModel, Polynomial};
use ndarray::{Array1, ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2, s};

use crate::error::SsfError;
use crate::model::{Dynamics, Initialization, Measurement};
use crate::models::arma::ArmaSsf;

/// ARIMA model as a state-space form with mixed initialization.
#[derive(Clone, Debug)]
pub struct ArimaSsf {
    arma: ArmaSsf,
    differencing: Polynomial,
    /// Loadings of the lags, `-δ_1, ..., -δ_d`.
    lags: Array1<f64>,
}

impl ArimaSsf {
    /// ARIMA model with differencing operator `differencing`.
    ///
    /// # Errors
    ///
    /// [`ArmaError::InvalidPolynomial`] when the operator's constant term is
    /// not 1, and the errors of [`ArmaSsf::new()`].
    pub fn new(model: &ArmaModel, differencing: &Polynomial) -> Result<Self, SsfError> {
        let c0 = differencing.get(0);
        if c0 != 1.0 {
            return Err(ArmaError::InvalidPolynomial { constant: c0 }.into());
        }
        let d = differencing.degree();
        let lags = (1..=d).map(|i| -differencing.get(i)).collect();
        Ok(Self {
            arma: ArmaSsf::new(model)?,
            differencing: differencing.clone(),
            lags,
        })
    }

    /// ARIMA(p, d, q) with differencing `(1 - B)^d`.
    pub fn integrated(model: &ArmaModel, d: usize) -> Result<Self, SsfError> {
        Self::new(model, &Polynomial::differencing(d))
    }

    /// The stationary part.
    pub fn arma(&self) -> &ArmaSsf {
        &self.arma
    }

    /// The differencing operator.
    pub fn differencing(&self) -> &Polynomial {
        &self.differencing
    }

    fn r(&self) -> usize {
        self.arma.dim()
    }

    fn d(&self) -> usize {
        self.lags.len()
    }
}

impl Initialization for ArimaSsf {
    fn state_dim(&self) -> usize {
        self.r() + self.d()
    }

    fn diffuse_dim(&self) -> usize {
        self.d()
    }

    fn pf0(&self, mut pf: ArrayViewMut2<'_, f64>) {
        let r = self.r();
        self.arma.pf0(pf.slice_mut(s![..r, ..r]));
    }

    fn diffuse_constraints(&self, mut b: ArrayViewMut2<'_, f64>) {
        let r = self.r();
        for i in 0..self.d() {
            b[[r + i, i]] = 1.0;
        }
    }
}

impl Dynamics for ArimaSsf {
    fn is_time_invariant(&self) -> bool {
        true
    }

    fn noise_dim(&self) -> usize {
        1
    }

    fn t(&self, pos: usize, mut t: ArrayViewMut2<'_, f64>) {
        let r = self.r();
        let d = self.d();
        self.arma.t(pos, t.slice_mut(s![..r, ..r]));
        if d == 0 {
            return;
        }
        t[[r, 0]] = 1.0;
        for (i, l) in self.lags.iter().enumerate() {
            t[[r, r + i]] = *l;
        }
        for i in 1..d {
            t[[r + i, r + i - 1]] = 1.0;
        }
    }

    fn s(&self, pos: usize, mut s: ArrayViewMut2<'_, f64>) {
        let r = self.r();
        self.arma.s(pos, s.slice_mut(s![..r, ..]));
    }

    fn tx(&self, pos: usize, mut x: ArrayViewMut1<'_, f64>) {
        let r = self.r();
        let d = self.d();
        let y = self.zx(pos, 0, x.view());
        self.arma.tx(pos, x.slice_mut(s![..r]));
        if d == 0 {
            return;
        }
        for i in (1..d).rev() {
            x[r + i] = x[r + i - 1];
        }
        x[r] = y;
    }

    fn xt(&self, pos: usize, mut x: ArrayViewMut1<'_, f64>) {
        let r = self.r();
        let d = self.d();
        self.arma.xt(pos, x.slice_mut(s![..r]));
        if d == 0 {
            return;
        }
        let head = x[r];
        for i in 0..d - 1 {
            x[r + i] = x[r + i + 1];
        }
        x[r + d - 1] = 0.0;
        self.xpzd(pos, 0, x, head);
    }

    fn add_v(&self, pos: usize, mut p: ArrayViewMut2<'_, f64>) {
        let r = self.r();
        self.arma.add_v(pos, p.slice_mut(s![..r, ..r]));
    }
}

impl Measurement for ArimaSsf {
    fn z(&self, _pos: usize, _eq: usize, mut z: ArrayViewMut1<'_, f64>) {
        let r = self.r();
        z[0] = 1.0;
        z.slice_mut(s![r..]).assign(&self.lags);
    }

    fn zx(&self, _pos: usize, _eq: usize, x: ArrayView1<'_, f64>) -> f64 {
        let r = self.r();
        x[0] + self.lags.dot(&x.slice(s![r..]))
    }

    fn zm(&self, pos: usize, eq: usize, m: ArrayView2<'_, f64>, mut out: ArrayViewMut1<'_, f64>) {
        for (o, row) in out.iter_mut().zip(m.rows()) {
            *o = self.zx(pos, eq, row);
        }
    }

    fn xpzd(&self, _pos: usize, _eq: usize, mut x: ArrayViewMut1<'_, f64>, d: f64) {
        let r = self.r();
        x[0] += d;
        x.slice_mut(s![r..]).scaled_add(d, &self.lags);
    }
}
