//! ARMA process in companion (Harvey) form.
//!
//! With `r = max(p, q + 1)`:
//!
//! ```text
//! x[pos+1] = T x[pos] + R ε[pos+1],   y[pos] = x[pos][0]
//! T = [φ | I_{r-1}; 0],               R = (1, θ_1, ..., θ_{r-1})
//! ```
//!
//! The initial state is stationary, with `Pf0` solving
//! `P = T P Tᵗ + σ² R Rᵗ`.

use ceres_arma::{ArmaError, ArmaModel};
use ndarray::{Array1, Array2, ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2};

use crate::error::SsfError;
use crate::lyapunov::solve_discrete_lyapunov;
use crate::model::{Dynamics, Initialization, Measurement};

/// Stationary ARMA model as a state-space form.
#[derive(Clone, Debug)]
pub struct ArmaSsf {
    model: ArmaModel,
    /// AR coefficients padded to the state dimension.
    phi: Array1<f64>,
    /// `σ R`.
    loading: Array1<f64>,
    pf0: Array2<f64>,
}

impl ArmaSsf {
    /// # Errors
    ///
    /// [`ArmaError::NonStationary`] (wrapped) when the AR polynomial has a
    /// root on or inside the unit circle.
    pub fn new(model: &ArmaModel) -> Result<Self, SsfError> {
        if !model.is_stationary() {
            return Err(ArmaError::NonStationary.into());
        }
        let dim = model.p().max(model.q() + 1);
        let mut phi = Array1::zeros(dim);
        for (dst, src) in phi.iter_mut().zip(model.phi()) {
            *dst = *src;
        }
        let sigma = model.sigma();
        let mut loading = Array1::zeros(dim);
        loading[0] = sigma;
        for (dst, src) in loading.iter_mut().skip(1).zip(model.theta()) {
            *dst = sigma * src;
        }

        let mut t = Array2::zeros((dim, dim));
        fill_companion(&phi, t.view_mut());
        let column = loading.view().insert_axis(ndarray::Axis(1));
        let v = column.dot(&column.t());
        let pf0 = solve_discrete_lyapunov(t.view(), v.view())?;

        Ok(Self {
            model: model.clone(),
            phi,
            loading,
            pf0,
        })
    }

    /// The underlying ARMA model.
    pub fn model(&self) -> &ArmaModel {
        &self.model
    }

    pub(crate) fn dim(&self) -> usize {
        self.phi.len()
    }
}

fn fill_companion(phi: &Array1<f64>, mut t: ArrayViewMut2<'_, f64>) {
    let dim = phi.len();
    for i in 0..dim {
        t[[i, 0]] = phi[i];
        if i + 1 < dim {
            t[[i, i + 1]] = 1.0;
        }
    }
}

impl Initialization for ArmaSsf {
    fn state_dim(&self) -> usize {
        self.dim()
    }

    fn pf0(&self, mut pf: ArrayViewMut2<'_, f64>) {
        pf.assign(&self.pf0);
    }
}

impl Dynamics for ArmaSsf {
    fn is_time_invariant(&self) -> bool {
        true
    }

    fn noise_dim(&self) -> usize {
        1
    }

    fn t(&self, _pos: usize, t: ArrayViewMut2<'_, f64>) {
        fill_companion(&self.phi, t);
    }

    fn s(&self, _pos: usize, mut s: ArrayViewMut2<'_, f64>) {
        s.column_mut(0).assign(&self.loading);
    }

    fn tx(&self, _pos: usize, mut x: ArrayViewMut1<'_, f64>) {
        let dim = self.dim();
        let x0 = x[0];
        for i in 0..dim - 1 {
            x[i] = x[i + 1] + self.phi[i] * x0;
        }
        x[dim - 1] = self.phi[dim - 1] * x0;
    }

    fn xt(&self, _pos: usize, mut x: ArrayViewMut1<'_, f64>) {
        let dim = self.dim();
        let head = self.phi.dot(&x);
        for i in (1..dim).rev() {
            x[i] = x[i - 1];
        }
        x[0] = head;
    }

    fn add_v(&self, _pos: usize, mut p: ArrayViewMut2<'_, f64>) {
        for ((i, j), value) in p.indexed_iter_mut() {
            *value += self.loading[i] * self.loading[j];
        }
    }
}

impl Measurement for ArmaSsf {
    fn z(&self, _pos: usize, _eq: usize, mut z: ArrayViewMut1<'_, f64>) {
        z[0] = 1.0;
    }

    fn zx(&self, _pos: usize, _eq: usize, x: ArrayView1<'_, f64>) -> f64 {
        x[0]
    }

    fn zm(&self, _pos: usize, _eq: usize, m: ArrayView2<'_, f64>, mut out: ArrayViewMut1<'_, f64>) {
        out.assign(&m.column(0));
    }

    fn zvz(&self, _pos: usize, _eq: usize, v: ArrayView2<'_, f64>) -> f64 {
        v[[0, 0]]
    }

    fn vpzdz(&self, _pos: usize, _eq: usize, mut v: ArrayViewMut2<'_, f64>, d: f64) {
        v[[0, 0]] += d;
    }

    fn xpzd(&self, _pos: usize, _eq: usize, mut x: ArrayViewMut1<'_, f64>, d: f64) {
        x[0] += d;
    }
}
