//! Periodic cumulation of a high-frequency model.
//!
//! Flows observed as period totals (quarterly sums of a monthly series,
//! say) are handled by appending a cumulator `c` to the base state:
//!
//! ```text
//! y[pos]   = c[pos] + Z x[pos]
//! c[pos+1] = w(pos) (c[pos] + Z x[pos]),   w(pos) = 0 when pos+1 starts a period
//! x[pos+1] = T x[pos] + S u[pos]
//! ```
//!
//! so `y[pos]` is the running total since the start of the current
//! period. The first row of the transition is a single weighted feedback
//! and the rest is the base transition, which the fast paths exploit.
//!
//! Only the signal `Z x` is cumulated. The base error variance `H` is kept
//! as the measurement error of the observed total, entering once per
//! observation. Noise that should add up within a period belongs in the
//! base state, as a white-noise block of a [`Composite`](crate::Composite).

use ndarray::{ArrayView1, ArrayViewMut1, ArrayViewMut2, s};

use crate::error::SsfError;
use crate::model::{Dynamics, Initialization, Measurement, Ssf};

/// Base model cumulated within periods of `ratio` positions.
#[derive(Clone, Debug)]
pub struct Cumulator<S> {
    base: S,
    ratio: usize,
    phase: usize,
}

impl<S: Ssf> Cumulator<S> {
    /// Cumulates `base` over periods of `ratio` positions, position 0
    /// starting a period.
    ///
    /// # Errors
    ///
    /// * [`SsfError::InvalidParameter`] when `ratio < 2`.
    /// * [`SsfError::DimensionMismatch`] when `base` has several equations.
    pub fn new(base: S, ratio: usize) -> Result<Self, SsfError> {
        Self::with_phase(base, ratio, 0)
    }

    /// Same as [`Cumulator::new()`] with position 0 at offset `phase`
    /// inside its period. The cumulation starts at position 0 in any case.
    pub fn with_phase(base: S, ratio: usize, phase: usize) -> Result<Self, SsfError> {
        if ratio < 2 {
            return Err(SsfError::InvalidParameter {
                name: "ratio",
                value: ratio as f64,
            });
        }
        if phase >= ratio {
            return Err(SsfError::InvalidParameter {
                name: "phase",
                value: phase as f64,
            });
        }
        if base.equations() != 1 {
            return Err(SsfError::DimensionMismatch {
                what: "cumulated equations",
                expected: 1,
                actual: base.equations(),
            });
        }
        Ok(Self { base, ratio, phase })
    }

    /// The cumulated model.
    pub fn base(&self) -> &S {
        &self.base
    }

    /// Period length.
    pub fn ratio(&self) -> usize {
        self.ratio
    }

    /// `true` when `pos` closes a period.
    pub fn is_period_end(&self, pos: usize) -> bool {
        (pos + 1 + self.phase) % self.ratio == 0
    }

    /// Weight of the feedback from `pos` to `pos + 1`.
    fn weight(&self, pos: usize) -> f64 {
        if self.is_period_end(pos) { 0.0 } else { 1.0 }
    }

    fn dim(&self) -> usize {
        self.base.state_dim()
    }
}

impl<S: Ssf> Initialization for Cumulator<S> {
    fn state_dim(&self) -> usize {
        1 + self.dim()
    }

    fn diffuse_dim(&self) -> usize {
        self.base.diffuse_dim()
    }

    fn a0(&self, mut a: ArrayViewMut1<'_, f64>) {
        self.base.a0(a.slice_mut(s![1..]));
    }

    fn pf0(&self, mut pf: ArrayViewMut2<'_, f64>) {
        self.base.pf0(pf.slice_mut(s![1.., 1..]));
    }

    fn diffuse_constraints(&self, mut b: ArrayViewMut2<'_, f64>) {
        self.base.diffuse_constraints(b.slice_mut(s![1.., ..]));
    }

    fn pi0(&self, mut pi: ArrayViewMut2<'_, f64>) {
        self.base.pi0(pi.slice_mut(s![1.., 1..]));
    }
}

impl<S: Ssf> Dynamics for Cumulator<S> {
    fn is_time_invariant(&self) -> bool {
        false
    }

    fn noise_dim(&self) -> usize {
        self.base.noise_dim()
    }

    fn t(&self, pos: usize, mut t: ArrayViewMut2<'_, f64>) {
        let w = self.weight(pos);
        if w != 0.0 {
            t[[0, 0]] = w;
            self.base.z(pos, 0, t.slice_mut(s![0, 1..]));
            t.slice_mut(s![0, 1..]).mapv_inplace(|v| v * w);
        }
        self.base.t(pos, t.slice_mut(s![1.., 1..]));
    }

    fn s(&self, pos: usize, mut m: ArrayViewMut2<'_, f64>) {
        self.base.s(pos, m.slice_mut(s![1.., ..]));
    }

    fn v(&self, pos: usize, mut v: ArrayViewMut2<'_, f64>) {
        self.base.v(pos, v.slice_mut(s![1.., 1..]));
    }

    fn tx(&self, pos: usize, mut x: ArrayViewMut1<'_, f64>) {
        let w = self.weight(pos);
        let c = w * (x[0] + self.base.zx(pos, 0, x.slice(s![1..])));
        self.base.tx(pos, x.slice_mut(s![1..]));
        x[0] = c;
    }

    fn xt(&self, pos: usize, mut x: ArrayViewMut1<'_, f64>) {
        let head = self.weight(pos) * x[0];
        let mut tail = x.slice_mut(s![1..]);
        self.base.xt(pos, tail.view_mut());
        if head != 0.0 {
            self.base.xpzd(pos, 0, tail, head);
        }
        x[0] = head;
    }

    fn add_v(&self, pos: usize, mut p: ArrayViewMut2<'_, f64>) {
        self.base.add_v(pos, p.slice_mut(s![1.., 1..]));
    }
}

impl<S: Ssf> Measurement for Cumulator<S> {
    fn z(&self, pos: usize, _eq: usize, mut z: ArrayViewMut1<'_, f64>) {
        z[0] = 1.0;
        self.base.z(pos, 0, z.slice_mut(s![1..]));
    }

    fn error_variance(&self, pos: usize, _eq: usize) -> f64 {
        self.base.error_variance(pos, 0)
    }

    fn zx(&self, pos: usize, _eq: usize, x: ArrayView1<'_, f64>) -> f64 {
        x[0] + self.base.zx(pos, 0, x.slice(s![1..]))
    }

    fn xpzd(&self, pos: usize, _eq: usize, mut x: ArrayViewMut1<'_, f64>, d: f64) {
        x[0] += d;
        self.base.xpzd(pos, 0, x.slice_mut(s![1..]), d);
    }
}
