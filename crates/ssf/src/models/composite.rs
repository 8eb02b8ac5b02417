//! Sum of independent components.

use ndarray::{ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2, s};

use crate::error::SsfError;
use crate::model::{Dynamics, Initialization, Measurement, Ssf};

/// Boxed component of a [`Composite`].
pub type Component = Box<dyn Ssf + Send + Sync>;

#[derive(Clone, Copy, Debug)]
struct Block {
    state: usize,
    dim: usize,
    noise: usize,
    noise_dim: usize,
    diffuse: usize,
    diffuse_dim: usize,
}

/// Block-diagonal combination of components whose observations add up:
/// `y = Σ Z_c x_c + Σ e_c`.
pub struct Composite {
    components: Vec<Component>,
    blocks: Vec<Block>,
    equations: usize,
}

impl Composite {
    /// # Errors
    ///
    /// * [`SsfError::InvalidParameter`] for an empty component list.
    /// * [`SsfError::DimensionMismatch`] when components disagree on the
    ///   number of equations.
    pub fn new(components: Vec<Component>) -> Result<Self, SsfError> {
        let equations = components
            .first()
            .map(|c| c.equations())
            .ok_or(SsfError::InvalidParameter {
                name: "components",
                value: 0.0,
            })?;
        let mut blocks = Vec::with_capacity(components.len());
        let (mut state, mut noise, mut diffuse) = (0, 0, 0);
        for c in &components {
            if c.equations() != equations {
                return Err(SsfError::DimensionMismatch {
                    what: "component equations",
                    expected: equations,
                    actual: c.equations(),
                });
            }
            let block = Block {
                state,
                dim: c.state_dim(),
                noise,
                noise_dim: c.noise_dim(),
                diffuse,
                diffuse_dim: c.diffuse_dim(),
            };
            state += block.dim;
            noise += block.noise_dim;
            diffuse += block.diffuse_dim;
            blocks.push(block);
        }
        Ok(Self {
            components,
            blocks,
            equations,
        })
    }

    /// Number of components.
    pub fn len(&self) -> usize {
        self.components.len()
    }

    /// Always `false`; construction rejects an empty list.
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Offset of component `i` in the state vector.
    pub fn state_offset(&self, i: usize) -> usize {
        self.blocks[i].state
    }

    fn parts(&self) -> impl Iterator<Item = (&Component, &Block)> {
        self.components.iter().zip(&self.blocks)
    }
}

impl std::fmt::Debug for Composite {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Composite")
            .field("components", &self.components.len())
            .field("blocks", &self.blocks)
            .finish()
    }
}

impl Initialization for Composite {
    fn state_dim(&self) -> usize {
        self.blocks.iter().map(|b| b.dim).sum()
    }

    fn diffuse_dim(&self) -> usize {
        self.blocks.iter().map(|b| b.diffuse_dim).sum()
    }

    fn a0(&self, mut a: ArrayViewMut1<'_, f64>) {
        for (c, b) in self.parts() {
            c.a0(a.slice_mut(s![b.state..b.state + b.dim]));
        }
    }

    fn pf0(&self, mut pf: ArrayViewMut2<'_, f64>) {
        for (c, b) in self.parts() {
            let r = b.state..b.state + b.dim;
            c.pf0(pf.slice_mut(s![r.clone(), r]));
        }
    }

    fn diffuse_constraints(&self, mut m: ArrayViewMut2<'_, f64>) {
        for (c, b) in self.parts() {
            c.diffuse_constraints(m.slice_mut(s![
                b.state..b.state + b.dim,
                b.diffuse..b.diffuse + b.diffuse_dim
            ]));
        }
    }

    fn pi0(&self, mut pi: ArrayViewMut2<'_, f64>) {
        for (c, b) in self.parts() {
            let r = b.state..b.state + b.dim;
            c.pi0(pi.slice_mut(s![r.clone(), r]));
        }
    }
}

impl Dynamics for Composite {
    fn is_time_invariant(&self) -> bool {
        self.components.iter().all(|c| c.is_time_invariant())
    }

    fn noise_dim(&self) -> usize {
        self.blocks.iter().map(|b| b.noise_dim).sum()
    }

    fn t(&self, pos: usize, mut t: ArrayViewMut2<'_, f64>) {
        for (c, b) in self.parts() {
            let r = b.state..b.state + b.dim;
            c.t(pos, t.slice_mut(s![r.clone(), r]));
        }
    }

    fn s(&self, pos: usize, mut m: ArrayViewMut2<'_, f64>) {
        for (c, b) in self.parts() {
            c.s(
                pos,
                m.slice_mut(s![b.state..b.state + b.dim, b.noise..b.noise + b.noise_dim]),
            );
        }
    }

    fn v(&self, pos: usize, mut v: ArrayViewMut2<'_, f64>) {
        for (c, b) in self.parts() {
            let r = b.state..b.state + b.dim;
            c.v(pos, v.slice_mut(s![r.clone(), r]));
        }
    }

    fn tx(&self, pos: usize, mut x: ArrayViewMut1<'_, f64>) {
        for (c, b) in self.parts() {
            c.tx(pos, x.slice_mut(s![b.state..b.state + b.dim]));
        }
    }

    fn xt(&self, pos: usize, mut x: ArrayViewMut1<'_, f64>) {
        for (c, b) in self.parts() {
            c.xt(pos, x.slice_mut(s![b.state..b.state + b.dim]));
        }
    }

    fn tm(&self, pos: usize, mut m: ArrayViewMut2<'_, f64>) {
        for (c, b) in self.parts() {
            c.tm(pos, m.slice_mut(s![b.state..b.state + b.dim, ..]));
        }
    }

    fn mt(&self, pos: usize, mut m: ArrayViewMut2<'_, f64>) {
        for (c, b) in self.parts() {
            c.mt(pos, m.slice_mut(s![.., b.state..b.state + b.dim]));
        }
    }

    fn add_v(&self, pos: usize, mut p: ArrayViewMut2<'_, f64>) {
        for (c, b) in self.parts() {
            let r = b.state..b.state + b.dim;
            c.add_v(pos, p.slice_mut(s![r.clone(), r]));
        }
    }
}

impl Measurement for Composite {
    fn equations(&self) -> usize {
        self.equations
    }

    fn z(&self, pos: usize, eq: usize, mut z: ArrayViewMut1<'_, f64>) {
        for (c, b) in self.parts() {
            c.z(pos, eq, z.slice_mut(s![b.state..b.state + b.dim]));
        }
    }

    fn error_variance(&self, pos: usize, eq: usize) -> f64 {
        self.components.iter().map(|c| c.error_variance(pos, eq)).sum()
    }

    fn zx(&self, pos: usize, eq: usize, x: ArrayView1<'_, f64>) -> f64 {
        self.parts()
            .map(|(c, b)| c.zx(pos, eq, x.slice(s![b.state..b.state + b.dim])))
            .sum()
    }

    fn zm(&self, pos: usize, eq: usize, m: ArrayView2<'_, f64>, mut out: ArrayViewMut1<'_, f64>) {
        out.fill(0.0);
        let mut part = ndarray::Array1::zeros(out.len());
        for (c, b) in self.parts() {
            c.zm(pos, eq, m.slice(s![.., b.state..b.state + b.dim]), part.view_mut());
            out += &part;
        }
    }

    fn xpzd(&self, pos: usize, eq: usize, mut x: ArrayViewMut1<'_, f64>, d: f64) {
        for (c, b) in self.parts() {
            c.xpzd(pos, eq, x.slice_mut(s![b.state..b.state + b.dim]), d);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{diffuse_covariance, loading, transition};
    use crate::models::{ArmaSsf, LocalLevel, LocalLinearTrend};
    use approx::assert_abs_diff_eq;
    use ceres_arma::ArmaModel;
    use ndarray::{Array2, array};

    fn trend_plus_cycle() -> Composite {
        let trend = LocalLinearTrend::new(0.1, 0.01, 0.5).unwrap();
        let cycle = ArmaSsf::new(&ArmaModel::new(vec![0.7], vec![], 1.0).unwrap()).unwrap();
        Composite::new(vec![Box::new(trend), Box::new(cycle)]).unwrap()
    }

    #[test]
    fn dimensions_and_offsets() {
        let c = trend_plus_cycle();
        assert_eq!(c.len(), 2);
        assert_eq!(c.state_dim(), 3);
        assert_eq!(c.diffuse_dim(), 2);
        assert_eq!(c.noise_dim(), 3);
        assert_eq!(c.state_offset(1), 2);
        assert_eq!(c.error_variance(0, 0), 0.5);
        assert_eq!(loading(&c, 0, 0, 3), array![1.0, 0.0, 1.0]);
        assert_eq!(
            diffuse_covariance(&c),
            array![[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]]
        );
    }

    #[test]
    fn block_operations_match_dense() {
        let c = trend_plus_cycle();
        let t = transition(&c, 0, 3);
        assert_eq!(t, array![[1.0, 1.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.7]]);

        let p = array![[2.0, 0.3, 0.1], [0.3, 1.0, -0.2], [0.1, -0.2, 1.5]];
        let mut q = p.clone();
        c.tvt(0, q.view_mut());
        let dense = t.dot(&p).dot(&t.t());
        for (a, b) in q.iter().zip(dense.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-14);
        }

        let mut out = ndarray::Array1::zeros(3);
        c.zm(0, 0, p.view(), out.view_mut());
        for (a, b) in out.iter().zip([2.1, 0.1, 1.6]) {
            assert_abs_diff_eq!(*a, b, epsilon = 1e-14);
        }
        assert_abs_diff_eq!(c.zvz(0, 0, p.view()), 2.0 + 0.2 + 1.5, epsilon = 1e-14);

        let mut v = Array2::zeros((3, 3));
        c.v(0, v.view_mut());
        let mut w = Array2::zeros((3, 3));
        c.add_v(0, w.view_mut());
        for (a, b) in v.iter().zip(w.iter()) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-15);
        }
    }

    #[test]
    fn empty_list_rejected() {
        assert!(Composite::new(Vec::new()).is_err());
        let level: Component = Box::new(LocalLevel::new(1.0, 1.0).unwrap());
        assert!(Composite::new(vec![level]).is_ok());
    }
}
