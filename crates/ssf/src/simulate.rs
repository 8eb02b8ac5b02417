//! Unconditional simulation of a state-space model.

use ceres_matrix::cholesky_lower;
use ndarray::{Array1, Array2};
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::error::SsfError;
use crate::model::{Ssf, stationary_covariance};

/// Draws `n` positions of observations (`n x equations`).
///
/// The initial state is `a0 + L z` with `L Lᵗ = Pf0`; the diffuse part of
/// the state stays at `a0`.
///
/// # Errors
///
/// * [`SsfError::Matrix`] when `Pf0` is not positive semi-definite.
/// * [`SsfError::InvalidParameter`] for a negative error variance.
pub fn simulate<S, R>(ssf: &S, n: usize, rng: &mut R) -> Result<Array2<f64>, SsfError>
where
    S: Ssf + ?Sized,
    R: Rng + ?Sized,
{
    let d = ssf.state_dim();
    let q = ssf.noise_dim();
    let equations = ssf.equations();

    let mut x = Array1::zeros(d);
    ssf.a0(x.view_mut());
    let mut l = stationary_covariance(ssf);
    cholesky_lower(l.view_mut())?;
    let z: Array1<f64> = (0..d).map(|_| StandardNormal.sample(rng)).collect();
    x += &l.dot(&z);

    let mut y = Array2::zeros((n, equations));
    let mut s = Array2::zeros((d, q));
    for pos in 0..n {
        for eq in 0..equations {
            let h = ssf.error_variance(pos, eq);
            if !h.is_finite() || h < 0.0 {
                return Err(SsfError::InvalidParameter {
                    name: "error_variance",
                    value: h,
                });
            }
            let e: f64 = StandardNormal.sample(rng);
            y[[pos, eq]] = ssf.zx(pos, eq, x.view()) + h.sqrt() * e;
        }
        ssf.tx(pos, x.view_mut());
        if q > 0 {
            s.fill(0.0);
            ssf.s(pos, s.view_mut());
            let u: Array1<f64> = (0..q).map(|_| StandardNormal.sample(rng)).collect();
            x += &s.dot(&u);
        }
    }
    Ok(y)
}
