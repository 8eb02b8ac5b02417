//! Stationary lag polynomials parametrized by partial autocorrelations
//! (Jones 1980, Monahan 1984).
//!
//! Coefficients follow the AR convention `1 - φ₁B - … - φₚBᵖ`. A vector
//! of partial autocorrelations in `(-1, 1)` and a stationary coefficient
//! vector determine each other through the step-up and step-down
//! recursions; `tanh` and `atanh` extend the map to unconstrained
//! parameters.

/// Stationary coefficients from unconstrained parameters: `r_k = tanh(α_k)`
/// followed by the step-up recursion.
pub(crate) fn unconstrained_to_coeffs(alpha: &[f64]) -> Vec<f64> {
    alpha.iter().fold(Vec::with_capacity(alpha.len()), |prev, a| {
        let r = a.tanh();
        let k = prev.len();
        let mut next: Vec<f64> = (0..k).map(|j| prev[j] - r * prev[k - 1 - j]).collect();
        next.push(r);
        next
    })
}

/// Partial autocorrelations of `phi` by the step-down recursion, or `None`
/// when some `|r_k| >= 1` (the polynomial has a root on or inside the
/// unit circle).
pub(crate) fn partial_autocorrelations(phi: &[f64]) -> Option<Vec<f64>> {
    let p = phi.len();
    let mut r = vec![0.0; p];
    let mut cur = phi.to_vec();
    for k in (1..=p).rev() {
        let rk = cur[k - 1];
        if !rk.is_finite() || rk.abs() >= 1.0 {
            return None;
        }
        r[k - 1] = rk;
        let denom = 1.0 - rk * rk;
        let prev: Vec<f64> = (0..k - 1)
            .map(|j| (cur[j] + rk * cur[k - 2 - j]) / denom)
            .collect();
        cur = prev;
    }
    Some(r)
}

/// Inverse of [`unconstrained_to_coeffs()`]; `None` for non-stationary
/// coefficients.
pub(crate) fn coeffs_to_unconstrained(phi: &[f64]) -> Option<Vec<f64>> {
    partial_autocorrelations(phi).map(|r| r.iter().map(|rk| rk.atanh()).collect())
}
