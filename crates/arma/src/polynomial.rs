//! Lag polynomials.

use std::ops::Mul;

use crate::params;

/// Polynomial in the lag operator `B`; index 0 is the constant term.
#[derive(Clone, Debug, PartialEq)]
pub struct Polynomial {
    coefficients: Vec<f64>,
}

impl Polynomial {
    /// Builds a polynomial from its coefficients, constant term first.
    /// An empty vector is the zero polynomial.
    pub fn new(coefficients: Vec<f64>) -> Self {
        Self { coefficients }
    }

    /// The constant polynomial `1`.
    pub fn one() -> Self {
        Self::new(vec![1.0])
    }

    /// AR polynomial `1 - φ₁B - … - φₚBᵖ`.
    pub fn from_ar(phi: &[f64]) -> Self {
        let mut c = Vec::with_capacity(phi.len() + 1);
        c.push(1.0);
        c.extend(phi.iter().map(|v| -v));
        Self::new(c)
    }

    /// MA polynomial `1 + θ₁B + … + θ_qB^q`.
    pub fn from_ma(theta: &[f64]) -> Self {
        let mut c = Vec::with_capacity(theta.len() + 1);
        c.push(1.0);
        c.extend_from_slice(theta);
        Self::new(c)
    }

    /// Differencing operator `(1 - B)^d`.
    pub fn differencing(d: usize) -> Self {
        let base = Self::new(vec![1.0, -1.0]);
        (0..d).fold(Self::one(), |acc, _| acc.multiply(&base))
    }

    /// Degree, ignoring trailing zero coefficients (zero polynomial: 0).
    pub fn degree(&self) -> usize {
        self.coefficients
            .iter()
            .rposition(|c| *c != 0.0)
            .unwrap_or(0)
    }

    /// Coefficients, constant term first.
    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Coefficient of `Bⁱ` (zero beyond the stored length).
    pub fn get(&self, i: usize) -> f64 {
        self.coefficients.get(i).copied().unwrap_or(0.0)
    }

    /// Value at `x` (Horner).
    pub fn evaluate(&self, x: f64) -> f64 {
        self.coefficients.iter().rev().fold(0.0, |acc, c| acc * x + c)
    }

    /// Product of two polynomials.
    pub fn multiply(&self, other: &Self) -> Self {
        if self.coefficients.is_empty() || other.coefficients.is_empty() {
            return Self::new(Vec::new());
        }
        let mut c = vec![0.0; self.coefficients.len() + other.coefficients.len() - 1];
        for (i, a) in self.coefficients.iter().enumerate() {
            for (j, b) in other.coefficients.iter().enumerate() {
                c[i + j] += a * b;
            }
        }
        Self::new(c)
    }

    /// `true` when every root lies strictly outside the unit circle.
    ///
    /// Uses the step-down recursion on the normalized coefficients,
    /// which needs no root finding. A zero constant term is never
    /// stationary.
    pub fn is_stationary(&self) -> bool {
        let c0 = self.get(0);
        if c0 == 0.0 || !c0.is_finite() {
            return false;
        }
        let phi: Vec<f64> = (1..=self.degree()).map(|i| -self.get(i) / c0).collect();
        params::partial_autocorrelations(&phi).is_some()
    }
}

impl Mul for &Polynomial {
    type Output = Polynomial;

    fn mul(self, rhs: &Polynomial) -> Polynomial {
        self.multiply(rhs)
    }
}
