//! Orders of an ARMA model to be estimated.

use crate::config::FitOptions;
use crate::error::ArmaError;
use crate::fit::ArmaFit;

/// ARMA(p,q) orders, the input of maximum-likelihood estimation.
///
/// ```
/// use ceres_arma::{ArmaFilterKind, ArmaSpec, FitOptions};
///
/// let y = [0.3, -0.1, 0.8, 0.4, -0.6, 0.2, 0.9, -0.4, 0.1, 0.5];
/// let opts = FitOptions::new().with_filter(ArmaFilterKind::LjungBox);
/// let fit = ArmaSpec::new(0, 1).fit_with(&y, &opts).unwrap();
/// assert_eq!(fit.order(), (0, 1));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ArmaSpec {
    p: usize,
    q: usize,
}

impl ArmaSpec {
    /// AR order `p`, MA order `q`.
    pub fn new(p: usize, q: usize) -> Self {
        Self { p, q }
    }

    /// AR order.
    pub fn p(&self) -> usize {
        self.p
    }

    /// MA order.
    pub fn q(&self) -> usize {
        self.q
    }

    /// Number of estimated parameters, the coefficients plus the
    /// innovation variance.
    pub fn parameter_count(&self) -> usize {
        self.p + self.q + 1
    }

    /// Fits with [`FitOptions::default()`].
    ///
    /// The data are centred, then the concentrated exact likelihood is
    /// maximised over stationary and invertible coefficients.
    ///
    /// # Errors
    ///
    /// | Variant | Trigger |
    /// |---------|---------|
    /// | [`ArmaError::EmptyData`] | `data` is empty |
    /// | [`ArmaError::InsufficientData`] | fewer than `max(p, q, 1) + 1` values |
    /// | [`ArmaError::NonFiniteData`] | a value is NaN or infinite |
    /// | [`ArmaError::ConstantData`] | no variation to fit |
    /// | [`ArmaError::OptimizationFailed`] | Nelder-Mead fails or ends on a non-finite likelihood |
    pub fn fit(&self, data: &[f64]) -> Result<ArmaFit, ArmaError> {
        self.fit_with(data, &FitOptions::default())
    }

    /// Fits with explicit options.
    ///
    /// # Errors
    ///
    /// As [`ArmaSpec::fit()`], plus [`ArmaError::InvalidOption`].
    pub fn fit_with(&self, data: &[f64], options: &FitOptions) -> Result<ArmaFit, ArmaError> {
        crate::optimizer::fit_arma(self.p, self.q, data, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::ArmaFilterKind;
    use crate::likelihood::ArmaLikelihood;
    use approx::assert_relative_eq;

    const SAMPLE: [f64; 12] = [0.4, -0.2, 1.1, 0.3, -0.8, 0.5, 0.9, -1.0, 0.2, 0.0, 0.7, -0.3];

    #[test]
    fn rejects_unusable_data() {
        let cases: [(&[f64], fn(&ArmaError) -> bool); 4] = [
            (&[], |e| matches!(e, ArmaError::EmptyData)),
            (&[1.0, 2.0], |e| matches!(e, ArmaError::InsufficientData { n: 2, min: 3 })),
            (&[1.0, f64::INFINITY, 3.0, 0.0], |e| matches!(e, ArmaError::NonFiniteData)),
            (&[5.0; 6], |e| matches!(e, ArmaError::ConstantData)),
        ];
        for (data, expected) in cases {
            let err = ArmaSpec::new(2, 0).fit(data).unwrap_err();
            assert!(expected(&err), "{data:?}: {err:?}");
        }
    }

    #[test]
    fn parameter_count_includes_variance() {
        assert_eq!(ArmaSpec::new(0, 0).parameter_count(), 1);
        assert_eq!(ArmaSpec::new(2, 1).parameter_count(), 4);
    }

    #[test]
    fn reported_likelihood_is_exact_at_the_estimate() {
        let opts = FitOptions::new().with_filter(ArmaFilterKind::Ansley);
        let fit = ArmaSpec::new(1, 1).fit_with(&SAMPLE, &opts).unwrap();
        let centred: Vec<f64> = SAMPLE.iter().map(|y| y - fit.mean()).collect();
        let at_estimate = ArmaLikelihood::evaluate(fit.model(), &centred, ArmaFilterKind::Ansley).unwrap();
        assert_relative_eq!(fit.log_likelihood(), at_estimate.log_likelihood(), max_relative = 1e-9);
        assert_relative_eq!(at_estimate.sigma2(), 1.0, max_relative = 1e-9);
    }
}
