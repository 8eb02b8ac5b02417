//! # ceres-arma
//!
//! Exact Gaussian likelihood of ARMA(p,q) samples through structured
//! Cholesky factorizations, and maximum-likelihood fitting on top of it.
//!
//! ## Likelihood Workflow
//!
//! ```mermaid
//! graph LR
//!     M["ArmaModel::new(phi, theta, var)?"] --> S["ArmaFilterKind::select(p, q, n)"]
//!     S -->|"Ansley"| A["AnsleyFilter (band Cholesky)"]
//!     S -->|"LjungBox"| L["LjungBoxFilter (pre-sample correction)"]
//!     A --> R[".filter(&y)?: whitened residuals"]
//!     L --> R
//!     R --> LL["ArmaLikelihood::log_likelihood()"]
//! ```
//!
//! ## Fitting Workflow
//!
//! ```mermaid
//! graph LR
//!     A["ArmaSpec::new(p, q)"] -->|".fit(&data)?"| B["ArmaFit"]
//!     B --> C[".model(): ArmaModel"]
//!     B --> F[".aic(): Akaike Information Criterion"]
//!     B --> G[".simulate(n, n_sim, &mut rng)?"]
//!     H["select_best_aic(&data, max_p, max_q)?"] -->|"parallel grid search"| B
//! ```
//!
//! ## Two Usage Paths
//!
//! **Likelihood of a known model**:
//! ```
//! use ceres_arma::{ArmaFilterKind, ArmaLikelihood, ArmaModel};
//!
//! let model = ArmaModel::new(vec![0.5], vec![0.3], 1.0).unwrap();
//! let y = [0.2, -0.4, 1.1, 0.7, -0.3];
//! let ll = ArmaLikelihood::evaluate(&model, &y, ArmaFilterKind::Ansley).unwrap();
//! assert!(ll.log_likelihood().is_finite());
//! ```
//!
//! **Estimation** (known or searched orders):
//! ```ignore
//! let fit = ArmaSpec::new(2, 1).fit(&data)?;
//! let best = select_best_aic(&data, 2, 2)?;
//! ```
//!
//! ## Mathematical Glossary
//!
//! | Symbol | Accessor | Meaning |
//! |--------|----------|---------|
//! | phi | [`ArmaModel::phi()`] | AR coefficients: weights on past observations |
//! | theta | [`ArmaModel::theta()`] | MA coefficients: weights on past innovations |
//! | sigma2 | [`ArmaModel::variance()`] | Innovation (white-noise) variance |
//! | psi | [`ArmaModel::psi_weights()`] | MA(∞) weights |
//! | logDet | [`ArmaFilter::log_determinant()`] | `ln` of the sample covariance determinant |
//! | AIC | [`ArmaFit::aic()`] | Akaike Information Criterion (lower = better) |

mod ansley;
mod config;
mod error;
mod filter;
mod fit;
mod likelihood;
mod ljung_box;
mod model;
mod polynomial;
mod selection;
mod spec;

pub(crate) mod optimizer;
pub(crate) mod params;

pub use ansley::AnsleyFilter;
pub use config::FitOptions;
pub use error::ArmaError;
pub use filter::{ArmaFilter, ArmaFilterKind, ArmaFilterStrategy};
pub use fit::ArmaFit;
pub use likelihood::ArmaLikelihood;
pub use ljung_box::LjungBoxFilter;
pub use model::ArmaModel;
pub use polynomial::Polynomial;
pub use selection::{select_best_aic, select_best_aic_with};
pub use spec::ArmaSpec;
