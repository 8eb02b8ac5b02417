//! # ceres-ssf
//!
//! Linear Gaussian state-space models, a Kalman filter with exact diffuse
//! initialization, and the matching fixed-interval smoother.
//!
//! ## Workflow
//!
//! ```mermaid
//! graph LR
//!     M["model: impl Ssf"] -->|"KalmanFilter::filter(&m, y)?"| F["FilteringResults"]
//!     F --> L[".likelihood(): DiffuseLikelihood"]
//!     F -->|"smooth(&m, &f)?"| S["SmoothingResults"]
//!     M -->|"run(&m, y)?"| R["SsfRun"]
//!     M -->|"simulate(&m, n, &mut rng)?"| Y["Array2 observations"]
//! ```
//!
//! A model is anything implementing [`Initialization`], [`Dynamics`] and
//! [`Measurement`]; the blanket [`Ssf`] trait bundles them. The provided
//! models cover ARMA and ARIMA processes, basic structural components,
//! sums of components ([`Composite`]) and temporal aggregation
//! ([`Cumulator`]).
//!
//! ```
//! use ceres_ssf::{run_univariate, LocalLevel};
//!
//! let model = LocalLevel::new(0.5, 1.0).unwrap();
//! let out = run_univariate(&model, &[1.0, f64::NAN, 3.0]).unwrap();
//! assert!((out.smoothed.state(1)[0] - 2.0).abs() < 1e-12);
//! assert_eq!(out.likelihood.n_diffuse(), 1);
//! ```
//!
//! ## Glossary
//!
//! | Symbol | Item | Meaning |
//! |--------|------|---------|
//! | `T`, `S`, `V` | [`Dynamics`] | Transition, noise loading, `S Sᵗ` |
//! | `Z`, `H` | [`Measurement`] | Loading row and error variance of an equation |
//! | `Pf0`, `Pi0` | [`Initialization`] | Stationary and diffuse initial covariances |
//! | `v`, `f` | [`FilteringResults::innovations()`] | Innovation and its variance |
//! | `f∞` | [`UpdateKind::Diffuse`] | Diffuse part of the innovation variance |
//! | diffuse end | [`FilteringResults::diffuse_end()`] | First position without diffuse uncertainty |

pub mod batch;
mod config;
mod error;
mod kalman;
mod likelihood;
mod lyapunov;
mod model;
mod models;
mod run;
mod simulate;
mod smoother;

pub use batch::log_likelihoods;
pub use config::KalmanOptions;
pub use error::SsfError;
pub use kalman::{FilteringResults, KalmanFilter, UpdateKind};
pub use likelihood::DiffuseLikelihood;
pub use lyapunov::solve_discrete_lyapunov;
pub use model::{
    Dynamics, Initialization, Measurement, Ssf, diffuse_covariance, loading, stationary_covariance,
    transition,
};
pub use models::{ArimaSsf, ArmaSsf, Component, Composite, Cumulator, LocalLevel, LocalLinearTrend};
pub use run::{SsfRun, run, run_univariate, run_with};
pub use simulate::simulate;
pub use smoother::{SmoothingResults, smooth};
