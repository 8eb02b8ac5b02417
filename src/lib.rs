//! # ceres
//!
//! Structured linear algebra, exact ARMA likelihoods and state-space
//! filtering, re-exported from the workspace crates together with a TOML
//! configuration layer and `tracing` setup.
//!
//! ## Layers
//!
//! ```mermaid
//! graph LR
//!     M["ceres-matrix: windows, Cholesky, LU, band"] --> A["ceres-arma: Ansley / Ljung-Box filters, fitting"]
//!     A --> S["ceres-ssf: SSF traits, diffuse Kalman filter and smoother"]
//!     C["CeresConfig (TOML)"] -->|".options()"| M
//!     C --> A
//!     C --> S
//! ```
//!
//! ```
//! use ceres::config::CeresConfig;
//! use ceres::ssf::{KalmanFilter, LocalLevel};
//!
//! let config = CeresConfig::from_toml_str("[kalman]\nretain_history = false").unwrap();
//! let filter = KalmanFilter::new(config.kalman.options());
//! let model = LocalLevel::new(0.5, 1.0).unwrap();
//! let out = filter.filter_univariate(&model, &[1.0, 2.0, 0.5]).unwrap();
//! assert!(!out.has_history());
//! assert_eq!(out.likelihood().n_obs(), 3);
//! ```

pub mod config;
pub mod logging;

pub use ceres_arma as arma;
pub use ceres_matrix as matrix;
pub use ceres_ssf as ssf;
