//! TOML configuration for the numerical options of every layer.
//!
//! ```toml
//! [cholesky]
//! zero_tolerance = 1e-12
//!
//! [arma]
//! filter = "ljung-box"
//! max_iters = 500
//!
//! [kalman]
//! diffuse_tolerance = 1e-8
//! retain_history = false
//! ```
//!
//! Every section and key is optional; missing keys take the library
//! defaults.

use std::path::Path;

use anyhow::{Context, Result};
use ceres_arma::{ArmaFilterKind, FitOptions};
use ceres_matrix::CholeskyOptions;
use ceres_ssf::KalmanOptions;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CeresConfig {
    /// Cholesky factorization settings.
    #[serde(default)]
    pub cholesky: CholeskyToml,

    /// ARMA fitting settings.
    #[serde(default)]
    pub arma: ArmaToml,

    /// Kalman filter settings.
    #[serde(default)]
    pub kalman: KalmanToml,
}

impl CeresConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let config: Self = toml::from_str(s).context("failed to parse TOML config")?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("invalid config file: {}", path.display()))
    }

    /// Checks every section against the library constraints.
    pub fn validate(&self) -> Result<()> {
        self.cholesky.options().validate().context("invalid [cholesky] section")?;
        self.arma.options().validate().context("invalid [arma] section")?;
        self.kalman.options().validate().context("invalid [kalman] section")?;
        Ok(())
    }
}

/// `[cholesky]`
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CholeskyToml {
    /// Fixed zero tolerance; the size-scaled default when absent.
    #[serde(default)]
    pub zero_tolerance: Option<f64>,
}

impl CholeskyToml {
    pub fn options(&self) -> CholeskyOptions {
        match self.zero_tolerance {
            Some(tol) => CholeskyOptions::new().with_zero_tolerance(tol),
            None => CholeskyOptions::new(),
        }
    }
}

/// Likelihood filter used by ARMA fits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FilterChoice {
    /// Chosen per model order and sample size.
    #[default]
    Auto,
    Ansley,
    LjungBox,
}

/// `[arma]`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ArmaToml {
    #[serde(default)]
    pub filter: FilterChoice,
    #[serde(default = "default_max_iters")]
    pub max_iters: u64,
    #[serde(default = "default_sd_tolerance")]
    pub sd_tolerance: f64,
}

impl Default for ArmaToml {
    fn default() -> Self {
        Self {
            filter: FilterChoice::Auto,
            max_iters: default_max_iters(),
            sd_tolerance: default_sd_tolerance(),
        }
    }
}

impl ArmaToml {
    pub fn options(&self) -> FitOptions {
        let options = FitOptions::new()
            .with_max_iters(self.max_iters)
            .with_sd_tolerance(self.sd_tolerance);
        match self.filter {
            FilterChoice::Auto => options,
            FilterChoice::Ansley => options.with_filter(ArmaFilterKind::Ansley),
            FilterChoice::LjungBox => options.with_filter(ArmaFilterKind::LjungBox),
        }
    }
}

fn default_max_iters() -> u64 {
    1000
}
fn default_sd_tolerance() -> f64 {
    1e-8
}

/// `[kalman]`
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct KalmanToml {
    #[serde(default = "default_variance_tolerance")]
    pub variance_tolerance: f64,
    #[serde(default = "default_diffuse_tolerance")]
    pub diffuse_tolerance: f64,
    #[serde(default = "default_true")]
    pub retain_history: bool,
}

impl Default for KalmanToml {
    fn default() -> Self {
        Self {
            variance_tolerance: default_variance_tolerance(),
            diffuse_tolerance: default_diffuse_tolerance(),
            retain_history: true,
        }
    }
}

impl KalmanToml {
    pub fn options(&self) -> KalmanOptions {
        KalmanOptions::new()
            .with_variance_tolerance(self.variance_tolerance)
            .with_diffuse_tolerance(self.diffuse_tolerance)
            .with_history(self.retain_history)
    }
}

fn default_variance_tolerance() -> f64 {
    1e-12
}
fn default_diffuse_tolerance() -> f64 {
    1e-9
}
fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_gives_library_defaults() {
        let config = CeresConfig::from_toml_str("").unwrap();
        assert_eq!(config.cholesky.options(), CholeskyOptions::default());
        assert_eq!(config.arma.options(), FitOptions::default());
        assert_eq!(config.kalman.options(), KalmanOptions::default());
    }

    #[test]
    fn filter_names() {
        let config = CeresConfig::from_toml_str("[arma]\nfilter = \"ljung-box\"").unwrap();
        assert_eq!(config.arma.options().filter(), Some(ArmaFilterKind::LjungBox));
        let config = CeresConfig::from_toml_str("[arma]\nfilter = \"auto\"").unwrap();
        assert_eq!(config.arma.options().filter(), None);
        assert!(CeresConfig::from_toml_str("[arma]\nfilter = \"kalman\"").is_err());
    }

    #[test]
    fn unknown_keys_rejected() {
        assert!(CeresConfig::from_toml_str("[kalman]\ntolerance = 1.0").is_err());
        assert!(CeresConfig::from_toml_str("[smoother]").is_err());
    }

    #[test]
    fn out_of_range_values_rejected() {
        let err = CeresConfig::from_toml_str("[kalman]\ndiffuse_tolerance = -1.0").unwrap_err();
        assert!(format!("{err:#}").contains("[kalman]"));
        assert!(CeresConfig::from_toml_str("[arma]\nmax_iters = 0").is_err());
        assert!(CeresConfig::from_toml_str("[cholesky]\nzero_tolerance = -1e-3").is_err());
    }
}
