//! Concrete state-space models.

mod arima;
mod arma;
mod composite;
mod cumulator;
mod structural;

pub use arima::ArimaSsf;
pub use arma::ArmaSsf;
pub use composite::{Component, Composite};
pub use cumulator::Cumulator;
pub use structural::{LocalLevel, LocalLinearTrend};
