//! Solar installation savings estimator.
//!
//! [`estimate`] turns a monthly electricity bill, a panel package and the
//! site's sun hours into savings, installation cost, payback/ROI and
//! environmental offsets. All tariff and price tables come in through
//! [`EstimatorConfig`]; nothing is global.

pub mod config;
pub mod errors;
pub mod models;
pub mod services;

pub use config::EstimatorConfig;
pub use errors::{ConfigError, EstimateError};
pub use models::estimate::{CalculationInput, CalculationResult, Recommendation, TariffBand};
pub use services::estimator::{estimate, recommend_panel_count};
