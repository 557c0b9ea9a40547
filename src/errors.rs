use thiserror::Error;

/// Failures reported by the estimator itself.
///
/// Only bad input and an undefined tariff band are faults; every other
/// boundary outcome (zero savings, negative bill) has a defined value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EstimateError {
    #[error("invalid input `{field}`: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    #[error(
        "monthly bill {bill:.2} falls between tariff bands (low band up to {low_max:.2}, high band from {high_min:.2})"
    )]
    UndefinedTariffBand { bill: f64, low_max: f64, high_min: f64 },
}

impl EstimateError {
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        EstimateError::InvalidInput { field, reason: reason.into() }
    }
}

/// Failures while loading or validating an [`EstimatorConfig`](crate::config::EstimatorConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    Invalid(String),
}
