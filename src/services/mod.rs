pub mod energy;
pub mod estimator;
pub mod pricing;
pub mod tariff;
