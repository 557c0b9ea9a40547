use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::ConfigError;

fn default_version() -> String { "2025-07".to_string() }

/// Everything the estimator needs besides the per-call input.
///
/// Each section is independently defaulted, so a config file only has to
/// spell out what differs from the built-in tables.
#[derive(Debug, Default, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct EstimatorConfig {
    pub tariff: TariffSchedule,
    pub pricing: PriceTable,
    pub system: SystemParams,
    pub battery: BatteryParams,
    pub financing: FinancingTerms,
    pub environment: EnvironmentalFactors,
}

// ─── Tariff ──────────────────────────────────────────────────────────────────

/// Per-kWh sub-charges of one tariff tier.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct TariffTier {
    pub energy_rate: f64,
    pub capacity_rate: f64,
    pub network_rate: f64,
}

impl TariffTier {
    /// All-in rate per kWh.
    pub fn rate(&self) -> f64 {
        self.energy_rate + self.capacity_rate + self.network_rate
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Surcharge {
    pub name: String,
    /// Fraction, e.g. 0.08 for 8 %
    pub rate: f64,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaxOrder {
    /// Each surcharge applies to the subtotal left by the previous one.
    #[default]
    Compounding,
    /// Every surcharge applies to the pre-tax subtotal.
    Flat,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExportCreditTiming {
    #[default]
    BeforeTax,
    AfterTax,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(default)]
pub struct TaxPolicy {
    pub order: TaxOrder,
    pub export_credit: ExportCreditTiming,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct TariffSchedule {
    #[serde(default = "default_version")]
    pub version: String,
    pub low: TariffTier,
    pub high: TariffTier,
    /// Bills up to and including this amount use the low tier.
    pub low_band_max_bill: f64,
    /// Bills from this amount upwards use the high tier.
    pub high_band_min_bill: f64,
    /// Grid draw above this many kWh is priced at the high tier's energy rate.
    pub tier_boundary_kwh: f64,
    pub retail_charge: f64,
    pub export_credit_rate: f64,
    /// Grid draw at or below this many kWh pays no retail charge or surcharges.
    pub waiver_threshold_kwh: f64,
    /// Applied in list order.
    pub surcharges: Vec<Surcharge>,
    pub tax_policy: TaxPolicy,
}

impl Default for TariffSchedule {
    fn default() -> Self {
        Self {
            version: default_version(),
            low: TariffTier { energy_rate: 0.2703, capacity_rate: 0.0455, network_rate: 0.1285 },
            high: TariffTier { energy_rate: 0.3703, capacity_rate: 0.0455, network_rate: 0.1285 },
            low_band_max_bill: 666.45,
            high_band_min_bill: 816.45,
            tier_boundary_kwh: 1500.0,
            retail_charge: 10.0,
            export_credit_rate: 0.2703,
            waiver_threshold_kwh: 600.0,
            surcharges: vec![
                Surcharge { name: "kwtbb".to_string(), rate: 0.016 },
                Surcharge { name: "sst".to_string(), rate: 0.08 },
            ],
            tax_policy: TaxPolicy::default(),
        }
    }
}

// ─── Installation pricing ────────────────────────────────────────────────────

/// Price of the first `min_panels` panels of a package, plus a fixed
/// increment for every panel above it.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
pub struct PriceTier {
    pub min_panels: u32,
    pub base_price: f64,
    pub per_panel_increment: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct PriceTable {
    #[serde(default = "default_version")]
    pub version: String,
    /// Ascending by `min_panels`
    pub tiers: Vec<PriceTier>,
    pub battery_surcharge: f64,
    pub online_buffer: f64,
}

impl Default for PriceTable {
    fn default() -> Self {
        let tier = |min_panels, base_price| PriceTier { min_panels, base_price, per_panel_increment: 1000.0 };
        Self {
            version: default_version(),
            tiers: vec![tier(10, 17000.0), tier(20, 27000.0), tier(30, 36000.0), tier(40, 45000.0)],
            battery_surcharge: 12000.0,
            online_buffer: 1500.0,
        }
    }
}

// ─── Physical / financial parameters ─────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct SystemParams {
    /// W per panel
    pub panel_wattage: f64,
    /// kWac / kWp
    pub ac_ratio: f64,
    /// Share of a sunny day's yield produced on a no-sun day
    pub overcast_yield_factor: f64,
    pub daytime_usage_ratio: f64,
    pub days_per_month: u32,
    pub system_life_years: u32,
    pub annual_maintenance_cost: f64,
    pub max_panels: u32,
}

impl Default for SystemParams {
    fn default() -> Self {
        Self {
            panel_wattage: 615.0,
            ac_ratio: 0.77,
            overcast_yield_factor: 0.1,
            daytime_usage_ratio: 0.20,
            days_per_month: 30,
            system_life_years: 25,
            annual_maintenance_cost: 800.0,
            max_panels: 100,
        }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct BatteryParams {
    /// kWh that can be cycled once per day
    pub usable_capacity_kwh: f64,
    pub round_trip_efficiency: f64,
}

impl Default for BatteryParams {
    fn default() -> Self {
        Self { usable_capacity_kwh: 10.0, round_trip_efficiency: 0.9 }
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct FinancingTerms {
    /// Flat interest over the whole term
    pub interest_rate: f64,
    pub term_months: u32,
}

impl Default for FinancingTerms {
    fn default() -> Self {
        Self { interest_rate: 0.05, term_months: 60 }
    }
}

/// Offsets per installed kWp.
#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq)]
#[serde(default)]
pub struct EnvironmentalFactors {
    pub fossil_fuel_kg: f64,
    pub trees: f64,
    pub co2_tons: f64,
}

impl Default for EnvironmentalFactors {
    fn default() -> Self {
        Self { fossil_fuel_kg: 350.0, trees: 2.0, co2_tons: 0.85 }
    }
}

// ─── Loading & validation ────────────────────────────────────────────────────

impl EstimatorConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: EstimatorConfig = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.tariff;
        for (name, tier) in [("low", &t.low), ("high", &t.high)] {
            let rates = [tier.energy_rate, tier.capacity_rate, tier.network_rate];
            if rates.iter().any(|r| !r.is_finite() || *r < 0.0) || tier.rate() <= 0.0 {
                return Err(invalid(format!("tariff tier `{name}` needs non-negative rates summing above zero")));
            }
        }
        if !(t.low_band_max_bill > 0.0 && t.low_band_max_bill <= t.high_band_min_bill) {
            return Err(invalid(format!(
                "tariff bands overlap or are empty: low up to {}, high from {}",
                t.low_band_max_bill, t.high_band_min_bill
            )));
        }
        let non_negative = [
            ("tier_boundary_kwh", t.tier_boundary_kwh),
            ("retail_charge", t.retail_charge),
            ("export_credit_rate", t.export_credit_rate),
            ("waiver_threshold_kwh", t.waiver_threshold_kwh),
            ("battery_surcharge", self.pricing.battery_surcharge),
            ("online_buffer", self.pricing.online_buffer),
            ("annual_maintenance_cost", self.system.annual_maintenance_cost),
            ("usable_capacity_kwh", self.battery.usable_capacity_kwh),
            ("interest_rate", self.financing.interest_rate),
            ("fossil_fuel_kg", self.environment.fossil_fuel_kg),
            ("trees", self.environment.trees),
            ("co2_tons", self.environment.co2_tons),
        ];
        if let Some((name, _)) = non_negative.iter().find(|(_, v)| !v.is_finite() || *v < 0.0) {
            return Err(invalid(format!("`{name}` must be a non-negative number")));
        }
        if let Some(s) = t.surcharges.iter().find(|s| !s.rate.is_finite() || s.rate < 0.0) {
            return Err(invalid(format!("surcharge `{}` has a negative rate", s.name)));
        }

        self.validate_price_table()?;

        let s = &self.system;
        if !(s.panel_wattage.is_finite() && s.panel_wattage > 0.0) {
            return Err(invalid("panel_wattage must be positive"));
        }
        for (name, v) in [
            ("ac_ratio", s.ac_ratio),
            ("overcast_yield_factor", s.overcast_yield_factor),
            ("daytime_usage_ratio", s.daytime_usage_ratio),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(invalid(format!("`{name}` must be within 0..=1")));
            }
        }
        if s.days_per_month == 0 || s.system_life_years == 0 {
            return Err(invalid("days_per_month and system_life_years must be positive"));
        }
        let first_tier = self.pricing.tiers[0].min_panels;
        if s.max_panels < first_tier {
            return Err(invalid(format!("max_panels {} is below the smallest package ({first_tier})", s.max_panels)));
        }

        let e = self.battery.round_trip_efficiency;
        if !(e > 0.0 && e <= 1.0) {
            return Err(invalid("round_trip_efficiency must be within (0, 1]"));
        }
        if self.financing.term_months == 0 {
            return Err(invalid("term_months must be positive"));
        }
        Ok(())
    }

    /// Tiers must be ascending and the resulting price curve must never drop
    /// when crossing into the next tier.
    fn validate_price_table(&self) -> Result<(), ConfigError> {
        let tiers = &self.pricing.tiers;
        let Some(first) = tiers.first() else {
            return Err(invalid("price table has no tiers"));
        };
        if first.min_panels == 0 {
            return Err(invalid("the first price tier must start at one panel or more"));
        }
        for tier in tiers {
            if !(tier.base_price.is_finite() && tier.base_price >= 0.0)
                || !(tier.per_panel_increment.is_finite() && tier.per_panel_increment >= 0.0)
            {
                return Err(invalid(format!("price tier at {} panels has a negative price", tier.min_panels)));
            }
        }
        for pair in tiers.windows(2) {
            let (prev, next) = (&pair[0], &pair[1]);
            if next.min_panels <= prev.min_panels {
                return Err(invalid("price tiers must be strictly ascending by min_panels"));
            }
            let last_in_prev = prev.base_price + f64::from(next.min_panels - 1 - prev.min_panels) * prev.per_panel_increment;
            if next.base_price < last_in_prev {
                return Err(invalid(format!(
                    "price drops from {last_in_prev} to {} at {} panels",
                    next.base_price, next.min_panels
                )));
            }
        }
        Ok(())
    }
}

fn invalid(msg: impl Into<String>) -> ConfigError {
    ConfigError::Invalid(msg.into())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn default_config_is_valid() {
        EstimatorConfig::default().validate().unwrap();
    }

    #[test]
    fn default_tier_rates_match_published_tariff() {
        let t = TariffSchedule::default();
        assert!((t.low.rate() - 0.4443).abs() < 1e-9);
        assert!((t.high.rate() - 0.5443).abs() < 1e-9);
    }

    #[test]
    fn partial_file_falls_back_to_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{ "financing": {{ "term_months": 84 }}, "system": {{ "panel_wattage": 550 }} }}"#).unwrap();

        let config = EstimatorConfig::load(file.path()).unwrap();
        assert_eq!(config.financing.term_months, 84);
        assert_eq!(config.financing.interest_rate, 0.05);
        assert_eq!(config.system.panel_wattage, 550.0);
        assert_eq!(config.tariff, TariffSchedule::default());
    }

    #[test]
    fn tax_policy_parses_from_screaming_case() {
        let policy: TaxPolicy = serde_json::from_str(r#"{ "order": "FLAT", "export_credit": "AFTER_TAX" }"#).unwrap();
        assert_eq!(policy.order, TaxOrder::Flat);
        assert_eq!(policy.export_credit, ExportCreditTiming::AfterTax);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = EstimatorConfig::load("/nonexistent/solar.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "{{ not json").unwrap();
        assert!(matches!(EstimatorConfig::load(file.path()), Err(ConfigError::Json(_))));
    }

    #[test]
    fn rejects_price_drop_between_tiers() {
        let mut config = EstimatorConfig::default();
        // 10..19 climbs to 26000, so a 20-panel base of 25000 would be cheaper
        config.pricing.tiers[1].base_price = 25000.0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("price drops"), "{err}");
    }

    #[test]
    fn rejects_unsorted_tiers() {
        let mut config = EstimatorConfig::default();
        config.pricing.tiers.swap(0, 1);
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_overlapping_bands() {
        let mut config = EstimatorConfig::default();
        config.tariff.low_band_max_bill = 900.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn rejects_empty_price_table() {
        let mut config = EstimatorConfig::default();
        config.pricing.tiers.clear();
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }
}
