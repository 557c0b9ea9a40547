use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ─── Input ───────────────────────────────────────────────────────────────────

/// What the caller knows about the household and the package they are
/// considering.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CalculationInput {
    /// Average monthly electricity bill (currency)
    pub monthly_bill: f64,
    pub panel_count: u32,
    /// Average peak-sun hours per day at the site
    pub sunlight_hours: f64,
    #[serde(default)]
    pub no_sun_days_per_month: u32,
    /// Overrides the configured share of consumption that happens in daylight
    #[serde(default)]
    pub daytime_usage_ratio: Option<f64>,
    #[serde(default)]
    pub include_battery: bool,
    /// Adds the online-estimate price buffer
    #[serde(default)]
    pub online_view: bool,
}

impl CalculationInput {
    pub fn new(monthly_bill: f64, panel_count: u32, sunlight_hours: f64) -> Self {
        Self {
            monthly_bill,
            panel_count,
            sunlight_hours,
            no_sun_days_per_month: 0,
            daytime_usage_ratio: None,
            include_battery: false,
            online_view: false,
        }
    }

    pub fn with_no_sun_days(mut self, days: u32) -> Self {
        self.no_sun_days_per_month = days;
        self
    }

    pub fn with_daytime_ratio(mut self, ratio: f64) -> Self {
        self.daytime_usage_ratio = Some(ratio);
        self
    }

    pub fn with_battery(mut self, include: bool) -> Self {
        self.include_battery = include;
        self
    }

    pub fn with_online_view(mut self, online: bool) -> Self {
        self.online_view = online;
        self
    }
}

// ─── Intermediate records ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TariffBand {
    Low,
    High,
}

/// Monthly energy balance after solar (all kWh).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct EnergyFlows {
    pub generation_kwh: f64,
    pub daytime_demand_kwh: f64,
    /// Solar used directly while it is produced
    pub self_consumed_kwh: f64,
    /// Generation left after self-consumption
    pub excess_kwh: f64,
    pub battery_charged_kwh: f64,
    pub battery_discharged_kwh: f64,
    pub exported_kwh: f64,
    pub grid_import_kwh: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SurchargeLine {
    pub name: String,
    pub amount: f64,
}

/// Post-solar monthly bill, line by line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BillBreakdown {
    pub energy_charge: f64,
    pub capacity_charge: f64,
    pub network_charge: f64,
    pub retail_charge: f64,
    /// Credit actually deducted (capped by the energy charge it offsets)
    pub export_credit: f64,
    pub surcharges: Vec<SurchargeLine>,
    /// Grid draw was under the waiver threshold
    pub waived: bool,
    pub total: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CostQuote {
    pub base_price: f64,
    pub battery_surcharge: f64,
    pub online_buffer: f64,
    pub cash_price: f64,
    pub installment_total: f64,
    pub monthly_installment: f64,
    pub term_months: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Savings {
    pub daily: f64,
    pub monthly: f64,
    pub yearly: f64,
    pub lifetime: f64,
    pub per_panel_monthly: f64,
    pub bill_offset_percent: f64,
}

/// `None` means the system never pays for itself (no yearly savings).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Returns {
    pub payback_cash_years: Option<f64>,
    pub payback_installment_years: Option<f64>,
    pub roi_cash_percent: Option<f64>,
    pub roi_installment_percent: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct EnvironmentalOffsets {
    pub fossil_fuel_kg: f64,
    pub trees: f64,
    pub co2_tons: f64,
}

// ─── Result ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CalculationResult {
    pub tariff_band: TariffBand,
    /// All-in rate used to back out consumption from the bill
    pub tariff_rate: f64,
    /// Estimated monthly consumption (kWh)
    pub consumption_kwh: f64,
    pub effective_sun_hours: f64,
    pub installed_kwp: f64,
    pub installed_kwac: f64,
    pub generation_per_panel_kwh: f64,
    pub energy: EnergyFlows,
    pub previous_monthly_bill: f64,
    pub new_bill: BillBreakdown,
    pub savings: Savings,
    pub cost: CostQuote,
    pub returns: Returns,
    pub annual_maintenance_cost: f64,
    pub environment: EnvironmentalOffsets,
}

impl CalculationResult {
    pub fn new_monthly_bill(&self) -> f64 {
        self.new_bill.total
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Recommendation {
    pub tariff_band: TariffBand,
    pub consumption_kwh: f64,
    pub required_kwp: f64,
    /// Panels needed to cover consumption exactly, before package rounding
    pub raw_panels: u32,
    pub recommended_panels: u32,
}

/// Envelope written by the CLI.
#[derive(Debug, Serialize)]
pub struct EstimateReport {
    pub generated_at: DateTime<Utc>,
    pub tariff_version: String,
    pub price_table_version: String,
    pub input: CalculationInput,
    pub result: CalculationResult,
}
