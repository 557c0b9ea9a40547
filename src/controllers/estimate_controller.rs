use std::fmt::Write;

use anyhow::Context;
use serde_json::json;
use solar_estimator::models::estimate::{CalculationResult, EstimateReport};
use solar_estimator::{EstimatorConfig, estimate, recommend_panel_count};
use tracing::info;

use crate::cli::{EstimateArgs, OutputFormat};

/// solar-estimator estimate
/// Full estimate for one package
///
/// JSON output wraps the result with the generation time and the tariff and
/// price table versions it was computed against.
pub fn run_estimate(args: &EstimateArgs, config: &EstimatorConfig) -> anyhow::Result<String> {
    let input = args.to_input();
    let result = estimate(&input, config).context("estimate failed")?;
    info!(
        bill = input.monthly_bill,
        panels = input.panel_count,
        new_bill = result.new_monthly_bill(),
        "estimate computed"
    );

    match args.format {
        OutputFormat::Json => {
            let report = EstimateReport {
                generated_at: chrono::Utc::now(),
                tariff_version: config.tariff.version.clone(),
                price_table_version: config.pricing.version.clone(),
                input,
                result,
            };
            Ok(serde_json::to_string_pretty(&report)?)
        }
        OutputFormat::Text => Ok(render_text(&result)),
    }
}

/// solar-estimator recommend
/// Smallest package covering the consumption implied by the bill
pub fn run_recommend(bill: f64, sun_hours: f64, config: &EstimatorConfig) -> anyhow::Result<String> {
    let rec = recommend_panel_count(bill, sun_hours, config).context("recommendation failed")?;
    Ok(serde_json::to_string_pretty(&rec)?)
}

/// solar-estimator tariff
/// Band, all-in rate and implied monthly consumption for a bill
pub fn run_tariff(bill: f64, config: &EstimatorConfig) -> anyhow::Result<String> {
    let (band, consumption_kwh) = config.tariff.estimate_consumption(bill).context("tariff lookup failed")?;
    let body = json!({
        "tariff_version": config.tariff.version,
        "band": band,
        "rate_per_kwh": config.tariff.tier(band).rate(),
        "consumption_kwh": consumption_kwh,
    });
    Ok(serde_json::to_string_pretty(&body)?)
}

/// solar-estimator config
pub fn run_config(config: &EstimatorConfig) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(config)?)
}

fn years(value: Option<f64>) -> String {
    value.map_or_else(|| "never".to_string(), |y| format!("{y:.1} yrs"))
}

fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| "n/a".to_string(), |p| format!("{p:.1}%"))
}

fn render_text(r: &CalculationResult) -> String {
    let mut out = String::new();
    let rows = [
        ("Tariff band", format!("{:?} @ {:.4}/kWh", r.tariff_band, r.tariff_rate)),
        ("Consumption", format!("{:.0} kWh/month", r.consumption_kwh)),
        ("Installed", format!("{:.2} kWp / {:.2} kWac", r.installed_kwp, r.installed_kwac)),
        ("Generation", format!("{:.0} kWh/month", r.energy.generation_kwh)),
        ("Self-consumed", format!("{:.0} kWh", r.energy.self_consumed_kwh)),
        ("Exported", format!("{:.0} kWh", r.energy.exported_kwh)),
        ("Grid import", format!("{:.0} kWh", r.energy.grid_import_kwh)),
        ("Previous bill", format!("{:.2}", r.previous_monthly_bill)),
        ("New bill", format!("{:.2}", r.new_bill.total)),
        ("Savings", format!("{:.2}/month, {:.2}/year", r.savings.monthly, r.savings.yearly)),
        ("Bill offset", format!("{:.1}%", r.savings.bill_offset_percent)),
        ("Cash price", format!("{:.2}", r.cost.cash_price)),
        (
            "Installment",
            format!("{:.2} total, {:.2} x {}", r.cost.installment_total, r.cost.monthly_installment, r.cost.term_months),
        ),
        ("Payback (cash)", years(r.returns.payback_cash_years)),
        ("Payback (installment)", years(r.returns.payback_installment_years)),
        ("ROI (cash)", percent(r.returns.roi_cash_percent)),
        ("ROI (installment)", percent(r.returns.roi_installment_percent)),
        ("Fossil fuel avoided", format!("{:.0} kg", r.environment.fossil_fuel_kg)),
        ("Trees equivalent", format!("{:.1}", r.environment.trees)),
        ("CO2 avoided", format!("{:.2} t", r.environment.co2_tons)),
    ];
    for (label, value) in rows {
        // writing to a String cannot fail
        let _ = writeln!(out, "{label:<22} {value}");
    }
    out
}
