/// ============================================================
///  Solar savings estimator
///
///  Algorithm pipeline:
///   1. Tariff band      – bill thresholds select the low/high tier
///   2. Consumption      – bill / all-in tier rate
///   3. Generation       – per-panel yield × panel count
///   4. Energy split     – daytime self-consumption, battery, export
///   5. New bill         – grid draw priced by sub-charge, export
///                         credit, surcharges or waiver
///   6. Savings          – old bill − new bill, floored at zero
///   7. Cost             – tiered package price, extras, installments
///   8. Returns          – payback and ROI, `None` without savings
///   9. Environment      – per-kWp offset factors
/// ============================================================

use tracing::debug;

use crate::config::EstimatorConfig;
use crate::errors::EstimateError;
use crate::models::estimate::{
    CalculationInput, CalculationResult, EnvironmentalOffsets, Recommendation, Returns, Savings,
};
use crate::services::energy;

const MONTHS_PER_YEAR: f64 = 12.0;

/// Main entry point. Pure: the same input and config always give the same
/// result.
pub fn estimate(input: &CalculationInput, config: &EstimatorConfig) -> Result<CalculationResult, EstimateError> {
    let system = &config.system;
    let daytime_ratio = validate(input, config)?;

    // ── 1–2. Tariff band & consumption ─────────────────────────
    let (tariff_band, consumption_kwh) = config.tariff.estimate_consumption(input.monthly_bill)?;
    let tariff_rate = config.tariff.tier(tariff_band).rate();
    debug!(?tariff_band, tariff_rate, consumption_kwh, "tariff selected");

    // ── 3. Generation ──────────────────────────────────────────
    let effective_sun_hours = energy::effective_sun_hours(input.sunlight_hours, input.no_sun_days_per_month, system);
    let generation_per_panel_kwh = energy::panel_generation_kwh(system, effective_sun_hours);
    let generation_kwh = generation_per_panel_kwh * f64::from(input.panel_count);
    let installed_kwp = energy::installed_kwp(system, input.panel_count);

    // ── 4. Energy split ────────────────────────────────────────
    let battery = input.include_battery.then_some(&config.battery);
    let flows = energy::split_generation(consumption_kwh, generation_kwh, daytime_ratio, battery, system.days_per_month);

    // ── 5. New bill ────────────────────────────────────────────
    let new_bill = config.tariff.bill_for_grid_draw(flows.grid_import_kwh, flows.exported_kwh);

    // ── 6. Savings ─────────────────────────────────────────────
    let monthly = (input.monthly_bill - new_bill.total).max(0.0);
    let yearly = monthly * MONTHS_PER_YEAR;
    let lifetime = yearly * f64::from(system.system_life_years);
    let savings = Savings {
        daily: monthly / f64::from(system.days_per_month),
        monthly,
        yearly,
        lifetime,
        per_panel_monthly: monthly / f64::from(input.panel_count),
        bill_offset_percent: (monthly / input.monthly_bill * 100.0).min(100.0),
    };

    // ── 7. Cost ────────────────────────────────────────────────
    let cost = config
        .pricing
        .quote(input.panel_count, input.include_battery, input.online_view, &config.financing)?;

    // ── 8. Returns ─────────────────────────────────────────────
    let returns = Returns {
        payback_cash_years: payback_years(cost.cash_price, yearly),
        payback_installment_years: payback_years(cost.installment_total, yearly),
        roi_cash_percent: roi_percent(cost.cash_price, yearly, lifetime),
        roi_installment_percent: roi_percent(cost.installment_total, yearly, lifetime),
    };
    debug!(monthly_savings = monthly, cash_price = cost.cash_price, ?returns, "financials");

    // ── 9. Environment ─────────────────────────────────────────
    let factors = &config.environment;
    let environment = EnvironmentalOffsets {
        fossil_fuel_kg: installed_kwp * factors.fossil_fuel_kg,
        trees: installed_kwp * factors.trees,
        co2_tons: installed_kwp * factors.co2_tons,
    };

    Ok(CalculationResult {
        tariff_band,
        tariff_rate,
        consumption_kwh,
        effective_sun_hours,
        installed_kwp,
        installed_kwac: installed_kwp * system.ac_ratio,
        generation_per_panel_kwh,
        energy: flows,
        previous_monthly_bill: input.monthly_bill,
        new_bill,
        savings,
        cost,
        returns,
        annual_maintenance_cost: system.annual_maintenance_cost,
        environment,
    })
}

/// Smallest package that covers the consumption implied by `monthly_bill`.
pub fn recommend_panel_count(
    monthly_bill: f64,
    sunlight_hours: f64,
    config: &EstimatorConfig,
) -> Result<Recommendation, EstimateError> {
    validate_sun_hours(sunlight_hours)?;
    let system = &config.system;
    let (tariff_band, consumption_kwh) = config.tariff.estimate_consumption(monthly_bill)?;

    let required_kwp = consumption_kwh / (sunlight_hours * f64::from(system.days_per_month));
    let raw_panels = (required_kwp * 1000.0 / system.panel_wattage).ceil() as u32;
    let recommended_panels = config
        .pricing
        .package_at_least(raw_panels)
        .unwrap_or_else(|| raw_panels.min(system.max_panels));
    debug!(required_kwp, raw_panels, recommended_panels, "package recommendation");

    Ok(Recommendation {
        tariff_band,
        consumption_kwh,
        required_kwp,
        raw_panels,
        recommended_panels,
    })
}

/// Checks everything the tariff lookup doesn't and returns the daytime ratio
/// to use.
fn validate(input: &CalculationInput, config: &EstimatorConfig) -> Result<f64, EstimateError> {
    let system = &config.system;
    let smallest = config.pricing.tiers.first().map_or(1, |t| t.min_panels);
    if input.panel_count < smallest || input.panel_count > system.max_panels {
        return Err(EstimateError::invalid(
            "panel_count",
            format!("{} is outside {smallest}..={}", input.panel_count, system.max_panels),
        ));
    }
    validate_sun_hours(input.sunlight_hours)?;
    if input.no_sun_days_per_month > system.days_per_month {
        return Err(EstimateError::invalid(
            "no_sun_days_per_month",
            format!("{} exceeds the {} days of a month", input.no_sun_days_per_month, system.days_per_month),
        ));
    }
    let ratio = input.daytime_usage_ratio.unwrap_or(system.daytime_usage_ratio);
    if !(0.0..=1.0).contains(&ratio) {
        return Err(EstimateError::invalid("daytime_usage_ratio", format!("{ratio} is outside 0..=1")));
    }
    Ok(ratio)
}

fn validate_sun_hours(hours: f64) -> Result<(), EstimateError> {
    if hours.is_finite() && hours > 0.0 && hours <= 24.0 {
        Ok(())
    } else {
        Err(EstimateError::invalid("sunlight_hours", format!("{hours} is outside (0, 24]")))
    }
}

fn payback_years(price: f64, yearly_savings: f64) -> Option<f64> {
    (yearly_savings > 0.0).then(|| price / yearly_savings)
}

fn roi_percent(price: f64, yearly_savings: f64, lifetime_savings: f64) -> Option<f64> {
    (yearly_savings > 0.0 && price > 0.0).then(|| (lifetime_savings - price) / price * 100.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn payback_is_none_without_savings() {
        assert_eq!(payback_years(17000.0, 0.0), None);
        assert_eq!(roi_percent(17000.0, 0.0, 0.0), None);
        assert_eq!(payback_years(17000.0, 1700.0), Some(10.0));
        assert_eq!(roi_percent(10000.0, 1000.0, 25000.0), Some(150.0));
    }

    #[test]
    fn rejects_out_of_range_modifiers() {
        let config = EstimatorConfig::default();
        let cases = [
            (CalculationInput::new(600.0, 5, 4.0), "panel_count"),
            (CalculationInput::new(600.0, 101, 4.0), "panel_count"),
            (CalculationInput::new(600.0, 10, 0.0), "sunlight_hours"),
            (CalculationInput::new(600.0, 10, 25.0), "sunlight_hours"),
            (CalculationInput::new(600.0, 10, 4.0).with_no_sun_days(31), "no_sun_days_per_month"),
            (CalculationInput::new(600.0, 10, 4.0).with_daytime_ratio(1.5), "daytime_usage_ratio"),
        ];
        for (input, expected) in cases {
            match estimate(&input, &config) {
                Err(EstimateError::InvalidInput { field, .. }) => assert_eq!(field, expected),
                other => panic!("expected invalid {expected}, got {other:?}"),
            }
        }
    }

    #[test]
    fn recommendation_rounds_up_to_a_package() {
        let config = EstimatorConfig::default();
        // 600 / 0.4443 = 1350.44 kWh; / (4 h × 30) = 11.25 kWp; / 0.615 = 18.3
        let rec = recommend_panel_count(600.0, 4.0, &config).unwrap();
        assert_eq!(rec.raw_panels, 19);
        assert_eq!(rec.recommended_panels, 20);
    }

    #[test]
    fn recommendation_above_largest_package_is_capped() {
        let config = EstimatorConfig::default();
        let rec = recommend_panel_count(5000.0, 3.0, &config).unwrap();
        assert!(rec.raw_panels > 40);
        assert_eq!(rec.recommended_panels, rec.raw_panels.min(config.system.max_panels));
    }
}
