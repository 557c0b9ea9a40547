/// ============================================================
///  Monthly energy balance
///
///  Pipeline:
///   1. Effective sun hours  – sunny days at full yield, no-sun days
///                             at the overcast yield factor
///   2. Generation           – kWp × effective hours × days
///   3. Daytime split        – solar serves daytime demand first,
///                             the rest is excess
///   4. Battery routing      – excess charges the battery up to its
///                             monthly throughput, discharge covers
///                             night demand, the remainder is exported
/// ============================================================

use tracing::debug;

use crate::config::{BatteryParams, SystemParams};
use crate::models::estimate::EnergyFlows;

/// Average daily sun hours once heavily overcast days are derated.
pub fn effective_sun_hours(sunlight_hours: f64, no_sun_days: u32, params: &SystemParams) -> f64 {
    let days = f64::from(params.days_per_month);
    let no_sun = f64::from(no_sun_days.min(params.days_per_month));
    let sunny = days - no_sun;
    (sunny * sunlight_hours + no_sun * sunlight_hours * params.overcast_yield_factor) / days
}

/// Monthly kWh from a single panel.
pub fn panel_generation_kwh(params: &SystemParams, sun_hours: f64) -> f64 {
    params.panel_wattage / 1000.0 * sun_hours * f64::from(params.days_per_month)
}

/// Installed peak capacity in kW.
pub fn installed_kwp(params: &SystemParams, panel_count: u32) -> f64 {
    f64::from(panel_count) * params.panel_wattage / 1000.0
}

/// Route one month of generation against one month of consumption.
///
/// `battery` is `None` when no battery is installed; its usable capacity is
/// cycled once per day, so the monthly throughput is capacity × days.
pub fn split_generation(
    consumption_kwh: f64,
    generation_kwh: f64,
    daytime_ratio: f64,
    battery: Option<&BatteryParams>,
    days_per_month: u32,
) -> EnergyFlows {
    let daytime_demand_kwh = consumption_kwh * daytime_ratio;
    let night_demand_kwh = consumption_kwh - daytime_demand_kwh;
    let self_consumed_kwh = generation_kwh.min(daytime_demand_kwh);
    let excess_kwh = generation_kwh - self_consumed_kwh;
    let unmet_daytime_kwh = daytime_demand_kwh - self_consumed_kwh;

    let (battery_charged_kwh, battery_discharged_kwh) = match battery {
        Some(b) => {
            let storage_kwh = b.usable_capacity_kwh * f64::from(days_per_month);
            let charged = excess_kwh.min(storage_kwh);
            let discharged = (charged * b.round_trip_efficiency).min(night_demand_kwh);
            (charged, discharged)
        }
        None => (0.0, 0.0),
    };

    let flows = EnergyFlows {
        generation_kwh,
        daytime_demand_kwh,
        self_consumed_kwh,
        excess_kwh,
        battery_charged_kwh,
        battery_discharged_kwh,
        exported_kwh: excess_kwh - battery_charged_kwh,
        grid_import_kwh: unmet_daytime_kwh + night_demand_kwh - battery_discharged_kwh,
    };
    debug!(?flows, "energy split");
    flows
}
