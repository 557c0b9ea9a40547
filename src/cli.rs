use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use solar_estimator::CalculationInput;

#[derive(Debug, Parser)]
#[command(name = "solar-estimator", version, about = "Estimate savings and payback of a rooftop solar package")]
pub struct Cli {
    /// JSON config with tariff, price table and system parameters
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Full savings, cost and payback estimate for one package
    Estimate(EstimateArgs),
    /// Suggest a package size for a bill
    Recommend {
        #[arg(long, allow_negative_numbers = true)]
        bill: f64,
        #[arg(long)]
        sun_hours: f64,
    },
    /// Show the tariff band and implied consumption for a bill
    Tariff {
        #[arg(long, allow_negative_numbers = true)]
        bill: f64,
    },
    /// Print the effective configuration
    Config,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Text,
}

#[derive(Debug, Args)]
pub struct EstimateArgs {
    /// Average monthly electricity bill
    #[arg(long, allow_negative_numbers = true)]
    pub bill: f64,
    #[arg(long)]
    pub panels: u32,
    /// Average peak-sun hours per day
    #[arg(long)]
    pub sun_hours: f64,
    #[arg(long, default_value_t = 0)]
    pub no_sun_days: u32,
    /// Share of consumption during daylight (0..=1)
    #[arg(long)]
    pub daytime_ratio: Option<f64>,
    #[arg(long)]
    pub battery: bool,
    /// Include the online-estimate price buffer
    #[arg(long)]
    pub online: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
    pub format: OutputFormat,
}

impl EstimateArgs {
    pub fn to_input(&self) -> CalculationInput {
        let mut input = CalculationInput::new(self.bill, self.panels, self.sun_hours)
            .with_no_sun_days(self.no_sun_days)
            .with_battery(self.battery)
            .with_online_view(self.online);
        if let Some(ratio) = self.daytime_ratio {
            input = input.with_daytime_ratio(ratio);
        }
        input
    }
}
