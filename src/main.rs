mod cli;
mod controllers;

use anyhow::Context;
use clap::Parser;
use solar_estimator::EstimatorConfig;
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::controllers::estimate_controller;

fn main() -> anyhow::Result<()> {
    // 1. Logging to stderr, stdout carries the report
    let default_directive = if cfg!(feature = "verbose_log") {
        "solar_estimator=debug"
    } else {
        "solar_estimator=info"
    };
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive)))
        .init();

    let cli = Cli::parse();

    // 2. Load configuration
    let config = match &cli.config {
        Some(path) => {
            let config = EstimatorConfig::load(path)
                .with_context(|| format!("failed to load config {}", path.display()))?;
            info!(
                path = %path.display(),
                tariff = %config.tariff.version,
                price_table = %config.pricing.version,
                "configuration loaded"
            );
            config
        }
        None => EstimatorConfig::default(),
    };

    // 3. Dispatch
    let output = match &cli.command {
        Command::Estimate(args) => estimate_controller::run_estimate(args, &config)?,
        Command::Recommend { bill, sun_hours } => estimate_controller::run_recommend(*bill, *sun_hours, &config)?,
        Command::Tariff { bill } => estimate_controller::run_tariff(*bill, &config)?,
        Command::Config => estimate_controller::run_config(&config)?,
    };
    println!("{output}");
    Ok(())
}
