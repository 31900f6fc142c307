use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use foodshock::calibration::{
    average_sigma, gini_from_sigma, p90_p10_from_sigma, sigma_from_gini, sigma_from_p90_p10,
};
use foodshock::manager::Manager;
use foodshock::scenario::Shock;
use serde_json::json;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(version, about)]
struct CLI {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the scenario of the config file.
    Run {
        #[arg(long)]
        config: PathBuf,
    },

    /// Scale every household's income by a common factor.
    Income {
        #[arg(long)]
        config: PathBuf,

        #[arg(long)]
        factor: f64,
    },

    /// Move the food price to a new level.
    Price {
        #[arg(long)]
        config: PathBuf,

        #[arg(long)]
        new_price: f64,
    },

    /// Calibrate sigma from inequality targets.
    Calibrate {
        #[arg(long)]
        gini: Option<f64>,

        #[arg(long)]
        p90_p10: Option<f64>,
    },
}

fn main() {
    env_logger::Builder::new()
        .format_timestamp_millis()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    if let Err(error) = run_cli() {
        log::error!("{error:#?}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<()> {
    let args = CLI::parse();
    log::info!("{args:#?}");

    let output = match args.command {
        Command::Run { config } => {
            let mgr = Manager::from_file(config).context("failed to construct mgr")?;
            serde_json::to_value(mgr.run_configured()?)?
        }
        Command::Income { config, factor } => {
            let mgr = Manager::from_file(config).context("failed to construct mgr")?;
            serde_json::to_value(mgr.run(Shock::income(factor))?)?
        }
        Command::Price { config, new_price } => {
            let mgr = Manager::from_file(config).context("failed to construct mgr")?;
            serde_json::to_value(mgr.run(Shock::price(new_price))?)?
        }
        Command::Calibrate { gini, p90_p10 } => calibrate(gini, p90_p10)?,
    };

    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

fn calibrate(gini: Option<f64>, p90_p10: Option<f64>) -> Result<serde_json::Value> {
    let output = match (gini, p90_p10) {
        (Some(gini), Some(ratio)) => serde_json::to_value(average_sigma(gini, ratio)?)?,
        (Some(gini), None) => {
            let sigma = sigma_from_gini(gini)?;
            json!({ "sigma_gini": sigma, "p90_p10_at_sigma": p90_p10_from_sigma(sigma) })
        }
        (None, Some(ratio)) => {
            let sigma = sigma_from_p90_p10(ratio)?;
            json!({ "sigma_p90_p10": sigma, "gini_at_sigma": gini_from_sigma(sigma) })
        }
        (None, None) => bail!("calibrate needs --gini and/or --p90-p10"),
    };
    Ok(output)
}
