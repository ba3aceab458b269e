//! Sales Forecast - command line front end for the serving core

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sales_forecast::request::DEFAULT_STEPS;
use sales_forecast::store::{bulk_load, loader::DEFAULT_TAIL, open_store};
use sales_forecast::tracking::{monitor, queryable_tracker};
use sales_forecast::{logging, ForecastRequest, PredictRequest, SalesService, ServiceConfig};
use serde::Serialize;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "sales-forecast")]
#[command(about = "Weekly store sales prediction and per-store forecasting", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML configuration file (defaults apply when omitted)
    #[arg(short, long, env = "SALES_FORECAST_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Predict one week of sales for a store
    Predict {
        /// Full request as JSON; takes precedence over the individual flags
        #[arg(long)]
        json: Option<String>,
        #[arg(long)]
        store: Option<u32>,
        /// Week date as DD-MM-YYYY
        #[arg(long)]
        date: Option<String>,
        #[arg(long, default_value_t = 0)]
        holiday_flag: u8,
        #[arg(long)]
        temperature: Option<f64>,
        #[arg(long)]
        fuel_price: Option<f64>,
        #[arg(long)]
        cpi: Option<f64>,
        #[arg(long)]
        unemployment: Option<f64>,
    },
    /// Forecast the next weeks of sales for a store
    Forecast {
        #[arg(long)]
        store: u32,
        /// Number of weeks to project
        #[arg(long, default_value_t = DEFAULT_STEPS, allow_negative_numbers = true)]
        steps: i64,
    },
    /// List runs recorded under an experiment
    Monitor {
        /// Experiment name (defaults to the prediction experiment)
        #[arg(long)]
        experiment: Option<String>,
    },
    /// Seed the observation store from a historical sales CSV
    Load {
        csv: PathBuf,
        /// Rows kept per store
        #[arg(long, default_value_t = DEFAULT_TAIL)]
        tail: usize,
    },
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn predict_request(
    json: Option<String>,
    store: Option<u32>,
    date: Option<String>,
    holiday_flag: u8,
    weather: [Option<f64>; 4],
) -> Result<PredictRequest> {
    if let Some(json) = json {
        return Ok(PredictRequest::from_json(&json)?);
    }

    let (Some(store_id), Some(date)) = (store, date) else {
        bail!("either --json or both --store and --date are required");
    };
    let [Some(temperature), Some(fuel_price), Some(cpi), Some(unemployment)] = weather else {
        bail!("--temperature, --fuel-price, --cpi and --unemployment are required without --json");
    };

    Ok(PredictRequest {
        store_id,
        date,
        holiday_flag,
        temperature,
        fuel_price,
        cpi,
        unemployment,
    })
}

fn main() -> Result<()> {
    logging::init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ServiceConfig::load(path)
            .with_context(|| format!("loading configuration from {}", path.display()))?,
        None => ServiceConfig::default(),
    };

    match cli.command {
        Commands::Predict {
            json,
            store,
            date,
            holiday_flag,
            temperature,
            fuel_price,
            cpi,
            unemployment,
        } => {
            let request = predict_request(
                json,
                store,
                date,
                holiday_flag,
                [temperature, fuel_price, cpi, unemployment],
            )?;
            let service = SalesService::from_config(&config)?;
            print_json(&service.predict(&request)?)
        }
        Commands::Forecast { store, steps } => {
            let service = SalesService::from_config(&config)?;
            print_json(&service.forecast(&ForecastRequest::new(store, steps))?)
        }
        Commands::Monitor { experiment } => {
            let experiment = experiment.unwrap_or_else(|| config.tracking.experiment.clone());
            let tracker = queryable_tracker(&config.tracking)?;
            print_json(&monitor(tracker.as_ref(), &experiment)?)
        }
        Commands::Load { csv, tail } => {
            let store = open_store(&config.store)?;
            let rows = bulk_load(store.as_ref(), &csv, tail)
                .with_context(|| format!("loading {}", csv.display()))?;
            print_json(&serde_json::json!({ "rows": rows, "total": store.len()? }))
        }
    }
}
