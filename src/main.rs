use traffic_lake::config::DEFAULT_CONFIG_FILE;
use traffic_lake::transform::{column_plans, TransformOptions};
use traffic_lake::{Dataset, EngineSession, EtlConfig, JoinKey, PipelineDriver, WeekdayConvention};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "traffic-lake")]
#[command(about = "Load demographics, accident, weather and income CSVs into a Parquet lake")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the pipeline
    Run {
        /// Config file (default: dl.toml, optional unless given)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Location holding the input CSV files (overrides pipeline.base_path)
        #[arg(long)]
        base_path: Option<String>,

        /// Output location (overrides pipeline.output_path)
        #[arg(long)]
        output_path: Option<String>,

        /// Dataset to run; repeat for several (default: all)
        #[arg(short, long = "dataset", value_enum)]
        datasets: Vec<Dataset>,

        /// Run the selected datasets concurrently
        #[arg(long)]
        parallel: bool,

        /// Key for the demographics pivot and join
        #[arg(long, value_enum)]
        join_key: Option<JoinKey>,

        /// Numbering of the derived accident weekday
        #[arg(long, value_enum)]
        weekday: Option<WeekdayConvention>,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the column mapping of every dataset as JSON
    Plan,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();

    match args.command {
        Commands::Run {
            config,
            base_path,
            output_path,
            datasets,
            parallel,
            join_key,
            weekday,
            json,
        } => {
            let explicit = config.is_some();
            let config_path = config.unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));
            let mut config = EtlConfig::load_or_default(&config_path, explicit)
                .with_context(|| format!("Failed to load config {:?}", config_path))?;

            if base_path.is_some() {
                config.pipeline.base_path = base_path;
            }
            if output_path.is_some() {
                config.pipeline.output_path = output_path;
            }
            if let Some(join_key) = join_key {
                config.pipeline.demographics_join_key = join_key;
            }
            if let Some(weekday) = weekday {
                config.pipeline.weekday = weekday;
            }
            config.pipeline.parallel |= parallel;

            run_pipeline(config, datasets, json).await
        }
        Commands::Plan => print_plan(),
    }
}

async fn run_pipeline(config: EtlConfig, datasets: Vec<Dataset>, json: bool) -> Result<()> {
    let session = EngineSession::connect(&config).context("Failed to create engine session")?;
    let driver = PipelineDriver::from_config(session, &config);

    let report = if datasets.is_empty() {
        driver.run_all().await
    } else {
        driver.run(&datasets).await
    }
    .context("Pipeline run failed")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for dataset in &report.datasets {
            info!(
                "{:<12} {:>9} rows read {:>9} rows written -> {}",
                dataset.dataset, dataset.rows_read, dataset.rows_written, dataset.output
            );
        }
    }

    Ok(())
}

fn print_plan() -> Result<()> {
    let plan = column_plans(TransformOptions::default());
    println!("{}", serde_json::to_string_pretty(&plan)?);
    Ok(())
}
