//! IPDR usage analysis
//!
//! Loads a month of IPDR (IP Detail Record) CSV files and charts:
//! - Daily download & upload volume
//! - Download distribution by day of week
//! - Average daily download per area code
//! - Top devices by volume within one area code

mod analysis;
mod charts;
mod config;
mod engine;
mod error;
mod format;
mod web;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

use crate::charts::RenderedCharts;
use crate::engine::Engine;

const PREVIEW_ROWS: i64 = 5;

#[derive(Debug, Parser)]
#[command(name = "ipdr-analysis", version, about = "Exploratory analysis of IPDR network usage records")]
struct Cli {
    /// Configuration file (optional; defaults apply when missing)
    #[arg(long, default_value = "config.toml", env = "IPDR_CONFIG")]
    config: String,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print summary tables and write the chart pages to the output directory
    Report {
        /// Overrides `output.dir`
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Run the analysis once and serve the dashboard
    Serve,
}

fn init_logging(level: &str) {
    // Use LOG_FORMAT=gcp for structured GCP Cloud Logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let log_format = std::env::var("LOG_FORMAT").unwrap_or_default();
    if log_format == "gcp" {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_stackdriver::layer())
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (before any other initialization)
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = config::Config::load(&cli.config)?;
    init_logging(&config.logging.level);
    info!("Configuration loaded");

    let engine = Engine::new(&config.engine).await?;
    info!("Engine session started ({})", config.engine.url);

    let report = analysis::run(&engine, &config.ingest, &config.analysis).await?;
    let charts = RenderedCharts::render(&report);

    match cli.command.unwrap_or(Command::Report { output: None }) {
        Command::Report { output } => {
            println!("{}", format::schema_table(&engine.describe_schema()));
            println!("{}", format::preview_table(&engine.preview(PREVIEW_ROWS).await?));
            println!("{}", format::ingest_table(&report.ingest));
            println!("{}", format::summary_table(&report.summary));

            let dir = output.unwrap_or_else(|| PathBuf::from(&config.output.dir));
            for path in charts.write_all(&dir)? {
                println!("{}", path.display());
            }
        }
        Command::Serve => {
            web::start_server(&config, report, charts).await?;
        }
    }

    Ok(())
}
