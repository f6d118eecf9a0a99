//! CLI entry point for the rental stress pipeline.
//!
//! Each stage of the pipeline is a subcommand; `run` executes all of them
//! in order.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use rent_stress::config::PipelineConfig;
use rent_stress::pipeline::{
    PipelinePaths, build_database, export_view, process_bonds, process_income, process_trends,
    run_all,
};
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::{
    EnvFilter, Layer,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

#[derive(Parser)]
#[command(name = "rent_stress")]
#[command(about = "Ranks localities by rental stress from census income and bond data", long_about = None)]
struct Cli {
    /// Directory holding the raw source files
    #[arg(long, global = true, default_value = "raw_data")]
    raw_dir: PathBuf,

    /// Directory for every generated artifact
    #[arg(long, global = true, default_value = "processed_data")]
    out_dir: PathBuf,

    /// Optional JSON file overriding localities and the wage index factor
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize census income data
    Income {
        /// Census CSV (defaults to the G02 file under --raw-dir)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Aggregate rental bond lodgements into quarterly medians and a snapshot
    Bonds {
        /// Bond lodgement workbook or CSV (defaults to bond_data.xlsx under --raw-dir)
        #[arg(short, long)]
        input: Option<PathBuf>,
    },
    /// Build the SQLite store and the affordability view
    Database,
    /// Compute compound annual rent growth per locality
    Trends,
    /// Export the affordability view to CSV
    Export,
    /// Run every stage in order
    Run {
        #[arg(long)]
        income_input: Option<PathBuf>,

        #[arg(long)]
        bond_input: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/rent_stress.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("rent_stress.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::from_env("RUST_LOG").add_directive("info".parse()?));

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(EnvFilter::from_env("RUST_LOG_JSON").add_directive("debug".parse()?));

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => PipelineConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => PipelineConfig::default(),
    };
    let mut paths = PipelinePaths::new(&cli.raw_dir, &cli.out_dir);

    match cli.command {
        Commands::Income { input } => {
            if let Some(input) = input {
                paths.income_input = input;
            }
            process_income(&paths, &config).context("income stage failed")?;
        }
        Commands::Bonds { input } => {
            if let Some(input) = input {
                paths.bond_input = input;
            }
            process_bonds(&paths, &config).context("bonds stage failed")?;
        }
        Commands::Database => {
            build_database(&paths).context("database stage failed")?;
        }
        Commands::Trends => {
            process_trends(&paths, &config).context("trends stage failed")?;
        }
        Commands::Export => {
            export_view(&paths).context("export stage failed")?;
        }
        Commands::Run {
            income_input,
            bond_input,
        } => {
            if let Some(input) = income_input {
                paths.income_input = input;
            }
            if let Some(input) = bond_input {
                paths.bond_input = input;
            }
            let reports = run_all(&paths, &config).context("pipeline run failed")?;
            info!(stages = reports.len(), out_dir = %paths.out_dir.display(), "Pipeline finished");
        }
    }

    Ok(())
}
