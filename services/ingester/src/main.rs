//! Lidar ingester command line.
//!
//! Opens a binary or columnar lidar file (or a folder of them), applies the
//! standard corrections and prints a JSON summary of the resulting dataset.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use ingestion::{DatasetSummary, IngestOptions, Ingester, SourceKind};
use lidar_common::{FormatCatalog, CATALOG_ENV_VAR};
use lidar_processing::ProcessingConfig;

#[derive(Parser, Debug)]
#[command(name = "ingester")]
#[command(about = "Lidar profile ingester")]
struct Args {
    /// Format catalog (YAML or JSON); the built-in catalog when omitted
    #[arg(long, env = CATALOG_ENV_VAR)]
    catalog: Option<PathBuf>,

    /// Override the altitude ceiling in km
    #[arg(long)]
    max_altitude: Option<f32>,

    /// Log level
    #[arg(long, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a file or folder and print its summary
    Open {
        /// File or folder to open
        path: PathBuf,

        /// Leave out folder files that fail to decode
        #[arg(long)]
        skip_failed: bool,

        /// Keep the original profile times
        #[arg(long)]
        no_regrid: bool,
    },

    /// Report what a path would be opened as
    Classify {
        path: PathBuf,
    },

    /// List the formats that can be opened
    Formats,
}

impl Command {
    fn options(&self) -> IngestOptions {
        match self {
            Command::Open {
                skip_failed,
                no_regrid,
                ..
            } => IngestOptions {
                skip_failed_files: *skip_failed,
                regrid: !*no_regrid,
            },
            _ => IngestOptions::default(),
        }
    }
}

fn init_tracing(log_level: &str) -> Result<()> {
    let level = match log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    // stdout carries the JSON result
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_target(true)
        .with_thread_ids(true)
        .with_writer(std::io::stderr)
        .json()
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

fn build_ingester(args: &Args) -> Result<Ingester> {
    let catalog = match &args.catalog {
        Some(path) => FormatCatalog::load(path)
            .with_context(|| format!("loading format catalog {}", path.display()))?,
        None => FormatCatalog::builtin()?,
    };

    let mut config = ProcessingConfig::from_env();
    if let Some(km) = args.max_altitude {
        config.max_altitude_km = km;
    }

    Ok(Ingester::new(catalog, config)?)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn open(ingester: &Ingester, path: &Path, options: &IngestOptions) -> Result<DatasetSummary> {
    let dataset = ingester
        .open_source(path, options)
        .with_context(|| format!("opening {}", path.display()))?;
    Ok(DatasetSummary::of(&dataset))
}

fn classify(ingester: &Ingester, path: &Path) -> Result<SourceKind> {
    Ok(ingester.classify(path)?)
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let args = Args::parse();
    init_tracing(&args.log_level)?;
    netcdf_parser::silence_hdf5_errors();

    let ingester = build_ingester(&args)?;
    info!(formats = ?ingester.supported_formats(), "Starting lidar ingester");

    let options = args.command.options();
    match &args.command {
        Command::Open { path, .. } => print_json(&open(&ingester, path, &options)?),
        Command::Classify { path } => print_json(&classify(&ingester, path)?),
        Command::Formats => print_json(&ingester.supported_formats()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_flags() {
        let args = Args::try_parse_from([
            "ingester",
            "--max-altitude",
            "12",
            "open",
            "/data/campaign",
            "--skip-failed",
            "--no-regrid",
        ])
        .unwrap();
        assert_eq!(args.max_altitude, Some(12.0));

        let options = args.command.options();
        assert!(options.skip_failed_files);
        assert!(!options.regrid);

        let ingester = build_ingester(&args).unwrap();
        assert_eq!(ingester.processor().config().max_altitude_km, 12.0);
    }

    #[test]
    fn test_formats_uses_defaults() {
        let args = Args::try_parse_from(["ingester", "formats"]).unwrap();
        assert!(matches!(args.command, Command::Formats));
        assert_eq!(args.command.options(), IngestOptions::default());
    }

    #[test]
    fn test_rejects_bad_altitude() {
        let args = Args::try_parse_from(["ingester", "--max-altitude=-1", "formats"]).unwrap();
        assert!(build_ingester(&args).is_err());
    }
}
