//! Command-line interface for `geoload`, which turns columnar geospatial files into `GeoJSON`.
//!
//! This binary is a thin façade over the [`geoload_core`] library: it parses
//! arguments, configures logging, runs the ingestion pipeline and renders the result.
//!
//! # Architecture
//!
//! The CLI is built using [`clap`] for argument parsing and [`tracing`] for structured logging.
//! Library crates log through the `log` facade, which is bridged into `tracing` at startup.
//!
//! # Available Commands
//!
//! - `show` - Summarize the features found in a file
//! - `dump` - Print the feature collection as `GeoJSON`

mod display;

use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand, ValueEnum};
use geojson::FeatureCollection;
use tokio_util::sync::CancellationToken;
use tracing::{Level, debug, info, warn};
use tracing_log::LogTracer;
use tracing_subscriber::FmtSubscriber;

use geoload_core::{
    CollectionSummary, DecodeOptions, IngestCallbacks, IngestContext, IngestOptions, LoadState,
    OutputShape, RunOutcome,
};

use crate::display::{display_failure, display_summary};

#[derive(Parser)]
#[command(
    name = "geoload",
    version,
    about = "Load geometry from columnar files as GeoJSON",
    long_about = "geoload reads a Parquet file (optionally zstd or gzip compressed) from a local path \
                  or URL, finds its geometry and prints the resulting GeoJSON features."
)]
/// Command-line arguments and options for the `geoload` CLI.
struct Cli {
    /// Enable verbose (INFO level) logging output.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Enable debug (DEBUG level) logging output with detailed diagnostics.
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available subcommands for the `geoload` CLI.
#[derive(Subcommand)]
enum Commands {
    /// Summarizes the features loaded from a file.
    ///
    /// Shows the feature count, the geometry types found and the property names.
    Show {
        #[command(flatten)]
        load: LoadArgs,
    },

    /// Prints the loaded feature collection as `GeoJSON` on standard output.
    Dump {
        #[command(flatten)]
        load: LoadArgs,

        /// Pretty-print the JSON output.
        #[arg(long)]
        pretty: bool,
    },
}

/// Options shared by every command that loads a file.
#[derive(Args, Debug)]
struct LoadArgs {
    /// Local path or URL (file://, http(s)://, s3://, gs://, az://) of the file.
    #[arg(value_name = "LOCATOR")]
    locator: String,

    /// Column holding geometry, overriding automatic detection.
    #[arg(long, value_name = "COLUMN")]
    geometry_column: Option<String>,

    /// Only decode these columns (comma separated).
    #[arg(long, value_name = "COLUMNS", value_delimiter = ',')]
    columns: Option<Vec<String>>,

    /// Rows decoded per batch.
    #[arg(long, value_name = "ROWS", default_value_t = DecodeOptions::default().batch_size)]
    batch_size: usize,

    /// Layout requested from the decoder.
    #[arg(long, value_enum, default_value_t = ShapeArg::Table)]
    shape: ShapeArg,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum ShapeArg {
    /// Rows only; geometry is detected from the first row
    Rows,
    /// Rows plus schema, including `GeoParquet` metadata
    Table,
}

impl From<ShapeArg> for OutputShape {
    fn from(shape: ShapeArg) -> Self {
        match shape {
            ShapeArg::Rows => OutputShape::Rows,
            ShapeArg::Table => OutputShape::Table,
        }
    }
}

impl LoadArgs {
    fn ingest_options(&self) -> IngestOptions {
        let decode = DecodeOptions::new()
            .with_shape(self.shape.into())
            .with_columns(self.columns.clone())
            .with_batch_size(self.batch_size);
        IngestOptions::new()
            .with_decode_options(decode)
            .with_geometry_column(self.geometry_column.clone())
    }
}

/// Entry point for the `geoload` command-line interface.
///
/// # Errors
///
/// Returns an error if the logging system cannot be initialized or the output
/// cannot be serialized. Ingestion failures are reported on standard error and
/// turn into a non-zero exit code.
#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Setup logging based on verbosity flags
    let log_level = if cli.debug {
        Level::DEBUG
    } else if cli.verbose {
        Level::INFO
    } else {
        Level::WARN
    };

    // Bridge logs from the `log` crate to the `tracing` ecosystem.
    LogTracer::init()?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(true)
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Show { load } => {
            info!("Showing {}", load.locator);
            let state = load_features(&load).await;
            Ok(handle_show(&load.locator, state))
        },
        Commands::Dump { load, pretty } => {
            info!("Dumping {}", load.locator);
            let state = load_features(&load).await;
            handle_dump(state, pretty)
        },
    }
}

/// Runs the pipeline, cancelling it on Ctrl-C.
///
/// Returns `None` when the run was cancelled.
async fn load_features(load: &LoadArgs) -> Option<LoadState> {
    debug!("Load arguments: {load:?}");
    let context = IngestContext::parquet().with_options(load.ingest_options());

    let token = CancellationToken::new();
    let interrupt = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted; abandoning load");
            interrupt.cancel();
        }
    });

    let outcome = context
        .run(&load.locator, &token, IngestCallbacks::new())
        .await;
    if let RunOutcome::Ready(collection) = &outcome {
        debug!("Loaded {} feature(s)", collection.features.len());
    }
    outcome.into_load_state()
}

fn handle_show(locator: &str, state: Option<LoadState>) -> ExitCode {
    match ready(state) {
        Ok(collection) => {
            display_summary(locator, &CollectionSummary::from_collection(&collection));
            ExitCode::SUCCESS
        },
        Err(code) => code,
    }
}

fn handle_dump(state: Option<LoadState>, pretty: bool) -> Result<ExitCode> {
    match ready(state) {
        Ok(collection) => {
            let json = if pretty {
                serde_json::to_string_pretty(&collection)?
            } else {
                serde_json::to_string(&collection)?
            };
            println!("{json}");
            Ok(ExitCode::SUCCESS)
        },
        Err(code) => Ok(code),
    }
}

/// Extracts the collection, reporting anything else on standard error.
fn ready(state: Option<LoadState>) -> std::result::Result<FeatureCollection, ExitCode> {
    match state {
        Some(LoadState::Ready(collection)) => Ok(collection),
        Some(LoadState::Failed {
            message,
            suggestion,
        }) => {
            display_failure(&message, suggestion.as_deref());
            Err(ExitCode::FAILURE)
        },
        Some(LoadState::Loading) | None => {
            eprintln!("Cancelled");
            Err(ExitCode::from(130))
        },
    }
}
