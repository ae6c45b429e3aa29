//! CLI commands and argument parsing

use crate::config::PipelineKind;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Batch dataset ingestion into cloud storage and the warehouse
#[derive(Parser, Debug)]
#[command(name = "dataset-ingest")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML); built-in defaults when absent
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Cloud project override
    #[arg(long, global = true)]
    pub project: Option<String>,

    /// Bucket override
    #[arg(long, global = true)]
    pub bucket: Option<String>,

    /// Output format
    #[arg(short, long, global = true, default_value = "pretty")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest NYC yellow taxi trip records
    Taxi {
        /// Download, convert and upload before registering
        #[arg(long)]
        force_download: bool,
    },

    /// Ingest IMDB dataset dumps
    Imdb {
        /// Download, convert and upload before registering
        #[arg(long)]
        force_download: bool,
    },

    /// Print work units, object keys and tables of a pipeline
    Plan {
        /// Pipeline to plan
        #[arg(value_enum)]
        pipeline: PipelineKind,
    },
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one message per line)
    Json,
    /// Human-readable output
    Pretty,
}
