// Allow common clippy pedantic lints that aren't critical for this codebase
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::items_after_statements)]
#![allow(clippy::needless_pass_by_value)]

//! # dataset-ingest
//!
//! Batch ingestion of public datasets into a cloud bucket and a data
//! warehouse.
//!
//! ## Features
//!
//! - **Fetch**: one GET per work unit, written to a deterministic local path
//! - **Convert**: gzip TSV/CSV to Parquet with inferred column types
//! - **Upload**: overwrite objects in GCS (or a local/in-memory store)
//! - **Register**: BigQuery external tables or truncate-and-load jobs
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use dataset_ingest::auth::{GoogleAuthenticator, TokenSource};
//! use dataset_ingest::config::{IngestConfig, PipelineKind};
//! use dataset_ingest::pipeline::Pipeline;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> dataset_ingest::Result<()> {
//!     let config = IngestConfig::default();
//!     let source = TokenSource::from_env(&config.gcp.credentials_env)?;
//!     let provider = Arc::new(GoogleAuthenticator::new(source));
//!
//!     let pipeline = Pipeline::from_config(&config, PipelineKind::Imdb, provider)?;
//!     let summary = pipeline.run(true).await?;
//!     println!("{} tables registered", summary.registrations);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                          Pipeline                               │
//! │   for unit in router.partitions():                              │
//! │       fetch → convert → upload → register                       │
//! └─────────────────────────────────────────────────────────────────┘
//!                                │
//! ┌──────────┬───────────┬───────┴───────┬───────────┬─────────────┐
//! │   Auth   │   HTTP    │   Partition   │  Output   │  Warehouse  │
//! ├──────────┼───────────┼───────────────┼───────────┼─────────────┤
//! │ Service  │ GET/POST  │ List          │ Parquet   │ BigQuery    │
//! │ account  │ Bearer    │ Month         │ GCS       │ External    │
//! │ ADC user │ Status    │               │ Local     │ Load        │
//! │ Metadata │ check     │               │ Memory    │             │
//! └──────────┴───────────┴───────────────┴───────────┴─────────────┘
//! ```

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::doc_markdown)]

// ============================================================================
// Module declarations
// ============================================================================

/// Error types
pub mod error;

/// Google credentials and token providers
pub mod auth;

/// HTTP client with bearer authentication
pub mod http;

/// Source file download
pub mod fetch;

/// Work unit routing
pub mod partition;

/// Delimited text to Parquet conversion
pub mod convert;

/// Parquet writing and object storage
pub mod output;

/// Warehouse registration
pub mod warehouse;

/// Configuration
pub mod config;

/// Ingestion driver
pub mod pipeline;

/// Command-line interface
pub mod cli;

// ============================================================================
// Re-exports
// ============================================================================

pub use error::{Error, Result};

pub use config::{IngestConfig, PipelineConfig, PipelineKind};
pub use pipeline::{Pipeline, RunSummary};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name
pub const NAME: &str = env!("CARGO_PKG_NAME");
