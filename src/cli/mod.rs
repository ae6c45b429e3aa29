//! CLI module
//!
//! Command-line interface for running the ingestion pipelines.
//!
//! # Commands
//!
//! - `taxi` - NYC yellow taxi trips behind one external table
//! - `imdb` - IMDB dumps loaded into one table each
//! - `plan` - Show what a pipeline would touch, without touching it

mod commands;
mod runner;

pub use commands::{Cli, Commands, OutputFormat};
pub use runner::Runner;
