//! Batch ingestion driver
//!
//! A [`Pipeline`] walks its work units in order. For each unit it fetches
//! the source file, converts it when needed, uploads it, and registers the
//! result in the warehouse. The first failure ends the run.

mod driver;
mod types;

pub use driver::{parquet_file_name, Pipeline, Services};
pub use types::{RunSummary, TablePlan, UnitPlan};
