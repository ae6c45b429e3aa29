//! Converter module
//!
//! Turns downloaded delimited files (CSV/TSV, optionally gzip) into
//! Parquet. Sources that are already Parquet skip this step.

mod converter;
mod types;

pub use converter::{Conversion, Converter};
pub use types::{DelimitedFormat, SourceFormat};
