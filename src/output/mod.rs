//! Output module
//!
//! Handles Parquet file writing and object storage uploads.
//!
//! # Overview
//!
//! This module provides utilities for:
//! - Writing Arrow RecordBatches to local Parquet files
//! - Uploading files to object storage (GCS, local, in-memory)
//! - Building deterministic object keys

mod cloud;
mod writer;

pub use cloud::{build_object_key, ObjectStorage};
pub use writer::{ParquetWriter, ParquetWriterConfig};

#[cfg(test)]
mod tests;
