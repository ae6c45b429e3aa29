//! Delimited text to Parquet conversion
//!
//! The whole file is decompressed and held in memory, column types are
//! inferred over every row, and all batches are written in one pass.

use super::types::DelimitedFormat;
use crate::error::{Error, Result};
use crate::output::{ParquetWriter, ParquetWriterConfig};
use arrow::csv::ReaderBuilder;
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use flate2::read::MultiGzDecoder;
use std::io::{Cursor, Read};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Rows per Arrow batch while reading
const DEFAULT_BATCH_SIZE: usize = 64 * 1024;

/// Result of a conversion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conversion {
    /// Rows written
    pub rows: usize,
    /// Columns written
    pub columns: usize,
}

/// Converts delimited text files to Parquet
#[derive(Debug, Clone)]
pub struct Converter {
    writer_config: ParquetWriterConfig,
    batch_size: usize,
}

impl Default for Converter {
    fn default() -> Self {
        Self::new(ParquetWriterConfig::default())
    }
}

impl Converter {
    /// Create a converter writing with `writer_config`
    pub fn new(writer_config: ParquetWriterConfig) -> Self {
        Self {
            writer_config,
            batch_size: DEFAULT_BATCH_SIZE,
        }
    }

    /// Set the read batch size
    #[must_use]
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Convert `source` to a Parquet file at `target`, replacing it
    pub fn convert(
        &self,
        format: &DelimitedFormat,
        source: &Path,
        target: &Path,
    ) -> Result<Conversion> {
        info!("Converting {} to {}", source.display(), target.display());
        let source_name = source.display().to_string();

        let data = read_source(source, format.gzip)?;
        if data.is_empty() {
            return Err(Error::convert(source_name, "file is empty"));
        }

        let csv_format = format.arrow_format()?;
        let (schema, inferred_rows) = csv_format
            .infer_schema(Cursor::new(&data), None)
            .map_err(|e| Error::convert(&source_name, format!("schema inference: {e}")))?;
        let schema = Arc::new(widen_null_columns(&schema));
        debug!(
            "Inferred {} columns over {inferred_rows} rows",
            schema.fields().len()
        );

        let reader = ReaderBuilder::new(schema.clone())
            .with_format(csv_format)
            .with_batch_size(self.batch_size)
            .build(Cursor::new(&data))
            .map_err(|e| Error::convert(&source_name, e.to_string()))?;

        let batches: Vec<RecordBatch> = reader
            .collect::<std::result::Result<_, _>>()
            .map_err(|e| Error::convert(&source_name, e.to_string()))?;

        let mut writer = ParquetWriter::new(target, &schema, &self.writer_config)?;
        for batch in &batches {
            writer.write(batch)?;
        }
        let rows = writer.close()?;

        info!("Converted {rows} rows");
        Ok(Conversion {
            rows,
            columns: schema.fields().len(),
        })
    }
}

/// Columns without a single value are inferred as `Null`; store them as text
fn widen_null_columns(schema: &Schema) -> Schema {
    let fields: Vec<Field> = schema
        .fields()
        .iter()
        .map(|field| match field.data_type() {
            DataType::Null => Field::new(field.name(), DataType::Utf8, true),
            _ => field.as_ref().clone(),
        })
        .collect();
    Schema::new(fields)
}

/// Read a file fully, decompressing gzip when asked
fn read_source(path: &Path, gzip: bool) -> Result<Vec<u8>> {
    let raw = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => Error::FileNotFound {
            path: path.display().to_string(),
        },
        _ => Error::Io(e),
    })?;

    if !gzip {
        return Ok(raw);
    }

    let mut decoded = Vec::new();
    MultiGzDecoder::new(raw.as_slice())
        .read_to_end(&mut decoded)
        .map_err(|e| Error::convert(path.display().to_string(), format!("gzip: {e}")))?;
    Ok(decoded)
}
