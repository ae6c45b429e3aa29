//! Tests for output module

use super::*;
use arrow::array::{Int64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use futures::TryStreamExt;
use object_store::path::Path as ObjectPath;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::basic::Compression;
use std::sync::Arc;
use tempfile::tempdir;

fn sample_batch(ids: &[i64]) -> RecordBatch {
    let schema = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int64, false),
        Field::new("zone", DataType::Utf8, true),
    ]));
    let zones: Vec<String> = ids.iter().map(|i| format!("zone-{i}")).collect();
    RecordBatch::try_new(
        schema,
        vec![
            Arc::new(Int64Array::from(ids.to_vec())),
            Arc::new(StringArray::from(zones)),
        ],
    )
    .unwrap()
}

// ============================================================================
// Parquet Writer Config Tests
// ============================================================================

#[test]
fn test_parquet_writer_config_default() {
    let config = ParquetWriterConfig::default();
    assert_eq!(config.compression(), Compression::SNAPPY);
    assert_eq!(config.row_group_size(), 1024 * 1024);
}

#[test]
fn test_parquet_writer_config_builder() {
    let config = ParquetWriterConfig::new()
        .with_row_group_size(1000)
        .uncompressed();

    assert_eq!(config.compression(), Compression::UNCOMPRESSED);
    assert_eq!(config.row_group_size(), 1000);
}

#[test]
fn test_parquet_writer_config_zero_row_group() {
    let config = ParquetWriterConfig::new().with_row_group_size(0);
    assert_eq!(config.row_group_size(), 1);
}

#[test]
fn test_parquet_writer_config_codecs() {
    assert!(matches!(
        ParquetWriterConfig::new().zstd().compression(),
        Compression::ZSTD(_)
    ));
    assert!(matches!(
        ParquetWriterConfig::new().gzip().compression(),
        Compression::GZIP(_)
    ));
}

// ============================================================================
// Parquet Writer Tests
// ============================================================================

#[test]
fn test_parquet_writer_rows_written() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("writer.parquet");

    let batch = sample_batch(&[1, 2]);
    let config = ParquetWriterConfig::default();
    let mut writer = ParquetWriter::new(&path, batch.schema().as_ref(), &config).unwrap();

    assert_eq!(writer.rows_written(), 0);

    writer.write(&batch).unwrap();
    assert_eq!(writer.rows_written(), 2);

    writer.write(&sample_batch(&[3])).unwrap();
    let rows = writer.close().unwrap();
    assert_eq!(rows, 3);
}

#[test]
fn test_parquet_writer_small_row_groups() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("groups.parquet");

    let config = ParquetWriterConfig::new()
        .uncompressed()
        .with_row_group_size(2);
    let batch = sample_batch(&[1, 2, 3, 4, 5]);
    let mut writer = ParquetWriter::new(&path, batch.schema().as_ref(), &config).unwrap();
    writer.write(&batch).unwrap();
    writer.close().unwrap();

    let file = std::fs::File::open(&path).unwrap();
    let builder = ParquetRecordBatchReaderBuilder::try_new(file).unwrap();
    assert_eq!(builder.metadata().num_row_groups(), 3);
}

#[test]
fn test_parquet_writer_missing_directory() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("absent").join("out.parquet");
    let batch = sample_batch(&[1]);

    let result = ParquetWriter::new(&path, batch.schema().as_ref(), &ParquetWriterConfig::new());
    assert!(matches!(result, Err(crate::error::Error::Output { .. })));
}

// ============================================================================
// Object Storage Tests
// ============================================================================

#[tokio::test]
async fn test_upload_twice_keeps_one_object() {
    let dir = tempdir().unwrap();
    let local = dir.path().join("yellow_tripdata.parquet");
    let storage = ObjectStorage::parse("memory://christophe-2026", None).unwrap();
    let key = "taxi/month=2025-01/yellow_tripdata.parquet";

    std::fs::write(&local, b"first").unwrap();
    storage.upload_file(&local, key).await.unwrap();

    std::fs::write(&local, b"second").unwrap();
    let uri = storage.upload_file(&local, key).await.unwrap();
    assert_eq!(
        uri,
        "memory://christophe-2026/taxi/month=2025-01/yellow_tripdata.parquet"
    );

    let objects: Vec<_> = storage
        .store()
        .list(None)
        .try_collect()
        .await
        .unwrap();
    assert_eq!(objects.len(), 1);

    let data = storage
        .store()
        .get(&ObjectPath::from(key))
        .await
        .unwrap()
        .bytes()
        .await
        .unwrap();
    assert_eq!(data.as_ref(), b"second");
}

#[tokio::test]
async fn test_upload_missing_file() {
    let dir = tempdir().unwrap();
    let storage = ObjectStorage::parse("memory://bucket", None).unwrap();

    let err = storage
        .upload_file(&dir.path().join("absent.parquet"), "a/b.parquet")
        .await
        .unwrap_err();
    assert!(matches!(err, crate::error::Error::FileNotFound { .. }));
}

#[tokio::test]
async fn test_upload_to_local_directory() {
    let dir = tempdir().unwrap();
    let root = dir.path().join("bucket");
    let local = dir.path().join("title.crew.parquet");
    std::fs::write(&local, b"PAR1").unwrap();

    let storage = ObjectStorage::parse(root.to_str().unwrap(), None).unwrap();
    let key = build_object_key("imdb", "title.crew", "title.crew.parquet");
    storage.upload_file(&local, &key).await.unwrap();

    let written = std::fs::read(root.join("imdb/title.crew/title.crew.parquet")).unwrap();
    assert_eq!(written, b"PAR1");
}
