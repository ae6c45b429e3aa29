//! Configuration types
//!
//! Everything a run needs is carried by `IngestConfig` and handed to the
//! components explicitly. The defaults reproduce the NYC taxi and IMDB
//! pipelines; a YAML file can override any field.

use crate::convert::SourceFormat;
use crate::error::{Error, Result};
use crate::output::ParquetWriterConfig;
use crate::partition::{ListRouter, MonthRouter, PartitionRouter};
use crate::warehouse::RegistrationPolicy;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ============================================================================
// Top-Level Config
// ============================================================================

/// Complete ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Cloud project, bucket and warehouse settings
    pub gcp: GcpConfig,

    /// Object store destination override (`gs://`, `file://`, path, `memory://`)
    pub storage_url: Option<String>,

    /// Local working directories
    pub paths: PathsConfig,

    /// HTTP settings for dataset downloads
    pub http: HttpConfig,

    /// Parquet output settings
    pub parquet: ParquetConfig,

    /// NYC yellow taxi trip records
    pub taxi: PipelineConfig,

    /// IMDB dataset dumps
    pub imdb: PipelineConfig,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            gcp: GcpConfig::default(),
            storage_url: None,
            paths: PathsConfig::default(),
            http: HttpConfig::default(),
            parquet: ParquetConfig::default(),
            taxi: PipelineConfig::taxi(),
            imdb: PipelineConfig::imdb(),
        }
    }
}

impl IngestConfig {
    /// Load configuration from a YAML file
    ///
    /// Nothing is validated here, so command line overrides can fill in
    /// missing values before `validate` runs.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|_| Error::FileNotFound {
            path: path.display().to_string(),
        })?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from a YAML string
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Check values serde cannot check
    pub fn validate(&self) -> Result<()> {
        if self.gcp.project_id.trim().is_empty() {
            return Err(Error::invalid_value("gcp.project_id", "must not be empty"));
        }
        if self.gcp.bucket.trim().is_empty() && self.storage_url.is_none() {
            return Err(Error::invalid_value("gcp.bucket", "must not be empty"));
        }
        self.taxi.validate("taxi")?;
        self.imdb.validate("imdb")?;
        Ok(())
    }

    /// Destination URL for uploads
    pub fn storage_url(&self) -> String {
        self.storage_url
            .clone()
            .unwrap_or_else(|| format!("gs://{}", self.gcp.bucket))
    }

    /// Get a pipeline by kind
    pub fn pipeline(&self, kind: PipelineKind) -> &PipelineConfig {
        match kind {
            PipelineKind::Taxi => &self.taxi,
            PipelineKind::Imdb => &self.imdb,
        }
    }
}

/// The pipelines this tool knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum PipelineKind {
    /// NYC yellow taxi trip records
    Taxi,
    /// IMDB dataset dumps
    Imdb,
}

// ============================================================================
// GCP
// ============================================================================

/// Cloud project settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GcpConfig {
    /// Project owning the bucket and the warehouse datasets
    pub project_id: String,

    /// Object store bucket
    pub bucket: String,

    /// Region used when a warehouse dataset has to be created
    pub location: String,

    /// Environment variable naming a credentials file
    pub credentials_env: String,

    /// BigQuery REST endpoint
    pub bigquery_url: String,

    /// Delay between job status polls
    pub poll_interval_ms: u64,
}

impl Default for GcpConfig {
    fn default() -> Self {
        Self {
            project_id: "ensai-2026".to_string(),
            bucket: "christophe-2026".to_string(),
            location: "EU".to_string(),
            credentials_env: "GOOGLE_APPLICATION_CREDENTIALS".to_string(),
            bigquery_url: crate::warehouse::BIGQUERY_URL.to_string(),
            poll_interval_ms: 1000,
        }
    }
}

impl GcpConfig {
    /// Poll interval as a duration
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

// ============================================================================
// Paths / HTTP / Parquet
// ============================================================================

/// Local working directories
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Downloaded files
    pub raw_dir: PathBuf,
    /// Converted Parquet files
    pub parquet_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_dir: PathBuf::from("data"),
            parquet_dir: PathBuf::from("parquet"),
        }
    }
}

/// HTTP settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    /// Request timeout in seconds; unset waits indefinitely
    pub timeout_secs: Option<u64>,
    /// User agent override
    pub user_agent: Option<String>,
}

impl HttpConfig {
    /// Timeout as a duration
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }
}

/// Parquet compression codec
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParquetCompression {
    /// Snappy (default)
    #[default]
    Snappy,
    /// Zstandard
    Zstd,
    /// Gzip
    Gzip,
    /// No compression
    None,
}

/// Parquet output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ParquetConfig {
    /// Compression codec
    pub compression: ParquetCompression,
    /// Maximum rows per row group
    pub row_group_size: usize,
}

impl Default for ParquetConfig {
    fn default() -> Self {
        Self {
            compression: ParquetCompression::Snappy,
            row_group_size: 1024 * 1024,
        }
    }
}

impl ParquetConfig {
    /// Build the writer configuration
    pub fn writer_config(&self) -> ParquetWriterConfig {
        let config = ParquetWriterConfig::new().with_row_group_size(self.row_group_size);
        match self.compression {
            ParquetCompression::Snappy => config,
            ParquetCompression::Zstd => config.zstd(),
            ParquetCompression::Gzip => config.gzip(),
            ParquetCompression::None => config.uncompressed(),
        }
    }
}

// ============================================================================
// Pipelines
// ============================================================================

/// How a pipeline's work units are enumerated
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UnitsConfig {
    /// Months reached by stepping from `start` while before `end`
    Months {
        start: NaiveDate,
        end: NaiveDate,
        #[serde(default = "default_step")]
        step: String,
        #[serde(default = "default_month_column")]
        column: String,
    },

    /// Fixed list of keys
    List { values: Vec<String> },
}

fn default_step() -> String {
    "31d".to_string()
}

fn default_month_column() -> String {
    "month".to_string()
}

impl UnitsConfig {
    /// Build the router for these units
    pub fn router(&self) -> Result<Box<dyn PartitionRouter>> {
        match self {
            Self::Months {
                start,
                end,
                step,
                column,
            } => Ok(Box::new(MonthRouter::from_strings(
                *start,
                *end,
                step,
                column.clone(),
            )?)),
            Self::List { values } => Ok(Box::new(ListRouter::new(values.clone()))),
        }
    }
}

/// One dataset pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Object store prefix and log name (`taxi`, `imdb`)
    pub name: String,

    /// Base URL the source files are fetched from
    pub base_url: String,

    /// Source file name, `{key}` is replaced by the unit key
    pub file_pattern: String,

    /// Object name under the unit's segment, `{key}` allowed
    pub object_name: String,

    /// Format of the downloaded files
    pub format: SourceFormat,

    /// Work units
    pub units: UnitsConfig,

    /// Warehouse dataset holding the tables
    pub dataset: String,

    /// Single table over every unit; unset registers one table per unit
    #[serde(default)]
    pub table: Option<String>,

    /// How tables are registered
    #[serde(default)]
    pub registration: RegistrationPolicy,
}

impl PipelineConfig {
    /// NYC yellow taxi trips: monthly Parquet files behind one external table
    pub fn taxi() -> Self {
        Self {
            name: "taxi".to_string(),
            base_url: "https://d37ci6vzurychx.cloudfront.net/trip-data/".to_string(),
            file_pattern: "yellow_tripdata_{key}.parquet".to_string(),
            object_name: "yellow_tripdata.parquet".to_string(),
            format: SourceFormat::Parquet,
            units: UnitsConfig::Months {
                start: NaiveDate::from_ymd_opt(2025, 1, 1).unwrap_or_default(),
                end: NaiveDate::from_ymd_opt(2025, 11, 30).unwrap_or_default(),
                step: default_step(),
                column: default_month_column(),
            },
            dataset: "christophe".to_string(),
            table: Some("taxi".to_string()),
            registration: RegistrationPolicy::External,
        }
    }

    /// IMDB dumps: gzip TSV files converted to Parquet, one loaded table each
    pub fn imdb() -> Self {
        let tables = [
            "name.basics",
            "title.akas",
            "title.basics",
            "title.crew",
            "title.episode",
            "title.principals",
            "title.ratings",
        ];

        Self {
            name: "imdb".to_string(),
            base_url: "https://datasets.imdbws.com/".to_string(),
            file_pattern: "{key}.tsv.gz".to_string(),
            object_name: "{key}.parquet".to_string(),
            format: SourceFormat::imdb_tsv(),
            units: UnitsConfig::List {
                values: tables.iter().map(ToString::to_string).collect(),
            },
            dataset: "imdb".to_string(),
            table: None,
            registration: RegistrationPolicy::Load,
        }
    }

    /// Check pipeline fields
    pub fn validate(&self, field: &str) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::invalid_value(format!("{field}.name"), "must not be empty"));
        }
        if self.dataset.trim().is_empty() {
            return Err(Error::invalid_value(
                format!("{field}.dataset"),
                "must not be empty",
            ));
        }
        if !self.file_pattern.contains("{key}") {
            return Err(Error::invalid_value(
                format!("{field}.file_pattern"),
                "must contain {key}",
            ));
        }
        if self.table.is_none() && !self.object_name.contains("{key}") {
            // Per-unit tables need distinct file names to stay addressable
            return Err(Error::invalid_value(
                format!("{field}.object_name"),
                "must contain {key} when no single table is configured",
            ));
        }
        self.format.validate()?;
        Ok(())
    }
}

/// Expand the `{key}` placeholder
pub fn expand(pattern: &str, key: &str) -> String {
    pattern.replace("{key}", key)
}
