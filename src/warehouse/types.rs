//! Warehouse types and the `Warehouse` capability

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How a pipeline's tables are registered in the warehouse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegistrationPolicy {
    /// External table reading the objects in place
    #[default]
    External,
    /// Managed table filled by a truncate-and-load job
    Load,
}

/// A dataset within a project
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetRef {
    pub project: String,
    pub dataset: String,
}

impl DatasetRef {
    pub fn new(project: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            dataset: dataset.into(),
        }
    }

    /// Table `table` in this dataset
    pub fn table(&self, table: impl Into<String>) -> TableRef {
        TableRef {
            project: self.project.clone(),
            dataset: self.dataset.clone(),
            table: table.into(),
        }
    }
}

impl fmt::Display for DatasetRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.project, self.dataset)
    }
}

/// A fully qualified table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRef {
    pub project: String,
    pub dataset: String,
    pub table: String,
}

impl TableRef {
    /// Containing dataset
    pub fn dataset_ref(&self) -> DatasetRef {
        DatasetRef::new(&self.project, &self.dataset)
    }

    /// Quoted identifier for SQL: `` `project.dataset.table` ``
    pub fn sql_identifier(&self) -> String {
        format!("`{self}`")
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.project, self.dataset, self.table)
    }
}

/// Result of a dataset creation attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    AlreadyExists,
}

/// Where a dataset stands during `ensure_dataset`
///
/// `Unknown` moves to `Exists` or `Absent` after the existence check;
/// `Absent` moves to `Created` (or `Exists` when creation races another
/// writer). `Exists` and `Created` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DatasetState {
    #[default]
    Unknown,
    Exists,
    Absent,
    Created,
}

impl DatasetState {
    /// Whether the dataset is known to be usable
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Exists | Self::Created)
    }
}

/// A truncate-and-load of Parquet objects into a managed table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRequest {
    pub table: TableRef,
    pub source_uris: Vec<String>,
}

impl LoadRequest {
    pub fn new(table: TableRef, source_uris: Vec<String>) -> Self {
        Self { table, source_uris }
    }
}

/// A finished load job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOutcome {
    pub job_id: String,
    /// Rows written, when the warehouse reports it
    pub output_rows: Option<u64>,
}

/// An external table over object-store files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalTable {
    pub table: TableRef,
    /// Source URIs, wildcards allowed
    pub uris: Vec<String>,
    /// Common prefix of hive-style `column=value` directories
    pub hive_prefix: Option<String>,
}

impl ExternalTable {
    /// `CREATE OR REPLACE EXTERNAL TABLE` statement for this table
    pub fn ddl(&self) -> String {
        let uris = self
            .uris
            .iter()
            .map(|uri| format!("'{}'", escape_literal(uri)))
            .collect::<Vec<_>>()
            .join(", ");

        let mut sql = format!(
            "CREATE OR REPLACE EXTERNAL TABLE {}\n",
            self.table.sql_identifier()
        );
        if self.hive_prefix.is_some() {
            sql.push_str("WITH PARTITION COLUMNS\n");
        }
        sql.push_str("OPTIONS (\n    format = 'PARQUET',\n");
        match &self.hive_prefix {
            Some(prefix) => {
                sql.push_str(&format!("    uris = [{uris}],\n"));
                sql.push_str(&format!(
                    "    hive_partition_uri_prefix = '{}'\n",
                    escape_literal(prefix)
                ));
            }
            None => sql.push_str(&format!("    uris = [{uris}]\n")),
        }
        sql.push_str(");");
        sql
    }
}

fn escape_literal(value: &str) -> String {
    value.replace('\\', "\\\\").replace('\'', "\\'")
}

/// Data warehouse operations used by the registrar
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Check whether a dataset exists; only a definite "not found" is `false`
    async fn dataset_exists(&self, dataset: &DatasetRef) -> Result<bool>;

    /// Create a dataset in `location`
    async fn create_dataset(&self, dataset: &DatasetRef, location: &str) -> Result<CreateOutcome>;

    /// Run a SQL statement and wait for it to finish
    async fn execute(&self, project: &str, sql: &str) -> Result<()>;

    /// Run a load job and wait for it to finish
    async fn load_parquet(&self, request: &LoadRequest) -> Result<LoadOutcome>;

    /// Number of rows in a table
    async fn row_count(&self, table: &TableRef) -> Result<u64>;
}
