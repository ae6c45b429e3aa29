//! Pipeline plan and run summary types

use crate::partition::WorkUnit;
use crate::warehouse::TableRef;
use std::path::PathBuf;

/// Everything derived from one work unit's key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitPlan {
    /// The work unit
    pub unit: WorkUnit,
    /// URL the source file is downloaded from
    pub source_url: String,
    /// Local path of the downloaded file
    pub raw_path: PathBuf,
    /// Local path of the converted file, when the source needs conversion
    pub converted_path: Option<PathBuf>,
    /// Object key in the bucket
    pub object_key: String,
    /// Object URI as the warehouse sees it
    pub uri: String,
}

impl UnitPlan {
    /// File that gets uploaded
    pub fn upload_path(&self) -> &PathBuf {
        self.converted_path.as_ref().unwrap_or(&self.raw_path)
    }
}

/// A table the pipeline registers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TablePlan {
    pub table: TableRef,
    pub uris: Vec<String>,
    /// Hive partition prefix for partitioned external tables
    pub hive_prefix: Option<String>,
}

/// What a run did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Unit keys in processing order
    pub units: Vec<String>,
    pub downloads: usize,
    pub conversions: usize,
    pub uploads: usize,
    pub registrations: usize,
}
