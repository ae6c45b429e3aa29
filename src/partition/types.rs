//! Work unit types and the router trait

use crate::error::Result;
use std::fmt;

/// One fetch/convert/upload/register cycle, keyed by partition
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkUnit {
    /// Partition key (`2025-01`, `title.basics`, ...)
    pub key: String,
    /// Hive-style column the key belongs to (`month`), if any
    pub partition_column: Option<String>,
}

impl WorkUnit {
    /// Create a work unit with a bare key
    pub fn new(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            partition_column: None,
        }
    }

    /// Attach a partition column
    #[must_use]
    pub fn with_column(mut self, column: impl Into<String>) -> Self {
        self.partition_column = Some(column.into());
        self
    }

    /// Object store path segment: `month=2025-01` or `title.basics`
    pub fn segment(&self) -> String {
        match &self.partition_column {
            Some(column) => format!("{column}={}", self.key),
            None => self.key.clone(),
        }
    }

    /// Warehouse-compatible table name derived from the key
    pub fn table_name(&self) -> String {
        sanitize_table_name(&self.key)
    }
}

impl fmt::Display for WorkUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.segment())
    }
}

/// Replace every character a warehouse table name cannot hold with `_`
pub fn sanitize_table_name(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

/// Trait for work unit routers
pub trait PartitionRouter: Send + Sync {
    /// Generate the ordered list of work units
    fn partitions(&self) -> Result<Vec<WorkUnit>>;

    /// Partition column shared by every unit, if any
    fn partition_field(&self) -> Option<&str>;
}
