//! In-memory warehouse recording every call

use super::types::{
    CreateOutcome, DatasetRef, LoadOutcome, LoadRequest, TableRef, Warehouse,
};
use crate::error::{Error, Result};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// A call made against [`RecordingWarehouse`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    DatasetExists(String),
    CreateDataset(String, String),
    Execute(String),
    Load(LoadRequest),
    RowCount(String),
}

/// Fake warehouse for registrar and pipeline tests
#[derive(Debug, Default)]
pub struct RecordingWarehouse {
    datasets: Mutex<HashSet<String>>,
    rows: HashMap<String, u64>,
    exists_status: Option<u16>,
    create_conflicts: bool,
    calls: Mutex<Vec<Call>>,
}

impl RecordingWarehouse {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with `dataset` already present
    pub fn with_dataset(self, dataset: &str) -> Self {
        self.datasets
            .lock()
            .unwrap()
            .insert(dataset.to_string());
        self
    }

    /// Make the existence check fail with `status`
    pub fn failing_exists(mut self, status: u16) -> Self {
        self.exists_status = Some(status);
        self
    }

    /// Make creation report a conflict
    pub fn conflicting_create(mut self) -> Self {
        self.create_conflicts = true;
        self
    }

    /// Report `rows` for `table`
    pub fn with_rows(mut self, table: &str, rows: u64) -> Self {
        self.rows.insert(table.to_string(), rows);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn loads(&self) -> Vec<LoadRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Load(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    pub fn statements(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                Call::Execute(sql) => Some(sql),
                _ => None,
            })
            .collect()
    }

    pub fn creations(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, Call::CreateDataset(..)))
            .count()
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl Warehouse for RecordingWarehouse {
    async fn dataset_exists(&self, dataset: &DatasetRef) -> Result<bool> {
        self.record(Call::DatasetExists(dataset.to_string()));
        if let Some(status) = self.exists_status {
            return Err(Error::http_status(status, "injected"));
        }
        Ok(self.datasets.lock().unwrap().contains(&dataset.dataset))
    }

    async fn create_dataset(&self, dataset: &DatasetRef, location: &str) -> Result<CreateOutcome> {
        self.record(Call::CreateDataset(
            dataset.to_string(),
            location.to_string(),
        ));
        if self.create_conflicts {
            return Ok(CreateOutcome::AlreadyExists);
        }
        self.datasets
            .lock()
            .unwrap()
            .insert(dataset.dataset.clone());
        Ok(CreateOutcome::Created)
    }

    async fn execute(&self, _project: &str, sql: &str) -> Result<()> {
        self.record(Call::Execute(sql.to_string()));
        Ok(())
    }

    async fn load_parquet(&self, request: &LoadRequest) -> Result<LoadOutcome> {
        self.record(Call::Load(request.clone()));
        Ok(LoadOutcome {
            job_id: format!("job_{}", request.table.table),
            output_rows: self.rows.get(&request.table.table).copied(),
        })
    }

    async fn row_count(&self, table: &TableRef) -> Result<u64> {
        self.record(Call::RowCount(table.to_string()));
        Ok(self.rows.get(&table.table).copied().unwrap_or(0))
    }
}
