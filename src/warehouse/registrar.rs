//! Table registration
//!
//! Makes uploaded objects queryable, either as an external table over the
//! bucket or as a managed table loaded from it.

use super::types::{
    CreateOutcome, DatasetRef, DatasetState, ExternalTable, LoadOutcome, LoadRequest, TableRef,
    Warehouse,
};
use crate::error::Result;
use std::sync::Arc;
use tracing::info;

/// Registers tables against a [`Warehouse`]
#[derive(Clone)]
pub struct Registrar {
    warehouse: Arc<dyn Warehouse>,
    location: String,
}

impl std::fmt::Debug for Registrar {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registrar")
            .field("location", &self.location)
            .finish_non_exhaustive()
    }
}

impl Registrar {
    /// Create a registrar; datasets it creates go to `location`
    pub fn new(warehouse: Arc<dyn Warehouse>, location: impl Into<String>) -> Self {
        Self {
            warehouse,
            location: location.into(),
        }
    }

    /// Make sure `dataset` exists, creating it when absent
    ///
    /// Only a definite "not found" leads to creation; any other failure of
    /// the existence check is returned.
    pub async fn ensure_dataset(&self, dataset: &DatasetRef) -> Result<DatasetState> {
        let mut state = DatasetState::Unknown;

        while !state.is_terminal() {
            state = match state {
                DatasetState::Unknown => {
                    if self.warehouse.dataset_exists(dataset).await? {
                        DatasetState::Exists
                    } else {
                        DatasetState::Absent
                    }
                }
                DatasetState::Absent => {
                    match self.warehouse.create_dataset(dataset, &self.location).await? {
                        CreateOutcome::Created => DatasetState::Created,
                        CreateOutcome::AlreadyExists => DatasetState::Exists,
                    }
                }
                terminal => terminal,
            };
        }

        match state {
            DatasetState::Created => info!("Created dataset {dataset} in {}", self.location),
            _ => info!("Dataset {dataset} already exists"),
        }
        Ok(state)
    }

    /// Create or replace an external table
    pub async fn register_external(&self, external: &ExternalTable) -> Result<()> {
        info!("Registering external table {}", external.table);
        self.warehouse
            .execute(&external.table.project, &external.ddl())
            .await?;
        info!("External table {} ready", external.table);
        Ok(())
    }

    /// Load Parquet objects into a managed table, replacing its contents
    pub async fn register_load(&self, table: &TableRef, source_uris: Vec<String>) -> Result<u64> {
        self.ensure_dataset(&table.dataset_ref()).await?;

        info!("Loading {} into {table}", source_uris.join(", "));
        let LoadOutcome { job_id, .. } = self
            .warehouse
            .load_parquet(&LoadRequest::new(table.clone(), source_uris))
            .await?;

        let rows = self.warehouse.row_count(table).await?;
        info!("Loaded {rows} rows into {table} (job {job_id})");
        Ok(rows)
    }
}
