//! Data warehouse registration
//!
//! # Overview
//!
//! - [`Warehouse`]: the operations the registrar needs from a warehouse
//! - [`BigQueryClient`]: implementation over the BigQuery v2 REST API
//! - [`Registrar`]: external-table and managed-load registration, with
//!   get-or-create of the containing dataset

mod bigquery;
mod registrar;
mod types;

pub use bigquery::{BigQueryClient, BIGQUERY_URL};
pub use registrar::Registrar;
pub use types::{
    CreateOutcome, DatasetRef, DatasetState, ExternalTable, LoadOutcome, LoadRequest,
    RegistrationPolicy, TableRef, Warehouse,
};

#[cfg(test)]
pub(crate) mod testing;
