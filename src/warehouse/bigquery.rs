//! BigQuery REST client
//!
//! Talks to the v2 API directly through [`HttpClient`]. Queries and load
//! jobs are polled until they finish; there is no attempt limit.

use super::types::{
    CreateOutcome, DatasetRef, LoadOutcome, LoadRequest, TableRef, Warehouse,
};
use crate::auth::TokenProvider;
use crate::error::{Error, Result};
use crate::http::{HttpClient, HttpClientConfig, RequestConfig};
use async_trait::async_trait;
use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Default REST endpoint
pub const BIGQUERY_URL: &str = "https://bigquery.googleapis.com/bigquery/v2";

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobReference {
    job_id: String,
    #[serde(default)]
    location: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct QueryResponse {
    #[serde(default)]
    job_complete: bool,
    job_reference: Option<JobReference>,
    #[serde(default)]
    errors: Vec<ErrorProto>,
}

#[derive(Debug, Deserialize)]
struct ErrorProto {
    #[serde(default)]
    reason: Option<String>,
    #[serde(default)]
    message: String,
}

impl ErrorProto {
    fn describe(&self) -> String {
        match &self.reason {
            Some(reason) => format!("{reason}: {}", self.message),
            None => self.message.clone(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobStatus {
    state: String,
    error_result: Option<ErrorProto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LoadStatistics {
    output_rows: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct JobStatistics {
    load: Option<LoadStatistics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Job {
    job_reference: JobReference,
    status: JobStatus,
    #[serde(default)]
    statistics: Option<JobStatistics>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Table {
    num_rows: Option<String>,
}

// ============================================================================
// Client
// ============================================================================

/// BigQuery client over the REST API
#[derive(Debug)]
pub struct BigQueryClient {
    http: HttpClient,
    location: String,
    poll_interval: Duration,
}

impl BigQueryClient {
    /// Create a client for `base_url` authenticating with `provider`
    ///
    /// `location` is where query and load jobs run.
    pub fn new(
        base_url: &str,
        provider: Arc<dyn TokenProvider>,
        location: impl Into<String>,
        poll_interval: Duration,
    ) -> Result<Self> {
        let config = HttpClientConfig::builder().base_url(base_url).build();
        Ok(Self::with_http(
            HttpClient::with_auth(config, provider)?,
            location,
            poll_interval,
        ))
    }

    /// Create a client over an existing HTTP client
    pub fn with_http(http: HttpClient, location: impl Into<String>, poll_interval: Duration) -> Self {
        Self {
            http,
            location: location.into(),
            poll_interval,
        }
    }

    /// Job location
    pub fn location(&self) -> &str {
        &self.location
    }

    async fn get_job(&self, project: &str, job_id: &str, location: &str) -> Result<Job> {
        self.http
            .request_json(
                Method::GET,
                &format!("projects/{project}/jobs/{job_id}"),
                RequestConfig::new().query("location", location),
            )
            .await
    }

    async fn get_query_results(
        &self,
        project: &str,
        job_id: &str,
        location: &str,
    ) -> Result<QueryResponse> {
        self.http
            .request_json(
                Method::GET,
                &format!("projects/{project}/queries/{job_id}"),
                RequestConfig::new()
                    .query("location", location)
                    .query("maxResults", "0"),
            )
            .await
    }
}

#[async_trait]
impl Warehouse for BigQueryClient {
    async fn dataset_exists(&self, dataset: &DatasetRef) -> Result<bool> {
        let path = format!(
            "projects/{}/datasets/{}",
            dataset.project, dataset.dataset
        );
        match self.http.get(&path).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn create_dataset(&self, dataset: &DatasetRef, location: &str) -> Result<CreateOutcome> {
        let body = json!({
            "datasetReference": {
                "projectId": dataset.project,
                "datasetId": dataset.dataset,
            },
            "location": location,
        });

        match self
            .http
            .post_json::<Value>(&format!("projects/{}/datasets", dataset.project), body)
            .await
        {
            Ok(_) => Ok(CreateOutcome::Created),
            Err(e) if e.is_conflict() => Ok(CreateOutcome::AlreadyExists),
            Err(e) => Err(e),
        }
    }

    async fn execute(&self, project: &str, sql: &str) -> Result<()> {
        debug!("Executing query: {sql}");
        let body = json!({
            "query": sql,
            "useLegacySql": false,
            "location": self.location,
        });

        let mut response: QueryResponse = self
            .http
            .post_json(&format!("projects/{project}/queries"), body)
            .await?;

        loop {
            if let Some(error) = response.errors.first() {
                let job_id = response
                    .job_reference
                    .as_ref()
                    .map(|r| r.job_id.clone())
                    .unwrap_or_default();
                return Err(Error::job(job_id, error.describe()));
            }
            if response.job_complete {
                return Ok(());
            }

            let reference = response
                .job_reference
                .ok_or_else(|| Error::warehouse("Incomplete query without a job reference"))?;
            let location = reference.location.as_deref().unwrap_or(&self.location);

            tokio::time::sleep(self.poll_interval).await;
            debug!("Polling query job {}", reference.job_id);
            response = self
                .get_query_results(project, &reference.job_id, location)
                .await?;
        }
    }

    async fn load_parquet(&self, request: &LoadRequest) -> Result<LoadOutcome> {
        let project = &request.table.project;
        let body = json!({
            "jobReference": {
                "projectId": project,
                "location": self.location,
            },
            "configuration": {
                "load": {
                    "sourceUris": request.source_uris,
                    "destinationTable": {
                        "projectId": project,
                        "datasetId": request.table.dataset,
                        "tableId": request.table.table,
                    },
                    "sourceFormat": "PARQUET",
                    "writeDisposition": "WRITE_TRUNCATE",
                }
            }
        });

        let mut job: Job = self
            .http
            .post_json(&format!("projects/{project}/jobs"), body)
            .await?;
        info!(
            "Started load job {} into {}",
            job.job_reference.job_id, request.table
        );

        while job.status.state != "DONE" {
            tokio::time::sleep(self.poll_interval).await;
            let location = job
                .job_reference
                .location
                .clone()
                .unwrap_or_else(|| self.location.clone());
            job = self
                .get_job(project, &job.job_reference.job_id, &location)
                .await?;
            debug!("Load job {} is {}", job.job_reference.job_id, job.status.state);
        }

        if let Some(error) = job.status.error_result {
            return Err(Error::job(job.job_reference.job_id, error.describe()));
        }

        let output_rows = job
            .statistics
            .and_then(|s| s.load)
            .and_then(|l| l.output_rows)
            .and_then(|rows| rows.parse().ok());

        Ok(LoadOutcome {
            job_id: job.job_reference.job_id,
            output_rows,
        })
    }

    async fn row_count(&self, table: &TableRef) -> Result<u64> {
        let path = format!(
            "projects/{}/datasets/{}/tables/{}",
            table.project, table.dataset, table.table
        );
        let response: Table = self.http.get_json(&path).await?;

        match response.num_rows {
            Some(rows) => rows
                .parse()
                .map_err(|_| Error::warehouse(format!("Invalid numRows for {table}: {rows}"))),
            None => Ok(0),
        }
    }
}
