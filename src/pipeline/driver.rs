//! Pipeline driver

use super::types::{RunSummary, TablePlan, UnitPlan};
use crate::auth::TokenProvider;
use crate::config::{expand, IngestConfig, PathsConfig, PipelineConfig, PipelineKind};
use crate::convert::{Converter, SourceFormat};
use crate::error::{Error, Result};
use crate::fetch::Fetcher;
use crate::http::{join_url, HttpClient, HttpClientConfig};
use crate::output::{build_object_key, ObjectStorage};
use crate::warehouse::{
    BigQueryClient, DatasetRef, ExternalTable, Registrar, RegistrationPolicy, Warehouse,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Extensions dropped from a source file name before `.parquet` is added
const TEXT_EXTENSIONS: [&str; 3] = [".tsv", ".csv", ".txt"];

/// Name of the converted file for a source file name
///
/// `title.basics.tsv.gz` becomes `title.basics.parquet`.
pub fn parquet_file_name(source: &str) -> String {
    let stem = source.strip_suffix(".gz").unwrap_or(source);
    let stem = TEXT_EXTENSIONS
        .iter()
        .find_map(|ext| stem.strip_suffix(ext))
        .unwrap_or(stem);
    format!("{stem}.parquet")
}

/// The components a pipeline drives
#[derive(Debug)]
pub struct Services {
    pub fetcher: Fetcher,
    pub converter: Converter,
    pub storage: ObjectStorage,
    pub registrar: Registrar,
}

/// One configured dataset pipeline
#[derive(Debug)]
pub struct Pipeline {
    config: PipelineConfig,
    dataset: DatasetRef,
    paths: PathsConfig,
    services: Services,
}

impl Pipeline {
    /// Create a pipeline whose tables live in `project`
    pub fn new(
        config: PipelineConfig,
        project: impl Into<String>,
        paths: PathsConfig,
        services: Services,
    ) -> Self {
        let dataset = DatasetRef::new(project, config.dataset.clone());
        Self {
            config,
            dataset,
            paths,
            services,
        }
    }

    /// Wire a pipeline from configuration
    ///
    /// `provider` authenticates both the bucket and the warehouse.
    pub fn from_config(
        config: &IngestConfig,
        kind: PipelineKind,
        provider: Arc<dyn TokenProvider>,
    ) -> Result<Self> {
        let mut http = HttpClientConfig::builder().timeout(config.http.timeout());
        if let Some(agent) = &config.http.user_agent {
            http = http.user_agent(agent);
        }

        let storage = ObjectStorage::parse(&config.storage_url(), Some(provider.clone()))?;
        let warehouse: Arc<dyn Warehouse> = Arc::new(BigQueryClient::new(
            &config.gcp.bigquery_url,
            provider,
            &config.gcp.location,
            config.gcp.poll_interval(),
        )?);

        let services = Services {
            fetcher: Fetcher::new(HttpClient::with_config(http.build())?),
            converter: Converter::new(config.parquet.writer_config()),
            storage,
            registrar: Registrar::new(warehouse, &config.gcp.location),
        };

        Ok(Self::new(
            config.pipeline(kind).clone(),
            &config.gcp.project_id,
            config.paths.clone(),
            services,
        ))
    }

    /// Pipeline configuration
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Destination of uploads
    pub fn storage(&self) -> &ObjectStorage {
        &self.services.storage
    }

    /// Derive paths, URLs and keys for every work unit, in order
    pub fn plan(&self) -> Result<Vec<UnitPlan>> {
        let units = self.config.units.router()?.partitions()?;

        units
            .into_iter()
            .map(|unit| {
                let file_name = expand(&self.config.file_pattern, &unit.key);
                let converted_path = self
                    .config
                    .format
                    .needs_conversion()
                    .then(|| self.paths.parquet_dir.join(parquet_file_name(&file_name)));
                let object_key = build_object_key(
                    &self.config.name,
                    &unit.segment(),
                    &expand(&self.config.object_name, &unit.key),
                );

                Ok(UnitPlan {
                    source_url: join_url(&self.config.base_url, &file_name)?.to_string(),
                    raw_path: self.paths.raw_dir.join(&file_name),
                    converted_path,
                    uri: self.services.storage.uri(&object_key),
                    object_key,
                    unit,
                })
            })
            .collect()
    }

    /// Tables registered for `units`
    pub fn tables(&self, units: &[UnitPlan]) -> Result<Vec<TablePlan>> {
        match &self.config.table {
            Some(table) => {
                let router = self.config.units.router()?;
                Ok(vec![self.shared_table(table, router.partition_field())])
            }
            None => Ok(units.iter().map(|plan| self.unit_table(plan)).collect()),
        }
    }

    /// Table covering a single unit
    fn unit_table(&self, plan: &UnitPlan) -> TablePlan {
        TablePlan {
            table: self.dataset.table(plan.unit.table_name()),
            uris: vec![plan.uri.clone()],
            hive_prefix: None,
        }
    }

    /// One table over every unit through a wildcard
    fn shared_table(&self, table: &str, column: Option<&str>) -> TablePlan {
        let segment = match column {
            Some(column) => format!("{column}=*"),
            None => "*".to_string(),
        };
        let glob = build_object_key(
            &self.config.name,
            &segment,
            &expand(&self.config.object_name, "*"),
        );

        TablePlan {
            table: self.dataset.table(table),
            uris: vec![self.services.storage.uri(&glob)],
            hive_prefix: column.map(|_| self.services.storage.uri(&self.config.name)),
        }
    }

    /// Run every unit in order
    ///
    /// With `force_download` unset, nothing is fetched, converted or
    /// uploaded; the tables are registered over what the bucket holds.
    pub async fn run(&self, force_download: bool) -> Result<RunSummary> {
        let plans = self.plan()?;
        let mut summary = RunSummary::default();

        info!(
            "Running {} pipeline over {} units (force_download={force_download})",
            self.config.name,
            plans.len()
        );

        if force_download {
            self.ensure_dirs().await?;
        }

        for plan in &plans {
            info!("Starting {} {}", self.config.name, plan.unit);

            if force_download {
                self.transfer(plan, &mut summary).await?;
            }

            if self.config.table.is_none() {
                self.register(&self.unit_table(plan)).await?;
                summary.registrations += 1;
            }

            summary.units.push(plan.unit.key.clone());
            info!("Done {} {}", self.config.name, plan.unit);
        }

        if self.config.table.is_some() {
            if plans.is_empty() {
                return Err(Error::config(format!(
                    "{} has no work units to register",
                    self.config.name
                )));
            }
            for table in self.tables(&plans)? {
                self.register(&table).await?;
                summary.registrations += 1;
            }
        }

        info!(
            "{} finished: {} downloads, {} conversions, {} uploads, {} registrations",
            self.config.name,
            summary.downloads,
            summary.conversions,
            summary.uploads,
            summary.registrations
        );
        Ok(summary)
    }

    /// Fetch, convert and upload one unit
    async fn transfer(&self, plan: &UnitPlan, summary: &mut RunSummary) -> Result<()> {
        self.services
            .fetcher
            .fetch(&plan.source_url, &plan.raw_path)
            .await?;
        summary.downloads += 1;

        if let (SourceFormat::Delimited(format), Some(target)) =
            (&self.config.format, &plan.converted_path)
        {
            self.services
                .converter
                .convert(format, &plan.raw_path, target)?;
            summary.conversions += 1;
        }

        self.services
            .storage
            .upload_file(plan.upload_path(), &plan.object_key)
            .await?;
        summary.uploads += 1;
        Ok(())
    }

    async fn register(&self, table: &TablePlan) -> Result<()> {
        debug!("Registering {} over {:?}", table.table, table.uris);
        match self.config.registration {
            RegistrationPolicy::External => {
                self.services
                    .registrar
                    .register_external(&ExternalTable {
                        table: table.table.clone(),
                        uris: table.uris.clone(),
                        hive_prefix: table.hive_prefix.clone(),
                    })
                    .await
            }
            RegistrationPolicy::Load => self
                .services
                .registrar
                .register_load(&table.table, table.uris.clone())
                .await
                .map(|_| ()),
        }
    }

    async fn ensure_dirs(&self) -> Result<()> {
        tokio::fs::create_dir_all(&self.paths.raw_dir).await?;
        if self.config.format.needs_conversion() {
            tokio::fs::create_dir_all(&self.paths.parquet_dir).await?;
        }
        Ok(())
    }
}
