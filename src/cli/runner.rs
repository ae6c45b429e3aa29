//! CLI runner - executes commands

use crate::auth::{GoogleAuthenticator, TokenProvider, TokenSource};
use crate::cli::commands::{Cli, Commands, OutputFormat};
use crate::config::{IngestConfig, PipelineKind};
use crate::error::Result;
use crate::pipeline::{Pipeline, RunSummary, TablePlan, UnitPlan};
use crate::warehouse::RegistrationPolicy;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = self.load_config()?;

        match &self.cli.command {
            Commands::Taxi { force_download } => {
                self.ingest(&config, PipelineKind::Taxi, *force_download)
                    .await
            }
            Commands::Imdb { force_download } => {
                self.ingest(&config, PipelineKind::Imdb, *force_download)
                    .await
            }
            Commands::Plan { pipeline } => self.plan(&config, *pipeline),
        }
    }

    /// Load the configuration file, or defaults, then apply flag overrides
    pub fn load_config(&self) -> Result<IngestConfig> {
        let mut config = match &self.cli.config {
            Some(path) => IngestConfig::load(path)?,
            None => IngestConfig::default(),
        };

        if let Some(project) = &self.cli.project {
            config.gcp.project_id.clone_from(project);
        }
        if let Some(bucket) = &self.cli.bucket {
            config.gcp.bucket.clone_from(bucket);
        }

        config.validate()?;
        Ok(config)
    }

    /// Resolve the credential provider shared by storage and warehouse
    fn token_provider(config: &IngestConfig) -> Result<Arc<dyn TokenProvider>> {
        let source = TokenSource::from_env(&config.gcp.credentials_env)?;
        info!("Using {} credentials", source.kind());
        Ok(Arc::new(GoogleAuthenticator::new(source)))
    }

    async fn ingest(
        &self,
        config: &IngestConfig,
        kind: PipelineKind,
        force_download: bool,
    ) -> Result<()> {
        let provider = Self::token_provider(config)?;
        let pipeline = Pipeline::from_config(config, kind, provider)?;
        let summary = pipeline.run(force_download).await?;
        self.output(&summary_message(&pipeline.config().name, &summary));
        Ok(())
    }

    /// Print the plan; nothing remote is contacted
    fn plan(&self, config: &IngestConfig, kind: PipelineKind) -> Result<()> {
        // Token sources are lazy, so no credentials are fetched here
        let provider = Self::token_provider(config)?;
        let pipeline = Pipeline::from_config(config, kind, provider)?;

        let units = pipeline.plan()?;
        for unit in &units {
            self.output(&unit_message(unit));
        }
        for table in pipeline.tables(&units)? {
            self.output(&table_message(&table, pipeline.config().registration));
        }
        Ok(())
    }

    fn output(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => println!("{msg}"),
            OutputFormat::Pretty => println!("{}", pretty_line(msg)),
        }
    }
}

fn unit_message(plan: &UnitPlan) -> Value {
    json!({
        "type": "UNIT",
        "key": plan.unit.key,
        "source_url": plan.source_url,
        "raw_path": plan.raw_path.display().to_string(),
        "converted_path": plan.converted_path.as_ref().map(|p| p.display().to_string()),
        "object_key": plan.object_key,
        "uri": plan.uri,
    })
}

fn table_message(table: &TablePlan, policy: RegistrationPolicy) -> Value {
    json!({
        "type": "TABLE",
        "table": table.table.to_string(),
        "policy": policy,
        "uris": table.uris,
        "hive_prefix": table.hive_prefix,
    })
}

fn summary_message(name: &str, summary: &RunSummary) -> Value {
    json!({
        "type": "SUMMARY",
        "pipeline": name,
        "units": summary.units,
        "downloads": summary.downloads,
        "conversions": summary.conversions,
        "uploads": summary.uploads,
        "registrations": summary.registrations,
    })
}

/// One human-readable line per message
fn pretty_line(msg: &Value) -> String {
    let field = |key: &str| msg.get(key).and_then(Value::as_str).unwrap_or_default();

    match field("type") {
        "UNIT" => format!(
            "{:<20} {} -> {}",
            field("key"),
            field("source_url"),
            field("uri")
        ),
        "TABLE" => format!(
            "table {} ({}) over {}",
            field("table"),
            field("policy"),
            msg.get("uris")
                .and_then(Value::as_array)
                .map(|uris| {
                    uris.iter()
                        .filter_map(Value::as_str)
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default()
        ),
        "SUMMARY" => format!(
            "{}: {} units, {} downloads, {} conversions, {} uploads, {} registrations",
            field("pipeline"),
            msg.get("units")
                .and_then(Value::as_array)
                .map_or(0, Vec::len),
            msg["downloads"],
            msg["conversions"],
            msg["uploads"],
            msg["registrations"]
        ),
        _ => msg.to_string(),
    }
}
