use std::sync::Arc;

use anyhow::Context;
use bqcluster::auth::{ServiceAccountTokens, TokenProvider};
use bqcluster::bigquery::BigQueryClientFactory;
use bqcluster::conf::{Config, Environment, ServiceAccountCredentials};
use bqcluster::core::{CliArgs, ClusterError, FATAL_TARGET, setup_logging};
use bqcluster::orchestrator::{Orchestrator, RunSettings, RunSummary};
use bqcluster::sheet::SheetsClient;
use clap::Parser;
use log::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = CliArgs::parse();
    let env = Environment::resolve(args.env.as_deref())?;
    let mut config = Config::load(args.config.as_deref()).context("loading configuration")?;
    if let Some(range) = &args.range {
        config.sheet.range = range.clone();
        config.validate()?;
    }
    let _log_guard = setup_logging(&config.logging, env).context("initializing logging")?;
    info!("Cluster environment: {env} ({args:?})");

    match run(&config, env).await {
        Ok(summary) => {
            info!(
                "updated {} tables, {} failed, {} status writes failed",
                summary.updated, summary.failed, summary.status_write_failures
            );
            println!("Process DONE.");
            Ok(())
        }
        Err(err) => {
            error!(target: FATAL_TARGET, "run aborted: {err}");
            Err(err).context("clustering run aborted")
        }
    }
}

async fn run(config: &Config, env: Environment) -> Result<RunSummary, ClusterError> {
    let cwd = std::env::current_dir()?;
    let credentials_path = config.credentials.path_for(&cwd, env);
    let credentials = ServiceAccountCredentials::load(&credentials_path)?;
    info!("loaded service account {}", credentials.client_email);

    let tokens: Arc<dyn TokenProvider> = Arc::new(ServiceAccountTokens::new(&credentials).await?);
    let sheet = SheetsClient::new(&config.sheet, Arc::clone(&tokens))?;
    let factory = BigQueryClientFactory::new(&config.bigquery, tokens)?;
    let settings = RunSettings::from_config(&config.sheet)?;

    let mut orchestrator = Orchestrator::new(settings, sheet, factory, config.bigquery.max_clients);
    orchestrator.run().await
}
