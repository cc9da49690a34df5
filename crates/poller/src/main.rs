//! jobrelay - single-pass job poller
//!
//! Lists pending jobs from the entity store, runs each one through the
//! configured computation, publishes the artifacts to S3 and reports the
//! terminal status back.
//!
//! Exit codes: 0 after a completed pass (per-job failures included),
//! 1 when the pass could not start, 2 for invalid configuration.

mod cli;
mod logging;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};

use jobrelay_core::application::{
    JobRunner, Orchestrator, OrchestratorPorts, OrchestratorSettings, Publisher, RetryPolicy,
    RetryingRemoteStore,
};
use jobrelay_core::config::{PipelineConfig, PollerConfig};
use jobrelay_core::error::AppError;
use jobrelay_core::port::time_provider::SystemTimeProvider;
use jobrelay_core::port::{Computation, RemoteStore};
use jobrelay_infra_fs::{JsonFileLedger, LocalArtifactWriter};
use jobrelay_infra_http::{build_client, HttpArtifactFetcher, HttpRemoteStore};
use jobrelay_infra_s3::S3ObjectStore;
use jobrelay_infra_system::{LineStatsComputation, SubprocessComputation};

use crate::cli::Cli;

const EXIT_RUN_FAILED: u8 = 1;
const EXIT_CONFIG: u8 = 2;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init();

    info!("jobrelay v{} starting...", jobrelay_core::VERSION);

    match run(cli.into_config()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) if is_config_error(&e) => {
            error!(error = %e, "Invalid configuration");
            eprintln!("{} {:#}", "Configuration error:".red().bold(), e);
            ExitCode::from(EXIT_CONFIG)
        }
        Err(e) => {
            error!(error = ?e, "Run aborted");
            eprintln!("{} {:#}", "Error:".red().bold(), e);
            ExitCode::from(EXIT_RUN_FAILED)
        }
    }
}

fn is_config_error(e: &anyhow::Error) -> bool {
    e.downcast_ref::<AppError>().is_some_and(AppError::is_config)
}

async fn run(config: PollerConfig) -> Result<()> {
    config.validate()?;

    let settings = OrchestratorSettings::from_config(&config);
    let candidate_status = settings.candidate_status.clone();
    let orchestrator = Orchestrator::new(wire(&config).await?, settings);

    let summary = orchestrator
        .run_batch(|jobs| output::print_candidates(jobs, &candidate_status))
        .await
        .context("Failed to list candidate jobs")?;
    output::print_summary(&summary, &config.input_dir);
    Ok(())
}

/// DI wiring: one adapter per port
async fn wire(config: &PollerConfig) -> Result<OrchestratorPorts> {
    let retry = RetryPolicy::from_settings(&config.retry);
    let client = build_client().context("Failed to build HTTP client")?;

    let store: Arc<dyn RemoteStore> = Arc::new(RetryingRemoteStore::new(
        Arc::new(HttpRemoteStore::new(client.clone(), config.store.clone())),
        retry.clone(),
    ));

    info!(ledger = %config.ledger_path.display(), "Loading ledger...");
    let ledger = Arc::new(JsonFileLedger::open(config.ledger_path.clone()).await);

    let fetcher = Arc::new(HttpArtifactFetcher::new(
        client,
        retry,
        config.store.api_base.clone(),
        config.store.api_key.clone(),
    ));

    let object_store = Arc::new(S3ObjectStore::from_env().await);

    Ok(OrchestratorPorts {
        store,
        ledger,
        fetcher,
        runner: JobRunner::new(computation(&config.pipeline)),
        writer: Arc::new(LocalArtifactWriter::new()),
        publisher: Publisher::new(object_store, config.storage.clone()),
        time_provider: Arc::new(SystemTimeProvider),
    })
}

fn computation(pipeline: &PipelineConfig) -> Arc<dyn Computation> {
    match pipeline {
        PipelineConfig::LineStats => Arc::new(LineStatsComputation::new()),
        PipelineConfig::Command {
            program,
            args,
            timeout,
        } => {
            info!(program = %program, "Using external command pipeline");
            Arc::new(SubprocessComputation::new(program.clone(), args.clone()).with_timeout(*timeout))
        }
    }
}
