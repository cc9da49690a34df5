// Orchestrator - poll, filter, and drive each job to a terminal state

use crate::application::{JobRunner, Publisher, StatusReporter};
use crate::config::{output_dir, PollerConfig};
use crate::domain::{
    pick_filename, Job, JobLifecycle, JobStage, JobStatus, JobUpdate, LedgerEntry, Outcome,
    RunResult,
};
use crate::error::{AppError, Result};
use crate::port::{
    metrics_file_name, rows_file_name, ArtifactFetcher, ArtifactWriter, IdempotencyLedger,
    RemoteStore, TimeProvider,
};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

/// Collaborators the orchestrator drives
pub struct OrchestratorPorts {
    /// Entity store, expected to already apply the retry policy
    pub store: Arc<dyn RemoteStore>,
    pub ledger: Arc<dyn IdempotencyLedger>,
    pub fetcher: Arc<dyn ArtifactFetcher>,
    pub runner: JobRunner,
    pub writer: Arc<dyn ArtifactWriter>,
    pub publisher: Publisher,
    pub time_provider: Arc<dyn TimeProvider>,
}

/// Batch-level knobs
#[derive(Debug, Clone)]
pub struct OrchestratorSettings {
    pub input_dir: PathBuf,
    pub candidate_status: JobStatus,
    pub candidate_limit: usize,
    pub update_to_queued: bool,
}

impl OrchestratorSettings {
    pub fn from_config(config: &PollerConfig) -> Self {
        Self {
            input_dir: config.input_dir.clone(),
            candidate_status: JobStatus::Processing,
            candidate_limit: config.candidate_limit,
            update_to_queued: config.update_to_queued,
        }
    }
}

/// Why a discovered job was not worked on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Blank id or input URL
    Invalid,
    /// Present in the idempotency ledger
    AlreadyHandled,
}

/// Per-job result of one pass
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobOutcome {
    Skipped(SkipReason),
    Handled {
        outcome: Outcome,
        /// Terminal update could not be delivered
        report_error: Option<String>,
    },
}

/// Counters for one batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchSummary {
    pub discovered: usize,
    pub skipped: usize,
    pub handled: usize,
    pub completed: usize,
    pub failed: usize,
    pub report_warnings: usize,
}

impl BatchSummary {
    fn add(&mut self, outcome: &JobOutcome) {
        match outcome {
            JobOutcome::Skipped(_) => self.skipped += 1,
            JobOutcome::Handled {
                outcome,
                report_error,
            } => {
                self.handled += 1;
                match outcome {
                    Outcome::Completed => self.completed += 1,
                    Outcome::Failed => self.failed += 1,
                }
                if report_error.is_some() {
                    self.report_warnings += 1;
                }
            }
        }
    }
}

/// Fault that short-circuits a job to `reported(failed)`
#[derive(Debug)]
struct JobFault {
    message: String,
    /// Artifacts already exist locally for this job
    artifacts_written: bool,
}

impl JobFault {
    fn before_artifacts(context: &str, error: AppError) -> Self {
        Self {
            message: format!("{}: {}", context, error),
            artifacts_written: false,
        }
    }

    fn after_artifacts(context: &str, error: AppError) -> Self {
        Self {
            message: format!("{}: {}", context, error),
            artifacts_written: true,
        }
    }
}

/// Terminal payload ready to report
struct Published {
    outcome: Outcome,
    update: JobUpdate,
}

/// Local context of one job
struct JobContext<'a> {
    job: &'a Job,
    url: &'a str,
    filename: String,
    input_path: PathBuf,
    output_dir: PathBuf,
}

/// Top-level batch loop.
///
/// Jobs are handled strictly one after another; each one is fully reported and
/// recorded before the next begins. No per-job error ends the batch.
pub struct Orchestrator {
    store: Arc<dyn RemoteStore>,
    ledger: Arc<dyn IdempotencyLedger>,
    fetcher: Arc<dyn ArtifactFetcher>,
    runner: JobRunner,
    writer: Arc<dyn ArtifactWriter>,
    publisher: Publisher,
    reporter: StatusReporter,
    time_provider: Arc<dyn TimeProvider>,
    settings: OrchestratorSettings,
}

impl Orchestrator {
    pub fn new(ports: OrchestratorPorts, settings: OrchestratorSettings) -> Self {
        Self {
            reporter: StatusReporter::new(Arc::clone(&ports.store)),
            store: ports.store,
            ledger: ports.ledger,
            fetcher: ports.fetcher,
            runner: ports.runner,
            writer: ports.writer,
            publisher: ports.publisher,
            time_provider: ports.time_provider,
            settings,
        }
    }

    /// Poll the store for candidates
    ///
    /// # Errors
    /// The listing error after retries; nothing was started at that point.
    pub async fn discover(&self) -> Result<Vec<Job>> {
        let jobs = self
            .store
            .list_candidates(&self.settings.candidate_status, self.settings.candidate_limit)
            .await?;
        info!(
            status = %self.settings.candidate_status,
            count = jobs.len(),
            "Discovered candidate jobs"
        );
        Ok(jobs)
    }

    /// Discover and process one batch under a span tagged with a fresh
    /// `batch_id`. `on_discovered` sees the candidates before any is touched.
    pub async fn run_batch(&self, on_discovered: impl FnOnce(&[Job])) -> Result<BatchSummary> {
        let span = info_span!("batch", batch_id = %Uuid::new_v4());
        async {
            let jobs = self.discover().await?;
            on_discovered(&jobs);
            Ok(self.process_all(&jobs).await)
        }
        .instrument(span)
        .await
    }

    /// Process already-discovered jobs sequentially
    pub async fn process_all(&self, jobs: &[Job]) -> BatchSummary {
        let mut summary = BatchSummary {
            discovered: jobs.len(),
            ..Default::default()
        };
        for job in jobs {
            let outcome = self.process_job(job).await;
            summary.add(&outcome);
        }
        info!(
            discovered = summary.discovered,
            handled = summary.handled,
            completed = summary.completed,
            failed = summary.failed,
            skipped = summary.skipped,
            report_warnings = summary.report_warnings,
            "Batch finished"
        );
        summary
    }

    /// Drive one job from discovery to a ledger entry
    pub async fn process_job(&self, job: &Job) -> JobOutcome {
        let url = match job.input_url() {
            Some(url) if job.is_actionable() => url,
            _ => {
                warn!(job_id = %job.id, "Skipping job without id or file_url");
                return JobOutcome::Skipped(SkipReason::Invalid);
            }
        };
        if !job.has_path_safe_id() {
            warn!(job_id = %job.id, "Skipping job whose id is not a single path component");
            return JobOutcome::Skipped(SkipReason::Invalid);
        }

        if self.ledger.has(&job.id).await {
            info!(job_id = %job.id, "Already handled, skipping");
            return JobOutcome::Skipped(SkipReason::AlreadyHandled);
        }

        let filename = pick_filename(job);
        let ctx = JobContext {
            job,
            url,
            input_path: self.settings.input_dir.join(&filename),
            output_dir: output_dir(&self.settings.input_dir, &job.id),
            filename,
        };

        let span = info_span!("job", job_id = %job.id);
        self.handle(&ctx).instrument(span).await
    }

    async fn handle(&self, ctx: &JobContext<'_>) -> JobOutcome {
        let mut lifecycle = JobLifecycle::discovered(&ctx.job.id);

        let (outcome, update) = match self.execute(ctx, &mut lifecycle).await {
            Ok(published) => (published.outcome, published.update),
            Err(fault) => {
                error!(job_id = %ctx.job.id, stage = %lifecycle.stage(), error = %fault.message, "Job faulted");
                if !fault.artifacts_written {
                    self.write_fault_artifacts(ctx, &fault.message).await;
                }
                (Outcome::Failed, JobUpdate::fault(&fault.message))
            }
        };

        let report_error = self
            .reporter
            .terminal(&ctx.job.id, &update)
            .await
            .err()
            .map(|e| e.to_string());

        if let Err(e) = lifecycle.advance(JobStage::Reported(outcome)) {
            // Only reachable if a stage was skipped above
            error!(job_id = %ctx.job.id, error = %e, "Lifecycle out of order");
        }

        self.record(ctx, outcome, report_error.clone()).await;
        JobOutcome::Handled {
            outcome,
            report_error,
        }
    }

    /// fetched -> (queued) -> running -> processed -> published
    async fn execute(
        &self,
        ctx: &JobContext<'_>,
        lifecycle: &mut JobLifecycle,
    ) -> std::result::Result<Published, JobFault> {
        let job_id = ctx.job.id.as_str();

        self.fetcher
            .fetch(ctx.url, &ctx.input_path)
            .await
            .map_err(|e| JobFault::before_artifacts("download failed", e))?;
        info!(job_id = %job_id, path = %ctx.input_path.display(), "Input fetched");
        advance(lifecycle, JobStage::Fetched, false)?;

        if self.settings.update_to_queued {
            self.reporter.advisory(job_id, JobStatus::Queued).await;
            advance(lifecycle, JobStage::Queued, false)?;
        }
        self.reporter.advisory(job_id, JobStatus::Running).await;
        advance(lifecycle, JobStage::Running, false)?;

        let result = self.runner.run(&ctx.input_path, job_id).await;
        let paths = self
            .writer
            .write(job_id, &ctx.output_dir, &result)
            .await
            .map_err(|e| JobFault::before_artifacts("artifact write failed", e))?;
        advance(lifecycle, JobStage::Processed, true)?;

        let json_url = self
            .publisher
            .publish_artifact(job_id, &metrics_file_name(job_id), &paths.metrics)
            .await
            .map_err(|e| JobFault::after_artifacts("upload failed", e))?;
        let csv_url = self
            .publisher
            .publish_artifact(job_id, &rows_file_name(job_id), &paths.rows)
            .await
            .map_err(|e| JobFault::after_artifacts("upload failed", e))?;
        advance(lifecycle, JobStage::Published, true)?;

        Ok(Published {
            outcome: Outcome::from_success(result.success),
            update: JobUpdate::terminal(result.success, json_url, csv_url, &result.errors),
        })
    }

    async fn write_fault_artifacts(&self, ctx: &JobContext<'_>, message: &str) {
        let result = RunResult::failed(message);
        if let Err(e) = self
            .writer
            .write(&ctx.job.id, &ctx.output_dir, &result)
            .await
        {
            warn!(job_id = %ctx.job.id, error = %e, "Could not write fault artifacts");
        }
    }

    async fn record(&self, ctx: &JobContext<'_>, outcome: Outcome, report_error: Option<String>) {
        let mut entry = LedgerEntry::new(
            ctx.filename.clone(),
            display_path(&ctx.input_path),
            self.time_provider.now_secs(),
        )
        .with_outcome(outcome.status());
        if let Some(err) = report_error {
            entry = entry.with_report_error(err);
        }

        match self.ledger.record(&ctx.job.id, entry).await {
            Ok(()) => info!(job_id = %ctx.job.id, outcome = %outcome.status(), "Job recorded"),
            Err(e) => error!(
                job_id = %ctx.job.id,
                error = %e,
                "Could not persist ledger entry; job may be picked up again"
            ),
        }
    }
}

fn advance(
    lifecycle: &mut JobLifecycle,
    stage: JobStage,
    artifacts_written: bool,
) -> std::result::Result<(), JobFault> {
    lifecycle.advance(stage).map_err(|e| JobFault {
        message: format!("internal error: {}", e),
        artifacts_written,
    })
}

fn display_path(path: &Path) -> String {
    path.display().to_string()
}
