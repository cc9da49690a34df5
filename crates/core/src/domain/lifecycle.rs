// Job Lifecycle - local orchestration stages per job

use super::error::{DomainError, Result};
use super::{JobId, JobStatus};

/// Terminal outcome reported to the entity store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Failed,
}

impl Outcome {
    pub fn from_success(success: bool) -> Self {
        if success {
            Outcome::Completed
        } else {
            Outcome::Failed
        }
    }

    pub fn status(self) -> JobStatus {
        match self {
            Outcome::Completed => JobStatus::Completed,
            Outcome::Failed => JobStatus::Failed,
        }
    }
}

/// Stage of a job inside one orchestration pass.
///
/// Ordered: Discovered -> Fetched -> Queued -> Running -> Processed
/// -> Published -> Reported. `Queued` is skipped when the advisory queued
/// update is disabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStage {
    Discovered,
    Fetched,
    Queued,
    Running,
    Processed,
    Published,
    Reported(Outcome),
}

impl std::fmt::Display for JobStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStage::Discovered => write!(f, "DISCOVERED"),
            JobStage::Fetched => write!(f, "FETCHED"),
            JobStage::Queued => write!(f, "QUEUED"),
            JobStage::Running => write!(f, "RUNNING"),
            JobStage::Processed => write!(f, "PROCESSED"),
            JobStage::Published => write!(f, "PUBLISHED"),
            JobStage::Reported(Outcome::Completed) => write!(f, "REPORTED(COMPLETED)"),
            JobStage::Reported(Outcome::Failed) => write!(f, "REPORTED(FAILED)"),
        }
    }
}

/// Tracks one job through its stages, rejecting skips and reversals
#[derive(Debug, Clone)]
pub struct JobLifecycle {
    job_id: JobId,
    stage: JobStage,
}

impl JobLifecycle {
    pub fn discovered(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            stage: JobStage::Discovered,
        }
    }

    pub fn stage(&self) -> JobStage {
        self.stage
    }

    /// Move to `next` if it is a legal successor of the current stage
    pub fn advance(&mut self, next: JobStage) -> Result<()> {
        if !Self::is_allowed(self.stage, next) {
            return Err(DomainError::InvalidStageTransition {
                job_id: self.job_id.clone(),
                from: self.stage.to_string(),
                to: next.to_string(),
            });
        }
        self.stage = next;
        Ok(())
    }

    fn is_allowed(from: JobStage, to: JobStage) -> bool {
        use JobStage::*;
        match (from, to) {
            (Reported(_), _) => false,
            (_, Reported(Outcome::Failed)) => true,
            (Discovered, Fetched) => true,
            (Fetched, Queued) | (Fetched, Running) => true,
            (Queued, Running) => true,
            (Running, Processed) => true,
            (Processed, Published) => true,
            (Published, Reported(Outcome::Completed)) => true,
            _ => false,
        }
    }
}
