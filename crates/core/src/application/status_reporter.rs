// Status Reporter - drives a job's remote status field

use crate::domain::{Job, JobStatus, JobUpdate};
use crate::error::{AppError, Result};
use crate::port::RemoteStore;
use std::sync::Arc;
use tracing::{info, warn};

/// Thin wrapper over [`RemoteStore::update_job`] for status payloads.
///
/// Expects a store that already applies the retry policy
/// (see [`RetryingRemoteStore`](crate::application::RetryingRemoteStore)).
pub struct StatusReporter {
    store: Arc<dyn RemoteStore>,
}

impl StatusReporter {
    pub fn new(store: Arc<dyn RemoteStore>) -> Self {
        Self { store }
    }

    /// Advisory transition (`queued`, `running`); failure is logged only.
    ///
    /// Returns whether the store accepted the update.
    pub async fn advisory(&self, job_id: &str, status: JobStatus) -> bool {
        match self.store.update_job(job_id, &JobUpdate::status(status.clone())).await {
            Ok(_) => {
                info!(job_id = %job_id, status = %status, "Status updated");
                true
            }
            Err(e) => {
                warn!(
                    job_id = %job_id,
                    status = %status,
                    error = %e,
                    "Could not apply advisory status update"
                );
                false
            }
        }
    }

    /// Terminal transition (`completed`, `failed`).
    ///
    /// Failures come back as [`AppError::Report`]; the caller treats them as a
    /// warning since local side effects already happened.
    pub async fn terminal(&self, job_id: &str, update: &JobUpdate) -> Result<Job> {
        let status = update
            .status
            .clone()
            .filter(JobStatus::is_terminal)
            .ok_or_else(|| {
                AppError::Internal(format!(
                    "terminal report for {} without terminal status",
                    job_id
                ))
            })?;

        match self.store.update_job(job_id, update).await {
            Ok(job) => {
                info!(job_id = %job_id, status = %status, "Terminal status reported");
                Ok(job)
            }
            Err(e) => {
                warn!(
                    job_id = %job_id,
                    status = %status,
                    error = %e,
                    "Terminal status update failed after retries"
                );
                Err(AppError::Report(e.to_string()))
            }
        }
    }
}
