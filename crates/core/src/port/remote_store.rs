// Remote Store Port (Interface)

use crate::domain::{Job, JobStatus, JobUpdate};
use crate::error::Result;
use async_trait::async_trait;

/// Typed operations against the remote job entity store
#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Fetch the full listing and keep jobs in `status` that are not samples,
    /// at most `limit` of them
    async fn list_candidates(&self, status: &JobStatus, limit: usize) -> Result<Vec<Job>>;

    /// Fetch a single job by id
    async fn get_job(&self, id: &str) -> Result<Job>;

    /// Apply a partial update and return the updated record
    async fn update_job(&self, id: &str, update: &JobUpdate) -> Result<Job>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::domain::select_candidates;
    use crate::error::AppError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory entity store with scriptable failures
    #[derive(Default)]
    pub struct MockRemoteStore {
        jobs: Mutex<Vec<Job>>,
        attempted: Mutex<Vec<(String, JobUpdate)>>,
        applied: Mutex<Vec<(String, JobUpdate)>>,
        list_failures: Mutex<usize>,
        status_failures: Mutex<HashMap<String, usize>>,
        list_calls: Mutex<usize>,
    }

    impl MockRemoteStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn with_jobs(jobs: Vec<Job>) -> Self {
            let store = Self::new();
            *store.jobs.lock().unwrap() = jobs;
            store
        }

        /// Fail the next `times` listing calls
        pub fn fail_list_times(&self, times: usize) {
            *self.list_failures.lock().unwrap() = times;
        }

        /// Fail the next `times` updates carrying `status` (`usize::MAX` = always)
        pub fn fail_status_updates(&self, status: JobStatus, times: usize) {
            self.status_failures
                .lock()
                .unwrap()
                .insert(status.as_str().to_string(), times);
        }

        pub fn list_calls(&self) -> usize {
            *self.list_calls.lock().unwrap()
        }

        /// Every update sent, including failed attempts
        pub fn attempted_updates(&self) -> Vec<(String, JobUpdate)> {
            self.attempted.lock().unwrap().clone()
        }

        /// Updates that were accepted by the store
        pub fn applied_updates(&self) -> Vec<(String, JobUpdate)> {
            self.applied.lock().unwrap().clone()
        }

        /// Accepted status values for one job, in order
        pub fn applied_statuses(&self, id: &str) -> Vec<JobStatus> {
            self.applied
                .lock()
                .unwrap()
                .iter()
                .filter(|(job_id, _)| job_id == id)
                .filter_map(|(_, update)| update.status.clone())
                .collect()
        }

        /// Count of update attempts (successful or not) for one job
        pub fn update_attempts_for(&self, id: &str) -> usize {
            self.attempted
                .lock()
                .unwrap()
                .iter()
                .filter(|(job_id, _)| job_id == id)
                .count()
        }

        pub fn job(&self, id: &str) -> Option<Job> {
            self.jobs
                .lock()
                .unwrap()
                .iter()
                .find(|job| job.id == id)
                .cloned()
        }

        fn take_failure(counter: &mut usize) -> bool {
            if *counter == 0 {
                return false;
            }
            if *counter != usize::MAX {
                *counter -= 1;
            }
            true
        }
    }

    #[async_trait]
    impl RemoteStore for MockRemoteStore {
        async fn list_candidates(&self, status: &JobStatus, limit: usize) -> Result<Vec<Job>> {
            *self.list_calls.lock().unwrap() += 1;
            if Self::take_failure(&mut self.list_failures.lock().unwrap()) {
                return Err(AppError::Network("mock listing failure".to_string()));
            }
            let jobs = self.jobs.lock().unwrap().clone();
            Ok(select_candidates(jobs, status, limit))
        }

        async fn get_job(&self, id: &str) -> Result<Job> {
            self.job(id).ok_or_else(|| AppError::Remote {
                status: 404,
                message: format!("job {} not found", id),
            })
        }

        async fn update_job(&self, id: &str, update: &JobUpdate) -> Result<Job> {
            self.attempted
                .lock()
                .unwrap()
                .push((id.to_string(), update.clone()));

            if let Some(status) = &update.status {
                let mut failures = self.status_failures.lock().unwrap();
                if let Some(remaining) = failures.get_mut(status.as_str()) {
                    if Self::take_failure(remaining) {
                        return Err(AppError::Network(format!(
                            "mock update failure for status {}",
                            status
                        )));
                    }
                }
            }

            let mut jobs = self.jobs.lock().unwrap();
            let job = jobs
                .iter_mut()
                .find(|job| job.id == id)
                .ok_or_else(|| AppError::Remote {
                    status: 404,
                    message: format!("job {} not found", id),
                })?;

            if let Some(status) = &update.status {
                job.status = status.clone();
            }
            if let Some(url) = &update.results_json_url {
                job.results_json_url = Some(url.clone());
            }
            if let Some(url) = &update.results_csv_url {
                job.results_csv_url = Some(url.clone());
            }
            if let Some(msg) = &update.error_message {
                job.error_message = Some(msg.clone());
            }
            let updated = job.clone();
            drop(jobs);

            self.applied
                .lock()
                .unwrap()
                .push((id.to_string(), update.clone()));
            Ok(updated)
        }
    }
}
