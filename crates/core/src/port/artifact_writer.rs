// Artifact Writer Port (Interface)

use crate::domain::RunResult;
use crate::error::Result;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Local paths of a job's artifact pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    /// Structured metrics document (`results_<job_id>.json`)
    pub metrics: PathBuf,
    /// Tabular rows document (`results_<job_id>.csv`)
    pub rows: PathBuf,
}

impl ArtifactPaths {
    pub fn for_job(output_dir: &Path, job_id: &str) -> Self {
        Self {
            metrics: output_dir.join(metrics_file_name(job_id)),
            rows: output_dir.join(rows_file_name(job_id)),
        }
    }
}

pub fn metrics_file_name(job_id: &str) -> String {
    format!("results_{}.json", job_id)
}

pub fn rows_file_name(job_id: &str) -> String {
    format!("results_{}.csv", job_id)
}

/// Serializes a RunResult into the metrics + rows artifact pair.
///
/// Must write both files for every result, including failed ones with no rows.
#[async_trait]
pub trait ArtifactWriter: Send + Sync {
    async fn write(&self, job_id: &str, output_dir: &Path, result: &RunResult)
        -> Result<ArtifactPaths>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::sync::Mutex;

    /// Writer that records calls without touching the filesystem
    #[derive(Default)]
    pub struct MockArtifactWriter {
        writes: Mutex<Vec<(String, RunResult)>>,
        fail: Mutex<bool>,
    }

    impl MockArtifactWriter {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_fail(&self, fail: bool) {
            *self.fail.lock().unwrap() = fail;
        }

        pub fn writes(&self) -> Vec<(String, RunResult)> {
            self.writes.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ArtifactWriter for MockArtifactWriter {
        async fn write(
            &self,
            job_id: &str,
            output_dir: &Path,
            result: &RunResult,
        ) -> Result<ArtifactPaths> {
            if *self.fail.lock().unwrap() {
                return Err(AppError::Io(std::io::Error::new(
                    std::io::ErrorKind::PermissionDenied,
                    "mock artifact write failure",
                )));
            }
            self.writes
                .lock()
                .unwrap()
                .push((job_id.to_string(), result.clone()));
            Ok(ArtifactPaths::for_job(output_dir, job_id))
        }
    }
}
