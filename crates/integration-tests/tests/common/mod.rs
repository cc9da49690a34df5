//! Shared harness: real ledger, artifact writer and line-stats computation
//! against in-memory store, fetcher and object store.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use jobrelay_core::application::{
    JobRunner, Orchestrator, OrchestratorPorts, OrchestratorSettings, Publisher, RetryPolicy,
    RetryingRemoteStore,
};
use jobrelay_core::config::StorageConfig;
use jobrelay_core::domain::{Job, JobStatus};
use jobrelay_core::port::artifact_fetcher::mocks::MockFetcher;
use jobrelay_core::port::object_store::mocks::MockObjectStore;
use jobrelay_core::port::remote_store::mocks::MockRemoteStore;
use jobrelay_core::port::time_provider::FixedTimeProvider;
use jobrelay_core::port::{Computation, RemoteStore};
use jobrelay_infra_fs::{JsonFileLedger, LocalArtifactWriter};
use jobrelay_infra_system::LineStatsComputation;
use tempfile::TempDir;

pub const INPUT_BODY: &str = "alpha,beta\ngamma\ndelta,epsilon,zeta\n";
pub const BUCKET: &str = "runs-bucket";
pub const NOW_MILLIS: i64 = 1_700_000_000_000;

pub struct Env {
    pub dir: TempDir,
    pub store: Arc<MockRemoteStore>,
    pub fetcher: Arc<MockFetcher>,
    pub objects: Arc<MockObjectStore>,
}

impl Env {
    pub fn new(jobs: Vec<Job>) -> Self {
        Self {
            dir: TempDir::new().unwrap(),
            store: Arc::new(MockRemoteStore::with_jobs(jobs)),
            fetcher: Arc::new(MockFetcher::serving(INPUT_BODY)),
            objects: Arc::new(MockObjectStore::new()),
        }
    }

    pub fn input_dir(&self) -> PathBuf {
        self.dir.path().join("inputs")
    }

    pub fn ledger_path(&self) -> PathBuf {
        self.dir.path().join("state.json")
    }

    pub async fn orchestrator(&self, update_to_queued: bool) -> Orchestrator {
        self.orchestrator_with(Arc::new(LineStatsComputation::new()), update_to_queued)
            .await
    }

    /// Fresh ledger instance each time, loaded from disk like a new process
    pub async fn orchestrator_with(
        &self,
        computation: Arc<dyn Computation>,
        update_to_queued: bool,
    ) -> Orchestrator {
        let store: Arc<dyn RemoteStore> = Arc::new(RetryingRemoteStore::new(
            self.store.clone(),
            RetryPolicy::new(3, Duration::from_millis(1)),
        ));

        Orchestrator::new(
            OrchestratorPorts {
                store,
                ledger: Arc::new(JsonFileLedger::open(self.ledger_path()).await),
                fetcher: self.fetcher.clone(),
                runner: JobRunner::new(computation),
                writer: Arc::new(LocalArtifactWriter::new()),
                publisher: Publisher::new(
                    self.objects.clone(),
                    StorageConfig::new(BUCKET, "processed-runs", true, 0),
                ),
                time_provider: Arc::new(FixedTimeProvider(NOW_MILLIS)),
            },
            OrchestratorSettings {
                input_dir: self.input_dir(),
                candidate_status: JobStatus::Processing,
                candidate_limit: 100,
                update_to_queued,
            },
        )
    }

    pub fn ledger_document(&self) -> serde_json::Value {
        read_json(&self.ledger_path())
    }

    pub fn output_file(&self, job_id: &str, name: &str) -> PathBuf {
        self.input_dir().join(format!("outputs_{}", job_id)).join(name)
    }
}

pub fn read_json(path: &Path) -> serde_json::Value {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}
