// Application Layer - orchestration over the ports

pub mod job_runner;
pub mod orchestrator;
pub mod publisher;
pub mod retry;
pub mod retrying_store;
pub mod status_reporter;

pub use job_runner::JobRunner;
pub use orchestrator::{
    BatchSummary, JobOutcome, Orchestrator, OrchestratorPorts, OrchestratorSettings, SkipReason,
};
pub use publisher::Publisher;
pub use retry::RetryPolicy;
pub use retrying_store::RetryingRemoteStore;
pub use status_reporter::StatusReporter;
