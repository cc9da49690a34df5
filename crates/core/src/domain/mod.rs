// Domain Layer - Pure business logic and entities

pub mod error;
pub mod filename;
pub mod job;
pub mod ledger;
pub mod lifecycle;
pub mod run_result;

// Re-exports
pub use error::DomainError;
pub use filename::{pick_filename, sanitize_filename};
pub use job::{
    parse_listing, select_candidates, truncate_error_message, Job, JobId, JobStatus, JobUpdate,
    ERROR_MESSAGE_MAX_CHARS,
};
pub use ledger::LedgerEntry;
pub use lifecycle::{JobLifecycle, JobStage, Outcome};
pub use run_result::{Metrics, Row, RunResult};
