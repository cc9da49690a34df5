// Port Layer - Interfaces for external dependencies

pub mod artifact_fetcher;
pub mod artifact_writer;
pub mod computation;
pub mod ledger;
pub mod object_store;
pub mod remote_store;
pub mod time_provider; // For deterministic testing

// Re-exports
pub use artifact_fetcher::{partial_path, ArtifactFetcher};
pub use artifact_writer::{metrics_file_name, rows_file_name, ArtifactPaths, ArtifactWriter};
pub use computation::{Computation, ComputationError};
pub use ledger::IdempotencyLedger;
pub use object_store::ObjectStore;
pub use remote_store::RemoteStore;
pub use time_provider::TimeProvider;
