// jobrelay Infrastructure - Local Filesystem Adapters
// Implements: IdempotencyLedger, ArtifactWriter

pub mod artifact_writer;
pub mod atomic;
pub mod json_ledger;

pub use artifact_writer::{LocalArtifactWriter, NO_ROWS_PLACEHOLDER};
pub use atomic::write_atomic;
pub use json_ledger::JsonFileLedger;
