// Idempotency Ledger Port (Interface)

use crate::domain::LedgerEntry;
use crate::error::Result;
use async_trait::async_trait;

/// Durable job id -> "already handled" mapping.
///
/// Implementations persist after every successful `record` so a restarted
/// process sees the same set of handled jobs.
#[async_trait]
pub trait IdempotencyLedger: Send + Sync {
    /// True if the job was already handled by this instance
    async fn has(&self, job_id: &str) -> bool;

    /// Record a handled job and persist the ledger
    async fn record(&self, job_id: &str, entry: LedgerEntry) -> Result<()>;

    /// Look up the recorded entry
    async fn get(&self, job_id: &str) -> Option<LedgerEntry>;

    /// Number of recorded jobs
    async fn len(&self) -> usize;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// In-memory ledger
    #[derive(Default)]
    pub struct MockLedger {
        entries: Mutex<HashMap<String, LedgerEntry>>,
        record_calls: Mutex<Vec<String>>,
        fail_records: Mutex<bool>,
    }

    impl MockLedger {
        pub fn new() -> Self {
            Self::default()
        }

        /// Ledger that already knows `job_ids`
        pub fn with_handled(job_ids: &[&str]) -> Self {
            let ledger = Self::new();
            {
                let mut entries = ledger.entries.lock().unwrap();
                for id in job_ids {
                    entries.insert(id.to_string(), LedgerEntry::new("seed", "seed", 0));
                }
            }
            ledger
        }

        pub fn set_fail_records(&self, fail: bool) {
            *self.fail_records.lock().unwrap() = fail;
        }

        /// Ids passed to `record`, in call order
        pub fn record_calls(&self) -> Vec<String> {
            self.record_calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl IdempotencyLedger for MockLedger {
        async fn has(&self, job_id: &str) -> bool {
            self.entries.lock().unwrap().contains_key(job_id)
        }

        async fn record(&self, job_id: &str, entry: LedgerEntry) -> Result<()> {
            self.record_calls.lock().unwrap().push(job_id.to_string());
            if *self.fail_records.lock().unwrap() {
                return Err(AppError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "mock ledger write failure",
                )));
            }
            self.entries
                .lock()
                .unwrap()
                .insert(job_id.to_string(), entry);
            Ok(())
        }

        async fn get(&self, job_id: &str) -> Option<LedgerEntry> {
            self.entries.lock().unwrap().get(job_id).cloned()
        }

        async fn len(&self) -> usize {
            self.entries.lock().unwrap().len()
        }
    }
}
