// JSON-file idempotency ledger
//
// Document layout: {"downloaded_ids": {"<job_id>": {filename, saved_to, ts, ...}}}
// The whole document is rewritten on every record.

use crate::atomic::write_atomic;
use async_trait::async_trait;
use jobrelay_core::domain::LedgerEntry;
use jobrelay_core::error::Result;
use jobrelay_core::port::IdempotencyLedger;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct LedgerDocument {
    #[serde(default)]
    downloaded_ids: Map<String, Value>,
    /// Unknown top-level keys survive rewrites
    #[serde(flatten)]
    extra: Map<String, Value>,
}

/// Ledger persisted as a single JSON document.
///
/// Entries are kept as raw JSON so records written by older versions still
/// count as handled even if they no longer decode into [`LedgerEntry`].
pub struct JsonFileLedger {
    path: PathBuf,
    document: Mutex<LedgerDocument>,
}

impl JsonFileLedger {
    /// Load the ledger at `path`.
    ///
    /// A missing, unreadable or corrupt file yields an empty ledger.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let document = Self::load(&path).await;
        info!(
            path = %path.display(),
            entries = document.downloaded_ids.len(),
            "Ledger loaded"
        );
        Self {
            path,
            document: Mutex::new(document),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(path: &Path) -> LedgerDocument {
        let bytes = match tokio::fs::read(path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "No ledger yet, starting empty");
                return LedgerDocument::default();
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ledger unreadable, starting empty");
                return LedgerDocument::default();
            }
        };

        match serde_json::from_slice::<LedgerDocument>(&bytes) {
            Ok(document) => document,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Ledger corrupt, starting empty");
                LedgerDocument::default()
            }
        }
    }
}

#[async_trait]
impl IdempotencyLedger for JsonFileLedger {
    async fn has(&self, job_id: &str) -> bool {
        self.document.lock().await.downloaded_ids.contains_key(job_id)
    }

    async fn record(&self, job_id: &str, entry: LedgerEntry) -> Result<()> {
        let mut document = self.document.lock().await;

        // Commit in memory only once the file is on disk
        let mut next = document.clone();
        next.downloaded_ids
            .insert(job_id.to_string(), serde_json::to_value(&entry)?);
        let bytes = serde_json::to_vec_pretty(&next)?;
        write_atomic(&self.path, &bytes).await?;

        *document = next;
        debug!(job_id = %job_id, path = %self.path.display(), "Ledger persisted");
        Ok(())
    }

    async fn get(&self, job_id: &str) -> Option<LedgerEntry> {
        let document = self.document.lock().await;
        let value = document.downloaded_ids.get(job_id)?;
        serde_json::from_value(value.clone()).ok()
    }

    async fn len(&self) -> usize {
        self.document.lock().await.downloaded_ids.len()
    }
}
