// Ledger Entry - "already handled" metadata per job

use super::JobStatus;
use serde::{Deserialize, Serialize};

/// Metadata recorded once a job reached a terminal state.
///
/// Serialized as `{filename, saved_to, ts}`; the outcome fields are only
/// present when known.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub filename: String,
    pub saved_to: String,
    /// Epoch seconds
    pub ts: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<JobStatus>,
    /// Set when the terminal status update could not be delivered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub report_error: Option<String>,
}

impl LedgerEntry {
    pub fn new(filename: impl Into<String>, saved_to: impl Into<String>, ts: i64) -> Self {
        Self {
            filename: filename.into(),
            saved_to: saved_to.into(),
            ts,
            outcome: None,
            report_error: None,
        }
    }

    pub fn with_outcome(mut self, outcome: JobStatus) -> Self {
        self.outcome = Some(outcome);
        self
    }

    pub fn with_report_error(mut self, error: impl Into<String>) -> Self {
        self.report_error = Some(error.into());
        self
    }

    /// True when the remote store may not reflect the local outcome
    pub fn needs_attention(&self) -> bool {
        self.report_error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_minimal_entry_matches_legacy_format() {
        let entry = LedgerEntry::new("in.txt", "/data/in.txt", 1700000000);
        assert_eq!(
            serde_json::to_value(&entry).unwrap(),
            json!({"filename": "in.txt", "saved_to": "/data/in.txt", "ts": 1700000000})
        );
    }

    #[test]
    fn test_legacy_entry_decodes() {
        let entry: LedgerEntry =
            serde_json::from_value(json!({"filename": "a", "saved_to": "b", "ts": 1})).unwrap();
        assert!(entry.outcome.is_none());
        assert!(!entry.needs_attention());
    }
}
