// Job Domain Model

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Job ID (opaque, assigned by the entity store)
pub type JobId = String;

/// Maximum length of `error_message` accepted by the entity store
pub const ERROR_MESSAGE_MAX_CHARS: usize = 1000;

/// Job status as stored in the remote entity store.
///
/// `Processing` is the discovery filter value; the other four are written by
/// the orchestrator. Anything else the store reports is kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum JobStatus {
    Processing,
    Queued,
    Running,
    Completed,
    Failed,
    Other(String),
}

impl JobStatus {
    pub fn as_str(&self) -> &str {
        match self {
            JobStatus::Processing => "processing",
            JobStatus::Queued => "queued",
            JobStatus::Running => "running",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
            JobStatus::Other(s) => s,
        }
    }

    /// True for `completed` and `failed`
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl From<String> for JobStatus {
    fn from(s: String) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "processing" => JobStatus::Processing,
            "queued" => JobStatus::Queued,
            "running" => JobStatus::Running,
            "completed" => JobStatus::Completed,
            "failed" => JobStatus::Failed,
            _ => JobStatus::Other(s),
        }
    }
}

impl From<JobStatus> for String {
    fn from(status: JobStatus) -> Self {
        status.as_str().to_string()
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Job entity as returned by the entity store.
///
/// Only the fields the orchestrator reads or writes are modelled; unknown
/// fields are ignored on decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Job {
    #[serde(default)]
    pub id: JobId,
    #[serde(default = "default_status")]
    pub status: JobStatus,
    #[serde(default)]
    pub file_url: Option<String>,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub is_sample: Option<bool>,
    #[serde(default)]
    pub results_json_url: Option<String>,
    #[serde(default)]
    pub results_csv_url: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

fn default_status() -> JobStatus {
    JobStatus::Other(String::new())
}

impl Job {
    /// Create a job in `processing` state pointing at `file_url`
    pub fn new(id: impl Into<String>, file_url: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            status: JobStatus::Processing,
            file_url: Some(file_url.into()),
            filename: None,
            is_sample: None,
            results_json_url: None,
            results_csv_url: None,
            error_message: None,
        }
    }

    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    pub fn is_sample(&self) -> bool {
        self.is_sample.unwrap_or(false)
    }

    /// Trimmed file URL, `None` when missing or blank
    pub fn input_url(&self) -> Option<&str> {
        self.file_url
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
    }

    /// A job can only be worked on with a non-blank id and input URL
    pub fn is_actionable(&self) -> bool {
        !self.id.trim().is_empty() && self.input_url().is_some()
    }

    /// The id names a local directory and an object key segment, so it must
    /// stay a single path component
    pub fn has_path_safe_id(&self) -> bool {
        let id = self.id.as_str();
        !id.is_empty()
            && id != "."
            && !id.contains("..")
            && !id.contains(['/', '\\', '\0'])
    }
}

/// Decode an entity listing.
///
/// The store may answer with an array, a single object, or something else
/// entirely (treated as empty). Items that do not decode are skipped.
pub fn parse_listing(value: serde_json::Value) -> Vec<Job> {
    let items = match value {
        serde_json::Value::Array(items) => items,
        obj @ serde_json::Value::Object(_) => vec![obj],
        _ => Vec::new(),
    };

    items
        .into_iter()
        .filter_map(|item| match serde_json::from_value::<Job>(item) {
            Ok(job) => Some(job),
            Err(e) => {
                warn!(error = %e, "Skipping undecodable entity in listing");
                None
            }
        })
        .collect()
}

/// Client-side candidate selection: matching status, not a sample, capped at `limit`
pub fn select_candidates(jobs: Vec<Job>, status: &JobStatus, limit: usize) -> Vec<Job> {
    jobs.into_iter()
        .filter(|job| &job.status == status && !job.is_sample())
        .take(limit)
        .collect()
}

/// Partial update payload for `PUT /entities/{id}`.
///
/// Unset fields are omitted from the JSON body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<JobStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results_json_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results_csv_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl JobUpdate {
    /// Status-only update (advisory transitions)
    pub fn status(status: JobStatus) -> Self {
        Self {
            status: Some(status),
            ..Default::default()
        }
    }

    /// Terminal update after artifacts were published.
    ///
    /// `errors` are joined with `"; "` into `error_message` when non-empty.
    pub fn terminal(success: bool, json_url: String, csv_url: String, errors: &[String]) -> Self {
        let status = if success {
            JobStatus::Completed
        } else {
            JobStatus::Failed
        };
        let error_message = if errors.is_empty() {
            None
        } else {
            Some(truncate_error_message(&errors.join("; ")))
        };
        Self {
            status: Some(status),
            results_json_url: Some(json_url),
            results_csv_url: Some(csv_url),
            error_message,
        }
    }

    /// Terminal update after an orchestration fault
    pub fn fault(message: &str) -> Self {
        Self {
            status: Some(JobStatus::Failed),
            error_message: Some(truncate_error_message(message)),
            ..Default::default()
        }
    }
}

/// Truncate to [`ERROR_MESSAGE_MAX_CHARS`] characters (not bytes)
pub fn truncate_error_message(message: &str) -> String {
    message.chars().take(ERROR_MESSAGE_MAX_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_status_parse_is_case_insensitive() {
        assert_eq!(JobStatus::from("Processing".to_string()), JobStatus::Processing);
        assert_eq!(JobStatus::from(" FAILED ".to_string()), JobStatus::Failed);
        assert_eq!(
            JobStatus::from("archived".to_string()),
            JobStatus::Other("archived".to_string())
        );
    }

    #[test]
    fn test_parse_listing_accepts_array_object_and_garbage() {
        let array = json!([
            {"id": "a", "status": "processing", "file_url": "https://x/a"},
            {"id": "b", "status": "completed"}
        ]);
        assert_eq!(parse_listing(array).len(), 2);

        let single = json!({"id": "c", "status": "processing"});
        let jobs = parse_listing(single);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, "c");

        assert!(parse_listing(json!("nope")).is_empty());
        assert!(parse_listing(serde_json::Value::Null).is_empty());
    }

    #[test]
    fn test_parse_listing_skips_undecodable_items() {
        let listing = json!([
            {"id": 42, "status": "processing"},
            {"id": "ok", "status": "processing", "is_sample": null}
        ]);
        let jobs = parse_listing(listing);
        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].id, "ok");
    }

    #[test]
    fn test_select_candidates_filters_status_samples_and_limit() {
        let listing = json!([
            {"id": "1", "status": "processing", "file_url": "u1"},
            {"id": "2", "status": "PROCESSING", "file_url": "u2", "is_sample": true},
            {"id": "3", "status": "completed", "file_url": "u3"},
            {"id": "4", "status": "processing", "file_url": "u4"},
            {"id": "5", "status": "processing", "file_url": "u5"}
        ]);
        let jobs = select_candidates(parse_listing(listing), &JobStatus::Processing, 2);
        let ids: Vec<_> = jobs.iter().map(|j| j.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "4"]);
    }

    #[test]
    fn test_actionable_requires_id_and_url() {
        assert!(Job::new("J1", "https://x/in.txt").is_actionable());
        assert!(!Job::new("  ", "https://x/in.txt").is_actionable());
        assert!(!Job::new("J1", "   ").is_actionable());
    }

    #[test]
    fn test_path_safe_id_rejects_separators_and_traversal() {
        assert!(Job::new("J1", "u").has_path_safe_id());
        assert!(Job::new("run-2024.07_a", "u").has_path_safe_id());

        for id in ["a/b", "x/../../../tmp/evil", "a\\b", "..", ".", "a..b", "nul\0"] {
            assert!(!Job::new(id, "u").has_path_safe_id(), "{id:?} accepted");
        }
    }

    #[test]
    fn test_status_update_serializes_only_status() {
        let body = serde_json::to_value(JobUpdate::status(JobStatus::Queued)).unwrap();
        assert_eq!(body, json!({"status": "queued"}));
    }

    #[test]
    fn test_terminal_update_joins_and_truncates_errors() {
        let long = "x".repeat(1500);
        let update = JobUpdate::terminal(
            false,
            "j".to_string(),
            "c".to_string(),
            &["first".to_string(), long],
        );
        assert_eq!(update.status, Some(JobStatus::Failed));
        let msg = update.error_message.unwrap();
        assert!(msg.starts_with("first; x"));
        assert_eq!(msg.chars().count(), ERROR_MESSAGE_MAX_CHARS);
    }

    #[test]
    fn test_terminal_update_without_errors_has_no_message() {
        let update = JobUpdate::terminal(true, "j".to_string(), "c".to_string(), &[]);
        let body = serde_json::to_value(&update).unwrap();
        assert_eq!(
            body,
            json!({"status": "completed", "results_json_url": "j", "results_csv_url": "c"})
        );
    }

    #[test]
    fn test_truncate_counts_characters() {
        let msg = "é".repeat(1200);
        assert_eq!(truncate_error_message(&msg).chars().count(), 1000);
    }
}
