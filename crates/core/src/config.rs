// Poller Configuration
// Built once by the composition root and passed down to components.

use crate::error::{AppError, Result};
use std::path::PathBuf;
use std::time::Duration;

/// Value shipped in sample configs; treated as "no key configured"
pub const API_KEY_PLACEHOLDER: &str = "REPLACE_WITH_YOUR_API_KEY";

pub const DEFAULT_API_BASE: &str = "https://app.base44.com/api";
pub const DEFAULT_ENTITY: &str = "AnalysisJob";
pub const DEFAULT_CANDIDATE_LIMIT: usize = 100;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

/// Remote entity store settings
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub api_base: String,
    pub app_id: String,
    pub entity: String,
    pub api_key: String,
}

impl StoreConfig {
    /// `{api_base}/apps/{app_id}/entities/{entity}`
    pub fn entities_url(&self) -> String {
        format!(
            "{}/apps/{}/entities/{}",
            self.api_base.trim_end_matches('/'),
            self.app_id,
            self.entity
        )
    }
}

/// Object storage settings
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub bucket: String,
    /// Key prefix without leading/trailing slashes
    pub prefix: String,
    pub public: bool,
    /// Signed URL lifetime for private buckets; zero disables signing
    pub presign_seconds: u64,
}

impl StorageConfig {
    pub fn new(bucket: impl Into<String>, prefix: &str, public: bool, presign_seconds: u64) -> Self {
        Self {
            bucket: bucket.into(),
            prefix: prefix.trim_matches('/').to_string(),
            public,
            presign_seconds,
        }
    }
}

/// Shared retry/backoff settings for outbound network calls
#[derive(Debug, Clone)]
pub struct RetrySettings {
    pub max_attempts: u32,
    /// Backoff time unit: attempt `n` waits `2^n + jitter` units
    pub unit: Duration,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            unit: Duration::from_secs(1),
        }
    }
}

/// External computation selection
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PipelineConfig {
    /// Built-in per-line statistics
    LineStats,
    /// External program invoked as `<program> <args..> <input_path> <job_id>`
    Command {
        program: String,
        args: Vec<String>,
        timeout: Option<Duration>,
    },
}

/// Complete poller configuration
#[derive(Debug, Clone)]
pub struct PollerConfig {
    pub store: StoreConfig,
    pub storage: StorageConfig,
    pub input_dir: PathBuf,
    pub ledger_path: PathBuf,
    pub candidate_limit: usize,
    pub update_to_queued: bool,
    pub retry: RetrySettings,
    pub pipeline: PipelineConfig,
}

impl PollerConfig {
    /// Reject configurations that must not reach any network activity
    pub fn validate(&self) -> Result<()> {
        let key = self.store.api_key.trim();
        if key.is_empty() || key.contains(API_KEY_PLACEHOLDER) {
            return Err(AppError::Config(
                "API key is not set (use --api-key or JOBRELAY_API_KEY)".to_string(),
            ));
        }
        if self.store.api_base.trim().is_empty() {
            return Err(AppError::Config("API base URL is empty".to_string()));
        }
        if self.store.app_id.trim().is_empty() {
            return Err(AppError::Config("App id is empty".to_string()));
        }
        if self.store.entity.trim().is_empty() {
            return Err(AppError::Config("Entity name is empty".to_string()));
        }
        if self.storage.bucket.trim().is_empty() {
            return Err(AppError::Config("S3 bucket is empty".to_string()));
        }
        if self.retry.max_attempts == 0 {
            return Err(AppError::Config("max_attempts must be at least 1".to_string()));
        }
        if self.candidate_limit == 0 {
            return Err(AppError::Config("candidate_limit must be at least 1".to_string()));
        }
        if let PipelineConfig::Command { program, .. } = &self.pipeline {
            if program.trim().is_empty() {
                return Err(AppError::Config(
                    "command pipeline requires a program".to_string(),
                ));
            }
        }
        Ok(())
    }
}

/// Per-job output directory: `<input_dir>/outputs_<job_id>`
pub fn output_dir(input_dir: &std::path::Path, job_id: &str) -> PathBuf {
    input_dir.join(format!("outputs_{}", job_id))
}
