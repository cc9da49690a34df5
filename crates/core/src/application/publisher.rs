// Publisher - uploads artifacts and chooses the URL handed back to the store

use crate::config::StorageConfig;
use crate::error::Result;
use crate::port::ObjectStore;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

/// Uploads job artifacts under `<prefix>/outputs_<job_id>/<name>`.
///
/// URL selection:
/// - public target: default addressable URL
/// - private target with a non-zero expiry: signed URL
/// - private target without expiry: default URL, even if access is restricted
///
/// Upload failures are not retried here; they propagate to the caller.
pub struct Publisher {
    store: Arc<dyn ObjectStore>,
    config: StorageConfig,
}

impl Publisher {
    pub fn new(store: Arc<dyn ObjectStore>, config: StorageConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Deterministic object key for one artifact of a job
    pub fn artifact_key(&self, job_id: &str, artifact_name: &str) -> String {
        if self.config.prefix.is_empty() {
            format!("outputs_{}/{}", job_id, artifact_name)
        } else {
            format!("{}/outputs_{}/{}", self.config.prefix, job_id, artifact_name)
        }
    }

    /// Upload `local` under `key` and return the URL to report
    pub async fn publish(&self, local: &Path, key: &str) -> Result<String> {
        let bucket = self.config.bucket.as_str();
        self.store
            .upload(local, bucket, key, self.config.public)
            .await?;
        info!(bucket = %bucket, key = %key, "Artifact uploaded");

        if !self.config.public && self.config.presign_seconds > 0 {
            debug!(key = %key, expires_secs = self.config.presign_seconds, "Signing artifact URL");
            self.store
                .presigned_url(bucket, key, Duration::from_secs(self.config.presign_seconds))
                .await
        } else {
            self.store.object_url(bucket, key).await
        }
    }

    /// Upload the file at `local` as `<prefix>/outputs_<job_id>/<artifact_name>`
    pub async fn publish_artifact(
        &self,
        job_id: &str,
        artifact_name: &str,
        local: &Path,
    ) -> Result<String> {
        let key = self.artifact_key(job_id, artifact_name);
        self.publish(local, &key).await
    }
}
