// Object Store Port (Interface)

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

/// S3-compatible object storage
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload `local` to `(bucket, key)`.
    ///
    /// `public` allows the implementation to fall back to a public-read ACL
    /// when a plain upload is refused.
    async fn upload(&self, local: &Path, bucket: &str, key: &str, public: bool) -> Result<()>;

    /// Default addressable URL of the object
    async fn object_url(&self, bucket: &str, key: &str) -> Result<String>;

    /// Time-bounded signed GET URL
    async fn presigned_url(&self, bucket: &str, key: &str, expires_in: Duration)
        -> Result<String>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Recorded upload
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct UploadRecord {
        pub local: PathBuf,
        pub bucket: String,
        pub key: String,
        pub public: bool,
    }

    /// Object store that records uploads and fabricates URLs
    #[derive(Default)]
    pub struct MockObjectStore {
        uploads: Mutex<Vec<UploadRecord>>,
        failing_keys: Mutex<Vec<String>>,
    }

    impl MockObjectStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Fail uploads whose key contains `fragment`
        pub fn fail_keys_containing(&self, fragment: impl Into<String>) {
            self.failing_keys.lock().unwrap().push(fragment.into());
        }

        pub fn uploads(&self) -> Vec<UploadRecord> {
            self.uploads.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl ObjectStore for MockObjectStore {
        async fn upload(&self, local: &Path, bucket: &str, key: &str, public: bool) -> Result<()> {
            let fails = self
                .failing_keys
                .lock()
                .unwrap()
                .iter()
                .any(|fragment| key.contains(fragment.as_str()));
            if fails {
                return Err(AppError::Publish(format!("mock upload failure for {}", key)));
            }
            self.uploads.lock().unwrap().push(UploadRecord {
                local: local.to_path_buf(),
                bucket: bucket.to_string(),
                key: key.to_string(),
                public,
            });
            Ok(())
        }

        async fn object_url(&self, bucket: &str, key: &str) -> Result<String> {
            Ok(format!("https://{}.s3.mock-region-1.amazonaws.com/{}", bucket, key))
        }

        async fn presigned_url(
            &self,
            bucket: &str,
            key: &str,
            expires_in: Duration,
        ) -> Result<String> {
            Ok(format!(
                "https://{}.s3.mock-region-1.amazonaws.com/{}?X-Amz-Expires={}&X-Amz-Signature=mock",
                bucket,
                key,
                expires_in.as_secs()
            ))
        }
    }
}
