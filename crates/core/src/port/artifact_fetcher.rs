// Artifact Fetcher Port (Interface)

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;

/// Downloads a job's input to local storage.
///
/// Implementations must write through a temporary file in the destination's
/// directory and rename it into place only once the whole body is on disk:
/// `destination` either holds a complete file or does not exist.
#[async_trait]
pub trait ArtifactFetcher: Send + Sync {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<()>;
}

/// Temporary path used while `destination` is being written (`<name>.part`)
pub fn partial_path(destination: &Path) -> std::path::PathBuf {
    let mut name = destination
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    destination.with_file_name(name)
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::AppError;
    use std::path::PathBuf;
    use std::sync::Mutex;

    /// Fetcher that writes canned bytes, or fails for selected URLs
    pub struct MockFetcher {
        body: Vec<u8>,
        failing_urls: Mutex<Vec<String>>,
        calls: Mutex<Vec<(String, PathBuf)>>,
    }

    impl MockFetcher {
        pub fn serving(body: impl Into<Vec<u8>>) -> Self {
            Self {
                body: body.into(),
                failing_urls: Mutex::new(Vec::new()),
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn fail_url(&self, url: impl Into<String>) {
            self.failing_urls.lock().unwrap().push(url.into());
        }

        pub fn calls(&self) -> Vec<(String, PathBuf)> {
            self.calls.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ArtifactFetcher for MockFetcher {
        async fn fetch(&self, url: &str, destination: &Path) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push((url.to_string(), destination.to_path_buf()));

            let fails = self.failing_urls.lock().unwrap().iter().any(|u| u == url);
            if fails {
                return Err(AppError::Network(format!("mock fetch failure for {}", url)));
            }

            if let Some(parent) = destination.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            let part = partial_path(destination);
            tokio::fs::write(&part, &self.body).await?;
            tokio::fs::rename(&part, destination).await?;
            Ok(())
        }
    }
}
