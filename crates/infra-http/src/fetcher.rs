// Streaming input download with atomic placement

use crate::client::{check_status, map_reqwest_error, API_KEY_HEADER, FETCH_TIMEOUT};
use async_trait::async_trait;
use futures::StreamExt;
use jobrelay_core::application::RetryPolicy;
use jobrelay_core::error::{AppError, Result};
use jobrelay_core::port::{partial_path, ArtifactFetcher};
use std::path::Path;
use tokio::fs::{self, File};
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{info, warn};

const CHUNK_BUFFER_BYTES: usize = 1024 * 1024;

/// Downloads into `<dest>.part` and renames once the body is complete.
///
/// Establishing the response (connect + status) goes through the retry
/// policy; a body that breaks mid-stream fails the fetch and leaves the
/// `.part` file behind. The credential header is only attached for URLs
/// under the entity store's base URL.
pub struct HttpArtifactFetcher {
    client: reqwest::Client,
    retry: RetryPolicy,
    api_base: String,
    api_key: String,
}

impl HttpArtifactFetcher {
    pub fn new(
        client: reqwest::Client,
        retry: RetryPolicy,
        api_base: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            retry,
            api_base: api_base.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
        }
    }

    fn sends_credential(&self, url: &str) -> bool {
        !self.api_base.is_empty()
            && url
                .strip_prefix(&self.api_base)
                .is_some_and(|rest| rest.is_empty() || rest.starts_with('/') || rest.starts_with('?'))
    }

    async fn open(&self, url: &str) -> Result<reqwest::Response> {
        let mut request = self.client.get(url).timeout(FETCH_TIMEOUT);
        if self.sends_credential(url) {
            request = request.header(API_KEY_HEADER, &self.api_key);
        }
        let response = request.send().await.map_err(map_reqwest_error)?;
        check_status(response).await
    }

    async fn stream_to(&self, response: reqwest::Response, part: &Path) -> Result<u64> {
        let file = File::create(part).await?;
        let mut writer = BufWriter::with_capacity(CHUNK_BUFFER_BYTES, file);
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| AppError::Network(format!("body interrupted: {}", e)))?;
            writer.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }

        writer.flush().await?;
        writer.get_ref().sync_all().await?;
        Ok(written)
    }
}

#[async_trait]
impl ArtifactFetcher for HttpArtifactFetcher {
    async fn fetch(&self, url: &str, destination: &Path) -> Result<()> {
        if let Some(dir) = destination.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir).await?;
        }

        let response = self.retry.run("fetch", move || self.open(url)).await?;

        let part = partial_path(destination);
        let written = match self.stream_to(response, &part).await {
            Ok(written) => written,
            Err(e) => {
                warn!(
                    url = %url,
                    partial = %part.display(),
                    error = %e,
                    "Download interrupted; partial file left in place"
                );
                return Err(e);
            }
        };

        fs::rename(&part, destination).await?;
        info!(
            url = %url,
            destination = %destination.display(),
            bytes = written,
            "Download complete"
        );
        Ok(())
    }
}
