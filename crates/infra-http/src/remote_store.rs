// Entity store client over HTTP/JSON
//
// GET {api_base}/apps/{app}/entities/{entity}       -> listing
// GET {api_base}/apps/{app}/entities/{entity}/{id}  -> one job
// PUT {api_base}/apps/{app}/entities/{entity}/{id}  -> partial update
//
// Single attempt per call; wrap in RetryingRemoteStore for the retry policy.

use crate::client::{
    check_status, map_reqwest_error, API_KEY_HEADER, GET_TIMEOUT, LIST_TIMEOUT, UPDATE_TIMEOUT,
};
use async_trait::async_trait;
use jobrelay_core::config::StoreConfig;
use jobrelay_core::domain::{parse_listing, select_candidates, Job, JobStatus, JobUpdate};
use jobrelay_core::error::Result;
use jobrelay_core::port::RemoteStore;
use tracing::debug;

pub struct HttpRemoteStore {
    client: reqwest::Client,
    config: StoreConfig,
}

impl HttpRemoteStore {
    pub fn new(client: reqwest::Client, config: StoreConfig) -> Self {
        Self { client, config }
    }

    fn entity_url(&self, id: &str) -> String {
        format!("{}/{}", self.config.entities_url(), id)
    }

    async fn send_json(&self, request: reqwest::RequestBuilder) -> Result<serde_json::Value> {
        let response = request
            .header(API_KEY_HEADER, &self.config.api_key)
            .send()
            .await
            .map_err(map_reqwest_error)?;
        let response = check_status(response).await?;
        response
            .json::<serde_json::Value>()
            .await
            .map_err(map_reqwest_error)
    }
}

#[async_trait]
impl RemoteStore for HttpRemoteStore {
    async fn list_candidates(&self, status: &JobStatus, limit: usize) -> Result<Vec<Job>> {
        let url = self.config.entities_url();
        let listing = self
            .send_json(self.client.get(&url).timeout(LIST_TIMEOUT))
            .await?;

        let jobs = parse_listing(listing);
        let total = jobs.len();
        let candidates = select_candidates(jobs, status, limit);
        debug!(
            url = %url,
            total = total,
            candidates = candidates.len(),
            "Listing fetched"
        );
        Ok(candidates)
    }

    async fn get_job(&self, id: &str) -> Result<Job> {
        let value = self
            .send_json(self.client.get(self.entity_url(id)).timeout(GET_TIMEOUT))
            .await?;
        Ok(serde_json::from_value(value)?)
    }

    async fn update_job(&self, id: &str, update: &JobUpdate) -> Result<Job> {
        let value = self
            .send_json(
                self.client
                    .put(self.entity_url(id))
                    .timeout(UPDATE_TIMEOUT)
                    .json(update),
            )
            .await?;
        debug!(job_id = %id, "Entity updated");
        Ok(serde_json::from_value(value)?)
    }
}
