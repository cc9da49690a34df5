// RemoteStore decorator applying the shared retry policy

use crate::application::retry::RetryPolicy;
use crate::domain::{Job, JobStatus, JobUpdate};
use crate::error::Result;
use crate::port::RemoteStore;
use async_trait::async_trait;
use std::sync::Arc;

/// Wraps any RemoteStore so every call goes through [`RetryPolicy::run`]
pub struct RetryingRemoteStore {
    inner: Arc<dyn RemoteStore>,
    policy: RetryPolicy,
}

impl RetryingRemoteStore {
    pub fn new(inner: Arc<dyn RemoteStore>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }
}

#[async_trait]
impl RemoteStore for RetryingRemoteStore {
    async fn list_candidates(&self, status: &JobStatus, limit: usize) -> Result<Vec<Job>> {
        let inner = self.inner.as_ref();
        self.policy
            .run("list_candidates", move || inner.list_candidates(status, limit))
            .await
    }

    async fn get_job(&self, id: &str) -> Result<Job> {
        let inner = self.inner.as_ref();
        self.policy.run("get_job", move || inner.get_job(id)).await
    }

    async fn update_job(&self, id: &str, update: &JobUpdate) -> Result<Job> {
        let inner = self.inner.as_ref();
        self.policy
            .run("update_job", move || inner.update_job(id, update))
            .await
    }
}
