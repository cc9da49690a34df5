// S3 object store adapter

use async_trait::async_trait;
use aws_config::{BehaviorVersion, SdkConfig};
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::{DisplayErrorContext, ProvideErrorMetadata};
use aws_sdk_s3::presigning::PresigningConfig;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ObjectCannedAcl;
use aws_sdk_s3::Client;
use jobrelay_core::error::{AppError, Result};
use jobrelay_core::port::ObjectStore;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

const FALLBACK_REGION: &str = "us-east-1";

/// Error codes meaning ACLs cannot be used on the bucket at all
const ACL_REFUSED_CODES: &[&str] = &["AccessControlListNotSupported", "InvalidRequest"];

/// `https://<bucket>.s3.<region>.amazonaws.com/<key>`
pub fn virtual_hosted_url(bucket: &str, region: &str, key: &str) -> String {
    format!("https://{}.s3.{}.amazonaws.com/{}", bucket, region, key)
}

/// Region from a `GetBucketLocation` answer; empty means `us-east-1`
fn region_from_location(constraint: Option<&str>) -> String {
    match constraint.map(str::trim) {
        None | Some("") => FALLBACK_REGION.to_string(),
        Some("EU") => "eu-west-1".to_string(),
        Some(region) => region.to_string(),
    }
}

/// Whether a failed plain upload may be retried with a public-read ACL
fn should_retry_with_acl(public: bool, error_code: Option<&str>) -> bool {
    public && !error_code.is_some_and(|code| ACL_REFUSED_CODES.contains(&code))
}

/// Object storage on S3, credentials from the default AWS provider chain.
///
/// Bucket regions are looked up once and cached; signing uses a client bound
/// to the bucket's region.
pub struct S3ObjectStore {
    sdk_config: SdkConfig,
    client: Client,
    regions: Mutex<HashMap<String, String>>,
}

impl S3ObjectStore {
    pub async fn from_env() -> Self {
        let sdk_config = aws_config::load_defaults(BehaviorVersion::latest()).await;
        Self::new(sdk_config)
    }

    pub fn new(sdk_config: SdkConfig) -> Self {
        Self {
            client: Client::new(&sdk_config),
            sdk_config,
            regions: Mutex::new(HashMap::new()),
        }
    }

    fn configured_region(&self) -> String {
        self.sdk_config
            .region()
            .map(|r| r.as_ref().to_string())
            .unwrap_or_else(|| FALLBACK_REGION.to_string())
    }

    /// Bucket region: GetBucketLocation, else the configured region, else `us-east-1`
    async fn bucket_region(&self, bucket: &str) -> String {
        if let Some(region) = self.regions.lock().await.get(bucket) {
            return region.clone();
        }

        let region = match self.client.get_bucket_location().bucket(bucket).send().await {
            Ok(output) => region_from_location(
                output.location_constraint().map(|c| c.as_str()),
            ),
            Err(e) => {
                let fallback = self.configured_region();
                warn!(
                    bucket = %bucket,
                    fallback = %fallback,
                    error = %DisplayErrorContext(&e),
                    "Could not determine bucket region"
                );
                fallback
            }
        };

        debug!(bucket = %bucket, region = %region, "Bucket region resolved");
        self.regions
            .lock()
            .await
            .insert(bucket.to_string(), region.clone());
        region
    }

    fn regional_client(&self, region: &str) -> Client {
        let config = aws_sdk_s3::config::Builder::from(&self.sdk_config)
            .region(Region::new(region.to_string()))
            .build();
        Client::from_conf(config)
    }

    async fn body(local: &Path) -> Result<ByteStream> {
        ByteStream::from_path(local)
            .await
            .map_err(|e| AppError::Publish(format!("{}: {}", local.display(), e)))
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn upload(&self, local: &Path, bucket: &str, key: &str, public: bool) -> Result<()> {
        let first = self
            .client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(Self::body(local).await?)
            .send()
            .await;

        let err = match first {
            Ok(_) => {
                info!(bucket = %bucket, key = %key, "Uploaded");
                return Ok(());
            }
            Err(err) => err,
        };

        if !should_retry_with_acl(public, err.code()) {
            return Err(AppError::Publish(format!(
                "upload s3://{}/{}: {}",
                bucket,
                key,
                DisplayErrorContext(&err)
            )));
        }

        warn!(
            bucket = %bucket,
            key = %key,
            error = %DisplayErrorContext(&err),
            "Plain upload refused, retrying with public-read ACL"
        );
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .acl(ObjectCannedAcl::PublicRead)
            .body(Self::body(local).await?)
            .send()
            .await
            .map_err(|e| {
                AppError::Publish(format!(
                    "upload s3://{}/{} with ACL: {}",
                    bucket,
                    key,
                    DisplayErrorContext(&e)
                ))
            })?;
        info!(bucket = %bucket, key = %key, "Uploaded with public-read ACL");
        Ok(())
    }

    async fn object_url(&self, bucket: &str, key: &str) -> Result<String> {
        let region = self.bucket_region(bucket).await;
        Ok(virtual_hosted_url(bucket, &region, key))
    }

    async fn presigned_url(
        &self,
        bucket: &str,
        key: &str,
        expires_in: Duration,
    ) -> Result<String> {
        let region = self.bucket_region(bucket).await;
        let presigning = PresigningConfig::expires_in(expires_in)
            .map_err(|e| AppError::Publish(format!("presign config: {}", e)))?;

        let request = self
            .regional_client(&region)
            .get_object()
            .bucket(bucket)
            .key(key)
            .presigned(presigning)
            .await
            .map_err(|e| {
                AppError::Publish(format!(
                    "presign s3://{}/{}: {}",
                    bucket,
                    key,
                    DisplayErrorContext(&e)
                ))
            })?;
        Ok(request.uri().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_hosted_url() {
        assert_eq!(
            virtual_hosted_url("my-bucket", "eu-central-1", "results/outputs_J1/results_J1.json"),
            "https://my-bucket.s3.eu-central-1.amazonaws.com/results/outputs_J1/results_J1.json"
        );
    }

    #[test]
    fn test_region_from_location() {
        assert_eq!(region_from_location(None), "us-east-1");
        assert_eq!(region_from_location(Some("")), "us-east-1");
        assert_eq!(region_from_location(Some("EU")), "eu-west-1");
        assert_eq!(region_from_location(Some("ap-south-1")), "ap-south-1");
    }

    #[test]
    fn test_acl_fallback_decision() {
        assert!(should_retry_with_acl(true, Some("AccessDenied")));
        assert!(should_retry_with_acl(true, None));
        assert!(!should_retry_with_acl(true, Some("AccessControlListNotSupported")));
        assert!(!should_retry_with_acl(true, Some("InvalidRequest")));
        assert!(!should_retry_with_acl(false, Some("AccessDenied")));
    }

    #[tokio::test]
    async fn test_region_cache_is_used() {
        let config = SdkConfig::builder()
            .region(Region::new("eu-west-2"))
            .behavior_version(BehaviorVersion::latest())
            .build();
        let store = S3ObjectStore::new(config);
        store
            .regions
            .lock()
            .await
            .insert("cached-bucket".to_string(), "sa-east-1".to_string());

        let url = store.object_url("cached-bucket", "k/a.csv").await.unwrap();
        assert_eq!(url, "https://cached-bucket.s3.sa-east-1.amazonaws.com/k/a.csv");
        assert_eq!(store.configured_region(), "eu-west-2");
    }
}
