// jobrelay Infrastructure - Object Storage
// Implements: ObjectStore

pub mod s3_store;

pub use s3_store::{virtual_hosted_url, S3ObjectStore};
