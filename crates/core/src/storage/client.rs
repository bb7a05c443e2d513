//! Object store client abstraction.

use async_trait::async_trait;
use bytes::Bytes;

use super::error::ObjectStoreError;

/// The four S3 calls the gateway needs.
///
/// Implemented by [`super::S3ObjectStore`] for real endpoints and by
/// [`super::MemoryObjectStore`] for development and tests.
#[async_trait]
pub trait ObjectStoreClient: Send + Sync {
    /// `HEAD` the bucket. `Ok(false)` only when the store says it is absent.
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, ObjectStoreError>;

    /// Create the bucket in `region`.
    ///
    /// Returns [`ObjectStoreError::BucketAlreadyExists`] when the name is taken.
    async fn make_bucket(&self, bucket: &str, region: &str) -> Result<(), ObjectStoreError>;

    /// Replace the bucket policy with a JSON policy document.
    async fn set_bucket_policy(&self, bucket: &str, policy: &str) -> Result<(), ObjectStoreError>;

    /// Write a whole object in one request.
    async fn put_object(
        &self,
        bucket: &str,
        object: &str,
        data: Bytes,
        size: u64,
        content_type: &str,
    ) -> Result<(), ObjectStoreError>;
}
