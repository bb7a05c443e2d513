//! Idempotent bucket provisioning.

use std::sync::Arc;

use tracing::{debug, info, warn};

use super::client::ObjectStoreClient;
use super::config::BucketConfig;
use super::error::{ObjectStoreError, StorageError};
use super::policy::AccessPolicy;

/// What `ensure` found or did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProvisionOutcome {
    /// Bucket was already there.
    AlreadyPresent,
    /// Bucket was created by this call.
    Created {
        /// Whether the anonymous-read policy was attached.
        policy_attached: bool,
    },
    /// Another caller created the bucket between our check and create.
    CreatedConcurrently,
}

/// Makes sure the image bucket exists and is publicly readable.
#[derive(Clone)]
pub struct BucketProvisioner {
    client: Arc<dyn ObjectStoreClient>,
    config: Arc<BucketConfig>,
}

impl BucketProvisioner {
    /// Create a provisioner.
    #[must_use]
    pub fn new(client: Arc<dyn ObjectStoreClient>, config: Arc<BucketConfig>) -> Self {
        Self { client, config }
    }

    /// Ensure the bucket exists. Safe to call repeatedly and concurrently.
    ///
    /// # Errors
    ///
    /// - [`StorageError::Configuration`] if the bucket name is unusable.
    /// - [`StorageError::Unavailable`] if the store cannot be reached or
    ///   refuses to create the bucket.
    pub async fn ensure(&self) -> Result<ProvisionOutcome, StorageError> {
        let bucket = self.config.bucket()?;

        let exists = self
            .client
            .bucket_exists(bucket)
            .await
            .map_err(|e| StorageError::unavailable(e.to_string()))?;
        if exists {
            debug!(bucket, "bucket already present");
            return Ok(ProvisionOutcome::AlreadyPresent);
        }

        match self.client.make_bucket(bucket, &self.config.region).await {
            Ok(()) => {}
            Err(ObjectStoreError::BucketAlreadyExists(_)) => {
                debug!(bucket, "bucket created concurrently");
                return Ok(ProvisionOutcome::CreatedConcurrently);
            }
            Err(e) => return Err(StorageError::unavailable(e.to_string())),
        }
        info!(bucket, region = %self.config.region, "bucket created");

        let policy_attached = match self.attach_policy(bucket).await {
            Ok(()) => true,
            Err(e) => {
                warn!(bucket, error = %e, "bucket created without public-read policy");
                false
            }
        };

        Ok(ProvisionOutcome::Created { policy_attached })
    }

    /// Reapply the anonymous-read policy to an existing bucket.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Configuration`] for an unusable bucket name and
    /// [`StorageError::PolicyAttachment`] if the store refuses the policy.
    pub async fn apply_policy(&self) -> Result<(), StorageError> {
        let bucket = self.config.bucket()?;
        self.attach_policy(bucket).await?;
        info!(bucket, "public-read policy applied");
        Ok(())
    }

    async fn attach_policy(&self, bucket: &str) -> Result<(), StorageError> {
        let document = AccessPolicy::anonymous_read(bucket)
            .to_json()
            .map_err(|e| StorageError::PolicyAttachment(e.to_string()))?;

        self.client
            .set_bucket_policy(bucket, &document)
            .await
            .map_err(|e| StorageError::PolicyAttachment(e.to_string()))
    }
}
