//! S3-compatible object store client (MinIO, AWS S3, R2).

use std::time::Duration;

use async_trait::async_trait;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::retry::RetryConfig;
use aws_sdk_s3::config::timeout::TimeoutConfig;
use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use bytes::Bytes;
use tracing::{debug, instrument};

use super::client::ObjectStoreClient;
use super::config::BucketConfig;
use super::error::ObjectStoreError;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(3);
const MAX_ATTEMPTS: u32 = 2;
const CREDENTIALS_PROVIDER: &str = "folio-static";

/// [`ObjectStoreClient`] backed by the AWS SDK with path-style addressing.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    /// Build a client for the configured endpoint.
    ///
    /// Does not touch the network.
    #[must_use]
    pub fn new(config: &BucketConfig) -> Self {
        let credentials = Credentials::new(
            config.access_key.clone(),
            config.secret_key.clone(),
            None,
            None,
            CREDENTIALS_PROVIDER,
        );

        let timeouts = TimeoutConfig::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .operation_timeout(config.operation_timeout)
            .build();

        let s3_config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(config.endpoint_url())
            .region(Region::new(config.region.clone()))
            .credentials_provider(credentials)
            .force_path_style(true)
            .timeout_config(timeouts)
            .retry_config(RetryConfig::standard().with_max_attempts(MAX_ATTEMPTS))
            .build();

        Self {
            client: Client::from_conf(s3_config),
        }
    }
}

/// Service errors become `Rejected`; transport, timeout and
/// credential-resolution failures become `Unavailable`.
fn classify<E, R>(err: &SdkError<E, R>) -> ObjectStoreError
where
    E: std::error::Error + 'static,
    R: std::fmt::Debug,
{
    let detail = DisplayErrorContext(err).to_string();
    match err {
        SdkError::ServiceError(_) => ObjectStoreError::Rejected(detail),
        _ => ObjectStoreError::Unavailable(detail),
    }
}

#[async_trait]
impl ObjectStoreClient for S3ObjectStore {
    #[instrument(skip(self))]
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, ObjectStoreError> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) => {
                let not_found = err.as_service_error().is_some_and(|e| e.is_not_found())
                    || err
                        .raw_response()
                        .is_some_and(|r| r.status().as_u16() == 404);
                if not_found {
                    debug!("bucket not found");
                    return Ok(false);
                }
                // HEAD carries no body, so a 403 or 5xx is as good as unreachable
                Err(ObjectStoreError::Unavailable(
                    DisplayErrorContext(&err).to_string(),
                ))
            }
        }
    }

    #[instrument(skip(self))]
    async fn make_bucket(&self, bucket: &str, region: &str) -> Result<(), ObjectStoreError> {
        let mut request = self.client.create_bucket().bucket(bucket);
        if region != BucketConfig::DEFAULT_REGION {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }

        match request.send().await {
            Ok(_) => Ok(()),
            Err(err) => {
                let taken = err.as_service_error().is_some_and(|e| {
                    e.is_bucket_already_owned_by_you() || e.is_bucket_already_exists()
                });
                if taken {
                    return Err(ObjectStoreError::BucketAlreadyExists(bucket.to_string()));
                }
                Err(classify(&err))
            }
        }
    }

    #[instrument(skip(self, policy))]
    async fn set_bucket_policy(&self, bucket: &str, policy: &str) -> Result<(), ObjectStoreError> {
        self.client
            .put_bucket_policy()
            .bucket(bucket)
            .policy(policy)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| classify(&e))
    }

    #[instrument(skip(self, data))]
    async fn put_object(
        &self,
        bucket: &str,
        object: &str,
        data: Bytes,
        size: u64,
        content_type: &str,
    ) -> Result<(), ObjectStoreError> {
        let content_length = i64::try_from(size)
            .map_err(|_| ObjectStoreError::Rejected(format!("object too large: {size} bytes")))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(object)
            .body(ByteStream::from(data))
            .content_length(content_length)
            .content_type(content_type)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| classify(&e))
    }
}
