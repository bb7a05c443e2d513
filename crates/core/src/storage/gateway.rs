//! Storage gateway: object store first, inline data URL when it is down.

use std::sync::Arc;

use bytes::Bytes;
use chrono::Utc;
use rand::Rng;
use tracing::{info, instrument, warn};

use super::client::ObjectStoreClient;
use super::config::BucketConfig;
use super::error::StorageError;
use super::inline::encode_data_url;
use super::provisioner::{BucketProvisioner, ProvisionOutcome};
use super::resolver::resolve_object_url;

/// Largest accepted image (5 MiB).
pub const MAX_IMAGE_BYTES: u64 = 5 * 1024 * 1024;

const DEFAULT_EXTENSION: &str = "jpg";

/// An uploaded image waiting to be stored.
#[derive(Debug, Clone)]
pub struct StoredAsset {
    /// Image bytes.
    pub bytes: Bytes,
    /// MIME type reported by the client.
    pub mime_type: String,
    /// Size reported by the client.
    pub size_bytes: u64,
    /// Original filename, used for its extension.
    pub filename: Option<String>,
}

impl StoredAsset {
    /// Asset whose size is the length of `bytes`.
    #[must_use]
    pub fn new(bytes: impl Into<Bytes>, mime_type: impl Into<String>) -> Self {
        let bytes = bytes.into();
        Self {
            size_bytes: bytes.len() as u64,
            bytes,
            mime_type: mime_type.into(),
            filename: None,
        }
    }

    /// Set the original filename.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }
}

/// Where an asset ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageKind {
    /// Written to the bucket.
    ObjectStore,
    /// Embedded in a data URL.
    Inline,
}

/// Outcome of [`StorageGateway::store`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadResult {
    /// Link to persist with the record.
    pub url: String,
    /// Which path produced the URL.
    pub storage_kind: StorageKind,
    /// Object name, object store path only.
    pub object_name: Option<String>,
    /// Bucket, object store path only.
    pub bucket: Option<String>,
    /// MIME type of the asset.
    pub mime_type: String,
    /// Size of the asset in bytes.
    pub size_bytes: u64,
}

/// Validates images, provisions the bucket and writes or inlines the bytes.
#[derive(Clone)]
pub struct StorageGateway {
    client: Arc<dyn ObjectStoreClient>,
    config: Arc<BucketConfig>,
    provisioner: BucketProvisioner,
}

impl StorageGateway {
    /// Create a gateway over `client`.
    #[must_use]
    pub fn new(client: Arc<dyn ObjectStoreClient>, config: Arc<BucketConfig>) -> Self {
        let provisioner = BucketProvisioner::new(client.clone(), config.clone());
        Self {
            client,
            config,
            provisioner,
        }
    }

    /// Bucket configuration in use.
    #[must_use]
    pub fn config(&self) -> &BucketConfig {
        &self.config
    }

    /// The provisioner sharing this gateway's client.
    #[must_use]
    pub fn provisioner(&self) -> &BucketProvisioner {
        &self.provisioner
    }

    /// Store an image.
    ///
    /// # Errors
    ///
    /// - Validation errors for a non-image, empty or oversized asset.
    /// - [`StorageError::Configuration`] for an unusable bucket name.
    /// - [`StorageError::Write`] if the object write fails after provisioning.
    #[instrument(skip(self, asset), fields(mime_type = %asset.mime_type, size = asset.size_bytes))]
    pub async fn store(&self, asset: StoredAsset) -> Result<UploadResult, StorageError> {
        validate(&asset)?;

        match self.provisioner.ensure().await {
            Ok(_) => {}
            Err(StorageError::Unavailable(reason)) => {
                warn!(%reason, "object store unavailable, storing image inline");
                return Ok(inline_result(&asset));
            }
            Err(e) => return Err(e),
        }

        let bucket = self.config.bucket()?;
        let object_name = object_name(asset.filename.as_deref());
        let size = asset.bytes.len() as u64;

        self.client
            .put_object(bucket, &object_name, asset.bytes, size, &asset.mime_type)
            .await
            .map_err(|e| StorageError::Write(e.to_string()))?;

        let url = resolve_object_url(&self.config, bucket, &object_name);
        info!(bucket, object = %object_name, "image stored");

        Ok(UploadResult {
            url,
            storage_kind: StorageKind::ObjectStore,
            object_name: Some(object_name),
            bucket: Some(bucket.to_string()),
            mime_type: asset.mime_type,
            size_bytes: size,
        })
    }

    /// Startup provisioning. Logs the outcome and never fails.
    pub async fn warm_up(&self) {
        match self.provisioner.ensure().await {
            Ok(ProvisionOutcome::AlreadyPresent) => info!("object store bucket ready"),
            Ok(outcome) => info!(?outcome, "object store bucket provisioned"),
            Err(e) => warn!(error = %e, "object store not ready, uploads will retry provisioning"),
        }
    }
}

fn validate(asset: &StoredAsset) -> Result<(), StorageError> {
    if !asset.mime_type.starts_with("image/") {
        return Err(StorageError::invalid_mime_type(&asset.mime_type));
    }
    if asset.bytes.is_empty() {
        return Err(StorageError::EmptyPayload);
    }
    let size = asset.size_bytes.max(asset.bytes.len() as u64);
    if size > MAX_IMAGE_BYTES {
        return Err(StorageError::file_too_large(size, MAX_IMAGE_BYTES));
    }
    Ok(())
}

fn inline_result(asset: &StoredAsset) -> UploadResult {
    UploadResult {
        url: encode_data_url(&asset.mime_type, &asset.bytes),
        storage_kind: StorageKind::Inline,
        object_name: None,
        bucket: None,
        mime_type: asset.mime_type.clone(),
        size_bytes: asset.bytes.len() as u64,
    }
}

/// `<unix-millis>-<random>.<ext>`
fn object_name(filename: Option<&str>) -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix: u32 = rand::rng().random_range(0..1_000_000_000);
    format!("{millis}-{suffix}.{}", extension(filename))
}

fn extension(filename: Option<&str>) -> String {
    filename
        .and_then(|name| name.rsplit_once('.'))
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .filter(|ext| !ext.is_empty() && ext.chars().all(|c| c.is_ascii_alphanumeric()))
        .unwrap_or_else(|| DEFAULT_EXTENSION.to_string())
}
