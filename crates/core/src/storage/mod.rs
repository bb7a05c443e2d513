//! Image storage on S3-compatible object stores.
//!
//! The [`StorageGateway`] validates an upload, makes sure the bucket exists
//! through the [`BucketProvisioner`], writes the object and mints a public URL.
//! When the store cannot be reached the image is embedded in a data URL instead.

mod client;
mod config;
mod error;
mod gateway;
pub mod inline;
mod memory;
mod policy;
mod provisioner;
mod resolver;
mod s3;

pub use client::ObjectStoreClient;
pub use config::BucketConfig;
pub use error::{ObjectStoreError, StorageError};
pub use gateway::{MAX_IMAGE_BYTES, StorageGateway, StorageKind, StoredAsset, UploadResult};
pub use memory::{CallCounts, MemoryObject, MemoryObjectStore};
pub use policy::AccessPolicy;
pub use provisioner::{BucketProvisioner, ProvisionOutcome};
pub use resolver::resolve_object_url;
pub use s3::S3ObjectStore;
