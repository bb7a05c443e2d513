//! In-process object store for development and tests.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use super::client::ObjectStoreClient;
use super::error::ObjectStoreError;

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryObject {
    /// Object bytes.
    pub data: Bytes,
    /// Content type given on write.
    pub content_type: String,
}

#[derive(Debug, Default)]
struct MemoryBucket {
    region: String,
    policy: Option<String>,
}

/// Per-operation call counts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallCounts {
    /// `bucket_exists` calls.
    pub bucket_exists: usize,
    /// `make_bucket` calls.
    pub make_bucket: usize,
    /// `set_bucket_policy` calls.
    pub set_bucket_policy: usize,
    /// `put_object` calls.
    pub put_object: usize,
}

#[derive(Debug, Default)]
struct Counters {
    bucket_exists: AtomicUsize,
    make_bucket: AtomicUsize,
    set_bucket_policy: AtomicUsize,
    put_object: AtomicUsize,
}

/// [`ObjectStoreClient`] keeping buckets and objects in memory.
///
/// Faults can be switched on to exercise the degraded paths: an unreachable
/// store fails every call, a policy or write rejection fails only that call.
/// Hidden buckets report as missing to `bucket_exists` while still occupying
/// their name, the view a caller gets when someone else creates the bucket
/// between its check and its create.
#[derive(Debug, Default)]
pub struct MemoryObjectStore {
    buckets: DashMap<String, MemoryBucket>,
    objects: DashMap<(String, String), MemoryObject>,
    unreachable: AtomicBool,
    reject_policy: AtomicBool,
    reject_writes: AtomicBool,
    hide_buckets: AtomicBool,
    calls: Counters,
}

impl MemoryObjectStore {
    /// Empty store, reachable, no faults.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store with `bucket` already present.
    #[must_use]
    pub fn with_bucket(bucket: &str) -> Self {
        let store = Self::new();
        store.buckets.insert(
            bucket.to_string(),
            MemoryBucket {
                region: "us-east-1".to_string(),
                policy: None,
            },
        );
        store
    }

    /// Make every call fail as unavailable.
    pub fn set_unreachable(&self, value: bool) {
        self.unreachable.store(value, Ordering::SeqCst);
    }

    /// Make `set_bucket_policy` fail.
    pub fn set_reject_policy(&self, value: bool) {
        self.reject_policy.store(value, Ordering::SeqCst);
    }

    /// Make `put_object` fail.
    pub fn set_reject_writes(&self, value: bool) {
        self.reject_writes.store(value, Ordering::SeqCst);
    }

    /// Make `bucket_exists` report `false` for buckets that exist.
    pub fn set_hide_buckets(&self, value: bool) {
        self.hide_buckets.store(value, Ordering::SeqCst);
    }

    /// Snapshot of call counts.
    #[must_use]
    pub fn calls(&self) -> CallCounts {
        CallCounts {
            bucket_exists: self.calls.bucket_exists.load(Ordering::SeqCst),
            make_bucket: self.calls.make_bucket.load(Ordering::SeqCst),
            set_bucket_policy: self.calls.set_bucket_policy.load(Ordering::SeqCst),
            put_object: self.calls.put_object.load(Ordering::SeqCst),
        }
    }

    /// Number of buckets.
    #[must_use]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Region a bucket was created in.
    #[must_use]
    pub fn bucket_region(&self, bucket: &str) -> Option<String> {
        self.buckets.get(bucket).map(|b| b.region.clone())
    }

    /// Policy document attached to a bucket.
    #[must_use]
    pub fn bucket_policy(&self, bucket: &str) -> Option<String> {
        self.buckets.get(bucket).and_then(|b| b.policy.clone())
    }

    /// Fetch a stored object.
    #[must_use]
    pub fn object(&self, bucket: &str, name: &str) -> Option<MemoryObject> {
        self.objects
            .get(&(bucket.to_string(), name.to_string()))
            .map(|o| o.clone())
    }

    /// Number of stored objects across buckets.
    #[must_use]
    pub fn object_count(&self) -> usize {
        self.objects.len()
    }

    fn check_reachable(&self) -> Result<(), ObjectStoreError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(ObjectStoreError::Unavailable(
                "connection refused".to_string(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectStoreClient for MemoryObjectStore {
    async fn bucket_exists(&self, bucket: &str) -> Result<bool, ObjectStoreError> {
        self.calls.bucket_exists.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        if self.hide_buckets.load(Ordering::SeqCst) {
            return Ok(false);
        }
        Ok(self.buckets.contains_key(bucket))
    }

    async fn make_bucket(&self, bucket: &str, region: &str) -> Result<(), ObjectStoreError> {
        self.calls.make_bucket.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;

        match self.buckets.entry(bucket.to_string()) {
            Entry::Occupied(_) => {
                Err(ObjectStoreError::BucketAlreadyExists(bucket.to_string()))
            }
            Entry::Vacant(slot) => {
                slot.insert(MemoryBucket {
                    region: region.to_string(),
                    policy: None,
                });
                Ok(())
            }
        }
    }

    async fn set_bucket_policy(&self, bucket: &str, policy: &str) -> Result<(), ObjectStoreError> {
        self.calls.set_bucket_policy.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        if self.reject_policy.load(Ordering::SeqCst) {
            return Err(ObjectStoreError::Rejected("AccessDenied".to_string()));
        }

        let mut entry = self
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| ObjectStoreError::Rejected(format!("NoSuchBucket: {bucket}")))?;
        entry.policy = Some(policy.to_string());
        Ok(())
    }

    async fn put_object(
        &self,
        bucket: &str,
        object: &str,
        data: Bytes,
        _size: u64,
        content_type: &str,
    ) -> Result<(), ObjectStoreError> {
        self.calls.put_object.fetch_add(1, Ordering::SeqCst);
        self.check_reachable()?;
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(ObjectStoreError::Rejected("AccessDenied".to_string()));
        }
        if !self.buckets.contains_key(bucket) {
            return Err(ObjectStoreError::Rejected(format!("NoSuchBucket: {bucket}")));
        }

        self.objects.insert(
            (bucket.to_string(), object.to_string()),
            MemoryObject {
                data,
                content_type: content_type.to_string(),
            },
        );
        Ok(())
    }
}
