//! In-memory object store.
//!
//! Objects are held in a `tokio::sync::RwLock<HashMap<...>>`.  In versioned
//! mode every put appends a new version (identified by a UUID) and the full
//! history is retained; in unversioned mode a put replaces the previous
//! body, matching a bucket without versioning enabled.
//!
//! Used by tests and `storage.backend: memory` deployments.

use bytes::Bytes;
use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use super::store::{ObjectStore, StoreError, StoreResult};

/// One retained version of an object.
#[derive(Debug, Clone)]
struct StoredVersion {
    version_id: String,
    body: Bytes,
}

/// In-memory object store, optionally versioned.
pub struct MemoryStore {
    /// key -> versions, oldest first; the last element is the current object.
    objects: tokio::sync::RwLock<HashMap<String, Vec<StoredVersion>>>,
    /// Whether overwrites retain the previous version.
    versioned: bool,
}

impl MemoryStore {
    /// Create a new `MemoryStore`.
    pub fn new(versioned: bool) -> Self {
        Self {
            objects: tokio::sync::RwLock::new(HashMap::new()),
            versioned,
        }
    }

    fn new_version_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

// ── ObjectStore implementation ──────────────────────────────────────────

impl ObjectStore for MemoryStore {
    fn list_keys(&self) -> Pin<Box<dyn Future<Output = StoreResult<Vec<String>>> + Send + '_>> {
        Box::pin(async move {
            let objects = self.objects.read().await;
            Ok(objects.keys().cloned().collect())
        })
    }

    fn put(
        &self,
        key: &str,
        body: Bytes,
    ) -> Pin<Box<dyn Future<Output = StoreResult<()>> + Send + '_>> {
        let key = key.to_string();
        Box::pin(async move {
            let version = StoredVersion {
                version_id: Self::new_version_id(),
                body,
            };

            let mut objects = self.objects.write().await;
            let versions = objects.entry(key).or_default();
            if !self.versioned {
                versions.clear();
            }
            versions.push(version);
            Ok(())
        })
    }

    fn get(&self, key: &str) -> Pin<Box<dyn Future<Output = StoreResult<Bytes>> + Send + '_>> {
        let key = key.to_string();
        Box::pin(async move {
            let objects = self.objects.read().await;
            objects
                .get(&key)
                .and_then(|versions| versions.last())
                .map(|v| v.body.clone())
                .ok_or(StoreError::NotFound { key })
        })
    }

    fn get_version(
        &self,
        key: &str,
        version_id: &str,
    ) -> Pin<Box<dyn Future<Output = StoreResult<Bytes>> + Send + '_>> {
        let key = key.to_string();
        let version_id = version_id.to_string();
        Box::pin(async move {
            let objects = self.objects.read().await;
            objects
                .get(&key)
                .and_then(|versions| versions.iter().find(|v| v.version_id == version_id))
                .map(|v| v.body.clone())
                .ok_or(StoreError::NotFound { key })
        })
    }

    fn list_versions(
        &self,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = StoreResult<Vec<String>>> + Send + '_>> {
        let key = key.to_string();
        Box::pin(async move {
            if !self.versioned {
                return Ok(Vec::new());
            }
            let objects = self.objects.read().await;
            Ok(objects
                .get(&key)
                .map(|versions| {
                    // Newest first, matching S3 ListObjectVersions.
                    versions
                        .iter()
                        .rev()
                        .map(|v| v.version_id.clone())
                        .collect()
                })
                .unwrap_or_default())
        })
    }
}

// ── Tests ──────────────────────────────────────────────────────────────
