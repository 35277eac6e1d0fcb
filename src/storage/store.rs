//! Abstract object store trait.
//!
//! Every backend must implement [`ObjectStore`].  The trait works in terms
//! of opaque byte bodies so callers do not need to know the underlying
//! medium.  Every call is a remote operation from the caller's perspective:
//! no local caching, no retries.

use bytes::Bytes;
use std::future::Future;
use std::pin::Pin;
use thiserror::Error;

/// Failures surfaced by an object store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The requested key or version does not exist.
    #[error("Object not found at storage key: {key}")]
    NotFound { key: String },

    /// Any other backend failure (network, permission, throttling).
    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Async object store contract.
pub trait ObjectStore: Send + Sync + 'static {
    /// Enumerate every object key currently in the bucket, transparently
    /// following continuation tokens.  Order is whatever the store returns.
    fn list_keys(&self) -> Pin<Box<dyn Future<Output = StoreResult<Vec<String>>> + Send + '_>>;

    /// Write/overwrite the object at `key` with `body`.
    fn put(
        &self,
        key: &str,
        body: Bytes,
    ) -> Pin<Box<dyn Future<Output = StoreResult<()>> + Send + '_>>;

    /// Read the current object content at `key`.
    fn get(&self, key: &str) -> Pin<Box<dyn Future<Output = StoreResult<Bytes>> + Send + '_>>;

    /// Read a specific historical version of the object at `key`.
    fn get_version(
        &self,
        key: &str,
        version_id: &str,
    ) -> Pin<Box<dyn Future<Output = StoreResult<Bytes>> + Send + '_>>;

    /// All retained version IDs for `key`, newest first.  Empty when the
    /// store is not versioned.
    fn list_versions(
        &self,
        key: &str,
    ) -> Pin<Box<dyn Future<Output = StoreResult<Vec<String>>> + Send + '_>>;
}
