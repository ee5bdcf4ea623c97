//! Async facade
//!
//! The stores never block on I/O, so every operation here runs the
//! synchronous critical section on the calling task and resolves on first
//! poll. No tasks are spawned and nothing is offloaded to a blocking pool.

use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use tagstore_core::{Record, Result, Storage, StoreItem, WriteBatch};
use tracing::trace;

/// Async view over a shared store
///
/// Clone is cheap (just an Arc clone) and clones share the store.
///
/// # Example
///
/// ```
/// # tokio_test_block_on(async {
/// use tagstore::{AsyncStore, VersionedMemoryStore, WriteBatch};
///
/// let store = AsyncStore::new(VersionedMemoryStore::new());
/// let mut batch = WriteBatch::new();
/// batch.put("k", &1)?;
/// store.write(batch).await?;
/// assert_eq!(store.read::<i32>(&["k"]).await?["k"], 1);
/// # Ok::<(), tagstore::Error>(())
/// # }).unwrap();
/// # fn tokio_test_block_on<F: std::future::Future>(f: F) -> F::Output {
/// #     tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(f)
/// # }
/// ```
pub struct AsyncStore<S> {
    inner: Arc<S>,
}

impl<S> Clone for AsyncStore<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Storage> AsyncStore<S> {
    /// Wrap a store
    pub fn new(store: S) -> Self {
        Self::from_shared(Arc::new(store))
    }

    /// Wrap a store that synchronous callers also hold
    pub fn from_shared(store: Arc<S>) -> Self {
        Self { inner: store }
    }

    /// The wrapped store
    pub fn inner(&self) -> &Arc<S> {
        &self.inner
    }

    /// Async [`Storage::read_records`]
    pub async fn read_records(&self, keys: &[&str]) -> Result<HashMap<String, Record>> {
        trace!(target: "tagstore::storage", keys = keys.len(), "async read");
        self.inner.read_records(keys)
    }

    /// Async [`Storage::read`]
    pub async fn read<T: DeserializeOwned>(&self, keys: &[&str]) -> Result<HashMap<String, T>> {
        trace!(target: "tagstore::storage", keys = keys.len(), "async read");
        self.inner.read(keys)
    }

    /// Async [`Storage::read_items`]
    pub async fn read_items<T: DeserializeOwned + StoreItem>(
        &self,
        keys: &[&str],
    ) -> Result<HashMap<String, T>> {
        trace!(target: "tagstore::storage", keys = keys.len(), "async read");
        self.inner.read_items(keys)
    }

    /// Async [`Storage::write`]
    pub async fn write(&self, batch: WriteBatch) -> Result<()> {
        trace!(target: "tagstore::storage", changes = batch.len(), "async write");
        self.inner.write(batch)
    }

    /// Async [`Storage::delete`]
    pub async fn delete(&self, keys: &[&str]) -> Result<()> {
        trace!(target: "tagstore::storage", keys = keys.len(), "async delete");
        self.inner.delete(keys)
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for AsyncStore<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsyncStore")
            .field("inner", &self.inner)
            .finish()
    }
}
