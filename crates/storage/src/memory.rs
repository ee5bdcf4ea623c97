//! Single-lock versioned memory store
//!
//! One `parking_lot::Mutex` guards the record map and the token counter.
//! Every public operation takes it for its full duration, which makes every
//! batch observably atomic: a reader sees a batch fully applied or not at
//! all, and a record's payload and token always change together.
//!
//! # Example
//!
//! ```
//! use serde_json::json;
//! use tagstore_core::{Storage, WriteBatch};
//! use tagstore_storage::VersionedMemoryStore;
//!
//! let store = VersionedMemoryStore::new();
//!
//! let mut batch = WriteBatch::new();
//! batch.put("greeting", &json!({"text": "hello"}))?;
//! store.write(batch)?;
//!
//! let values = store.read::<serde_json::Value>(&["greeting", "missing"])?;
//! assert_eq!(values.len(), 1);
//! # Ok::<(), tagstore_core::Error>(())
//! ```

use crate::apply::{apply_batch, max_seeded_version, RecordTable};
use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::collections::HashMap;
use tagstore_core::key::validate_keys;
use tagstore_core::{ETag, Error, Record, Result, Storage, StoreOptions, WriteBatch};
use tracing::debug;

/// State behind the store's lock
#[derive(Debug, Default)]
struct Inner {
    records: FxHashMap<String, Record>,
    /// Last minted counter value
    version: u64,
}

impl RecordTable for Inner {
    fn current_e_tag(&self, key: &str) -> Option<&ETag> {
        self.records.get(key).and_then(Record::e_tag)
    }

    fn commit(&mut self, key: String, record: Record) {
        self.records.insert(key, record);
    }

    fn reserve(&mut self, count: u64) -> Result<u64> {
        let end = self
            .version
            .checked_add(count)
            .ok_or(Error::VersionExhausted {
                current: self.version,
                requested: count,
            })?;
        let first = self.version + 1;
        self.version = end;
        Ok(first)
    }
}

/// In-memory key-value store with per-record version tokens
///
/// # Thread Safety
///
/// Share it behind an `Arc`; all methods take `&self`. Operations are
/// totally ordered by lock acquisition.
pub struct VersionedMemoryStore {
    inner: Mutex<Inner>,
    options: StoreOptions,
}

impl VersionedMemoryStore {
    /// Create an empty store with default options
    pub fn new() -> Self {
        Self::with_options(StoreOptions::default())
    }

    /// Create an empty store
    pub fn with_options(options: StoreOptions) -> Self {
        let records =
            FxHashMap::with_capacity_and_hasher(options.initial_capacity, Default::default());
        Self {
            inner: Mutex::new(Inner {
                records,
                version: 0,
            }),
            options,
        }
    }

    /// Create a store that takes ownership of pre-existing records
    pub fn seeded(records: impl IntoIterator<Item = (String, Record)>) -> Self {
        Self::seeded_with_options(records, StoreOptions::default())
    }

    /// Create a seeded store with explicit options
    ///
    /// The counter starts at the highest numeric token among the seeds, so
    /// no seeded token is ever minted again. The map is pre-allocated for
    /// `options.initial_capacity` records and grows past it if the seed is
    /// larger.
    pub fn seeded_with_options(
        records: impl IntoIterator<Item = (String, Record)>,
        options: StoreOptions,
    ) -> Self {
        let mut map =
            FxHashMap::with_capacity_and_hasher(options.initial_capacity, Default::default());
        map.extend(records);
        let records = map;
        let version = max_seeded_version(records.values());
        debug!(
            target: "tagstore::storage",
            records = records.len(),
            version,
            "seeded memory store"
        );
        Self {
            inner: Mutex::new(Inner { records, version }),
            options,
        }
    }

    /// Options the store was built with
    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Last minted counter value (0 before the first versioned write)
    pub fn version(&self) -> u64 {
        self.inner.lock().version
    }

    /// Records the map can hold without reallocating
    pub fn capacity(&self) -> usize {
        self.inner.lock().records.capacity()
    }

    /// Number of stored records
    pub fn len(&self) -> usize {
        self.inner.lock().records.len()
    }

    /// Whether the store holds no records
    pub fn is_empty(&self) -> bool {
        self.inner.lock().records.is_empty()
    }

    /// Whether `key` is present
    pub fn contains(&self, key: &str) -> bool {
        self.inner.lock().records.contains_key(key)
    }

    /// Clone every record under one lock acquisition
    pub fn snapshot(&self) -> HashMap<String, Record> {
        self.inner
            .lock()
            .records
            .iter()
            .map(|(k, r)| (k.clone(), r.clone()))
            .collect()
    }

    /// Read the records stored under `keys`
    ///
    /// All lookups happen under one lock acquisition, so the result is a
    /// consistent snapshot of the requested keys.
    pub fn read_records(&self, keys: &[&str]) -> Result<HashMap<String, Record>> {
        validate_keys(keys)?;
        let inner = self.inner.lock();
        Ok(keys
            .iter()
            .filter_map(|&key| inner.records.get(key).map(|r| (key.to_string(), r.clone())))
            .collect())
    }

    /// Apply a batch under the store's lock
    ///
    /// See [`tagstore_core::BatchMode`] for what a conflict does to the rest
    /// of the batch.
    pub fn write(&self, batch: WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut inner = self.inner.lock();
        let committed = apply_batch(&mut *inner, batch, self.options.batch_mode)?;
        debug!(
            target: "tagstore::storage",
            committed,
            version = inner.version,
            "write batch committed"
        );
        Ok(())
    }

    /// Remove `keys`; absent keys are ignored
    pub fn delete(&self, keys: &[&str]) -> Result<()> {
        validate_keys(keys)?;
        let mut inner = self.inner.lock();
        let mut removed = 0;
        for key in keys {
            if inner.records.remove(*key).is_some() {
                removed += 1;
            }
        }
        debug!(
            target: "tagstore::storage",
            requested = keys.len(),
            removed,
            "delete batch committed"
        );
        Ok(())
    }
}

impl Default for VersionedMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for VersionedMemoryStore {
    fn read_records(&self, keys: &[&str]) -> Result<HashMap<String, Record>> {
        VersionedMemoryStore::read_records(self, keys)
    }

    fn write(&self, batch: WriteBatch) -> Result<()> {
        VersionedMemoryStore::write(self, batch)
    }

    fn delete(&self, keys: &[&str]) -> Result<()> {
        VersionedMemoryStore::delete(self, keys)
    }
}

impl std::fmt::Debug for VersionedMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.lock();
        f.debug_struct("VersionedMemoryStore")
            .field("records", &inner.records.len())
            .field("version", &inner.version)
            .field("batch_mode", &self.options.batch_mode)
            .finish()
    }
}
