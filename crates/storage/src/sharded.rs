//! Sharded versioned memory store
//!
//! Scaling variant of [`VersionedMemoryStore`](crate::VersionedMemoryStore)
//! for workloads where one lock becomes the bottleneck.
//!
//! # Design
//!
//! - N shards, each an FxHashMap behind its own `parking_lot::Mutex`
//! - Keys map to shards by FxHash
//! - One `AtomicU64` token counter shared by all shards
//! - Every operation locks exactly the shards its keys touch, in ascending
//!   shard order, and holds them until it returns
//!
//! Ordered acquisition rules out deadlock between overlapping batches, and
//! holding every touched shard keeps a batch atomic across shards. Batches
//! over disjoint shards run in parallel.

use crate::apply::{apply_batch, max_seeded_version, RecordTable};
use parking_lot::{Mutex, MutexGuard};
use rustc_hash::{FxHashMap, FxHasher};
use smallvec::SmallVec;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use tagstore_core::key::validate_keys;
use tagstore_core::{ETag, Error, Record, Result, Storage, StoreOptions, WriteBatch};
use tracing::debug;

/// One independently locked slice of the key space
#[derive(Debug, Default)]
pub struct Shard {
    records: FxHashMap<String, Record>,
}

impl Shard {
    /// Create an empty shard
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a shard with pre-allocated capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            records: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Number of records in this shard
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the shard is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Guards for the shards one operation touches, sorted by shard index
struct LockedShards<'a> {
    store: &'a ShardedMemoryStore,
    guards: SmallVec<[(usize, MutexGuard<'a, Shard>); 8]>,
}

impl LockedShards<'_> {
    fn position(&self, key: &str) -> usize {
        let index = self.store.shard_index(key);
        match self.guards.binary_search_by_key(&index, |(i, _)| *i) {
            Ok(pos) => pos,
            Err(_) => unreachable!("shard {index} not locked for key {key:?}"),
        }
    }

    fn shard(&self, key: &str) -> &Shard {
        &self.guards[self.position(key)].1
    }

    fn shard_mut(&mut self, key: &str) -> &mut Shard {
        let pos = self.position(key);
        &mut self.guards[pos].1
    }
}

impl RecordTable for LockedShards<'_> {
    fn current_e_tag(&self, key: &str) -> Option<&ETag> {
        self.shard(key).records.get(key).and_then(Record::e_tag)
    }

    fn commit(&mut self, key: String, record: Record) {
        self.shard_mut(&key).records.insert(key, record);
    }

    fn reserve(&mut self, count: u64) -> Result<u64> {
        self.store.reserve_versions(count)
    }
}

/// Versioned memory store split into independently locked shards
///
/// Same operations, semantics and errors as
/// [`VersionedMemoryStore`](crate::VersionedMemoryStore).
///
/// # Example
///
/// ```
/// use tagstore_core::{StoreOptions, WriteBatch};
/// use tagstore_storage::ShardedMemoryStore;
///
/// let store = ShardedMemoryStore::with_options(StoreOptions::new().shard_count(4));
/// let mut batch = WriteBatch::new();
/// batch.put("a", &1)?.put("b", &2)?;
/// store.write(batch)?;
/// assert_eq!(store.len(), 2);
/// # Ok::<(), tagstore_core::Error>(())
/// ```
pub struct ShardedMemoryStore {
    shards: Box<[Mutex<Shard>]>,
    /// Last minted counter value
    version: AtomicU64,
    options: StoreOptions,
}

impl ShardedMemoryStore {
    /// Create an empty store with default options
    pub fn new() -> Self {
        Self::with_options(StoreOptions::default())
    }

    /// Create an empty store with `options.shard_count` shards
    ///
    /// A shard count of zero is treated as one.
    pub fn with_options(options: StoreOptions) -> Self {
        let count = options.shard_count.max(1);
        let per_shard = options.initial_capacity / count;
        let shards = (0..count)
            .map(|_| Mutex::new(Shard::with_capacity(per_shard)))
            .collect();
        Self {
            shards,
            version: AtomicU64::new(0),
            options,
        }
    }

    /// Create a store that takes ownership of pre-existing records
    pub fn seeded(records: impl IntoIterator<Item = (String, Record)>) -> Self {
        Self::seeded_with_options(records, StoreOptions::default())
    }

    /// Create a seeded store with explicit options
    ///
    /// The counter starts at the highest numeric seeded token.
    pub fn seeded_with_options(
        records: impl IntoIterator<Item = (String, Record)>,
        options: StoreOptions,
    ) -> Self {
        let mut store = Self::with_options(options);
        let mut highest: u64 = 0;
        let mut count = 0;
        for (key, record) in records {
            highest = highest.max(max_seeded_version(std::iter::once(&record)));
            let index = store.shard_index(&key);
            store.shards[index].get_mut().records.insert(key, record);
            count += 1;
        }
        store.set_version(highest);
        debug!(
            target: "tagstore::storage",
            records = count,
            version = highest,
            shards = store.shard_count(),
            "seeded sharded store"
        );
        store
    }

    /// Options the store was built with
    pub fn options(&self) -> &StoreOptions {
        &self.options
    }

    /// Last minted counter value
    #[inline]
    pub fn version(&self) -> u64 {
        self.version.load(Ordering::Acquire)
    }

    /// Advance the counter by `count` and return the first new value
    ///
    /// The counter never wraps: if it would, it is left untouched.
    fn reserve_versions(&self, count: u64) -> Result<u64> {
        self.version
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| v.checked_add(count))
            .map(|previous| previous + 1)
            .map_err(|current| Error::VersionExhausted {
                current,
                requested: count,
            })
    }

    fn set_version(&self, version: u64) {
        self.version.store(version, Ordering::Release);
    }

    /// Number of shards
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Shard a key lives in
    pub fn shard_index(&self, key: &str) -> usize {
        let mut hasher = FxHasher::default();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.shards.len()
    }

    /// Number of records in one shard
    pub fn shard_len(&self, index: usize) -> usize {
        self.shards.get(index).map(|s| s.lock().len()).unwrap_or(0)
    }

    /// Total number of records
    ///
    /// Shards are counted one at a time, so concurrent writers may make the
    /// total approximate.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.lock().len()).sum()
    }

    /// Whether every shard is empty
    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|s| s.lock().is_empty())
    }

    /// Whether `key` is present
    pub fn contains(&self, key: &str) -> bool {
        self.shards[self.shard_index(key)]
            .lock()
            .records
            .contains_key(key)
    }

    /// Clone every record while holding all shard locks
    pub fn snapshot(&self) -> HashMap<String, Record> {
        let guards: Vec<_> = self.shards.iter().map(|s| s.lock()).collect();
        guards
            .iter()
            .flat_map(|g| g.records.iter().map(|(k, r)| (k.clone(), r.clone())))
            .collect()
    }

    fn lock_shards<'k>(&self, keys: impl IntoIterator<Item = &'k str>) -> LockedShards<'_> {
        let mut indices: SmallVec<[usize; 8]> =
            keys.into_iter().map(|k| self.shard_index(k)).collect();
        indices.sort_unstable();
        indices.dedup();
        LockedShards {
            store: self,
            guards: indices
                .into_iter()
                .map(|i| (i, self.shards[i].lock()))
                .collect(),
        }
    }

    /// Read the records stored under `keys` as one consistent snapshot
    pub fn read_records(&self, keys: &[&str]) -> Result<HashMap<String, Record>> {
        validate_keys(keys)?;
        let locked = self.lock_shards(keys.iter().copied());
        Ok(keys
            .iter()
            .filter_map(|&key| {
                locked
                    .shard(key)
                    .records
                    .get(key)
                    .map(|r| (key.to_string(), r.clone()))
            })
            .collect())
    }

    /// Apply a batch while holding every shard it touches
    pub fn write(&self, batch: WriteBatch) -> Result<()> {
        if batch.is_empty() {
            return Ok(());
        }
        let mut locked = self.lock_shards(batch.keys());
        let shards = locked.guards.len();
        let committed = apply_batch(&mut locked, batch, self.options.batch_mode)?;
        debug!(
            target: "tagstore::storage",
            committed,
            shards,
            version = self.version(),
            "write batch committed"
        );
        Ok(())
    }

    /// Remove `keys`; absent keys are ignored
    pub fn delete(&self, keys: &[&str]) -> Result<()> {
        validate_keys(keys)?;
        let mut locked = self.lock_shards(keys.iter().copied());
        let mut removed = 0;
        for key in keys {
            if locked.shard_mut(key).records.remove(*key).is_some() {
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

impl Default for ShardedMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for ShardedMemoryStore {
    fn read_records(&self, keys: &[&str]) -> Result<HashMap<String, Record>> {
        ShardedMemoryStore::read_records(self, keys)
    }

    fn write(&self, batch: WriteBatch) -> Result<()> {
        ShardedMemoryStore::write(self, batch)
    }

    fn delete(&self, keys: &[&str]) -> Result<()> {
        ShardedMemoryStore::delete(self, keys)
    }
}

impl std::fmt::Debug for ShardedMemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShardedMemoryStore")
            .field("shard_count", &self.shard_count())
            .field("version", &self.version())
            .field("total_entries", &self.len())
            .finish()
    }
}
