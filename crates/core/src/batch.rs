//! Write batches
//!
//! A [`WriteBatch`] collects the changes a caller wants applied in one store
//! call. Values are serialized as they are added, so a batch that reaches a
//! store is already validated and serialization never happens under the
//! store's lock.
//!
//! Changes are keyed by string; putting the same key twice keeps the last
//! change. Iteration is in key order, which is the order stores apply and
//! validate changes in.

use crate::error::{Error, Result};
use crate::etag::ETag;
use crate::key::validate_key;
use crate::record::Record;
use crate::traits::StoreItem;
use serde::Serialize;
use std::collections::btree_map;
use std::collections::BTreeMap;

/// How a change interacts with the stored token
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// Plain overwrite; the record is stored without a token
    Unversioned,
    /// Version-aware write carrying the caller's token
    ///
    /// `None` means the caller's value has never been stored. The wildcard
    /// token skips the check.
    Versioned(Option<ETag>),
}

impl Condition {
    /// Whether the change goes through the versioned path
    pub fn is_versioned(&self) -> bool {
        matches!(self, Condition::Versioned(_))
    }

    /// Token the caller expects to find in the store
    pub fn expected(&self) -> Option<&ETag> {
        match self {
            Condition::Versioned(tag) => tag.as_ref(),
            Condition::Unversioned => None,
        }
    }
}

/// One pending write
#[derive(Debug, Clone)]
pub struct Change {
    record: Record,
    condition: Condition,
}

impl Change {
    /// Pair a serialized record with its write condition
    pub fn new(record: Record, condition: Condition) -> Self {
        Change { record, condition }
    }

    /// Record that will be committed
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// Write condition
    pub fn condition(&self) -> &Condition {
        &self.condition
    }

    /// Split into record and condition
    pub fn into_parts(self) -> (Record, Condition) {
        (self.record, self.condition)
    }
}

/// Changes to apply in one store call, keyed by storage key
///
/// # Example
///
/// ```
/// use serde_json::json;
/// use tagstore_core::WriteBatch;
///
/// let mut batch = WriteBatch::new();
/// batch.put("a", &json!({"x": 1}))?.put("b", &42)?;
/// assert_eq!(batch.len(), 2);
/// # Ok::<(), tagstore_core::Error>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
    changes: BTreeMap<String, Change>,
}

impl WriteBatch {
    /// Create an empty batch
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a plain value, written without concurrency protection
    pub fn put<T: Serialize + ?Sized>(
        &mut self,
        key: impl Into<String>,
        value: &T,
    ) -> Result<&mut Self> {
        let key = key.into();
        let record = Record::from_value(value).map_err(|e| Error::serialization(&key, e))?;
        self.put_record(key, record, Condition::Unversioned)
    }

    /// Add a version-aware value
    ///
    /// The value's token becomes the write condition and is removed from the
    /// serialized payload; the store stamps the new token on commit.
    pub fn put_item<T: Serialize + StoreItem>(
        &mut self,
        key: impl Into<String>,
        item: &T,
    ) -> Result<&mut Self> {
        let key = key.into();
        let mut record = Record::from_value(item).map_err(|e| Error::serialization(&key, e))?;
        record.strip_e_tag_field();
        self.put_record(key, record, Condition::Versioned(item.e_tag().cloned()))
    }

    /// Add a pre-built record with an explicit condition
    pub fn put_record(
        &mut self,
        key: impl Into<String>,
        record: Record,
        condition: Condition,
    ) -> Result<&mut Self> {
        let key = key.into();
        validate_key(&key)?;
        self.changes.insert(key, Change::new(record, condition));
        Ok(self)
    }

    /// Number of distinct keys in the batch
    pub fn len(&self) -> usize {
        self.changes.len()
    }

    /// Whether the batch holds no changes
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }

    /// Change queued for `key`
    pub fn get(&self, key: &str) -> Option<&Change> {
        self.changes.get(key)
    }

    /// Keys in application order
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.changes.keys().map(String::as_str)
    }

    /// Changes in application order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Change)> {
        self.changes.iter().map(|(k, c)| (k.as_str(), c))
    }
}

impl IntoIterator for WriteBatch {
    type Item = (String, Change);
    type IntoIter = btree_map::IntoIter<String, Change>;

    fn into_iter(self) -> Self::IntoIter {
        self.changes.into_iter()
    }
}
