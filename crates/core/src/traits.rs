//! Storage contract
//!
//! [`Storage`] is the narrow read/write/delete surface collaborators program
//! against. [`StoreItem`] is the capability a value opts into to get
//! optimistic concurrency on write.

use crate::batch::WriteBatch;
use crate::error::{Error, Result};
use crate::etag::ETag;
use crate::record::Record;
use serde::de::DeserializeOwned;
use std::collections::HashMap;

/// A value that carries a version token
///
/// Values implementing this trait are written through the versioned path:
/// the store compares [`StoreItem::e_tag`] with the stored token and rejects
/// the write on mismatch. Values that do not implement it are written as
/// plain overwrites.
///
/// The usual shape is a field serialized as `eTag`:
///
/// ```
/// use serde::{Deserialize, Serialize};
/// use tagstore_core::{ETag, StoreItem};
///
/// #[derive(Serialize, Deserialize)]
/// struct Profile {
///     name: String,
///     #[serde(rename = "eTag", default, skip_serializing_if = "Option::is_none")]
///     e_tag: Option<ETag>,
/// }
///
/// impl StoreItem for Profile {
///     fn e_tag(&self) -> Option<&ETag> {
///         self.e_tag.as_ref()
///     }
///
///     fn set_e_tag(&mut self, e_tag: ETag) {
///         self.e_tag = Some(e_tag);
///     }
/// }
/// ```
pub trait StoreItem {
    /// Token this value was read with, `None` if it was never stored
    fn e_tag(&self) -> Option<&ETag>;

    /// Replace the token (called when the value is read back)
    fn set_e_tag(&mut self, e_tag: ETag);
}

/// Batch read/write/delete over string keys
///
/// # Thread Safety
///
/// Implementations are `Send + Sync` and every call is atomic with respect
/// to every other call on the same store: a batch is observed either fully
/// applied or not applied at all.
pub trait Storage: Send + Sync {
    /// Read the records stored under `keys`
    ///
    /// Absent keys are omitted from the result. Duplicate keys are
    /// tolerated. Empty keys fail with [`Error::InvalidArgument`].
    fn read_records(&self, keys: &[&str]) -> Result<HashMap<String, Record>>;

    /// Apply a batch of changes
    ///
    /// Fails with [`Error::Conflict`] when a version-aware change carries a
    /// stale token.
    fn write(&self, batch: WriteBatch) -> Result<()>;

    /// Remove `keys`; absent keys are ignored
    fn delete(&self, keys: &[&str]) -> Result<()>;

    /// Read and deserialize every present key into `T`
    ///
    /// The stored token, if any, is injected into object payloads as the
    /// `eTag` field before deserializing.
    fn read<T: DeserializeOwned>(&self, keys: &[&str]) -> Result<HashMap<String, T>>
    where
        Self: Sized,
    {
        decode_all(self.read_records(keys)?, |record| record.decode())
    }

    /// Read and deserialize version-aware values, handing each its token
    fn read_items<T: DeserializeOwned + StoreItem>(
        &self,
        keys: &[&str],
    ) -> Result<HashMap<String, T>>
    where
        Self: Sized,
    {
        decode_all(self.read_records(keys)?, |record| record.decode_item())
    }
}

/// Decode every record in a read result, tagging failures with their key
pub(crate) fn decode_all<T, F>(records: HashMap<String, Record>, decode: F) -> Result<HashMap<String, T>>
where
    F: Fn(&Record) -> serde_json::Result<T>,
{
    records
        .into_iter()
        .map(|(key, record)| match decode(&record) {
            Ok(value) => Ok((key, value)),
            Err(e) => Err(Error::serialization(key, e)),
        })
        .collect()
}
