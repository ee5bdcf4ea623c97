//! Stored records
//!
//! A [`Record`] is what a store keeps per key: the caller's value serialized
//! to a JSON document, the version token minted for it (if it was written
//! through the versioned path), the Rust type name of the value that
//! produced it, and the commit timestamp.
//!
//! Payloads are self-describing, so any number of caller types can share one
//! store. The type hint lets a caller check what a record holds before
//! decoding it; decoding itself is structural and does not require the
//! hint to match.

use crate::etag::{ETag, ETAG_FIELD};
use crate::traits::StoreItem;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Document field carrying the stored-type hint
pub const TYPE_FIELD: &str = "$type";

/// Serialized snapshot of a caller value plus its version metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    value: Value,
    #[serde(rename = "eTag", default, skip_serializing_if = "Option::is_none")]
    e_tag: Option<ETag>,
    #[serde(rename = "$type", default, skip_serializing_if = "Option::is_none")]
    type_name: Option<String>,
    /// Commit time in microseconds since the epoch (0 until committed)
    #[serde(default)]
    timestamp: i64,
}

impl Record {
    /// Wrap an already-serialized JSON value
    pub fn new(value: Value) -> Self {
        Record {
            value,
            e_tag: None,
            type_name: None,
            timestamp: 0,
        }
    }

    /// Serialize a caller value, remembering its type name
    pub fn from_value<T: Serialize + ?Sized>(value: &T) -> serde_json::Result<Self> {
        Ok(Record {
            value: serde_json::to_value(value)?,
            e_tag: None,
            type_name: Some(std::any::type_name::<T>().to_string()),
            timestamp: 0,
        })
    }

    /// Build a record from a raw JSON document
    ///
    /// A string `eTag` field and a string `$type` field are lifted out of a
    /// top-level object into the record's metadata. Anything else is kept
    /// as payload. This is how pre-existing maps are turned into seeds.
    pub fn from_document(mut doc: Value) -> Self {
        let mut e_tag = None;
        let mut type_name = None;

        if let Value::Object(map) = &mut doc {
            if matches!(map.get(ETAG_FIELD), Some(Value::String(_))) {
                if let Some(Value::String(tag)) = map.remove(ETAG_FIELD) {
                    e_tag = Some(ETag::from(tag));
                }
            }
            if matches!(map.get(TYPE_FIELD), Some(Value::String(_))) {
                if let Some(Value::String(name)) = map.remove(TYPE_FIELD) {
                    type_name = Some(name);
                }
            }
        }

        Record {
            value: doc,
            e_tag,
            type_name,
            timestamp: 0,
        }
    }

    /// The serialized payload, without the token
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// Consume the record, returning the payload
    pub fn into_value(self) -> Value {
        self.value
    }

    /// Token minted for this record, if it was written as version-aware
    pub fn e_tag(&self) -> Option<&ETag> {
        self.e_tag.as_ref()
    }

    /// Type name of the value this record was serialized from
    pub fn type_name(&self) -> Option<&str> {
        self.type_name.as_deref()
    }

    /// Commit time in microseconds since the epoch
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    /// Whether the record was serialized from a `T`
    pub fn is<T: ?Sized>(&self) -> bool {
        self.type_name.as_deref() == Some(std::any::type_name::<T>())
    }

    /// Finalize the record for commit: set its token and stamp the time
    ///
    /// Called by stores while holding their lock.
    pub fn stamped(mut self, e_tag: Option<ETag>) -> Self {
        self.e_tag = e_tag;
        self.timestamp = Utc::now().timestamp_micros();
        self
    }

    /// Drop a token field the caller's value serialized into its own payload
    ///
    /// Version-aware values usually carry their token as a field; the store
    /// tracks the token itself, so the copy in the payload is removed.
    pub(crate) fn strip_e_tag_field(&mut self) {
        if let Value::Object(map) = &mut self.value {
            map.remove(ETAG_FIELD);
        }
    }

    /// Render the record as the document a caller would deserialize
    ///
    /// Object payloads get the token injected as `eTag`; other payloads are
    /// returned unchanged.
    pub fn document(&self) -> Value {
        let mut doc = self.value.clone();
        if let (Value::Object(map), Some(tag)) = (&mut doc, &self.e_tag) {
            map.insert(ETAG_FIELD.to_string(), Value::String(tag.as_str().to_string()));
        }
        doc
    }

    /// Deserialize the document into `T`
    pub fn decode<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_value(self.document())
    }

    /// Deserialize into a version-aware `T` and hand it the stored token
    pub fn decode_item<T: DeserializeOwned + StoreItem>(&self) -> serde_json::Result<T> {
        let mut item: T = self.decode()?;
        if let Some(tag) = &self.e_tag {
            item.set_e_tag(tag.clone());
        }
        Ok(item)
    }
}
