//! Tagstore: versioned in-memory key/value storage
//!
//! Keys map to serialized records tagged with a version token (ETag). Writes
//! of values that carry a token are checked against the stored one and
//! rejected on mismatch, which gives callers optimistic concurrency without
//! holding locks across a read-modify-write cycle.
//!
//! # Quick Start
//!
//! ```
//! use tagstore::{Storage, VersionedMemoryStore, WriteBatch};
//!
//! let store = VersionedMemoryStore::new();
//! let mut batch = WriteBatch::new();
//! batch.put("greeting", "hello")?;
//! store.write(batch)?;
//!
//! let values = store.read::<String>(&["greeting", "missing"])?;
//! assert_eq!(values.len(), 1);
//! assert_eq!(values["greeting"], "hello");
//! # Ok::<(), tagstore::Error>(())
//! ```
//!
//! # Crates
//!
//! - `tagstore-core`: records, tokens, batches, errors, options and the
//!   [`Storage`] contract
//! - `tagstore-concurrency`: conflict detection
//! - `tagstore-storage`: [`VersionedMemoryStore`] and [`ShardedMemoryStore`]
//! - `tagstore-primitives`: the scoped [`BotState`] facade
//!
//! [`AsyncStore`] exposes any store through `async fn`s for callers that
//! live on an async runtime.

#![warn(missing_docs)]

pub mod asynchronous;
mod types;

pub use asynchronous::AsyncStore;
pub use types::*;
