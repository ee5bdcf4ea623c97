//! In-memory versioned stores
//!
//! - [`VersionedMemoryStore`]: one lock over the whole map and the token
//!   counter; the baseline implementation of the storage contract
//! - [`ShardedMemoryStore`]: the same contract over independently locked
//!   shards, for workloads where the single lock becomes contended
//!
//! Both implement [`tagstore_core::Storage`] and share one write path, so
//! conflict detection and batch semantics are identical.

#![warn(missing_docs)]

mod apply;
pub mod memory;
pub mod sharded;

pub use memory::VersionedMemoryStore;
pub use sharded::{Shard, ShardedMemoryStore};
