//! Public types for the tagstore API.
//!
//! This module re-exports types from internal crates with a clean public interface.

// ============================================================================
// Records and tokens
// ============================================================================

pub use tagstore_core::{ETag, Record, ETAG_FIELD, TYPE_FIELD, WILDCARD};

// Batches
pub use tagstore_core::{Change, Condition, WriteBatch};

// Contract
pub use tagstore_core::{Storage, StoreItem};

// Errors
pub use tagstore_core::{Error, Result};

// Configuration
pub use tagstore_core::{BatchMode, StoreOptions};

// ============================================================================
// Stores
// ============================================================================

pub use tagstore_storage::{ShardedMemoryStore, VersionedMemoryStore};

// Conflict reporting, for callers that validate batches themselves
pub use tagstore_concurrency::{validate_batch, ConflictType, ValidationResult};

// ============================================================================
// State facade
// ============================================================================

pub use tagstore_primitives::{BotState, StateScope, TurnIdentity};
