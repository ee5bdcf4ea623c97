//! Store configuration
//!
//! [`StoreOptions`] controls how a store applies batches and how it sizes
//! its internal tables. Options are built in code with the setter chain or
//! loaded from a TOML document:
//!
//! ```
//! use tagstore_core::{BatchMode, StoreOptions};
//!
//! let opts = StoreOptions::new().batch_mode(BatchMode::BestEffort).shard_count(4);
//! assert_eq!(opts.shard_count, 4);
//!
//! let parsed = StoreOptions::from_toml_str("batch_mode = \"best_effort\"\nshard_count = 4")?;
//! assert_eq!(parsed, opts);
//! # Ok::<(), tagstore_core::Error>(())
//! ```

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};

/// Default number of shards for the sharded store
pub const DEFAULT_SHARD_COUNT: usize = 16;

/// What happens to the rest of a batch when one change conflicts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchMode {
    /// Validate every change first; any conflict rejects the whole batch (default).
    #[default]
    AllOrNothing,
    /// Apply changes in key order; the first conflict stops the batch and
    /// changes applied before it stay committed.
    BestEffort,
}

/// Options for constructing a store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreOptions {
    /// Batch conflict policy
    pub batch_mode: BatchMode,
    /// Number of independently locked shards (sharded store only)
    pub shard_count: usize,
    /// Capacity to pre-allocate for the record map
    pub initial_capacity: usize,
}

impl StoreOptions {
    /// Default options: all-or-nothing batches, 16 shards, no pre-allocation
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the batch conflict policy
    pub fn batch_mode(mut self, mode: BatchMode) -> Self {
        self.batch_mode = mode;
        self
    }

    /// Set the shard count
    pub fn shard_count(mut self, count: usize) -> Self {
        self.shard_count = count;
        self
    }

    /// Set the initial map capacity
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }

    /// Parse options from TOML; missing fields take their defaults
    pub fn from_toml_str(doc: &str) -> Result<Self> {
        let opts: StoreOptions = toml::from_str(doc)?;
        opts.validate()?;
        Ok(opts)
    }

    /// Check option values
    pub fn validate(&self) -> Result<()> {
        if self.shard_count == 0 {
            return Err(Error::invalid_argument("shard_count must be at least 1"));
        }
        Ok(())
    }
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            batch_mode: BatchMode::AllOrNothing,
            shard_count: DEFAULT_SHARD_COUNT,
            initial_capacity: 0,
        }
    }
}
