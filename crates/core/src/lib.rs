//! Core types for tagstore
//!
//! This crate defines the pieces every store and every caller share:
//! - [`ETag`]: version token minted by a store on each versioned write
//! - [`Record`]: serialized payload plus its token and type hint
//! - [`WriteBatch`]: the set of changes handed to a store in one call
//! - [`Storage`] / [`StoreItem`]: the read/write/delete contract and the
//!   opt-in version-aware capability
//! - [`Error`]: the single error type surfaced by every operation
//! - [`StoreOptions`]: store configuration

#![warn(missing_docs)]

pub mod batch;
pub mod error;
pub mod etag;
pub mod key;
pub mod options;
pub mod record;
pub mod traits;

pub use batch::{Change, Condition, WriteBatch};
pub use error::{Error, Result};
pub use etag::{ETag, ETAG_FIELD, WILDCARD};
pub use key::{validate_key, validate_keys};
pub use options::{BatchMode, StoreOptions};
pub use record::{Record, TYPE_FIELD};
pub use traits::{Storage, StoreItem};
