//! Optimistic concurrency for tagstore
//!
//! Stores hand every write batch to [`validate_batch`] (all-or-nothing mode)
//! or to [`validate_change`] one entry at a time (best-effort mode) before
//! committing anything.

#![warn(missing_docs)]

pub mod validation;

pub use validation::{validate_batch, validate_change, ConflictType, ValidationResult};
