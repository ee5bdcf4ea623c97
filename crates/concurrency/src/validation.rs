//! ETag validation for optimistic writes
//!
//! Conflict rules:
//! - Unversioned changes never conflict (plain overwrite)
//! - A versioned change against a key with no stored token never conflicts
//! - The wildcard token `"*"` never conflicts
//! - Otherwise the caller's token must equal the stored token; a caller with
//!   no token at all does not match a stored token
//!
//! Validation never mutates anything. Stores run it under their lock and
//! decide what to do with the result according to their batch mode.

use std::fmt;
use tagstore_core::{Condition, ETag, Error, Result, WriteBatch};

/// Why a single change was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConflictType {
    /// The caller's token differs from the stored token
    StaleETag {
        /// Key of the rejected change
        key: String,
        /// Token carried by the change
        expected: ETag,
        /// Token in the store at validation time
        current: ETag,
    },

    /// The caller's value has never been stored, but the key holds a
    /// versioned record
    MissingETag {
        /// Key of the rejected change
        key: String,
        /// Token in the store at validation time
        current: ETag,
    },
}

impl ConflictType {
    /// Key of the rejected change
    pub fn key(&self) -> &str {
        match self {
            ConflictType::StaleETag { key, .. } | ConflictType::MissingETag { key, .. } => key,
        }
    }

    /// Token the caller supplied
    pub fn expected(&self) -> Option<&ETag> {
        match self {
            ConflictType::StaleETag { expected, .. } => Some(expected),
            ConflictType::MissingETag { .. } => None,
        }
    }

    /// Token found in the store
    pub fn current(&self) -> &ETag {
        match self {
            ConflictType::StaleETag { current, .. } | ConflictType::MissingETag { current, .. } => {
                current
            }
        }
    }

    /// Convert into the caller-facing [`Error::Conflict`]
    pub fn into_error(self) -> Error {
        match self {
            ConflictType::StaleETag {
                key,
                expected,
                current,
            } => Error::Conflict {
                key,
                expected: Some(expected),
                current,
            },
            ConflictType::MissingETag { key, current } => Error::Conflict {
                key,
                expected: None,
                current,
            },
        }
    }
}

impl fmt::Display for ConflictType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConflictType::StaleETag {
                key,
                expected,
                current,
            } => write!(f, "{key}: stale etag {expected}, current {current}"),
            ConflictType::MissingETag { key, current } => {
                write!(f, "{key}: no etag supplied, current {current}")
            }
        }
    }
}

/// Result of validating a batch
///
/// Accumulates every conflict found. A batch may be applied as a whole only
/// if [`ValidationResult::is_valid`] returns true.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    /// Conflicts in the order they were found
    pub conflicts: Vec<ConflictType>,
}

impl ValidationResult {
    /// A result with no conflicts
    pub fn ok() -> Self {
        ValidationResult {
            conflicts: Vec::new(),
        }
    }

    /// A result with a single conflict
    pub fn conflict(conflict: ConflictType) -> Self {
        ValidationResult {
            conflicts: vec![conflict],
        }
    }

    /// Whether validation passed
    pub fn is_valid(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Append another result's conflicts
    pub fn merge(&mut self, other: ValidationResult) {
        self.conflicts.extend(other.conflicts);
    }

    /// Number of conflicts
    pub fn conflict_count(&self) -> usize {
        self.conflicts.len()
    }

    /// First conflict found
    pub fn first(&self) -> Option<&ConflictType> {
        self.conflicts.first()
    }

    /// `Ok(())` if valid, otherwise the first conflict as an error
    pub fn into_result(self) -> Result<()> {
        match self.conflicts.into_iter().next() {
            None => Ok(()),
            Some(conflict) => Err(conflict.into_error()),
        }
    }
}

/// Check one change against the token currently stored for its key
pub fn validate_change(
    key: &str,
    condition: &Condition,
    current: Option<&ETag>,
) -> Option<ConflictType> {
    let Condition::Versioned(expected) = condition else {
        return None;
    };
    let current = current?;

    match expected {
        Some(tag) if tag.is_wildcard() || tag == current => None,
        Some(tag) => Some(ConflictType::StaleETag {
            key: key.to_string(),
            expected: tag.clone(),
            current: current.clone(),
        }),
        None => Some(ConflictType::MissingETag {
            key: key.to_string(),
            current: current.clone(),
        }),
    }
}

/// Check every change in a batch
///
/// `current` looks up the stored token for a key. Conflicts are reported in
/// batch (key) order.
pub fn validate_batch<'a, F>(batch: &WriteBatch, current: F) -> ValidationResult
where
    F: Fn(&str) -> Option<&'a ETag>,
{
    let mut result = ValidationResult::ok();
    for (key, change) in batch.iter() {
        if let Some(conflict) = validate_change(key, change.condition(), current(key)) {
            result.conflicts.push(conflict);
        }
    }
    result
}
