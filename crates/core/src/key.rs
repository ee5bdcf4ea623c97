//! Key validation

use crate::error::{Error, Result};

/// Reject keys a store cannot hold
///
/// Keys are caller-defined strings; the only rule the store enforces is
/// that they are non-empty.
pub fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(Error::invalid_argument("key must not be empty"));
    }
    Ok(())
}

/// Validate every key in a slice, stopping at the first bad one
pub fn validate_keys<K: AsRef<str>>(keys: &[K]) -> Result<()> {
    keys.iter().try_for_each(|k| validate_key(k.as_ref()))
}
