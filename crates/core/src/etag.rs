//! Version tokens
//!
//! An [`ETag`] identifies one revision of a stored record. Stores mint tokens
//! from a per-store counter, so a token is the decimal rendering of that
//! counter at the time of the write. Callers treat tokens as opaque strings;
//! the only value with meaning to them is the wildcard `"*"`.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The wildcard token: apply the write regardless of the stored version.
pub const WILDCARD: &str = "*";

/// Document field carrying the token when a record is rendered as JSON.
pub const ETAG_FIELD: &str = "eTag";

/// Opaque version token for a stored record
///
/// # Examples
///
/// ```
/// use tagstore_core::ETag;
///
/// let tag = ETag::from_version(7);
/// assert_eq!(tag.as_str(), "7");
/// assert_eq!(tag.version(), Some(7));
/// assert!(ETag::wildcard().is_wildcard());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ETag(String);

impl ETag {
    /// Create a token from any string
    pub fn new(tag: impl Into<String>) -> Self {
        ETag(tag.into())
    }

    /// The wildcard token `"*"`
    pub fn wildcard() -> Self {
        ETag(WILDCARD.to_string())
    }

    /// Render a counter value as a token
    pub fn from_version(version: u64) -> Self {
        ETag(version.to_string())
    }

    /// Whether this is the wildcard token
    #[inline]
    pub fn is_wildcard(&self) -> bool {
        self.0 == WILDCARD
    }

    /// Counter value this token was minted from, if it is numeric
    ///
    /// Tokens supplied by seeds or callers need not be numeric.
    pub fn version(&self) -> Option<u64> {
        self.0.parse().ok()
    }

    /// Borrow the token as a string slice
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consume the token, returning the underlying string
    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ETag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ETag {
    fn from(tag: &str) -> Self {
        ETag::new(tag)
    }
}

impl From<String> for ETag {
    fn from(tag: String) -> Self {
        ETag(tag)
    }
}

impl AsRef<str> for ETag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
