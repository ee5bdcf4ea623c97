//! Error type shared by every store operation

use crate::etag::ETag;
use thiserror::Error;

/// Result alias used throughout tagstore
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by stores and their collaborators
///
/// Every variant is returned synchronously to the immediate caller. Stores
/// never retry and never swallow a conflict; retrying is caller policy.
#[derive(Debug, Error)]
pub enum Error {
    /// A version-aware write carried a token that does not match the stored one
    ///
    /// `expected` is the token the caller supplied (absent when the caller's
    /// item had never been stored), `current` is the token in the store.
    /// Recover by re-reading, retrying with the fresh token, or forcing the
    /// write with the wildcard token.
    #[error(
        "etag conflict on '{key}': original {}, current {current}",
        .expected.as_ref().map(ETag::as_str).unwrap_or("<none>")
    )]
    Conflict {
        /// Key whose write was rejected
        key: String,
        /// Token carried by the rejected write
        expected: Option<ETag>,
        /// Token currently stored for the key
        current: ETag,
    },

    /// A required input was missing or malformed (empty key, missing identifier)
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A value could not be serialized, or a payload could not be
    /// deserialized into the requested type
    #[error("serialization failed for '{key}': {source}")]
    Serialization {
        /// Key of the offending value
        key: String,
        /// Underlying serde error
        #[source]
        source: serde_json::Error,
    },

    /// The token counter cannot advance far enough to version a batch
    ///
    /// Only reachable when a seeded token sits near `u64::MAX`. Nothing from
    /// the rejected batch is committed.
    #[error("version counter exhausted: cannot mint {requested} token(s) after {current}")]
    VersionExhausted {
        /// Counter value when the batch was rejected
        current: u64,
        /// Tokens the batch needed
        requested: u64,
    },

    /// A TOML options document could not be parsed
    #[error("invalid store options: {0}")]
    Options(#[from] toml::de::Error),
}

impl Error {
    /// Build an [`Error::InvalidArgument`]
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }

    /// Build an [`Error::Serialization`] for `key`
    pub fn serialization(key: impl Into<String>, source: serde_json::Error) -> Self {
        Error::Serialization {
            key: key.into(),
            source,
        }
    }

    /// Whether this is a version conflict
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict { .. })
    }

    /// Key involved in the error, if the error is tied to one
    pub fn key(&self) -> Option<&str> {
        match self {
            Error::Conflict { key, .. } | Error::Serialization { key, .. } => Some(key),
            _ => None,
        }
    }
}
