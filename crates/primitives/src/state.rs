//! Scoped state facade
//!
//! Stateless facade over any [`Storage`]: it turns the identifiers of a
//! conversational turn into a storage key and reads or writes one value
//! under it. Multiple `BotState` instances sharing the same store see the
//! same data. Clone is cheap (just an Arc clone).
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use tagstore_primitives::{BotState, TurnIdentity};
//! use tagstore_storage::VersionedMemoryStore;
//!
//! let store = Arc::new(VersionedMemoryStore::new());
//! let state = BotState::private_conversation(store);
//!
//! let turn = TurnIdentity::new()
//!     .channel("msteams")
//!     .conversation("c-1")
//!     .user("u-1");
//! assert_eq!(state.storage_key(&turn)?, "msteams/conversations/c-1/users/u-1");
//!
//! state.save_unversioned(&turn, &vec!["hello"])?;
//! assert_eq!(state.load::<Vec<String>>(&turn)?, Some(vec!["hello".to_string()]));
//! # Ok::<(), tagstore_core::Error>(())
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tagstore_core::{Error, Result, Storage, StoreItem, WriteBatch};
use tracing::debug;

/// Identifiers of the turn a piece of state belongs to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TurnIdentity {
    /// Channel the turn arrived on
    pub channel_id: Option<String>,
    /// Conversation within the channel
    pub conversation_id: Option<String>,
    /// Sender of the turn
    pub user_id: Option<String>,
}

impl TurnIdentity {
    /// Identity with every field missing
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the channel id
    pub fn channel(mut self, id: impl Into<String>) -> Self {
        self.channel_id = Some(id.into());
        self
    }

    /// Set the conversation id
    pub fn conversation(mut self, id: impl Into<String>) -> Self {
        self.conversation_id = Some(id.into());
        self
    }

    /// Set the user id
    pub fn user(mut self, id: impl Into<String>) -> Self {
        self.user_id = Some(id.into());
        self
    }
}

/// Which identifiers a piece of state is keyed by
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateScope {
    /// Shared by everyone in a conversation: `{channel}/conversations/{conversation}`
    Conversation,
    /// Follows a user across conversations: `{channel}/users/{user}`
    User,
    /// One user within one conversation:
    /// `{channel}/conversations/{conversation}/users/{user}`
    PrivateConversation,
}

impl StateScope {
    /// Name used in logs
    pub fn name(&self) -> &'static str {
        match self {
            StateScope::Conversation => "ConversationState",
            StateScope::User => "UserState",
            StateScope::PrivateConversation => "PrivateConversationState",
        }
    }

    /// Storage key for `identity` in this scope
    ///
    /// Fails with [`Error::InvalidArgument`] naming the first identifier the
    /// scope needs that is missing or empty.
    pub fn storage_key(&self, identity: &TurnIdentity) -> Result<String> {
        let channel = require(&identity.channel_id, "channelId")?;
        match self {
            StateScope::Conversation => {
                let conversation = require(&identity.conversation_id, "Conversation.Id")?;
                Ok(format!("{channel}/conversations/{conversation}"))
            }
            StateScope::User => {
                let user = require(&identity.user_id, "From.Id")?;
                Ok(format!("{channel}/users/{user}"))
            }
            StateScope::PrivateConversation => {
                let conversation = require(&identity.conversation_id, "Conversation.Id")?;
                let user = require(&identity.user_id, "From.Id")?;
                Ok(format!("{channel}/conversations/{conversation}/users/{user}"))
            }
        }
    }
}

fn require<'a>(value: &'a Option<String>, what: &str) -> Result<&'a str> {
    match value.as_deref() {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(Error::invalid_argument(format!(
            "invalid activity-missing {what}"
        ))),
    }
}

/// Scoped state facade over a shared store
///
/// # Thread Safety
///
/// `BotState` is Clone and Send + Sync whenever the store is. It holds no
/// state of its own.
pub struct BotState<S> {
    storage: Arc<S>,
    scope: StateScope,
}

impl<S> Clone for BotState<S> {
    fn clone(&self) -> Self {
        Self {
            storage: Arc::clone(&self.storage),
            scope: self.scope,
        }
    }
}

impl<S: Storage> BotState<S> {
    /// Create a facade for `scope`
    pub fn new(storage: Arc<S>, scope: StateScope) -> Self {
        Self { storage, scope }
    }

    /// Conversation-scoped facade
    pub fn conversation(storage: Arc<S>) -> Self {
        Self::new(storage, StateScope::Conversation)
    }

    /// User-scoped facade
    pub fn user(storage: Arc<S>) -> Self {
        Self::new(storage, StateScope::User)
    }

    /// Facade keyed by channel, conversation and user
    pub fn private_conversation(storage: Arc<S>) -> Self {
        Self::new(storage, StateScope::PrivateConversation)
    }

    /// Scope of this facade
    pub fn scope(&self) -> StateScope {
        self.scope
    }

    /// Shared store behind the facade
    pub fn storage(&self) -> &Arc<S> {
        &self.storage
    }

    /// Storage key for `identity`
    pub fn storage_key(&self, identity: &TurnIdentity) -> Result<String> {
        self.scope.storage_key(identity)
    }

    /// Load the state for `identity`, `None` if nothing is stored
    ///
    /// The stored token is injected into object payloads as `eTag`.
    pub fn load<T: DeserializeOwned>(&self, identity: &TurnIdentity) -> Result<Option<T>> {
        let key = self.storage_key(identity)?;
        Ok(self.storage.read::<T>(&[&key])?.remove(&key))
    }

    /// Load version-aware state, handing it the stored token
    pub fn load_item<T: DeserializeOwned + StoreItem>(
        &self,
        identity: &TurnIdentity,
    ) -> Result<Option<T>> {
        let key = self.storage_key(identity)?;
        Ok(self.storage.read_items::<T>(&[&key])?.remove(&key))
    }

    /// Save version-aware state
    ///
    /// Fails with [`Error::Conflict`] when `state` was loaded before another
    /// writer saved.
    pub fn save<T: Serialize + StoreItem>(&self, identity: &TurnIdentity, state: &T) -> Result<()> {
        let key = self.storage_key(identity)?;
        let mut batch = WriteBatch::new();
        batch.put_item(key.as_str(), state)?;
        self.storage.write(batch)?;
        debug!(target: "tagstore::state", scope = self.scope.name(), %key, "state saved");
        Ok(())
    }

    /// Save state without concurrency protection
    pub fn save_unversioned<T: Serialize + ?Sized>(
        &self,
        identity: &TurnIdentity,
        state: &T,
    ) -> Result<()> {
        let key = self.storage_key(identity)?;
        let mut batch = WriteBatch::new();
        batch.put(key.as_str(), state)?;
        self.storage.write(batch)?;
        debug!(target: "tagstore::state", scope = self.scope.name(), %key, "state overwritten");
        Ok(())
    }

    /// Remove the state for `identity`
    pub fn clear(&self, identity: &TurnIdentity) -> Result<()> {
        let key = self.storage_key(identity)?;
        self.storage.delete(&[&key])?;
        debug!(target: "tagstore::state", scope = self.scope.name(), %key, "state cleared");
        Ok(())
    }
}
