//! Primitives layer for tagstore
//!
//! High-level facades built on the [`tagstore_core::Storage`] contract:
//! - Scoped state: per-conversation, per-user and per-user-in-conversation
//!   values keyed from the identifiers of a turn
//!
//! All primitives are stateless facades over a shared store.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod state;

pub use state::{BotState, StateScope, TurnIdentity};
