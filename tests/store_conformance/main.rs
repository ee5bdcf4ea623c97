//! Store Conformance Test Suite
//!
//! Every behaviour of the storage contract is checked against both store
//! variants through the `Storage` trait, plus the facades built on top.
//!
//! ## Modules
//!
//! - **contract**: read/write/delete semantics and token rules
//! - **isolation**: batch atomicity under concurrent readers and writers
//! - **async_facade**: the same contract through `AsyncStore`
//! - **state_facade**: scoped state keys and optimistic saves
//! - **options**: TOML configuration flowing into store behaviour
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test store_conformance
//! ```


mod contract;
mod isolation;
