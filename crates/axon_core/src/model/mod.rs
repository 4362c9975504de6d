//! Domain model for the folder → note → node/edge hierarchy.
//!
//! # Responsibility
//! - Define the attribute shape of every persisted entity.
//! - Define the typed partial-update payloads and their field whitelists.
//!
//! # Invariants
//! - Identifiers are generated once at creation and never rewritten.
//! - `date_created` is immutable; `last_edited` moves on every update.
//! - Timestamps are epoch milliseconds.

pub mod graph;
pub mod user;
pub mod workspace;
