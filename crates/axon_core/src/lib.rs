//! Core data-access layer for Axon workspaces.
//! Folders, notes and their node/edge graphs live in one key-value table;
//! this crate owns the key layout and every write path into it.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;
pub mod store;

pub use config::{ChildFetchPolicy, CoreConfig};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::graph::{Edge, EdgeChanges, NewEdge, Node, NodeChanges, NodeData, Position};
pub use model::user::{IdentityProfile, OwnerContext, SessionData, User};
pub use model::workspace::{
    Folder, FolderChanges, FolderWithNotes, Note, NoteChanges, NoteDetail,
};
pub use repo::edge_repo::EdgeRepository;
pub use repo::folder_repo::FolderRepository;
pub use repo::node_repo::NodeRepository;
pub use repo::note_repo::NoteRepository;
pub use repo::session_repo::SessionRepository;
pub use repo::user_repo::UserRepository;
pub use repo::{ChildFetchFailure, RepoError, RepoResult};
pub use service::auth_service::{AuthError, AuthService, IdentityError, IdentityProvider};
pub use store::{
    KvStore, MemoryKvStore, SqliteKvStore, StoreError, StoreResult, StoredItem, ZeroValuePolicy,
};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
