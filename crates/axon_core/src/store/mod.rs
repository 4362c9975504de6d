//! Entity-agnostic key-value store contract and backends.
//!
//! # Responsibility
//! - Define the `KvStore` operations every repository builds on.
//! - Provide a SQLite-backed store and an in-memory store with the same
//!   observable semantics.
//!
//! # Invariants
//! - Items are addressed by `(table, partition_key, sort_key)`.
//! - Partition scans return newest `date_created` first.
//! - Items whose `ttl` (epoch seconds) has passed are never returned.
//! - `update` never creates an item and never accepts an empty change set.

use crate::db::DbError;
use serde_json::{Map, Value};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::{SystemTime, UNIX_EPOCH};

pub mod key;
mod memory;
mod sqlite;
pub mod update;

pub use memory::MemoryKvStore;
pub use sqlite::SqliteKvStore;
pub use update::{UpdateBuilder, UpdateSet, UpdateValue, UpdatableField, ZeroValuePolicy};

/// Attribute name backing the creation-time secondary index.
pub const DATE_CREATED_ATTRIBUTE: &str = "date_created";
/// Attribute name for the modification timestamp.
pub const LAST_EDITED_ATTRIBUTE: &str = "last_edited";
/// Attribute name for expiry, in epoch seconds.
pub const TTL_ATTRIBUTE: &str = "ttl";

/// Sort key used for singleton records addressed without a sort key.
pub const SINGLETON_SORT_KEY: &str = "";

/// Opaque attribute map of one item.
pub type Attributes = Map<String, Value>;

pub type StoreResult<T> = Result<T, StoreError>;

/// One stored item.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredItem {
    pub partition_key: String,
    pub sort_key: String,
    pub attributes: Attributes,
}

/// Errors raised by store backends.
#[derive(Debug)]
pub enum StoreError {
    /// The backend could not be opened.
    Connection(DbError),
    /// No live item exists at the addressed key.
    NotFound {
        partition_key: String,
        sort_key: String,
    },
    /// An update was issued without any attribute to set.
    EmptyUpdate,
    /// Persisted item content is not a valid attribute map.
    InvalidRecord(String),
    /// Any other backend failure.
    Transport(DbError),
}

impl StoreError {
    pub(crate) fn not_found(partition_key: &str, sort_key: &str) -> Self {
        Self::NotFound {
            partition_key: partition_key.to_string(),
            sort_key: sort_key.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Connection(err) => write!(f, "could not connect to store: {err}"),
            Self::NotFound {
                partition_key,
                sort_key,
            } => write!(f, "item not found: `{partition_key}` / `{sort_key}`"),
            Self::EmptyUpdate => write!(f, "update attributes cannot be empty"),
            Self::InvalidRecord(message) => write!(f, "invalid stored item: {message}"),
            Self::Transport(err) => write!(f, "{err}"),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Connection(err) | Self::Transport(err) => Some(err),
            Self::NotFound { .. } | Self::EmptyUpdate | Self::InvalidRecord(_) => None,
        }
    }
}

impl From<DbError> for StoreError {
    fn from(value: DbError) -> Self {
        Self::Transport(value)
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Transport(DbError::Sqlite(value))
    }
}

/// Key-value operations consumed by repositories.
///
/// Implementations must be shareable across threads: folder listing fans out
/// one partition scan per folder.
pub trait KvStore: Send + Sync {
    /// Point lookup. `sort_key = None` addresses the partition's singleton.
    fn get(&self, table: &str, partition_key: &str, sort_key: Option<&str>)
        -> StoreResult<StoredItem>;

    /// All live items of a partition, newest `date_created` first.
    fn scan_partition(&self, table: &str, partition_key: &str) -> StoreResult<Vec<StoredItem>>;

    /// Full-record upsert.
    fn put(
        &self,
        table: &str,
        partition_key: &str,
        sort_key: &str,
        attributes: Attributes,
    ) -> StoreResult<()>;

    /// Upsert that expires `ttl_seconds` from now.
    fn put_with_ttl(
        &self,
        table: &str,
        partition_key: &str,
        sort_key: &str,
        mut attributes: Attributes,
        ttl_seconds: i64,
    ) -> StoreResult<()> {
        let expires_at = epoch_seconds().saturating_add(ttl_seconds);
        attributes.insert(TTL_ATTRIBUTE.to_string(), Value::from(expires_at));
        self.put(table, partition_key, sort_key, attributes)
    }

    /// Point delete; fails with `NotFound` when nothing is stored there.
    fn delete(&self, table: &str, partition_key: &str, sort_key: Option<&str>)
        -> StoreResult<()>;

    /// Sets every attribute in `changes` on one existing item atomically.
    fn update(
        &self,
        table: &str,
        partition_key: &str,
        sort_key: &str,
        changes: &UpdateSet,
    ) -> StoreResult<()>;

    /// Physically removes expired items and returns how many were dropped.
    fn purge_expired(&self) -> StoreResult<usize>;
}

/// Current time in epoch milliseconds.
pub fn epoch_millis() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
}

/// Current time in epoch seconds.
pub fn epoch_seconds() -> i64 {
    epoch_millis() / 1000
}

fn resolve_sort_key(sort_key: Option<&str>) -> &str {
    sort_key.unwrap_or(SINGLETON_SORT_KEY)
}

fn date_created_of(attributes: &Attributes) -> Option<i64> {
    attributes.get(DATE_CREATED_ATTRIBUTE).and_then(Value::as_i64)
}

fn expires_at_of(attributes: &Attributes) -> Option<i64> {
    attributes.get(TTL_ATTRIBUTE).and_then(Value::as_i64)
}

fn is_expired(expires_at: Option<i64>, now_seconds: i64) -> bool {
    expires_at.is_some_and(|deadline| deadline <= now_seconds)
}
