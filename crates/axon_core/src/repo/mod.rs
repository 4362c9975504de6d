//! Entity repositories over the key-value store.
//!
//! # Responsibility
//! - Map each entity onto composite keys and store operations.
//! - Enforce parent existence before any child write.
//! - Translate store failures into entity-level errors with context.
//!
//! # Invariants
//! - Created entities get a fresh UUID and `date_created == last_edited`.
//! - After creation, entities change only through partial updates.
//! - Stored attribute maps that do not decode are surfaced, never defaulted.

use crate::store::key::EntityTag;
use crate::store::{Attributes, KvStore, StoreError, UpdateSet};
use log::debug;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod edge_repo;
pub mod folder_repo;
pub mod node_repo;
pub mod note_repo;
pub mod session_repo;
pub mod user_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// One folder whose notes could not be fetched during listing.
#[derive(Debug)]
pub struct ChildFetchFailure {
    pub folder_id: String,
    pub error: RepoError,
}

/// Repository-level error.
#[derive(Debug)]
pub enum RepoError {
    /// Store failure, prefixed by the attempted action.
    Store {
        action: String,
        source: StoreError,
    },
    /// Point lookup, update or delete addressed no record.
    NotFound { entity: EntityTag, id: String },
    /// Parent lookup before a child write failed.
    ParentNotFound {
        entity: EntityTag,
        parent: EntityTag,
        parent_id: String,
        source: StoreError,
    },
    /// Stored attributes do not match the entity shape.
    Decode {
        entity: EntityTag,
        source: serde_json::Error,
    },
    /// Entity could not be converted to an attribute map.
    Encode {
        entity: EntityTag,
        source: serde_json::Error,
    },
    /// Note fetches failed for one or more folders during listing.
    ChildFetch(Vec<ChildFetchFailure>),
    /// A listing worker thread could not be started.
    Worker(std::io::Error),
}

impl RepoError {
    pub(crate) fn store(action: impl Into<String>, source: StoreError) -> Self {
        Self::Store {
            action: action.into(),
            source,
        }
    }

    /// True for errors a caller should report as "does not exist".
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::ParentNotFound { .. })
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store { action, source } => write!(f, "{action} - {source}"),
            Self::NotFound { entity, id } => {
                write!(f, "{entity} not found or already deleted: {id}")
            }
            Self::ParentNotFound {
                entity,
                parent,
                parent_id,
                ..
            } => write!(
                f,
                "could not create {entity}: {parent} `{parent_id}` does not exist"
            ),
            Self::Decode { entity, source } => {
                write!(f, "stored {entity} has an unexpected shape: {source}")
            }
            Self::Encode { entity, source } => write!(f, "could not encode {entity}: {source}"),
            Self::ChildFetch(failures) => {
                write!(f, "could not fetch notes for {} folder(s)", failures.len())?;
                for failure in failures {
                    write!(f, "; {}: {}", failure.folder_id, failure.error)?;
                }
                Ok(())
            }
            Self::Worker(err) => write!(f, "could not start listing worker: {err}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store { source, .. } | Self::ParentNotFound { source, .. } => Some(source),
            Self::Decode { source, .. } | Self::Encode { source, .. } => Some(source),
            Self::ChildFetch(failures) => failures
                .first()
                .map(|failure| &failure.error as &(dyn Error + 'static)),
            Self::Worker(err) => Some(err),
            Self::NotFound { .. } => None,
        }
    }
}

/// Stored shape of one entity type.
pub(crate) trait Entity: Serialize + DeserializeOwned {
    const TAG: EntityTag;
}

impl Entity for crate::model::workspace::Folder {
    const TAG: EntityTag = EntityTag::Folder;
}

impl Entity for crate::model::workspace::Note {
    const TAG: EntityTag = EntityTag::Note;
}

impl Entity for crate::model::graph::Node {
    const TAG: EntityTag = EntityTag::Node;
}

impl Entity for crate::model::graph::Edge {
    const TAG: EntityTag = EntityTag::Edge;
}

impl Entity for crate::model::user::User {
    const TAG: EntityTag = EntityTag::User;
}

/// Generates a new immutable entity identifier.
pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

pub(crate) fn encode<E: Entity>(entity: &E) -> RepoResult<Attributes> {
    match serde_json::to_value(entity) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(RepoError::Encode {
            entity: E::TAG,
            source: <serde_json::Error as serde::ser::Error>::custom("entity is not a map"),
        }),
        Err(source) => Err(RepoError::Encode {
            entity: E::TAG,
            source,
        }),
    }
}

pub(crate) fn decode<E: Entity>(attributes: Attributes) -> RepoResult<E> {
    serde_json::from_value(Value::Object(attributes)).map_err(|source| RepoError::Decode {
        entity: E::TAG,
        source,
    })
}

/// Entity CRUD shared by every repository, bound to one logical table.
pub(crate) struct Records<'s, S: KvStore + ?Sized> {
    store: &'s S,
    table: &'s str,
}

impl<'s, S: KvStore + ?Sized> Records<'s, S> {
    pub(crate) fn new(store: &'s S, table: &'s str) -> Self {
        Self { store, table }
    }

    pub(crate) fn insert<E: Entity>(
        &self,
        partition_key: &str,
        id: &str,
        entity: &E,
    ) -> RepoResult<()> {
        let attributes = encode(entity)?;
        self.store
            .put(self.table, partition_key, id, attributes)
            .map_err(|source| RepoError::store(format!("could not create {}", E::TAG), source))?;
        debug!(
            "event=entity_create module=repo status=ok entity={} id={id}",
            E::TAG
        );
        Ok(())
    }

    pub(crate) fn find<E: Entity>(&self, partition_key: &str, id: &str) -> RepoResult<E> {
        let item = self
            .store
            .get(self.table, partition_key, Some(id))
            .map_err(|source| match source {
                StoreError::NotFound { .. } => RepoError::NotFound {
                    entity: E::TAG,
                    id: id.to_string(),
                },
                other => RepoError::store(format!("could not fetch {}", E::TAG), other),
            })?;
        decode(item.attributes)
    }

    pub(crate) fn list<E: Entity>(&self, partition_key: &str) -> RepoResult<Vec<E>> {
        let items = self
            .store
            .scan_partition(self.table, partition_key)
            .map_err(|source| RepoError::store(format!("could not fetch {}s", E::TAG), source))?;
        items
            .into_iter()
            .map(|item| decode(item.attributes))
            .collect()
    }

    pub(crate) fn update(
        &self,
        entity: EntityTag,
        partition_key: &str,
        id: &str,
        changes: &UpdateSet,
    ) -> RepoResult<String> {
        self.store
            .update(self.table, partition_key, id, changes)
            .map_err(|source| match source {
                StoreError::NotFound { .. } => RepoError::NotFound {
                    entity,
                    id: id.to_string(),
                },
                other => RepoError::store(format!("could not update {entity}"), other),
            })?;
        Ok(id.to_string())
    }

    pub(crate) fn remove(
        &self,
        entity: EntityTag,
        partition_key: &str,
        id: &str,
    ) -> RepoResult<String> {
        self.store
            .delete(self.table, partition_key, Some(id))
            .map_err(|source| match source {
                StoreError::NotFound { .. } => RepoError::NotFound {
                    entity,
                    id: id.to_string(),
                },
                other => RepoError::store(format!("could not delete {entity}"), other),
            })?;
        debug!("event=entity_delete module=repo status=ok entity={entity} id={id}");
        Ok(id.to_string())
    }

    /// Fails with `ParentNotFound` unless the parent record can be read.
    pub(crate) fn require_parent(
        &self,
        entity: EntityTag,
        parent: EntityTag,
        partition_key: &str,
        parent_id: &str,
    ) -> RepoResult<()> {
        self.store
            .get(self.table, partition_key, Some(parent_id))
            .map(|_| ())
            .map_err(|source| RepoError::ParentNotFound {
                entity,
                parent,
                parent_id: parent_id.to_string(),
                source,
            })
    }
}
