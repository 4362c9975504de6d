//! Edge repository.
//!
//! # Invariants
//! - Edges live in partition `EDGE#{email}#{folder_id}#{note_id}`.
//! - The parent note is read before any edge write.
//! - `source_id`/`target_id` are stored as given; node existence is not
//!   checked.

use crate::config::CoreConfig;
use crate::model::graph::{Edge, EdgeChanges, NewEdge};
use crate::model::user::OwnerContext;
use crate::repo::{new_id, Records, RepoResult};
use crate::store::key::{edge_partition, note_partition, EntityTag};
use crate::store::{epoch_millis, KvStore};

pub struct EdgeRepository<'s, S: KvStore + ?Sized> {
    store: &'s S,
    config: &'s CoreConfig,
    owner: OwnerContext,
}

impl<'s, S: KvStore + ?Sized> EdgeRepository<'s, S> {
    pub fn new(store: &'s S, config: &'s CoreConfig, owner: OwnerContext) -> Self {
        Self {
            store,
            config,
            owner,
        }
    }

    fn records(&self) -> Records<'s, S> {
        Records::new(self.store, self.config.table.as_str())
    }

    fn partition(&self, folder_id: &str, note_id: &str) -> String {
        edge_partition(&self.owner.email, folder_id, note_id)
    }

    pub fn create(&self, folder_id: &str, note_id: &str, new_edge: NewEdge) -> RepoResult<Edge> {
        let records = self.records();
        records.require_parent(
            EntityTag::Edge,
            EntityTag::Note,
            &note_partition(&self.owner.email, folder_id),
            note_id,
        )?;

        let now = epoch_millis();
        let edge = Edge {
            user_id: self.owner.user_id.clone(),
            folder_id: folder_id.to_string(),
            note_id: note_id.to_string(),
            edge_id: new_id(),
            source_id: new_edge.source_id,
            target_id: new_edge.target_id,
            animated: new_edge.animated,
            label: new_edge.label,
            edge_type: new_edge.edge_type,
            date_created: now,
            last_edited: now,
        };
        records.insert(&self.partition(folder_id, note_id), &edge.edge_id, &edge)?;
        Ok(edge)
    }

    pub fn find(&self, folder_id: &str, note_id: &str, edge_id: &str) -> RepoResult<Edge> {
        self.records()
            .find(&self.partition(folder_id, note_id), edge_id)
    }

    pub fn list(&self, folder_id: &str, note_id: &str) -> RepoResult<Vec<Edge>> {
        self.records().list(&self.partition(folder_id, note_id))
    }

    pub fn update(
        &self,
        folder_id: &str,
        note_id: &str,
        edge_id: &str,
        changes: EdgeChanges,
    ) -> RepoResult<String> {
        let update = changes.into_update(self.config.zero_values, epoch_millis());
        self.records().update(
            EntityTag::Edge,
            &self.partition(folder_id, note_id),
            edge_id,
            &update,
        )
    }

    pub fn delete(&self, folder_id: &str, note_id: &str, edge_id: &str) -> RepoResult<String> {
        self.records()
            .remove(EntityTag::Edge, &self.partition(folder_id, note_id), edge_id)
    }
}
