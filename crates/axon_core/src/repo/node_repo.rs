//! Node repository.
//!
//! # Invariants
//! - Nodes live in partition `NODE#{email}#{folder_id}#{note_id}`.
//! - The parent note is read before any node write; a missing note aborts
//!   creation without writing.

use crate::config::CoreConfig;
use crate::model::graph::{Node, NodeChanges, NodeContent, NodeData, NodeStyles, Position};
use crate::model::user::OwnerContext;
use crate::repo::{new_id, Records, RepoResult};
use crate::store::key::{node_partition, note_partition, EntityTag};
use crate::store::{epoch_millis, KvStore};

pub struct NodeRepository<'s, S: KvStore + ?Sized> {
    store: &'s S,
    config: &'s CoreConfig,
    owner: OwnerContext,
}

impl<'s, S: KvStore + ?Sized> NodeRepository<'s, S> {
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
        node_partition(&self.owner.email, folder_id, note_id)
    }

    /// Creates a node with empty content and styles.
    pub fn create(
        &self,
        folder_id: &str,
        note_id: &str,
        data: NodeData,
        position: Position,
    ) -> RepoResult<Node> {
        let records = self.records();
        records.require_parent(
            EntityTag::Node,
            EntityTag::Note,
            &note_partition(&self.owner.email, folder_id),
            note_id,
        )?;

        let now = epoch_millis();
        let node = Node {
            user_id: self.owner.user_id.clone(),
            folder_id: folder_id.to_string(),
            note_id: note_id.to_string(),
            node_id: new_id(),
            data,
            position,
            content: NodeContent::default(),
            styles: NodeStyles::default(),
            date_created: now,
            last_edited: now,
        };
        records.insert(&self.partition(folder_id, note_id), &node.node_id, &node)?;
        Ok(node)
    }

    pub fn find(&self, folder_id: &str, note_id: &str, node_id: &str) -> RepoResult<Node> {
        self.records()
            .find(&self.partition(folder_id, note_id), node_id)
    }

    pub fn list(&self, folder_id: &str, note_id: &str) -> RepoResult<Vec<Node>> {
        self.records().list(&self.partition(folder_id, note_id))
    }

    pub fn update(
        &self,
        folder_id: &str,
        note_id: &str,
        node_id: &str,
        changes: NodeChanges,
    ) -> RepoResult<String> {
        let update = changes.into_update(self.config.zero_values, epoch_millis());
        self.records().update(
            EntityTag::Node,
            &self.partition(folder_id, note_id),
            node_id,
            &update,
        )
    }

    pub fn delete(&self, folder_id: &str, note_id: &str, node_id: &str) -> RepoResult<String> {
        self.records()
            .remove(EntityTag::Node, &self.partition(folder_id, note_id), node_id)
    }
}
