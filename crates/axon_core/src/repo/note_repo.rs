//! Note repository.
//!
//! # Invariants
//! - Notes live in partition `NOTE#{email}#{folder_id}`.
//! - A note is only created under an existing folder.

use crate::config::CoreConfig;
use crate::model::graph::{Edge, Node};
use crate::model::user::OwnerContext;
use crate::model::workspace::{Note, NoteChanges, NoteDetail};
use crate::repo::{new_id, Records, RepoResult};
use crate::store::key::{edge_partition, folder_partition, node_partition, note_partition, EntityTag};
use crate::store::{epoch_millis, KvStore};

pub struct NoteRepository<'s, S: KvStore + ?Sized> {
    store: &'s S,
    config: &'s CoreConfig,
    owner: OwnerContext,
}

impl<'s, S: KvStore + ?Sized> NoteRepository<'s, S> {
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

    pub fn create(&self, folder_id: &str, note_name: &str, description: &str) -> RepoResult<Note> {
        let records = self.records();
        records.require_parent(
            EntityTag::Note,
            EntityTag::Folder,
            &folder_partition(&self.owner.email),
            folder_id,
        )?;

        let now = epoch_millis();
        let note = Note {
            user_id: self.owner.user_id.clone(),
            folder_id: folder_id.to_string(),
            note_id: new_id(),
            note_name: note_name.to_string(),
            description: description.to_string(),
            date_created: now,
            last_edited: now,
        };
        records.insert(
            &note_partition(&self.owner.email, folder_id),
            &note.note_id,
            &note,
        )?;
        Ok(note)
    }

    pub fn find(&self, folder_id: &str, note_id: &str) -> RepoResult<Note> {
        self.records()
            .find(&note_partition(&self.owner.email, folder_id), note_id)
    }

    /// Notes of one folder, newest first.
    pub fn list(&self, folder_id: &str) -> RepoResult<Vec<Note>> {
        self.records()
            .list(&note_partition(&self.owner.email, folder_id))
    }

    /// The note together with all of its nodes and edges.
    pub fn detail(&self, folder_id: &str, note_id: &str) -> RepoResult<NoteDetail> {
        let records = self.records();
        let email = self.owner.email.as_str();
        let note = self.find(folder_id, note_id)?;
        let nodes: Vec<Node> = records.list(&node_partition(email, folder_id, note_id))?;
        let edges: Vec<Edge> = records.list(&edge_partition(email, folder_id, note_id))?;
        Ok(NoteDetail { note, nodes, edges })
    }

    pub fn update(
        &self,
        folder_id: &str,
        note_id: &str,
        changes: NoteChanges,
    ) -> RepoResult<String> {
        let update = changes.into_update(self.config.zero_values, epoch_millis());
        self.records().update(
            EntityTag::Note,
            &note_partition(&self.owner.email, folder_id),
            note_id,
            &update,
        )
    }

    pub fn delete(&self, folder_id: &str, note_id: &str) -> RepoResult<String> {
        self.records().remove(
            EntityTag::Note,
            &note_partition(&self.owner.email, folder_id),
            note_id,
        )
    }
}
