//! Folder and note entities.

use crate::store::{UpdateBuilder, UpdateSet, UpdatableField, ZeroValuePolicy};
use serde::{Deserialize, Serialize};

use super::graph::{Edge, Node};

/// Top-level grouping owned by one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Folder {
    pub user_id: String,
    pub folder_id: String,
    pub folder_name: String,
    pub date_created: i64,
    pub last_edited: i64,
}

/// Mind-map document inside one folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Note {
    pub user_id: String,
    pub folder_id: String,
    pub note_id: String,
    pub note_name: String,
    pub description: String,
    pub date_created: i64,
    pub last_edited: i64,
}

/// Folder listing entry enriched with its notes, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FolderWithNotes {
    #[serde(flatten)]
    pub folder: Folder,
    pub notes: Vec<Note>,
}

/// Note with its whole graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoteDetail {
    #[serde(flatten)]
    pub note: Note,
    pub nodes: Vec<Node>,
    pub edges: Vec<Edge>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FolderField {
    FolderName,
}

impl UpdatableField for FolderField {
    fn path(self) -> &'static str {
        match self {
            Self::FolderName => "folder_name",
        }
    }
}

/// Requested folder changes; `None` leaves the attribute untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FolderChanges {
    pub folder_name: Option<String>,
}

impl FolderChanges {
    pub fn into_update(self, policy: ZeroValuePolicy, now_ms: i64) -> UpdateSet {
        UpdateBuilder::new(policy)
            .set(FolderField::FolderName, self.folder_name)
            .finish(now_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteField {
    NoteName,
    Description,
}

impl UpdatableField for NoteField {
    fn path(self) -> &'static str {
        match self {
            Self::NoteName => "note_name",
            Self::Description => "description",
        }
    }
}

/// Requested note changes; `None` leaves the attribute untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NoteChanges {
    pub note_name: Option<String>,
    pub description: Option<String>,
}

impl NoteChanges {
    pub fn into_update(self, policy: ZeroValuePolicy, now_ms: i64) -> UpdateSet {
        UpdateBuilder::new(policy)
            .set(NoteField::NoteName, self.note_name)
            .set(NoteField::Description, self.description)
            .finish(now_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn note_changes_write_only_supplied_fields() {
        let set = NoteChanges {
            description: Some("about".to_string()),
            ..NoteChanges::default()
        }
        .into_update(ZeroValuePolicy::Skip, 10);
        assert_eq!(set.paths(), vec!["description", "last_edited"]);
    }

    #[test]
    fn empty_folder_changes_still_stamp_last_edited() {
        let set = FolderChanges::default().into_update(ZeroValuePolicy::Write, 10);
        assert_eq!(set.paths(), vec!["last_edited"]);
    }
}
