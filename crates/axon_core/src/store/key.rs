//! Composite partition/sort key construction.
//!
//! Partition keys have the persisted format `{TAG}#{owner}[#{ancestor}]*`.
//! Owners are emails or session ids and ancestors are generated UUIDs, so the
//! delimiter never appears inside a segment and distinct paths never collide.

use std::fmt::{Display, Formatter};

/// Segment delimiter inside partition keys.
pub const KEY_DELIMITER: char = '#';

/// Entity type tag, the first segment of every partition key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityTag {
    Folder,
    Note,
    Node,
    Edge,
    User,
    Session,
}

impl EntityTag {
    pub const ALL: [EntityTag; 6] = [
        Self::Folder,
        Self::Note,
        Self::Node,
        Self::Edge,
        Self::User,
        Self::Session,
    ];

    /// Tag text as persisted in partition keys.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Folder => "FOLDER",
            Self::Note => "NOTE",
            Self::Node => "NODE",
            Self::Edge => "EDGE",
            Self::User => "USER",
            Self::Session => "SESSION",
        }
    }

    /// Lowercase entity name used in messages.
    pub fn noun(self) -> &'static str {
        match self {
            Self::Folder => "folder",
            Self::Note => "note",
            Self::Node => "node",
            Self::Edge => "edge",
            Self::User => "user",
            Self::Session => "session",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|tag| tag.as_str() == value)
    }
}

impl Display for EntityTag {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.noun())
    }
}

/// Builds the partition key for `tag`, `owner` and the ancestor path.
pub fn partition_key(tag: EntityTag, owner: &str, ancestors: &[&str]) -> String {
    let capacity = tag.as_str().len()
        + 1
        + owner.len()
        + ancestors.iter().map(|id| id.len() + 1).sum::<usize>();
    let mut key = String::with_capacity(capacity);
    key.push_str(tag.as_str());
    key.push(KEY_DELIMITER);
    key.push_str(owner);
    for ancestor in ancestors {
        key.push(KEY_DELIMITER);
        key.push_str(ancestor);
    }
    key
}

/// Decoded form of a partition key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedKey {
    pub tag: EntityTag,
    pub owner: String,
    pub ancestors: Vec<String>,
}

/// Parses a partition key built by [`partition_key`].
///
/// Returns `None` for unknown tags or keys without an owner segment.
pub fn parse_partition_key(key: &str) -> Option<ParsedKey> {
    let mut segments = key.split(KEY_DELIMITER);
    let tag = EntityTag::parse(segments.next()?)?;
    let owner = segments.next().filter(|owner| !owner.is_empty())?;
    Some(ParsedKey {
        tag,
        owner: owner.to_string(),
        ancestors: segments.map(str::to_string).collect(),
    })
}

pub fn folder_partition(email: &str) -> String {
    partition_key(EntityTag::Folder, email, &[])
}

pub fn note_partition(email: &str, folder_id: &str) -> String {
    partition_key(EntityTag::Note, email, &[folder_id])
}

pub fn node_partition(email: &str, folder_id: &str, note_id: &str) -> String {
    partition_key(EntityTag::Node, email, &[folder_id, note_id])
}

pub fn edge_partition(email: &str, folder_id: &str, note_id: &str) -> String {
    partition_key(EntityTag::Edge, email, &[folder_id, note_id])
}

pub fn user_partition(email: &str) -> String {
    partition_key(EntityTag::User, email, &[])
}

pub fn session_partition(session_id: &str) -> String {
    partition_key(EntityTag::Session, session_id, &[])
}
