//! Node and edge entities of a note's mind-map graph.

use crate::store::{UpdateBuilder, UpdateSet, UpdatableField, ZeroValuePolicy};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Free-form style attributes rendered by clients.
pub type StyleMap = Map<String, Value>;

/// User-facing node text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeData {
    pub label: String,
    pub title: String,
    pub description: String,
    pub node_category: String,
}

/// Canvas position reported by the client.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeContent {
    pub markdown: String,
}

/// Three independently replaceable style maps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeStyles {
    pub background_styles: StyleMap,
    pub label_styles: StyleMap,
    pub description_styles: StyleMap,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub user_id: String,
    pub folder_id: String,
    pub note_id: String,
    pub node_id: String,
    pub data: NodeData,
    pub position: Position,
    pub content: NodeContent,
    pub styles: NodeStyles,
    pub date_created: i64,
    pub last_edited: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Edge {
    pub user_id: String,
    pub folder_id: String,
    pub note_id: String,
    pub edge_id: String,
    pub source_id: String,
    pub target_id: String,
    pub animated: bool,
    pub label: String,
    pub edge_type: String,
    pub date_created: i64,
    pub last_edited: i64,
}

/// Client-supplied attributes of a new edge.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewEdge {
    pub source_id: String,
    pub target_id: String,
    pub animated: bool,
    pub label: String,
    pub edge_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeField {
    Label,
    Title,
    Description,
    NodeCategory,
    X,
    Y,
    Markdown,
    BackgroundStyles,
    LabelStyles,
    DescriptionStyles,
}

impl UpdatableField for NodeField {
    fn path(self) -> &'static str {
        match self {
            Self::Label => "data.label",
            Self::Title => "data.title",
            Self::Description => "data.description",
            Self::NodeCategory => "data.node_category",
            Self::X => "position.x",
            Self::Y => "position.y",
            Self::Markdown => "content.markdown",
            Self::BackgroundStyles => "styles.background_styles",
            Self::LabelStyles => "styles.label_styles",
            Self::DescriptionStyles => "styles.description_styles",
        }
    }
}

/// Requested node changes; `None` leaves the attribute untouched.
///
/// Style maps replace the stored map as a whole.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodeChanges {
    pub label: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub node_category: Option<String>,
    pub x: Option<i64>,
    pub y: Option<i64>,
    pub markdown: Option<String>,
    pub background_styles: Option<StyleMap>,
    pub label_styles: Option<StyleMap>,
    pub description_styles: Option<StyleMap>,
}

impl NodeChanges {
    pub fn into_update(self, policy: ZeroValuePolicy, now_ms: i64) -> UpdateSet {
        UpdateBuilder::new(policy)
            .set(NodeField::Label, self.label)
            .set(NodeField::Title, self.title)
            .set(NodeField::Description, self.description)
            .set(NodeField::NodeCategory, self.node_category)
            .set(NodeField::X, self.x)
            .set(NodeField::Y, self.y)
            .set(NodeField::Markdown, self.markdown)
            .set(NodeField::BackgroundStyles, self.background_styles)
            .set(NodeField::LabelStyles, self.label_styles)
            .set(NodeField::DescriptionStyles, self.description_styles)
            .finish(now_ms)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeField {
    SourceId,
    TargetId,
    Animated,
    Label,
    EdgeType,
}

impl UpdatableField for EdgeField {
    fn path(self) -> &'static str {
        match self {
            Self::SourceId => "source_id",
            Self::TargetId => "target_id",
            Self::Animated => "animated",
            Self::Label => "label",
            Self::EdgeType => "edge_type",
        }
    }
}

/// Requested edge changes; `None` leaves the attribute untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EdgeChanges {
    pub source_id: Option<String>,
    pub target_id: Option<String>,
    pub animated: Option<bool>,
    pub label: Option<String>,
    pub edge_type: Option<String>,
}

impl EdgeChanges {
    pub fn into_update(self, policy: ZeroValuePolicy, now_ms: i64) -> UpdateSet {
        UpdateBuilder::new(policy)
            .set(EdgeField::SourceId, self.source_id)
            .set(EdgeField::TargetId, self.target_id)
            .set(EdgeField::Animated, self.animated)
            .set(EdgeField::Label, self.label)
            .set(EdgeField::EdgeType, self.edge_type)
            .finish(now_ms)
    }
}
