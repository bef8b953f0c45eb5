//! Social graph schema: node labels, relations, natural keys and the normalized post
//!
//! ```text
//! (:Post)-[:POSTED_IN]->(:Subreddit)
//! (:Post)-[:AUTHORED_BY]->(:Author)
//! (:Post)-[:DISCUSSES]->(:Topic)
//! (:Post)-[:CONTAINS]->(:Entity)
//! (:Author)-[:INTERACTS_WITH]->(:Author)
//! ```

use crate::extract::{Entity, EntityKind};
use crate::graph::{EdgeType, Label, NodeKey, PropertyMap, PropertyValue};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Node labels of the social graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeLabel {
    Post,
    Author,
    Subreddit,
    Topic,
    Entity,
}

impl NodeLabel {
    pub const ALL: [NodeLabel; 5] = [
        NodeLabel::Post,
        NodeLabel::Author,
        NodeLabel::Subreddit,
        NodeLabel::Topic,
        NodeLabel::Entity,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeLabel::Post => "Post",
            NodeLabel::Author => "Author",
            NodeLabel::Subreddit => "Subreddit",
            NodeLabel::Topic => "Topic",
            NodeLabel::Entity => "Entity",
        }
    }

    /// Properties forming the unique key of this label
    pub fn key_properties(&self) -> &'static [&'static str] {
        match self {
            NodeLabel::Post => &["id"],
            NodeLabel::Author | NodeLabel::Subreddit | NodeLabel::Topic => &["name"],
            NodeLabel::Entity => &["type", "value"],
        }
    }

    pub fn label(&self) -> Label {
        Label::new(self.as_str())
    }
}

impl fmt::Display for NodeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship types of the social graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Relation {
    PostedIn,
    AuthoredBy,
    Discusses,
    Contains,
    InteractsWith,
}

impl Relation {
    pub const ALL: [Relation; 5] = [
        Relation::PostedIn,
        Relation::AuthoredBy,
        Relation::Discusses,
        Relation::Contains,
        Relation::InteractsWith,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Relation::PostedIn => "POSTED_IN",
            Relation::AuthoredBy => "AUTHORED_BY",
            Relation::Discusses => "DISCUSSES",
            Relation::Contains => "CONTAINS",
            Relation::InteractsWith => "INTERACTS_WITH",
        }
    }

    pub fn edge_type(&self) -> EdgeType {
        EdgeType::new(self.as_str())
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reference to a node by label and natural key
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NodeRef {
    pub label: NodeLabel,
    pub key: NodeKey,
}

impl NodeRef {
    pub fn post(id: impl Into<String>) -> Self {
        NodeRef {
            label: NodeLabel::Post,
            key: NodeKey::single("id", id),
        }
    }

    pub fn author(name: impl Into<String>) -> Self {
        NodeRef {
            label: NodeLabel::Author,
            key: NodeKey::single("name", name),
        }
    }

    pub fn subreddit(name: impl Into<String>) -> Self {
        NodeRef {
            label: NodeLabel::Subreddit,
            key: NodeKey::single("name", name),
        }
    }

    pub fn topic(name: impl Into<String>) -> Self {
        NodeRef {
            label: NodeLabel::Topic,
            key: NodeKey::single("name", name),
        }
    }

    pub fn entity(kind: EntityKind, value: impl Into<String>) -> Self {
        NodeRef {
            label: NodeLabel::Entity,
            key: NodeKey::composite([("type", kind.as_str().to_string()), ("value", value.into())]),
        }
    }

    pub fn from_entity(entity: &Entity) -> Self {
        Self::entity(entity.kind, entity.value.clone())
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(:{} {})", self.label, self.key)
    }
}

/// A validated, normalized post ready to be written to the graph
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: String,
    pub title: String,
    pub selftext: String,
    /// Creation time, epoch seconds
    pub created_utc: i64,
    pub score: i64,
    pub num_comments: i64,
    pub upvote_ratio: f64,
    pub subreddit: Option<String>,
    pub author: Option<String>,
}

impl PostRecord {
    /// Scalar attributes written on every upsert (the key `id` excluded)
    pub fn properties(&self) -> PropertyMap {
        let mut props = PropertyMap::new();
        props.insert("title".to_string(), PropertyValue::String(self.title.clone()));
        props.insert("selftext".to_string(), PropertyValue::String(self.selftext.clone()));
        props.insert("created_utc".to_string(), PropertyValue::Integer(self.created_utc));
        props.insert("score".to_string(), PropertyValue::Integer(self.score));
        props.insert("num_comments".to_string(), PropertyValue::Integer(self.num_comments));
        props.insert("upvote_ratio".to_string(), PropertyValue::Float(self.upvote_ratio));
        props
    }

    /// Whether there is any text to extract features from
    pub fn has_text(&self) -> bool {
        !self.title.is_empty() || !self.selftext.is_empty()
    }

    /// Title and body joined by a space
    pub fn text(&self) -> String {
        format!("{} {}", self.title, self.selftext)
    }
}
