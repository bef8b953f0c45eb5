//! Graph nodes

use super::property::{PropertyMap, PropertyValue};
use super::types::{Label, NodeId, NodeKey};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A node in the property graph
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,

    /// Labels of this node; the graph layer creates nodes with exactly one
    pub labels: HashSet<Label>,

    pub properties: PropertyMap,

    /// Creation timestamp (Unix milliseconds)
    pub created_at: i64,

    /// Last update timestamp (Unix milliseconds)
    pub updated_at: i64,
}

impl Node {
    pub fn new(id: NodeId, label: impl Into<Label>) -> Self {
        let now = chrono::Utc::now().timestamp_millis();
        let mut labels = HashSet::new();
        labels.insert(label.into());

        Node {
            id,
            labels,
            properties: PropertyMap::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Create a node carrying its key properties
    pub fn with_key(id: NodeId, label: impl Into<Label>, key: &NodeKey) -> Self {
        let mut node = Node::new(id, label);
        for (k, v) in key.parts() {
            node.properties
                .insert(k.clone(), PropertyValue::String(v.clone()));
        }
        node
    }

    pub fn has_label(&self, label: &Label) -> bool {
        self.labels.contains(label)
    }

    pub fn set_property(
        &mut self,
        key: impl Into<String>,
        value: impl Into<PropertyValue>,
    ) -> Option<PropertyValue> {
        let old = self.properties.insert(key.into(), value.into());
        self.touch();
        old
    }

    /// Overwrite every property in `properties`; others are left as they are
    pub fn merge_properties(&mut self, properties: PropertyMap) {
        if properties.is_empty() {
            return;
        }
        self.properties.extend(properties);
        self.touch();
    }

    pub fn get_property(&self, key: &str) -> Option<&PropertyValue> {
        self.properties.get(key)
    }

    /// String property shortcut
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(|v| v.as_str())
    }

    /// Whether every part of `key` is present on this node with the same value
    pub fn matches_key(&self, key: &NodeKey) -> bool {
        key.parts()
            .iter()
            .all(|(k, v)| self.get_str(k) == Some(v.as_str()))
    }

    /// Extract the key over `properties`, if every one is a string property
    pub fn key_for(&self, properties: &[String]) -> Option<NodeKey> {
        let mut parts = Vec::with_capacity(properties.len());
        for p in properties {
            parts.push((p.clone(), self.get_str(p)?.to_string()));
        }
        Some(NodeKey::composite(parts))
    }

    fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().timestamp_millis();
    }
}

impl PartialEq for Node {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Node {}
