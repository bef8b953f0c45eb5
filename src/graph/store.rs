//! In-memory graph storage with uniqueness constraints and merge primitives
//!
//! The store is an arena of nodes and edges addressed by id, plus:
//! - adjacency lists (outgoing / incoming) per node
//! - a label index and an edge-type index
//! - per-label uniqueness constraints with a key index backing `merge_node`
//! - a `(source, type, target)` index backing `merge_edge`
//!
//! Every write is a single `&mut self` call, so a caller holding the store behind a
//! lock gets atomic upserts for free.

use super::edge::Edge;
use super::node::Node;
use super::property::PropertyMap;
use super::types::{EdgeId, EdgeType, Label, NodeId, NodeKey};
use rustc_hash::FxHashMap;
use std::collections::{HashMap, HashSet};
use thiserror::Error;

/// Errors that can occur during graph operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GraphError {
    #[error("Node {0} not found")]
    NodeNotFound(NodeId),

    #[error("Node {0} already exists")]
    NodeAlreadyExists(NodeId),

    #[error("Edge {0} already exists")]
    EdgeAlreadyExists(EdgeId),

    #[error("Invalid edge: source node {0} does not exist")]
    InvalidEdgeSource(NodeId),

    #[error("Invalid edge: target node {0} does not exist")]
    InvalidEdgeTarget(NodeId),

    #[error("Uniqueness constraint on :{label} violated by key {key}")]
    ConstraintViolation { label: Label, key: NodeKey },

    #[error("Label :{label} already constrained on ({existing})")]
    ConstraintMismatch { label: Label, existing: String },

    #[error("Node key must have at least one property")]
    EmptyKey,
}

pub type GraphResult<T> = Result<T, GraphError>;

/// In-memory graph storage
#[derive(Debug)]
pub struct GraphStore {
    /// Node arena indexed by `NodeId`; slot 0 is never used
    nodes: Vec<Option<Node>>,

    /// Edge arena indexed by `EdgeId`
    edges: Vec<Option<Edge>>,

    outgoing: Vec<Vec<EdgeId>>,
    incoming: Vec<Vec<EdgeId>>,

    label_index: HashMap<Label, HashSet<NodeId>>,
    edge_type_index: HashMap<EdgeType, HashSet<EdgeId>>,

    /// Label -> key properties (in key order)
    constraints: HashMap<Label, Vec<String>>,

    /// (label, key) -> node, for constrained labels only
    key_index: FxHashMap<(Label, NodeKey), NodeId>,

    /// (source, type, target) -> first edge with that signature
    edge_index: FxHashMap<(NodeId, EdgeType, NodeId), EdgeId>,

    node_count: usize,
    edge_count: usize,

    next_node_id: u64,
    next_edge_id: u64,
}

impl GraphStore {
    pub fn new() -> Self {
        GraphStore {
            nodes: Vec::with_capacity(1024),
            edges: Vec::with_capacity(4096),
            outgoing: Vec::with_capacity(1024),
            incoming: Vec::with_capacity(1024),
            label_index: HashMap::new(),
            edge_type_index: HashMap::new(),
            constraints: HashMap::new(),
            key_index: FxHashMap::default(),
            edge_index: FxHashMap::default(),
            node_count: 0,
            edge_count: 0,
            next_node_id: 1,
            next_edge_id: 1,
        }
    }

    // ---- constraints ---------------------------------------------------------

    /// Declare that `key_properties` uniquely identify nodes with `label`.
    ///
    /// Returns `true` when the constraint was created, `false` when the same
    /// constraint already existed. Fails if existing nodes already collide.
    pub fn create_constraint(&mut self, label: impl Into<Label>, key_properties: &[&str]) -> GraphResult<bool> {
        let label = label.into();
        if key_properties.is_empty() {
            return Err(GraphError::EmptyKey);
        }
        let props: Vec<String> = key_properties.iter().map(|p| p.to_string()).collect();

        if let Some(existing) = self.constraints.get(&label) {
            if *existing == props {
                return Ok(false);
            }
            return Err(GraphError::ConstraintMismatch {
                label,
                existing: existing.join(", "),
            });
        }

        // Build the index first so a collision leaves the store untouched
        let mut entries: FxHashMap<(Label, NodeKey), NodeId> = FxHashMap::default();
        for id in self.sorted_label_ids(&label) {
            let Some(key) = self.node_ref(id).and_then(|n| n.key_for(&props)) else {
                continue;
            };
            let slot = (label.clone(), key);
            if entries.contains_key(&slot) {
                return Err(GraphError::ConstraintViolation { label, key: slot.1 });
            }
            entries.insert(slot, id);
        }

        self.key_index.extend(entries);
        self.constraints.insert(label, props);
        Ok(true)
    }

    /// Constraint definitions, sorted by label
    pub fn constraints(&self) -> Vec<(Label, Vec<String>)> {
        let mut defs: Vec<_> = self
            .constraints
            .iter()
            .map(|(l, p)| (l.clone(), p.clone()))
            .collect();
        defs.sort();
        defs
    }

    pub fn constraint_for(&self, label: &Label) -> Option<&[String]> {
        self.constraints.get(label).map(|p| p.as_slice())
    }

    /// Reorder `key` into the constraint's property order, if it covers exactly
    /// the constrained properties.
    fn constrained_key(&self, label: &Label, key: &NodeKey) -> Option<NodeKey> {
        let props = self.constraints.get(label)?;
        if props.len() != key.parts().len() {
            return None;
        }
        let mut parts = Vec::with_capacity(props.len());
        for p in props {
            parts.push((p.clone(), key.get(p)?.to_string()));
        }
        Some(NodeKey::composite(parts))
    }

    /// Index key of a node under its label's constraint, if it has one
    fn index_key(&self, label: &Label, node: &Node) -> Option<NodeKey> {
        let props = self.constraints.get(label)?;
        node.key_for(props)
    }

    // ---- nodes ---------------------------------------------------------------

    fn allocate_node_id(&mut self) -> NodeId {
        let id = NodeId::new(self.next_node_id);
        self.next_node_id += 1;
        id
    }

    fn ensure_node_slot(&mut self, id: NodeId) {
        let idx = id.slot();
        if idx >= self.nodes.len() {
            self.nodes.resize_with(idx + 1, || None);
            self.outgoing.resize_with(idx + 1, Vec::new);
            self.incoming.resize_with(idx + 1, Vec::new);
        }
    }

    /// Place a fully built node into the arena and all indices
    fn place_node(&mut self, node: Node) -> GraphResult<NodeId> {
        let id = node.id;
        let mut keys = Vec::new();
        for label in &node.labels {
            if let Some(key) = self.index_key(label, &node) {
                let slot = (label.clone(), key);
                if self.key_index.contains_key(&slot) {
                    return Err(GraphError::ConstraintViolation {
                        label: slot.0,
                        key: slot.1,
                    });
                }
                keys.push(slot);
            }
        }

        for slot in keys {
            self.key_index.insert(slot, id);
        }
        for label in &node.labels {
            self.label_index.entry(label.clone()).or_default().insert(id);
        }

        self.ensure_node_slot(id);
        self.nodes[id.slot()] = Some(node);
        self.node_count += 1;
        Ok(id)
    }

    /// Create a node with a single label and no properties
    pub fn create_node(&mut self, label: impl Into<Label>) -> NodeId {
        let id = self.allocate_node_id();
        let node = Node::new(id, label);
        // A property-less node can never collide with a key
        self.place_node(node).unwrap_or(id)
    }

    /// Create a node with a label and properties, honouring uniqueness constraints
    pub fn create_node_with_properties(
        &mut self,
        label: impl Into<Label>,
        properties: PropertyMap,
    ) -> GraphResult<NodeId> {
        let id = NodeId::new(self.next_node_id);
        let mut node = Node::new(id, label);
        node.properties = properties;
        let id = self.place_node(node)?;
        self.next_node_id += 1;
        Ok(id)
    }

    /// Find the node with `label` whose key properties equal `key`.
    ///
    /// Uses the key index when `key` covers the label's constraint; otherwise scans
    /// the label.
    pub fn find_node(&self, label: &Label, key: &NodeKey) -> Option<NodeId> {
        if let Some(k) = self.constrained_key(label, key) {
            return self.key_index.get(&(label.clone(), k)).copied();
        }
        self.sorted_label_ids(label)
            .into_iter()
            .find(|id| self.node_ref(*id).is_some_and(|n| n.matches_key(key)))
    }

    /// Create-or-update a node by key.
    ///
    /// An existing node gets `properties` merged in (last write wins per property);
    /// a new node is created carrying the key and `properties`. Key properties in
    /// `properties` are ignored. Returns the node and whether it was created.
    pub fn merge_node(
        &mut self,
        label: impl Into<Label>,
        key: &NodeKey,
        mut properties: PropertyMap,
    ) -> GraphResult<(NodeId, bool)> {
        let label = label.into();
        if key.parts().is_empty() {
            return Err(GraphError::EmptyKey);
        }
        for prop in key.properties() {
            properties.remove(prop);
        }

        if let Some(id) = self.find_node(&label, key) {
            let node = self.node_mut(id).ok_or(GraphError::NodeNotFound(id))?;
            node.merge_properties(properties);
            return Ok((id, false));
        }

        let id = NodeId::new(self.next_node_id);
        let mut node = Node::with_key(id, label, key);
        node.properties.extend(properties);
        let id = self.place_node(node)?;
        self.next_node_id += 1;
        Ok((id, true))
    }

    pub fn get_node(&self, id: NodeId) -> Option<&Node> {
        self.node_ref(id)
    }

    pub fn has_node(&self, id: NodeId) -> bool {
        self.node_ref(id).is_some()
    }

    fn node_ref(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.slot()).and_then(|n| n.as_ref())
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.slot()).and_then(|n| n.as_mut())
    }

    fn sorted_label_ids(&self, label: &Label) -> Vec<NodeId> {
        let mut ids: Vec<NodeId> = self
            .label_index
            .get(label)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        ids.sort_unstable();
        ids
    }

    /// Nodes with `label`, ordered by id
    pub fn get_nodes_by_label(&self, label: &Label) -> Vec<&Node> {
        self.sorted_label_ids(label)
            .into_iter()
            .filter_map(|id| self.node_ref(id))
            .collect()
    }

    /// Every node, ordered by id
    pub fn all_nodes(&self) -> Vec<&Node> {
        self.nodes.iter().flatten().collect()
    }

    pub fn node_count(&self) -> usize {
        self.node_count
    }

    pub fn label_count(&self, label: &Label) -> usize {
        self.label_index.get(label).map_or(0, |s| s.len())
    }

    // ---- edges ---------------------------------------------------------------

    fn place_edge(&mut self, edge: Edge) -> GraphResult<EdgeId> {
        if !self.has_node(edge.source) {
            return Err(GraphError::InvalidEdgeSource(edge.source));
        }
        if !self.has_node(edge.target) {
            return Err(GraphError::InvalidEdgeTarget(edge.target));
        }
        let id = edge.id;
        if self.edges.get(id.slot()).is_some_and(|e| e.is_some()) {
            return Err(GraphError::EdgeAlreadyExists(id));
        }

        self.outgoing[edge.source.slot()].push(id);
        self.incoming[edge.target.slot()].push(id);
        self.edge_type_index
            .entry(edge.edge_type.clone())
            .or_default()
            .insert(id);
        self.edge_index
            .entry((edge.source, edge.edge_type.clone(), edge.target))
            .or_insert(id);

        let idx = id.slot();
        if idx >= self.edges.len() {
            self.edges.resize_with(idx + 1, || None);
        }
        self.edges[idx] = Some(edge);
        self.edge_count += 1;
        Ok(id)
    }

    /// Create a directed edge; parallel edges are allowed
    pub fn create_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        edge_type: impl Into<EdgeType>,
    ) -> GraphResult<EdgeId> {
        let id = EdgeId::new(self.next_edge_id);
        let id = self.place_edge(Edge::new(id, source, target, edge_type))?;
        self.next_edge_id += 1;
        Ok(id)
    }

    /// The edge `source -[edge_type]-> target`, if any
    pub fn find_edge(&self, source: NodeId, edge_type: &EdgeType, target: NodeId) -> Option<EdgeId> {
        self.edge_index
            .get(&(source, edge_type.clone(), target))
            .copied()
    }

    /// Return the existing `source -[edge_type]-> target` edge or create it.
    /// Returns the edge and whether it was created.
    pub fn merge_edge(
        &mut self,
        source: NodeId,
        target: NodeId,
        edge_type: impl Into<EdgeType>,
    ) -> GraphResult<(EdgeId, bool)> {
        let edge_type = edge_type.into();
        if let Some(id) = self.find_edge(source, &edge_type, target) {
            return Ok((id, false));
        }
        self.create_edge(source, target, edge_type).map(|id| (id, true))
    }

    pub fn get_edge(&self, id: EdgeId) -> Option<&Edge> {
        self.edges.get(id.slot()).and_then(|e| e.as_ref())
    }

    pub fn get_outgoing_edges(&self, node_id: NodeId) -> Vec<&Edge> {
        self.outgoing
            .get(node_id.slot())
            .map(|ids| ids.iter().filter_map(|id| self.get_edge(*id)).collect())
            .unwrap_or_default()
    }

    pub fn get_incoming_edges(&self, node_id: NodeId) -> Vec<&Edge> {
        self.incoming
            .get(node_id.slot())
            .map(|ids| ids.iter().filter_map(|id| self.get_edge(*id)).collect())
            .unwrap_or_default()
    }

    /// Edges of `edge_type`, ordered by id
    pub fn get_edges_by_type(&self, edge_type: &EdgeType) -> Vec<&Edge> {
        let mut ids: Vec<EdgeId> = self
            .edge_type_index
            .get(edge_type)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();
        ids.sort_unstable();
        ids.into_iter().filter_map(|id| self.get_edge(id)).collect()
    }

    /// Every edge, ordered by id
    pub fn all_edges(&self) -> Vec<&Edge> {
        self.edges.iter().flatten().collect()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    pub fn edge_type_count(&self, edge_type: &EdgeType) -> usize {
        self.edge_type_index.get(edge_type).map_or(0, |s| s.len())
    }

    // ---- lifecycle -----------------------------------------------------------

    /// Delete every node and edge. Constraint definitions survive.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
        self.outgoing.clear();
        self.incoming.clear();
        self.label_index.clear();
        self.edge_type_index.clear();
        self.key_index.clear();
        self.edge_index.clear();
        self.node_count = 0;
        self.edge_count = 0;
        self.next_node_id = 1;
        self.next_edge_id = 1;
    }

    /// Insert a node loaded from persistence, keeping its id
    pub fn insert_recovered_node(&mut self, node: Node) -> GraphResult<()> {
        let id = node.id;
        if self.has_node(id) {
            return Err(GraphError::NodeAlreadyExists(id));
        }
        self.place_node(node)?;
        self.next_node_id = self.next_node_id.max(id.as_u64() + 1);
        Ok(())
    }

    /// Insert an edge loaded from persistence, keeping its id.
    /// Both endpoints must already be recovered.
    pub fn insert_recovered_edge(&mut self, edge: Edge) -> GraphResult<()> {
        let id = edge.id;
        self.place_edge(edge)?;
        self.next_edge_id = self.next_edge_id.max(id.as_u64() + 1);
        Ok(())
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}
