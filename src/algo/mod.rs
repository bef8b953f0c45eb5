//! Community detection adapter
//!
//! The algorithms live in `socialgraph-graph-algorithms`; this module turns the
//! social graph (either the store itself or a network read back through the client)
//! into a `WeightedGraph` and maps the partition back to node names.

use crate::client::AuthorCommunities;
use crate::graph::{EdgeType, GraphStore, Label, PropertyValue};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use thiserror::Error;

pub use socialgraph_graph_algorithms::{
    component_members, louvain, modularity, weakly_connected_components, LouvainConfig,
    LouvainResult, WccResult, WeightedGraph,
};

/// Node group of authors in a network graph
pub const AUTHOR_GROUP: u32 = 1;
/// Node group of communities in a network graph
pub const COMMUNITY_GROUP: u32 = 2;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CommunityError {
    #[error("Graph has no nodes")]
    EmptyGraph,

    #[error("Link references unknown node {0}")]
    UnknownNode(String),

    #[error("Link {from} -> {to} has invalid weight {weight}")]
    InvalidWeight { from: String, to: String, weight: f64 },

    #[error("Node {0} appears more than once")]
    DuplicateNode(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkNode {
    pub id: String,
    pub group: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub community: Option<usize>,
}

impl NetworkNode {
    pub fn new(id: impl Into<String>, group: u32) -> Self {
        Self {
            id: id.into(),
            group,
            community: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkLink {
    pub source: String,
    pub target: String,
    pub value: f64,
}

impl NetworkLink {
    pub fn new(source: impl Into<String>, target: impl Into<String>, value: f64) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            value,
        }
    }
}

/// A node/link network, serialized as `{"nodes": [...], "links": [...]}`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NetworkGraph {
    pub nodes: Vec<NetworkNode>,
    pub links: Vec<NetworkLink>,
}

impl NetworkGraph {
    /// Bipartite author ↔ community network. A name shared by an author and a
    /// community is a single node, keeping the group it was first seen with.
    pub fn from_author_communities(rows: &[AuthorCommunities]) -> Self {
        let mut graph = NetworkGraph::default();
        let mut seen = HashSet::new();
        for row in rows {
            graph.add_node(&mut seen, &row.author, AUTHOR_GROUP);
            for community in &row.communities {
                graph.add_node(&mut seen, community, COMMUNITY_GROUP);
                graph.links.push(NetworkLink::new(row.author.as_str(), community.as_str(), 1.0));
            }
        }
        graph
    }

    /// Author interaction network
    pub fn from_interactions(pairs: &[(String, String)]) -> Self {
        let mut graph = NetworkGraph::default();
        let mut seen = HashSet::new();
        for (a, b) in pairs {
            graph.add_node(&mut seen, a, AUTHOR_GROUP);
            graph.add_node(&mut seen, b, AUTHOR_GROUP);
            graph.links.push(NetworkLink::new(a.as_str(), b.as_str(), 1.0));
        }
        graph
    }

    fn add_node(&mut self, seen: &mut HashSet<String>, id: &str, group: u32) {
        if seen.insert(id.to_string()) {
            self.nodes.push(NetworkNode::new(id, group));
        }
    }

    pub fn detect_communities(
        &self,
        config: &LouvainConfig,
    ) -> Result<HashMap<String, usize>, CommunityError> {
        detect_communities(&self.nodes, &self.links, config)
    }

    /// Annotate every node with its community label
    pub fn with_communities(mut self, communities: &HashMap<String, usize>) -> Self {
        for node in &mut self.nodes {
            node.community = communities.get(&node.id).copied();
        }
        self
    }
}

/// Partition a network with Louvain.
///
/// Every node receives exactly one label. Links are undirected; parallel links add
/// their weights. Fails without touching anything on empty input, duplicate node
/// ids, links to unknown nodes or non-positive weights.
pub fn detect_communities(
    nodes: &[NetworkNode],
    links: &[NetworkLink],
    config: &LouvainConfig,
) -> Result<HashMap<String, usize>, CommunityError> {
    if nodes.is_empty() {
        return Err(CommunityError::EmptyGraph);
    }

    let mut index: HashMap<&str, usize> = HashMap::with_capacity(nodes.len());
    for (idx, node) in nodes.iter().enumerate() {
        if index.insert(node.id.as_str(), idx).is_some() {
            return Err(CommunityError::DuplicateNode(node.id.clone()));
        }
    }

    let mut edges = Vec::with_capacity(links.len());
    for link in links {
        let lookup = |id: &str| {
            index
                .get(id)
                .copied()
                .ok_or_else(|| CommunityError::UnknownNode(id.to_string()))
        };
        let u = lookup(&link.source)?;
        let v = lookup(&link.target)?;
        if !link.value.is_finite() || link.value <= 0.0 {
            return Err(CommunityError::InvalidWeight {
                from: link.source.clone(),
                to: link.target.clone(),
                weight: link.value,
            });
        }
        edges.push((u, v, link.value));
    }

    let graph = WeightedGraph::from_index_edges(nodes.len(), edges);
    let result = louvain(&graph, config);

    Ok(nodes
        .iter()
        .enumerate()
        .map(|(idx, node)| {
            let label = result.node_community.get(&(idx as u64)).copied().unwrap_or_default();
            (node.id.clone(), label)
        })
        .collect())
}

/// Build a `WeightedGraph` straight from the store.
///
/// `node_label` restricts the node set, `edge_type` the edges, and
/// `weight_property` reads a numeric edge weight (1.0 when absent). Edge direction
/// is dropped.
pub fn build_view(
    store: &GraphStore,
    node_label: Option<&str>,
    edge_type: Option<&str>,
    weight_property: Option<&str>,
) -> WeightedGraph {
    let nodes: Vec<u64> = match node_label {
        Some(label) => store
            .get_nodes_by_label(&Label::new(label))
            .iter()
            .map(|n| n.id.as_u64())
            .collect(),
        None => store.all_nodes().iter().map(|n| n.id.as_u64()).collect(),
    };

    let filter_edge_type = edge_type.map(EdgeType::new);
    let edges: Vec<(u64, u64, f64)> = store
        .all_edges()
        .into_iter()
        .filter(|e| filter_edge_type.as_ref().map_or(true, |et| e.edge_type == *et))
        .map(|e| {
            let weight = weight_property
                .and_then(|p| e.get_property(p))
                .and_then(PropertyValue::as_float)
                .unwrap_or(1.0);
            (e.source.as_u64(), e.target.as_u64(), weight)
        })
        .collect();

    WeightedGraph::from_edges(&nodes, &edges)
}
