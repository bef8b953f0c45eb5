//! Connected components
//!
//! Union-find over the undirected view. Louvain uses the components to cluster
//! disconnected parts of the graph independently.

use super::common::{NodeId, WeightedGraph};
use std::collections::HashMap;

/// Result of WCC algorithm
pub struct WccResult {
    /// Map of Component ID -> List of NodeIds
    pub components: HashMap<usize, Vec<NodeId>>,
    /// Map of NodeId -> Component ID
    pub node_component: HashMap<NodeId, usize>,
}

/// Union-Find data structure
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    fn new(size: usize) -> Self {
        UnionFind {
            parent: (0..size).collect(),
            rank: vec![0; size],
        }
    }

    fn find(&mut self, i: usize) -> usize {
        let mut root = i;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        // Path compression
        let mut cur = i;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    fn union(&mut self, i: usize, j: usize) {
        let root_i = self.find(i);
        let root_j = self.find(j);

        if root_i != root_j {
            if self.rank[root_i] < self.rank[root_j] {
                self.parent[root_i] = root_j;
            } else if self.rank[root_i] > self.rank[root_j] {
                self.parent[root_j] = root_i;
            } else {
                self.parent[root_j] = root_i;
                self.rank[root_i] += 1;
            }
        }
    }
}

/// Dense member lists of every connected component.
///
/// Components are ordered by their smallest member and each list is ascending.
pub fn component_members(graph: &WeightedGraph) -> Vec<Vec<usize>> {
    let n = graph.node_count;
    let mut uf = UnionFind::new(n);

    for u in 0..n {
        for (v, _) in graph.neighbors(u) {
            if u < v {
                uf.union(u, v);
            }
        }
    }

    let mut slot_of_root: HashMap<usize, usize> = HashMap::new();
    let mut members: Vec<Vec<usize>> = Vec::new();
    for i in 0..n {
        let root = uf.find(i);
        let slot = *slot_of_root.entry(root).or_insert_with(|| {
            members.push(Vec::new());
            members.len() - 1
        });
        members[slot].push(i);
    }
    members
}

/// Weakly Connected Components (WCC)
///
/// Finds all disjoint subgraphs in the graph.
pub fn weakly_connected_components(graph: &WeightedGraph) -> WccResult {
    let mut components = HashMap::new();
    let mut node_component = HashMap::new();

    for (component, members) in component_members(graph).into_iter().enumerate() {
        let ids: Vec<NodeId> = members.iter().map(|&i| graph.index_to_node[i]).collect();
        for &id in &ids {
            node_component.insert(id, component);
        }
        components.insert(component, ids);
    }

    WccResult {
        components,
        node_component,
    }
}
