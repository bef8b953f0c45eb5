//! Shared utilities for graph algorithms
//!
//! Provides a read-only, optimized view of a weighted undirected graph for algorithm execution.

use std::collections::HashMap;

/// Node Identifier type (u64)
pub type NodeId = u64;

/// A dense, integer-indexed view of an undirected weighted graph using Compressed Sparse Row (CSR) format.
///
/// Every edge `{u, v}` with `u != v` appears in both rows. Self-loops are kept out of
/// the rows and accumulated per node in `self_loops`. Parallel edges are merged by
/// summing their weights.
#[derive(Debug, Clone)]
pub struct WeightedGraph {
    /// Number of nodes
    pub node_count: usize,
    /// Mapping from dense index (0..N) back to NodeId
    pub index_to_node: Vec<NodeId>,
    /// Mapping from NodeId to dense index
    pub node_to_index: HashMap<NodeId, usize>,

    /// Offsets into `targets`. Size = node_count + 1
    pub offsets: Vec<usize>,
    /// Contiguous array of neighbour indices, sorted within each row
    pub targets: Vec<usize>,
    /// Edge weights: aligned with `targets`
    pub weights: Vec<f64>,

    /// Self-loop weight per node
    pub self_loops: Vec<f64>,

    total_weight: f64,
}

impl WeightedGraph {
    /// Build a graph from node ids and `(source, target, weight)` triples.
    ///
    /// Duplicate node ids are collapsed; edges that reference a node outside `nodes`
    /// are ignored.
    pub fn from_edges(nodes: &[NodeId], edges: &[(NodeId, NodeId, f64)]) -> Self {
        let mut index_to_node = Vec::with_capacity(nodes.len());
        let mut node_to_index = HashMap::with_capacity(nodes.len());

        for &id in nodes {
            if !node_to_index.contains_key(&id) {
                node_to_index.insert(id, index_to_node.len());
                index_to_node.push(id);
            }
        }

        let indexed: Vec<(usize, usize, f64)> = edges
            .iter()
            .filter_map(|&(s, t, w)| {
                let u = *node_to_index.get(&s)?;
                let v = *node_to_index.get(&t)?;
                Some((u, v, w))
            })
            .collect();

        Self::build(index_to_node, node_to_index, indexed)
    }

    /// Build a graph whose node ids are the dense indices `0..node_count`.
    pub fn from_index_edges(
        node_count: usize,
        edges: impl IntoIterator<Item = (usize, usize, f64)>,
    ) -> Self {
        let index_to_node: Vec<NodeId> = (0..node_count as u64).collect();
        let node_to_index = index_to_node
            .iter()
            .enumerate()
            .map(|(idx, &id)| (id, idx))
            .collect();
        Self::build(index_to_node, node_to_index, edges)
    }

    fn build(
        index_to_node: Vec<NodeId>,
        node_to_index: HashMap<NodeId, usize>,
        edges: impl IntoIterator<Item = (usize, usize, f64)>,
    ) -> Self {
        let node_count = index_to_node.len();
        let mut rows: Vec<Vec<(usize, f64)>> = vec![Vec::new(); node_count];
        let mut self_loops = vec![0.0; node_count];

        for (u, v, w) in edges {
            if u == v {
                self_loops[u] += w;
            } else {
                rows[u].push((v, w));
                rows[v].push((u, w));
            }
        }

        let mut offsets = Vec::with_capacity(node_count + 1);
        let mut targets = Vec::new();
        let mut weights: Vec<f64> = Vec::new();

        offsets.push(0);
        for row in &mut rows {
            row.sort_unstable_by_key(|&(v, _)| v);
            let row_start = targets.len();
            for &(v, w) in row.iter() {
                // Rows are sorted, so a parallel edge is always the previous entry
                if targets.len() > row_start && targets.last() == Some(&v) {
                    if let Some(acc) = weights.last_mut() {
                        *acc += w;
                    }
                } else {
                    targets.push(v);
                    weights.push(w);
                }
            }
            offsets.push(targets.len());
        }

        let total_weight =
            weights.iter().sum::<f64>() / 2.0 + self_loops.iter().sum::<f64>();

        WeightedGraph {
            node_count,
            index_to_node,
            node_to_index,
            offsets,
            targets,
            weights,
            self_loops,
            total_weight,
        }
    }

    /// Neighbours of a node (by index) with the weight of the connecting edge
    pub fn neighbors(&self, idx: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        let start = self.offsets[idx];
        let end = self.offsets[idx + 1];
        self.targets[start..end]
            .iter()
            .copied()
            .zip(self.weights[start..end].iter().copied())
    }

    /// Weighted degree; a self-loop contributes twice its weight
    pub fn degree(&self, idx: usize) -> f64 {
        let start = self.offsets[idx];
        let end = self.offsets[idx + 1];
        self.weights[start..end].iter().sum::<f64>() + 2.0 * self.self_loops[idx]
    }

    /// Sum of all edge weights (`m` in the modularity formula)
    pub fn total_weight(&self) -> f64 {
        self.total_weight
    }

    /// Number of distinct undirected non-loop edges
    pub fn edge_count(&self) -> usize {
        self.targets.len() / 2
    }

    /// Sub-graph induced by `members` (dense indices into `self`).
    ///
    /// The result keeps the original NodeIds, in the order given.
    pub fn induced(&self, members: &[usize]) -> WeightedGraph {
        let mut local = HashMap::with_capacity(members.len());
        for (i, &m) in members.iter().enumerate() {
            local.insert(m, i);
        }

        let mut edges = Vec::new();
        for (i, &m) in members.iter().enumerate() {
            if self.self_loops[m] > 0.0 {
                edges.push((i, i, self.self_loops[m]));
            }
            for (v, w) in self.neighbors(m) {
                if let Some(&j) = local.get(&v) {
                    if i < j {
                        edges.push((i, j, w));
                    }
                }
            }
        }

        let index_to_node: Vec<NodeId> = members.iter().map(|&m| self.index_to_node[m]).collect();
        let node_to_index = index_to_node
            .iter()
            .enumerate()
            .map(|(idx, &id)| (id, idx))
            .collect();
        Self::build(index_to_node, node_to_index, edges)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parallel_edges_merge() {
        let g = WeightedGraph::from_edges(&[1, 2], &[(1, 2, 1.0), (2, 1, 2.5)]);
        assert_eq!(g.edge_count(), 1);
        let n: Vec<_> = g.neighbors(0).collect();
        assert_eq!(n, vec![(1, 3.5)]);
        assert_eq!(g.total_weight(), 3.5);
    }

    #[test]
    fn test_self_loop_degree() {
        let g = WeightedGraph::from_edges(&[1, 2], &[(1, 1, 2.0), (1, 2, 1.0)]);
        assert_eq!(g.degree(0), 5.0);
        assert_eq!(g.degree(1), 1.0);
        assert_eq!(g.total_weight(), 3.0);
    }

    #[test]
    fn test_unknown_endpoints_ignored() {
        let g = WeightedGraph::from_edges(&[1, 2, 2], &[(1, 2, 1.0), (1, 9, 1.0)]);
        assert_eq!(g.node_count, 2);
        assert_eq!(g.edge_count(), 1);
    }

    #[test]
    fn test_induced_subgraph() {
        // 10 - 20 - 30, 40 isolated
        let g = WeightedGraph::from_edges(
            &[10, 20, 30, 40],
            &[(10, 20, 1.0), (20, 30, 2.0)],
        );
        let sub = g.induced(&[1, 2]);
        assert_eq!(sub.index_to_node, vec![20, 30]);
        assert_eq!(sub.edge_count(), 1);
        assert_eq!(sub.total_weight(), 2.0);
    }
}
