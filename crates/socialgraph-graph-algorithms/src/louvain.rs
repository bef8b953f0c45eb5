//! Louvain community detection
//!
//! Greedy modularity optimisation in two alternating phases:
//!
//! 1. **Local moving**: each node moves into the neighbouring community with the largest
//!    modularity gain, until no move improves modularity.
//! 2. **Aggregation**: every community collapses into one super-node; intra-community
//!    weight becomes a self-loop, inter-community weight sums into super-edges.
//!
//! Levels repeat until a local-moving phase leaves the number of communities unchanged.
//!
//! Q = (1/2m) * Σij[Aij - γ(ki*kj)/(2m)] * δ(ci, cj)
//!
//! Connected components are clustered independently (in parallel), so two nodes
//! in different components never share a community.

use super::common::{NodeId, WeightedGraph};
use super::community::component_members;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use std::collections::HashMap;

/// Louvain configuration
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LouvainConfig {
    /// Resolution parameter γ (higher = more, smaller communities)
    pub resolution: f64,
    /// Maximum local-moving sweeps over all nodes per level
    pub max_passes: usize,
    /// A move must beat staying put by more than this
    pub min_gain: f64,
    /// Shuffle node visitation order with this seed; `None` visits in index order
    pub seed: Option<u64>,
}

impl Default for LouvainConfig {
    fn default() -> Self {
        Self {
            resolution: 1.0,
            max_passes: 100,
            min_gain: 1e-12,
            seed: None,
        }
    }
}

/// Result of Louvain
#[derive(Debug, Clone)]
pub struct LouvainResult {
    /// Map of NodeId -> community label (dense, 0..community_count)
    pub node_community: HashMap<NodeId, usize>,
    /// Number of communities found
    pub community_count: usize,
    /// Modularity of the final partition on the input graph
    pub modularity: f64,
    /// Deepest aggregation hierarchy over all components
    pub levels: usize,
}

impl LouvainResult {
    /// Group node ids by community label
    pub fn communities(&self) -> Vec<Vec<NodeId>> {
        let mut groups = vec![Vec::new(); self.community_count];
        for (&node, &community) in &self.node_community {
            groups[community].push(node);
        }
        for group in &mut groups {
            group.sort_unstable();
        }
        groups
    }
}

/// Run Louvain over the whole graph.
///
/// Labels are numbered in order of each community's first node (by dense index).
pub fn louvain(graph: &WeightedGraph, config: &LouvainConfig) -> LouvainResult {
    let n = graph.node_count;
    if n == 0 {
        return LouvainResult {
            node_community: HashMap::new(),
            community_count: 0,
            modularity: 0.0,
            levels: 0,
        };
    }

    let components = component_members(graph);

    let partials: Vec<(Vec<usize>, usize, usize)> = components
        .par_iter()
        .enumerate()
        .map(|(c, members)| {
            if members.len() == 1 {
                return (vec![0], 1, 0);
            }
            let sub = graph.induced(members);
            let seed = config.seed.map(|s| s ^ c as u64);
            cluster_component(&sub, config, seed)
        })
        .collect();

    let mut labels = vec![0usize; n];
    let mut next = 0;
    let mut levels = 0;
    for (members, (local, count, depth)) in components.iter().zip(partials) {
        for (i, &m) in members.iter().enumerate() {
            labels[m] = next + local[i];
        }
        next += count;
        levels = levels.max(depth);
    }

    let (labels, community_count) = renumber(&labels);
    let modularity = modularity(graph, &labels, config.resolution);

    let node_community = labels
        .iter()
        .enumerate()
        .map(|(idx, &c)| (graph.index_to_node[idx], c))
        .collect();

    LouvainResult {
        node_community,
        community_count,
        modularity,
        levels,
    }
}

/// Cluster one connected component; returns (labels, community count, levels)
fn cluster_component(
    graph: &WeightedGraph,
    config: &LouvainConfig,
    seed: Option<u64>,
) -> (Vec<usize>, usize, usize) {
    let mut rng = seed.map(StdRng::seed_from_u64);
    let mut membership: Vec<usize> = (0..graph.node_count).collect();
    let mut level_graph = graph.clone();
    let mut levels = 0;

    loop {
        let (community, moved) = local_moving(&level_graph, config, rng.as_mut());
        let (community, count) = renumber(&community);

        for m in membership.iter_mut() {
            *m = community[*m];
        }
        levels += 1;

        if !moved || count == level_graph.node_count {
            break;
        }
        level_graph = aggregate(&level_graph, &community, count);
    }

    let (membership, count) = renumber(&membership);
    (membership, count, levels)
}

/// Phase 1. Returns the community of every node and whether anything moved.
fn local_moving(
    graph: &WeightedGraph,
    config: &LouvainConfig,
    rng: Option<&mut StdRng>,
) -> (Vec<usize>, bool) {
    let n = graph.node_count;
    let mut community: Vec<usize> = (0..n).collect();
    let two_m = 2.0 * graph.total_weight();
    if two_m <= 0.0 {
        return (community, false);
    }

    let degree: Vec<f64> = (0..n).map(|i| graph.degree(i)).collect();
    // Σtot per community
    let mut tot = degree.clone();

    let mut order: Vec<usize> = (0..n).collect();
    if let Some(rng) = rng {
        order.shuffle(rng);
    }

    let mut link_weight = vec![0.0; n];
    let mut seen = vec![false; n];
    let mut touched: Vec<usize> = Vec::new();
    let mut moved_any = false;

    for _ in 0..config.max_passes {
        let mut moved = false;

        for &node in &order {
            let current = community[node];
            let k = degree[node];

            for (nbr, w) in graph.neighbors(node) {
                let c = community[nbr];
                if !seen[c] {
                    seen[c] = true;
                    touched.push(c);
                }
                link_weight[c] += w;
            }

            tot[current] -= k;
            let gain = |c: usize| link_weight[c] - config.resolution * tot[c] * k / two_m;

            let mut best = current;
            let mut best_gain = gain(current);
            for &c in &touched {
                let g = gain(c);
                if g > best_gain + config.min_gain {
                    best = c;
                    best_gain = g;
                }
            }

            tot[best] += k;
            if best != current {
                community[node] = best;
                moved = true;
            }

            for &c in &touched {
                link_weight[c] = 0.0;
                seen[c] = false;
            }
            touched.clear();
        }

        if !moved {
            break;
        }
        moved_any = true;
    }

    (community, moved_any)
}

/// Phase 2. Contract each community into one super-node.
fn aggregate(graph: &WeightedGraph, community: &[usize], count: usize) -> WeightedGraph {
    let mut edges = Vec::with_capacity(graph.edge_count() + graph.node_count);
    for u in 0..graph.node_count {
        let cu = community[u];
        if graph.self_loops[u] > 0.0 {
            edges.push((cu, cu, graph.self_loops[u]));
        }
        for (v, w) in graph.neighbors(u) {
            if u < v {
                edges.push((cu, community[v], w));
            }
        }
    }
    WeightedGraph::from_index_edges(count, edges)
}

/// Relabel densely in order of first occurrence
fn renumber(labels: &[usize]) -> (Vec<usize>, usize) {
    let mut mapping: HashMap<usize, usize> = HashMap::new();
    let relabeled = labels
        .iter()
        .map(|&l| {
            let next = mapping.len();
            *mapping.entry(l).or_insert(next)
        })
        .collect();
    (relabeled, mapping.len())
}

/// Modularity of a partition given as one label per dense node index.
///
/// Returns 0.0 for a graph without edge weight.
pub fn modularity(graph: &WeightedGraph, labels: &[usize], resolution: f64) -> f64 {
    let m = graph.total_weight();
    if m <= 0.0 {
        return 0.0;
    }
    let two_m = 2.0 * m;

    let mut internal: HashMap<usize, f64> = HashMap::new();
    let mut tot: HashMap<usize, f64> = HashMap::new();

    for u in 0..graph.node_count {
        let cu = labels[u];
        *tot.entry(cu).or_default() += graph.degree(u);
        // Each internal edge is visited from both ends; self-loops count double too
        let mut inside = 2.0 * graph.self_loops[u];
        for (v, w) in graph.neighbors(u) {
            if labels[v] == cu {
                inside += w;
            }
        }
        *internal.entry(cu).or_default() += inside;
    }

    tot.iter()
        .map(|(c, &t)| {
            let inside = internal.get(c).copied().unwrap_or(0.0);
            inside / two_m - resolution * (t / two_m) * (t / two_m)
        })
        .sum()
}
