use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use socialgraph::algo::{louvain, LouvainConfig, WeightedGraph};
use socialgraph::extract::{extract_entities, extract_topics};
use socialgraph::graph::{GraphStore, NodeKey, PropertyMap};
use socialgraph::schema::{NodeLabel, Relation};

/// Ring of `clusters` dense clusters, each joined to the next by one edge
fn clustered_graph(clusters: usize, size: usize) -> WeightedGraph {
    let mut edges = Vec::new();
    for c in 0..clusters {
        let base = c * size;
        for i in 0..size {
            for j in (i + 1)..size {
                if (i + j) % 3 != 0 {
                    edges.push((base + i, base + j, 1.0));
                }
            }
        }
        let next = ((c + 1) % clusters) * size;
        edges.push((base, next, 1.0));
    }
    WeightedGraph::from_index_edges(clusters * size, edges)
}

/// Benchmark Louvain on growing clustered graphs
fn bench_louvain(c: &mut Criterion) {
    let mut group = c.benchmark_group("louvain");

    for clusters in [10, 50, 200].iter() {
        let graph = clustered_graph(*clusters, 20);
        group.bench_with_input(BenchmarkId::from_parameter(clusters), &graph, |b, graph| {
            b.iter(|| louvain(graph, &LouvainConfig::default()));
        });
    }
    group.finish();
}

/// Benchmark topic and entity extraction on post-sized text
fn bench_extraction(c: &mut Criterion) {
    let text = "Ethereum validators are debating the merge again. Staking rewards, \
                validator queues and withdrawal credentials dominate the discussion; \
                see https://ethereum.org/staking #ethereum and thanks to @vitalik for the \
                writeup on validator economics and staking incentives."
        .repeat(4);

    c.bench_function("extract_topics", |b| b.iter(|| extract_topics(&text, 5)));
    c.bench_function("extract_entities", |b| b.iter(|| extract_entities(&text)));
}

/// Benchmark merge throughput into a constrained store
fn bench_merge(c: &mut Criterion) {
    let mut group = c.benchmark_group("merge_node");

    for size in [1000, 10_000].iter() {
        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, &size| {
            b.iter(|| {
                let mut store = GraphStore::new();
                let author = NodeLabel::Author;
                store.create_constraint(author.as_str(), author.key_properties()).unwrap();
                let mut previous = None;
                for i in 0..size {
                    // Every name appears twice, so half the merges hit existing nodes
                    let key = NodeKey::single("name", format!("author{}", i / 2));
                    let (id, _) = store.merge_node(author.as_str(), &key, PropertyMap::new()).unwrap();
                    if let Some(prev) = previous {
                        if prev != id {
                            store.merge_edge(prev, id, Relation::InteractsWith.edge_type()).unwrap();
                        }
                    }
                    previous = Some(id);
                }
                store
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_louvain, bench_extraction, bench_merge);
criterion_main!(benches);
