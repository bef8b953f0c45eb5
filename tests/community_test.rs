use socialgraph::algo::{
    build_view, detect_communities, louvain, modularity, CommunityError, LouvainConfig,
    NetworkGraph, NetworkLink, NetworkNode, AUTHOR_GROUP,
};
use socialgraph::client::{EmbeddedGraphClient, GraphReadClient, PostFilter};
use socialgraph::config::IngestConfig;
use socialgraph::ingest::IngestPipeline;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

fn post(id: &str, subreddit: &str, author: &str) -> String {
    serde_json::json!({"name": id, "title": id, "subreddit": subreddit, "author": author}).to_string()
}

/// Same partition, ignoring label values
fn same_partition(a: &HashMap<String, usize>, b: &HashMap<String, usize>) -> bool {
    a.len() == b.len()
        && a.keys().all(|x| {
            a.keys()
                .all(|y| (a[x] == a[y]) == (b.get(x) == b.get(y)))
        })
}

fn two_cliques_with_bridge() -> (Vec<NetworkNode>, Vec<NetworkLink>) {
    let names = ["a0", "a1", "a2", "a3", "b0", "b1", "b2", "b3"];
    let nodes = names.iter().map(|n| NetworkNode::new(*n, AUTHOR_GROUP)).collect();
    let mut links = Vec::new();
    for group in [&names[..4], &names[4..]] {
        for i in 0..group.len() {
            for j in (i + 1)..group.len() {
                links.push(NetworkLink::new(group[i], group[j], 1.0));
            }
        }
    }
    links.push(NetworkLink::new("a3", "b0", 1.0));
    (nodes, links)
}

#[test]
fn test_bridged_cliques_split() {
    let (nodes, links) = two_cliques_with_bridge();
    let labels = detect_communities(&nodes, &links, &LouvainConfig::default()).unwrap();

    assert_eq!(labels.len(), 8);
    let a: HashSet<_> = ["a0", "a1", "a2", "a3"].iter().map(|n| labels[*n]).collect();
    let b: HashSet<_> = ["b0", "b1", "b2", "b3"].iter().map(|n| labels[*n]).collect();
    assert_eq!(a.len(), 1);
    assert_eq!(b.len(), 1);
    assert!(a.is_disjoint(&b));
}

#[test]
fn test_partition_is_stable_across_runs_and_seeds() {
    let (nodes, links) = two_cliques_with_bridge();
    let base = detect_communities(&nodes, &links, &LouvainConfig::default()).unwrap();
    for seed in [1, 7, 42] {
        let config = LouvainConfig {
            seed: Some(seed),
            ..LouvainConfig::default()
        };
        let seeded = detect_communities(&nodes, &links, &config).unwrap();
        assert!(same_partition(&base, &seeded), "seed {seed} changed the partition");
        assert_eq!(seeded, detect_communities(&nodes, &links, &config).unwrap());
    }
}

#[test]
fn test_isolated_nodes_get_own_communities() {
    let nodes = vec![
        NetworkNode::new("x", AUTHOR_GROUP),
        NetworkNode::new("y", AUTHOR_GROUP),
        NetworkNode::new("z", AUTHOR_GROUP),
    ];
    let labels = detect_communities(&nodes, &[], &LouvainConfig::default()).unwrap();
    let distinct: HashSet<_> = labels.values().collect();
    assert_eq!(distinct.len(), 3);
}

#[test]
fn test_modularity_of_result_is_positive() {
    let (nodes, links) = two_cliques_with_bridge();
    let index: HashMap<&str, usize> = nodes.iter().enumerate().map(|(i, n)| (n.id.as_str(), i)).collect();
    let edges: Vec<_> = links
        .iter()
        .map(|l| (index[l.source.as_str()], index[l.target.as_str()], l.value))
        .collect();
    let graph = socialgraph::algo::WeightedGraph::from_index_edges(nodes.len(), edges);

    let result = louvain(&graph, &LouvainConfig::default());
    assert_eq!(result.community_count, 2);
    assert!(result.modularity > 0.3);

    let labels: Vec<usize> = (0..nodes.len() as u64).map(|i| result.node_community[&i]).collect();
    assert!((modularity(&graph, &labels, 1.0) - result.modularity).abs() < 1e-9);
}

#[test]
fn test_rejects_malformed_network() {
    let nodes = vec![NetworkNode::new("a", AUTHOR_GROUP)];
    assert_eq!(
        detect_communities(&nodes, &[NetworkLink::new("a", "ghost", 1.0)], &LouvainConfig::default()),
        Err(CommunityError::UnknownNode("ghost".to_string()))
    );
    assert!(matches!(
        detect_communities(&nodes, &[NetworkLink::new("a", "a", -2.0)], &LouvainConfig::default()),
        Err(CommunityError::InvalidWeight { .. })
    ));
}

#[tokio::test]
async fn test_communities_from_ingested_graph() {
    let input = [
        post("t3_1", "rust", "alice"),
        post("t3_2", "rust", "bob"),
        post("t3_3", "rust", "carol"),
        post("t3_4", "cooking", "dave"),
        post("t3_5", "cooking", "erin"),
        post("t3_6", "cooking", "frank"),
    ]
    .join("\n");

    let client = Arc::new(EmbeddedGraphClient::new());
    IngestPipeline::new(client.clone(), IngestConfig::default())
        .ingest_reader(input.as_bytes())
        .await
        .unwrap();

    // Interaction network: two triangles, no shared authors
    let network = NetworkGraph::from_interactions(&client.interactions().await.unwrap());
    assert_eq!(network.nodes.len(), 6);
    assert_eq!(network.links.len(), 6);
    let labels = network.detect_communities(&LouvainConfig::default()).unwrap();
    assert_eq!(labels["alice"], labels["bob"]);
    assert_eq!(labels["bob"], labels["carol"]);
    assert_eq!(labels["dave"], labels["frank"]);
    assert_ne!(labels["alice"], labels["dave"]);

    // Author <-> community network groups each community with its authors
    let rows = client.author_communities(&PostFilter::default(), 100).await.unwrap();
    let network = NetworkGraph::from_author_communities(&rows);
    assert_eq!(network.nodes.len(), 8);
    let labels = network.detect_communities(&LouvainConfig::default()).unwrap();
    assert_eq!(labels["rust"], labels["alice"]);
    assert_eq!(labels["cooking"], labels["erin"]);
    assert_ne!(labels["rust"], labels["cooking"]);

    let annotated = network.with_communities(&labels);
    assert!(annotated.nodes.iter().all(|n| n.community.is_some()));

    // The same partition straight from the store
    let store = client.store_read().await;
    let view = build_view(&store, Some("Author"), Some("INTERACTS_WITH"), None);
    assert_eq!(view.node_count, 6);
    let result = louvain(&view, &LouvainConfig::default());
    assert_eq!(result.community_count, 2);
}
