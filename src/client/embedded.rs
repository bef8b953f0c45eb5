//! EmbeddedGraphClient: in-process graph client
//!
//! Wraps a `GraphStore` behind a tokio `RwLock`. Every operation takes the lock once,
//! so each upsert is atomic with respect to concurrent workers. An optional RocksDB
//! directory makes the graph durable across runs via `checkpoint`.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use indexmap::{IndexMap, IndexSet};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::error::{ClientError, ClientResult};
use super::models::{
    AuthorCommunities, CommunityMembers, GraphStats, NameCount, PostFilter, PostSummary,
    TimeBucket,
};
use super::{GraphReadClient, GraphUpsertClient};
use crate::graph::{GraphStore, Node, NodeId, NodeKey, PropertyMap};
use crate::persistence::PersistentStorage;
use crate::schema::{NodeLabel, NodeRef, PostRecord, Relation};

/// In-process client over a shared `GraphStore`
pub struct EmbeddedGraphClient {
    store: Arc<RwLock<GraphStore>>,
    storage: Option<Arc<PersistentStorage>>,
    open: AtomicBool,
}

impl EmbeddedGraphClient {
    /// Client over a fresh, empty, in-memory store
    pub fn new() -> Self {
        Self::with_store(Arc::new(RwLock::new(GraphStore::new())))
    }

    /// Client over an existing store
    pub fn with_store(store: Arc<RwLock<GraphStore>>) -> Self {
        Self {
            store,
            storage: None,
            open: AtomicBool::new(true),
        }
    }

    /// Client backed by a RocksDB directory; loads the last checkpoint if any
    pub fn open(path: impl AsRef<Path>) -> ClientResult<Self> {
        let storage = PersistentStorage::open(path)?;
        let store = storage.load_graph()?;
        info!(
            nodes = store.node_count(),
            edges = store.edge_count(),
            path = %storage.path().display(),
            "Opened persistent graph"
        );
        Ok(Self {
            store: Arc::new(RwLock::new(store)),
            storage: Some(Arc::new(storage)),
            open: AtomicBool::new(true),
        })
    }

    pub fn store(&self) -> &Arc<RwLock<GraphStore>> {
        &self.store
    }

    /// Acquire a read lock on the store for direct inspection
    pub async fn store_read(&self) -> tokio::sync::RwLockReadGuard<'_, GraphStore> {
        self.store.read().await
    }

    /// Acquire a write lock on the store for direct mutation
    pub async fn store_write(&self) -> tokio::sync::RwLockWriteGuard<'_, GraphStore> {
        self.store.write().await
    }

    pub fn is_persistent(&self) -> bool {
        self.storage.is_some()
    }

    /// Save the current graph to RocksDB. Returns `false` for an in-memory client.
    pub async fn checkpoint(&self) -> ClientResult<bool> {
        self.ensure_open()?;
        let Some(storage) = &self.storage else {
            return Ok(false);
        };
        let store = self.store.read().await;
        storage.save_graph(&store)?;
        storage.flush()?;
        Ok(true)
    }

    /// Mark the client unavailable; every later call fails with `Unavailable`
    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
        info!("Graph client closed");
    }

    fn ensure_open(&self) -> ClientResult<()> {
        if self.open.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(ClientError::Unavailable("client is closed".to_string()))
        }
    }
}

impl Default for EmbeddedGraphClient {
    fn default() -> Self {
        Self::new()
    }
}

/// A Post node with its community and author resolved
struct PostView<'a> {
    node: &'a Node,
    community: Option<&'a str>,
    author: Option<&'a str>,
}

impl<'a> PostView<'a> {
    fn str(&self, key: &str) -> &'a str {
        self.node.get_str(key).unwrap_or("")
    }

    fn int(&self, key: &str) -> i64 {
        self.node
            .get_property(key)
            .and_then(|v| v.as_integer())
            .unwrap_or(0)
    }

    fn matches(&self, filter: &PostFilter) -> bool {
        filter.matches(
            self.str("title"),
            self.str("selftext"),
            self.int("created_utc"),
            self.community,
        )
    }

    fn summary(&self) -> PostSummary {
        PostSummary {
            id: self.str("id").to_string(),
            title: self.str("title").to_string(),
            selftext: self.str("selftext").to_string(),
            score: self.int("score"),
            num_comments: self.int("num_comments"),
            created_utc: self.int("created_utc"),
            subreddit: self.community.map(str::to_string),
            author: self.author.map(str::to_string),
        }
    }
}

/// Name of the first `relation` target of `node`
fn first_target_name<'a>(store: &'a GraphStore, node: NodeId, relation: Relation) -> Option<&'a str> {
    let edge_type = relation.edge_type();
    store
        .get_outgoing_edges(node)
        .into_iter()
        .find(|e| e.edge_type == edge_type)
        .and_then(|e| store.get_node(e.target))
        .and_then(|n| n.get_str("name"))
}

fn post_views(store: &GraphStore) -> Vec<PostView<'_>> {
    store
        .get_nodes_by_label(&NodeLabel::Post.label())
        .into_iter()
        .map(|node| PostView {
            node,
            community: first_target_name(store, node.id, Relation::PostedIn),
            author: first_target_name(store, node.id, Relation::AuthoredBy),
        })
        .collect()
}

/// Counts in first-seen order, sorted descending (stable), truncated to `limit`
fn ranked(counts: IndexMap<&str, usize>, limit: usize) -> Vec<NameCount> {
    let mut rows: Vec<NameCount> = counts
        .into_iter()
        .map(|(name, count)| NameCount {
            name: name.to_string(),
            count,
        })
        .collect();
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows.truncate(limit);
    rows
}

#[async_trait]
impl GraphUpsertClient for EmbeddedGraphClient {
    async fn ensure_constraints(&self) -> ClientResult<()> {
        self.ensure_open()?;
        let mut store = self.store.write().await;
        for label in NodeLabel::ALL {
            if store.create_constraint(label.as_str(), label.key_properties())? {
                debug!(label = %label, "Created uniqueness constraint");
            }
        }
        Ok(())
    }

    async fn upsert_post(&self, post: &PostRecord) -> ClientResult<()> {
        self.ensure_open()?;
        let key = NodeKey::single("id", post.id.as_str());
        let mut store = self.store.write().await;
        let (_, created) = store.merge_node(NodeLabel::Post.as_str(), &key, post.properties())?;
        debug!(post = %post.id, created, "Upserted post");
        Ok(())
    }

    async fn upsert_edge_from_key(
        &self,
        source: &NodeRef,
        relation: Relation,
        target: &NodeRef,
    ) -> ClientResult<()> {
        self.ensure_open()?;
        let mut store = self.store.write().await;
        let source_id = store
            .find_node(&source.label.label(), &source.key)
            .ok_or_else(|| ClientError::Operation(format!("source {} does not exist", source)))?;
        let (target_id, _) =
            store.merge_node(target.label.as_str(), &target.key, PropertyMap::new())?;
        let (_, created) = store.merge_edge(source_id, target_id, relation.edge_type())?;
        debug!(%source, %relation, %target, created, "Upserted edge");
        Ok(())
    }

    async fn upsert_interaction(&self, a: &str, b: &str) -> ClientResult<()> {
        if a == b {
            return Ok(());
        }
        self.ensure_open()?;
        let (low, high) = if a < b { (a, b) } else { (b, a) };
        let author = NodeLabel::Author.as_str();

        let mut store = self.store.write().await;
        let (low_id, _) = store.merge_node(author, &NodeKey::single("name", low), PropertyMap::new())?;
        let (high_id, _) = store.merge_node(author, &NodeKey::single("name", high), PropertyMap::new())?;
        let (_, created) = store.merge_edge(low_id, high_id, Relation::InteractsWith.edge_type())?;
        debug!(a = low, b = high, created, "Upserted interaction");
        Ok(())
    }

    async fn reset_all(&self) -> ClientResult<()> {
        self.ensure_open()?;
        let mut store = self.store.write().await;
        let (nodes, edges) = (store.node_count(), store.edge_count());
        store.clear();
        info!(nodes, edges, "Graph reset");
        Ok(())
    }
}

#[async_trait]
impl GraphReadClient for EmbeddedGraphClient {
    async fn stats(&self) -> ClientResult<GraphStats> {
        self.ensure_open()?;
        let store = self.store.read().await;
        Ok(GraphStats {
            total_nodes: store.node_count(),
            total_edges: store.edge_count(),
            nodes: NodeLabel::ALL
                .iter()
                .map(|l| (l.as_str().to_string(), store.label_count(&l.label())))
                .collect(),
            edges: Relation::ALL
                .iter()
                .map(|r| (r.as_str().to_string(), store.edge_type_count(&r.edge_type())))
                .collect(),
        })
    }

    async fn community_authors(&self) -> ClientResult<Vec<CommunityMembers>> {
        self.ensure_open()?;
        let store = self.store.read().await;
        let posted_in = Relation::PostedIn.edge_type();

        let mut members = Vec::new();
        for community in store.get_nodes_by_label(&NodeLabel::Subreddit.label()) {
            let Some(name) = community.get_str("name") else {
                continue;
            };
            let mut authors: IndexSet<&str> = IndexSet::new();
            for edge in store.get_incoming_edges(community.id) {
                if edge.edge_type != posted_in {
                    continue;
                }
                if let Some(author) = first_target_name(&store, edge.source, Relation::AuthoredBy) {
                    authors.insert(author);
                }
            }
            members.push(CommunityMembers {
                community: name.to_string(),
                authors: authors.into_iter().map(str::to_string).collect(),
            });
        }
        Ok(members)
    }

    async fn interactions(&self) -> ClientResult<Vec<(String, String)>> {
        self.ensure_open()?;
        let store = self.store.read().await;
        let name = |id: NodeId| store.get_node(id).and_then(|n| n.get_str("name"));
        Ok(store
            .get_edges_by_type(&Relation::InteractsWith.edge_type())
            .into_iter()
            .filter_map(|e| Some((name(e.source)?.to_string(), name(e.target)?.to_string())))
            .collect())
    }

    async fn author_communities(
        &self,
        filter: &PostFilter,
        limit: usize,
    ) -> ClientResult<Vec<AuthorCommunities>> {
        self.ensure_open()?;
        let store = self.store.read().await;

        let mut by_author: IndexMap<&str, IndexSet<&str>> = IndexMap::new();
        for post in post_views(&store) {
            let (Some(author), Some(community)) = (post.author, post.community) else {
                continue;
            };
            if !post.matches(filter) {
                continue;
            }
            if !by_author.contains_key(author) && by_author.len() >= limit {
                continue;
            }
            by_author.entry(author).or_default().insert(community);
        }

        Ok(by_author
            .into_iter()
            .map(|(author, communities)| AuthorCommunities {
                author: author.to_string(),
                communities: communities.into_iter().map(str::to_string).collect(),
            })
            .collect())
    }

    async fn community_post_counts(
        &self,
        filter: &PostFilter,
        limit: usize,
    ) -> ClientResult<Vec<NameCount>> {
        self.ensure_open()?;
        let store = self.store.read().await;

        let mut counts: IndexMap<&str, usize> = IndexMap::new();
        for post in post_views(&store) {
            if let Some(community) = post.community {
                if post.matches(filter) {
                    *counts.entry(community).or_insert(0) += 1;
                }
            }
        }
        Ok(ranked(counts, limit))
    }

    async fn topic_mentions(&self, filter: &PostFilter, limit: usize) -> ClientResult<Vec<NameCount>> {
        self.ensure_open()?;
        let store = self.store.read().await;
        let discusses = Relation::Discusses.edge_type();

        let mut counts: IndexMap<&str, usize> = IndexMap::new();
        for post in post_views(&store) {
            if !post.matches(filter) {
                continue;
            }
            for edge in store.get_outgoing_edges(post.node.id) {
                if edge.edge_type != discusses {
                    continue;
                }
                if let Some(topic) = store.get_node(edge.target).and_then(|n| n.get_str("name")) {
                    *counts.entry(topic).or_insert(0) += 1;
                }
            }
        }
        Ok(ranked(counts, limit))
    }

    async fn post_time_series(&self, filter: &PostFilter) -> ClientResult<Vec<TimeBucket>> {
        self.ensure_open()?;
        let store = self.store.read().await;

        let mut days: BTreeMap<NaiveDate, usize> = BTreeMap::new();
        for post in post_views(&store) {
            if !post.matches(filter) {
                continue;
            }
            if let Some(ts) = DateTime::<Utc>::from_timestamp(post.int("created_utc"), 0) {
                *days.entry(ts.date_naive()).or_insert(0) += 1;
            }
        }
        Ok(days
            .into_iter()
            .map(|(date, count)| TimeBucket { date, count })
            .collect())
    }

    async fn search_posts(&self, terms: &[String], limit: usize) -> ClientResult<Vec<PostSummary>> {
        self.ensure_open()?;
        let store = self.store.read().await;
        let terms: Vec<String> = terms.iter().map(|t| t.to_lowercase()).collect();

        let mut hits: Vec<PostView<'_>> = post_views(&store)
            .into_iter()
            .filter(|post| {
                if terms.is_empty() {
                    return true;
                }
                let title = post.str("title").to_lowercase();
                let body = post.str("selftext").to_lowercase();
                terms.iter().any(|t| title.contains(t.as_str()) || body.contains(t.as_str()))
            })
            .collect();
        hits.sort_by(|a, b| b.int("score").cmp(&a.int("score")));
        Ok(hits.iter().take(limit).map(PostView::summary).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::{EdgeType, Label, PropertyValue};
    use tempfile::TempDir;

    fn post(id: &str, score: i64) -> PostRecord {
        PostRecord {
            id: id.to_string(),
            title: format!("title of {}", id),
            created_utc: 1_700_000_000,
            score,
            ..Default::default()
        }
    }

    async fn seeded() -> EmbeddedGraphClient {
        let client = EmbeddedGraphClient::new();
        client.ensure_constraints().await.unwrap();
        for (id, sub, author, score) in [
            ("t3_1", "rust", "alice", 5),
            ("t3_2", "rust", "bob", 9),
            ("t3_3", "golang", "alice", 1),
        ] {
            client.upsert_post(&post(id, score)).await.unwrap();
            client
                .upsert_edge_from_key(&NodeRef::post(id), Relation::PostedIn, &NodeRef::subreddit(sub))
                .await
                .unwrap();
            client
                .upsert_edge_from_key(&NodeRef::post(id), Relation::AuthoredBy, &NodeRef::author(author))
                .await
                .unwrap();
        }
        client
    }

    #[tokio::test]
    async fn test_upsert_post_last_write_wins() {
        let client = EmbeddedGraphClient::new();
        client.ensure_constraints().await.unwrap();
        client.ensure_constraints().await.unwrap();

        client.upsert_post(&post("t3_1", 10)).await.unwrap();
        client.upsert_post(&post("t3_1", 20)).await.unwrap();

        let store = client.store_read().await;
        let posts = store.get_nodes_by_label(&Label::new("Post"));
        assert_eq!(posts.len(), 1);
        assert_eq!(posts[0].get_property("score"), Some(&PropertyValue::Integer(20)));
    }

    #[tokio::test]
    async fn test_edge_from_key_is_idempotent() {
        let client = EmbeddedGraphClient::new();
        client.upsert_post(&post("t3_1", 1)).await.unwrap();
        for _ in 0..3 {
            client
                .upsert_edge_from_key(&NodeRef::post("t3_1"), Relation::Discusses, &NodeRef::topic("rust"))
                .await
                .unwrap();
        }
        let stats = client.stats().await.unwrap();
        assert_eq!(stats.nodes_with("Topic"), 1);
        assert_eq!(stats.edges_with("DISCUSSES"), 1);
    }

    #[tokio::test]
    async fn test_edge_from_missing_source_is_transient() {
        let client = EmbeddedGraphClient::new();
        let err = client
            .upsert_edge_from_key(&NodeRef::post("nope"), Relation::PostedIn, &NodeRef::subreddit("rust"))
            .await
            .unwrap_err();
        assert!(matches!(err, ClientError::Operation(_)));
        assert!(!err.is_fatal());
        assert_eq!(client.stats().await.unwrap().total_nodes, 0);
    }

    #[tokio::test]
    async fn test_interaction_is_canonical() {
        let client = EmbeddedGraphClient::new();
        client.upsert_interaction("bob", "alice").await.unwrap();
        client.upsert_interaction("alice", "bob").await.unwrap();
        client.upsert_interaction("carol", "carol").await.unwrap();

        assert_eq!(
            client.interactions().await.unwrap(),
            vec![("alice".to_string(), "bob".to_string())]
        );
        let store = client.store_read().await;
        assert_eq!(store.label_count(&Label::new("Author")), 2);
        assert_eq!(store.edge_type_count(&EdgeType::new("INTERACTS_WITH")), 1);
    }

    #[tokio::test]
    async fn test_reset_and_close() {
        let client = seeded().await;
        client.reset_all().await.unwrap();
        assert_eq!(client.stats().await.unwrap().total_nodes, 0);

        client.close();
        let err = client.upsert_post(&post("t3_9", 0)).await.unwrap_err();
        assert!(err.is_fatal());
        assert!(client.stats().await.unwrap_err().is_fatal());
    }

    #[tokio::test]
    async fn test_read_queries() {
        let client = seeded().await;
        client
            .upsert_edge_from_key(&NodeRef::post("t3_2"), Relation::Discusses, &NodeRef::topic("borrowck"))
            .await
            .unwrap();

        let members = client.community_authors().await.unwrap();
        assert_eq!(members[0].community, "rust");
        assert_eq!(members[0].authors, vec!["alice", "bob"]);
        assert_eq!(members[1].authors, vec!["alice"]);

        let by_author = client.author_communities(&PostFilter::default(), 10).await.unwrap();
        assert_eq!(by_author[0].author, "alice");
        assert_eq!(by_author[0].communities, vec!["rust", "golang"]);
        assert_eq!(client.author_communities(&PostFilter::default(), 1).await.unwrap().len(), 1);

        let counts = client.community_post_counts(&PostFilter::default(), 10).await.unwrap();
        assert_eq!(counts[0], NameCount { name: "rust".into(), count: 2 });

        let filtered = PostFilter::new().communities(["golang"]);
        let counts = client.community_post_counts(&filtered, 10).await.unwrap();
        assert_eq!(counts.len(), 1);

        let topics = client.topic_mentions(&PostFilter::default(), 10).await.unwrap();
        assert_eq!(topics, vec![NameCount { name: "borrowck".into(), count: 1 }]);

        let series = client.post_time_series(&PostFilter::default()).await.unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].count, 3);
        assert_eq!(series[0].date, NaiveDate::from_ymd_opt(2023, 11, 14).unwrap());

        let hits = client.search_posts(&["TITLE".to_string()], 2).await.unwrap();
        assert_eq!(hits.len(), 2);
        assert_eq!(hits[0].id, "t3_2");
        assert_eq!(hits[0].author.as_deref(), Some("bob"));
        assert!(client.search_posts(&["absent".to_string()], 5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_checkpoint_and_reopen() {
        let dir = TempDir::new().unwrap();
        {
            let client = EmbeddedGraphClient::open(dir.path()).unwrap();
            client.ensure_constraints().await.unwrap();
            client.upsert_post(&post("t3_1", 3)).await.unwrap();
            client.upsert_interaction("alice", "bob").await.unwrap();
            assert!(client.checkpoint().await.unwrap());
        }

        let client = EmbeddedGraphClient::open(dir.path()).unwrap();
        let stats = client.stats().await.unwrap();
        assert_eq!(stats.nodes_with("Post"), 1);
        assert_eq!(stats.nodes_with("Author"), 2);
        assert_eq!(stats.edges_with("INTERACTS_WITH"), 1);

        // constraints came back with the image
        client.upsert_post(&post("t3_1", 4)).await.unwrap();
        assert_eq!(client.stats().await.unwrap().nodes_with("Post"), 1);

        assert!(!EmbeddedGraphClient::new().checkpoint().await.unwrap());
    }
}
