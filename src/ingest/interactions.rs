//! Incremental author interaction derivation
//!
//! Two authors interact when both posted in the same community. Instead of
//! re-evaluating that over the whole graph per post, the index remembers which
//! authors each community has seen and which of them have all their pairs written.
//! Registering an author that is not yet committed hands out every co-author seen so
//! far; once its interaction writes succeed the caller commits it and later
//! registrations return nothing. A failed record therefore leaves its author
//! uncommitted and the next record by that author derives the pairs again.

use crate::client::CommunityMembers;
use indexmap::IndexSet;
use rustc_hash::{FxHashMap, FxHashSet};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct CommunityAuthors {
    /// Every author registered or found in the graph, in first-seen order
    seen: IndexSet<String>,
    /// Authors whose pairs with every earlier `seen` author are in the graph
    committed: FxHashSet<String>,
}

/// Community -> authors seen so far
#[derive(Debug, Default)]
pub struct InteractionIndex {
    communities: Mutex<FxHashMap<String, CommunityAuthors>>,
}

impl InteractionIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an index from authors already in the graph.
    ///
    /// Graph authors start uncommitted: the graph cannot tell whether a previous run
    /// wrote all their pairs, so each one re-derives them the first time it shows up.
    pub fn seeded(members: Vec<CommunityMembers>) -> Self {
        let communities = members
            .into_iter()
            .map(|m| {
                let authors = CommunityAuthors {
                    seen: m.authors.into_iter().collect(),
                    committed: FxHashSet::default(),
                };
                (m.community, authors)
            })
            .collect();
        Self {
            communities: Mutex::new(communities),
        }
    }

    /// Record `author` in `community` and return the co-authors it must be paired with.
    ///
    /// Empty once the author is committed. Until then every call returns all other
    /// seen authors; `upsert_interaction` is idempotent so repeats cost a write, not a
    /// duplicate edge.
    pub async fn register(&self, community: &str, author: &str) -> Vec<String> {
        let mut communities = self.communities.lock().await;
        let authors = communities.entry(community.to_string()).or_default();
        authors.seen.insert(author.to_string());
        if authors.committed.contains(author) {
            return Vec::new();
        }
        authors.seen.iter().filter(|a| a.as_str() != author).cloned().collect()
    }

    /// Mark `author`'s pairs in `community` as written
    pub async fn commit(&self, community: &str, author: &str) {
        let mut communities = self.communities.lock().await;
        if let Some(authors) = communities.get_mut(community) {
            authors.committed.insert(author.to_string());
        }
    }

    pub async fn community_count(&self) -> usize {
        self.communities.lock().await.len()
    }

    pub async fn author_count(&self, community: &str) -> usize {
        self.communities
            .lock()
            .await
            .get(community)
            .map_or(0, |authors| authors.seen.len())
    }
}
