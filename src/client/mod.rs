//! Graph client interface
//!
//! Everything above the graph talks to it through two traits:
//! - `GraphUpsertClient`: the idempotent write primitives ingestion relies on
//! - `GraphReadClient`: read-back queries for analytics and community detection
//!
//! `EmbeddedGraphClient` implements both over an in-process `GraphStore`.

pub mod embedded;
pub mod error;
pub mod models;

pub use embedded::EmbeddedGraphClient;
pub use error::{ClientError, ClientResult};
pub use models::{
    AuthorCommunities, CommunityMembers, GraphStats, NameCount, PostFilter, PostSummary,
    TimeBucket,
};

use crate::schema::{NodeRef, PostRecord, Relation};
use async_trait::async_trait;

/// Idempotent write operations.
///
/// Applying any call twice leaves the graph as applying it once.
#[async_trait]
pub trait GraphUpsertClient: Send + Sync {
    /// Establish uniqueness on every node label's key. Safe to repeat.
    async fn ensure_constraints(&self) -> ClientResult<()>;

    /// Create the post or overwrite its scalar attributes
    async fn upsert_post(&self, post: &PostRecord) -> ClientResult<()>;

    /// Ensure `target` exists, then ensure `source -[relation]-> target`.
    /// The source must already exist.
    async fn upsert_edge_from_key(
        &self,
        source: &NodeRef,
        relation: Relation,
        target: &NodeRef,
    ) -> ClientResult<()>;

    /// Ensure both authors and one interaction edge between them exist.
    /// `(a, b)` and `(b, a)` are the same edge; `a == b` is a no-op.
    async fn upsert_interaction(&self, a: &str, b: &str) -> ClientResult<()>;

    /// Delete every node and relationship
    async fn reset_all(&self) -> ClientResult<()>;
}

/// Read-back queries over the social graph
#[async_trait]
pub trait GraphReadClient: Send + Sync {
    async fn stats(&self) -> ClientResult<GraphStats>;

    /// Authors per community, from AUTHORED_BY / POSTED_IN pairs
    async fn community_authors(&self) -> ClientResult<Vec<CommunityMembers>>;

    /// Every author pair joined by INTERACTS_WITH, as stored
    async fn interactions(&self) -> ClientResult<Vec<(String, String)>>;

    /// Distinct communities per author over the filtered posts, at most `limit` authors
    async fn author_communities(
        &self,
        filter: &PostFilter,
        limit: usize,
    ) -> ClientResult<Vec<AuthorCommunities>>;

    /// Posts per community, descending
    async fn community_post_counts(
        &self,
        filter: &PostFilter,
        limit: usize,
    ) -> ClientResult<Vec<NameCount>>;

    /// DISCUSSES edges per topic over the filtered posts, descending
    async fn topic_mentions(&self, filter: &PostFilter, limit: usize) -> ClientResult<Vec<NameCount>>;

    /// Posts per UTC day, ascending by date
    async fn post_time_series(&self, filter: &PostFilter) -> ClientResult<Vec<TimeBucket>>;

    /// Posts whose title or body contains any of `terms`, highest score first.
    /// No terms means the top posts overall.
    async fn search_posts(&self, terms: &[String], limit: usize) -> ClientResult<Vec<PostSummary>>;
}
