//! Socialgraph
//!
//! Builds a property graph of social-media posts and finds author communities in it.
//!
//! # Architecture
//!
//! - `graph`: in-process property graph with uniqueness constraints and merge primitives
//! - `persistence`: RocksDB snapshots of the graph
//! - `client`: idempotent upsert and read-back traits, plus the embedded implementation
//! - `extract`: topic, entity and query-term extraction from post text
//! - `ingest`: JSON-lines records, interaction derivation and the batched pipeline
//! - `algo`: network views over the graph and Louvain community detection
//! - `config`: YAML configuration and logging setup
//!
//! ## Data model
//!
//! | Label | Key | Relations |
//! |---|---|---|
//! | Post | id | POSTED_IN, AUTHORED_BY, DISCUSSES, CONTAINS |
//! | Author | name | INTERACTS_WITH |
//! | Subreddit | name | |
//! | Topic | name | |
//! | Entity | (type, value) | |
//!
//! ## Example Usage
//!
//! ```rust
//! use socialgraph::extract::{extract_entities, extract_topics, EntityKind};
//! use socialgraph::graph::{GraphStore, NodeKey, PropertyMap};
//!
//! let entities = extract_entities("check https://example.com #finance cc @alice");
//! assert_eq!(entities.len(), 3);
//! assert_eq!(entities[0].kind, EntityKind::Url);
//!
//! let topics = extract_topics(
//!     "Rust ownership makes concurrency safer; rust borrow checking catches ownership bugs",
//!     3,
//! );
//! assert_eq!(topics[0], "rust");
//!
//! let mut store = GraphStore::new();
//! store.create_constraint("Author", &["name"]).unwrap();
//! let key = NodeKey::single("name", "alice");
//! let (first, created) = store.merge_node("Author", &key, PropertyMap::new()).unwrap();
//! let (again, created_again) = store.merge_node("Author", &key, PropertyMap::new()).unwrap();
//! assert!(created && !created_again);
//! assert_eq!(first, again);
//! ```

#![allow(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod client;
pub mod config;
pub mod extract;
pub mod graph;
pub mod ingest;
pub mod persistence;
pub mod schema;

// Re-export main types for convenience
pub use graph::{
    Edge, EdgeId, EdgeType, GraphError, GraphResult, GraphStore, Label, Node, NodeId, NodeKey,
    PropertyMap, PropertyValue,
};

pub use persistence::{PersistentStorage, StorageError, StorageResult};

pub use schema::{NodeLabel, NodeRef, PostRecord, Relation};

pub use client::{
    ClientError, ClientResult, EmbeddedGraphClient, GraphReadClient, GraphUpsertClient,
    PostFilter,
};

pub use extract::{
    extract_entities, extract_features, extract_query_terms, extract_topics, Entity, EntityKind,
    TextFeatures,
};

pub use ingest::{CancellationFlag, IngestError, IngestPipeline, IngestReport};

pub use algo::{
    detect_communities, CommunityError, LouvainConfig, NetworkGraph, NetworkLink, NetworkNode,
};

pub use config::{AppConfig, ConfigError};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get version string
pub fn version() -> &'static str {
    VERSION
}
