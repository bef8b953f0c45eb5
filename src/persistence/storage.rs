//! RocksDB snapshot storage for the graph store
//!
//! Column families:
//! - `nodes`: big-endian node id -> bincode `StoredNode`
//! - `edges`: big-endian edge id -> bincode `StoredEdge`
//! - `meta`:  named records (constraint definitions, format version)

use crate::graph::{Edge, EdgeId, EdgeType, GraphError, GraphStore, Label, Node, NodeId, PropertyMap};
use rocksdb::{ColumnFamilyDescriptor, Options, WriteBatch, DB};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info};

const CF_NODES: &str = "nodes";
const CF_EDGES: &str = "edges";
const CF_META: &str = "meta";

const META_CONSTRAINTS: &[u8] = b"constraints";
const META_FORMAT: &[u8] = b"format_version";
const FORMAT_VERSION: u32 = 1;

/// Storage errors
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("RocksDB error: {0}")]
    RocksDb(#[from] rocksdb::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] bincode::Error),

    #[error("Column family error: {0}")]
    ColumnFamily(String),

    /// Persisted image could not be replayed into a graph store
    #[error("Corrupt graph image: {0}")]
    Corrupt(#[from] GraphError),

    #[error("Unsupported storage format version {0}")]
    Format(u32),
}

pub type StorageResult<T> = Result<T, StorageError>;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredNode {
    id: u64,
    labels: Vec<String>,
    properties: Vec<u8>, // bincode PropertyMap
    created_at: i64,
    updated_at: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredEdge {
    id: u64,
    source: u64,
    target: u64,
    edge_type: String,
    properties: Vec<u8>, // bincode PropertyMap
    created_at: i64,
}

impl StoredNode {
    fn from_node(node: &Node) -> StorageResult<Self> {
        let mut labels: Vec<String> = node.labels.iter().map(|l| l.as_str().to_string()).collect();
        labels.sort();
        Ok(StoredNode {
            id: node.id.as_u64(),
            labels,
            properties: bincode::serialize(&node.properties)?,
            created_at: node.created_at,
            updated_at: node.updated_at,
        })
    }

    fn into_node(self) -> StorageResult<Node> {
        let properties: PropertyMap = bincode::deserialize(&self.properties)?;
        Ok(Node {
            id: NodeId::new(self.id),
            labels: self.labels.into_iter().map(Label::new).collect(),
            properties,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

impl StoredEdge {
    fn from_edge(edge: &Edge) -> StorageResult<Self> {
        Ok(StoredEdge {
            id: edge.id.as_u64(),
            source: edge.source.as_u64(),
            target: edge.target.as_u64(),
            edge_type: edge.edge_type.as_str().to_string(),
            properties: bincode::serialize(&edge.properties)?,
            created_at: edge.created_at,
        })
    }

    fn into_edge(self) -> StorageResult<Edge> {
        let properties: PropertyMap = bincode::deserialize(&self.properties)?;
        Ok(Edge {
            id: EdgeId::new(self.id),
            source: NodeId::new(self.source),
            target: NodeId::new(self.target),
            edge_type: EdgeType::new(self.edge_type),
            properties,
            created_at: self.created_at,
        })
    }
}

/// RocksDB-based persistent storage
pub struct PersistentStorage {
    db: Arc<DB>,
    path: PathBuf,
}

impl PersistentStorage {
    /// Open or create a persistent storage directory
    pub fn open(path: impl AsRef<Path>) -> StorageResult<Self> {
        let path = path.as_ref().to_path_buf();
        info!("Opening persistent storage at: {}", path.display());

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);
        opts.set_write_buffer_size(64 * 1024 * 1024);
        opts.set_max_write_buffer_number(3);
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts.set_wal_recovery_mode(rocksdb::DBRecoveryMode::PointInTime);

        let cf_descriptors = vec![
            ColumnFamilyDescriptor::new("default", Options::default()),
            ColumnFamilyDescriptor::new(CF_NODES, Self::data_cf_options()),
            ColumnFamilyDescriptor::new(CF_EDGES, Self::data_cf_options()),
            ColumnFamilyDescriptor::new(CF_META, Options::default()),
        ];

        let db = DB::open_cf_descriptors(&opts, &path, cf_descriptors)?;
        info!("Persistent storage opened successfully");

        Ok(Self {
            db: Arc::new(db),
            path,
        })
    }

    fn data_cf_options() -> Options {
        let mut opts = Options::default();
        opts.set_compression_type(rocksdb::DBCompressionType::Lz4);
        opts.set_bottommost_compression_type(rocksdb::DBCompressionType::Zstd);
        opts
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn cf(&self, name: &str) -> StorageResult<&rocksdb::ColumnFamily> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StorageError::ColumnFamily(name.to_string()))
    }

    /// Replace the persisted image with the current contents of `store`.
    ///
    /// Old records are range-deleted and the new ones written in one batch, so a
    /// reader never observes a mix of two images.
    pub fn save_graph(&self, store: &GraphStore) -> StorageResult<()> {
        let nodes_cf = self.cf(CF_NODES)?;
        let edges_cf = self.cf(CF_EDGES)?;
        let meta_cf = self.cf(CF_META)?;

        let mut batch = WriteBatch::default();
        let start = 0u64.to_be_bytes();
        let end = [0xffu8; 9];
        batch.delete_range_cf(nodes_cf, &start[..], &end[..]);
        batch.delete_range_cf(edges_cf, &start[..], &end[..]);

        for node in store.all_nodes() {
            let stored = StoredNode::from_node(node)?;
            batch.put_cf(nodes_cf, node.id.as_u64().to_be_bytes(), bincode::serialize(&stored)?);
        }
        for edge in store.all_edges() {
            let stored = StoredEdge::from_edge(edge)?;
            batch.put_cf(edges_cf, edge.id.as_u64().to_be_bytes(), bincode::serialize(&stored)?);
        }

        let constraints: Vec<(String, Vec<String>)> = store
            .constraints()
            .into_iter()
            .map(|(label, props)| (label.as_str().to_string(), props))
            .collect();
        batch.put_cf(meta_cf, META_CONSTRAINTS, bincode::serialize(&constraints)?);
        batch.put_cf(meta_cf, META_FORMAT, bincode::serialize(&FORMAT_VERSION)?);

        self.db.write(batch)?;
        info!(
            nodes = store.node_count(),
            edges = store.edge_count(),
            "Saved graph image"
        );
        Ok(())
    }

    /// Rebuild a graph store from the persisted image.
    ///
    /// An empty directory yields an empty store.
    pub fn load_graph(&self) -> StorageResult<GraphStore> {
        let mut store = GraphStore::new();

        let meta_cf = self.cf(CF_META)?;
        if let Some(raw) = self.db.get_cf(meta_cf, META_FORMAT)? {
            let version: u32 = bincode::deserialize(&raw)?;
            if version != FORMAT_VERSION {
                return Err(StorageError::Format(version));
            }
        }
        if let Some(raw) = self.db.get_cf(meta_cf, META_CONSTRAINTS)? {
            let constraints: Vec<(String, Vec<String>)> = bincode::deserialize(&raw)?;
            for (label, props) in constraints {
                let props: Vec<&str> = props.iter().map(String::as_str).collect();
                store.create_constraint(label.as_str(), &props)?;
            }
        }

        for node in self.scan_nodes()? {
            store.insert_recovered_node(node)?;
        }
        for edge in self.scan_edges()? {
            store.insert_recovered_edge(edge)?;
        }

        debug!(
            nodes = store.node_count(),
            edges = store.edge_count(),
            "Loaded graph image"
        );
        Ok(store)
    }

    /// All persisted nodes, ordered by id
    pub fn scan_nodes(&self) -> StorageResult<Vec<Node>> {
        let cf = self.cf(CF_NODES)?;
        let mut nodes = Vec::new();
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = item?;
            let stored: StoredNode = bincode::deserialize(&value)?;
            nodes.push(stored.into_node()?);
        }
        Ok(nodes)
    }

    /// All persisted edges, ordered by id
    pub fn scan_edges(&self) -> StorageResult<Vec<Edge>> {
        let cf = self.cf(CF_EDGES)?;
        let mut edges = Vec::new();
        for item in self.db.iterator_cf(cf, rocksdb::IteratorMode::Start) {
            let (_key, value) = item?;
            let stored: StoredEdge = bincode::deserialize(&value)?;
            edges.push(stored.into_edge()?);
        }
        Ok(edges)
    }

    /// Flush all data to disk
    pub fn flush(&self) -> StorageResult<()> {
        self.db.flush()?;
        for name in [CF_NODES, CF_EDGES, CF_META] {
            self.db.flush_cf(self.cf(name)?)?;
        }
        debug!("Flushed storage to disk");
        Ok(())
    }
}
