//! Persistence layer
//!
//! The embedded client keeps the live graph in memory and checkpoints whole images
//! to RocksDB; `load_graph` rebuilds the store and its indices on open.

pub mod storage;

pub use storage::{PersistentStorage, StorageError, StorageResult};
