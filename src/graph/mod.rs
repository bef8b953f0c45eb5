//! Property graph data model
//!
//! - Nodes with labels and properties
//! - Directed, typed edges with properties
//! - In-memory storage with label / edge-type indices, uniqueness constraints and
//!   idempotent merge primitives

pub mod edge;
pub mod node;
pub mod property;
pub mod store;
pub mod types;

pub use edge::Edge;
pub use node::Node;
pub use property::{PropertyMap, PropertyValue};
pub use store::{GraphError, GraphResult, GraphStore};
pub use types::{EdgeId, EdgeType, Label, NodeId, NodeKey};
