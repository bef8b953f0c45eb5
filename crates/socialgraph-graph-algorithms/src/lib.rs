pub mod common;
pub mod community;
pub mod louvain;

pub use common::{NodeId, WeightedGraph};
pub use community::{component_members, weakly_connected_components, WccResult};
pub use louvain::{louvain, modularity, LouvainConfig, LouvainResult};
