//! Hyperfold core: hierarchical graph store and collapse/expand engine

pub mod model;
pub mod error;
pub mod index;
pub mod store;
pub mod engine;
pub mod snapshot;
pub mod graph;
pub mod diff;


#[cfg(test)]
pub mod test_utils;

pub use model::{
    NodeId, EdgeId, EdgeStyle, NodeStyle, Dimensions, Position, StoreConfig, Node, Edge,
    Container, HyperEdge, OriginalEndpoints, EntityKind, NodeUpdate, EdgeUpdate,
    ContainerUpdate, LayoutUpdate, VisibleEdge,
};
pub use error::{GraphError, HierarchyViolation, Result};
pub use index::{EdgeIndex, IndexedEdge};
pub use store::GraphStore;
pub use engine::CollapseExpandEngine;
pub use snapshot::{VisibleSnapshot, VisibleUnit, UnitKind};
pub use graph::VisibleGraph;
pub use diff::{GraphDiff, DiffEngine};
