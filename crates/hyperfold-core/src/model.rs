//! Core data structures for the hierarchical graph

use std::borrow::Borrow;
use std::fmt;

use indexmap::{IndexMap, IndexSet};
use serde::{Deserialize, Serialize};

/// Identifier of a hierarchy member: a leaf node or a container.
///
/// Nodes and containers share one namespace, so an edge endpoint or a
/// container child can name either kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub String);

/// Identifier of an edge or hyperedge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EdgeId(pub String);

macro_rules! string_id {
    ($name:ident) => {
        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                $name(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                $name(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                $name(id)
            }
        }

        impl From<&$name> for $name {
            fn from(id: &$name) -> Self {
                id.clone()
            }
        }
    };
}

string_id!(NodeId);
string_id!(EdgeId);

impl EdgeId {
    /// Preferred hyperedge id for a (source, target) pair. The store
    /// suffixes it with `#2`, `#3`, ... when the name is already taken.
    pub fn hyper(source: &NodeId, target: &NodeId) -> Self {
        EdgeId(format!("hyper_{}_to_{}", source, target))
    }
}

/// Visual style of an edge, ordered by aggregation priority.
///
/// When several edges are folded into one hyperedge the highest variant wins.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum EdgeStyle {
    #[default]
    Default,
    Highlighted,
    Thick,
    Warning,
    Error,
}

/// Visual style of a node or container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeStyle {
    #[default]
    Default,
    Highlighted,
    Selected,
    Warning,
    Error,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: f64,
    pub height: f64,
}

impl Dimensions {
    pub const fn new(width: f64, height: f64) -> Self {
        Dimensions { width, height }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

/// Default sizes handed to newly created entities.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub node_dimensions: Dimensions,
    pub container_dimensions: Dimensions,
    pub collapsed_dimensions: Dimensions,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            node_dimensions: Dimensions::new(180.0, 60.0),
            container_dimensions: Dimensions::new(400.0, 300.0),
            collapsed_dimensions: Dimensions::new(200.0, 150.0),
        }
    }
}

/// A leaf node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub id: NodeId,
    pub label: String,
    pub style: NodeStyle,
    pub dimensions: Dimensions,
    pub position: Option<Position>,
    pub hidden: bool,
}

/// An original edge between two hierarchy members.
///
/// Collapse and expand only flip `hidden`; edges are never deleted by them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub style: EdgeStyle,
    pub hidden: bool,
}

/// A grouping entity owning nodes and other containers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Container {
    pub id: NodeId,
    pub label: String,
    pub style: NodeStyle,
    pub children: IndexSet<NodeId>,
    pub collapsed: bool,
    pub hidden: bool,
    /// Currently displayed size.
    pub dimensions: Dimensions,
    pub expanded_dimensions: Dimensions,
    pub collapsed_dimensions: Dimensions,
    pub position: Option<Position>,
    /// Children that the last collapse hid, so expand unhides exactly those.
    #[serde(default)]
    pub(crate) folded: IndexSet<NodeId>,
}

/// The leaf-level endpoints an aggregated edge had before any collapsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginalEndpoints {
    pub source: NodeId,
    pub target: NodeId,
}

/// A synthetic edge summarizing boundary-crossing edges of collapsed containers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperEdge {
    pub id: EdgeId,
    /// The visible (possibly collapsed) source.
    pub source: NodeId,
    /// The visible (possibly collapsed) target.
    pub target: NodeId,
    pub style: EdgeStyle,
    pub hidden: bool,
    /// Every original edge folded into this hyperedge, with its leaf endpoints.
    pub aggregated: IndexMap<EdgeId, OriginalEndpoints>,
}

impl HyperEdge {
    pub(crate) fn new(id: EdgeId, source: NodeId, target: NodeId) -> Self {
        HyperEdge {
            id,
            source,
            target,
            style: EdgeStyle::Default,
            hidden: false,
            aggregated: IndexMap::new(),
        }
    }

    /// How many original edges this hyperedge stands for.
    pub fn count(&self) -> usize {
        self.aggregated.len()
    }
}

/// Which kind of entity an id refers to. Used in error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EntityKind {
    Node,
    Edge,
    Container,
    HyperEdge,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Node => "node",
            EntityKind::Edge => "edge",
            EntityKind::Container => "container",
            EntityKind::HyperEdge => "hyperedge",
        };
        f.write_str(name)
    }
}

/// Upsert patch for a node. `None` keeps the current value, or the default
/// when the node is new.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeUpdate {
    pub label: Option<String>,
    pub style: Option<NodeStyle>,
    pub dimensions: Option<Dimensions>,
    pub hidden: Option<bool>,
}

impl NodeUpdate {
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn style(mut self, style: NodeStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn dimensions(mut self, dimensions: Dimensions) -> Self {
        self.dimensions = Some(dimensions);
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = Some(hidden);
        self
    }
}

/// Upsert patch for an edge's optional fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeUpdate {
    pub style: Option<EdgeStyle>,
    pub hidden: Option<bool>,
}

impl EdgeUpdate {
    pub fn style(mut self, style: EdgeStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = Some(hidden);
        self
    }
}

/// Upsert patch for a container. Collapsed state is owned by the engine and
/// cannot be set here.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainerUpdate {
    pub label: Option<String>,
    pub style: Option<NodeStyle>,
    pub hidden: Option<bool>,
    pub expanded_dimensions: Option<Dimensions>,
    pub collapsed_dimensions: Option<Dimensions>,
}

impl ContainerUpdate {
    pub fn label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    pub fn style(mut self, style: NodeStyle) -> Self {
        self.style = Some(style);
        self
    }

    pub fn hidden(mut self, hidden: bool) -> Self {
        self.hidden = Some(hidden);
        self
    }

    pub fn expanded_dimensions(mut self, dimensions: Dimensions) -> Self {
        self.expanded_dimensions = Some(dimensions);
        self
    }

    pub fn collapsed_dimensions(mut self, dimensions: Dimensions) -> Self {
        self.collapsed_dimensions = Some(dimensions);
        self
    }
}

/// Layout write-back from a layout engine. Never touches visibility or hierarchy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutUpdate {
    pub position: Option<Position>,
    pub dimensions: Option<Dimensions>,
}

/// An edge as seen by layout and render consumers: original edges and
/// hyperedges look the same here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibleEdge {
    pub id: EdgeId,
    pub source: NodeId,
    pub target: NodeId,
    pub style: EdgeStyle,
    /// Number of original edges behind a hyperedge; `None` for an original edge.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aggregated: Option<usize>,
}

impl VisibleEdge {
    pub fn is_hyper(&self) -> bool {
        self.aggregated.is_some()
    }
}

impl From<&Edge> for VisibleEdge {
    fn from(edge: &Edge) -> Self {
        VisibleEdge {
            id: edge.id.clone(),
            source: edge.source.clone(),
            target: edge.target.clone(),
            style: edge.style,
            aggregated: None,
        }
    }
}

impl From<&HyperEdge> for VisibleEdge {
    fn from(hyper: &HyperEdge) -> Self {
        VisibleEdge {
            id: hyper.id.clone(),
            source: hyper.source.clone(),
            target: hyper.target.clone(),
            style: hyper.style,
            aggregated: Some(hyper.count()),
        }
    }
}
