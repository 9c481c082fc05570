//! Serializable picture of what is currently on screen

use serde::{Deserialize, Serialize};

use crate::model::*;
use crate::store::GraphStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    Node,
    Container,
}

/// A visible node or container, as handed to layout and render consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisibleUnit {
    pub id: NodeId,
    pub label: String,
    pub kind: UnitKind,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub collapsed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<NodeId>,
    pub dimensions: Dimensions,
}

impl std::fmt::Display for VisibleUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.collapsed {
            write!(f, "{} [+]", self.label)
        } else {
            f.write_str(&self.label)
        }
    }
}

impl std::fmt::Display for VisibleEdge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.aggregated {
            Some(count) => write!(f, "{} ×{}", self.id, count),
            None => write!(f, "{}", self.id),
        }
    }
}

/// The three visible projections of a store, captured at one moment.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VisibleSnapshot {
    pub containers: Vec<VisibleUnit>,
    pub nodes: Vec<VisibleUnit>,
    pub edges: Vec<VisibleEdge>,
}

impl VisibleSnapshot {
    pub fn capture(store: &GraphStore) -> Self {
        let containers = store
            .visible_containers()
            .into_iter()
            .map(|c| VisibleUnit {
                id: c.id.clone(),
                label: c.label.clone(),
                kind: UnitKind::Container,
                collapsed: c.collapsed,
                parent: store.parent_of(c.id.as_str()).cloned(),
                dimensions: c.dimensions,
            })
            .collect();
        let nodes = store
            .visible_nodes()
            .into_iter()
            .map(|n| VisibleUnit {
                id: n.id.clone(),
                label: n.label.clone(),
                kind: UnitKind::Node,
                collapsed: false,
                parent: store.parent_of(n.id.as_str()).cloned(),
                dimensions: n.dimensions,
            })
            .collect();

        VisibleSnapshot {
            containers,
            nodes,
            edges: store.visible_edges(),
        }
    }

    /// Containers followed by leaf nodes.
    pub fn units(&self) -> impl Iterator<Item = &VisibleUnit> {
        self.containers.iter().chain(self.nodes.iter())
    }

    pub fn hyperedge_count(&self) -> usize {
        self.edges.iter().filter(|e| e.is_hyper()).count()
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}
