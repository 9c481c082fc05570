//! Endpoint → incident edge index
//!
//! Lets collapse and expand look up the edges touching a container's children
//! (or a collapsed container itself) without scanning every edge in the store.
//! Kept current incrementally: the store updates it whenever an edge or
//! hyperedge is added, re-pointed, or removed.

use std::collections::HashMap;

use indexmap::IndexSet;

use crate::model::{EdgeId, NodeId};

/// An entry in the index: either an original edge or a hyperedge.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndexedEdge {
    Original(EdgeId),
    Hyper(EdgeId),
}

impl IndexedEdge {
    pub fn id(&self) -> &EdgeId {
        match self {
            IndexedEdge::Original(id) | IndexedEdge::Hyper(id) => id,
        }
    }

    pub(crate) fn is_hyper(&self) -> bool {
        matches!(self, IndexedEdge::Hyper(_))
    }
}

#[derive(Debug, Clone, Default)]
pub struct EdgeIndex {
    incident: HashMap<NodeId, IndexSet<IndexedEdge>>,
}

impl EdgeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `edge` under both of its endpoints.
    pub fn insert(&mut self, edge: IndexedEdge, source: &NodeId, target: &NodeId) {
        self.incident
            .entry(source.clone())
            .or_default()
            .insert(edge.clone());
        self.incident.entry(target.clone()).or_default().insert(edge);
    }

    /// Drop `edge` from both of its endpoints' entries.
    pub fn remove(&mut self, edge: &IndexedEdge, source: &NodeId, target: &NodeId) {
        for endpoint in [source, target] {
            if let Some(set) = self.incident.get_mut(endpoint.as_str()) {
                set.shift_remove(edge);
                if set.is_empty() {
                    self.incident.remove(endpoint.as_str());
                }
            }
        }
    }

    /// Edges with `id` as source or target, in insertion order.
    pub fn incident(&self, id: &str) -> impl Iterator<Item = &IndexedEdge> {
        self.incident.get(id).into_iter().flatten()
    }

    /// Hyperedges with `id` as source or target.
    pub fn incident_hyperedges(&self, id: &str) -> Vec<EdgeId> {
        self.incident(id)
            .filter(|e| e.is_hyper())
            .map(|e| e.id().clone())
            .collect()
    }

    /// Every edge touching at least one of `members`, deduplicated, in member order.
    pub fn touching<'a>(&self, members: impl IntoIterator<Item = &'a NodeId>) -> IndexSet<IndexedEdge> {
        let mut out = IndexSet::new();
        for member in members {
            out.extend(self.incident(member.as_str()).cloned());
        }
        out
    }

    /// Number of endpoints with at least one incident edge.
    pub fn endpoint_count(&self) -> usize {
        self.incident.len()
    }
}
