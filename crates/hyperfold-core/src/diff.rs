//! Visible-state diffs for incremental render updates

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::model::*;
use crate::snapshot::{VisibleSnapshot, VisibleUnit};

/// What changed on screen between two snapshots.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDiff {
    /// Monotonically increasing diff sequence number.
    pub sequence: u64,
    /// Units (nodes or containers) that became visible.
    pub added_nodes: Vec<VisibleUnit>,
    /// Units that are no longer visible.
    pub removed_nodes: Vec<NodeId>,
    /// Units still visible whose collapsed state, label, parent or size changed.
    pub modified_nodes: Vec<NodeId>,
    /// Edges (original or hyper) that became visible.
    pub added_edges: Vec<VisibleEdge>,
    /// Edges that are no longer visible.
    pub removed_edges: Vec<EdgeId>,
    /// Edges still visible whose style or aggregate count changed.
    pub modified_edges: Vec<EdgeId>,
}

impl GraphDiff {
    /// Create an empty diff with given sequence number.
    pub fn new(sequence: u64) -> Self {
        GraphDiff {
            sequence,
            ..Default::default()
        }
    }

    /// Check if this diff is empty (no changes).
    pub fn is_empty(&self) -> bool {
        self.added_nodes.is_empty()
            && self.removed_nodes.is_empty()
            && self.modified_nodes.is_empty()
            && self.added_edges.is_empty()
            && self.removed_edges.is_empty()
            && self.modified_edges.is_empty()
    }
}

/// Hands out sequenced diffs and remembers the last observed snapshot.
#[derive(Debug, Default)]
pub struct DiffEngine {
    sequence: u64,
    last: Option<VisibleSnapshot>,
}

impl DiffEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Compute the difference between two snapshots.
    /// Returns a GraphDiff with the sequence number incremented.
    pub fn compute_diff(&mut self, old: &VisibleSnapshot, new: &VisibleSnapshot) -> GraphDiff {
        self.sequence += 1;
        let mut diff = GraphDiff::new(self.sequence);

        let old_units: HashMap<&str, &VisibleUnit> =
            old.units().map(|u| (u.id.as_str(), u)).collect();
        let new_units: HashMap<&str, &VisibleUnit> =
            new.units().map(|u| (u.id.as_str(), u)).collect();

        for unit in new.units() {
            match old_units.get(unit.id.as_str()) {
                None => diff.added_nodes.push(unit.clone()),
                Some(&before) if before != unit => diff.modified_nodes.push(unit.id.clone()),
                Some(_) => {}
            }
        }
        diff.removed_nodes = old
            .units()
            .filter(|u| !new_units.contains_key(u.id.as_str()))
            .map(|u| u.id.clone())
            .collect();

        let old_edges: HashMap<&str, &VisibleEdge> =
            old.edges.iter().map(|e| (e.id.as_str(), e)).collect();
        let new_edges: HashMap<&str, &VisibleEdge> =
            new.edges.iter().map(|e| (e.id.as_str(), e)).collect();

        for edge in &new.edges {
            match old_edges.get(edge.id.as_str()) {
                None => diff.added_edges.push(edge.clone()),
                Some(&before) if before != edge => diff.modified_edges.push(edge.id.clone()),
                Some(_) => {}
            }
        }
        diff.removed_edges = old
            .edges
            .iter()
            .filter(|e| !new_edges.contains_key(e.id.as_str()))
            .map(|e| e.id.clone())
            .collect();

        diff
    }

    /// Diff `snapshot` against the previously observed one (an empty picture
    /// on the first call) and remember it.
    pub fn observe(&mut self, snapshot: VisibleSnapshot) -> GraphDiff {
        let previous = self.last.take().unwrap_or_default();
        let diff = self.compute_diff(&previous, &snapshot);
        self.last = Some(snapshot);
        diff
    }

    /// Get current sequence number.
    pub fn sequence(&self) -> u64 {
        self.sequence
    }
}
