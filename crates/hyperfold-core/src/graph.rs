//! Visible projection as a petgraph::StableDiGraph, for layout consumers

use std::collections::HashMap;

use petgraph::Direction;
use petgraph::dot::Dot;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};

use crate::model::{EdgeStyle, VisibleEdge};
use crate::snapshot::{UnitKind, VisibleSnapshot, VisibleUnit};
use crate::store::GraphStore;

/// Directed multigraph of visible units and visible edges (hyperedges
/// included). Containment is carried as `VisibleUnit::parent`, not as edges.
pub struct VisibleGraph {
    inner: StableDiGraph<VisibleUnit, VisibleEdge>,
    lookup: HashMap<String, NodeIndex>,
}

impl std::fmt::Debug for VisibleGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VisibleGraph")
            .field("node_count", &self.inner.node_count())
            .field("edge_count", &self.inner.edge_count())
            .finish()
    }
}

impl VisibleGraph {
    pub fn from_store(store: &GraphStore) -> Self {
        Self::from_snapshot(&VisibleSnapshot::capture(store))
    }

    pub fn from_snapshot(snapshot: &VisibleSnapshot) -> Self {
        let mut inner = StableDiGraph::new();
        let mut lookup = HashMap::new();
        for unit in snapshot.units() {
            let idx = inner.add_node(unit.clone());
            lookup.insert(unit.id.to_string(), idx);
        }
        for edge in &snapshot.edges {
            let (Some(&source), Some(&target)) = (
                lookup.get(edge.source.as_str()),
                lookup.get(edge.target.as_str()),
            ) else {
                tracing::warn!(edge = %edge.id, "visible edge with endpoint outside the snapshot");
                continue;
            };
            inner.add_edge(source, target, edge.clone());
        }
        VisibleGraph { inner, lookup }
    }

    pub fn node(&self, id: &str) -> Option<&VisibleUnit> {
        self.lookup
            .get(id)
            .and_then(|&idx| self.inner.node_weight(idx))
    }

    pub fn node_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn all_nodes(&self) -> impl Iterator<Item = &VisibleUnit> {
        self.inner
            .node_indices()
            .filter_map(move |idx| self.inner.node_weight(idx))
    }

    pub fn all_edges(&self) -> impl Iterator<Item = &VisibleEdge> {
        self.inner
            .edge_indices()
            .filter_map(move |idx| self.inner.edge_weight(idx))
    }

    /// Outgoing visible edges of a unit.
    pub fn edges_from(&self, source: &str) -> Vec<&VisibleEdge> {
        self.directed(source, Direction::Outgoing)
    }

    /// Incoming visible edges of a unit.
    pub fn edges_to(&self, target: &str) -> Vec<&VisibleEdge> {
        self.directed(target, Direction::Incoming)
    }

    fn directed(&self, id: &str, direction: Direction) -> Vec<&VisibleEdge> {
        let Some(&idx) = self.lookup.get(id) else {
            return Vec::new();
        };
        self.inner
            .edges_directed(idx, direction)
            .map(|edge_ref| edge_ref.weight())
            .collect()
    }

    pub fn has_edge_between(&self, source: &str, target: &str) -> bool {
        self.edges_from(source)
            .iter()
            .any(|e| e.target.as_str() == target)
    }

    /// Graphviz rendering of the visible graph.
    pub fn to_dot(&self) -> String {
        format!("{}", Dot::new(&self.inner))
    }

    /// Mermaid flowchart of the visible graph. Expanded containers become
    /// subgraphs; collapsed containers and leaves become plain nodes.
    pub fn to_mermaid(&self) -> String {
        let mut members: HashMap<Option<NodeIndex>, Vec<NodeIndex>> = HashMap::new();
        for idx in self.inner.node_indices() {
            let parent = self.inner[idx]
                .parent
                .as_ref()
                .and_then(|p| self.lookup.get(p.as_str()).copied());
            members.entry(parent).or_default().push(idx);
        }

        let mut out = String::from("flowchart TD\n");
        self.write_mermaid_members(None, 1, &members, &mut out);
        for edge in self.inner.edge_indices() {
            let (Some((source, target)), Some(weight)) =
                (self.inner.edge_endpoints(edge), self.inner.edge_weight(edge))
            else {
                continue;
            };
            let arrow = match weight.style {
                EdgeStyle::Default => "-->",
                EdgeStyle::Highlighted => "-.->",
                EdgeStyle::Thick | EdgeStyle::Warning | EdgeStyle::Error => "==>",
            };
            let label = match weight.aggregated {
                Some(count) => format!("|×{count}|"),
                None => String::new(),
            };
            out.push_str(&format!(
                "    n{}{arrow}{label}n{}\n",
                source.index(),
                target.index()
            ));
        }
        out
    }

    fn write_mermaid_members(
        &self,
        parent: Option<NodeIndex>,
        depth: usize,
        members: &HashMap<Option<NodeIndex>, Vec<NodeIndex>>,
        out: &mut String,
    ) {
        let pad = "    ".repeat(depth);
        for &idx in members.get(&parent).into_iter().flatten() {
            let unit = &self.inner[idx];
            let label = escape_mermaid(&unit.to_string());
            if unit.kind == UnitKind::Container && !unit.collapsed {
                out.push_str(&format!("{pad}subgraph n{} [\"{label}\"]\n", idx.index()));
                self.write_mermaid_members(Some(idx), depth + 1, members, out);
                out.push_str(&format!("{pad}end\n"));
            } else {
                out.push_str(&format!("{pad}n{}[\"{label}\"]\n", idx.index()));
            }
        }
    }

    pub fn inner(&self) -> &StableDiGraph<VisibleUnit, VisibleEdge> {
        &self.inner
    }
}

/// Escape characters that Mermaid would read as syntax inside a label.
fn escape_mermaid(label: &str) -> String {
    label
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('#', "&num;")
        .replace('`', "&#96;")
        .replace('(', "&#40;")
        .replace(')', "&#41;")
        .replace('|', "&#124;")
        .replace('\n', "<br>")
}
