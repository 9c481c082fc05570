//! Test utilities for Hyperfold

use crate::*;

/// Small builder so fixtures read like the graphs they describe.
#[derive(Default)]
pub struct GraphBuilder {
    store: GraphStore,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn nodes(mut self, ids: &[&str]) -> Self {
        for id in ids {
            self.store.set_node(*id, NodeUpdate::default()).unwrap();
        }
        self
    }

    pub fn container(mut self, id: &str, children: &[&str]) -> Self {
        self.store.set_container(id, ContainerUpdate::default()).unwrap();
        for child in children {
            self.store.add_container_child(id, child).unwrap();
        }
        self
    }

    pub fn edge(self, id: &str, source: &str, target: &str) -> Self {
        self.styled_edge(id, source, target, EdgeStyle::Default)
    }

    pub fn styled_edge(mut self, id: &str, source: &str, target: &str, style: EdgeStyle) -> Self {
        self.store
            .set_edge(id, source, target, EdgeUpdate::default().style(style))
            .unwrap();
        self
    }

    pub fn store(self) -> GraphStore {
        self.store
    }

    pub fn engine(self) -> CollapseExpandEngine {
        CollapseExpandEngine::new(self.store)
    }
}

/// `internal` inside `container1`, one edge out to `external`.
pub fn scenario_a() -> CollapseExpandEngine {
    GraphBuilder::new()
        .nodes(&["internal", "external"])
        .container("container1", &["internal"])
        .edge("edge1", "internal", "external")
        .engine()
}

/// Two containers sharing an external node.
pub fn scenario_b() -> CollapseExpandEngine {
    GraphBuilder::new()
        .nodes(&["n1", "n2", "n3", "n4", "ext"])
        .container("A", &["n1", "n2"])
        .container("B", &["n3", "n4"])
        .edge("n1-n2", "n1", "n2")
        .edge("n3-n4", "n3", "n4")
        .edge("n1-n3", "n1", "n3")
        .edge("n2-ext", "n2", "ext")
        .edge("n4-ext", "n4", "ext")
        .engine()
}

/// `outer = {inner, sibling}`, `inner = {leaf}`, plus an external node.
pub fn nested() -> CollapseExpandEngine {
    GraphBuilder::new()
        .nodes(&["leaf", "sibling", "ext"])
        .container("inner", &["leaf"])
        .container("outer", &["inner", "sibling"])
        .edge("leaf-ext", "leaf", "ext")
        .edge("ext-leaf", "ext", "leaf")
        .edge("sibling-leaf", "sibling", "leaf")
        .edge("sibling-ext", "sibling", "ext")
        .engine()
}

/// Everything a caller can observe about visibility, in a comparable form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VisibleState {
    pub nodes: Vec<String>,
    pub containers: Vec<(String, bool)>,
    pub edges: Vec<String>,
    pub hidden_edges: Vec<String>,
    pub hyperedges: usize,
}

pub fn visible_state(store: &GraphStore) -> VisibleState {
    VisibleState {
        nodes: store
            .visible_nodes()
            .iter()
            .map(|n| n.id.to_string())
            .collect(),
        containers: store
            .visible_containers()
            .iter()
            .map(|c| (c.id.to_string(), c.collapsed))
            .collect(),
        edges: store
            .visible_edges()
            .iter()
            .map(|e| e.id.to_string())
            .collect(),
        hidden_edges: store
            .edges()
            .filter(|e| e.hidden)
            .map(|e| e.id.to_string())
            .collect(),
        hyperedges: store.hyperedge_count(),
    }
}

/// Every visible edge endpoint must itself be a visible unit, and must
/// resolve to itself.
pub fn assert_endpoints_resolve(store: &GraphStore) {
    for edge in store.visible_edges() {
        for endpoint in [&edge.source, &edge.target] {
            assert!(store.is_visible(endpoint.as_str()), "{} endpoint {} not visible", edge.id, endpoint);
            assert_eq!(
                store.resolve_visible_ancestor(endpoint.as_str()).as_ref(),
                Some(endpoint),
                "{} endpoint {} does not resolve to itself",
                edge.id,
                endpoint
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixtures_build() {
        let a = scenario_a();
        assert_eq!(a.store().node_count(), 2);
        assert_eq!(a.store().container_count(), 1);

        let b = scenario_b();
        assert_eq!(b.store().edge_count(), 5);

        let n = nested();
        assert_eq!(n.store().parent_of("inner").unwrap().as_str(), "outer");
    }
}
