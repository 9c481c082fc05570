//! Load visualizer graph JSON into a GraphStore

pub mod format;

use std::path::{Path, PathBuf};

use hyperfold_core::{
    ContainerUpdate, EdgeStyle, EdgeUpdate, GraphError, GraphStore, NodeUpdate, StoreConfig,
};
use thiserror::Error;

pub use format::{EdgeRecord, GraphDocument, HierarchyChoice, HierarchyNode, Key, NodeRecord};

/// Semantic tag that marks an edge as drawn thick.
pub const NETWORK_TAG: &str = "Network";

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid graph JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown hierarchy choice {requested:?} (available: {available:?})")]
    UnknownHierarchy {
        requested: String,
        available: Vec<String>,
    },
    #[error(transparent)]
    Graph(#[from] GraphError),
}

pub type Result<T, E = LoadError> = std::result::Result<T, E>;

/// Builds a [`GraphStore`] from a [`GraphDocument`].
#[derive(Debug, Clone, Default)]
pub struct GraphLoader {
    config: StoreConfig,
    hierarchy: Option<String>,
}

impl GraphLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: StoreConfig) -> Self {
        self.config = config;
        self
    }

    /// Use this hierarchy choice instead of the document's selection.
    pub fn hierarchy(mut self, choice: impl Into<String>) -> Self {
        self.hierarchy = Some(choice.into());
        self
    }

    pub fn load_path(&self, path: impl AsRef<Path>) -> Result<GraphStore> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        tracing::debug!("Loading graph from {}", path.display());
        self.load_str(&json)
    }

    pub fn load_str(&self, json: &str) -> Result<GraphStore> {
        let document: GraphDocument = serde_json::from_str(json)?;
        self.load_document(&document)
    }

    pub fn load_document(&self, document: &GraphDocument) -> Result<GraphStore> {
        let mut store = GraphStore::with_config(self.config.clone());
        self.populate(&mut store, document)?;
        Ok(store)
    }

    /// Upsert the document's nodes, chosen hierarchy and edges into `store`,
    /// in that order.
    pub fn populate(&self, store: &mut GraphStore, document: &GraphDocument) -> Result<()> {
        for node in &document.nodes {
            store.set_node(
                node.id.as_str(),
                NodeUpdate::default().label(node.display_label()),
            )?;
        }

        if let Some(choice) = self.select_choice(document)? {
            for root in &choice.children {
                add_container_tree(store, root, None)?;
            }
            let assignments = document.node_assignments.get(&choice.id);
            let mut assigned = 0usize;
            for (node, container) in assignments.into_iter().flatten() {
                let container = container.to_string();
                if store.node(node).is_none() {
                    tracing::warn!(node = %node, "assignment for unknown node");
                    continue;
                }
                if store.container(&container).is_none() {
                    tracing::warn!(node = %node, container = %container, "assignment to unknown container");
                    continue;
                }
                store.add_container_child(&container, node)?;
                assigned += 1;
            }
            tracing::debug!(choice = %choice.id, assigned, "applied hierarchy");
        }

        for edge in &document.edges {
            store.set_edge(
                edge.id.as_str(),
                edge.source.as_str(),
                edge.target.as_str(),
                EdgeUpdate::default().style(edge_style(&edge.semantic_tags)),
            )?;
        }

        tracing::info!(
            nodes = store.node_count(),
            containers = store.container_count(),
            edges = store.edge_count(),
            "graph loaded"
        );
        Ok(())
    }

    /// Explicit choice, else the document's `selectedHierarchy`, else the
    /// first choice. `None` when the document has no hierarchy at all.
    fn select_choice<'a>(&self, document: &'a GraphDocument) -> Result<Option<&'a HierarchyChoice>> {
        if let Some(requested) = &self.hierarchy {
            return document
                .choice(requested)
                .map(Some)
                .ok_or_else(|| LoadError::UnknownHierarchy {
                    requested: requested.clone(),
                    available: document.choice_ids(),
                });
        }
        if let Some(selected) = &document.selected_hierarchy {
            match document.choice(selected) {
                Some(choice) => return Ok(Some(choice)),
                None => tracing::warn!(selected = %selected, "selected hierarchy missing; using the first"),
            }
        }
        Ok(document.hierarchy_choices.first())
    }
}

fn add_container_tree(
    store: &mut GraphStore,
    node: &HierarchyNode,
    parent: Option<&str>,
) -> Result<()> {
    let id = node.id.to_string();
    let label = node.name.clone().unwrap_or_else(|| id.clone());
    store.set_container(id.as_str(), ContainerUpdate::default().label(label))?;
    if let Some(parent) = parent {
        store.add_container_child(parent, &id)?;
    }
    for child in &node.children {
        add_container_tree(store, child, Some(&id))?;
    }
    Ok(())
}

/// Edge style derived from semantic tags.
pub fn edge_style(tags: &[String]) -> EdgeStyle {
    if tags.iter().any(|t| t == NETWORK_TAG) {
        EdgeStyle::Thick
    } else {
        EdgeStyle::Default
    }
}

/// Shorthand for `GraphLoader::new().load_path(path)`.
pub fn load_path(path: impl AsRef<Path>) -> Result<GraphStore> {
    GraphLoader::new().load_path(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = r#"{
        "nodes": [
            {"id": "0", "label": "source_iter", "shortLabel": "src", "nodeType": "Source"},
            {"id": "1", "fullLabel": "map(|x| x + 1)", "shortLabel": "map"},
            {"id": "2", "label": ""},
            {"id": "3"}
        ],
        "edges": [
            {"id": "e0", "source": "0", "target": "1", "semanticTags": ["Stream"]},
            {"id": "e1", "source": "1", "target": "2", "semanticTags": ["Network", "Stream"]},
            {"id": "e2", "source": "2", "target": "3"}
        ],
        "hierarchyChoices": [
            {"id": "location", "name": "Location", "children": [
                {"key": 7, "name": "Process 7"},
                {"key": "cluster", "name": "Cluster"}
            ]},
            {"id": "backtrace", "name": "Backtrace", "children": [
                {"id": "bt_main", "name": "main", "children": [
                    {"id": "bt_inner", "name": "inner"}
                ]}
            ]}
        ],
        "nodeAssignments": {
            "location": {"0": 7, "1": 7, "2": "cluster", "3": "cluster"},
            "backtrace": {"0": "bt_main", "1": "bt_inner", "9": "bt_inner"}
        },
        "selectedHierarchy": "location"
    }"#;

    #[test]
    fn test_loads_selected_hierarchy() {
        let store = GraphLoader::new().load_str(SAMPLE).unwrap();

        assert_eq!(store.node_count(), 4);
        assert_eq!(store.container_count(), 2);
        assert_eq!(store.parent_of("0").unwrap().as_str(), "7");
        assert_eq!(store.parent_of("3").unwrap().as_str(), "cluster");
        assert_eq!(store.container("7").unwrap().label, "Process 7");
    }

    #[test]
    fn test_labels_fall_back() {
        let store = GraphLoader::new().load_str(SAMPLE).unwrap();

        assert_eq!(store.node("0").unwrap().label, "source_iter");
        assert_eq!(store.node("1").unwrap().label, "map");
        assert_eq!(store.node("2").unwrap().label, "2");
        assert_eq!(store.node("3").unwrap().label, "3");
    }

    #[test]
    fn test_network_tag_makes_thick_edges() {
        let store = GraphLoader::new().load_str(SAMPLE).unwrap();

        assert_eq!(store.edge("e0").unwrap().style, EdgeStyle::Default);
        assert_eq!(store.edge("e1").unwrap().style, EdgeStyle::Thick);
        assert_eq!(store.edge("e2").unwrap().style, EdgeStyle::Default);
    }

    #[test]
    fn test_explicit_hierarchy_wins() {
        let store = GraphLoader::new()
            .hierarchy("backtrace")
            .load_str(SAMPLE)
            .unwrap();

        assert_eq!(store.parent_of("bt_inner").unwrap().as_str(), "bt_main");
        assert_eq!(store.parent_of("1").unwrap().as_str(), "bt_inner");
        // unknown node "9" is skipped, unassigned nodes stay top-level
        assert!(store.parent_of("2").is_none());
        assert!(store.container("7").is_none());
    }

    #[test]
    fn test_unknown_hierarchy_is_an_error() {
        let err = GraphLoader::new()
            .hierarchy("nope")
            .load_str(SAMPLE)
            .unwrap_err();
        match err {
            LoadError::UnknownHierarchy { requested, available } => {
                assert_eq!(requested, "nope");
                assert_eq!(available, vec!["location", "backtrace"]);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_first_choice_without_selection() {
        let json = r#"{
            "nodes": [{"id": "a"}],
            "hierarchyChoices": [{"id": "only", "children": [{"key": "box"}]}],
            "nodeAssignments": {"only": {"a": "box"}}
        }"#;
        let store = GraphLoader::new().load_str(json).unwrap();
        assert_eq!(store.parent_of("a").unwrap().as_str(), "box");
        assert_eq!(store.container("box").unwrap().label, "box");
    }

    #[test]
    fn test_flat_document() {
        let json = r#"{"nodes": [{"id": "a"}, {"id": "b"}], "edges": [{"id": "ab", "source": "a", "target": "b"}]}"#;
        let store = GraphLoader::new().load_str(json).unwrap();
        assert_eq!(store.container_count(), 0);
        assert_eq!(store.visible_edges().len(), 1);
    }

    #[test]
    fn test_dangling_edge_is_graph_error() {
        let json = r#"{"nodes": [{"id": "a"}], "edges": [{"id": "ax", "source": "a", "target": "x"}]}"#;
        let err = GraphLoader::new().load_str(json).unwrap_err();
        assert!(matches!(err, LoadError::Graph(GraphError::NotFound { .. })));
    }

    #[test]
    fn test_malformed_json() {
        let err = GraphLoader::new().load_str("{\"nodes\": [").unwrap_err();
        assert!(matches!(err, LoadError::Json(_)));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let store = load_path(file.path()).unwrap();
        assert_eq!(store.edge_count(), 3);

        let missing = load_path(file.path().with_extension("missing")).unwrap_err();
        assert!(matches!(missing, LoadError::Io { .. }));
    }

    #[test]
    fn test_custom_dimensions() {
        let config = StoreConfig {
            node_dimensions: hyperfold_core::Dimensions::new(10.0, 5.0),
            ..Default::default()
        };
        let store = GraphLoader::new()
            .with_config(config)
            .load_str(SAMPLE)
            .unwrap();
        assert_eq!(store.node("0").unwrap().dimensions.width, 10.0);
    }
}
