//! Serde shape of the visualizer graph JSON

use std::fmt;

use indexmap::IndexMap;
use serde::Deserialize;

/// A hierarchy key or assignment target. Writers emit both strings and
/// bare numbers here.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum Key {
    Text(String),
    Number(serde_json::Number),
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Text(s) => f.write_str(s),
            Key::Number(n) => write!(f, "{}", n),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GraphDocument {
    #[serde(default)]
    pub nodes: Vec<NodeRecord>,
    #[serde(default)]
    pub edges: Vec<EdgeRecord>,
    #[serde(default)]
    pub hierarchy_choices: Vec<HierarchyChoice>,
    /// choice id -> (node id -> container key)
    #[serde(default)]
    pub node_assignments: IndexMap<String, IndexMap<String, Key>>,
    #[serde(default)]
    pub selected_hierarchy: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRecord {
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub short_label: Option<String>,
    #[serde(default)]
    pub full_label: Option<String>,
}

impl NodeRecord {
    /// First non-empty label, falling back to the id.
    pub fn display_label(&self) -> &str {
        [&self.label, &self.short_label, &self.full_label]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .find(|l| !l.is_empty())
            .unwrap_or(self.id.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeRecord {
    pub id: String,
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub semantic_tags: Vec<String>,
}

/// One way of grouping the nodes, e.g. by location or by backtrace.
#[derive(Debug, Clone, Deserialize)]
pub struct HierarchyChoice {
    #[serde(alias = "key")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub children: Vec<HierarchyNode>,
}

/// A container in a hierarchy choice tree.
#[derive(Debug, Clone, Deserialize)]
pub struct HierarchyNode {
    #[serde(alias = "key")]
    pub id: Key,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub children: Vec<HierarchyNode>,
}

impl GraphDocument {
    pub fn choice(&self, id: &str) -> Option<&HierarchyChoice> {
        self.hierarchy_choices.iter().find(|c| c.id == id)
    }

    pub fn choice_ids(&self) -> Vec<String> {
        self.hierarchy_choices.iter().map(|c| c.id.clone()).collect()
    }
}
