//! GraphStore: owns nodes, edges, containers and hyperedges
//!
//! The store is the raw entity layer. It offers idempotent upserts, lookups,
//! removals, container membership with hierarchy validation, and the visible
//! projections that layout and render consumers read. Collapse and expand
//! live in [`crate::engine`] and mutate the store through crate-private hooks.

use std::collections::{HashMap, HashSet};

use indexmap::map::Entry;
use indexmap::{IndexMap, IndexSet};

use crate::error::{GraphError, HierarchyViolation, Result};
use crate::index::{EdgeIndex, IndexedEdge};
use crate::model::*;

pub struct GraphStore {
    config: StoreConfig,
    nodes: IndexMap<NodeId, Node>,
    edges: IndexMap<EdgeId, Edge>,
    containers: IndexMap<NodeId, Container>,
    hyperedges: IndexMap<EdgeId, HyperEdge>,
    /// (source, target) -> hyperedge id
    hyper_pairs: HashMap<(NodeId, NodeId), EdgeId>,
    /// child -> owning container
    parents: HashMap<NodeId, NodeId>,
    index: EdgeIndex,
}

impl std::fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphStore")
            .field("node_count", &self.nodes.len())
            .field("edge_count", &self.edges.len())
            .field("container_count", &self.containers.len())
            .field("hyperedge_count", &self.hyperedges.len())
            .field("indexed_endpoints", &self.index.endpoint_count())
            .finish()
    }
}

impl GraphStore {
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    pub fn with_config(config: StoreConfig) -> Self {
        GraphStore {
            config,
            nodes: IndexMap::new(),
            edges: IndexMap::new(),
            containers: IndexMap::new(),
            hyperedges: IndexMap::new(),
            hyper_pairs: HashMap::new(),
            parents: HashMap::new(),
            index: EdgeIndex::new(),
        }
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    // ── Nodes ───────────────────────────────────────────────

    /// Create or update a leaf node.
    pub fn set_node(&mut self, id: impl Into<NodeId>, update: NodeUpdate) -> Result<()> {
        let id = id.into();
        if self.containers.contains_key(id.as_str()) {
            return Err(GraphError::DuplicateId {
                id: id.0,
                existing: EntityKind::Container,
            });
        }

        let default_dimensions = self.config.node_dimensions;
        let node = self.nodes.entry(id.clone()).or_insert_with(|| Node {
            label: id.0.clone(),
            id,
            style: NodeStyle::Default,
            dimensions: default_dimensions,
            position: None,
            hidden: false,
        });
        if let Some(label) = update.label {
            node.label = label;
        }
        if let Some(style) = update.style {
            node.style = style;
        }
        if let Some(dimensions) = update.dimensions {
            node.dimensions = dimensions;
        }
        if let Some(hidden) = update.hidden {
            node.hidden = hidden;
        }
        Ok(())
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.get(id)
    }

    /// Remove a leaf node and detach it from its container.
    ///
    /// Edges that reference the node stay in the store; they simply stop
    /// being visible.
    pub fn remove_node(&mut self, id: &str) -> Option<Node> {
        let node = self.nodes.shift_remove(id)?;
        self.detach(id);
        tracing::debug!(node = %id, "removed node");
        Some(node)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.nodes.values()
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    // ── Edges ───────────────────────────────────────────────

    /// Create or update an edge. Both endpoints must already exist as nodes
    /// or containers.
    pub fn set_edge(
        &mut self,
        id: impl Into<EdgeId>,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
        update: EdgeUpdate,
    ) -> Result<()> {
        let id = id.into();
        let source = source.into();
        let target = target.into();
        for endpoint in [&source, &target] {
            if !self.contains_member(endpoint.as_str()) {
                return Err(GraphError::not_found(EntityKind::Node, endpoint.as_str()));
            }
        }

        let handle = IndexedEdge::Original(id.clone());
        match self.edges.get_mut(id.as_str()) {
            Some(edge) => {
                if edge.source != source || edge.target != target {
                    self.index.remove(&handle, &edge.source, &edge.target);
                    self.index.insert(handle, &source, &target);
                    edge.source = source;
                    edge.target = target;
                }
                if let Some(style) = update.style {
                    edge.style = style;
                }
                if let Some(hidden) = update.hidden {
                    edge.hidden = hidden;
                }
            }
            None => {
                let shadows_hyperedge = self.hyperedges.contains_key(id.as_str());
                self.index.insert(handle, &source, &target);
                self.edges.insert(
                    id.clone(),
                    Edge {
                        id: id.clone(),
                        source,
                        target,
                        style: update.style.unwrap_or_default(),
                        hidden: update.hidden.unwrap_or(false),
                    },
                );
                // edge and hyperedge ids share the visible namespace
                if shadows_hyperedge {
                    self.rename_hyperedge(id.as_str());
                }
            }
        }
        Ok(())
    }

    pub fn edge(&self, id: &str) -> Option<&Edge> {
        self.edges.get(id)
    }

    /// Remove an edge, also dropping it from every hyperedge that aggregates
    /// it. Hyperedges left with nothing to aggregate are removed too.
    pub fn remove_edge(&mut self, id: &str) -> Option<Edge> {
        let edge = self.edges.shift_remove(id)?;
        self.index.remove(
            &IndexedEdge::Original(edge.id.clone()),
            &edge.source,
            &edge.target,
        );

        let mut emptied = Vec::new();
        for hyper in self.hyperedges.values_mut() {
            if hyper.aggregated.shift_remove(id).is_some() && hyper.aggregated.is_empty() {
                emptied.push(hyper.id.clone());
            }
        }
        for hyper_id in emptied {
            self.remove_hyperedge(hyper_id.as_str());
        }
        tracing::debug!(edge = %id, "removed edge");
        Some(edge)
    }

    pub fn edges(&self) -> impl Iterator<Item = &Edge> {
        self.edges.values()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    // ── Containers ──────────────────────────────────────────

    /// Create or update a container. New containers start expanded and empty.
    pub fn set_container(&mut self, id: impl Into<NodeId>, update: ContainerUpdate) -> Result<()> {
        let id = id.into();
        if self.nodes.contains_key(id.as_str()) {
            return Err(GraphError::DuplicateId {
                id: id.0,
                existing: EntityKind::Node,
            });
        }

        let config = &self.config;
        let container = self.containers.entry(id.clone()).or_insert_with(|| Container {
            label: id.0.clone(),
            id,
            style: NodeStyle::Default,
            children: IndexSet::new(),
            collapsed: false,
            hidden: false,
            dimensions: config.container_dimensions,
            expanded_dimensions: config.container_dimensions,
            collapsed_dimensions: config.collapsed_dimensions,
            position: None,
            folded: IndexSet::new(),
        });
        if let Some(label) = update.label {
            container.label = label;
        }
        if let Some(style) = update.style {
            container.style = style;
        }
        if let Some(hidden) = update.hidden {
            container.hidden = hidden;
        }
        if let Some(dimensions) = update.expanded_dimensions {
            container.expanded_dimensions = dimensions;
            if !container.collapsed {
                container.dimensions = dimensions;
            }
        }
        if let Some(dimensions) = update.collapsed_dimensions {
            container.collapsed_dimensions = dimensions;
            if container.collapsed {
                container.dimensions = dimensions;
            }
        }
        Ok(())
    }

    pub fn container(&self, id: &str) -> Option<&Container> {
        self.containers.get(id)
    }

    /// Remove a container. Its children become top-level members.
    ///
    /// This is a raw removal: it does not unwind hyperedges of a collapsed
    /// container. On a live graph use
    /// [`CollapseExpandEngine::remove_container`](crate::engine::CollapseExpandEngine::remove_container).
    pub fn remove_container(&mut self, id: &str) -> Option<Container> {
        let container = self.containers.shift_remove(id)?;
        for child in &container.children {
            self.parents.remove(child.as_str());
        }
        self.detach(id);
        tracing::debug!(container = %id, "removed container");
        Some(container)
    }

    pub fn containers(&self) -> impl Iterator<Item = &Container> {
        self.containers.values()
    }

    pub fn container_count(&self) -> usize {
        self.containers.len()
    }

    // ── Hierarchy ───────────────────────────────────────────

    /// Place `child` (a node or container) inside `parent`.
    ///
    /// Validation runs to completion before anything changes, so a rejected
    /// edit leaves the hierarchy untouched. Re-adding an existing membership
    /// is a no-op.
    pub fn add_container_child(&mut self, parent: &str, child: &str) -> Result<()> {
        self.validate_tree_hierarchy(parent, child)?;
        let child = NodeId::from(child);
        if let Some(container) = self.containers.get_mut(parent) {
            container.children.insert(child.clone());
        }
        self.parents.insert(child, NodeId::from(parent));
        Ok(())
    }

    /// Check whether `child` may be placed under `parent`.
    pub fn validate_tree_hierarchy(&self, parent: &str, child: &str) -> Result<()> {
        if !self.containers.contains_key(parent) {
            return Err(GraphError::not_found(EntityKind::Container, parent));
        }
        if !self.contains_member(child) {
            return Err(GraphError::not_found(EntityKind::Node, child));
        }
        if parent == child {
            return Err(GraphError::InvalidHierarchy {
                parent: parent.into(),
                child: child.into(),
                reason: HierarchyViolation::SelfReference,
            });
        }
        if let Some(existing) = self.parents.get(child) {
            if existing.as_str() != parent {
                return Err(GraphError::AlreadyParented {
                    child: child.into(),
                    parent: existing.clone(),
                    requested: parent.into(),
                });
            }
        }
        if self.ancestors(parent).iter().any(|a| a.as_str() == child) {
            return Err(GraphError::InvalidHierarchy {
                parent: parent.into(),
                child: child.into(),
                reason: HierarchyViolation::Cycle,
            });
        }
        Ok(())
    }

    /// Remove `child` from `parent`. Returns whether the membership existed.
    pub fn remove_container_child(&mut self, parent: &str, child: &str) -> bool {
        let removed = self
            .containers
            .get_mut(parent)
            .is_some_and(|c| c.children.shift_remove(child));
        if removed && self.parents.get(child).is_some_and(|p| p.as_str() == parent) {
            self.parents.remove(child);
        }
        removed
    }

    pub fn parent_of(&self, id: &str) -> Option<&NodeId> {
        self.parents.get(id)
    }

    pub fn children_of(&self, id: &str) -> Option<&IndexSet<NodeId>> {
        self.containers.get(id).map(|c| &c.children)
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: &str) -> Vec<NodeId> {
        let mut ancestors = Vec::new();
        let mut seen = HashSet::new();
        let mut current = self.parents.get(id);
        while let Some(parent) = current {
            if !seen.insert(parent.clone()) {
                break;
            }
            ancestors.push(parent.clone());
            current = self.parents.get(parent.as_str());
        }
        ancestors
    }

    /// Every member nested under container `id`, depth first.
    pub fn descendants(&self, id: &str) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<&NodeId> = match self.containers.get(id) {
            Some(c) => c.children.iter().rev().collect(),
            None => return out,
        };
        while let Some(current) = stack.pop() {
            out.push(current.clone());
            if let Some(c) = self.containers.get(current.as_str()) {
                stack.extend(c.children.iter().rev());
            }
        }
        out
    }

    /// Whether `id` names a node or a container.
    pub fn contains_member(&self, id: &str) -> bool {
        self.nodes.contains_key(id) || self.containers.contains_key(id)
    }

    // ── Visibility ──────────────────────────────────────────

    fn member_hidden(&self, id: &str) -> Option<bool> {
        if let Some(node) = self.nodes.get(id) {
            Some(node.hidden)
        } else {
            self.containers.get(id).map(|c| c.hidden)
        }
    }

    /// A member is visible iff it is not hidden and no ancestor container is
    /// collapsed or hidden.
    pub fn is_visible(&self, id: &str) -> bool {
        match self.member_hidden(id) {
            Some(false) => self.ancestors(id).iter().all(|a| {
                self.containers
                    .get(a.as_str())
                    .is_some_and(|c| !c.collapsed && !c.hidden)
            }),
            _ => false,
        }
    }

    /// The entity that currently stands in for `id` on screen.
    ///
    /// Returns `id` itself when it is visible. Otherwise walks up the
    /// ownership chain and returns the nearest visible ancestor if that
    /// ancestor is collapsed. Returns `None` when nothing in the chain is
    /// shown in place of `id`, e.g. because a member on the way is hidden.
    pub fn resolve_visible_ancestor(&self, id: &str) -> Option<NodeId> {
        if !self.contains_member(id) {
            return None;
        }
        if self.is_visible(id) {
            return Some(NodeId::from(id));
        }
        for ancestor in self.ancestors(id) {
            if self.is_visible(ancestor.as_str()) {
                let collapsed = self
                    .containers
                    .get(ancestor.as_str())
                    .is_some_and(|c| c.collapsed);
                return collapsed.then_some(ancestor);
            }
        }
        None
    }

    /// Visible leaf nodes, in insertion order.
    pub fn visible_nodes(&self) -> Vec<&Node> {
        self.nodes
            .values()
            .filter(|n| self.is_visible(n.id.as_str()))
            .collect()
    }

    /// Visible containers (expanded or collapsed), in insertion order.
    pub fn visible_containers(&self) -> Vec<&Container> {
        self.containers
            .values()
            .filter(|c| self.is_visible(c.id.as_str()))
            .collect()
    }

    /// Visible original edges followed by visible hyperedges.
    ///
    /// An edge is visible when it is not hidden and both of its endpoints are
    /// visible.
    pub fn visible_edges(&self) -> Vec<VisibleEdge> {
        let originals = self
            .edges
            .values()
            .filter(|e| !e.hidden && self.endpoints_visible(&e.source, &e.target))
            .map(VisibleEdge::from);
        let hypers = self.visible_hyperedges().into_iter().map(VisibleEdge::from);
        originals.chain(hypers).collect()
    }

    pub fn visible_hyperedges(&self) -> Vec<&HyperEdge> {
        self.hyperedges
            .values()
            .filter(|h| !h.hidden && self.endpoints_visible(&h.source, &h.target))
            .collect()
    }

    fn endpoints_visible(&self, source: &NodeId, target: &NodeId) -> bool {
        self.is_visible(source.as_str()) && self.is_visible(target.as_str())
    }

    pub fn collapsed_containers(&self) -> impl Iterator<Item = &Container> {
        self.containers.values().filter(|c| c.collapsed)
    }

    // ── Hyperedges (read-only outside the crate) ────────────

    pub fn hyperedge(&self, id: &str) -> Option<&HyperEdge> {
        self.hyperedges.get(id)
    }

    pub fn hyperedges(&self) -> impl Iterator<Item = &HyperEdge> {
        self.hyperedges.values()
    }

    pub fn hyperedge_count(&self) -> usize {
        self.hyperedges.len()
    }

    pub fn index(&self) -> &EdgeIndex {
        &self.index
    }

    // ── Layout write-back ───────────────────────────────────

    pub fn set_node_layout(&mut self, id: &str, layout: LayoutUpdate) -> Result<()> {
        let node = self
            .nodes
            .get_mut(id)
            .ok_or_else(|| GraphError::not_found(EntityKind::Node, id))?;
        if let Some(position) = layout.position {
            node.position = Some(position);
        }
        if let Some(dimensions) = layout.dimensions {
            node.dimensions = dimensions;
        }
        Ok(())
    }

    /// Write back a container's layout. Dimensions written to an expanded
    /// container become its remembered expanded size.
    pub fn set_container_layout(&mut self, id: &str, layout: LayoutUpdate) -> Result<()> {
        let container = self
            .containers
            .get_mut(id)
            .ok_or_else(|| GraphError::not_found(EntityKind::Container, id))?;
        if let Some(position) = layout.position {
            container.position = Some(position);
        }
        if let Some(dimensions) = layout.dimensions {
            container.dimensions = dimensions;
            if container.collapsed {
                container.collapsed_dimensions = dimensions;
            } else {
                container.expanded_dimensions = dimensions;
            }
        }
        Ok(())
    }

    // ── Engine hooks ────────────────────────────────────────

    pub(crate) fn container_mut(&mut self, id: &str) -> Option<&mut Container> {
        self.containers.get_mut(id)
    }

    pub(crate) fn edge_mut(&mut self, id: &str) -> Option<&mut Edge> {
        self.edges.get_mut(id)
    }

    pub(crate) fn hyperedge_mut(&mut self, id: &str) -> Option<&mut HyperEdge> {
        self.hyperedges.get_mut(id)
    }

    /// Set the hidden flag of a node or container, returning the old value.
    pub(crate) fn set_member_hidden(&mut self, id: &str, hidden: bool) -> Option<bool> {
        if let Some(node) = self.nodes.get_mut(id) {
            Some(std::mem::replace(&mut node.hidden, hidden))
        } else {
            self.containers
                .get_mut(id)
                .map(|c| std::mem::replace(&mut c.hidden, hidden))
        }
    }

    /// Fetch the hyperedge for `(source, target)`, creating and indexing it
    /// when it does not exist yet. The flag reports whether it was created.
    ///
    /// Hyperedges are identified by their endpoint pair; the id is only a
    /// name, made unique against every edge and hyperedge id in the store.
    pub(crate) fn hyperedge_entry(&mut self, source: &NodeId, target: &NodeId) -> (&mut HyperEdge, bool) {
        let pair = (source.clone(), target.clone());
        if let Some(index) = self
            .hyper_pairs
            .get(&pair)
            .and_then(|id| self.hyperedges.get_index_of(id))
        {
            return (&mut self.hyperedges[index], false);
        }

        let id = self.unused_hyper_id(EdgeId::hyper(source, target));
        self.index
            .insert(IndexedEdge::Hyper(id.clone()), source, target);
        self.hyper_pairs.insert(pair, id.clone());
        let hyper = HyperEdge::new(id.clone(), source.clone(), target.clone());
        match self.hyperedges.entry(id) {
            Entry::Occupied(entry) => (entry.into_mut(), false),
            Entry::Vacant(entry) => (entry.insert(hyper), true),
        }
    }

    pub(crate) fn remove_hyperedge(&mut self, id: &str) -> Option<HyperEdge> {
        let hyper = self.hyperedges.shift_remove(id)?;
        self.index
            .remove(&IndexedEdge::Hyper(hyper.id.clone()), &hyper.source, &hyper.target);
        let pair = (hyper.source.clone(), hyper.target.clone());
        if self.hyper_pairs.get(&pair) == Some(&hyper.id) {
            self.hyper_pairs.remove(&pair);
        }
        Some(hyper)
    }

    /// `base`, or `base#2`, `base#3`, ... whichever is not yet an edge or
    /// hyperedge id.
    fn unused_hyper_id(&self, base: EdgeId) -> EdgeId {
        let taken = |id: &str| self.edges.contains_key(id) || self.hyperedges.contains_key(id);
        if !taken(base.as_str()) {
            return base;
        }
        let mut n = 2usize;
        loop {
            let candidate = EdgeId(format!("{}#{}", base, n));
            if !taken(candidate.as_str()) {
                return candidate;
            }
            n += 1;
        }
    }

    /// Give the hyperedge currently named `id` a fresh name, keeping its
    /// position, pair and records.
    fn rename_hyperedge(&mut self, id: &str) {
        let Some(position) = self.hyperedges.get_index_of(id) else {
            return;
        };
        let Some((old_id, mut hyper)) = self.hyperedges.shift_remove_index(position) else {
            return;
        };
        let new_id = self.unused_hyper_id(old_id.clone());
        self.index
            .remove(&IndexedEdge::Hyper(old_id.clone()), &hyper.source, &hyper.target);
        self.index
            .insert(IndexedEdge::Hyper(new_id.clone()), &hyper.source, &hyper.target);
        self.hyper_pairs
            .insert((hyper.source.clone(), hyper.target.clone()), new_id.clone());
        tracing::debug!(from = %old_id, to = %new_id, "renamed hyperedge shadowed by an edge");
        hyper.id = new_id.clone();
        self.hyperedges.shift_insert(position, new_id, hyper);
    }

    fn detach(&mut self, id: &str) {
        if let Some(parent) = self.parents.remove(id) {
            if let Some(container) = self.containers.get_mut(parent.as_str()) {
                container.children.shift_remove(id);
                container.folded.shift_remove(id);
            }
        }
    }
}

impl Default for GraphStore {
    fn default() -> Self {
        Self::new()
    }
}
