//! Collapse/expand state machine
//!
//! Collapsing a container hides its children and lifts every edge crossing
//! its boundary into hyperedges grouped by (direction, external endpoint).
//! Expanding grounds those hyperedges again: each aggregated original edge is
//! re-resolved against the current visibility and either restored, re-lifted
//! one level up, or left pending until a later expand.
//!
//! Endpoints are always resolved dynamically from the recorded leaf ids, so
//! collapse and expand may happen in any order.

use indexmap::IndexMap;
use tracing::{debug, warn};

use crate::error::{GraphError, Result};
use crate::index::IndexedEdge;
use crate::model::*;
use crate::store::GraphStore;

/// Which side of a crossing edge lies inside the collapsing container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Direction {
    Outgoing,
    Incoming,
}

/// A boundary-crossing edge or hyperedge found while collapsing.
struct Crossing {
    edge: IndexedEdge,
    source: NodeId,
    target: NodeId,
}

/// Owns a [`GraphStore`] and is the only writer of collapsed state and
/// hyperedges.
///
/// Structural edits made through the engine keep every invariant even when
/// they touch collapsed containers: the affected subtree is expanded, edited,
/// and collapsed again.
#[derive(Debug, Default)]
pub struct CollapseExpandEngine {
    store: GraphStore,
}

impl CollapseExpandEngine {
    pub fn new(store: GraphStore) -> Self {
        CollapseExpandEngine { store }
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn into_store(self) -> GraphStore {
        self.store
    }

    pub fn is_collapsed(&self, container_id: &str) -> Result<bool> {
        self.store
            .container(container_id)
            .map(|c| c.collapsed)
            .ok_or_else(|| GraphError::not_found(EntityKind::Container, container_id))
    }

    /// Flip a container's state. Returns whether it is collapsed afterwards.
    pub fn toggle(&mut self, container_id: &str) -> Result<bool> {
        if self.is_collapsed(container_id)? {
            self.expand(container_id)?;
            Ok(false)
        } else {
            self.collapse(container_id)?;
            Ok(true)
        }
    }

    /// Collapse every container.
    ///
    /// A collapsed container may still hold expanded descendants (expanded
    /// directly while it was folded), so the tree is first fully expanded and
    /// then folded from the top-level containers down.
    pub fn collapse_all(&mut self) -> Result<()> {
        if self.store.containers().all(|c| c.collapsed) {
            return Ok(());
        }
        self.expand_all()?;
        for id in self.root_containers() {
            self.collapse(id.as_str())?;
        }
        Ok(())
    }

    /// Expand every container, ancestors before descendants.
    ///
    /// `expand` stops at children that are already expanded, so every
    /// container is visited here rather than only the top-level ones.
    pub fn expand_all(&mut self) -> Result<()> {
        for id in self.containers_top_down() {
            self.expand(id.as_str())?;
        }
        Ok(())
    }

    fn root_containers(&self) -> Vec<NodeId> {
        self.store
            .containers()
            .filter(|c| self.store.parent_of(c.id.as_str()).is_none())
            .map(|c| c.id.clone())
            .collect()
    }

    /// All containers ordered by depth, insertion order within a level.
    fn containers_top_down(&self) -> Vec<NodeId> {
        let mut ordered: Vec<(usize, NodeId)> = self
            .store
            .containers()
            .map(|c| (self.store.ancestors(c.id.as_str()).len(), c.id.clone()))
            .collect();
        ordered.sort_by_key(|(depth, _)| *depth);
        ordered.into_iter().map(|(_, id)| id).collect()
    }

    // ── Collapse ────────────────────────────────────────────

    /// Collapse a container, lifting its boundary-crossing edges.
    ///
    /// Child containers are collapsed first, so the boundary is computed
    /// over their hyperedges rather than their contents. Collapsing an
    /// already collapsed container is a no-op.
    pub fn collapse(&mut self, container_id: &str) -> Result<()> {
        let container = self
            .store
            .container(container_id)
            .ok_or_else(|| GraphError::not_found(EntityKind::Container, container_id))?;
        if container.collapsed {
            debug!(container = %container_id, "already collapsed");
            return Ok(());
        }
        let id = container.id.clone();
        let children: Vec<NodeId> = container.children.iter().cloned().collect();

        for child in &children {
            if self.store.container(child.as_str()).is_some() {
                self.collapse(child.as_str())?;
            }
        }

        let crossing = self.crossing_edges(&id);
        self.fold_children(&id);

        let mut groups: IndexMap<(Direction, NodeId), Vec<Crossing>> = IndexMap::new();
        for item in crossing {
            let Some(container) = self.store.container(id.as_str()) else {
                break;
            };
            let (direction, external) = if container.children.contains(&item.source) {
                (Direction::Outgoing, item.target.clone())
            } else {
                (Direction::Incoming, item.source.clone())
            };
            match self.store.resolve_visible_ancestor(external.as_str()) {
                Some(resolved) if resolved == id => {
                    debug!(edge = %item.edge.id(), "edge attaches to the collapsing container itself");
                }
                Some(resolved) => groups.entry((direction, resolved)).or_default().push(item),
                None => {
                    warn!(
                        edge = %item.edge.id(),
                        endpoint = %external,
                        "external endpoint has no visible ancestor; leaving edge as is"
                    );
                }
            }
        }

        let mut lifted = 0usize;
        for ((direction, external), items) in groups {
            let (source, target) = match direction {
                Direction::Outgoing => (id.clone(), external),
                Direction::Incoming => (external, id.clone()),
            };
            lifted += items.len();
            self.lift(&source, &target, items);
        }

        debug!(container = %id, lifted, "collapsed");
        Ok(())
    }

    /// Non-hidden edges and hyperedges with exactly one endpoint among the
    /// container's direct children.
    fn crossing_edges(&self, container_id: &NodeId) -> Vec<Crossing> {
        let Some(container) = self.store.container(container_id.as_str()) else {
            return Vec::new();
        };
        let children = &container.children;
        self.store
            .index()
            .touching(children)
            .into_iter()
            .filter_map(|edge| {
                let (source, target, hidden) = match &edge {
                    IndexedEdge::Original(id) => {
                        let e = self.store.edge(id.as_str())?;
                        (e.source.clone(), e.target.clone(), e.hidden)
                    }
                    IndexedEdge::Hyper(id) => {
                        let h = self.store.hyperedge(id.as_str())?;
                        (h.source.clone(), h.target.clone(), h.hidden)
                    }
                };
                let crosses = children.contains(&source) != children.contains(&target);
                (crosses && !hidden).then_some(Crossing {
                    edge,
                    source,
                    target,
                })
            })
            .collect()
    }

    /// Mark the container collapsed, hide its children and switch to the
    /// collapsed size.
    fn fold_children(&mut self, container_id: &NodeId) {
        let Some(container) = self.store.container_mut(container_id.as_str()) else {
            return;
        };
        container.collapsed = true;
        container.expanded_dimensions = container.dimensions;
        container.dimensions = container.collapsed_dimensions;
        let children: Vec<NodeId> = container.children.iter().cloned().collect();

        let mut folded = Vec::new();
        for child in children {
            if self.store.set_member_hidden(child.as_str(), true) == Some(false) {
                folded.push(child);
            }
        }
        if let Some(container) = self.store.container_mut(container_id.as_str()) {
            container.folded.extend(folded);
        }
    }

    /// Fold a group of crossing edges into the hyperedge `source -> target`
    /// and hide them.
    fn lift(&mut self, source: &NodeId, target: &NodeId, items: Vec<Crossing>) {
        let mut records: Vec<(EdgeId, OriginalEndpoints)> = Vec::new();
        let mut style = EdgeStyle::Default;

        for item in &items {
            match &item.edge {
                IndexedEdge::Original(edge_id) => {
                    if let Some(edge) = self.store.edge_mut(edge_id.as_str()) {
                        edge.hidden = true;
                        style = style.max(edge.style);
                    }
                    records.push((
                        edge_id.clone(),
                        OriginalEndpoints {
                            source: item.source.clone(),
                            target: item.target.clone(),
                        },
                    ));
                }
                IndexedEdge::Hyper(hyper_id) => {
                    if let Some(hyper) = self.store.hyperedge_mut(hyper_id.as_str()) {
                        hyper.hidden = true;
                        style = style.max(hyper.style);
                        records.extend(
                            hyper
                                .aggregated
                                .iter()
                                .map(|(id, endpoints)| (id.clone(), endpoints.clone())),
                        );
                    }
                }
            }
        }

        let (hyper, created) = self.store.hyperedge_entry(source, target);
        hyper.hidden = false;
        hyper.style = if created { style } else { hyper.style.max(style) };
        hyper.aggregated.extend(records);
        debug!(
            hyperedge = %hyper.id,
            aggregated = hyper.count(),
            created,
            "lifted crossing edges"
        );
    }

    // ── Expand ──────────────────────────────────────────────

    /// Expand a container, grounding the hyperedges attached to it, then
    /// expand its child containers. Expanding an expanded container is a
    /// no-op.
    pub fn expand(&mut self, container_id: &str) -> Result<()> {
        let container = self
            .store
            .container(container_id)
            .ok_or_else(|| GraphError::not_found(EntityKind::Container, container_id))?;
        if !container.collapsed {
            debug!(container = %container_id, "already expanded");
            return Ok(());
        }
        let id = container.id.clone();

        self.unfold_children(&id);

        let attached = self.store.index().incident_hyperedges(id.as_str());
        for hyper_id in &attached {
            self.ground(hyper_id);
        }
        debug!(container = %id, grounded = attached.len(), "expanded");

        let child_containers: Vec<NodeId> = self
            .store
            .children_of(id.as_str())
            .into_iter()
            .flatten()
            .filter(|c| self.store.container(c.as_str()).is_some())
            .cloned()
            .collect();
        for child in child_containers {
            self.expand(child.as_str())?;
        }
        Ok(())
    }

    /// Mark the container expanded, unhide the children its collapse hid and
    /// restore the expanded size.
    fn unfold_children(&mut self, container_id: &NodeId) {
        let Some(container) = self.store.container_mut(container_id.as_str()) else {
            return;
        };
        container.collapsed = false;
        container.dimensions = container.expanded_dimensions;
        let folded = std::mem::take(&mut container.folded);
        for child in folded {
            self.store.set_member_hidden(child.as_str(), false);
        }
    }

    /// Re-resolve every original edge aggregated by a hyperedge.
    ///
    /// The hyperedge is removed. Records whose endpoints cannot be resolved
    /// yet are kept on a hidden hyperedge under the same id, so the next
    /// collapse/expand of that pair picks them up again.
    fn ground(&mut self, hyper_id: &EdgeId) {
        let Some(hyper) = self.store.remove_hyperedge(hyper_id.as_str()) else {
            return;
        };

        let mut pending: Vec<(EdgeId, OriginalEndpoints)> = Vec::new();
        for (edge_id, endpoints) in hyper.aggregated {
            let Some(edge) = self.store.edge(edge_id.as_str()) else {
                debug!(edge = %edge_id, "aggregated edge no longer exists");
                continue;
            };
            let style = edge.style;
            let source = self.store.resolve_visible_ancestor(endpoints.source.as_str());
            let target = self.store.resolve_visible_ancestor(endpoints.target.as_str());

            match (source, target) {
                (Some(source), Some(target))
                    if (source == endpoints.source && target == endpoints.target)
                        || source == target =>
                {
                    if let Some(edge) = self.store.edge_mut(edge_id.as_str()) {
                        edge.hidden = false;
                    }
                }
                (Some(source), Some(target)) => {
                    let (relifted, created) = self.store.hyperedge_entry(&source, &target);
                    relifted.hidden = false;
                    relifted.style = if created { style } else { relifted.style.max(style) };
                    relifted.aggregated.insert(edge_id, endpoints);
                }
                _ => {
                    warn!(
                        edge = %edge_id,
                        hyperedge = %hyper.id,
                        "endpoint not visible yet; deferring restoration"
                    );
                    pending.push((edge_id, endpoints));
                }
            }
        }

        if !pending.is_empty() {
            let (parked, created) = self.store.hyperedge_entry(&hyper.source, &hyper.target);
            if created {
                parked.hidden = true;
                parked.style = hyper.style;
            }
            parked.aggregated.extend(pending);
        }
    }

    // ── Structural edits on a live graph ────────────────────

    pub fn set_node(&mut self, id: impl Into<NodeId>, update: NodeUpdate) -> Result<()> {
        self.store.set_node(id, update)
    }

    pub fn set_container(&mut self, id: impl Into<NodeId>, update: ContainerUpdate) -> Result<()> {
        self.store.set_container(id, update)
    }

    /// Create or update an edge. An edge landing inside collapsed containers
    /// is lifted into the matching hyperedges.
    pub fn set_edge(
        &mut self,
        id: impl Into<EdgeId>,
        source: impl Into<NodeId>,
        target: impl Into<NodeId>,
        update: EdgeUpdate,
    ) -> Result<()> {
        let source = source.into();
        let target = target.into();
        for endpoint in [&source, &target] {
            if !self.store.contains_member(endpoint.as_str()) {
                return Err(GraphError::not_found(EntityKind::Node, endpoint.as_str()));
            }
        }
        let anchors = [source.clone(), target.clone()];
        self.restructure(&anchors, |store| store.set_edge(id, source, target, update))
    }

    pub fn remove_edge(&mut self, id: &str) -> Option<Edge> {
        let edge = self.store.edge(id)?;
        let anchors = [edge.source.clone(), edge.target.clone()];
        self.restructure(&anchors, |store| Ok(store.remove_edge(id)))
            .ok()
            .flatten()
    }

    pub fn remove_node(&mut self, id: &str) -> Option<Node> {
        self.store.node(id)?;
        self.restructure(&[NodeId::from(id)], |store| Ok(store.remove_node(id)))
            .ok()
            .flatten()
    }

    /// Place `child` under `parent`, validating before anything changes.
    pub fn add_container_child(&mut self, parent: &str, child: &str) -> Result<()> {
        self.store.validate_tree_hierarchy(parent, child)?;
        let anchors = [NodeId::from(parent), NodeId::from(child)];
        self.restructure(&anchors, |store| store.add_container_child(parent, child))
    }

    pub fn remove_container_child(&mut self, parent: &str, child: &str) -> bool {
        self.restructure(&[NodeId::from(parent)], |store| {
            Ok(store.remove_container_child(parent, child))
        })
        .unwrap_or(false)
    }

    /// Remove a container after unwinding any collapse that involves it.
    pub fn remove_container(&mut self, id: &str) -> Result<Option<Container>> {
        if self.store.container(id).is_none() {
            return Ok(None);
        }
        self.expand(id)?;
        self.restructure(&[NodeId::from(id)], |store| Ok(store.remove_container(id)))
    }

    pub fn set_node_layout(&mut self, id: &str, layout: LayoutUpdate) -> Result<()> {
        self.store.set_node_layout(id, layout)
    }

    pub fn set_container_layout(&mut self, id: &str, layout: LayoutUpdate) -> Result<()> {
        self.store.set_container_layout(id, layout)
    }

    /// Run a raw store edit with every collapsed container enclosing an
    /// anchor temporarily expanded, then collapse those containers again.
    fn restructure<T>(
        &mut self,
        anchors: &[NodeId],
        edit: impl FnOnce(&mut GraphStore) -> Result<T>,
    ) -> Result<T> {
        let mut outermost: Vec<NodeId> = Vec::new();
        for anchor in anchors {
            let chain = std::iter::once(anchor.clone()).chain(self.store.ancestors(anchor.as_str()));
            let top = chain
                .filter(|id| {
                    self.store
                        .container(id.as_str())
                        .is_some_and(|c| c.collapsed)
                })
                .last();
            if let Some(top) = top {
                if !outermost.contains(&top) {
                    outermost.push(top);
                }
            }
        }

        for id in &outermost {
            self.expand(id.as_str())?;
        }
        let result = edit(&mut self.store);
        for id in &outermost {
            if self.store.container(id.as_str()).is_some() {
                self.collapse(id.as_str())?;
            }
        }
        result
    }
}
