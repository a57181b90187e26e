// Copyright 2026 the Stagehand Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The render-side scene graph.
//!
//! [`SceneGraph`] is owned by the render thread. Nodes live in slots indexed
//! by [`NodeId`]; a slot's generation counter lets stale handles be detected
//! after the node is destroyed. Slots are handed out by the producer (see
//! [`stage`](crate::stage)), and a slot is only reused once the render thread
//! has applied the destruction and the producer has torn the record down.
//!
//! The graph is only changed by applying queued records
//! ([`queue`](crate::queue)) and by animation writes. Each change marks a
//! [`dirty`](crate::dirty) channel; [`SceneGraph::evaluate`] drains them into
//! a [`FrameChanges`] for the presenter.
//!
//! Groups hold their children as [`NodeRef`]s, shared strong references
//! whose count tells how many owners (child lists, in-flight records, the
//! producer) still hold the node.

use std::fmt;
use std::sync::Arc;

use understory_dirty::{CycleHandling, DirtyTracker, EagerPolicy};

use crate::backend::{LayoutConstraints, ResourceHandle, TextBuffer, TextLayout};
use crate::derived::{Derived, Repeat, TextModes};
use crate::dirty;
use crate::property::{Property, PropertyValue};
use crate::queue::{DropReason, Released};
use crate::registry::{NodeKind, PropertyId};
use crate::trace::{Tracer, UnknownValueEvent};

/// A handle to a node in a [`SceneGraph`].
///
/// Contains both a slot index and a generation counter so that stale handles
/// can be detected after a node is destroyed and the slot is reused.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId {
    pub(crate) idx: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self { idx, generation }
    }

    /// Returns the raw slot index (as found in [`FrameChanges`]).
    #[inline]
    #[must_use]
    pub const fn index(self) -> u32 {
        self.idx
    }

    /// Returns the generation counter.
    #[inline]
    #[must_use]
    pub const fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({}@gen{})", self.idx, self.generation)
    }
}

#[derive(Debug)]
struct NodeHandle {
    id: NodeId,
    kind: NodeKind,
}

/// A strong, shareable reference to a node.
///
/// The producer receives one from [`Producer::create_node`]; every record
/// that mentions the node as a child and every child list holding it owns a
/// clone. Equality is node identity.
///
/// [`Producer::create_node`]: crate::stage::Producer::create_node
#[derive(Clone)]
pub struct NodeRef(Arc<NodeHandle>);

impl NodeRef {
    pub(crate) fn new(id: NodeId, kind: NodeKind) -> Self {
        Self(Arc::new(NodeHandle { id, kind }))
    }

    /// Returns the node's handle.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.0.id
    }

    /// Returns the node's kind.
    #[must_use]
    pub fn kind(&self) -> NodeKind {
        self.0.kind
    }

    /// Returns the number of live strong references.
    #[must_use]
    pub fn ref_count(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

impl PartialEq for NodeRef {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for NodeRef {}

impl fmt::Debug for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeRef({:?}, {:?})", self.0.kind, self.0.id)
    }
}

/// A live node: its property table, tree links and derived state.
#[derive(Debug)]
pub struct Node {
    id: NodeId,
    kind: NodeKind,
    props: Vec<Property>,
    parent: Option<NodeId>,
    children: Vec<NodeRef>,
    derived: Derived,
}

impl Node {
    fn new(id: NodeId, kind: NodeKind) -> Self {
        let derived = match kind {
            NodeKind::Text => Derived::Text(TextModes::default()),
            NodeKind::ImageView => Derived::Image(Repeat::default()),
            _ => Derived::None,
        };
        Self {
            id,
            kind,
            props: kind.specs().map(Property::new).collect(),
            parent: None,
            children: Vec::new(),
            derived,
        }
    }

    /// Returns the node's handle.
    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the node's kind.
    #[must_use]
    pub const fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Returns the property with the given id.
    #[must_use]
    pub fn property_at(&self, id: PropertyId) -> Option<&Property> {
        self.props.get(usize::from(id.index()))
    }

    /// Returns the property with the given name.
    #[must_use]
    pub fn property(&self, name: &str) -> Option<&Property> {
        self.kind.lookup(name).and_then(|id| self.property_at(id))
    }

    /// Returns the current value of the named property.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&PropertyValue> {
        self.property(name).map(Property::value)
    }

    /// Returns the current value of a float property.
    #[must_use]
    pub fn float(&self, name: &str) -> Option<f32> {
        self.value(name).and_then(PropertyValue::as_float)
    }

    /// Returns the parent group, if attached.
    #[must_use]
    pub const fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Returns the ordered child list (always empty for non-groups).
    #[must_use]
    pub fn children(&self) -> &[NodeRef] {
        &self.children
    }

    /// Returns the parsed text modes of a text node.
    #[must_use]
    pub const fn text_modes(&self) -> Option<TextModes> {
        match self.derived {
            Derived::Text(modes) => Some(modes),
            _ => None,
        }
    }

    /// Returns the parsed repeat mode of an image view.
    #[must_use]
    pub const fn repeat(&self) -> Option<Repeat> {
        match self.derived {
            Derived::Image(repeat) => Some(repeat),
            _ => None,
        }
    }
}

/// The set of changes produced by a single [`SceneGraph::evaluate`] call.
///
/// Each field contains the raw slot indices of nodes that changed in the
/// corresponding category. Presenters resolve them with
/// [`SceneGraph::node_at`].
#[derive(Clone, Debug, Default)]
pub struct FrameChanges {
    /// Nodes with a changed local property.
    pub properties: Vec<u32>,
    /// Nodes whose inherited transform, opacity or visibility changed,
    /// including descendants of the node that was edited.
    pub inherited: Vec<u32>,
    /// Text nodes that need a new layout.
    pub relayout: Vec<u32>,
    /// Nodes created since the last evaluate.
    pub added: Vec<u32>,
    /// Nodes destroyed since the last evaluate.
    pub removed: Vec<u32>,
    /// Whether any child list changed.
    pub topology_changed: bool,
}

impl FrameChanges {
    /// Returns whether nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
            && self.inherited.is_empty()
            && self.relayout.is_empty()
            && self.added.is_empty()
            && self.removed.is_empty()
            && !self.topology_changed
    }
}

/// Slot storage for all live nodes.
pub struct SceneGraph {
    slots: Vec<Option<Node>>,
    live: usize,
    dirty: DirtyTracker<u32>,
    pending_added: Vec<u32>,
    pending_removed: Vec<u32>,
    pending_frees: Vec<ResourceHandle>,
}

impl fmt::Debug for SceneGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneGraph")
            .field("slots", &self.slots.len())
            .field("live", &self.live)
            .field("pending_frees", &self.pending_frees)
            .finish_non_exhaustive()
    }
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    /// Creates an empty scene graph.
    #[must_use]
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            live: 0,
            dirty: DirtyTracker::with_cycle_handling(CycleHandling::Error),
            pending_added: Vec::new(),
            pending_removed: Vec::new(),
            pending_frees: Vec::new(),
        }
    }

    /// Returns the number of live nodes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.live
    }

    /// Returns whether the graph holds no nodes.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.live == 0
    }

    /// Returns whether `id` refers to a live node.
    #[must_use]
    pub fn contains(&self, id: NodeId) -> bool {
        self.node(id).is_some()
    }

    /// Returns the live node for `id`, or `None` if the handle is stale.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.node_at(id.idx).filter(|node| node.id == id)
    }

    /// Returns the node at raw slot `idx`, as found in [`FrameChanges`].
    #[must_use]
    pub fn node_at(&self, idx: u32) -> Option<&Node> {
        self.slots.get(idx as usize).and_then(Option::as_ref)
    }

    /// Returns the children of a live group.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Option<&[NodeRef]> {
        self.node(id)
            .filter(|node| node.kind.is_group())
            .map(Node::children)
    }

    /// Returns the parent of a live node.
    #[must_use]
    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(Node::parent)
    }

    /// Iterates over every live node in slot order.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.slots.iter().flatten()
    }

    fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.slots
            .get_mut(id.idx as usize)
            .and_then(Option::as_mut)
            .filter(|node| node.id == id)
    }

    // -- Edits (applied from queued records) --

    pub(crate) fn create(&mut self, id: NodeId, kind: NodeKind) -> Result<(), DropReason> {
        let idx = id.idx as usize;
        if self.slots.len() <= idx {
            self.slots.resize_with(idx + 1, || None);
        }
        if self.slots[idx].is_some() {
            return Err(DropReason::SlotOccupied);
        }
        self.slots[idx] = Some(Node::new(id, kind));
        self.live += 1;
        self.pending_added.push(id.idx);
        self.dirty.mark(id.idx, dirty::TOPOLOGY);
        Ok(())
    }

    /// Removes a node, detaching it from its parent and orphaning its
    /// children. Everything the node owned moves into `released`.
    pub(crate) fn destroy(
        &mut self,
        id: NodeId,
        released: &mut Vec<Released>,
    ) -> Result<(), DropReason> {
        if !self.contains(id) {
            return Err(DropReason::StaleTarget);
        }
        if let Some(parent) = self.parent(id) {
            self.detach(parent, id, released);
        }
        let Some(mut node) = self.slots[id.idx as usize].take() else {
            return Err(DropReason::StaleTarget);
        };
        self.live -= 1;

        for child in &node.children {
            if let Some(c) = self.node_mut(child.id()) {
                c.parent = None;
            }
            self.dirty.mark_with(child.id().idx, dirty::INHERITED, &EagerPolicy);
        }
        released.extend(node.children.drain(..).map(Released::Child));

        self.dirty.remove_key(id.idx);
        self.pending_removed.push(id.idx);
        self.dirty.mark(id.idx, dirty::TOPOLOGY);
        released.push(Released::Node(Box::new(node)));
        Ok(())
    }

    /// Stores `value` in property `prop` and returns the previous value.
    ///
    /// On a kind mismatch the value is handed back in the error.
    pub(crate) fn set_property(
        &mut self,
        id: NodeId,
        prop: PropertyId,
        value: PropertyValue,
        tracer: &mut Tracer<'_>,
    ) -> Result<PropertyValue, (DropReason, PropertyValue)> {
        let Some(node) = self.node_mut(id) else {
            return Err((DropReason::StaleTarget, value));
        };
        let Some(slot) = node.props.get_mut(usize::from(prop.index())) else {
            return Err((DropReason::KindMismatch, value));
        };
        if slot.kind() != value.kind() {
            return Err((DropReason::KindMismatch, value));
        }
        let name = slot.name();
        let old = slot.replace(value);
        let changed = &old != slot.value();
        let refresh = node.derived.refresh(name, slot.value().as_str(), changed);
        if refresh.unknown {
            tracer.unknown_value(&UnknownValueEvent {
                node: id,
                property: name,
                value: slot.value().as_str().unwrap_or_default(),
            });
        }
        self.mark_property(id.idx, prop, refresh.relayout);
        Ok(old)
    }

    /// Writes a float property in place. Returns `false` if the node is gone.
    pub(crate) fn write_float(&mut self, id: NodeId, prop: PropertyId, value: f32) -> bool {
        let Some(node) = self.node_mut(id) else {
            return false;
        };
        let Some(slot) = node.props.get_mut(usize::from(prop.index())) else {
            return false;
        };
        if !slot.set_float(value) {
            return false;
        }
        let relayout = node.derived.refresh(slot.name(), None, true).relayout;
        self.mark_property(id.idx, prop, relayout);
        true
    }

    fn mark_property(&mut self, idx: u32, prop: PropertyId, relayout: bool) {
        if prop.inherits() {
            self.dirty.mark_with(idx, dirty::INHERITED, &EagerPolicy);
        } else {
            self.dirty.mark(idx, dirty::PROPERTY);
        }
        if relayout {
            self.dirty.mark(idx, dirty::LAYOUT);
        }
    }

    /// Inserts `child` into `parent` at `index` (clamped), or appends when
    /// `index` is `None`. A child attached elsewhere is detached first.
    pub(crate) fn insert_child(
        &mut self,
        parent: NodeId,
        child: &NodeRef,
        index: Option<usize>,
        released: &mut Vec<Released>,
    ) -> Result<(), DropReason> {
        match self.node(parent) {
            None => return Err(DropReason::StaleTarget),
            Some(node) if !node.kind.is_group() => return Err(DropReason::NotAGroup),
            Some(_) => {}
        }
        let c = child.id();
        if !self.contains(c) {
            return Err(DropReason::StaleChild);
        }
        if self.is_ancestor_or_self(c, parent) {
            return Err(DropReason::Cycle);
        }
        if let Some(old_parent) = self.parent(c) {
            self.detach(old_parent, c, released);
        }

        let Some(group) = self.node_mut(parent) else {
            return Err(DropReason::StaleTarget);
        };
        let at = index.map_or(group.children.len(), |i| i.min(group.children.len()));
        group.children.insert(at, child.clone());
        if let Some(node) = self.node_mut(c) {
            node.parent = Some(parent);
        }

        let _ = self.dirty.add_dependency(c.idx, parent.idx, dirty::INHERITED);
        self.dirty.mark_with(c.idx, dirty::INHERITED, &EagerPolicy);
        self.dirty.mark(parent.idx, dirty::TOPOLOGY);
        Ok(())
    }

    /// Removes `child` from `parent` if present.
    pub(crate) fn remove_child(
        &mut self,
        parent: NodeId,
        child: NodeId,
        released: &mut Vec<Released>,
    ) -> Result<(), DropReason> {
        match self.node(parent) {
            None => Err(DropReason::StaleTarget),
            Some(node) if !node.children.iter().any(|c| c.id() == child) => {
                Err(DropReason::ChildAbsent)
            }
            Some(_) => {
                self.detach(parent, child, released);
                Ok(())
            }
        }
    }

    /// Unlinks `child` from `parent`'s child list.
    fn detach(&mut self, parent: NodeId, child: NodeId, released: &mut Vec<Released>) {
        let Some(group) = self.node_mut(parent) else {
            return;
        };
        let Some(pos) = group.children.iter().position(|c| c.id() == child) else {
            return;
        };
        released.push(Released::Child(group.children.remove(pos)));
        if let Some(node) = self.node_mut(child) {
            node.parent = None;
        }
        self.dirty.remove_dependency(child.idx, parent.idx, dirty::INHERITED);
        self.dirty.mark_with(child.idx, dirty::INHERITED, &EagerPolicy);
        self.dirty.mark(parent.idx, dirty::TOPOLOGY);
    }

    fn is_ancestor_or_self(&self, candidate: NodeId, mut node: NodeId) -> bool {
        loop {
            if node == candidate {
                return true;
            }
            match self.parent(node) {
                Some(p) => node = p,
                None => return false,
            }
        }
    }

    // -- Deferred resource frees --

    pub(crate) fn schedule_free(&mut self, handle: ResourceHandle) {
        self.pending_frees.push(handle);
    }

    pub(crate) fn take_frees(&mut self) -> Vec<ResourceHandle> {
        std::mem::take(&mut self.pending_frees)
    }

    // -- Evaluation --

    /// Drains all dirty channels and returns what changed since the last
    /// call.
    pub fn evaluate(&mut self) -> FrameChanges {
        let mut changes = FrameChanges {
            properties: self
                .dirty
                .drain(dirty::PROPERTY)
                .deterministic()
                .run()
                .collect(),
            inherited: self
                .dirty
                .drain(dirty::INHERITED)
                .affected()
                .deterministic()
                .run()
                .collect(),
            relayout: self
                .dirty
                .drain(dirty::LAYOUT)
                .deterministic()
                .run()
                .collect(),
            ..FrameChanges::default()
        };
        let topology: Vec<u32> = self
            .dirty
            .drain(dirty::TOPOLOGY)
            .deterministic()
            .run()
            .collect();
        changes.topology_changed = !topology.is_empty();

        // Marks on destroyed slots are stale.
        let slots = &self.slots;
        let alive = |idx: &u32| slots.get(*idx as usize).is_some_and(Option::is_some);
        changes.properties.retain(alive);
        changes.inherited.retain(alive);
        changes.relayout.retain(alive);

        std::mem::swap(&mut self.pending_added, &mut changes.added);
        std::mem::swap(&mut self.pending_removed, &mut changes.removed);
        changes
    }

    /// Lays out the text of the text node at raw slot `idx`.
    ///
    /// Returns `None` for slots that are empty or hold another node kind.
    pub fn layout_text(&self, idx: u32, layout: &mut dyn TextLayout) -> Option<TextBuffer> {
        let node = self.node_at(idx)?;
        let modes = node.text_modes()?;
        let text = node.value("text").and_then(PropertyValue::as_str)?;
        let max_lines = match node.value("maxLines") {
            Some(PropertyValue::Int32(n)) => u32::try_from(*n).ok().filter(|n| *n > 0),
            _ => None,
        };
        let constraints = LayoutConstraints {
            width: node.float("w").unwrap_or_default(),
            height: node.float("h").unwrap_or_default(),
            modes,
            max_lines,
            font: node.value("font").and_then(PropertyValue::as_object).cloned(),
        };
        Some(layout.layout(text, &constraints))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn graph_with(kinds: &[NodeKind]) -> (SceneGraph, Vec<NodeRef>) {
        let mut scene = SceneGraph::new();
        let mut refs = Vec::new();
        for (i, kind) in kinds.iter().enumerate() {
            let id = NodeId::new(u32::try_from(i).unwrap(), 0);
            scene.create(id, *kind).unwrap();
            refs.push(NodeRef::new(id, *kind));
        }
        (scene, refs)
    }

    fn ids(children: &[NodeRef]) -> Vec<NodeId> {
        children.iter().map(NodeRef::id).collect()
    }

    #[test]
    fn create_initializes_property_table() {
        let (scene, refs) = graph_with(&[NodeKind::Text]);
        let node = scene.node(refs[0].id()).unwrap();
        assert_eq!(node.float("opacity"), Some(1.0));
        assert_eq!(node.value("wrap").and_then(PropertyValue::as_str), Some("none"));
        assert_eq!(node.text_modes(), Some(TextModes::default()));
        assert!(scene.children(refs[0].id()).is_none(), "text is not a group");
    }

    #[test]
    fn insert_clamps_and_prepends() {
        let (mut scene, refs) = graph_with(&[NodeKind::Group, NodeKind::Rect, NodeKind::Rect]);
        let (g, a, b) = (refs[0].id(), &refs[1], &refs[2]);
        let mut released = Vec::new();

        scene.insert_child(g, a, Some(99), &mut released).unwrap();
        scene.insert_child(g, b, Some(0), &mut released).unwrap();
        assert_eq!(ids(scene.children(g).unwrap()), vec![b.id(), a.id()]);
        assert_eq!(scene.parent(a.id()), Some(g));
        assert!(released.is_empty(), "nothing was detached");
    }

    #[test]
    fn reinsert_detaches_from_previous_parent() {
        let (mut scene, refs) = graph_with(&[NodeKind::Group, NodeKind::Group, NodeKind::Rect]);
        let (g1, g2, r) = (refs[0].id(), refs[1].id(), &refs[2]);
        let mut released = Vec::new();

        scene.insert_child(g1, r, None, &mut released).unwrap();
        scene.insert_child(g2, r, None, &mut released).unwrap();
        assert!(scene.children(g1).unwrap().is_empty(), "moved out of g1");
        assert_eq!(ids(scene.children(g2).unwrap()), vec![r.id()]);
        assert_eq!(released.len(), 1, "old link released");
    }

    #[test]
    fn insert_rejects_cycles_and_non_groups() {
        let (mut scene, refs) = graph_with(&[NodeKind::Group, NodeKind::Group, NodeKind::Rect]);
        let mut released = Vec::new();
        scene.insert_child(refs[0].id(), &refs[1], None, &mut released).unwrap();

        assert_eq!(
            scene.insert_child(refs[1].id(), &refs[0], None, &mut released),
            Err(DropReason::Cycle)
        );
        assert_eq!(
            scene.insert_child(refs[2].id(), &refs[0], None, &mut released),
            Err(DropReason::NotAGroup)
        );
    }

    #[test]
    fn remove_absent_child_is_reported() {
        let (mut scene, refs) = graph_with(&[NodeKind::Group, NodeKind::Rect]);
        let mut released = Vec::new();
        assert_eq!(
            scene.remove_child(refs[0].id(), refs[1].id(), &mut released),
            Err(DropReason::ChildAbsent)
        );
    }

    #[test]
    fn destroy_orphans_children_and_releases_links() {
        let (mut scene, refs) = graph_with(&[NodeKind::Group, NodeKind::Group, NodeKind::Rect]);
        let (root, mid, leaf) = (&refs[0], &refs[1], &refs[2]);
        let mut released = Vec::new();
        scene.insert_child(root.id(), mid, None, &mut released).unwrap();
        scene.insert_child(mid.id(), leaf, None, &mut released).unwrap();

        scene.destroy(mid.id(), &mut released).unwrap();
        assert!(!scene.contains(mid.id()), "destroyed");
        assert!(scene.children(root.id()).unwrap().is_empty(), "detached from root");
        assert_eq!(scene.parent(leaf.id()), None);
        // Root's link to mid, mid's link to leaf, and the node itself.
        assert_eq!(released.len(), 3);
        assert_eq!(scene.destroy(mid.id(), &mut released), Err(DropReason::StaleTarget));
    }

    #[test]
    fn set_property_returns_previous_value() {
        let (mut scene, refs) = graph_with(&[NodeKind::Rect]);
        let x = NodeKind::Rect.lookup("x").unwrap();
        let old = scene
            .set_property(refs[0].id(), x, PropertyValue::Float(3.0), &mut Tracer::none())
            .unwrap();
        assert_eq!(old, PropertyValue::Float(0.0));
        assert_eq!(scene.node(refs[0].id()).unwrap().float("x"), Some(3.0));

        let err = scene
            .set_property(refs[0].id(), x, PropertyValue::Bool(true), &mut Tracer::none())
            .unwrap_err();
        assert_eq!(err, (DropReason::KindMismatch, PropertyValue::Bool(true)));
    }

    #[test]
    fn unknown_wrap_keeps_mode_but_stores_string() {
        let (mut scene, refs) = graph_with(&[NodeKind::Text]);
        let wrap = NodeKind::Text.lookup("wrap").unwrap();
        let id = refs[0].id();
        scene
            .set_property(id, wrap, "word".into(), &mut Tracer::none())
            .unwrap();
        scene
            .set_property(id, wrap, "zigzag".into(), &mut Tracer::none())
            .unwrap();
        let node = scene.node(id).unwrap();
        assert_eq!(node.text_modes().unwrap().wrap, crate::derived::Wrap::Word);
        assert_eq!(node.value("wrap").and_then(PropertyValue::as_str), Some("zigzag"));
    }

    #[test]
    fn evaluate_reports_changes_once() {
        let (mut scene, refs) = graph_with(&[NodeKind::Group, NodeKind::Rect, NodeKind::Text]);
        let (g, r, t) = (&refs[0], &refs[1], &refs[2]);
        let mut released = Vec::new();
        scene.insert_child(g.id(), r, None, &mut released).unwrap();

        let changes = scene.evaluate();
        assert_eq!(changes.added, vec![0, 1, 2]);
        assert!(changes.topology_changed, "child list changed");

        let opacity = NodeKind::Group.lookup("opacity").unwrap();
        assert!(scene.write_float(g.id(), opacity, 0.5), "group is live");
        let fill = NodeKind::Rect.lookup("r").unwrap();
        assert!(scene.write_float(r.id(), fill, 1.0), "rect is live");
        let w = NodeKind::Text.lookup("w").unwrap();
        assert!(scene.write_float(t.id(), w, 120.0), "text is live");

        let changes = scene.evaluate();
        assert!(changes.inherited.contains(&0), "group itself");
        assert!(changes.inherited.contains(&1), "propagated to child");
        assert_eq!(changes.properties.len(), 2, "rect fill and text width");
        assert!(!changes.properties.contains(&0), "group opacity is inherited");
        assert_eq!(changes.relayout, vec![2]);
        assert!(!changes.topology_changed, "no structural edits");

        assert!(scene.evaluate().is_empty(), "drained");
    }

    #[test]
    fn node_ref_equality_is_identity() {
        let a = NodeRef::new(NodeId::new(1, 0), NodeKind::Rect);
        let b = NodeRef::new(NodeId::new(1, 1), NodeKind::Rect);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
        assert_eq!(format!("{:?}", a.id()), "NodeId(1@gen0)");
    }
}
