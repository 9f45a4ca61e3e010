// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Struct-of-arrays DOM storage with allocation, topology, and a mutation log.

use alloc::borrow::Cow;
use alloc::string::String;
use alloc::vec::Vec;

use super::id::{INVALID, NodeId};
use super::selector::{ElementView, SelectorList};
use super::traverse::{Children, Descendants};
use crate::dom::{DomTree, NodeKind};
use crate::error::SelectorError;
use crate::watch::{MutationKind, MutationRecord};

/// Encapsulation mode of a shadow root.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShadowMode {
    /// Reachable through [`DomTree::open_shadow_root`].
    Open,
    /// Hidden from [`DomTree::open_shadow_root`].
    Closed,
}

/// Struct-of-arrays storage for a document.
///
/// Nodes are addressed by [`NodeId`] handles. Internally, each node occupies
/// a slot in parallel arrays. Destroyed nodes are recycled via a free list,
/// and generation counters prevent stale handle access.
///
/// Mutating methods panic on stale handles. The [`DomTree`] view is lenient
/// instead: a destroyed node reads as a detached node with no children,
/// which is what a host DOM reports for a node that was removed and dropped.
#[derive(Debug)]
pub struct ArenaDom {
    // -- Topology --
    pub(crate) parent: Vec<u32>,
    pub(crate) first_child: Vec<u32>,
    pub(crate) next_sibling: Vec<u32>,
    pub(crate) prev_sibling: Vec<u32>,

    // -- Shadow trees --
    /// On a host: its shadow root. On a shadow root: its host.
    pub(crate) shadow_link: Vec<u32>,
    pub(crate) shadow_mode: Vec<Option<ShadowMode>>,

    // -- Content --
    pub(crate) kind: Vec<NodeKind>,
    pub(crate) name: Vec<String>,
    pub(crate) attributes: Vec<Vec<(String, String)>>,
    pub(crate) text: Vec<String>,

    // -- Allocation --
    pub(crate) generation: Vec<u32>,
    pub(crate) alive: Vec<bool>,
    pub(crate) free_list: Vec<u32>,
    pub(crate) len: u32,

    // -- Mutation log --
    records: Vec<MutationRecord<NodeId>>,
}

impl Default for ArenaDom {
    fn default() -> Self {
        Self::new()
    }
}

impl ArenaDom {
    /// Creates a tree holding only the document node.
    #[must_use]
    pub fn new() -> Self {
        let mut dom = Self {
            parent: Vec::new(),
            first_child: Vec::new(),
            next_sibling: Vec::new(),
            prev_sibling: Vec::new(),
            shadow_link: Vec::new(),
            shadow_mode: Vec::new(),
            kind: Vec::new(),
            name: Vec::new(),
            attributes: Vec::new(),
            text: Vec::new(),
            generation: Vec::new(),
            alive: Vec::new(),
            free_list: Vec::new(),
            len: 0,
            records: Vec::new(),
        };
        dom.alloc(NodeKind::Document, "#document".into());
        dom
    }

    // -- Allocation API --

    /// Creates a detached element.
    pub fn create_element(&mut self, name: &str) -> NodeId {
        self.alloc(NodeKind::Element, name.into())
    }

    /// Creates a detached text node.
    pub fn create_text(&mut self, text: &str) -> NodeId {
        let id = self.alloc(NodeKind::Text, "#text".into());
        self.text[id.idx as usize] = text.into();
        id
    }

    /// Attaches a shadow root to `host` and returns it.
    ///
    /// Attaching a shadow root does not produce a mutation record.
    ///
    /// # Panics
    ///
    /// Panics if `host` is stale, is not an element, or already has a shadow
    /// root.
    pub fn attach_shadow(&mut self, host: NodeId, mode: ShadowMode) -> NodeId {
        self.validate(host);
        let h = host.idx as usize;
        assert!(
            self.kind[h] == NodeKind::Element,
            "only elements can host a shadow root"
        );
        assert!(
            self.shadow_link[h] == INVALID,
            "element already hosts a shadow root"
        );
        let root = self.alloc(NodeKind::ShadowRoot, "#document-fragment".into());
        self.shadow_link[h] = root.idx;
        self.shadow_link[root.idx as usize] = host.idx;
        self.shadow_mode[root.idx as usize] = Some(mode);
        root
    }

    /// Destroys `node` and its whole subtree, shadow trees included.
    ///
    /// An attached node is removed from its parent first, which is recorded.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale, refers to the document, or refers to a
    /// shadow root (destroy its host instead).
    pub fn destroy_node(&mut self, node: NodeId) {
        self.validate(node);
        assert!(
            !matches!(
                self.kind[node.idx as usize],
                NodeKind::Document | NodeKind::ShadowRoot
            ),
            "cannot destroy the document or a shadow root directly"
        );
        if self.parent[node.idx as usize] != INVALID {
            self.remove_from_parent(node);
        }

        let mut stack = alloc::vec![node.idx];
        while let Some(idx) = stack.pop() {
            let mut child = self.first_child[idx as usize];
            while child != INVALID {
                stack.push(child);
                child = self.next_sibling[child as usize];
            }
            if self.kind[idx as usize] == NodeKind::Element {
                let root = self.shadow_link[idx as usize];
                if root != INVALID {
                    stack.push(root);
                }
            }
            self.free(idx);
        }
    }

    /// Returns whether the given handle refers to a live node.
    #[must_use]
    pub fn is_alive(&self, id: NodeId) -> bool {
        id.idx < self.len
            && self.generation[id.idx as usize] == id.generation
            && self.alive[id.idx as usize]
    }

    // -- Topology API --

    /// Appends `child` as the last child of `parent`.
    ///
    /// If `child` already has a parent it is moved, producing a removal
    /// record on the old parent followed by an addition record on the new
    /// one, as a host DOM would.
    ///
    /// # Panics
    ///
    /// Panics if either handle is stale, `child` is the document or a shadow
    /// root, or `child` is an inclusive ancestor of `parent`.
    pub fn append_child(&mut self, parent: NodeId, child: NodeId) {
        self.prepare_insert(parent, child);
        let p = parent.idx;
        let c = child.idx;

        if self.first_child[p as usize] == INVALID {
            self.first_child[p as usize] = c;
        } else {
            // Walk to last child.
            let mut last = self.first_child[p as usize];
            while self.next_sibling[last as usize] != INVALID {
                last = self.next_sibling[last as usize];
            }
            self.next_sibling[last as usize] = c;
            self.prev_sibling[c as usize] = last;
        }
        self.parent[c as usize] = p;
        self.record_child_list(parent, alloc::vec![child], Vec::new());
    }

    /// Inserts `child` into `parent` before `reference`.
    ///
    /// # Panics
    ///
    /// Panics under the same conditions as [`append_child`](Self::append_child),
    /// or if `reference` is not a child of `parent`.
    pub fn insert_before(&mut self, parent: NodeId, child: NodeId, reference: NodeId) {
        self.validate(reference);
        assert!(
            self.parent[reference.idx as usize] == parent.idx,
            "reference is not a child of parent"
        );
        assert!(child != reference, "cannot insert a node before itself");
        self.prepare_insert(parent, child);
        let p = parent.idx;
        let c = child.idx;
        let s = reference.idx;

        self.parent[c as usize] = p;
        self.next_sibling[c as usize] = s;
        self.prev_sibling[c as usize] = self.prev_sibling[s as usize];
        if self.prev_sibling[s as usize] != INVALID {
            self.next_sibling[self.prev_sibling[s as usize] as usize] = c;
        } else {
            // `reference` was the first child.
            self.first_child[p as usize] = c;
        }
        self.prev_sibling[s as usize] = c;
        self.record_child_list(parent, alloc::vec![child], Vec::new());
    }

    /// Removes `child` from its parent.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or the node has no parent.
    pub fn remove_from_parent(&mut self, child: NodeId) {
        self.validate(child);
        let c = child.idx;
        let p = self.parent[c as usize];
        assert!(p != INVALID, "node has no parent");
        self.unlink_from_parent(c);
        let parent = self.handle(p);
        self.record_child_list(parent, Vec::new(), alloc::vec![child]);
    }

    /// Returns the parent of a node, if any.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.validate(id);
        let p = self.parent[id.idx as usize];
        (p != INVALID).then(|| self.handle(p))
    }

    /// Returns an iterator over the light-DOM children of a node.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn children(&self, id: NodeId) -> Children<'_> {
        self.validate(id);
        Children::new(self, self.first_child[id.idx as usize])
    }

    /// Returns a pre-order iterator over the light-DOM descendants of a node.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn descendants(&self, id: NodeId) -> Descendants<'_> {
        self.validate(id);
        Descendants::new(self, id.idx)
    }

    // -- Content API (records mutations) --

    /// Sets an attribute, replacing any previous value.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or not an element.
    pub fn set_attribute(&mut self, element: NodeId, name: &str, value: &str) {
        self.validate_element(element);
        let attrs = &mut self.attributes[element.idx as usize];
        match attrs.iter_mut().find(|(n, _)| n.eq_ignore_ascii_case(name)) {
            Some((_, v)) => *v = value.into(),
            None => attrs.push((name.into(), value.into())),
        }
        self.record_attribute(element, name);
    }

    /// Removes an attribute. Removing a missing attribute is not recorded.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or not an element.
    pub fn remove_attribute(&mut self, element: NodeId, name: &str) {
        self.validate_element(element);
        let attrs = &mut self.attributes[element.idx as usize];
        let before = attrs.len();
        attrs.retain(|(n, _)| !n.eq_ignore_ascii_case(name));
        if attrs.len() != before {
            self.record_attribute(element, name);
        }
    }

    /// Returns an attribute value.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn attribute(&self, element: NodeId, name: &str) -> Option<&str> {
        self.validate(element);
        self.attributes[element.idx as usize]
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    /// Replaces the data of a text node.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale or not a text node.
    pub fn set_text(&mut self, node: NodeId, text: &str) {
        self.validate(node);
        assert!(
            self.kind[node.idx as usize] == NodeKind::Text,
            "not a text node"
        );
        self.text[node.idx as usize] = text.into();
        self.records.push(MutationRecord {
            kind: MutationKind::CharacterData,
            target: node,
            added: Vec::new(),
            removed: Vec::new(),
            attribute_name: None,
        });
    }

    /// Returns the data of a text node, or an empty string for other nodes.
    ///
    /// # Panics
    ///
    /// Panics if the handle is stale.
    #[must_use]
    pub fn text(&self, node: NodeId) -> &str {
        self.validate(node);
        &self.text[node.idx as usize]
    }

    // -- Mutation log --

    /// Drains the pending mutation log.
    ///
    /// Only records whose target is light-DOM contained by one of `observed`
    /// are returned, matching what a subtree observer registered on each of
    /// those roots would report. Everything else is dropped.
    pub fn take_records(&mut self, observed: &[NodeId]) -> Vec<MutationRecord<NodeId>> {
        let records = core::mem::take(&mut self.records);
        records
            .into_iter()
            .filter(|r| observed.iter().any(|&root| self.contains(root, r.target)))
            .collect()
    }

    /// Returns the number of records waiting in the log.
    #[must_use]
    pub fn pending_records(&self) -> usize {
        self.records.len()
    }

    // -- Internals --

    pub(crate) fn handle(&self, idx: u32) -> NodeId {
        NodeId {
            idx,
            generation: self.generation[idx as usize],
        }
    }

    fn alloc(&mut self, kind: NodeKind, name: String) -> NodeId {
        let idx = if let Some(idx) = self.free_list.pop() {
            // Reuse a freed slot.
            let i = idx as usize;
            self.generation[i] += 1;
            self.alive[i] = true;
            self.parent[i] = INVALID;
            self.first_child[i] = INVALID;
            self.next_sibling[i] = INVALID;
            self.prev_sibling[i] = INVALID;
            self.shadow_link[i] = INVALID;
            self.shadow_mode[i] = None;
            self.kind[i] = kind;
            self.name[i] = name;
            self.attributes[i].clear();
            self.text[i].clear();
            idx
        } else {
            // Allocate a new slot.
            let idx = self.len;
            self.len += 1;
            self.parent.push(INVALID);
            self.first_child.push(INVALID);
            self.next_sibling.push(INVALID);
            self.prev_sibling.push(INVALID);
            self.shadow_link.push(INVALID);
            self.shadow_mode.push(None);
            self.kind.push(kind);
            self.name.push(name);
            self.attributes.push(Vec::new());
            self.text.push(String::new());
            self.generation.push(0);
            self.alive.push(true);
            idx
        };
        self.handle(idx)
    }

    fn free(&mut self, idx: u32) {
        let i = idx as usize;
        self.alive[i] = false;
        // Bump generation so old handles immediately fail validation.
        self.generation[i] += 1;
        self.parent[i] = INVALID;
        self.first_child[i] = INVALID;
        self.next_sibling[i] = INVALID;
        self.prev_sibling[i] = INVALID;
        self.shadow_link[i] = INVALID;
        self.free_list.push(idx);
    }

    fn prepare_insert(&mut self, parent: NodeId, child: NodeId) {
        self.validate(parent);
        self.validate(child);
        assert!(
            !matches!(
                self.kind[child.idx as usize],
                NodeKind::Document | NodeKind::ShadowRoot
            ),
            "the document and shadow roots cannot be inserted"
        );
        assert!(
            !self.shadow_contains(child, parent),
            "cannot insert a node into its own subtree"
        );
        if self.parent[child.idx as usize] != INVALID {
            self.remove_from_parent(child);
        }
        self.prev_sibling[child.idx as usize] = INVALID;
        self.next_sibling[child.idx as usize] = INVALID;
    }

    fn unlink_from_parent(&mut self, c: u32) {
        let p = self.parent[c as usize];
        let prev = self.prev_sibling[c as usize];
        let next = self.next_sibling[c as usize];
        if prev != INVALID {
            self.next_sibling[prev as usize] = next;
        } else {
            self.first_child[p as usize] = next;
        }
        if next != INVALID {
            self.prev_sibling[next as usize] = prev;
        }
        self.parent[c as usize] = INVALID;
        self.prev_sibling[c as usize] = INVALID;
        self.next_sibling[c as usize] = INVALID;
    }

    fn record_child_list(&mut self, target: NodeId, added: Vec<NodeId>, removed: Vec<NodeId>) {
        self.records.push(MutationRecord {
            kind: MutationKind::ChildList,
            target,
            added,
            removed,
            attribute_name: None,
        });
    }

    fn record_attribute(&mut self, target: NodeId, name: &str) {
        self.records.push(MutationRecord {
            kind: MutationKind::Attributes,
            target,
            added: Vec::new(),
            removed: Vec::new(),
            attribute_name: Some(name.into()),
        });
    }

    fn validate(&self, id: NodeId) {
        assert!(self.is_alive(id), "stale node handle {id:?}");
    }

    fn validate_element(&self, id: NodeId) {
        self.validate(id);
        assert!(
            self.kind[id.idx as usize] == NodeKind::Element,
            "not an element"
        );
    }
}

impl DomTree for ArenaDom {
    type Node = NodeId;

    fn document(&self) -> NodeId {
        self.handle(0)
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        if !self.is_alive(node) {
            return None;
        }
        let p = self.parent[node.idx as usize];
        (p != INVALID).then(|| self.handle(p))
    }

    fn host(&self, node: NodeId) -> Option<NodeId> {
        if !self.is_alive(node) || self.kind[node.idx as usize] != NodeKind::ShadowRoot {
            return None;
        }
        Some(self.handle(self.shadow_link[node.idx as usize]))
    }

    fn kind(&self, node: NodeId) -> NodeKind {
        if self.is_alive(node) {
            self.kind[node.idx as usize]
        } else {
            NodeKind::Other
        }
    }

    fn node_name(&self, node: NodeId) -> Cow<'_, str> {
        if self.is_alive(node) {
            Cow::Borrowed(&self.name[node.idx as usize])
        } else {
            Cow::Borrowed("")
        }
    }

    fn is_connected(&self, node: NodeId) -> bool {
        let document = self.document();
        self.is_alive(node) && self.shadow_contains(document, node)
    }

    fn child_nodes(&self, node: NodeId) -> Vec<NodeId> {
        if !self.is_alive(node) {
            return Vec::new();
        }
        Children::new(self, self.first_child[node.idx as usize]).collect()
    }

    fn open_shadow_root(&self, element: NodeId) -> Option<NodeId> {
        if !self.is_alive(element) || self.kind[element.idx as usize] != NodeKind::Element {
            return None;
        }
        let root = self.shadow_link[element.idx as usize];
        if root == INVALID || self.shadow_mode[root as usize] != Some(ShadowMode::Open) {
            return None;
        }
        Some(self.handle(root))
    }

    fn query_selector_all(
        &self,
        scope: NodeId,
        selector: &str,
    ) -> Result<Vec<NodeId>, SelectorError> {
        let list = SelectorList::parse(selector)?;
        if !self.is_alive(scope) {
            return Ok(Vec::new());
        }
        Ok(Descendants::new(self, scope.idx)
            .filter(|&n| {
                let i = n.idx as usize;
                self.kind[i] == NodeKind::Element
                    && list.matches(&ElementView {
                        name: &self.name[i],
                        attributes: &self.attributes[i],
                    })
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    fn element_with_id(dom: &mut ArenaDom, parent: NodeId, name: &str, id: &str) -> NodeId {
        let el = dom.create_element(name);
        dom.set_attribute(el, "id", id);
        dom.append_child(parent, el);
        el
    }

    #[test]
    fn build_and_query() {
        let mut dom = ArenaDom::new();
        let doc = dom.document();
        let main = element_with_id(&mut dom, doc, "main", "main");
        let a = element_with_id(&mut dom, main, "button", "a");
        let b = element_with_id(&mut dom, main, "button", "b");
        dom.set_attribute(b, "class", "primary");

        assert_eq!(dom.children(main).collect::<Vec<_>>(), vec![a, b]);
        assert_eq!(dom.query_selector_all(doc, "button").unwrap(), vec![a, b]);
        assert_eq!(dom.query_selector_all(doc, ".primary").unwrap(), vec![b]);
        assert!(
            dom.query_selector_all(main, "#main").unwrap().is_empty(),
            "scope itself is not a match"
        );
        assert_eq!(
            dom.query_selector_all(doc, "main button"),
            Err(SelectorError::Unsupported("main button".into()))
        );
    }

    #[test]
    fn insert_before_and_remove_keep_sibling_links() {
        let mut dom = ArenaDom::new();
        let doc = dom.document();
        let a = dom.create_element("a");
        let b = dom.create_element("b");
        let c = dom.create_element("c");
        dom.append_child(doc, c);
        dom.insert_before(doc, a, c);
        dom.insert_before(doc, b, c);
        assert_eq!(dom.children(doc).collect::<Vec<_>>(), vec![a, b, c]);

        dom.remove_from_parent(b);
        assert_eq!(dom.children(doc).collect::<Vec<_>>(), vec![a, c]);
        assert_eq!(dom.parent_of(b), None);
        assert!(!dom.is_connected(b));
    }

    #[test]
    fn moving_a_node_records_removal_then_addition() {
        let mut dom = ArenaDom::new();
        let doc = dom.document();
        let left = dom.create_element("div");
        let right = dom.create_element("div");
        let item = dom.create_element("span");
        dom.append_child(doc, left);
        dom.append_child(doc, right);
        dom.append_child(left, item);
        let _ = dom.take_records(&[doc]);

        dom.append_child(right, item);
        let records = dom.take_records(&[doc]);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].target, left);
        assert_eq!(records[0].removed, vec![item]);
        assert_eq!(records[1].target, right);
        assert_eq!(records[1].added, vec![item]);
    }

    #[test]
    fn shadow_roots_cross_for_connection_but_not_for_contains() {
        let mut dom = ArenaDom::new();
        let doc = dom.document();
        let host = dom.create_element("my-widget");
        dom.append_child(doc, host);
        let root = dom.attach_shadow(host, ShadowMode::Open);
        let inner = dom.create_element("span");
        dom.append_child(root, inner);

        assert_eq!(dom.open_shadow_root(host), Some(root));
        assert_eq!(dom.host(root), Some(host));
        assert_eq!(dom.parent(root), None);
        assert!(dom.is_connected(inner));
        assert!(!dom.contains(doc, inner));
        assert!(dom.shadow_contains(doc, inner));
        assert!(dom.shadow_contains(host, inner));
        assert!(dom.query_selector_all(doc, "span").unwrap().is_empty());
        assert_eq!(dom.query_selector_all(root, "span").unwrap(), vec![inner]);
    }

    #[test]
    fn closed_shadow_roots_are_hidden() {
        let mut dom = ArenaDom::new();
        let host = dom.create_element("x-closed");
        let _root = dom.attach_shadow(host, ShadowMode::Closed);
        assert_eq!(dom.open_shadow_root(host), None);
    }

    #[test]
    fn take_records_filters_by_light_dom_containment() {
        let mut dom = ArenaDom::new();
        let doc = dom.document();
        let host = dom.create_element("my-widget");
        dom.append_child(doc, host);
        let root = dom.attach_shadow(host, ShadowMode::Open);
        let inner = dom.create_element("span");
        dom.append_child(root, inner);
        dom.set_attribute(inner, "title", "x");

        let detached = dom.create_element("div");
        dom.set_attribute(detached, "hidden", "");

        assert_eq!(dom.pending_records(), 4);
        let records = dom.take_records(&[doc]);
        assert_eq!(records.len(), 1, "shadow and detached mutations are unobserved");
        assert_eq!(records[0].target, doc);
        assert_eq!(dom.pending_records(), 0);
    }

    #[test]
    fn text_changes_are_character_data_records() {
        let mut dom = ArenaDom::new();
        let doc = dom.document();
        let p = dom.create_element("p");
        let t = dom.create_text("hello");
        dom.append_child(doc, p);
        dom.append_child(p, t);
        let _ = dom.take_records(&[doc]);

        dom.set_text(t, "bye");
        let records = dom.take_records(&[doc]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].kind, MutationKind::CharacterData);
        assert_eq!(dom.text(t), "bye");
        assert_eq!(dom.element_of(t), Some(p));
    }

    #[test]
    fn destroyed_nodes_read_as_detached_and_slots_are_reused() {
        let mut dom = ArenaDom::new();
        let doc = dom.document();
        let outer = dom.create_element("div");
        let inner = dom.create_element("span");
        dom.append_child(doc, outer);
        dom.append_child(outer, inner);
        let root = dom.attach_shadow(inner, ShadowMode::Open);

        dom.destroy_node(outer);
        for node in [outer, inner, root] {
            assert!(!dom.is_alive(node));
            assert!(!dom.is_connected(node));
            assert_eq!(dom.parent(node), None);
            assert!(dom.child_nodes(node).is_empty());
        }
        assert!(dom.child_nodes(doc).is_empty());

        let fresh = dom.create_element("p");
        assert!(dom.is_alive(fresh));
        assert_ne!(fresh, outer);
    }

    #[test]
    fn removing_missing_attribute_is_not_recorded() {
        let mut dom = ArenaDom::new();
        let doc = dom.document();
        let el = dom.create_element("div");
        dom.append_child(doc, el);
        let _ = dom.take_records(&[doc]);
        dom.remove_attribute(el, "hidden");
        assert_eq!(dom.pending_records(), 0);
        dom.set_attribute(el, "hidden", "");
        dom.remove_attribute(el, "HIDDEN");
        assert_eq!(dom.attribute(el, "hidden"), None);
        assert_eq!(dom.pending_records(), 2);
    }

    #[test]
    #[should_panic(expected = "stale node handle")]
    fn stale_handle_panics_on_mutation() {
        let mut dom = ArenaDom::new();
        let el = dom.create_element("div");
        dom.destroy_node(el);
        dom.set_attribute(el, "id", "x");
    }
}
