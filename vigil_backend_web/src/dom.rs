// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Live DOM access through small integer handles.
//!
//! The core needs `Copy + Ord + Hash` node handles; JS nodes are none of
//! those. [`WebDom`] keeps a registry from JS node to [`NodeRef`], using a
//! `WeakMap` keyed by the node object so identity lookups stay O(1) and the
//! map never keeps a node alive.

use alloc::borrow::Cow;
use alloc::string::ToString;
use alloc::vec::Vec;
use core::cell::RefCell;

use hashbrown::{HashMap, HashSet};

use js_sys::{Array, Object, WeakMap};
use wasm_bindgen::{JsCast as _, JsValue};
use web_sys::{Document, DocumentFragment, Element, Node, NodeList, ShadowRoot};

use vigil_core::dom::{DomTree, NodeKind};
use vigil_core::error::SelectorError;
use vigil_core::watch::{MutationKind, MutationRecord};

/// Handle to a DOM node registered with a [`WebDom`].
///
/// Handles are never reused, so a handle whose node was pruned reads as
/// detached instead of aliasing another node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeRef(pub u32);

/// Handle allocation for [`WebDom`].
///
/// Handles count up from zero and are never reissued.
struct NodeRegistry<T> {
    nodes: HashMap<u32, T>,
    next: u32,
}

impl<T> NodeRegistry<T> {
    fn new() -> Self {
        Self {
            nodes: HashMap::new(),
            next: 0,
        }
    }

    /// Registers `node` under a fresh handle, or returns `None` once the
    /// handle space is spent.
    fn insert(&mut self, node: T) -> Option<u32> {
        let idx = self.next;
        if idx == u32::MAX {
            return None;
        }
        self.next += 1;
        self.nodes.insert(idx, node);
        Some(idx)
    }

    fn get(&self, idx: u32) -> Option<&T> {
        self.nodes.get(&idx)
    }

    fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Removes every entry for which `remove` returns `true` and hands the
    /// removed nodes back.
    fn remove_where(&mut self, mut remove: impl FnMut(u32, &T) -> bool) -> Vec<T> {
        self.nodes
            .extract_if(|&idx, node| remove(idx, node))
            .map(|(_, node)| node)
            .collect()
    }
}

/// A [`DomTree`] over the browser document.
pub struct WebDom {
    document: Document,
    document_ref: NodeRef,
    registry: RefCell<NodeRegistry<Node>>,
    ids: WeakMap,
}

impl core::fmt::Debug for WebDom {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WebDom")
            .field("document_ref", &self.document_ref)
            .field("live", &self.registry.borrow().len())
            .finish_non_exhaustive()
    }
}

impl WebDom {
    /// Creates a registry whose first handle is `document`.
    #[must_use]
    pub fn new(document: Document) -> Self {
        let mut dom = Self {
            document,
            document_ref: NodeRef(0),
            registry: RefCell::new(NodeRegistry::new()),
            ids: WeakMap::new(),
        };
        let node: Node = dom.document.clone().into();
        dom.document_ref = dom.intern(&node);
        dom
    }

    /// Returns the document.
    #[must_use]
    pub fn html_document(&self) -> &Document {
        &self.document
    }

    /// Returns the handle for `node`, registering it on first sight.
    pub fn intern(&self, node: &Node) -> NodeRef {
        let key: &Object = node.as_ref();
        if let Some(idx) = self.ids.get(key).as_f64() {
            #[expect(
                clippy::cast_possible_truncation,
                clippy::cast_sign_loss,
                reason = "the map only ever stores u32 handles"
            )]
            return NodeRef(idx as u32);
        }
        let Some(idx) = self.registry.borrow_mut().insert(node.clone()) else {
            // Out of handles; the node reads as detached.
            return NodeRef(u32::MAX);
        };
        self.ids.set(key, &JsValue::from(idx));
        NodeRef(idx)
    }

    /// Returns the JS node behind a handle.
    #[must_use]
    pub fn node(&self, node: NodeRef) -> Option<Node> {
        self.registry.borrow().get(node.0).cloned()
    }

    /// Returns the JS element behind a handle.
    #[must_use]
    pub fn element(&self, node: NodeRef) -> Option<Element> {
        self.node(node).and_then(|n| n.dyn_into::<Element>().ok())
    }

    /// Returns the number of registered nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registry.borrow().len()
    }

    /// Returns `true` if no node is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Forgets disconnected nodes that are not in `retain`.
    ///
    /// Returns how many nodes were dropped.
    pub fn prune(&self, retain: &HashSet<NodeRef>) -> usize {
        let dropped = self.registry.borrow_mut().remove_where(|idx, node| {
            let handle = NodeRef(idx);
            handle != self.document_ref && !retain.contains(&handle) && !node.is_connected()
        });
        for node in &dropped {
            self.ids.delete(node.as_ref());
        }
        dropped.len()
    }

    /// Converts native mutation records, registering every node they name.
    ///
    /// Records of unknown type are dropped.
    pub fn convert_records(&self, records: &Array) -> Vec<MutationRecord<NodeRef>> {
        records
            .iter()
            .filter_map(|r| r.dyn_into::<web_sys::MutationRecord>().ok())
            .filter_map(|r| self.convert(&r))
            .collect()
    }

    fn convert(&self, record: &web_sys::MutationRecord) -> Option<MutationRecord<NodeRef>> {
        let kind = match record.type_().as_str() {
            "childList" => MutationKind::ChildList,
            "attributes" => MutationKind::Attributes,
            "characterData" => MutationKind::CharacterData,
            _ => return None,
        };
        let target = self.intern(&record.target()?);
        Some(MutationRecord {
            kind,
            target,
            added: self.intern_list(&record.added_nodes()),
            removed: self.intern_list(&record.removed_nodes()),
            attribute_name: record.attribute_name(),
        })
    }

    fn intern_list(&self, list: &NodeList) -> Vec<NodeRef> {
        (0..list.length())
            .filter_map(|i| list.item(i))
            .map(|n| self.intern(&n))
            .collect()
    }
}

impl DomTree for WebDom {
    type Node = NodeRef;

    fn document(&self) -> NodeRef {
        self.document_ref
    }

    fn parent(&self, node: NodeRef) -> Option<NodeRef> {
        let parent = self.node(node)?.parent_node()?;
        Some(self.intern(&parent))
    }

    fn host(&self, node: NodeRef) -> Option<NodeRef> {
        let root = self.node(node)?.dyn_into::<ShadowRoot>().ok()?;
        let host: Node = root.host().into();
        Some(self.intern(&host))
    }

    fn kind(&self, node: NodeRef) -> NodeKind {
        let Some(n) = self.node(node) else {
            return NodeKind::Other;
        };
        match n.node_type() {
            Node::DOCUMENT_NODE => NodeKind::Document,
            Node::ELEMENT_NODE => NodeKind::Element,
            Node::TEXT_NODE => NodeKind::Text,
            Node::DOCUMENT_FRAGMENT_NODE if n.has_type::<ShadowRoot>() => NodeKind::ShadowRoot,
            _ => NodeKind::Other,
        }
    }

    fn node_name(&self, node: NodeRef) -> Cow<'_, str> {
        self.node(node)
            .map_or(Cow::Borrowed(""), |n| Cow::Owned(n.node_name()))
    }

    fn is_connected(&self, node: NodeRef) -> bool {
        self.node(node).is_some_and(|n| n.is_connected())
    }

    fn child_nodes(&self, node: NodeRef) -> Vec<NodeRef> {
        self.node(node)
            .map(|n| self.intern_list(&n.child_nodes()))
            .unwrap_or_default()
    }

    fn open_shadow_root(&self, element: NodeRef) -> Option<NodeRef> {
        let root: Node = self.element(element)?.shadow_root()?.into();
        Some(self.intern(&root))
    }

    fn query_selector_all(
        &self,
        scope: NodeRef,
        selector: &str,
    ) -> Result<Vec<NodeRef>, SelectorError> {
        if selector.trim().is_empty() {
            return Err(SelectorError::Empty);
        }
        let Some(scope) = self.node(scope) else {
            return Ok(Vec::new());
        };
        let unsupported = |_: JsValue| SelectorError::Unsupported(selector.to_string());
        let list = if let Some(document) = scope.dyn_ref::<Document>() {
            document.query_selector_all(selector).map_err(unsupported)?
        } else if let Some(element) = scope.dyn_ref::<Element>() {
            element.query_selector_all(selector).map_err(unsupported)?
        } else if let Some(fragment) = scope.dyn_ref::<DocumentFragment>() {
            fragment.query_selector_all(selector).map_err(unsupported)?
        } else {
            return Ok(Vec::new());
        };
        Ok(self.intern_list(&list))
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    #[test]
    fn handles_are_never_reissued() {
        let mut registry = NodeRegistry::new();
        assert_eq!(registry.insert("a"), Some(0));
        assert_eq!(registry.insert("b"), Some(1));
        assert_eq!(registry.remove_where(|idx, _| idx == 1), vec!["b"]);
        assert_eq!(registry.insert("c"), Some(2));
        assert_eq!(registry.get(1), None);
        assert_eq!(registry.get(2), Some(&"c"));
    }

    #[test]
    fn pruned_entries_release_their_storage() {
        let mut registry = NodeRegistry::new();
        for round in 0..1_000_u32 {
            let idx = registry.insert(round).unwrap();
            assert_eq!(idx, round);
            if round % 10 != 0 {
                let _ = registry.remove_where(|i, _| i == idx);
            }
        }
        assert_eq!(registry.len(), 100);
        assert_eq!(registry.remove_where(|_, &n| n >= 500).len(), 50);
        assert_eq!(registry.len(), 50);
    }

    #[test]
    fn exhausted_registry_refuses_new_handles() {
        let mut registry = NodeRegistry::new();
        registry.next = u32::MAX - 1;
        assert_eq!(registry.insert(()), Some(u32::MAX - 1));
        assert_eq!(registry.insert(()), None);
        assert_eq!(registry.len(), 1);
    }
}
