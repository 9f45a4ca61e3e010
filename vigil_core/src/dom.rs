// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Host DOM contract.
//!
//! The core never holds a real DOM. Everything it needs to know about the
//! page goes through [`DomTree`], which backends implement over their native
//! tree (`web-sys` nodes in the browser, [`ArenaDom`](crate::tree::ArenaDom)
//! elsewhere and in tests).
//!
//! # Shadow-crossing containment
//!
//! [`DomTree::contains`] mirrors `Node.contains`: it follows light-DOM parent
//! links only and stops at a shadow root. [`DomTree::shadow_contains`] keeps
//! going: when the parent chain reaches a shadow root it jumps to the root's
//! host element and continues from there.
//!
//! ```text
//!   document
//!     └─ <main>                 shadow_contains(main, span) == true
//!          └─ <my-widget>       contains(main, span)        == false
//!               ╞═ #shadow-root
//!                    └─ <span>
//! ```

use alloc::borrow::Cow;
use alloc::vec::Vec;
use core::fmt::Debug;
use core::hash::Hash;

use crate::error::SelectorError;

/// Broad node categories the core distinguishes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The document node.
    Document,
    /// An element.
    Element,
    /// A text node.
    Text,
    /// A shadow root attached to an element.
    ShadowRoot,
    /// Comments, processing instructions, and anything else.
    Other,
}

/// Read-only view of a host DOM.
pub trait DomTree {
    /// Opaque, cheap node handle.
    ///
    /// Equality is node identity. The ordering has no DOM meaning; it only
    /// makes batch ordering deterministic.
    type Node: Copy + Eq + Ord + Hash + Debug;

    /// Returns the document node.
    fn document(&self) -> Self::Node;

    /// Returns the light-DOM parent of `node`.
    ///
    /// Shadow roots and detached subtree roots have no parent.
    fn parent(&self, node: Self::Node) -> Option<Self::Node>;

    /// Returns the host element if `node` is a shadow root.
    fn host(&self, node: Self::Node) -> Option<Self::Node>;

    /// Returns the category of `node`.
    fn kind(&self, node: Self::Node) -> NodeKind;

    /// Returns the node name (`DIV`, `#text`, custom element names, ...).
    fn node_name(&self, node: Self::Node) -> Cow<'_, str>;

    /// Returns `true` if `node` is attached to the document, possibly
    /// through one or more shadow roots.
    fn is_connected(&self, node: Self::Node) -> bool;

    /// Returns the light-DOM children of `node` in tree order.
    fn child_nodes(&self, node: Self::Node) -> Vec<Self::Node>;

    /// Returns the open shadow root attached to `element`, if any.
    ///
    /// Closed shadow roots are invisible, as they are to page scripts.
    fn open_shadow_root(&self, element: Self::Node) -> Option<Self::Node>;

    /// Returns every light-DOM descendant of `scope` matching `selector`, in
    /// tree order. Does not descend into shadow roots.
    fn query_selector_all(
        &self,
        scope: Self::Node,
        selector: &str,
    ) -> Result<Vec<Self::Node>, SelectorError>;

    /// Returns the parent of `node`, stepping from a shadow root to its host.
    fn composed_parent(&self, node: Self::Node) -> Option<Self::Node> {
        self.parent(node).or_else(|| self.host(node))
    }

    /// Inclusive light-DOM containment, like `Node.contains`.
    fn contains(&self, ancestor: Self::Node, node: Self::Node) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.parent(n);
        }
        false
    }

    /// Inclusive containment that crosses shadow-root boundaries.
    fn shadow_contains(&self, ancestor: Self::Node, node: Self::Node) -> bool {
        let mut current = Some(node);
        while let Some(n) = current {
            if n == ancestor {
                return true;
            }
            current = self.composed_parent(n);
        }
        false
    }

    /// Returns the element a scanner would examine for `node`: the node
    /// itself for elements, documents, and shadow roots, otherwise its parent.
    fn element_of(&self, node: Self::Node) -> Option<Self::Node> {
        match self.kind(node) {
            NodeKind::Element | NodeKind::Document | NodeKind::ShadowRoot => Some(node),
            NodeKind::Text | NodeKind::Other => self.composed_parent(node),
        }
    }
}
