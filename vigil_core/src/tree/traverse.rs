// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tree traversal utilities.

use alloc::vec::Vec;

use super::id::{INVALID, NodeId};
use super::store::ArenaDom;

/// An iterator over the light-DOM children of a node.
///
/// Created by [`ArenaDom::children`].
#[derive(Debug)]
pub struct Children<'a> {
    dom: &'a ArenaDom,
    current: u32,
}

impl<'a> Children<'a> {
    pub(crate) fn new(dom: &'a ArenaDom, first: u32) -> Self {
        Self {
            dom,
            current: first,
        }
    }
}

impl Iterator for Children<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        if self.current == INVALID {
            return None;
        }
        let idx = self.current;
        self.current = self.dom.next_sibling[idx as usize];
        Some(self.dom.handle(idx))
    }
}

/// A pre-order iterator over the light-DOM descendants of a node, excluding
/// the node itself. Shadow trees are not entered.
///
/// Created by [`ArenaDom::descendants`].
#[derive(Debug)]
pub struct Descendants<'a> {
    dom: &'a ArenaDom,
    stack: Vec<u32>,
}

impl<'a> Descendants<'a> {
    pub(crate) fn new(dom: &'a ArenaDom, root: u32) -> Self {
        let mut stack = Vec::new();
        push_children_reversed(dom, root, &mut stack);
        Self { dom, stack }
    }
}

impl Iterator for Descendants<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let idx = self.stack.pop()?;
        push_children_reversed(self.dom, idx, &mut self.stack);
        Some(self.dom.handle(idx))
    }
}

fn push_children_reversed(dom: &ArenaDom, idx: u32, stack: &mut Vec<u32>) {
    let start = stack.len();
    let mut child = dom.first_child[idx as usize];
    while child != INVALID {
        stack.push(child);
        child = dom.next_sibling[child as usize];
    }
    stack[start..].reverse();
}
