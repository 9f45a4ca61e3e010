// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shadow-aware mutation watching.
//!
//! Native subtree observation stops at shadow roots. [`ShadowWatcher`] closes
//! that gap: whenever a mutation batch adds nodes, the added subtrees are
//! searched (through nested shadow trees too) for open shadow roots that are
//! not observed yet, and each one is handed back to the host as an
//! [`Observation`] to register with the same options as the original target.
//!
//! The watcher also drops records that only concern the annotator's own
//! elements ([`ReservedNames`]), so rendering annotations never triggers
//! another scan.
//!
//! Shadow roots that already existed when observation began, and whose hosts
//! are never added afterwards, are not discovered.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::hash::Hash;

use hashbrown::HashSet;

use crate::dom::{DomTree, NodeKind};

/// What kind of change a [`MutationRecord`] describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MutationKind {
    /// Children were added or removed.
    ChildList,
    /// An attribute changed.
    Attributes,
    /// Text data changed.
    CharacterData,
}

/// One observed change, in the shape native observers report.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutationRecord<N> {
    /// Change category.
    pub kind: MutationKind,
    /// The node whose children, attributes, or data changed.
    pub target: N,
    /// Nodes added to `target`.
    pub added: Vec<N>,
    /// Nodes removed from `target`.
    pub removed: Vec<N>,
    /// The changed attribute, for [`MutationKind::Attributes`].
    pub attribute_name: Option<String>,
}

/// Options a subtree observation is registered with.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ObserveOptions {
    /// Report child additions and removals.
    pub child_list: bool,
    /// Report changes anywhere in the target's subtree.
    pub subtree: bool,
    /// Report attribute changes.
    pub attributes: bool,
    /// Report text changes.
    pub character_data: bool,
    /// Restrict attribute reports to these names.
    pub attribute_filter: Option<Vec<String>>,
}

impl ObserveOptions {
    /// Everything, for the whole subtree.
    #[must_use]
    pub fn subtree_all() -> Self {
        Self {
            child_list: true,
            subtree: true,
            attributes: true,
            character_data: true,
            attribute_filter: None,
        }
    }
}

impl Default for ObserveOptions {
    fn default() -> Self {
        Self::subtree_all()
    }
}

/// Node names the annotator renders itself.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReservedNames {
    names: Vec<String>,
}

impl ReservedNames {
    /// Derives the reserved names for an instance name: `{name}-container`,
    /// `{name}-trigger`, and `{name}-dialog`.
    #[must_use]
    pub fn for_prefix(name: &str) -> Self {
        Self {
            names: ["container", "trigger", "dialog"]
                .iter()
                .map(|suffix| format!("{name}-{suffix}"))
                .collect(),
        }
    }

    /// Uses an explicit list of names.
    #[must_use]
    pub fn new(names: impl IntoIterator<Item = String>) -> Self {
        Self {
            names: names.into_iter().collect(),
        }
    }

    /// Returns the reserved names.
    #[must_use]
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Returns `true` if `node_name` is reserved. Comparison ignores ASCII
    /// case, since hosts report element names uppercased.
    #[must_use]
    pub fn contains(&self, node_name: &str) -> bool {
        self.names.iter().any(|n| n.eq_ignore_ascii_case(node_name))
    }
}

/// A root the host must observe natively.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Observation<N> {
    /// Node to observe.
    pub target: N,
    /// Options to observe it with.
    pub options: ObserveOptions,
}

/// Result of [`ShadowWatcher::process`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WatchBatch<N> {
    /// Records that survived filtering, in arrival order.
    pub records: Vec<MutationRecord<N>>,
    /// Newly discovered shadow roots to observe.
    pub new_roots: Vec<Observation<N>>,
}

/// Tracks observed roots and filters mutation batches.
#[derive(Clone, Debug)]
pub struct ShadowWatcher<N> {
    options: ObserveOptions,
    reserved: ReservedNames,
    tracked: HashSet<N>,
    roots: Vec<N>,
}

impl<N> ShadowWatcher<N>
where
    N: Copy + Eq + Hash,
{
    /// Creates a watcher that observes nothing yet.
    #[must_use]
    pub fn new(options: ObserveOptions, reserved: ReservedNames) -> Self {
        Self {
            options,
            reserved,
            tracked: HashSet::new(),
            roots: Vec::new(),
        }
    }

    /// Returns the reserved names this watcher filters.
    #[must_use]
    pub fn reserved(&self) -> &ReservedNames {
        &self.reserved
    }

    /// Starts tracking `target` and returns what the host must observe.
    pub fn observe(&mut self, target: N) -> Observation<N> {
        if self.tracked.insert(target) {
            self.roots.push(target);
        }
        Observation {
            target,
            options: self.options.clone(),
        }
    }

    /// Returns `true` if `node` is an observed root.
    #[must_use]
    pub fn is_tracked(&self, node: N) -> bool {
        self.tracked.contains(&node)
    }

    /// Returns every observed root, in the order they were observed.
    #[must_use]
    pub fn roots(&self) -> &[N] {
        &self.roots
    }

    /// Forgets observed roots that are no longer connected, so a removed
    /// component's shadow tree is not kept alive through its handle.
    ///
    /// A forgotten root is discovered again if its host is re-inserted.
    /// Returns how many roots were dropped.
    pub fn forget_disconnected<D>(&mut self, dom: &D) -> usize
    where
        D: DomTree<Node = N>,
    {
        let before = self.roots.len();
        let tracked = &mut self.tracked;
        self.roots.retain(|&root| {
            let keep = dom.is_connected(root);
            if !keep {
                tracked.remove(&root);
            }
            keep
        });
        before - self.roots.len()
    }

    /// Forgets every observed root.
    pub fn reset(&mut self) {
        self.tracked.clear();
        self.roots.clear();
    }

    /// Discovers new shadow roots in a raw batch, then filters it.
    ///
    /// Discovery runs over every record, including those that are then
    /// filtered out, but never descends into reserved elements. Roots that
    /// left the document are forgotten first.
    pub fn process<D>(&mut self, records: Vec<MutationRecord<N>>, dom: &D) -> WatchBatch<N>
    where
        D: DomTree<Node = N>,
    {
        self.forget_disconnected(dom);
        let mut new_roots = Vec::new();
        for record in &records {
            for &added in &record.added {
                self.discover(added, dom, &mut new_roots);
            }
        }
        let records = records
            .into_iter()
            .filter(|r| !self.is_own_mutation(r, dom))
            .collect();
        WatchBatch { records, new_roots }
    }

    /// Maps records to the nodes that need re-scanning, deduplicated in
    /// arrival order.
    ///
    /// Child-list and attribute changes dirty their target; text changes
    /// dirty the text node's parent. A shadow root maps to its host, since
    /// scanners take elements.
    #[must_use]
    pub fn dirty_nodes<D>(&self, records: &[MutationRecord<N>], dom: &D) -> Vec<N>
    where
        D: DomTree<Node = N>,
    {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        for record in records {
            let node = match record.kind {
                MutationKind::ChildList | MutationKind::Attributes => Some(record.target),
                MutationKind::CharacterData => dom.composed_parent(record.target),
            };
            let Some(node) = node.and_then(|n| scan_root(n, dom)) else {
                continue;
            };
            if seen.insert(node) {
                out.push(node);
            }
        }
        out
    }

    fn discover<D>(&mut self, start: N, dom: &D, out: &mut Vec<Observation<N>>)
    where
        D: DomTree<Node = N>,
    {
        let mut stack = alloc::vec![start];
        while let Some(node) = stack.pop() {
            if dom.kind(node) == NodeKind::Element {
                if self.reserved.contains(&dom.node_name(node)) {
                    continue;
                }
                if let Some(root) = dom.open_shadow_root(node)
                    && !self.is_tracked(root)
                {
                    out.push(self.observe(root));
                    stack.push(root);
                }
            }
            stack.extend(dom.child_nodes(node));
        }
    }

    fn is_own_mutation<D>(&self, record: &MutationRecord<N>, dom: &D) -> bool
    where
        D: DomTree<Node = N>,
    {
        match record.kind {
            MutationKind::Attributes => self.reserved.contains(&dom.node_name(record.target)),
            // An empty child list changes nothing the scanner could see.
            MutationKind::ChildList => record
                .added
                .iter()
                .chain(&record.removed)
                .all(|&n| self.reserved.contains(&dom.node_name(n))),
            MutationKind::CharacterData => false,
        }
    }
}

fn scan_root<D: DomTree>(node: D::Node, dom: &D) -> Option<D::Node> {
    match dom.kind(node) {
        NodeKind::ShadowRoot => dom.host(node),
        NodeKind::Text | NodeKind::Other => dom.composed_parent(node),
        NodeKind::Element | NodeKind::Document => Some(node),
    }
}

impl<N> From<&str> for ShadowWatcher<N>
where
    N: Copy + Eq + Hash,
{
    fn from(name: &str) -> Self {
        Self::new(ObserveOptions::subtree_all(), ReservedNames::for_prefix(name))
    }
}
