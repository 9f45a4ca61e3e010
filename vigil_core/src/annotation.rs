// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Persistent annotation state and its reconciliation against scan results.
//!
//! An [`AnnotationStore`] holds one [`AnnotatedElement`] per live element
//! that currently has issues. Each cycle, [`AnnotationStore::reconcile`]
//! merges the transformed scan results into it and reports what changed as
//! [`AnnotationChanges`], which an [`AnnotationPresenter`] turns into UI
//! updates.
//!
//! ```text
//!   Unseen ──(issues found, attached)──► Annotated ──(issue set changes)──┐
//!     ▲                                     │   ▲                         │
//!     │                                     │   └─────────────────────────┘
//!     └──(detached, or clean in a scanned region)
//! ```
//!
//! Entries keep their [`AnnotationId`] for their whole lifetime. When only
//! the issue set changes, the entry is updated in place. An element that the
//! current scan did not look at keeps its annotation: absence from the
//! results says nothing about regions outside the scan context.

use alloc::vec::Vec;
use core::fmt;
use core::hash::Hash;

use hashbrown::{HashMap, HashSet};

use crate::context::ScanContext;
use crate::dom::DomTree;
use crate::error::EngineError;
use crate::issue::{ElementWithIssues, Issue};

/// Stable identity of an annotation, never reused.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AnnotationId(pub u64);

impl fmt::Debug for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "AnnotationId({})", self.0)
    }
}

impl fmt::Display for AnnotationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An element with one or more active issues.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnotatedElement<N> {
    /// Stable identifier; renderers key their side tables by it.
    pub id: AnnotationId,
    /// The annotated element.
    pub element: N,
    /// Current issues, most severe first.
    pub issues: Vec<Issue>,
}

/// What one reconciliation changed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnnotationChanges<N> {
    /// Newly created entries.
    pub added: Vec<AnnotationId>,
    /// Entries whose issue list was replaced in place.
    pub updated: Vec<AnnotationId>,
    /// Entries that were dropped, as they were just before removal.
    pub removed: Vec<AnnotatedElement<N>>,
}

impl<N> Default for AnnotationChanges<N> {
    fn default() -> Self {
        Self {
            added: Vec::new(),
            updated: Vec::new(),
            removed: Vec::new(),
        }
    }
}

impl<N> AnnotationChanges<N> {
    /// Returns `true` if nothing changed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.updated.is_empty() && self.removed.is_empty()
    }
}

/// Applies annotation changes to a presentation layer.
///
/// Renderers keep their own per-entry state (trigger handles, positions,
/// visibility, scroll ancestors) keyed by [`AnnotationId`]. Every id in
/// [`AnnotationChanges::added`] must get exactly one set of that state, and
/// every id in [`AnnotationChanges::removed`] must release it.
pub trait AnnotationPresenter<N> {
    /// Applies `changes`, reading current entries from `store` as needed.
    fn apply(&mut self, store: &AnnotationStore<N>, changes: &AnnotationChanges<N>);
}

/// Order-insensitive set equality over issues.
#[must_use]
pub fn issues_equal(a: &[Issue], b: &[Issue]) -> bool {
    let a: HashSet<&Issue> = a.iter().collect();
    let b: HashSet<&Issue> = b.iter().collect();
    a == b
}

/// The set of annotated elements.
#[derive(Clone, Debug)]
pub struct AnnotationStore<N> {
    /// Sorted by id, since ids are allocated in insertion order.
    entries: Vec<AnnotatedElement<N>>,
    next_id: u64,
}

impl<N> Default for AnnotationStore<N> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            next_id: 1,
        }
    }
}

impl<N> AnnotationStore<N>
where
    N: Copy + Eq + Hash,
{
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of annotated elements.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is annotated.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the entry with the given id.
    #[must_use]
    pub fn get(&self, id: AnnotationId) -> Option<&AnnotatedElement<N>> {
        self.entries
            .binary_search_by_key(&id, |e| e.id)
            .ok()
            .map(|i| &self.entries[i])
    }

    /// Returns the entry for an element.
    #[must_use]
    pub fn find(&self, element: N) -> Option<&AnnotatedElement<N>> {
        self.entries.iter().find(|e| e.element == element)
    }

    /// Iterates entries in creation order.
    pub fn iter(&self) -> impl Iterator<Item = &AnnotatedElement<N>> {
        self.entries.iter()
    }

    /// Drops every entry, returning them as removals.
    ///
    /// Ids are not reset.
    pub fn clear(&mut self) -> AnnotationChanges<N> {
        AnnotationChanges {
            removed: core::mem::take(&mut self.entries),
            ..AnnotationChanges::default()
        }
    }

    /// Merges one cycle's results.
    ///
    /// - An existing entry whose element is detached is removed.
    /// - An existing entry with a result whose issue set differs gets its
    ///   issue list replaced; its id is kept.
    /// - An existing entry without a result is removed only if `context`
    ///   covers its element.
    /// - A result without an entry becomes a new entry if its element is
    ///   attached.
    pub fn reconcile<D>(
        &mut self,
        dom: &D,
        context: &ScanContext<N>,
        results: &[ElementWithIssues<N>],
    ) -> AnnotationChanges<N>
    where
        D: DomTree<Node = N>,
    {
        let mut changes = AnnotationChanges::default();
        let by_element: HashMap<N, &[Issue]> = results
            .iter()
            .filter(|r| !r.issues.is_empty())
            .map(|r| (r.element, r.issues.as_slice()))
            .collect();

        let mut kept = Vec::with_capacity(self.entries.len());
        for mut entry in core::mem::take(&mut self.entries) {
            if !dom.is_connected(entry.element) {
                changes.removed.push(entry);
                continue;
            }
            match by_element.get(&entry.element) {
                Some(issues) => {
                    if !issues_equal(&entry.issues, issues) {
                        entry.issues.clear();
                        entry.issues.extend_from_slice(issues);
                        changes.updated.push(entry.id);
                    }
                    kept.push(entry);
                }
                None if context.covers(entry.element, dom) => changes.removed.push(entry),
                None => kept.push(entry),
            }
        }
        self.entries = kept;

        let mut annotated: HashSet<N> = self.entries.iter().map(|e| e.element).collect();
        for result in results {
            if result.issues.is_empty()
                || !dom.is_connected(result.element)
                || !annotated.insert(result.element)
            {
                continue;
            }
            let id = AnnotationId(self.next_id);
            self.next_id += 1;
            self.entries.push(AnnotatedElement {
                id,
                element: result.element,
                issues: result.issues.clone(),
            });
            changes.added.push(id);
        }
        changes
    }

    /// Verifies the store's invariants: one entry per element, ids strictly
    /// increasing, and no entry without issues.
    pub fn check_invariants(&self) -> Result<(), EngineError> {
        let mut elements = HashSet::with_capacity(self.entries.len());
        let mut previous: Option<AnnotationId> = None;
        for entry in &self.entries {
            if !elements.insert(entry.element) {
                return Err(EngineError::Internal {
                    message: alloc::format!("element annotated twice ({:?})", entry.id),
                });
            }
            if previous.is_some_and(|p| p >= entry.id) || entry.id.0 >= self.next_id {
                return Err(EngineError::Internal {
                    message: alloc::format!("annotation ids out of order at {:?}", entry.id),
                });
            }
            if entry.issues.is_empty() {
                return Err(EngineError::Internal {
                    message: alloc::format!("annotation {:?} has no issues", entry.id),
                });
            }
            previous = Some(entry.id);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::{String, ToString};
    use alloc::vec;

    use super::*;
    use crate::issue::Impact;
    use crate::tree::{ArenaDom, NodeId};

    fn issue(id: &str) -> Issue {
        Issue {
            id: id.to_string(),
            title: alloc::format!("{id} title"),
            description: String::new(),
            url: String::new(),
            impact: Impact::Serious,
        }
    }

    fn result(element: NodeId, ids: &[&str]) -> ElementWithIssues<NodeId> {
        ElementWithIssues {
            element,
            issues: ids.iter().map(|id| issue(id)).collect(),
        }
    }

    struct Page {
        dom: ArenaDom,
        left: NodeId,
        a: NodeId,
        b: NodeId,
        c: NodeId,
    }

    /// `document > (div.left > (a, b), div.right > c)`
    fn page() -> Page {
        let mut dom = ArenaDom::new();
        let doc = dom.document();
        let left = dom.create_element("div");
        let right = dom.create_element("div");
        dom.append_child(doc, left);
        dom.append_child(doc, right);
        let a = dom.create_element("img");
        let b = dom.create_element("img");
        let c = dom.create_element("img");
        dom.append_child(left, a);
        dom.append_child(left, b);
        dom.append_child(right, c);
        Page {
            dom,
            left,
            a,
            b,
            c,
        }
    }

    fn whole(p: &Page) -> ScanContext<NodeId> {
        ScanContext {
            include: vec![p.dom.document()],
            exclude: vec![],
        }
    }

    #[test]
    fn keeps_identity_and_adds_new_elements() {
        let p = page();
        let mut store = AnnotationStore::new();
        let first = store.reconcile(&p.dom, &whole(&p), &[result(p.a, &["alt"])]);
        assert_eq!(first.added.len(), 1);
        let a_id = store.find(p.a).unwrap().id;

        let second = store.reconcile(&p.dom, &whole(&p), &[
            result(p.a, &["alt"]),
            result(p.b, &["contrast"]),
        ]);
        assert_eq!(store.len(), 2);
        assert_eq!(store.find(p.a).unwrap().id, a_id);
        assert!(second.updated.is_empty());
        assert!(second.removed.is_empty());
        assert_eq!(second.added.len(), 1);
        assert_ne!(second.added[0], a_id);
        assert_eq!(store.get(second.added[0]).unwrap().element, p.b);
    }

    #[test]
    fn reconciling_twice_is_a_no_op() {
        let p = page();
        let mut store = AnnotationStore::new();
        let results = [result(p.a, &["alt"]), result(p.c, &["label", "alt"])];
        let _ = store.reconcile(&p.dom, &whole(&p), &results);
        let again = store.reconcile(&p.dom, &whole(&p), &results);
        assert!(again.is_empty(), "{again:?}");
    }

    #[test]
    fn issue_order_does_not_count_as_a_change() {
        let p = page();
        let mut store = AnnotationStore::new();
        let _ = store.reconcile(&p.dom, &whole(&p), &[result(p.a, &["x", "y"])]);
        let changes = store.reconcile(&p.dom, &whole(&p), &[result(p.a, &["y", "x"])]);
        assert!(changes.is_empty());
    }

    #[test]
    fn issue_set_changes_update_in_place_and_keep_id() {
        let p = page();
        let mut store = AnnotationStore::new();
        let _ = store.reconcile(&p.dom, &whole(&p), &[result(p.a, &["s1"])]);
        let id = store.find(p.a).unwrap().id;

        let to_s2 = store.reconcile(&p.dom, &whole(&p), &[result(p.a, &["s2"])]);
        assert_eq!(to_s2.updated, vec![id]);
        assert_eq!(store.get(id).unwrap().issues, vec![issue("s2")]);

        let back = store.reconcile(&p.dom, &whole(&p), &[result(p.a, &["s1"])]);
        assert_eq!(back.updated, vec![id]);
        assert_eq!(store.find(p.a).unwrap().id, id);
    }

    #[test]
    fn detached_elements_are_removed_even_with_results() {
        let mut p = page();
        let mut store = AnnotationStore::new();
        let _ = store.reconcile(&p.dom, &whole(&p), &[result(p.a, &["alt"])]);
        p.dom.remove_from_parent(p.a);

        let changes = store.reconcile(&p.dom, &whole(&p), &[result(p.a, &["alt"])]);
        assert_eq!(changes.removed.len(), 1);
        assert_eq!(changes.removed[0].element, p.a);
        assert!(changes.added.is_empty(), "no re-add of a detached element");
        assert!(store.is_empty());
    }

    #[test]
    fn detached_results_are_not_added() {
        let mut p = page();
        p.dom.destroy_node(p.b);
        let mut store = AnnotationStore::new();
        let changes = store.reconcile(&p.dom, &whole(&p), &[result(p.b, &["alt"])]);
        assert!(changes.is_empty());
    }

    #[test]
    fn clean_elements_in_scanned_region_are_removed() {
        let p = page();
        let mut store = AnnotationStore::new();
        let _ = store.reconcile(&p.dom, &whole(&p), &[
            result(p.a, &["alt"]),
            result(p.c, &["alt"]),
        ]);
        let left_only = ScanContext {
            include: vec![p.left],
            exclude: vec![],
        };
        let changes = store.reconcile(&p.dom, &left_only, &[]);
        assert_eq!(changes.removed.len(), 1);
        assert_eq!(changes.removed[0].element, p.a);
        assert!(store.find(p.c).is_some(), "right side was not scanned");
    }

    #[test]
    fn excluded_elements_are_not_removed() {
        let p = page();
        let mut store = AnnotationStore::new();
        let _ = store.reconcile(&p.dom, &whole(&p), &[result(p.b, &["alt"])]);
        let ctx = ScanContext {
            include: vec![p.left],
            exclude: vec![p.b],
        };
        let changes = store.reconcile(&p.dom, &ctx, &[]);
        assert!(changes.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn ids_are_never_reused() {
        let p = page();
        let mut store = AnnotationStore::new();
        let first = store.reconcile(&p.dom, &whole(&p), &[result(p.a, &["alt"])]);
        let _ = store.reconcile(&p.dom, &whole(&p), &[]);
        let again = store.reconcile(&p.dom, &whole(&p), &[result(p.a, &["alt"])]);
        assert!(again.added[0] > first.added[0]);
        assert!(store.check_invariants().is_ok());
    }

    #[test]
    fn clear_reports_everything_removed() {
        let p = page();
        let mut store = AnnotationStore::new();
        let _ = store.reconcile(&p.dom, &whole(&p), &[
            result(p.a, &["alt"]),
            result(p.b, &["alt"]),
        ]);
        let changes = store.clear();
        assert_eq!(changes.removed.len(), 2);
        assert!(store.is_empty());
        assert_eq!(store.iter().count(), 0);
    }

    #[test]
    fn issues_equal_is_set_equality() {
        assert!(issues_equal(&[issue("a"), issue("b")], &[issue("b"), issue("a")]));
        assert!(!issues_equal(&[issue("a")], &[issue("a"), issue("b")]));
        let mut other = issue("a");
        other.impact = Impact::Minor;
        assert!(!issues_equal(&[issue("a")], &[other]));
        assert!(issues_equal(&[], &[]));
    }
}
