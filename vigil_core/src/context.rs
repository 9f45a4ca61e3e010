// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scan context resolution.
//!
//! The user configures *what* should be checked with a [`ContextSpec`]. Once
//! per cycle the spec is [normalized](normalize) into concrete include and
//! exclude node lists, and then [resolved](resolve) against the dirty nodes
//! of that cycle into the smallest [`ScanContext`] that still covers every
//! change:
//!
//! ```text
//!   dirty nodes ──┐
//!                 ├─► include = dirty ∩ context  ∪  context roots inside dirty
//!   context ──────┘   exclude = excluded roots inside dirty
//! ```
//!
//! All containment tests cross shadow-root boundaries. Exclusions only ever
//! prune *descendants* of a dirty node: a dirty node that lies inside an
//! excluded region but also inside an included one is still scanned.

use alloc::string::String;
use alloc::vec::Vec;
use core::hash::Hash;

use hashbrown::HashSet;

use crate::dom::DomTree;
use crate::error::{ConfigError, SelectorError};

/// One entry of a user context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContextItem<N> {
    /// Every element in the document matching a selector.
    Selector(String),
    /// A selector chain into shadow trees: each selector but the last picks
    /// shadow hosts, and the next selector is evaluated inside their open
    /// shadow roots.
    ShadowSelector(Vec<String>),
    /// A single node.
    Node(N),
    /// A list of nodes.
    Nodes(Vec<N>),
}

/// A user-configured scan context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ContextSpec<N> {
    /// The whole document.
    Document,
    /// One item.
    Item(ContextItem<N>),
    /// Several items, all included.
    List(Vec<ContextItem<N>>),
    /// Explicit include and exclude lists. `include: None` means the whole
    /// document.
    IncludeExclude {
        /// Included regions.
        include: Option<Vec<ContextItem<N>>>,
        /// Excluded regions.
        exclude: Vec<ContextItem<N>>,
    },
}

impl<N> Default for ContextSpec<N> {
    fn default() -> Self {
        Self::Document
    }
}

impl<N> ContextItem<N> {
    fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Selector(selector) if selector.trim().is_empty() => {
                Err(ConfigError::InvalidContext("empty selector"))
            }
            Self::ShadowSelector(chain) if chain.is_empty() => {
                Err(ConfigError::InvalidContext("empty shadow selector chain"))
            }
            Self::ShadowSelector(chain) if chain.iter().any(|s| s.trim().is_empty()) => {
                Err(ConfigError::InvalidContext("empty selector in shadow chain"))
            }
            _ => Ok(()),
        }
    }
}

impl<N> ContextSpec<N> {
    /// Checks the shape of the context.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut items: Vec<&ContextItem<N>> = Vec::new();
        match self {
            Self::Document => {}
            Self::Item(item) => items.push(item),
            Self::List(list) if list.is_empty() => {
                return Err(ConfigError::InvalidContext("empty context list"));
            }
            Self::List(list) => items.extend(list),
            Self::IncludeExclude {
                include: Some(list),
                ..
            } if list.is_empty() => {
                return Err(ConfigError::InvalidContext("empty include list"));
            }
            Self::IncludeExclude { include, exclude } => {
                items.extend(include.iter().flatten());
                items.extend(exclude);
            }
        }
        items.into_iter().try_for_each(ContextItem::validate)
    }

    /// Returns the nodes named directly by the context, included or excluded.
    ///
    /// Selector items contribute nothing.
    pub fn nodes(&self) -> impl Iterator<Item = &N> {
        let (include, exclude): (&[ContextItem<N>], &[ContextItem<N>]) = match self {
            Self::Document => (&[], &[]),
            Self::Item(item) => (core::slice::from_ref(item), &[]),
            Self::List(list) => (list.as_slice(), &[]),
            Self::IncludeExclude { include, exclude } => {
                (include.as_deref().unwrap_or_default(), exclude.as_slice())
            }
        };
        include.iter().chain(exclude).flat_map(|item| match item {
            ContextItem::Node(node) => core::slice::from_ref(node),
            ContextItem::Nodes(nodes) => nodes.as_slice(),
            ContextItem::Selector(_) | ContextItem::ShadowSelector(_) => &[],
        })
    }
}

/// A user context evaluated against the current document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NormalizedContext<N> {
    /// Included roots, deduplicated.
    pub include: Vec<N>,
    /// Excluded roots, deduplicated.
    pub exclude: Vec<N>,
}

/// What the scanner examines in one cycle.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ScanContext<N> {
    /// Roots to scan; none contains another.
    pub include: Vec<N>,
    /// Roots to skip inside `include`.
    pub exclude: Vec<N>,
}

impl<N: Copy> ScanContext<N> {
    /// Returns `true` if there is nothing to scan.
    ///
    /// An empty context never means "scan everything".
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.include.is_empty()
    }

    /// Returns `true` if the scanner examined `node` under this context: it
    /// lies inside an include root and outside every exclude root.
    pub fn covers<D>(&self, node: N, dom: &D) -> bool
    where
        D: DomTree<Node = N>,
    {
        self.include.iter().any(|&root| dom.shadow_contains(root, node))
            && !self.exclude.iter().any(|&root| dom.shadow_contains(root, node))
    }
}

/// Evaluates a user context against the document.
pub fn normalize<D>(
    spec: &ContextSpec<D::Node>,
    dom: &D,
) -> Result<NormalizedContext<D::Node>, SelectorError>
where
    D: DomTree,
{
    let mut include = Vec::new();
    let mut exclude = Vec::new();
    match spec {
        ContextSpec::Document => include.push(dom.document()),
        ContextSpec::Item(item) => resolve_item(item, dom, &mut include)?,
        ContextSpec::List(items) => {
            for item in items {
                resolve_item(item, dom, &mut include)?;
            }
        }
        ContextSpec::IncludeExclude {
            include: items,
            exclude: excluded,
        } => {
            match items {
                Some(items) => {
                    for item in items {
                        resolve_item(item, dom, &mut include)?;
                    }
                }
                None => include.push(dom.document()),
            }
            for item in excluded {
                resolve_item(item, dom, &mut exclude)?;
            }
        }
    }
    Ok(NormalizedContext {
        include: dedupe_by_equality(include),
        exclude: dedupe_by_equality(exclude),
    })
}

fn resolve_item<D>(
    item: &ContextItem<D::Node>,
    dom: &D,
    out: &mut Vec<D::Node>,
) -> Result<(), SelectorError>
where
    D: DomTree,
{
    match item {
        ContextItem::Selector(selector) => {
            out.extend(dom.query_selector_all(dom.document(), selector)?);
        }
        ContextItem::ShadowSelector(chain) => {
            let mut scopes = alloc::vec![dom.document()];
            let last = chain.len().saturating_sub(1);
            for (depth, selector) in chain.iter().enumerate() {
                let mut matches = Vec::new();
                for &scope in &scopes {
                    matches.extend(dom.query_selector_all(scope, selector)?);
                }
                if depth == last {
                    out.extend(matches);
                } else {
                    scopes = matches
                        .into_iter()
                        .filter_map(|host| dom.open_shadow_root(host))
                        .collect();
                }
            }
        }
        ContextItem::Node(node) => out.push(*node),
        ContextItem::Nodes(nodes) => out.extend_from_slice(nodes),
    }
    Ok(())
}

/// Maps the dirty nodes of one cycle to the minimal scan context.
///
/// 1. A dirty node is included if some context include root contains it.
///    Exclusions are not consulted for the dirty node itself.
/// 2. Every context include root inside any dirty node is included, even
///    when the dirty node itself is outside the context.
/// 3. Every context exclude root inside any dirty node is excluded.
/// 4. Includes are reduced to their outermost roots; excludes are
///    deduplicated by identity.
///
/// No dirty nodes, or none touching the context, yields an empty context.
pub fn resolve<D>(
    dirty: &[D::Node],
    context: &NormalizedContext<D::Node>,
    dom: &D,
) -> ScanContext<D::Node>
where
    D: DomTree,
{
    let mut include: Vec<D::Node> = dirty
        .iter()
        .copied()
        .filter(|&node| {
            context
                .include
                .iter()
                .any(|&root| dom.shadow_contains(root, node))
        })
        .collect();
    let mut exclude = Vec::new();

    for &node in dirty {
        include.extend(
            context
                .include
                .iter()
                .copied()
                .filter(|&root| dom.shadow_contains(node, root)),
        );
        exclude.extend(
            context
                .exclude
                .iter()
                .copied()
                .filter(|&root| dom.shadow_contains(node, root)),
        );
    }

    ScanContext {
        include: dedupe_by_containment(include, dom),
        exclude: dedupe_by_equality(exclude),
    }
}

/// Removes repeated nodes, keeping the first occurrence.
#[must_use]
pub fn dedupe_by_equality<N>(nodes: Vec<N>) -> Vec<N>
where
    N: Copy + Eq + Hash,
{
    let mut seen = HashSet::with_capacity(nodes.len());
    nodes.into_iter().filter(|n| seen.insert(*n)).collect()
}

/// Removes repeated nodes and every node contained by another node in the
/// list, keeping the survivors in their original order.
#[must_use]
pub fn dedupe_by_containment<D>(nodes: Vec<D::Node>, dom: &D) -> Vec<D::Node>
where
    D: DomTree,
{
    let unique = dedupe_by_equality(nodes);
    unique
        .iter()
        .copied()
        .filter(|&node| {
            !unique
                .iter()
                .any(|&other| other != node && dom.shadow_contains(other, node))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use alloc::vec;

    use super::*;
    use crate::tree::{ArenaDom, NodeId, ShadowMode};

    struct Page {
        dom: ArenaDom,
        main: NodeId,
        context: NodeId,
        button: NodeId,
        aside: NodeId,
        ad: NodeId,
        host: NodeId,
        shadow_button: NodeId,
    }

    /// ```text
    /// document
    ///   main
    ///     div#context
    ///       button
    ///   aside
    ///     div.ad
    ///     my-widget
    ///       #shadow-root
    ///         button.inner
    /// ```
    fn page() -> Page {
        let mut dom = ArenaDom::new();
        let doc = dom.document();
        let main = dom.create_element("main");
        dom.append_child(doc, main);
        let context = dom.create_element("div");
        dom.set_attribute(context, "id", "context");
        dom.append_child(main, context);
        let button = dom.create_element("button");
        dom.append_child(context, button);
        let aside = dom.create_element("aside");
        dom.append_child(doc, aside);
        let ad = dom.create_element("div");
        dom.set_attribute(ad, "class", "ad");
        dom.append_child(aside, ad);
        let host = dom.create_element("my-widget");
        dom.append_child(aside, host);
        let root = dom.attach_shadow(host, ShadowMode::Open);
        let shadow_button = dom.create_element("button");
        dom.set_attribute(shadow_button, "class", "inner");
        dom.append_child(root, shadow_button);
        Page {
            dom,
            main,
            context,
            button,
            aside,
            ad,
            host,
            shadow_button,
        }
    }

    fn selector(s: &str) -> ContextSpec<NodeId> {
        ContextSpec::Item(ContextItem::Selector(s.to_string()))
    }

    fn resolve_with(p: &Page, dirty: &[NodeId], spec: &ContextSpec<NodeId>) -> ScanContext<NodeId> {
        let normalized = normalize(spec, &p.dom).unwrap();
        resolve(dirty, &normalized, &p.dom)
    }

    #[test]
    fn disjoint_dirty_node_contributes_nothing() {
        let p = page();
        let ctx = resolve_with(&p, &[p.aside], &selector("#context"));
        assert_eq!(ctx, ScanContext::default());
        assert!(ctx.is_empty());
    }

    #[test]
    fn context_root_inside_dirty_node_is_included() {
        let p = page();
        let ctx = resolve_with(&p, &[p.main], &selector("#context"));
        assert_eq!(ctx.include, vec![p.context]);
        assert!(ctx.exclude.is_empty());
    }

    #[test]
    fn dirty_node_inside_context_is_included() {
        let p = page();
        let ctx = resolve_with(&p, &[p.button], &selector("#context"));
        assert_eq!(ctx.include, vec![p.button]);
    }

    #[test]
    fn empty_dirty_set_is_empty_context() {
        let p = page();
        let ctx = resolve_with(&p, &[], &ContextSpec::Document);
        assert!(ctx.is_empty());
        assert!(ctx.exclude.is_empty());
    }

    #[test]
    fn containment_crosses_shadow_roots() {
        let p = page();
        let spec = ContextSpec::Item(ContextItem::Node(p.aside));
        let ctx = resolve_with(&p, &[p.shadow_button], &spec);
        assert_eq!(ctx.include, vec![p.shadow_button]);
    }

    #[test]
    fn includes_collapse_to_outermost_roots() {
        let p = page();
        let doc = p.dom.document();
        let dirty = [p.button, p.main, p.shadow_button, p.main];
        let ctx = resolve_with(&p, &dirty, &ContextSpec::Document);
        assert_eq!(ctx.include, vec![p.main, p.shadow_button]);

        let ctx = resolve_with(&p, &[p.button, doc], &ContextSpec::Document);
        assert_eq!(ctx.include, vec![doc]);
    }

    #[test]
    fn excludes_inside_dirty_nodes_are_kept() {
        let p = page();
        let spec = ContextSpec::IncludeExclude {
            include: None,
            exclude: vec![ContextItem::Selector(".ad".to_string())],
        };
        let ctx = resolve_with(&p, &[p.aside, p.main], &spec);
        assert_eq!(ctx.include, vec![p.aside, p.main]);
        assert_eq!(ctx.exclude, vec![p.ad]);
        assert!(!ctx.covers(p.ad, &p.dom));
        assert!(ctx.covers(p.host, &p.dom));
        assert!(ctx.covers(p.shadow_button, &p.dom));
        assert!(ctx.covers(p.button, &p.dom));
    }

    #[test]
    fn dirty_node_inside_excluded_region_is_still_scanned() {
        let p = page();
        let spec = ContextSpec::IncludeExclude {
            include: None,
            exclude: vec![ContextItem::Node(p.aside)],
        };
        let ctx = resolve_with(&p, &[p.ad], &spec);
        assert_eq!(ctx.include, vec![p.ad]);
        assert!(ctx.exclude.is_empty(), "aside does not lie inside the dirty node");
    }

    #[test]
    fn covers_is_limited_to_include_roots() {
        let p = page();
        let ctx = resolve_with(&p, &[p.context], &ContextSpec::Document);
        assert!(ctx.covers(p.button, &p.dom));
        assert!(ctx.covers(p.context, &p.dom));
        assert!(!ctx.covers(p.main, &p.dom));
        assert!(!ctx.covers(p.ad, &p.dom));
    }

    #[test]
    fn normalize_variants() {
        let p = page();
        let doc = p.dom.document();

        let n = normalize(&ContextSpec::Document, &p.dom).unwrap();
        assert_eq!(n.include, vec![doc]);

        let list = ContextSpec::List(vec![
            ContextItem::Selector("button".to_string()),
            ContextItem::Node(p.button),
            ContextItem::Nodes(vec![p.aside, p.main]),
        ]);
        let n = normalize(&list, &p.dom).unwrap();
        assert_eq!(n.include, vec![p.button, p.aside, p.main]);

        let shadow = ContextSpec::Item(ContextItem::ShadowSelector(vec![
            "my-widget".to_string(),
            ".inner".to_string(),
        ]));
        let n = normalize(&shadow, &p.dom).unwrap();
        assert_eq!(n.include, vec![p.shadow_button]);

        let err = normalize(&selector("main > div"), &p.dom);
        assert!(matches!(err, Err(SelectorError::Unsupported(_))));
    }

    #[test]
    fn validation() {
        assert!(ContextSpec::<NodeId>::Document.validate().is_ok());
        assert!(selector("#main").validate().is_ok());
        for bad in [
            selector("  "),
            ContextSpec::List(vec![]),
            ContextSpec::Item(ContextItem::ShadowSelector(vec![])),
            ContextSpec::Item(ContextItem::ShadowSelector(vec!["a".to_string(), String::new()])),
            ContextSpec::IncludeExclude {
                include: Some(vec![]),
                exclude: vec![],
            },
            ContextSpec::IncludeExclude {
                include: None,
                exclude: vec![ContextItem::Selector(String::new())],
            },
        ] {
            assert!(
                matches!(bad.validate(), Err(ConfigError::InvalidContext(_))),
                "{bad:?}"
            );
        }
    }

    #[test]
    fn dedupe_helpers() {
        let p = page();
        assert_eq!(dedupe_by_equality(vec![3, 1, 3, 2, 1]), vec![3, 1, 2]);
        assert_eq!(
            dedupe_by_containment(vec![p.button, p.context, p.host, p.button], &p.dom),
            vec![p.context, p.host]
        );
    }

    #[test]
    fn nodes_lists_direct_handles_only() {
        let p = page();
        let spec = ContextSpec::IncludeExclude {
            include: Some(vec![
                ContextItem::Node(p.main),
                ContextItem::Selector("button".to_string()),
            ]),
            exclude: vec![ContextItem::Nodes(vec![p.aside, p.ad])],
        };
        let nodes: Vec<NodeId> = spec.nodes().copied().collect();
        assert_eq!(nodes, vec![p.main, p.aside, p.ad]);

        let list = ContextSpec::List(vec![ContextItem::Nodes(vec![p.host])]);
        assert_eq!(list.nodes().copied().collect::<Vec<_>>(), vec![p.host]);
        assert_eq!(ContextSpec::<NodeId>::Document.nodes().count(), 0);
    }
}
