// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Raw scanner output and its conversion into per-element issue lists.

use alloc::string::String;
use alloc::vec::Vec;
use core::hash::Hash;

use hashbrown::HashMap;

use crate::issue::{ElementWithIssues, Impact, Issue, sort_issues};

/// One segment of a scanner target path.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TargetSegment {
    /// A selector in the top-level document.
    Selector(String),
    /// A selector chain descending through shadow roots.
    Shadow(Vec<String>),
}

/// One element affected by a violation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NodeResult<N> {
    /// The element, when the scanner could hand back a reference.
    pub element: Option<N>,
    /// Path to the element; more than one segment means it is inside a
    /// nested browsing context.
    pub target: Vec<TargetSegment>,
    /// Element-specific explanation of the failure.
    pub failure_summary: Option<String>,
}

/// A rule failure, possibly on many elements.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RuleViolation<N> {
    /// Rule id.
    pub id: String,
    /// Short help text.
    pub help: String,
    /// Link to the rule documentation.
    pub help_url: String,
    /// Rule description.
    pub description: String,
    /// Severity.
    pub impact: Impact,
    /// Affected elements.
    pub nodes: Vec<NodeResult<N>>,
}

/// Returns `true` if a node result can be mapped to an element in the top
/// document.
///
/// Results inside nested browsing contexts (multi-segment targets) and
/// results whose first segment is a shadow selector chain are skipped.
#[must_use]
pub fn is_supported<N>(node: &NodeResult<N>) -> bool {
    node.element.is_some()
        && node.target.len() <= 1
        && !matches!(node.target.first(), Some(TargetSegment::Shadow(_)))
}

/// Groups violations by element.
///
/// Elements appear in the order they are first seen. Each element's issues
/// are sorted most severe first, then by rule id. Elements whose every
/// result was skipped (see [`is_supported`]) are absent.
#[must_use]
pub fn transform<N>(violations: &[RuleViolation<N>]) -> Vec<ElementWithIssues<N>>
where
    N: Copy + Eq + Hash,
{
    let mut out: Vec<ElementWithIssues<N>> = Vec::new();
    let mut slots: HashMap<N, usize> = HashMap::new();

    for violation in violations {
        for node in &violation.nodes {
            if !is_supported(node) {
                continue;
            }
            let Some(element) = node.element else {
                continue;
            };
            let description = match &node.failure_summary {
                Some(summary) if !summary.is_empty() => summary.clone(),
                _ => violation.description.clone(),
            };
            let issue = Issue {
                id: violation.id.clone(),
                title: violation.help.clone(),
                description,
                url: violation.help_url.clone(),
                impact: violation.impact,
            };
            let slot = *slots.entry(element).or_insert_with(|| {
                out.push(ElementWithIssues {
                    element,
                    issues: Vec::new(),
                });
                out.len() - 1
            });
            let issues = &mut out[slot].issues;
            if !issues.contains(&issue) {
                issues.push(issue);
            }
        }
    }

    for entry in &mut out {
        sort_issues(&mut entry.issues);
    }
    out
}
