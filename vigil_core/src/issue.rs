// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Issues and their severity.

use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt;

/// Severity of an issue.
///
/// Ordered `Unknown < Minor < Moderate < Serious < Critical`. A missing
/// impact sorts below `Minor`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Impact {
    /// No impact was reported.
    #[default]
    Unknown,
    /// Minor.
    Minor,
    /// Moderate.
    Moderate,
    /// Serious.
    Serious,
    /// Critical.
    Critical,
}

impl Impact {
    /// Parses a scanner impact string. Missing or unrecognized values map to
    /// [`Impact::Unknown`].
    #[must_use]
    pub fn parse(value: Option<&str>) -> Self {
        match value {
            Some("minor") => Self::Minor,
            Some("moderate") => Self::Moderate,
            Some("serious") => Self::Serious,
            Some("critical") => Self::Critical,
            _ => Self::Unknown,
        }
    }

    /// Returns the scanner spelling of this impact.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Minor => "minor",
            Self::Moderate => "moderate",
            Self::Serious => "serious",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One accessibility problem on one element.
///
/// Equality is structural over every field.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Issue {
    /// Rule id.
    pub id: String,
    /// Short rule help text.
    pub title: String,
    /// Element-specific failure summary, or the rule description.
    pub description: String,
    /// Link to the rule documentation.
    pub url: String,
    /// Severity.
    pub impact: Impact,
}

/// An element and every issue found on it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementWithIssues<N> {
    /// The element.
    pub element: N,
    /// Issues, most severe first, then by rule id.
    pub issues: Vec<Issue>,
}

/// Display order: impact descending, then rule id ascending.
#[must_use]
pub fn compare_issues(a: &Issue, b: &Issue) -> Ordering {
    b.impact.cmp(&a.impact).then_with(|| a.id.cmp(&b.id))
}

/// Sorts issues into display order.
///
/// The sort is stable, so issues that tie on both impact and id keep their
/// input order.
pub fn sort_issues(issues: &mut [Issue]) {
    issues.sort_by(compare_issues);
}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;
    use alloc::vec;

    use super::*;

    fn issue(id: &str, impact: Impact) -> Issue {
        Issue {
            id: id.to_string(),
            title: String::new(),
            description: String::new(),
            url: String::new(),
            impact,
        }
    }

    #[test]
    fn impact_ordering_puts_unknown_lowest() {
        assert!(Impact::Unknown < Impact::Minor);
        assert!(Impact::Minor < Impact::Moderate);
        assert!(Impact::Serious < Impact::Critical);
    }

    #[test]
    fn parse_impact() {
        assert_eq!(Impact::parse(Some("serious")), Impact::Serious);
        assert_eq!(Impact::parse(Some("Serious")), Impact::Unknown);
        assert_eq!(Impact::parse(None), Impact::Unknown);
        assert_eq!(Impact::Critical.to_string(), "critical");
    }

    #[test]
    fn sort_by_impact_then_id() {
        let mut issues = vec![
            issue("b-rule", Impact::Minor),
            issue("z-rule", Impact::Critical),
            issue("a-rule", Impact::Minor),
            issue("m-rule", Impact::Unknown),
            issue("c-rule", Impact::Critical),
        ];
        sort_issues(&mut issues);
        let ids: Vec<_> = issues.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["c-rule", "z-rule", "a-rule", "b-rule", "m-rule"]);
    }
}
