// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The selector subset understood by [`ArenaDom`](super::ArenaDom).
//!
//! A selector list is a comma-separated list of compound selectors. Each
//! compound is an optional type selector (`div`, `*`) followed by any number
//! of `#id`, `.class`, `[attr]`, and `[attr=value]` parts (values may be
//! quoted). Combinators, pseudo-classes, and attribute operators other than
//! `=` are rejected.

use alloc::string::{String, ToString};
use alloc::vec::Vec;

use crate::error::SelectorError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SelectorList {
    compounds: Vec<Compound>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
}

/// What a compound is matched against.
pub(crate) struct ElementView<'a> {
    pub(crate) name: &'a str,
    pub(crate) attributes: &'a [(String, String)],
}

impl ElementView<'_> {
    fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

impl SelectorList {
    pub(crate) fn parse(selector: &str) -> Result<Self, SelectorError> {
        if selector.trim().is_empty() {
            return Err(SelectorError::Empty);
        }
        let unsupported = || SelectorError::Unsupported(selector.to_string());
        let mut compounds = Vec::new();
        for part in selector.split(',') {
            let compound = Parser::new(part.trim().as_bytes())
                .compound()
                .ok_or_else(unsupported)?;
            compounds.push(compound);
        }
        Ok(Self { compounds })
    }

    pub(crate) fn matches(&self, element: &ElementView<'_>) -> bool {
        self.compounds.iter().any(|c| c.matches(element))
    }
}

impl Compound {
    fn matches(&self, element: &ElementView<'_>) -> bool {
        if let Some(tag) = &self.tag
            && !tag.eq_ignore_ascii_case(element.name)
        {
            return false;
        }
        if let Some(id) = &self.id
            && element.attribute("id") != Some(id.as_str())
        {
            return false;
        }
        if !self.classes.is_empty() {
            let class_attr = element.attribute("class").unwrap_or_default();
            let has_all = self
                .classes
                .iter()
                .all(|want| class_attr.split_ascii_whitespace().any(|c| c == want));
            if !has_all {
                return false;
            }
        }
        self.attrs
            .iter()
            .all(|(name, value)| match (element.attribute(name), value) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(actual), Some(expected)) => actual == expected,
            })
    }
}

struct Parser<'a> {
    src: &'a [u8],
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(src: &'a [u8]) -> Self {
        Self { src, pos: 0 }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<u8> {
        let b = self.peek()?;
        self.pos += 1;
        Some(b)
    }

    fn compound(mut self) -> Option<Compound> {
        let mut compound = Compound::default();
        match self.peek()? {
            b'*' => {
                self.pos += 1;
            }
            b if is_ident_byte(b) => compound.tag = Some(self.ident()?),
            _ => {}
        }
        while let Some(b) = self.bump() {
            match b {
                b'#' if compound.id.is_none() => compound.id = Some(self.ident()?),
                b'.' => compound.classes.push(self.ident()?),
                b'[' => compound.attrs.push(self.attribute()?),
                _ => return None,
            }
        }
        let empty = compound == Compound::default();
        // A lone `*` is a valid compound.
        if empty && self.src != b"*" {
            return None;
        }
        Some(compound)
    }

    fn ident(&mut self) -> Option<String> {
        let start = self.pos;
        while self.peek().is_some_and(is_ident_byte) {
            self.pos += 1;
        }
        if self.pos == start {
            return None;
        }
        core::str::from_utf8(&self.src[start..self.pos])
            .ok()
            .map(ToString::to_string)
    }

    fn attribute(&mut self) -> Option<(String, Option<String>)> {
        let name = self.ident()?;
        match self.bump()? {
            b']' => Some((name, None)),
            b'=' => {
                let value = match self.peek()? {
                    quote @ (b'"' | b'\'') => {
                        self.pos += 1;
                        let start = self.pos;
                        while self.peek()? != quote {
                            self.pos += 1;
                        }
                        let value = core::str::from_utf8(&self.src[start..self.pos]).ok()?;
                        self.pos += 1;
                        value.to_string()
                    }
                    _ => self.ident()?,
                };
                (self.bump()? == b']').then_some((name, Some(value)))
            }
            _ => None,
        }
    }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}
