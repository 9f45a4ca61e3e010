// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! In-memory document tree.
//!
//! [`ArenaDom`] implements [`DomTree`](crate::dom::DomTree) without a
//! browser. It backs the unit tests of every other module and can drive the
//! engine in headless hosts (server-side rendering, static checks).
//!
//! Each node has:
//!
//! - An identity ([`NodeId`]), a generational handle that becomes stale when
//!   the node is destroyed.
//! - Topology: parent, first-child, and sibling links forming an ordered
//!   light tree, plus a host/shadow-root link for shadow trees.
//! - Content: a node name, attributes for elements, and data for text nodes.
//!
//! # Mutation log
//!
//! Every structural, attribute, and text change appends a
//! [`MutationRecord`](crate::watch::MutationRecord) to a pending log.
//! [`ArenaDom::take_records`] drains it the way a subtree mutation observer
//! registered on a set of roots would: records from outside those roots
//! (including from shadow trees nobody observes) are dropped.

mod id;
mod selector;
mod store;
mod traverse;

pub use id::{INVALID, NodeId};
pub use store::{ArenaDom, ShadowMode};
pub use traverse::{Children, Descendants};
