// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Incremental re-scan scheduling and annotation reconciliation for live
//! accessibility checks.
//!
//! `vigil_core` keeps a page's accessibility annotations current while the
//! page changes. It is `no_std` compatible (with `alloc`), never touches a
//! real DOM, and never reads a clock: hosts hand it mutation records, node
//! handles, and host time, and get back the work to do.
//!
//! # Architecture
//!
//! ```text
//!   native mutations
//!       │
//!       ▼
//!   Engine::on_mutations ──► dirty nodes ──► ThrottleQueue ──► batch
//!       │                                                        │
//!       └─► new shadow roots (host observes them)                ▼
//!                                                  Engine::begin ──► ScanRequest
//!                                                                        │
//!                                                      Scanner::scan ◄───┘
//!                                                             │
//!                                                             ▼
//!   AnnotationPresenter::apply ◄── AnnotationChanges ◄── Engine::finish
//! ```
//!
//! **[`dom`]**: The [`DomTree`](dom::DomTree) trait the core reads through,
//! with shadow-crossing containment helpers.
//!
//! **[`tree`]**: An arena-backed DOM implementing `DomTree`, recording
//! mutations the way a native observer would. Used by tests and headless
//! hosts.
//!
//! **[`queue`]**: Sans-IO throttled, coalescing work queue.
//!
//! **[`watch`]**: Shadow-root discovery and filtering of the engine's own
//! mutations.
//!
//! **[`context`]**: Maps dirty nodes and the user's scan context to the
//! minimal region to re-scan.
//!
//! **[`violation`]** and **[`issue`]**: Scanner output and its per-element
//! issue lists.
//!
//! **[`annotation`]**: The annotation store and its reconciliation rules.
//!
//! **[`engine`]**: Cycle orchestration tying the above together.
//!
//! **[`config`]** and **[`error`]**: Setup-time validation and error types.
//!
//! **[`trace`]**: [`TraceSink`](trace::TraceSink) trait and event types for
//! cycle instrumentation, with a zero-overhead [`Tracer`](trace::Tracer)
//! wrapper.
//!
//! # Crate features
//!
//! - `trace` (disabled by default): Enables `Tracer` method bodies (one branch
//!   per call site).

#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

extern crate alloc;

pub mod annotation;
pub mod config;
pub mod context;
pub mod dirty;
pub mod dom;
pub mod engine;
pub mod error;
pub mod issue;
pub mod queue;
pub mod time;
pub mod trace;
pub mod tree;
pub mod violation;
pub mod watch;
