// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Dirty-tracking channel constants.
//!
//! Mutated nodes are accumulated in an
//! [`understory_dirty::DirtySet`] between scan cycles. The set deduplicates
//! repeated marks of the same node, which is exactly the "duplicates
//! collapse" behavior the [`ThrottleQueue`](crate::queue::ThrottleQueue)
//! needs for its pending batch.
//!
//! No propagation policy is involved: a mutated node is re-scanned as a
//! subtree root, so descendants never need their own marks.

use understory_dirty::Channel;

/// Items waiting for the next worker invocation.
pub const PENDING: Channel = Channel::new(0);
