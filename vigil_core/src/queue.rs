// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Throttled, coalescing work queue.
//!
//! [`ThrottleQueue`] collects an unordered set of pending items and decides
//! when the host should hand them to its worker. It is a pure state machine:
//! the host reads [`next_deadline`](ThrottleQueue::next_deadline) to arm a
//! timer, calls [`poll`](ThrottleQueue::poll) when the timer fires, runs the
//! worker on the returned batch (possibly asynchronously), and finally calls
//! [`complete`](ThrottleQueue::complete) once the worker settles.
//!
//! # Scheduling
//!
//! ```text
//!   add ──► pending ──(deadline)──► poll ──► worker(batch) ──► complete
//!              ▲                                                  │
//!              └──────────── re-arm for throttle_delay ◄──────────┘
//! ```
//!
//! - The first run ever scheduled waits [`ThrottleConfig::initial_delay`];
//!   every later run waits [`ThrottleConfig::throttle_delay`].
//! - While a run is in flight no timer is armed. Items added meanwhile stay
//!   pending and are delivered in the next batch, so no item is dropped.
//! - The worker is never handed two batches concurrently: `poll` returns
//!   `None` until `complete` has been called for the previous batch.
//! - [`dispose`](ThrottleQueue::dispose) stops future scheduling but leaves
//!   an in-flight run alone.

use alloc::vec::Vec;
use core::hash::Hash;

use understory_dirty::DirtySet;

use crate::config::Throttle;
use crate::dirty;
use crate::time::{Duration, HostTime};

/// Delays used by a [`ThrottleQueue`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ThrottleConfig {
    /// Delay before the first run after construction.
    pub initial_delay: Duration,
    /// Delay before every subsequent run.
    pub throttle_delay: Duration,
}

impl ThrottleConfig {
    /// Derives queue delays from a user-facing [`Throttle`] setting.
    ///
    /// With `leading` set, the first batch fires immediately (on the next
    /// host timer turn) and later batches are rate-limited to one per
    /// `wait`. Without it, the first batch also waits a full `wait`.
    #[must_use]
    pub const fn from_throttle(throttle: Throttle) -> Self {
        Self {
            initial_delay: if throttle.leading {
                Duration::ZERO
            } else {
                throttle.wait
            },
            throttle_delay: throttle.wait,
        }
    }
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self::from_throttle(Throttle::default())
    }
}

/// A coalescing queue that rate-limits worker invocations.
///
/// See the [module docs](self) for the scheduling rules.
///
/// # Example
///
/// ```
/// use vigil_core::queue::{ThrottleConfig, ThrottleQueue};
/// use vigil_core::time::{Duration, HostTime};
///
/// let mut queue = ThrottleQueue::<u32>::new(ThrottleConfig {
///     initial_delay: Duration::from_millis(10),
///     throttle_delay: Duration::from_millis(100),
/// });
///
/// queue.add(1, HostTime::from_millis(0));
/// queue.add(1, HostTime::from_millis(2));
/// queue.add(2, HostTime::from_millis(5));
/// assert_eq!(queue.next_deadline(), Some(HostTime::from_millis(10)));
///
/// let batch = queue.poll(HostTime::from_millis(10)).unwrap();
/// assert_eq!(batch, vec![1, 2]);
/// queue.complete(HostTime::from_millis(30));
/// ```
#[derive(Debug)]
pub struct ThrottleQueue<T>
where
    T: Copy + Eq + Hash + Ord,
{
    config: ThrottleConfig,
    pending: DirtySet<T>,
    deadline: Option<HostTime>,
    running: bool,
    scheduled_once: bool,
    disposed: bool,
    runs: u64,
}

impl<T> ThrottleQueue<T>
where
    T: Copy + Eq + Hash + Ord,
{
    /// Creates an idle queue.
    #[must_use]
    pub fn new(config: ThrottleConfig) -> Self {
        Self {
            config,
            pending: DirtySet::new(),
            deadline: None,
            running: false,
            scheduled_once: false,
            disposed: false,
            runs: 0,
        }
    }

    /// Returns the queue's delays.
    #[must_use]
    pub fn config(&self) -> ThrottleConfig {
        self.config
    }

    /// Adds an item to the pending set and makes sure a run is scheduled.
    ///
    /// Returns `true` if the item was not already pending. Items added after
    /// [`dispose`](Self::dispose) are ignored.
    pub fn add(&mut self, item: T, now: HostTime) -> bool {
        if self.disposed {
            return false;
        }
        let inserted = self.pending.mark(item, dirty::PENDING);
        self.arm(now);
        inserted
    }

    /// Adds every item; equivalent to calling [`add`](Self::add) for each.
    pub fn add_multiple(&mut self, items: impl IntoIterator<Item = T>, now: HostTime) {
        for item in items {
            self.add(item, now);
        }
    }

    /// Returns when the host should call [`poll`](Self::poll), if a run is
    /// scheduled.
    #[must_use]
    pub fn next_deadline(&self) -> Option<HostTime> {
        self.deadline
    }

    /// Takes the pending batch if the scheduled deadline has passed.
    ///
    /// The returned batch is sorted and deduplicated. The queue is marked
    /// running until [`complete`](Self::complete) is called.
    pub fn poll(&mut self, now: HostTime) -> Option<Vec<T>> {
        if self.disposed || self.running {
            return None;
        }
        let deadline = self.deadline?;
        if now < deadline {
            return None;
        }
        self.deadline = None;

        let mut batch: Vec<T> = self.pending.drain(dirty::PENDING).collect();
        if batch.is_empty() {
            return None;
        }
        batch.sort_unstable();
        self.running = true;
        self.runs += 1;
        Some(batch)
    }

    /// Records that the worker settled, successfully or not.
    ///
    /// If items arrived while the worker ran, the next run is armed for
    /// [`ThrottleConfig::throttle_delay`] from `now`.
    pub fn complete(&mut self, now: HostTime) {
        self.running = false;
        self.arm(now);
    }

    /// Stops all future scheduling and drops pending items.
    ///
    /// An in-flight run is not affected; calling [`complete`](Self::complete)
    /// for it afterwards is harmless.
    pub fn dispose(&mut self) {
        self.disposed = true;
        self.deadline = None;
        self.pending.clear_all();
    }

    /// Returns `true` while a batch is handed out and not yet completed.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Returns `true` once [`dispose`](Self::dispose) has been called.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Returns the number of distinct pending items.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.pending.len(dirty::PENDING)
    }

    /// Returns how many batches have been handed out so far.
    #[must_use]
    pub fn runs(&self) -> u64 {
        self.runs
    }

    fn arm(&mut self, now: HostTime) {
        if self.disposed
            || self.running
            || self.deadline.is_some()
            || !self.pending.has_dirty(dirty::PENDING)
        {
            return;
        }
        let delay = if self.scheduled_once {
            self.config.throttle_delay
        } else {
            self.config.initial_delay
        };
        self.scheduled_once = true;
        self.deadline = Some(now.saturating_add(delay));
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;

    const INITIAL: u64 = 10;
    const THROTTLE: u64 = 100;

    fn ms(v: u64) -> HostTime {
        HostTime::from_millis(v)
    }

    fn queue() -> ThrottleQueue<u32> {
        ThrottleQueue::new(ThrottleConfig {
            initial_delay: Duration::from_millis(INITIAL),
            throttle_delay: Duration::from_millis(THROTTLE),
        })
    }

    #[test]
    fn burst_before_first_run_coalesces_into_one_batch() {
        let mut q = queue();
        q.add(3, ms(0));
        q.add(1, ms(4));
        q.add(3, ms(6));
        q.add_multiple([2, 1], ms(9));

        assert_eq!(q.poll(ms(9)), None, "deadline not reached yet");
        assert_eq!(q.poll(ms(INITIAL)), Some(vec![1, 2, 3]));
        assert_eq!(q.runs(), 1);
        assert_eq!(q.pending_len(), 0);
    }

    #[test]
    fn first_run_uses_initial_delay_then_throttle_delay() {
        let mut q = queue();
        q.add(1, ms(0));
        assert_eq!(q.next_deadline(), Some(ms(INITIAL)));
        let _ = q.poll(ms(INITIAL)).unwrap();
        q.complete(ms(20));
        assert_eq!(q.next_deadline(), None, "nothing pending");

        q.add(2, ms(500));
        assert_eq!(q.next_deadline(), Some(ms(500 + THROTTLE)));
    }

    #[test]
    fn items_added_while_running_land_in_next_batch() {
        let mut q = queue();
        q.add(1, ms(0));
        let first = q.poll(ms(INITIAL)).unwrap();
        assert_eq!(first, vec![1]);

        // Arrives mid-run; must not arm a timer while running.
        q.add(2, ms(30));
        q.add(1, ms(31));
        assert_eq!(q.next_deadline(), None);
        assert_eq!(q.poll(ms(1_000)), None, "worker still running");

        q.complete(ms(60));
        let deadline = q.next_deadline().unwrap();
        assert_eq!(deadline, ms(60 + THROTTLE));
        assert_eq!(q.poll(deadline), Some(vec![1, 2]));
    }

    #[test]
    fn next_run_never_starts_before_previous_finishes_or_throttle_elapses() {
        // Worker starts at t0 and runs for d; an item arrives at t0 + x.
        for (d, x) in [(50_u64, 10_u64), (300, 299), (100, 1)] {
            let mut q = queue();
            q.add(1, ms(0));
            let t0 = INITIAL;
            let _ = q.poll(ms(t0)).unwrap();
            q.add(2, ms(t0 + x));
            q.complete(ms(t0 + d));
            let next = q.next_deadline().unwrap();
            assert!(next >= ms(t0 + d), "starts after the in-flight run (d={d})");
            assert!(next >= ms(t0 + THROTTLE), "respects throttle (d={d})");
        }
    }

    #[test]
    fn failed_worker_does_not_wedge_the_queue() {
        let mut q = queue();
        q.add(1, ms(0));
        let _ = q.poll(ms(INITIAL)).unwrap();
        q.add(2, ms(11));
        // The host reports completion even when its worker errored.
        q.complete(ms(12));
        assert!(!q.is_running());
        assert_eq!(q.poll(ms(12 + THROTTLE)), Some(vec![2]));
    }

    #[test]
    fn dispose_clears_timer_and_ignores_new_items() {
        let mut q = queue();
        q.add(1, ms(0));
        let _ = q.poll(ms(INITIAL)).unwrap();
        q.add(2, ms(11));
        q.dispose();

        // The in-flight run still completes cleanly.
        q.complete(ms(20));
        assert_eq!(q.next_deadline(), None);
        assert!(!q.add(3, ms(21)));
        assert_eq!(q.poll(ms(10_000)), None);
        assert!(q.is_disposed());
    }

    #[test]
    fn trailing_only_throttle_waits_full_interval_first() {
        let config = ThrottleConfig::from_throttle(Throttle {
            wait: Duration::from_millis(250),
            leading: false,
        });
        assert_eq!(config.initial_delay, Duration::from_millis(250));

        let mut q = ThrottleQueue::<u32>::new(config);
        q.add(7, ms(0));
        assert_eq!(q.next_deadline(), Some(ms(250)));
    }

    #[test]
    fn leading_throttle_fires_first_batch_immediately() {
        let config = ThrottleConfig::from_throttle(Throttle {
            wait: Duration::from_millis(250),
            leading: true,
        });
        let mut q = ThrottleQueue::<u32>::new(config);
        q.add(7, ms(40));
        assert_eq!(q.poll(ms(40)), Some(vec![7]));
    }
}
