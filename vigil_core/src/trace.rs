// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tracing and diagnostics for scan cycles.
//!
//! This module provides a [`TraceSink`] trait with per-event methods that the
//! [`Engine`](crate::engine::Engine) calls at each stage of a cycle. All
//! method bodies default to no-ops, so implementing only the events you care
//! about is fine.
//!
//! [`Tracer`] wraps an optional `&mut dyn TraceSink`. When the `trace` feature
//! is **off**, every `Tracer` method compiles to nothing. When **on**, each
//! method performs a single `Option` branch before dispatching.
//!
//! Logging is a sink concern: `vigil_debug` prints and records events, and
//! the web backend forwards them to the browser console.
//!
//! [`CycleSummaryBuilder`] collects phase timestamps during a cycle and
//! produces a [`CycleSummary`] at the end.
//!
//! # Crate features
//!
//! - `trace`: enables the `Tracer` method bodies (one branch per call).

use crate::engine::SkipReason;
use crate::time::HostTime;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Which phase of a scan cycle is being measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PhaseKind {
    /// Normalizing the user context and resolving the scan context.
    Resolve,
    /// Waiting for the scanner.
    Scan,
    /// Transforming results, reconciling annotations, and presenting them.
    Reconcile,
}

impl PhaseKind {
    /// Short lowercase name, for log lines and trace exports.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Resolve => "resolve",
            Self::Scan => "scan",
            Self::Reconcile => "reconcile",
        }
    }
}

// ---------------------------------------------------------------------------
// Event structs
// ---------------------------------------------------------------------------

/// Emitted when the throttle queue hands the engine a batch.
#[derive(Clone, Copy, Debug)]
pub struct CycleBeginEvent {
    /// Monotonic cycle counter.
    pub cycle: u64,
    /// Enable generation the cycle runs under.
    pub generation: u64,
    /// Number of dirty nodes in the batch.
    pub batch_len: usize,
    /// Host time at the start of the cycle.
    pub now: HostTime,
}

/// Emitted when a cycle ends without scanning.
#[derive(Clone, Copy, Debug)]
pub struct CycleSkippedEvent {
    /// Cycle counter.
    pub cycle: u64,
    /// Why nothing was scanned.
    pub reason: SkipReason,
    /// Host time of the decision.
    pub now: HostTime,
}

/// Emitted once the scan context of a cycle is known.
#[derive(Clone, Copy, Debug)]
pub struct ScanContextEvent {
    /// Cycle counter.
    pub cycle: u64,
    /// Number of include roots.
    pub include: usize,
    /// Number of exclude roots.
    pub exclude: usize,
}

/// Marks the beginning of a cycle phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseBeginEvent {
    /// Cycle counter.
    pub cycle: u64,
    /// Which phase is starting.
    pub phase: PhaseKind,
    /// Host time at the start of the phase.
    pub timestamp: HostTime,
}

/// Marks the end of a cycle phase.
#[derive(Clone, Copy, Debug)]
pub struct PhaseEndEvent {
    /// Cycle counter.
    pub cycle: u64,
    /// Which phase is ending.
    pub phase: PhaseKind,
    /// Host time at the end of the phase.
    pub timestamp: HostTime,
}

/// Emitted when the scanner reports an error. Previous annotations are kept.
#[derive(Clone, Copy, Debug)]
pub struct ScanFailedEvent<'a> {
    /// Cycle counter.
    pub cycle: u64,
    /// Scanner message.
    pub message: &'a str,
}

/// Emitted when a finished scan arrives after the engine was disabled or
/// re-enabled.
#[derive(Clone, Copy, Debug)]
pub struct ResultDiscardedEvent {
    /// Cycle counter.
    pub cycle: u64,
    /// Generation the scan was started under.
    pub job_generation: u64,
    /// Current generation.
    pub current_generation: u64,
    /// Whether the engine is currently enabled.
    pub enabled: bool,
}

/// Emitted after annotations were reconciled.
#[derive(Clone, Copy, Debug)]
pub struct ReconcileEvent {
    /// Cycle counter.
    pub cycle: u64,
    /// Elements with issues in this cycle's results.
    pub results: usize,
    /// Annotations created.
    pub added: usize,
    /// Annotations updated in place.
    pub updated: usize,
    /// Annotations removed.
    pub removed: usize,
    /// Annotations alive after the cycle.
    pub total: usize,
}

/// Emitted when an engine invariant breaks, right before the error is
/// returned to the host.
#[derive(Clone, Copy, Debug)]
pub struct InternalErrorEvent<'a> {
    /// Cycle counter.
    pub cycle: u64,
    /// What went wrong.
    pub message: &'a str,
    /// Where to report it.
    pub report_url: &'static str,
}

/// Per-cycle timing summary produced by [`CycleSummaryBuilder`].
#[derive(Clone, Copy, Debug)]
pub struct CycleSummary {
    /// Cycle counter.
    pub cycle: u64,
    /// Host time when the cycle began.
    pub started: HostTime,
    /// Resolve phase duration in ticks (0 if not measured).
    pub resolve_ticks: u64,
    /// Scan phase duration in ticks (0 if not measured).
    pub scan_ticks: u64,
    /// Reconcile phase duration in ticks (0 if not measured).
    pub reconcile_ticks: u64,
    /// Elements with issues in the results.
    pub results: usize,
    /// Annotations created.
    pub added: usize,
    /// Annotations updated in place.
    pub updated: usize,
    /// Annotations removed.
    pub removed: usize,
}

impl CycleSummary {
    /// Scan plus reconcile time: how long the page was kept busy.
    #[must_use]
    pub const fn total_blocking_ticks(&self) -> u64 {
        self.scan_ticks.saturating_add(self.reconcile_ticks)
    }
}

// ---------------------------------------------------------------------------
// TraceSink trait
// ---------------------------------------------------------------------------

/// Receives trace events from the engine.
///
/// All methods have default no-op implementations, so you only need to
/// override the events you care about.
pub trait TraceSink {
    /// Called when a cycle starts.
    fn on_cycle_begin(&mut self, e: &CycleBeginEvent) {
        _ = e;
    }

    /// Called when a cycle ends without scanning.
    fn on_cycle_skipped(&mut self, e: &CycleSkippedEvent) {
        _ = e;
    }

    /// Called when the scan context is resolved.
    fn on_scan_context(&mut self, e: &ScanContextEvent) {
        _ = e;
    }

    /// Called at the beginning of a cycle phase.
    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        _ = e;
    }

    /// Called at the end of a cycle phase.
    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        _ = e;
    }

    /// Called when the scanner fails.
    fn on_scan_failed(&mut self, e: &ScanFailedEvent<'_>) {
        _ = e;
    }

    /// Called when a stale result is dropped.
    fn on_result_discarded(&mut self, e: &ResultDiscardedEvent) {
        _ = e;
    }

    /// Called after reconciliation.
    fn on_reconcile(&mut self, e: &ReconcileEvent) {
        _ = e;
    }

    /// Called with a per-cycle timing summary.
    fn on_cycle_summary(&mut self, s: &CycleSummary) {
        _ = s;
    }

    /// Called when an engine invariant breaks.
    fn on_internal_error(&mut self, e: &InternalErrorEvent<'_>) {
        _ = e;
    }
}

// ---------------------------------------------------------------------------
// NoopSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that discards all events.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl TraceSink for NoopSink {}

// ---------------------------------------------------------------------------
// Tracer wrapper
// ---------------------------------------------------------------------------

/// Thin wrapper around an optional [`TraceSink`].
///
/// When the `trace` feature is **off**, every method compiles to nothing. When
/// **on**, each method checks the inner `Option` (one branch) before
/// dispatching to the sink.
pub struct Tracer<'a> {
    #[cfg(feature = "trace")]
    sink: Option<&'a mut dyn TraceSink>,
    #[cfg(not(feature = "trace"))]
    _marker: core::marker::PhantomData<&'a mut dyn TraceSink>,
}

impl core::fmt::Debug for Tracer<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Tracer").finish_non_exhaustive()
    }
}

/// Generates a `Tracer` method forwarding one event to the sink.
macro_rules! dispatch {
    ($(#[$doc:meta])* $name:ident => $sink_method:ident($ty:ty)) => {
        $(#[$doc])*
        #[inline]
        pub fn $name(&mut self, e: &$ty) {
            #[cfg(feature = "trace")]
            if let Some(s) = &mut self.sink {
                s.$sink_method(e);
            }
            #[cfg(not(feature = "trace"))]
            {
                _ = e;
            }
        }
    };
}

impl<'a> Tracer<'a> {
    /// Creates a tracer that dispatches to the given sink.
    #[inline]
    #[must_use]
    pub fn new(sink: &'a mut dyn TraceSink) -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: Some(sink) }
        }
        #[cfg(not(feature = "trace"))]
        {
            _ = sink;
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    /// Creates a tracer that discards all events.
    #[inline]
    #[must_use]
    pub fn none() -> Self {
        #[cfg(feature = "trace")]
        {
            Self { sink: None }
        }
        #[cfg(not(feature = "trace"))]
        {
            Self {
                _marker: core::marker::PhantomData,
            }
        }
    }

    dispatch!(
        /// Emits a [`CycleBeginEvent`].
        cycle_begin => on_cycle_begin(CycleBeginEvent)
    );
    dispatch!(
        /// Emits a [`CycleSkippedEvent`].
        cycle_skipped => on_cycle_skipped(CycleSkippedEvent)
    );
    dispatch!(
        /// Emits a [`ScanContextEvent`].
        scan_context => on_scan_context(ScanContextEvent)
    );
    dispatch!(
        /// Emits a [`PhaseBeginEvent`].
        phase_begin => on_phase_begin(PhaseBeginEvent)
    );
    dispatch!(
        /// Emits a [`PhaseEndEvent`].
        phase_end => on_phase_end(PhaseEndEvent)
    );
    dispatch!(
        /// Emits a [`ScanFailedEvent`].
        scan_failed => on_scan_failed(ScanFailedEvent<'_>)
    );
    dispatch!(
        /// Emits a [`ResultDiscardedEvent`].
        result_discarded => on_result_discarded(ResultDiscardedEvent)
    );
    dispatch!(
        /// Emits a [`ReconcileEvent`].
        reconcile => on_reconcile(ReconcileEvent)
    );
    dispatch!(
        /// Emits a [`CycleSummary`].
        cycle_summary => on_cycle_summary(CycleSummary)
    );
    dispatch!(
        /// Emits an [`InternalErrorEvent`].
        internal_error => on_internal_error(InternalErrorEvent<'_>)
    );
}

// ---------------------------------------------------------------------------
// CycleSummaryBuilder
// ---------------------------------------------------------------------------

/// Collects phase timestamps during a cycle and produces a [`CycleSummary`].
#[derive(Clone, Debug)]
pub struct CycleSummaryBuilder {
    cycle: u64,
    started: HostTime,
    phase_starts: [Option<HostTime>; 3],
    phase_ends: [Option<HostTime>; 3],
    results: usize,
    added: usize,
    updated: usize,
    removed: usize,
}

impl CycleSummaryBuilder {
    /// Starts building a summary for the given cycle.
    #[must_use]
    pub fn new(cycle: u64, started: HostTime) -> Self {
        Self {
            cycle,
            started,
            phase_starts: [None; 3],
            phase_ends: [None; 3],
            results: 0,
            added: 0,
            updated: 0,
            removed: 0,
        }
    }

    /// Records the start of a phase.
    pub fn phase_begin(&mut self, phase: PhaseKind, t: HostTime) {
        self.phase_starts[phase_index(phase)] = Some(t);
    }

    /// Records the end of a phase.
    pub fn phase_end(&mut self, phase: PhaseKind, t: HostTime) {
        self.phase_ends[phase_index(phase)] = Some(t);
    }

    /// Records reconciliation counts.
    pub fn set_counts(&mut self, results: usize, added: usize, updated: usize, removed: usize) {
        self.results = results;
        self.added = added;
        self.updated = updated;
        self.removed = removed;
    }

    /// Returns the duration of a phase in ticks, or 0 if either end is
    /// missing.
    #[must_use]
    pub fn phase_duration(&self, phase: PhaseKind) -> u64 {
        let idx = phase_index(phase);
        match (self.phase_starts[idx], self.phase_ends[idx]) {
            (Some(start), Some(end)) => end.saturating_duration_since(start).ticks(),
            _ => 0,
        }
    }

    /// Consumes the builder and produces the final [`CycleSummary`].
    #[must_use]
    pub fn finish(self) -> CycleSummary {
        CycleSummary {
            cycle: self.cycle,
            started: self.started,
            resolve_ticks: self.phase_duration(PhaseKind::Resolve),
            scan_ticks: self.phase_duration(PhaseKind::Scan),
            reconcile_ticks: self.phase_duration(PhaseKind::Reconcile),
            results: self.results,
            added: self.added,
            updated: self.updated,
            removed: self.removed,
        }
    }
}

/// Maps a [`PhaseKind`] to an array index.
const fn phase_index(phase: PhaseKind) -> usize {
    match phase {
        PhaseKind::Resolve => 0,
        PhaseKind::Scan => 1,
        PhaseKind::Reconcile => 2,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
