// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Human-readable trace output.
//!
//! [`PrettyPrintSink`] implements [`TraceSink`] and writes one line per event
//! to a [`Write`](std::io::Write) destination (default: stderr).

use std::io::Write;

use vigil_core::time::HostTime;
use vigil_core::trace::{
    CycleBeginEvent, CycleSkippedEvent, CycleSummary, InternalErrorEvent, PhaseBeginEvent,
    PhaseEndEvent, ReconcileEvent, ResultDiscardedEvent, ScanContextEvent, ScanFailedEvent,
    TraceSink,
};

/// Writes human-readable trace lines to a [`Write`](std::io::Write) destination.
pub struct PrettyPrintSink<W: Write = Box<dyn Write>> {
    writer: W,
}

impl<W: Write> std::fmt::Debug for PrettyPrintSink<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrettyPrintSink").finish_non_exhaustive()
    }
}

impl PrettyPrintSink {
    /// Creates a sink that writes to stderr.
    #[must_use]
    pub fn stderr() -> Self {
        Self {
            writer: Box::new(std::io::stderr()),
        }
    }

    /// Creates a sink that writes to a boxed writer.
    #[must_use]
    pub fn new(writer: Box<dyn Write>) -> Self {
        Self { writer }
    }
}

impl<W: Write> PrettyPrintSink<W> {
    /// Creates a sink that writes to the given destination.
    #[must_use]
    pub fn with_writer(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the sink and returns the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

fn ms(ticks: u64) -> f64 {
    ticks as f64 / 1000.0
}

fn at(t: HostTime) -> f64 {
    ms(t.ticks())
}

impl<W: Write> TraceSink for PrettyPrintSink<W> {
    fn on_cycle_begin(&mut self, e: &CycleBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[cycle] #{} gen={} batch={} at {:.3}ms",
            e.cycle,
            e.generation,
            e.batch_len,
            at(e.now),
        );
    }

    fn on_cycle_skipped(&mut self, e: &CycleSkippedEvent) {
        let _ = writeln!(
            self.writer,
            "[skip] #{} {} at {:.3}ms",
            e.cycle,
            e.reason.as_str(),
            at(e.now),
        );
    }

    fn on_scan_context(&mut self, e: &ScanContextEvent) {
        let _ = writeln!(
            self.writer,
            "[context] #{} include={} exclude={}",
            e.cycle, e.include, e.exclude,
        );
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:begin] #{} {} at {:.3}ms",
            e.cycle,
            e.phase.as_str(),
            at(e.timestamp),
        );
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        let _ = writeln!(
            self.writer,
            "[phase:end] #{} {} at {:.3}ms",
            e.cycle,
            e.phase.as_str(),
            at(e.timestamp),
        );
    }

    fn on_scan_failed(&mut self, e: &ScanFailedEvent<'_>) {
        let _ = writeln!(self.writer, "[scan:failed] #{} {}", e.cycle, e.message);
    }

    fn on_result_discarded(&mut self, e: &ResultDiscardedEvent) {
        let _ = writeln!(
            self.writer,
            "[discard] #{} gen={} current={} enabled={}",
            e.cycle, e.job_generation, e.current_generation, e.enabled,
        );
    }

    fn on_reconcile(&mut self, e: &ReconcileEvent) {
        let _ = writeln!(
            self.writer,
            "[reconcile] #{} results={} +{} ~{} -{} total={}",
            e.cycle, e.results, e.added, e.updated, e.removed, e.total,
        );
    }

    fn on_cycle_summary(&mut self, s: &CycleSummary) {
        let _ = writeln!(
            self.writer,
            "[summary] #{} resolve={:.3}ms scan={:.3}ms reconcile={:.3}ms \
             blocking={:.3}ms +{} ~{} -{}",
            s.cycle,
            ms(s.resolve_ticks),
            ms(s.scan_ticks),
            ms(s.reconcile_ticks),
            ms(s.total_blocking_ticks()),
            s.added,
            s.updated,
            s.removed,
        );
    }

    fn on_internal_error(&mut self, e: &InternalErrorEvent<'_>) {
        let _ = writeln!(
            self.writer,
            "[internal-error] #{} {} (report at {})",
            e.cycle, e.message, e.report_url,
        );
    }
}
