// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compact binary event recording and decoding.
//!
//! [`RecorderSink`] implements [`TraceSink`] and encodes events into a
//! `Vec<u8>` as little-endian records, each starting with a one-byte tag.
//! Counts are stored as `u64`; messages as a `u32` length followed by UTF-8
//! bytes. [`decode`] reads them back as an iterator of [`RecordedEvent`].

use vigil_core::engine::SkipReason;
use vigil_core::time::HostTime;
use vigil_core::trace::{
    CycleBeginEvent, CycleSkippedEvent, CycleSummary, InternalErrorEvent, PhaseBeginEvent,
    PhaseEndEvent, PhaseKind, ReconcileEvent, ResultDiscardedEvent, ScanContextEvent,
    ScanFailedEvent, TraceSink,
};

// ---------------------------------------------------------------------------
// Event type discriminants
// ---------------------------------------------------------------------------

const TAG_CYCLE_BEGIN: u8 = 1;
const TAG_CYCLE_SKIPPED: u8 = 2;
const TAG_SCAN_CONTEXT: u8 = 3;
const TAG_PHASE_BEGIN: u8 = 4;
const TAG_PHASE_END: u8 = 5;
const TAG_SCAN_FAILED: u8 = 6;
const TAG_RESULT_DISCARDED: u8 = 7;
const TAG_RECONCILE: u8 = 8;
const TAG_CYCLE_SUMMARY: u8 = 9;
const TAG_INTERNAL_ERROR: u8 = 10;

// ---------------------------------------------------------------------------
// RecorderSink
// ---------------------------------------------------------------------------

/// A [`TraceSink`] that encodes events into a compact binary buffer.
#[derive(Debug, Default)]
pub struct RecorderSink {
    buf: Vec<u8>,
}

impl RecorderSink {
    /// Creates an empty recorder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a view of the recorded bytes.
    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    /// Consumes the recorder and returns the recorded bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }

    // -- encoding helpers --------------------------------------------------

    fn write_u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    fn write_u64(&mut self, v: u64) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    fn write_count(&mut self, v: usize) {
        self.write_u64(v as u64);
    }

    fn write_str(&mut self, s: &str) {
        #[expect(
            clippy::cast_possible_truncation,
            reason = "messages longer than u32::MAX bytes are cut at the limit"
        )]
        let len = s.len().min(u32::MAX as usize) as u32;
        self.buf.extend_from_slice(&len.to_le_bytes());
        self.buf.extend_from_slice(&s.as_bytes()[..len as usize]);
    }

    fn write_phase(&mut self, p: PhaseKind) {
        self.write_u8(match p {
            PhaseKind::Resolve => 0,
            PhaseKind::Scan => 1,
            PhaseKind::Reconcile => 2,
        });
    }

    fn write_reason(&mut self, r: SkipReason) {
        self.write_u8(match r {
            SkipReason::Disabled => 0,
            SkipReason::Busy => 1,
            SkipReason::EmptyContext => 2,
        });
    }
}

impl TraceSink for RecorderSink {
    fn on_cycle_begin(&mut self, e: &CycleBeginEvent) {
        self.write_u8(TAG_CYCLE_BEGIN);
        self.write_u64(e.cycle);
        self.write_u64(e.generation);
        self.write_count(e.batch_len);
        self.write_u64(e.now.ticks());
    }

    fn on_cycle_skipped(&mut self, e: &CycleSkippedEvent) {
        self.write_u8(TAG_CYCLE_SKIPPED);
        self.write_u64(e.cycle);
        self.write_reason(e.reason);
        self.write_u64(e.now.ticks());
    }

    fn on_scan_context(&mut self, e: &ScanContextEvent) {
        self.write_u8(TAG_SCAN_CONTEXT);
        self.write_u64(e.cycle);
        self.write_count(e.include);
        self.write_count(e.exclude);
    }

    fn on_phase_begin(&mut self, e: &PhaseBeginEvent) {
        self.write_u8(TAG_PHASE_BEGIN);
        self.write_u64(e.cycle);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.ticks());
    }

    fn on_phase_end(&mut self, e: &PhaseEndEvent) {
        self.write_u8(TAG_PHASE_END);
        self.write_u64(e.cycle);
        self.write_phase(e.phase);
        self.write_u64(e.timestamp.ticks());
    }

    fn on_scan_failed(&mut self, e: &ScanFailedEvent<'_>) {
        self.write_u8(TAG_SCAN_FAILED);
        self.write_u64(e.cycle);
        self.write_str(e.message);
    }

    fn on_result_discarded(&mut self, e: &ResultDiscardedEvent) {
        self.write_u8(TAG_RESULT_DISCARDED);
        self.write_u64(e.cycle);
        self.write_u64(e.job_generation);
        self.write_u64(e.current_generation);
        self.write_u8(u8::from(e.enabled));
    }

    fn on_reconcile(&mut self, e: &ReconcileEvent) {
        self.write_u8(TAG_RECONCILE);
        self.write_u64(e.cycle);
        self.write_count(e.results);
        self.write_count(e.added);
        self.write_count(e.updated);
        self.write_count(e.removed);
        self.write_count(e.total);
    }

    fn on_cycle_summary(&mut self, s: &CycleSummary) {
        self.write_u8(TAG_CYCLE_SUMMARY);
        self.write_u64(s.cycle);
        self.write_u64(s.started.ticks());
        self.write_u64(s.resolve_ticks);
        self.write_u64(s.scan_ticks);
        self.write_u64(s.reconcile_ticks);
        self.write_count(s.results);
        self.write_count(s.added);
        self.write_count(s.updated);
        self.write_count(s.removed);
    }

    fn on_internal_error(&mut self, e: &InternalErrorEvent<'_>) {
        self.write_u8(TAG_INTERNAL_ERROR);
        self.write_u64(e.cycle);
        self.write_str(e.message);
        self.write_str(e.report_url);
    }
}

// ---------------------------------------------------------------------------
// Decoder
// ---------------------------------------------------------------------------

/// A decoded event from a binary recording.
#[derive(Clone, Debug)]
pub enum RecordedEvent {
    /// A [`CycleBeginEvent`].
    CycleBegin(CycleBeginEvent),
    /// A [`CycleSkippedEvent`].
    CycleSkipped(CycleSkippedEvent),
    /// A [`ScanContextEvent`].
    ScanContext(ScanContextEvent),
    /// A [`PhaseBeginEvent`].
    PhaseBegin(PhaseBeginEvent),
    /// A [`PhaseEndEvent`].
    PhaseEnd(PhaseEndEvent),
    /// A [`ScanFailedEvent`] with an owned message.
    ScanFailed {
        /// Cycle counter.
        cycle: u64,
        /// Scanner message.
        message: String,
    },
    /// A [`ResultDiscardedEvent`].
    ResultDiscarded(ResultDiscardedEvent),
    /// A [`ReconcileEvent`].
    Reconcile(ReconcileEvent),
    /// A [`CycleSummary`].
    CycleSummary(CycleSummary),
    /// An [`InternalErrorEvent`] with owned strings.
    InternalError {
        /// Cycle counter.
        cycle: u64,
        /// What went wrong.
        message: String,
        /// Where to report it.
        report_url: String,
    },
}

/// Decodes a byte slice produced by [`RecorderSink`] into an iterator of
/// [`RecordedEvent`].
///
/// Iteration stops at the first unknown tag or truncated record.
pub fn decode(bytes: &[u8]) -> DecodeIter<'_> {
    DecodeIter {
        data: bytes,
        pos: 0,
    }
}

/// Iterator over decoded events.
#[derive(Debug)]
pub struct DecodeIter<'a> {
    data: &'a [u8],
    pos: usize,
}

impl DecodeIter<'_> {
    fn take(&mut self, n: usize) -> Option<&[u8]> {
        let end = self.pos.checked_add(n)?;
        let bytes = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(bytes)
    }

    fn read_u8(&mut self) -> Option<u8> {
        self.take(1).map(|b| b[0])
    }

    fn read_u32(&mut self) -> Option<u32> {
        Some(u32::from_le_bytes(self.take(4)?.try_into().ok()?))
    }

    fn read_u64(&mut self) -> Option<u64> {
        Some(u64::from_le_bytes(self.take(8)?.try_into().ok()?))
    }

    fn read_count(&mut self) -> Option<usize> {
        usize::try_from(self.read_u64()?).ok()
    }

    fn read_string(&mut self) -> Option<String> {
        let len = usize::try_from(self.read_u32()?).ok()?;
        String::from_utf8(self.take(len)?.to_vec()).ok()
    }

    fn read_phase(&mut self) -> Option<PhaseKind> {
        Some(match self.read_u8()? {
            0 => PhaseKind::Resolve,
            1 => PhaseKind::Scan,
            _ => PhaseKind::Reconcile,
        })
    }

    fn read_reason(&mut self) -> Option<SkipReason> {
        Some(match self.read_u8()? {
            0 => SkipReason::Disabled,
            1 => SkipReason::Busy,
            _ => SkipReason::EmptyContext,
        })
    }

    fn decode_cycle_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::CycleBegin(CycleBeginEvent {
            cycle: self.read_u64()?,
            generation: self.read_u64()?,
            batch_len: self.read_count()?,
            now: HostTime(self.read_u64()?),
        }))
    }

    fn decode_cycle_skipped(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::CycleSkipped(CycleSkippedEvent {
            cycle: self.read_u64()?,
            reason: self.read_reason()?,
            now: HostTime(self.read_u64()?),
        }))
    }

    fn decode_scan_context(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::ScanContext(ScanContextEvent {
            cycle: self.read_u64()?,
            include: self.read_count()?,
            exclude: self.read_count()?,
        }))
    }

    fn decode_phase_begin(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseBegin(PhaseBeginEvent {
            cycle: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: HostTime(self.read_u64()?),
        }))
    }

    fn decode_phase_end(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::PhaseEnd(PhaseEndEvent {
            cycle: self.read_u64()?,
            phase: self.read_phase()?,
            timestamp: HostTime(self.read_u64()?),
        }))
    }

    fn decode_scan_failed(&mut self) -> Option<RecordedEvent> {
        let cycle = self.read_u64()?;
        let message = self.read_string()?;
        Some(RecordedEvent::ScanFailed { cycle, message })
    }

    fn decode_result_discarded(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::ResultDiscarded(ResultDiscardedEvent {
            cycle: self.read_u64()?,
            job_generation: self.read_u64()?,
            current_generation: self.read_u64()?,
            enabled: self.read_u8()? != 0,
        }))
    }

    fn decode_reconcile(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::Reconcile(ReconcileEvent {
            cycle: self.read_u64()?,
            results: self.read_count()?,
            added: self.read_count()?,
            updated: self.read_count()?,
            removed: self.read_count()?,
            total: self.read_count()?,
        }))
    }

    fn decode_cycle_summary(&mut self) -> Option<RecordedEvent> {
        Some(RecordedEvent::CycleSummary(CycleSummary {
            cycle: self.read_u64()?,
            started: HostTime(self.read_u64()?),
            resolve_ticks: self.read_u64()?,
            scan_ticks: self.read_u64()?,
            reconcile_ticks: self.read_u64()?,
            results: self.read_count()?,
            added: self.read_count()?,
            updated: self.read_count()?,
            removed: self.read_count()?,
        }))
    }

    fn decode_internal_error(&mut self) -> Option<RecordedEvent> {
        let cycle = self.read_u64()?;
        let message = self.read_string()?;
        let report_url = self.read_string()?;
        Some(RecordedEvent::InternalError {
            cycle,
            message,
            report_url,
        })
    }
}

impl Iterator for DecodeIter<'_> {
    type Item = RecordedEvent;

    fn next(&mut self) -> Option<Self::Item> {
        match self.read_u8()? {
            TAG_CYCLE_BEGIN => self.decode_cycle_begin(),
            TAG_CYCLE_SKIPPED => self.decode_cycle_skipped(),
            TAG_SCAN_CONTEXT => self.decode_scan_context(),
            TAG_PHASE_BEGIN => self.decode_phase_begin(),
            TAG_PHASE_END => self.decode_phase_end(),
            TAG_SCAN_FAILED => self.decode_scan_failed(),
            TAG_RESULT_DISCARDED => self.decode_result_discarded(),
            TAG_RECONCILE => self.decode_reconcile(),
            TAG_CYCLE_SUMMARY => self.decode_cycle_summary(),
            TAG_INTERNAL_ERROR => self.decode_internal_error(),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_summary() -> CycleSummary {
        CycleSummary {
            cycle: 7,
            started: HostTime(1_000_000),
            resolve_ticks: 40,
            scan_ticks: 12_000,
            reconcile_ticks: 300,
            results: 5,
            added: 2,
            updated: 1,
            removed: 3,
        }
    }

    #[test]
    fn records_a_full_cycle_in_order() {
        let mut rec = RecorderSink::new();
        rec.on_cycle_begin(&CycleBeginEvent {
            cycle: 7,
            generation: 2,
            batch_len: 4,
            now: HostTime(1_000_000),
        });
        rec.on_phase_begin(&PhaseBeginEvent {
            cycle: 7,
            phase: PhaseKind::Scan,
            timestamp: HostTime(1_000_040),
        });
        rec.on_phase_end(&PhaseEndEvent {
            cycle: 7,
            phase: PhaseKind::Scan,
            timestamp: HostTime(1_012_040),
        });
        rec.on_reconcile(&ReconcileEvent {
            cycle: 7,
            results: 5,
            added: 2,
            updated: 1,
            removed: 3,
            total: 9,
        });
        rec.on_cycle_summary(&sample_summary());

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 5);
        match &events[0] {
            RecordedEvent::CycleBegin(e) => {
                assert_eq!(e.generation, 2);
                assert_eq!(e.batch_len, 4);
            }
            other => panic!("expected CycleBegin, got {other:?}"),
        }
        match &events[2] {
            RecordedEvent::PhaseEnd(e) => {
                assert_eq!(e.phase, PhaseKind::Scan);
                assert_eq!(e.timestamp, HostTime(1_012_040));
            }
            other => panic!("expected PhaseEnd, got {other:?}"),
        }
        match &events[3] {
            RecordedEvent::Reconcile(e) => assert_eq!(e.total, 9),
            other => panic!("expected Reconcile, got {other:?}"),
        }
        match &events[4] {
            RecordedEvent::CycleSummary(s) => {
                assert_eq!(s.scan_ticks, 12_000);
                assert_eq!(s.total_blocking_ticks(), 12_300);
                assert_eq!(s.removed, 3);
            }
            other => panic!("expected CycleSummary, got {other:?}"),
        }
    }

    #[test]
    fn messages_survive_recording() {
        let mut rec = RecorderSink::new();
        rec.on_scan_failed(&ScanFailedEvent {
            cycle: 3,
            message: "axe.run rejected: no axe",
        });
        rec.on_internal_error(&InternalErrorEvent {
            cycle: 4,
            message: "two annotations for one element",
            report_url: "https://example.invalid/issues",
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert_eq!(events.len(), 2);
        match &events[0] {
            RecordedEvent::ScanFailed { cycle, message } => {
                assert_eq!(*cycle, 3);
                assert_eq!(message, "axe.run rejected: no axe");
            }
            other => panic!("expected ScanFailed, got {other:?}"),
        }
        match &events[1] {
            RecordedEvent::InternalError {
                message,
                report_url,
                ..
            } => {
                assert_eq!(message, "two annotations for one element");
                assert_eq!(report_url, "https://example.invalid/issues");
            }
            other => panic!("expected InternalError, got {other:?}"),
        }
    }

    #[test]
    fn skip_reasons_and_discards_are_kept() {
        let mut rec = RecorderSink::new();
        rec.on_cycle_skipped(&CycleSkippedEvent {
            cycle: 1,
            reason: SkipReason::EmptyContext,
            now: HostTime(10),
        });
        rec.on_result_discarded(&ResultDiscardedEvent {
            cycle: 2,
            job_generation: 1,
            current_generation: 3,
            enabled: true,
        });

        let events: Vec<_> = decode(rec.as_bytes()).collect();
        assert!(matches!(
            events[0],
            RecordedEvent::CycleSkipped(CycleSkippedEvent {
                reason: SkipReason::EmptyContext,
                ..
            })
        ));
        assert!(matches!(
            events[1],
            RecordedEvent::ResultDiscarded(ResultDiscardedEvent {
                current_generation: 3,
                enabled: true,
                ..
            })
        ));
    }

    #[test]
    fn truncated_recording_stops_cleanly() {
        let mut rec = RecorderSink::new();
        rec.on_cycle_summary(&sample_summary());
        rec.on_cycle_summary(&sample_summary());
        let bytes = rec.into_bytes();
        let events: Vec<_> = decode(&bytes[..bytes.len() - 3]).collect();
        assert_eq!(events.len(), 1);
    }

    #[test]
    fn empty_buffer_decodes_to_nothing() {
        let events: Vec<_> = decode(&[]).collect();
        assert!(events.is_empty());
    }
}
