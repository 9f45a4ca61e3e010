// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Chrome Trace Event Format exporter.
//!
//! [`export`] reads recorded bytes from a [`RecorderSink`](super::recorder::RecorderSink)
//! and writes [Chrome Trace Event Format][spec] JSON to the given writer.
//!
//! Phases become duration slices on one track per cycle phase; everything
//! else is an instant event carrying its fields as `args`.
//!
//! [spec]: https://docs.google.com/document/d/1CvAClvFfyA5R-PhYUmn5OOQtYMH4h6I0nSsKchNAySU

use std::io::{self, Write};

use serde_json::{Value, json};

use vigil_core::time::HostTime;

use crate::recorder::{RecordedEvent, decode};

/// Exports recorded events as Chrome Trace Event Format JSON.
///
/// The output is a complete JSON array of trace event objects, suitable for
/// loading into `chrome://tracing` or [Perfetto](https://ui.perfetto.dev/).
/// Events without their own timestamp reuse the last one seen.
pub fn export(bytes: &[u8], writer: &mut dyn Write) -> io::Result<()> {
    let mut events: Vec<Value> = Vec::new();
    let mut last = 0.0;

    for recorded in decode(bytes) {
        match recorded {
            RecordedEvent::CycleBegin(e) => {
                last = us(e.now);
                events.push(instant("CycleBegin", "Cycle", last, json!({
                    "cycle": e.cycle,
                    "generation": e.generation,
                    "batch_len": e.batch_len,
                })));
            }
            RecordedEvent::CycleSkipped(e) => {
                last = us(e.now);
                events.push(instant("CycleSkipped", "Cycle", last, json!({
                    "cycle": e.cycle,
                    "reason": e.reason.as_str(),
                })));
            }
            RecordedEvent::ScanContext(e) => {
                events.push(instant("ScanContext", "Cycle", last, json!({
                    "cycle": e.cycle,
                    "include": e.include,
                    "exclude": e.exclude,
                })));
            }
            RecordedEvent::PhaseBegin(e) => {
                last = us(e.timestamp);
                events.push(json!({
                    "ph": "B",
                    "name": e.phase.as_str(),
                    "cat": "Phase",
                    "ts": last,
                    "pid": 0,
                    "tid": 0,
                    "args": { "cycle": e.cycle },
                }));
            }
            RecordedEvent::PhaseEnd(e) => {
                last = us(e.timestamp);
                events.push(json!({
                    "ph": "E",
                    "name": e.phase.as_str(),
                    "cat": "Phase",
                    "ts": last,
                    "pid": 0,
                    "tid": 0,
                    "args": { "cycle": e.cycle },
                }));
            }
            RecordedEvent::ScanFailed { cycle, message } => {
                events.push(instant("ScanFailed", "Error", last, json!({
                    "cycle": cycle,
                    "message": message,
                })));
            }
            RecordedEvent::ResultDiscarded(e) => {
                events.push(instant("ResultDiscarded", "Cycle", last, json!({
                    "cycle": e.cycle,
                    "job_generation": e.job_generation,
                    "current_generation": e.current_generation,
                    "enabled": e.enabled,
                })));
            }
            RecordedEvent::Reconcile(e) => {
                events.push(instant("Reconcile", "Annotations", last, json!({
                    "cycle": e.cycle,
                    "results": e.results,
                    "added": e.added,
                    "updated": e.updated,
                    "removed": e.removed,
                    "total": e.total,
                })));
                events.push(json!({
                    "ph": "C",
                    "name": "annotations",
                    "ts": last,
                    "pid": 0,
                    "tid": 0,
                    "args": { "total": e.total },
                }));
            }
            RecordedEvent::CycleSummary(s) => {
                events.push(instant("CycleSummary", "Summary", last, json!({
                    "cycle": s.cycle,
                    "started_us": us(s.started),
                    "resolve_us": s.resolve_ticks,
                    "scan_us": s.scan_ticks,
                    "reconcile_us": s.reconcile_ticks,
                    "blocking_us": s.total_blocking_ticks(),
                    "results": s.results,
                })));
            }
            RecordedEvent::InternalError {
                cycle,
                message,
                report_url,
            } => {
                events.push(instant("InternalError", "Error", last, json!({
                    "cycle": cycle,
                    "message": message,
                    "report_url": report_url,
                })));
            }
        }
    }

    serde_json::to_writer_pretty(writer, &events)?;
    Ok(())
}

fn instant(name: &str, cat: &str, ts: f64, args: Value) -> Value {
    json!({
        "ph": "i",
        "name": name,
        "cat": cat,
        "ts": ts,
        "pid": 0,
        "tid": 0,
        "s": "g",
        "args": args,
    })
}

fn us(t: HostTime) -> f64 {
    t.ticks() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::RecorderSink;
    use vigil_core::trace::{
        CycleBeginEvent, PhaseBeginEvent, PhaseEndEvent, PhaseKind, ReconcileEvent, TraceSink,
    };

    #[test]
    fn export_produces_valid_json() {
        let mut rec = RecorderSink::new();
        rec.on_cycle_begin(&CycleBeginEvent {
            cycle: 0,
            generation: 1,
            batch_len: 1,
            now: HostTime(1_000),
        });
        rec.on_phase_begin(&PhaseBeginEvent {
            cycle: 0,
            phase: PhaseKind::Scan,
            timestamp: HostTime(1_000),
        });
        rec.on_phase_end(&PhaseEndEvent {
            cycle: 0,
            phase: PhaseKind::Scan,
            timestamp: HostTime(9_000),
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();

        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert_eq!(parsed.len(), 3);

        assert_eq!(parsed[0]["ph"], "i");
        assert_eq!(parsed[0]["name"], "CycleBegin");

        assert_eq!(parsed[1]["ph"], "B");
        assert_eq!(parsed[1]["name"], "scan");

        assert_eq!(parsed[2]["ph"], "E");
        assert_eq!(parsed[2]["ts"], 9_000.0);
    }

    #[test]
    fn reconcile_adds_a_counter_at_the_last_timestamp() {
        let mut rec = RecorderSink::new();
        rec.on_phase_end(&PhaseEndEvent {
            cycle: 2,
            phase: PhaseKind::Reconcile,
            timestamp: HostTime(4_200),
        });
        rec.on_reconcile(&ReconcileEvent {
            cycle: 2,
            results: 3,
            added: 3,
            updated: 0,
            removed: 0,
            total: 3,
        });

        let mut out = Vec::new();
        export(rec.as_bytes(), &mut out).unwrap();
        let parsed: Vec<Value> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed.len(), 3);
        assert_eq!(parsed[1]["name"], "Reconcile");
        assert_eq!(parsed[2]["ph"], "C");
        assert_eq!(parsed[2]["ts"], 4_200.0);
        assert_eq!(parsed[2]["args"]["total"], 3);
    }

    #[test]
    fn export_empty_recording() {
        let mut out = Vec::new();
        export(&[], &mut out).unwrap();
        let json_str = String::from_utf8(out).unwrap();
        let parsed: Vec<Value> = serde_json::from_str(&json_str).unwrap();
        assert!(parsed.is_empty());
    }
}
