// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Trace events to the browser console.

use alloc::format;
use alloc::string::String;

use wasm_bindgen::JsValue;
use web_sys::console;

use vigil_core::trace::{
    CycleSkippedEvent, CycleSummary, InternalErrorEvent, ResultDiscardedEvent, ScanFailedEvent,
    TraceSink,
};

/// A [`TraceSink`] writing to `console.debug`, `console.warn`, and
/// `console.error`.
///
/// Cycle summaries and skips are debug output and only written when
/// `verbose` is set. Scanner failures are warnings; internal errors are
/// errors and always include the report URL.
#[derive(Clone, Debug)]
pub struct ConsoleSink {
    prefix: String,
    verbose: bool,
}

impl ConsoleSink {
    /// Creates a sink whose lines start with `[name]`.
    #[must_use]
    pub fn new(name: &str, verbose: bool) -> Self {
        Self {
            prefix: format!("[{name}]"),
            verbose,
        }
    }

    fn debug(&self, line: &str) {
        if self.verbose {
            console::debug_1(&JsValue::from_str(&format!("{} {line}", self.prefix)));
        }
    }
}

impl TraceSink for ConsoleSink {
    fn on_cycle_skipped(&mut self, e: &CycleSkippedEvent) {
        self.debug(&format!("cycle {} skipped: {}", e.cycle, e.reason.as_str()));
    }

    fn on_result_discarded(&mut self, e: &ResultDiscardedEvent) {
        self.debug(&format!(
            "cycle {} discarded (generation {} != {})",
            e.cycle, e.job_generation, e.current_generation
        ));
    }

    fn on_scan_failed(&mut self, e: &ScanFailedEvent<'_>) {
        console::warn_1(&JsValue::from_str(&format!(
            "{} scan failed in cycle {}: {}",
            self.prefix, e.cycle, e.message
        )));
    }

    fn on_cycle_summary(&mut self, s: &CycleSummary) {
        self.debug(&summary_line(s));
    }

    fn on_internal_error(&mut self, e: &InternalErrorEvent<'_>) {
        console::error_1(&JsValue::from_str(&format!(
            "{} {} Please report this at {}",
            self.prefix, e.message, e.report_url
        )));
    }
}

fn summary_line(s: &CycleSummary) -> String {
    format!(
        "cycle {}: {} element(s) with issues, +{} ~{} -{}; scan {:.1} ms, update {:.1} ms",
        s.cycle,
        s.results,
        s.added,
        s.updated,
        s.removed,
        ms(s.scan_ticks),
        ms(s.reconcile_ticks),
    )
}

fn ms(ticks: u64) -> f64 {
    vigil_core::time::Duration(ticks).as_millis_f64()
}
