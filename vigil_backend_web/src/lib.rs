// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Browser backend for vigil.
//!
//! This crate connects [`vigil_core`] to browser APIs:
//!
//! - [`WebDom`]: [`DomTree`](vigil_core::dom::DomTree) over live DOM nodes,
//!   handing out [`NodeRef`] handles
//! - [`WebObserver`]: `MutationObserver` wiring
//! - [`AxeScanner`]: [`Scanner`](vigil_core::engine::Scanner) backed by
//!   axe-core's `axe.run`
//! - [`TaskQueue`]: `setTimeout`-driven throttled queue with an async worker
//! - [`MarkerPresenter`]: one trigger element per annotation
//! - [`RepositionLoop`]: `requestAnimationFrame` loop keeping triggers over
//!   their elements
//! - [`ConsoleSink`]: trace events to the browser console
//! - [`Annotator`]: all of the above behind `enable`/`disable`

// This crate only does useful work in the browser; suppress dead-code
// warnings when cargo-checking on a native host target.
#![no_std]
#![cfg_attr(
    not(target_arch = "wasm32"),
    allow(dead_code, reason = "this crate only runs in the browser")
)]

extern crate alloc;

mod annotator;
mod console;
mod dom;
mod observer;
mod presenter;
mod raf;
mod scanner;
mod task_queue;

pub use annotator::Annotator;
pub use console::ConsoleSink;
pub use dom::{NodeRef, WebDom};
pub use observer::WebObserver;
pub use presenter::MarkerPresenter;
pub use raf::RepositionLoop;
pub use scanner::AxeScanner;
pub use task_queue::{TaskQueue, WorkerFuture};
pub use vigil_core::annotation::AnnotationPresenter;

use vigil_core::time::{Duration, HostTime};

/// Returns the current host time from `performance.now()`.
#[must_use]
pub fn now() -> HostTime {
    host_time_from_millis(raf::performance_now())
}

/// Converts a `DOMHighResTimeStamp` (milliseconds) to microsecond ticks.
pub(crate) fn host_time_from_millis(ms: f64) -> HostTime {
    #[expect(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        reason = "browser timestamps are small positive f64; µs fits in u64"
    )]
    let us = (ms.max(0.0) * 1000.0) as u64;
    HostTime(us)
}

/// Converts a duration to the millisecond delay `setTimeout` expects.
pub(crate) fn timeout_millis(delay: Duration) -> f64 {
    delay.as_millis_f64()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timestamps_convert_to_microseconds() {
        assert_eq!(host_time_from_millis(16.5), HostTime(16_500));
        assert_eq!(host_time_from_millis(-3.0), HostTime(0));
    }

    #[test]
    fn delays_convert_to_milliseconds() {
        assert!((timeout_millis(Duration(1_500)) - 1.5).abs() < f64::EPSILON);
        assert!(timeout_millis(Duration::ZERO).abs() < f64::EPSILON);
    }
}
