// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `requestAnimationFrame` loop for keeping annotation triggers in place.
//!
//! Elements move when the page scrolls, resizes, or re-lays out, and none of
//! that shows up as a DOM mutation. [`RepositionLoop`] calls its callback once
//! per frame with the frame's [`HostTime`], so the presenter can re-read
//! element positions. The callback only reads the annotation store; when it
//! races with a cycle, the later write wins.

use alloc::boxed::Box;
use alloc::rc::Rc;
use core::cell::{Cell, RefCell};

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use vigil_core::time::HostTime;

// Direct global bindings instead of `web_sys::Window` methods, so nothing
// has to fetch (and unwrap) the Window or Performance objects per frame.
#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = performance, js_name = "now")]
    pub(crate) fn performance_now() -> f64;

    #[wasm_bindgen(js_name = "requestAnimationFrame")]
    fn request_animation_frame(callback: &JsValue) -> i32;

    #[wasm_bindgen(js_name = "cancelAnimationFrame")]
    fn cancel_animation_frame(id: i32);
}

/// A `requestAnimationFrame` loop.
///
/// Create with [`RepositionLoop::new`], then call [`start`](Self::start).
/// The loop re-registers itself each frame until [`stop`](Self::stop) is
/// called or the loop is dropped.
pub struct RepositionLoop {
    inner: Rc<RafInner>,
}

type RafClosure = Closure<dyn FnMut(f64)>;

struct RafInner {
    /// Registered with `requestAnimationFrame`; kept apart from `callback`
    /// so it can re-register itself while the callback is borrowed.
    closure: RefCell<Option<RafClosure>>,
    callback: RefCell<Box<dyn FnMut(HostTime)>>,
    frames: Cell<u64>,
    running: Cell<bool>,
    raf_id: Cell<i32>,
}

impl RepositionLoop {
    /// Creates a loop that is **not yet running**.
    pub fn new(callback: impl FnMut(HostTime) + 'static) -> Self {
        Self {
            inner: Rc::new(RafInner {
                closure: RefCell::new(None),
                callback: RefCell::new(Box::new(callback)),
                frames: Cell::new(0),
                running: Cell::new(false),
                raf_id: Cell::new(0),
            }),
        }
    }

    /// Starts the loop. No-op if already running.
    pub fn start(&self) {
        if self.inner.running.get() {
            return;
        }
        self.inner.running.set(true);

        let inner = Rc::clone(&self.inner);
        let closure = Closure::wrap(Box::new(move |timestamp_ms: f64| {
            if !inner.running.get() {
                return;
            }
            inner.frames.set(inner.frames.get() + 1);
            inner.callback.borrow_mut()(crate::host_time_from_millis(timestamp_ms));

            if inner.running.get()
                && let Some(ref closure) = *inner.closure.borrow()
            {
                let id = request_animation_frame(closure.as_ref().unchecked_ref());
                inner.raf_id.set(id);
            }
        }) as Box<dyn FnMut(f64)>);

        let id = request_animation_frame(closure.as_ref().unchecked_ref());
        self.inner.raf_id.set(id);
        *self.inner.closure.borrow_mut() = Some(closure);
    }

    /// Stops the loop and cancels the pending frame. Can be restarted.
    pub fn stop(&self) {
        if !self.inner.running.get() {
            return;
        }
        self.inner.running.set(false);
        cancel_animation_frame(self.inner.raf_id.get());
    }

    /// Returns `true` if the loop is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.running.get()
    }

    /// Returns how many frames have run.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.inner.frames.get()
    }
}

impl Drop for RepositionLoop {
    fn drop(&mut self) {
        self.stop();
        // The closure holds an `Rc` to `inner`; drop it to break the cycle.
        self.inner.closure.borrow_mut().take();
    }
}

impl core::fmt::Debug for RepositionLoop {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RepositionLoop")
            .field("running", &self.inner.running.get())
            .field("frames", &self.inner.frames.get())
            .finish()
    }
}
