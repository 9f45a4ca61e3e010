// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `setTimeout`-driven throttled queue.
//!
//! [`TaskQueue`] drives a [`ThrottleQueue`] with browser timers: it arms a
//! `setTimeout` for the queue's next deadline, hands the released batch to an
//! async worker via `spawn_local`, and marks the run complete when the
//! worker's future settles. A worker error is logged to the console and the
//! queue keeps going.

use alloc::boxed::Box;
use alloc::rc::{Rc, Weak};
use alloc::vec::Vec;
use core::cell::{Cell, RefCell};
use core::future::Future;
use core::hash::Hash;
use core::pin::Pin;

use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;

use vigil_core::queue::{ThrottleConfig, ThrottleQueue};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_name = "setTimeout")]
    fn set_timeout(callback: &JsValue, millis: f64) -> i32;

    #[wasm_bindgen(js_name = "clearTimeout")]
    fn clear_timeout(id: i32);
}

/// What a worker returns: items to queue again, or an error to log.
pub type WorkerFuture<T> = Pin<Box<dyn Future<Output = Result<Vec<T>, JsValue>>>>;

/// A throttled queue that runs an async worker on each released batch.
///
/// Cloning yields another handle to the same queue.
pub struct TaskQueue<T>
where
    T: Copy + Eq + Hash + Ord + 'static,
{
    inner: Rc<QueueInner<T>>,
}

struct QueueInner<T>
where
    T: Copy + Eq + Hash + Ord + 'static,
{
    queue: RefCell<ThrottleQueue<T>>,
    worker: Box<dyn Fn(Vec<T>) -> WorkerFuture<T>>,
    timer: Cell<Option<i32>>,
    /// Holds only a weak handle back to this struct.
    closure: RefCell<Option<Closure<dyn FnMut()>>>,
}

impl<T> Clone for TaskQueue<T>
where
    T: Copy + Eq + Hash + Ord + 'static,
{
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T> core::fmt::Debug for TaskQueue<T>
where
    T: Copy + Eq + Hash + Ord + 'static,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let queue = self.inner.queue.borrow();
        f.debug_struct("TaskQueue")
            .field("pending", &queue.pending_len())
            .field("running", &queue.is_running())
            .field("disposed", &queue.is_disposed())
            .field("timer", &self.inner.timer.get())
            .finish_non_exhaustive()
    }
}

impl<T> TaskQueue<T>
where
    T: Copy + Eq + Hash + Ord + 'static,
{
    /// Creates an idle queue.
    pub fn new(
        config: ThrottleConfig,
        worker: impl Fn(Vec<T>) -> WorkerFuture<T> + 'static,
    ) -> Self {
        let inner = Rc::new(QueueInner {
            queue: RefCell::new(ThrottleQueue::new(config)),
            worker: Box::new(worker),
            timer: Cell::new(None),
            closure: RefCell::new(None),
        });
        let weak: Weak<QueueInner<T>> = Rc::downgrade(&inner);
        let closure = Closure::wrap(Box::new(move || {
            if let Some(inner) = weak.upgrade() {
                fire(&inner);
            }
        }) as Box<dyn FnMut()>);
        *inner.closure.borrow_mut() = Some(closure);
        Self { inner }
    }

    /// Queues one item.
    pub fn add(&self, item: T) {
        self.inner.queue.borrow_mut().add(item, crate::now());
        arm(&self.inner);
    }

    /// Queues every item.
    pub fn add_multiple(&self, items: impl IntoIterator<Item = T>) {
        self.inner
            .queue
            .borrow_mut()
            .add_multiple(items, crate::now());
        arm(&self.inner);
    }

    /// Stops scheduling and drops pending items. A running worker finishes.
    pub fn dispose(&self) {
        self.inner.queue.borrow_mut().dispose();
        cancel(&self.inner);
    }

    /// Returns `true` while the worker is running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.inner.queue.borrow().is_running()
    }

    /// Returns the number of distinct pending items.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        self.inner.queue.borrow().pending_len()
    }
}

impl<T> Drop for QueueInner<T>
where
    T: Copy + Eq + Hash + Ord + 'static,
{
    fn drop(&mut self) {
        // A timer firing into a dropped closure throws.
        cancel(self);
    }
}

fn cancel<T>(inner: &QueueInner<T>)
where
    T: Copy + Eq + Hash + Ord + 'static,
{
    if let Some(id) = inner.timer.take() {
        clear_timeout(id);
    }
}

/// Re-arms the browser timer for the queue's current deadline.
fn arm<T>(inner: &QueueInner<T>)
where
    T: Copy + Eq + Hash + Ord + 'static,
{
    cancel(inner);
    let Some(deadline) = inner.queue.borrow().next_deadline() else {
        return;
    };
    let delay = deadline.saturating_duration_since(crate::now());
    if let Some(closure) = &*inner.closure.borrow() {
        let id = set_timeout(closure.as_ref(), crate::timeout_millis(delay));
        inner.timer.set(Some(id));
    }
}

fn fire<T>(inner: &Rc<QueueInner<T>>)
where
    T: Copy + Eq + Hash + Ord + 'static,
{
    inner.timer.set(None);
    let batch = inner.queue.borrow_mut().poll(crate::now());
    let Some(batch) = batch else {
        // Timers can fire a little early; wait for the real deadline.
        arm(inner);
        return;
    };
    let work = (inner.worker)(batch);
    let inner = Rc::clone(inner);
    wasm_bindgen_futures::spawn_local(async move {
        let requeue = match work.await {
            Ok(requeue) => requeue,
            Err(err) => {
                web_sys::console::error_2(&JsValue::from_str("[vigil] worker failed:"), &err);
                Vec::new()
            }
        };
        {
            let now = crate::now();
            let mut queue = inner.queue.borrow_mut();
            queue.complete(now);
            queue.add_multiple(requeue, now);
        }
        arm(&inner);
    });
}
