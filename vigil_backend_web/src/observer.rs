// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `MutationObserver` wiring.

use alloc::boxed::Box;

use js_sys::Array;
use wasm_bindgen::JsCast as _;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::prelude::*;
use web_sys::{MutationObserver, MutationObserverInit, Node};

use vigil_core::watch::ObserveOptions;

type ObserverClosure = Closure<dyn FnMut(Array, MutationObserver)>;

/// Owns a `MutationObserver` and the closure it calls.
///
/// The callback receives the raw record array and the observer itself, so it
/// can start observing newly discovered shadow roots. Dropping the
/// `WebObserver` disconnects it.
pub struct WebObserver {
    observer: MutationObserver,
    _closure: ObserverClosure,
}

impl core::fmt::Debug for WebObserver {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("WebObserver").finish_non_exhaustive()
    }
}

impl WebObserver {
    /// Creates an observer that observes nothing yet.
    pub fn new(
        callback: impl FnMut(Array, MutationObserver) + 'static,
    ) -> Result<Self, JsValue> {
        let closure: ObserverClosure =
            Closure::wrap(Box::new(callback) as Box<dyn FnMut(Array, MutationObserver)>);
        let observer = MutationObserver::new(closure.as_ref().unchecked_ref())?;
        Ok(Self {
            observer,
            _closure: closure,
        })
    }

    /// Starts observing `target`.
    pub fn observe(&self, target: &Node, options: &ObserveOptions) -> Result<(), JsValue> {
        observe(&self.observer, target, options)
    }

    /// Drains records the browser has queued but not yet delivered.
    #[must_use]
    pub fn take_records(&self) -> Array {
        self.observer.take_records()
    }

    /// Stops observing every target.
    pub fn disconnect(&self) {
        self.observer.disconnect();
    }
}

impl Drop for WebObserver {
    fn drop(&mut self) {
        self.observer.disconnect();
    }
}

/// Starts observing `target` on any observer, including the one handed to a
/// callback.
pub(crate) fn observe(
    observer: &MutationObserver,
    target: &Node,
    options: &ObserveOptions,
) -> Result<(), JsValue> {
    observer.observe_with_options(target, &observer_init(options))
}

fn observer_init(options: &ObserveOptions) -> MutationObserverInit {
    let init = MutationObserverInit::new();
    init.set_child_list(options.child_list);
    init.set_subtree(options.subtree);
    init.set_attributes(options.attributes);
    init.set_character_data(options.character_data);
    if let Some(filter) = &options.attribute_filter {
        let names: Array = filter.iter().map(|name| JsValue::from_str(name)).collect();
        init.set_attribute_filter(&names);
    }
    init
}
