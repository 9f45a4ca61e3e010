// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Annotation triggers.
//!
//! Translates [`AnnotationStore`] state into one `{name}-trigger` element per
//! annotation, all inside a fixed-position `{name}-container` appended to
//! `<body>`. Both names are reserved, so the engine ignores the mutations
//! this presenter makes.

use alloc::format;
use alloc::rc::Rc;
use alloc::string::String;

use hashbrown::HashMap;
use kurbo::Rect;
use wasm_bindgen::JsCast as _;
use web_sys::HtmlElement;

use vigil_core::annotation::{
    AnnotationChanges, AnnotationId, AnnotationPresenter, AnnotationStore,
};
use vigil_core::issue::Issue;

use crate::dom::{NodeRef, WebDom};

/// Trigger edge length in CSS pixels.
const TRIGGER_SIZE: f64 = 16.0;

struct Trigger {
    element: HtmlElement,
    /// Last known bounds of the annotated element, in viewport coordinates.
    bounds: Option<Rect>,
}

/// Keeps one trigger element per annotation.
///
/// The per-annotation side table is keyed by [`AnnotationId`], so a trigger
/// survives issue updates and is created and removed exactly once.
pub struct MarkerPresenter {
    name: String,
    dom: Rc<WebDom>,
    container: Option<HtmlElement>,
    triggers: HashMap<AnnotationId, Trigger>,
}

impl core::fmt::Debug for MarkerPresenter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("MarkerPresenter")
            .field("name", &self.name)
            .field("container", &self.container.is_some())
            .field("triggers", &self.triggers.len())
            .finish_non_exhaustive()
    }
}

impl MarkerPresenter {
    /// Creates a presenter whose elements are named after `name`.
    #[must_use]
    pub fn new(name: &str, dom: Rc<WebDom>) -> Self {
        Self {
            name: name.into(),
            dom,
            container: None,
            triggers: HashMap::new(),
        }
    }

    /// Returns the number of live triggers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    /// Returns `true` if there are no triggers.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// Returns the last measured bounds of an annotated element.
    #[must_use]
    pub fn position(&self, id: AnnotationId) -> Option<Rect> {
        self.triggers.get(&id).and_then(|t| t.bounds)
    }

    /// Re-measures every annotated element and moves triggers that changed.
    ///
    /// Returns how many triggers moved.
    pub fn reposition(&mut self, store: &AnnotationStore<NodeRef>) -> usize {
        let mut moved = 0;
        for entry in store.iter() {
            let Some(trigger) = self.triggers.get_mut(&entry.id) else {
                continue;
            };
            let bounds = element_bounds(&self.dom, entry.element);
            if bounds != trigger.bounds {
                trigger.bounds = bounds;
                place(&trigger.element, bounds);
                moved += 1;
            }
        }
        moved
    }

    fn container(&mut self) -> Option<HtmlElement> {
        if let Some(container) = &self.container {
            return Some(container.clone());
        }
        let document = self.dom.html_document();
        let container: HtmlElement = document
            .create_element(&format!("{}-container", self.name))
            .ok()?
            .dyn_into()
            .ok()?;
        let s = container.style();
        let _ = s.set_property("position", "fixed");
        let _ = s.set_property("left", "0");
        let _ = s.set_property("top", "0");
        let _ = s.set_property("width", "0");
        let _ = s.set_property("height", "0");
        let _ = s.set_property("z-index", "2147483647");
        document.body()?.append_child(&container).ok()?;
        self.container = Some(container.clone());
        Some(container)
    }

    fn create_trigger(&mut self, element: NodeRef, issues: &[Issue]) -> Option<Trigger> {
        let container = self.container()?;
        let trigger: HtmlElement = self
            .dom
            .html_document()
            .create_element(&format!("{}-trigger", self.name))
            .ok()?
            .dyn_into()
            .ok()?;
        let s = trigger.style();
        let _ = s.set_property("position", "absolute");
        let _ = s.set_property("width", &format!("{TRIGGER_SIZE}px"));
        let _ = s.set_property("height", &format!("{TRIGGER_SIZE}px"));
        let _ = s.set_property("border-radius", "50%");
        let _ = s.set_property("background", "#d32f2f");
        label(&trigger, issues);
        let bounds = element_bounds(&self.dom, element);
        place(&trigger, bounds);
        container.append_child(&trigger).ok()?;
        Some(Trigger {
            element: trigger,
            bounds,
        })
    }
}

impl AnnotationPresenter<NodeRef> for MarkerPresenter {
    fn apply(&mut self, store: &AnnotationStore<NodeRef>, changes: &AnnotationChanges<NodeRef>) {
        // 1. Removals
        for removed in &changes.removed {
            if let Some(trigger) = self.triggers.remove(&removed.id) {
                trigger.element.remove();
            }
        }

        // 2. Additions
        for &id in &changes.added {
            let Some(entry) = store.get(id) else {
                continue;
            };
            if let Some(trigger) = self.create_trigger(entry.element, &entry.issues) {
                self.triggers.insert(id, trigger);
            }
        }

        // 3. Issue updates
        for id in &changes.updated {
            if let (Some(trigger), Some(entry)) = (self.triggers.get(id), store.get(*id)) {
                label(&trigger.element, &entry.issues);
            }
        }

        if self.triggers.is_empty()
            && let Some(container) = self.container.take()
        {
            container.remove();
        }
    }
}

fn label(trigger: &HtmlElement, issues: &[Issue]) {
    let text = trigger_label(issues);
    let _ = trigger.set_attribute("role", "img");
    let _ = trigger.set_attribute("aria-label", &text);
    trigger.set_title(&text);
}

fn place(trigger: &HtmlElement, bounds: Option<Rect>) {
    let s = trigger.style();
    match bounds.and_then(trigger_origin) {
        Some((x, y)) => {
            let _ = s.remove_property("display");
            let _ = s.set_property("left", &format!("{x}px"));
            let _ = s.set_property("top", &format!("{y}px"));
        }
        None => {
            let _ = s.set_property("display", "none");
        }
    }
}

fn element_bounds(dom: &WebDom, element: NodeRef) -> Option<Rect> {
    let rect = dom.element(element)?.get_bounding_client_rect();
    Some(Rect::from_origin_size(
        (rect.x(), rect.y()),
        (rect.width(), rect.height()),
    ))
}

/// Where a trigger goes for an element with the given bounds: centered on
/// the top-right corner. Elements without area get no trigger.
fn trigger_origin(bounds: Rect) -> Option<(f64, f64)> {
    if bounds.is_zero_area() {
        return None;
    }
    let half = TRIGGER_SIZE / 2.0;
    Some((bounds.x1 - half, bounds.y0 - half))
}

/// Accessible label listing every issue title.
fn trigger_label(issues: &[Issue]) -> String {
    let mut text = match issues.len() {
        1 => String::from("1 accessibility issue: "),
        n => format!("{n} accessibility issues: "),
    };
    for (i, issue) in issues.iter().enumerate() {
        if i > 0 {
            text.push_str("; ");
        }
        text.push_str(&issue.title);
    }
    text
}
