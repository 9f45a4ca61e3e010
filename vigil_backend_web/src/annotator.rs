// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The public enable/disable surface.
//!
//! [`Annotator`] owns an [`Engine`] and, while enabled, a session made of a
//! [`WebObserver`], a [`TaskQueue`], and a [`RepositionLoop`]:
//!
//! ```text
//!   MutationObserver ──► Engine::on_mutations ──► TaskQueue::add_multiple
//!                                                        │ (throttled)
//!                                                        ▼
//!   MarkerPresenter ◄── Engine::finish ◄── axe.run ◄── Engine::begin
//!         ▲
//!         └── RepositionLoop (every frame)
//! ```
//!
//! The engine is never borrowed across the scanner's await, so `disable` can
//! run while a scan is in flight; that scan's result is then discarded.

use alloc::boxed::Box;
use alloc::rc::Rc;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use core::cell::RefCell;

use hashbrown::HashSet;
use js_sys::Array;
use wasm_bindgen::JsValue;
use web_sys::{MutationObserver, console};

use vigil_core::config::Config;
use vigil_core::engine::{Cycle, Engine, Scanner};
use vigil_core::error::{ConfigError, EngineError};
use vigil_core::trace::Tracer;

use crate::console::ConsoleSink;
use crate::dom::{NodeRef, WebDom};
use crate::observer::{self, WebObserver};
use crate::presenter::MarkerPresenter;
use crate::raf::RepositionLoop;
use crate::scanner::AxeScanner;
use crate::task_queue::{TaskQueue, WorkerFuture};

struct State {
    name: String,
    engine: Engine<NodeRef>,
    dom: Rc<WebDom>,
    presenter: MarkerPresenter,
    scanner: AxeScanner,
    sink: ConsoleSink,
}

struct Session {
    queue: TaskQueue<NodeRef>,
    observer: WebObserver,
    reposition: RepositionLoop,
}

/// Live accessibility annotations for one document.
pub struct Annotator {
    state: Rc<RefCell<State>>,
    session: Option<Session>,
}

impl core::fmt::Debug for Annotator {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Annotator")
            .field("name", &state.name)
            .field("enabled", &self.session.is_some())
            .field("annotations", &state.engine.store().len())
            .finish_non_exhaustive()
    }
}

impl Annotator {
    /// Validates `config` and creates a disabled annotator.
    ///
    /// Nodes named in `config` must come from `dom`.
    pub fn new(dom: Rc<WebDom>, config: Config<NodeRef>) -> Result<Self, ConfigError> {
        let name = config.name.clone();
        let engine = Engine::new(config)?;
        let state = State {
            engine,
            presenter: MarkerPresenter::new(&name, Rc::clone(&dom)),
            scanner: AxeScanner::new(Rc::clone(&dom)),
            sink: ConsoleSink::new(&name, false),
            dom,
            name,
        };
        Ok(Self {
            state: Rc::new(RefCell::new(state)),
            session: None,
        })
    }

    /// Turns debug logging of every cycle on or off.
    pub fn set_verbose(&mut self, verbose: bool) {
        let mut state = self.state.borrow_mut();
        state.sink = ConsoleSink::new(&state.name, verbose);
    }

    /// Returns `true` while enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.session.is_some()
    }

    /// Returns the number of annotated elements.
    #[must_use]
    pub fn annotations(&self) -> usize {
        self.state.borrow().engine.store().len()
    }

    /// Starts observing the document and schedules a full scan.
    ///
    /// No-op if already enabled.
    pub fn enable(&mut self) -> Result<(), JsValue> {
        if self.session.is_some() {
            return Ok(());
        }
        match self.start_session() {
            Ok(session) => {
                self.session = Some(session);
                Ok(())
            }
            Err(err) => {
                let mut state = self.state.borrow_mut();
                let State {
                    engine, presenter, ..
                } = &mut *state;
                engine.disable(presenter);
                Err(err)
            }
        }
    }

    /// Stops observing, cancels pending scans, and removes every annotation.
    ///
    /// A scan already running finishes in the background and its result is
    /// dropped.
    pub fn disable(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        session.observer.disconnect();
        let _ = session.observer.take_records();
        session.queue.dispose();
        session.reposition.stop();
        drop(session);

        let mut state = self.state.borrow_mut();
        let State {
            engine, presenter, ..
        } = &mut *state;
        engine.disable(presenter);
    }

    fn start_session(&self) -> Result<Session, JsValue> {
        let (enabled, throttle, dom) = {
            let mut state = self.state.borrow_mut();
            let State { engine, dom, .. } = &mut *state;
            (engine.enable(&**dom), engine.throttle_config(), Rc::clone(dom))
        };

        let worker_state = Rc::clone(&self.state);
        let queue = TaskQueue::new(throttle, move |batch| -> WorkerFuture<NodeRef> {
            Box::pin(run_batch(Rc::clone(&worker_state), batch))
        });

        let observer_state = Rc::clone(&self.state);
        let observer_queue = queue.clone();
        let observer = WebObserver::new(move |records, observer| {
            on_mutations(&observer_state, &observer_queue, &records, &observer);
        })?;
        let document = dom
            .node(enabled.observation.target)
            .ok_or_else(|| JsValue::from_str("the document is not registered"))?;
        observer.observe(&document, &enabled.observation.options)?;

        let reposition_state = Rc::clone(&self.state);
        let reposition = RepositionLoop::new(move |_| {
            let mut state = reposition_state.borrow_mut();
            let State {
                engine, presenter, ..
            } = &mut *state;
            presenter.reposition(engine.store());
        });
        reposition.start();

        queue.add(enabled.dirty);
        Ok(Session {
            queue,
            observer,
            reposition,
        })
    }
}

impl Drop for Annotator {
    fn drop(&mut self) {
        self.disable();
    }
}

fn on_mutations(
    state: &RefCell<State>,
    queue: &TaskQueue<NodeRef>,
    records: &Array,
    native: &MutationObserver,
) {
    let (outcome, dom) = {
        let mut state = state.borrow_mut();
        let State { engine, dom, .. } = &mut *state;
        let records = dom.convert_records(records);
        (engine.on_mutations(records, &**dom), Rc::clone(dom))
    };
    for root in &outcome.new_roots {
        if let Some(node) = dom.node(root.target)
            && let Err(err) = observer::observe(native, &node, &root.options)
        {
            console::warn_2(&JsValue::from_str("could not observe a shadow root:"), &err);
        }
    }
    queue.add_multiple(outcome.dirty);
}

/// One throttled batch: begin, scan without holding the state, finish.
///
/// Returns the nodes to queue again.
async fn run_batch(state: Rc<RefCell<State>>, batch: Vec<NodeRef>) -> Result<Vec<NodeRef>, JsValue> {
    let mut clock = crate::now;
    let (job, mut scanner) = {
        let mut state = state.borrow_mut();
        let State {
            engine,
            dom,
            scanner,
            sink,
            ..
        } = &mut *state;
        let mut tracer = Tracer::new(sink);
        match engine
            .begin(batch, &**dom, &mut clock, &mut tracer)
            .map_err(engine_error)?
        {
            Cycle::Skip { requeue, .. } => return Ok(requeue),
            Cycle::Scan(job) => (job, scanner.clone()),
        }
    };

    let outcome = scanner.scan(job.request()).await;

    let mut state = state.borrow_mut();
    let State {
        engine,
        dom,
        presenter,
        sink,
        ..
    } = &mut *state;
    let mut tracer = Tracer::new(sink);
    engine
        .finish(job, outcome, &**dom, presenter, &mut clock, &mut tracer)
        .map_err(engine_error)?;

    dom.prune(&retained_handles(engine));
    Ok(Vec::new())
}

/// Handles the engine may still hand back to the DOM: annotated elements,
/// observed roots, and nodes named by the configured context.
fn retained_handles(engine: &Engine<NodeRef>) -> HashSet<NodeRef> {
    engine
        .store()
        .iter()
        .map(|entry| entry.element)
        .chain(engine.observed_roots().iter().copied())
        .chain(engine.context_nodes())
        .collect()
}

fn engine_error(err: EngineError) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use vigil_core::context::{ContextItem, ContextSpec};

    use super::*;

    #[test]
    fn configured_context_nodes_survive_pruning() {
        let config = Config {
            context: ContextSpec::IncludeExclude {
                include: Some(vec![ContextItem::Node(NodeRef(4))]),
                exclude: vec![ContextItem::Nodes(vec![NodeRef(7), NodeRef(9)])],
            },
            ..Config::default()
        };
        let engine = Engine::new(config).unwrap();
        let retained = retained_handles(&engine);
        assert_eq!(retained.len(), 3);
        for handle in [NodeRef(4), NodeRef(7), NodeRef(9)] {
            assert!(retained.contains(&handle), "{handle:?}");
        }
    }

    #[test]
    fn document_context_retains_nothing_before_enable() {
        let engine = Engine::<NodeRef>::new(Config::default()).unwrap();
        assert!(retained_handles(&engine).is_empty());
    }
}
