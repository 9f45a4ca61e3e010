// Copyright 2026 the Vigil Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Scan-cycle orchestration.
//!
//! [`Engine`] ties the pieces together. The host feeds it native mutation
//! records, queues the dirty nodes it returns in a
//! [`ThrottleQueue`](crate::queue::ThrottleQueue), and for every batch the
//! queue releases runs one cycle:
//!
//! ```text
//!   batch ──► begin ──► ScanJob ──► Scanner::scan ──► finish ──► CycleOutcome
//!               │                                      │
//!               ├─ resolve ScanContext                 ├─ transform
//!               └─ build ScanRequest                   ├─ reconcile AnnotationStore
//!                                                      └─ AnnotationPresenter::apply
//! ```
//!
//! `begin` and `finish` are split so a host can await the scanner without
//! borrowing the engine across the await. [`Engine::run_cycle`] sequences
//! them for hosts that can.
//!
//! Each [`enable`](Engine::enable) and [`disable`](Engine::disable) bumps a
//! generation counter. A job started under an older generation, or finished
//! while the engine is disabled, is discarded without touching the store.

use alloc::string::ToString;
use alloc::vec::Vec;
use core::future::Future;
use core::hash::Hash;

use crate::annotation::{AnnotationChanges, AnnotationPresenter, AnnotationStore};
use crate::config::{Config, RuleSetting, RunOnly, ScanOptions};
use crate::context::{ScanContext, normalize, resolve};
use crate::dom::DomTree;
use crate::error::{ConfigError, EngineError, REPORT_URL, ScanError};
use crate::issue::ElementWithIssues;
use crate::queue::ThrottleConfig;
use crate::time::{Clock, Duration, HostTime};
use crate::trace::{
    CycleBeginEvent, CycleSkippedEvent, CycleSummaryBuilder, InternalErrorEvent, PhaseBeginEvent,
    PhaseEndEvent, PhaseKind, ReconcileEvent, ResultDiscardedEvent, ScanContextEvent,
    ScanFailedEvent, Tracer,
};
use crate::violation::{RuleViolation, transform};
use crate::watch::{MutationRecord, Observation, ShadowWatcher};

/// Result types requested from the scanner.
pub const RESULT_TYPES: &[&str] = &["violations"];

/// Why a cycle ended without scanning.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The engine is disabled; the batch is dropped.
    Disabled,
    /// A previous scan is still in flight; the batch is handed back.
    Busy,
    /// No dirty node touches the configured context.
    EmptyContext,
}

impl SkipReason {
    /// Short lowercase name, for log lines.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::Busy => "busy",
            Self::EmptyContext => "empty-context",
        }
    }
}

/// Everything the scanner needs for one run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScanRequest<N> {
    /// Which subtrees to scan.
    pub context: ScanContext<N>,
    /// Per-rule overrides.
    pub rules: Vec<RuleSetting>,
    /// Rule or tag restriction.
    pub run_only: Option<RunOnly>,
    /// Results must reference live elements.
    pub element_ref: bool,
    /// Nested browsing contexts are not scanned.
    pub iframes: bool,
    /// Assets are not preloaded.
    pub preload: bool,
    /// Always [`RESULT_TYPES`].
    pub result_types: &'static [&'static str],
}

impl<N> ScanRequest<N> {
    /// Builds a request with the fixed flags and the user's rule options.
    #[must_use]
    pub fn new(context: ScanContext<N>, options: &ScanOptions) -> Self {
        Self {
            context,
            rules: options.rules.clone(),
            run_only: options.run_only.clone(),
            element_ref: true,
            iframes: false,
            preload: false,
            result_types: RESULT_TYPES,
        }
    }
}

/// An accessibility checker.
pub trait Scanner<N> {
    /// Scans the subtrees named by `request`.
    fn scan(
        &mut self,
        request: &ScanRequest<N>,
    ) -> impl Future<Output = Result<Vec<RuleViolation<N>>, ScanError>>;
}

/// A scan that has been started and must be handed back to
/// [`Engine::finish`].
#[derive(Debug)]
#[must_use = "a started scan must be finished, or the engine stays busy"]
pub struct ScanJob<N> {
    cycle: u64,
    generation: u64,
    started: HostTime,
    resolved: HostTime,
    request: ScanRequest<N>,
}

impl<N> ScanJob<N> {
    /// Returns the cycle number.
    pub fn cycle(&self) -> u64 {
        self.cycle
    }

    /// Returns the generation the job was started under.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns what to hand the scanner.
    pub fn request(&self) -> &ScanRequest<N> {
        &self.request
    }
}

/// What [`Engine::begin`] decided.
#[derive(Debug)]
pub enum Cycle<N> {
    /// Nothing to scan.
    Skip {
        /// Why.
        reason: SkipReason,
        /// Nodes the host should queue again. Only non-empty for
        /// [`SkipReason::Busy`].
        requeue: Vec<N>,
    },
    /// Run the scanner, then call [`Engine::finish`].
    Scan(ScanJob<N>),
}

/// Time spent blocking the page in one cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleMetrics {
    /// From the end of context resolution until the scanner settled.
    pub scan: Duration,
    /// Transforming, reconciling, and presenting.
    pub reconcile: Duration,
}

impl CycleMetrics {
    /// Scan plus reconcile time.
    #[must_use]
    pub fn total_blocking(&self) -> Duration {
        self.scan.saturating_add(self.reconcile)
    }
}

/// A cycle that reached reconciliation.
#[derive(Clone, Debug)]
pub struct CycleReport<N> {
    /// Cycle number.
    pub cycle: u64,
    /// What was scanned.
    pub context: ScanContext<N>,
    /// Transformed scanner results.
    pub results: Vec<ElementWithIssues<N>>,
    /// What changed in the store.
    pub changes: AnnotationChanges<N>,
    /// Timing.
    pub metrics: CycleMetrics,
}

/// How a cycle ended.
#[derive(Clone, Debug)]
pub enum CycleOutcome<N> {
    /// [`Engine::begin`] skipped the cycle.
    Skipped {
        /// Why.
        reason: SkipReason,
        /// Nodes to queue again.
        requeue: Vec<N>,
    },
    /// The engine was disabled or re-enabled while scanning.
    Discarded,
    /// The scanner failed; annotations are unchanged.
    ScanFailed(ScanError),
    /// Results were merged into the store.
    Reconciled(CycleReport<N>),
}

/// Nodes to queue and shadow roots to observe after a mutation batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MutationOutcome<N> {
    /// Nodes needing a re-scan.
    pub dirty: Vec<N>,
    /// Newly discovered shadow roots the host must start observing.
    pub new_roots: Vec<Observation<N>>,
}

impl<N> Default for MutationOutcome<N> {
    fn default() -> Self {
        Self {
            dirty: Vec::new(),
            new_roots: Vec::new(),
        }
    }
}

/// What the host must do after [`Engine::enable`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Enabled<N> {
    /// Start observing the document with these options.
    pub observation: Observation<N>,
    /// Queue this node so the first cycle scans the whole context.
    pub dirty: N,
}

/// The live-checking engine.
#[derive(Debug)]
pub struct Engine<N> {
    config: Config<N>,
    watcher: ShadowWatcher<N>,
    store: AnnotationStore<N>,
    enabled: bool,
    scanning: bool,
    generation: u64,
    cycles: u64,
}

impl<N> Engine<N>
where
    N: Copy + Eq + Hash,
{
    /// Validates `config` and creates a disabled engine.
    pub fn new(config: Config<N>) -> Result<Self, ConfigError> {
        config.validate()?;
        let watcher = ShadowWatcher::from(config.name.as_str());
        Ok(Self {
            config,
            watcher,
            store: AnnotationStore::new(),
            enabled: false,
            scanning: false,
            generation: 0,
            cycles: 0,
        })
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &Config<N> {
        &self.config
    }

    /// Returns the current annotations.
    #[must_use]
    pub fn store(&self) -> &AnnotationStore<N> {
        &self.store
    }

    /// Returns queue delays derived from the throttle setting.
    #[must_use]
    pub fn throttle_config(&self) -> ThrottleConfig {
        ThrottleConfig::from_throttle(self.config.throttle)
    }

    /// Returns `true` between [`enable`](Self::enable) and
    /// [`disable`](Self::disable).
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Returns `true` while a [`ScanJob`] is outstanding.
    #[must_use]
    pub fn is_scanning(&self) -> bool {
        self.scanning
    }

    /// Returns the enable generation.
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Returns every root the host should be observing.
    #[must_use]
    pub fn observed_roots(&self) -> &[N] {
        self.watcher.roots()
    }

    /// Returns the nodes the configured context names directly.
    ///
    /// Hosts that hand out node handles must keep these resolvable.
    pub fn context_nodes(&self) -> impl Iterator<Item = N> + '_ {
        self.config.context.nodes().copied()
    }

    /// Starts watching the document.
    pub fn enable<D>(&mut self, dom: &D) -> Enabled<N>
    where
        D: DomTree<Node = N>,
    {
        self.enabled = true;
        self.generation += 1;
        self.watcher.reset();
        let document = dom.document();
        Enabled {
            observation: self.watcher.observe(document),
            dirty: document,
        }
    }

    /// Stops watching and removes every annotation.
    ///
    /// The host must disconnect its observers and dispose its queue. A scan
    /// still in flight will be discarded when it finishes.
    pub fn disable<P>(&mut self, presenter: &mut P)
    where
        P: AnnotationPresenter<N>,
    {
        if !self.enabled {
            return;
        }
        self.enabled = false;
        self.generation += 1;
        self.watcher.reset();
        let changes = self.store.clear();
        if !changes.is_empty() {
            presenter.apply(&self.store, &changes);
        }
    }

    /// Filters a native mutation batch and maps it to dirty nodes.
    pub fn on_mutations<D>(&mut self, records: Vec<MutationRecord<N>>, dom: &D) -> MutationOutcome<N>
    where
        D: DomTree<Node = N>,
    {
        if !self.enabled {
            return MutationOutcome::default();
        }
        let batch = self.watcher.process(records, dom);
        MutationOutcome {
            dirty: self.watcher.dirty_nodes(&batch.records, dom),
            new_roots: batch.new_roots,
        }
    }

    /// Resolves the scan context for a batch of dirty nodes.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Selector`] if a configured context selector
    /// cannot be evaluated.
    pub fn begin<D, C>(
        &mut self,
        batch: Vec<N>,
        dom: &D,
        clock: &mut C,
        tracer: &mut Tracer<'_>,
    ) -> Result<Cycle<N>, EngineError>
    where
        D: DomTree<Node = N>,
        C: Clock,
    {
        let started = clock.now();
        self.cycles += 1;
        let cycle = self.cycles;
        tracer.cycle_begin(&CycleBeginEvent {
            cycle,
            generation: self.generation,
            batch_len: batch.len(),
            now: started,
        });

        if !self.enabled {
            return Ok(skip(cycle, SkipReason::Disabled, Vec::new(), started, tracer));
        }
        if self.scanning {
            return Ok(skip(cycle, SkipReason::Busy, batch, started, tracer));
        }

        tracer.phase_begin(&PhaseBeginEvent {
            cycle,
            phase: PhaseKind::Resolve,
            timestamp: started,
        });
        let normalized = normalize(&self.config.context, dom)?;
        let context = resolve(&batch, &normalized, dom);
        let resolved = clock.now();
        tracer.phase_end(&PhaseEndEvent {
            cycle,
            phase: PhaseKind::Resolve,
            timestamp: resolved,
        });
        tracer.scan_context(&ScanContextEvent {
            cycle,
            include: context.include.len(),
            exclude: context.exclude.len(),
        });

        if context.is_empty() {
            return Ok(skip(cycle, SkipReason::EmptyContext, Vec::new(), resolved, tracer));
        }

        self.scanning = true;
        tracer.phase_begin(&PhaseBeginEvent {
            cycle,
            phase: PhaseKind::Scan,
            timestamp: resolved,
        });
        Ok(Cycle::Scan(ScanJob {
            cycle,
            generation: self.generation,
            started,
            resolved,
            request: ScanRequest::new(context, &self.config.scan_options),
        }))
    }

    /// Merges the scanner's outcome for `job`.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Internal`] if reconciliation broke a store
    /// invariant. The error is also traced with [`REPORT_URL`].
    pub fn finish<D, P, C>(
        &mut self,
        job: ScanJob<N>,
        outcome: Result<Vec<RuleViolation<N>>, ScanError>,
        dom: &D,
        presenter: &mut P,
        clock: &mut C,
        tracer: &mut Tracer<'_>,
    ) -> Result<CycleOutcome<N>, EngineError>
    where
        D: DomTree<Node = N>,
        P: AnnotationPresenter<N>,
        C: Clock,
    {
        self.scanning = false;
        let scanned = clock.now();
        let ScanJob {
            cycle,
            generation,
            started,
            resolved,
            request,
        } = job;
        tracer.phase_end(&PhaseEndEvent {
            cycle,
            phase: PhaseKind::Scan,
            timestamp: scanned,
        });

        if !self.enabled || generation != self.generation {
            tracer.result_discarded(&ResultDiscardedEvent {
                cycle,
                job_generation: generation,
                current_generation: self.generation,
                enabled: self.enabled,
            });
            return Ok(CycleOutcome::Discarded);
        }

        let violations = match outcome {
            Ok(violations) => violations,
            Err(err) => {
                tracer.scan_failed(&ScanFailedEvent {
                    cycle,
                    message: err.message(),
                });
                return Ok(CycleOutcome::ScanFailed(err));
            }
        };

        tracer.phase_begin(&PhaseBeginEvent {
            cycle,
            phase: PhaseKind::Reconcile,
            timestamp: scanned,
        });
        let context = request.context;
        let results = transform(&violations);
        let changes = self.store.reconcile(dom, &context, &results);
        if let Err(err) = self.store.check_invariants() {
            let message = err.to_string();
            tracer.internal_error(&InternalErrorEvent {
                cycle,
                message: &message,
                report_url: REPORT_URL,
            });
            return Err(err);
        }
        if !changes.is_empty() {
            presenter.apply(&self.store, &changes);
        }
        let reconciled = clock.now();
        tracer.phase_end(&PhaseEndEvent {
            cycle,
            phase: PhaseKind::Reconcile,
            timestamp: reconciled,
        });
        tracer.reconcile(&ReconcileEvent {
            cycle,
            results: results.len(),
            added: changes.added.len(),
            updated: changes.updated.len(),
            removed: changes.removed.len(),
            total: self.store.len(),
        });

        let mut summary = CycleSummaryBuilder::new(cycle, started);
        summary.phase_begin(PhaseKind::Resolve, started);
        summary.phase_end(PhaseKind::Resolve, resolved);
        summary.phase_begin(PhaseKind::Scan, resolved);
        summary.phase_end(PhaseKind::Scan, scanned);
        summary.phase_begin(PhaseKind::Reconcile, scanned);
        summary.phase_end(PhaseKind::Reconcile, reconciled);
        summary.set_counts(
            results.len(),
            changes.added.len(),
            changes.updated.len(),
            changes.removed.len(),
        );
        tracer.cycle_summary(&summary.finish());

        Ok(CycleOutcome::Reconciled(CycleReport {
            cycle,
            context,
            results,
            changes,
            metrics: CycleMetrics {
                scan: scanned.saturating_duration_since(resolved),
                reconcile: reconciled.saturating_duration_since(scanned),
            },
        }))
    }

    /// Runs one whole cycle: [`begin`](Self::begin), the scanner, then
    /// [`finish`](Self::finish).
    ///
    /// The engine stays borrowed while the scanner runs, so the host cannot
    /// disable it mid-scan through this path.
    pub async fn run_cycle<D, S, P, C>(
        &mut self,
        batch: Vec<N>,
        scanner: &mut S,
        dom: &D,
        presenter: &mut P,
        clock: &mut C,
        tracer: &mut Tracer<'_>,
    ) -> Result<CycleOutcome<N>, EngineError>
    where
        D: DomTree<Node = N>,
        S: Scanner<N>,
        P: AnnotationPresenter<N>,
        C: Clock,
    {
        let job = match self.begin(batch, dom, clock, tracer)? {
            Cycle::Skip { reason, requeue } => {
                return Ok(CycleOutcome::Skipped { reason, requeue });
            }
            Cycle::Scan(job) => job,
        };
        let outcome = scanner.scan(job.request()).await;
        self.finish(job, outcome, dom, presenter, clock, tracer)
    }
}

fn skip<N>(
    cycle: u64,
    reason: SkipReason,
    requeue: Vec<N>,
    now: HostTime,
    tracer: &mut Tracer<'_>,
) -> Cycle<N> {
    tracer.cycle_skipped(&CycleSkippedEvent { cycle, reason, now });
    Cycle::Skip { reason, requeue }
}
