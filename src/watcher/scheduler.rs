//! The poll loop.
//!
//! Each cycle moves through `Idle → Scanning → Triggering → Persisting →
//! Idle`: scan every mapped path, diff against the stored baseline, refresh
//! the libraries that changed, then persist the new baseline in one write.
//! An interrupted cycle never reaches the write, so the previous state stays
//! authoritative and the change is picked up again after restart.

use std::collections::BTreeMap;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use super::events::{SharedSink, WatchEvent};
use super::filter::IgnoreFilter;
use super::resolver::LibraryMapping;
use super::scanner::ChangeDetector;
use super::trigger::UpdateTrigger;
use crate::config::AdvancePolicy;
use crate::metrics;
use crate::remote::LibraryService;
use crate::storage::{PersistedState, Signature, StateStore};
use crate::Config;

/// Where the loop currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Scanning,
    Triggering,
    Persisting,
}

/// Outcome of one cycle.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CycleReport {
    /// 1-based cycle number.
    pub cycle: u64,
    /// Signatures computed this cycle.
    pub signatures: PersistedState,
    /// Paths whose signature passed the baseline.
    pub changed: Vec<String>,
    /// Section ids refreshed successfully.
    pub triggered: Vec<String>,
    /// Section ids whose refresh failed.
    pub failed: Vec<String>,
    /// Whether the new baseline reached disk.
    pub persisted: bool,
}

/// Drives scan, trigger and persist on a fixed interval.
pub struct Scheduler<S> {
    mapping: LibraryMapping,
    detector: ChangeDetector,
    trigger: UpdateTrigger<S>,
    store: StateStore,
    baseline: PersistedState,
    interval: Duration,
    policy: AdvancePolicy,
    phase: Phase,
    cycles: u64,
    events: SharedSink,
}

impl<S> std::fmt::Debug for Scheduler<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Scheduler")
            .field("mapping", &self.mapping)
            .field("store", &self.store)
            .field("interval", &self.interval)
            .field("policy", &self.policy)
            .field("phase", &self.phase)
            .field("cycles", &self.cycles)
            .finish_non_exhaustive()
    }
}

impl<S: LibraryService> Scheduler<S> {
    /// Create a scheduler.
    ///
    /// `baseline` is the state loaded at startup; it is only replaced by
    /// completed cycles.
    #[must_use]
    pub fn new(
        config: &Config,
        mapping: LibraryMapping,
        service: Arc<S>,
        store: StateStore,
        baseline: PersistedState,
        events: SharedSink,
    ) -> Self {
        let filter = IgnoreFilter::new(config.ignore_patterns.iter().cloned());
        metrics::LIBRARIES_WATCHED.set(i64::try_from(mapping.len()).unwrap_or(i64::MAX));

        Self {
            mapping,
            detector: ChangeDetector::new(filter, Arc::clone(&events)),
            trigger: UpdateTrigger::new(service, Arc::clone(&events)),
            store,
            baseline,
            interval: config.interval(),
            policy: config.advance_policy,
            phase: Phase::Idle,
            cycles: 0,
            events,
        }
    }

    /// Monitored paths and their libraries.
    #[must_use]
    pub const fn mapping(&self) -> &LibraryMapping {
        &self.mapping
    }

    /// Signatures the next cycle compares against.
    #[must_use]
    pub const fn baseline(&self) -> &PersistedState {
        &self.baseline
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> Phase {
        self.phase
    }

    /// Completed cycles.
    #[must_use]
    pub const fn cycles(&self) -> u64 {
        self.cycles
    }

    fn enter(&mut self, phase: Phase) {
        tracing::trace!(from = ?self.phase, to = ?phase, "Scheduler phase");
        self.phase = phase;
    }

    /// Run one scan, trigger, persist pass.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let cycle = self.cycles + 1;

        self.enter(Phase::Scanning);
        let mut current = PersistedState::new();
        let mut changed = Vec::new();
        for path in self.mapping.keys() {
            let started = Instant::now();
            let report = self.detector.scan_async(PathBuf::from(path)).await;
            metrics::SCAN_DURATION.observe(started.elapsed().as_secs_f64());

            let previous = self.baseline.get(path).copied().unwrap_or(Signature::ZERO);
            if report.signature > previous {
                self.events.emit(&WatchEvent::ChangeDetected {
                    path: path.clone(),
                    previous,
                    current: report.signature,
                });
                changed.push(path.clone());
            }
            current.insert(path.clone(), report.signature);
        }
        metrics::CHANGES_TOTAL.inc_by(changed.len() as u64);

        self.enter(Phase::Triggering);
        // Several paths can back one library; refresh it once.
        let mut outcomes: BTreeMap<String, bool> = BTreeMap::new();
        let mut triggered = Vec::new();
        let mut failed = Vec::new();
        for path in &changed {
            let Some(target) = self.mapping.get(path) else {
                continue;
            };
            if outcomes.contains_key(&target.id) {
                continue;
            }
            let ok = self.trigger.trigger(target).await.is_ok();
            outcomes.insert(target.id.clone(), ok);
            if ok {
                triggered.push(target.id.clone());
            } else {
                failed.push(target.id.clone());
            }
        }

        self.enter(Phase::Persisting);
        if self.policy == AdvancePolicy::OnSuccess {
            for path in &changed {
                let delivered = self
                    .mapping
                    .get(path)
                    .and_then(|t| outcomes.get(&t.id))
                    .copied()
                    .unwrap_or(false);
                if delivered {
                    continue;
                }
                match self.baseline.get(path) {
                    Some(previous) => current.insert(path.clone(), *previous),
                    None => current.remove(path),
                };
            }
        }

        let persisted = match self.store.save(&current) {
            Ok(()) => true,
            Err(e) => {
                metrics::STATE_SAVE_FAILURES.inc();
                self.events.emit(&WatchEvent::StateSaveFailed {
                    file: self.store.path().display().to_string(),
                    error: e.to_string(),
                });
                false
            }
        };
        self.baseline.clone_from(&current);

        self.cycles = cycle;
        self.enter(Phase::Idle);
        metrics::LAST_CYCLE_TIMESTAMP.set(chrono::Utc::now().timestamp());
        metrics::CYCLES_TOTAL.inc();

        self.events.emit(&WatchEvent::CycleCompleted {
            cycle,
            scanned: self.mapping.len(),
            changed: changed.len(),
            triggered: triggered.len(),
            failed: failed.len(),
            persisted,
        });

        CycleReport {
            cycle,
            signatures: current,
            changed,
            triggered,
            failed,
            persisted,
        }
    }

    /// Poll until `shutdown` resolves.
    ///
    /// The first cycle starts immediately. Shutdown may interrupt a cycle
    /// mid-way; the state file then still holds the previous baseline.
    pub async fn run<F>(&mut self, shutdown: F)
    where
        F: Future<Output = ()>,
    {
        tokio::pin!(shutdown);

        tracing::info!(
            libraries = self.mapping.len(),
            interval_secs = self.interval.as_secs(),
            "Monitoring libraries"
        );

        loop {
            tokio::select! {
                biased;
                () = &mut shutdown => break,
                _ = self.run_cycle() => {}
            }

            tokio::select! {
                biased;
                () = &mut shutdown => break,
                () = tokio::time::sleep(self.interval) => {}
            }
        }

        tracing::info!(cycles = self.cycles, "Stopped polling");
    }
}
