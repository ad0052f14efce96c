//! Progress tracking across the two independently-progressing phases.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Which progress counter a work item contributes to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Main archive, libraries, natives, logging config.
    Core,
    /// Content-addressed asset objects.
    Resource,
}

impl Phase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Phase::Core => "core",
            Phase::Resource => "resource",
        }
    }
}

/// Progress reporter trait for download runs.
/// Implementations forward updates to the UI/notification system.
pub trait ProgressReporter: Send + Sync {
    /// Called exactly once per finished work item (downloaded, already
    /// present, or failed) with the running completed/total counts for its
    /// phase. Calls are serialized per phase, so the completed counts arrive
    /// in increasing order.
    fn on_file_complete(&self, file_name: &str, completed: usize, total: usize, phase: Phase);

    /// Denominator for a phase, established once before any of its items run.
    /// For the resource phase this arrives only after the asset index is
    /// parsed.
    fn on_phase_total(&self, _phase: Phase, _total: usize) {}

    /// Check if the run has been cancelled. Observed at the next suspension
    /// point: before each new attempt and between streamed chunks.
    fn is_cancelled(&self) -> bool {
        false
    }
}

/// A progress reporter that does nothing (silent).
/// Useful for background verification or tests.
pub struct SilentProgressReporter;

impl ProgressReporter for SilentProgressReporter {
    fn on_file_complete(&self, _file_name: &str, _completed: usize, _total: usize, _phase: Phase) {}
}

struct PhaseCounter {
    completed: Mutex<usize>,
    total: AtomicUsize,
}

impl PhaseCounter {
    fn new() -> Self {
        Self {
            completed: Mutex::new(0),
            total: AtomicUsize::new(0),
        }
    }
}

/// Thread-safe monotonic counters, one per phase. Counts never decrease and
/// never exceed the total set for the phase; a fresh aggregator is created
/// for every orchestration run.
pub struct ProgressAggregator {
    core: PhaseCounter,
    resource: PhaseCounter,
    reporter: Arc<dyn ProgressReporter>,
}

impl ProgressAggregator {
    pub fn new(reporter: Arc<dyn ProgressReporter>) -> Self {
        Self {
            core: PhaseCounter::new(),
            resource: PhaseCounter::new(),
            reporter,
        }
    }

    fn counter(&self, phase: Phase) -> &PhaseCounter {
        match phase {
            Phase::Core => &self.core,
            Phase::Resource => &self.resource,
        }
    }

    pub fn set_total(&self, phase: Phase, total: usize) {
        self.counter(phase).total.store(total, Ordering::SeqCst);
        self.reporter.on_phase_total(phase, total);
    }

    /// Record one terminal work-item outcome and notify the reporter.
    /// The callback runs under the phase lock so reported counts never go
    /// backwards from the caller's point of view.
    pub fn record(&self, phase: Phase, file_name: &str) {
        let counter = self.counter(phase);
        let mut completed = counter.completed.lock().unwrap();
        *completed += 1;
        let total = counter.total.load(Ordering::SeqCst);
        debug_assert!(
            *completed <= total,
            "completed {} > total {}",
            *completed,
            total
        );

        self.reporter
            .on_file_complete(file_name, *completed, total, phase);
    }

    pub fn completed(&self, phase: Phase) -> usize {
        *self.counter(phase).completed.lock().unwrap()
    }

    pub fn total(&self, phase: Phase) -> usize {
        self.counter(phase).total.load(Ordering::SeqCst)
    }

    pub fn reporter(&self) -> &dyn ProgressReporter {
        self.reporter.as_ref()
    }

    pub fn is_cancelled(&self) -> bool {
        self.reporter.is_cancelled()
    }
}
