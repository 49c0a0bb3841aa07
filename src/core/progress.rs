// ─── Progress & Cancellation ───
// Shared counters for one installation run plus a cooperative cancel flag.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::core::error::{LauncherError, LauncherResult};

/// `(message, completed, total)`
pub type ProgressCallback = Arc<dyn Fn(&str, u64, u64) + Send + Sync>;

/// Logical phase a download is accounted against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Client jar, libraries, logging config.
    CoreFiles,
    /// Asset objects.
    Resources,
}

#[derive(Debug, Default)]
struct PhaseCounter {
    completed: AtomicU64,
    total: AtomicU64,
}

impl PhaseCounter {
    fn reset(&self) {
        self.completed.store(0, Ordering::SeqCst);
        self.total.store(0, Ordering::SeqCst);
    }

    fn snapshot(&self) -> (u64, u64) {
        (
            self.completed.load(Ordering::SeqCst),
            self.total.load(Ordering::SeqCst),
        )
    }
}

/// Progress store passed by reference to the downloader and installer.
///
/// Counter updates are atomic; callback emission is serialized so a consumer
/// always observes non-decreasing `completed` values within a phase.
#[derive(Default)]
pub struct ProgressTracker {
    core: PhaseCounter,
    resources: PhaseCounter,
    callback: Option<ProgressCallback>,
    emit: Mutex<()>,
}

impl fmt::Debug for ProgressTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgressTracker")
            .field("core", &self.core)
            .field("resources", &self.resources)
            .field("has_callback", &self.callback.is_some())
            .finish()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_callback(callback: ProgressCallback) -> Self {
        Self {
            callback: Some(callback),
            ..Self::default()
        }
    }

    fn counter(&self, phase: Phase) -> &PhaseCounter {
        match phase {
            Phase::CoreFiles => &self.core,
            Phase::Resources => &self.resources,
        }
    }

    /// Start of an installation run.
    pub fn reset(&self) {
        let _guard = self.emit.lock().unwrap_or_else(PoisonError::into_inner);
        self.core.reset();
        self.resources.reset();
    }

    pub fn add_total(&self, phase: Phase, count: u64) {
        self.counter(phase).total.fetch_add(count, Ordering::SeqCst);
    }

    /// Record one finished unit of work and notify the callback.
    pub fn complete(&self, phase: Phase, message: &str) -> u64 {
        let _guard = self.emit.lock().unwrap_or_else(PoisonError::into_inner);
        let counter = self.counter(phase);
        let completed = counter.completed.fetch_add(1, Ordering::SeqCst) + 1;
        let total = counter.total.load(Ordering::SeqCst);
        if let Some(callback) = &self.callback {
            callback(message, completed, total);
        }
        completed
    }

    /// `(completed, total)` for a phase.
    pub fn snapshot(&self, phase: Phase) -> (u64, u64) {
        self.counter(phase).snapshot()
    }

    /// Report processor progress on the same scale as the core-file downloads
    /// that preceded it.
    pub fn report_processor(&self, message: &str, done: u64, total: u64) {
        let _guard = self.emit.lock().unwrap_or_else(PoisonError::into_inner);
        let (downloaded, download_total) = self.core.snapshot();
        if let Some(callback) = &self.callback {
            callback(message, downloaded + done, download_total + total);
        }
    }
}

/// Cooperative cancellation flag polled between units of work.
///
/// Never interrupts an in-flight request; it only stops new work from
/// starting.
#[derive(Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
    probe: Option<Arc<dyn Fn() -> bool + Send + Sync>>,
}

impl fmt::Debug for CancellationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancellationToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// A token that additionally asks `probe` whether the caller gave up.
    pub fn from_probe(probe: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        Self {
            flag: Arc::default(),
            probe: Some(Arc::new(probe)),
        }
    }

    pub fn cancel(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.flag.load(Ordering::SeqCst) || self.probe.as_ref().is_some_and(|probe| probe())
    }

    pub fn check(&self) -> LauncherResult<()> {
        if self.is_cancelled() {
            Err(LauncherError::Cancelled)
        } else {
            Ok(())
        }
    }
}
