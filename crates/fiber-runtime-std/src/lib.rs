//! Standard runtime services backed by Rust's `std` library.
//!
//! This crate provides concrete implementations of the platform
//! abstraction traits defined in `fiber-core`. Hosts construct a
//! [`StdRuntime`], hand its [`Runtime`] to a [`fiber_core::Reconciler`] and
//! call [`StdRuntime::run_idle_callback`] whenever their event loop is idle.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use std::time::{Duration, Instant};

use fiber_core::{
    FiberError, IdleDeadline, Reconciler, RenderTarget, Runtime, RuntimeHandle, RuntimeScheduler,
    WorkStatus,
};

/// Budget handed to each idle callback when the host does not pick one.
pub const DEFAULT_IDLE_BUDGET: Duration = Duration::from_millis(16);

type Waker = Arc<dyn Fn() + Send + Sync + 'static>;

/// Scheduler that records idle callback requests with atomics.
pub struct StdScheduler {
    idle_requested: AtomicBool,
    idle_waker: RwLock<Option<Waker>>,
}

impl StdScheduler {
    pub fn new() -> Self {
        Self {
            idle_requested: AtomicBool::new(false),
            idle_waker: RwLock::new(None),
        }
    }

    /// Returns whether an idle callback has been requested since the last call.
    pub fn take_idle_request(&self) -> bool {
        self.idle_requested.swap(false, Ordering::SeqCst)
    }

    /// Registers a waker that will be invoked whenever an idle callback is requested.
    pub fn set_idle_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        *self
            .idle_waker
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(Arc::new(waker));
    }

    pub fn clear_idle_waker(&self) {
        *self
            .idle_waker
            .write()
            .unwrap_or_else(PoisonError::into_inner) = None;
    }

    fn wake(&self) {
        let waker = self
            .idle_waker
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(waker) = waker {
            waker();
        }
    }
}

impl Default for StdScheduler {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for StdScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdScheduler")
            .field("idle_requested", &self.idle_requested.load(Ordering::SeqCst))
            .finish()
    }
}

impl RuntimeScheduler for StdScheduler {
    fn request_idle_callback(&self) {
        self.idle_requested.store(true, Ordering::SeqCst);
        self.wake();
    }
}

/// Wall-clock deadline measured from the moment it was created.
#[derive(Clone, Copy, Debug)]
pub struct StdIdleDeadline {
    started: Instant,
    budget: Duration,
}

impl StdIdleDeadline {
    pub fn new(budget: Duration) -> Self {
        Self {
            started: Instant::now(),
            budget,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }
}

impl IdleDeadline for StdIdleDeadline {
    fn time_remaining(&self) -> Duration {
        self.budget.saturating_sub(self.started.elapsed())
    }
}

/// Convenience container bundling the standard scheduler with a runtime.
#[derive(Clone)]
pub struct StdRuntime {
    scheduler: Arc<StdScheduler>,
    runtime: Runtime,
    budget: Duration,
}

impl StdRuntime {
    pub fn new() -> Self {
        Self::with_budget(DEFAULT_IDLE_BUDGET)
    }

    /// Creates a runtime whose idle callbacks each get `budget` of work time.
    pub fn with_budget(budget: Duration) -> Self {
        let scheduler = Arc::new(StdScheduler::default());
        let runtime = Runtime::new(scheduler.clone());
        Self {
            scheduler,
            runtime,
            budget,
        }
    }

    /// Returns a [`fiber_core::Runtime`] configured with the standard scheduler.
    pub fn runtime(&self) -> Runtime {
        self.runtime.clone()
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn scheduler(&self) -> Arc<StdScheduler> {
        Arc::clone(&self.scheduler)
    }

    pub fn budget(&self) -> Duration {
        self.budget
    }

    pub fn take_idle_request(&self) -> bool {
        self.scheduler.take_idle_request()
    }

    pub fn set_idle_waker(&self, waker: impl Fn() + Send + Sync + 'static) {
        self.scheduler.set_idle_waker(waker);
    }

    pub fn clear_idle_waker(&self) {
        self.scheduler.clear_idle_waker();
    }

    /// Runs one idle callback if one was requested.
    ///
    /// Returns `Ok(None)` when nothing asked for idle time.
    pub fn run_idle_callback<T: RenderTarget>(
        &self,
        reconciler: &mut Reconciler<T>,
    ) -> Result<Option<WorkStatus>, FiberError> {
        if !self.take_idle_request() {
            return Ok(None);
        }
        let deadline = StdIdleDeadline::new(self.budget);
        let status = reconciler.perform_idle_work(&deadline)?;
        log::trace!("idle callback finished in {:?}: {status:?}", deadline.elapsed());
        Ok(Some(status))
    }

    /// Keeps running idle callbacks until the reconciler has nothing left to
    /// do. Returns the number of commits performed.
    pub fn run_until_idle<T: RenderTarget>(
        &self,
        reconciler: &mut Reconciler<T>,
    ) -> Result<usize, FiberError> {
        let mut commits = 0;
        while reconciler.has_pending_work() {
            // The reconciler re-arms after every invocation, so a request is
            // always present while work remains.
            self.scheduler.request_idle_callback();
            if let Some(WorkStatus::Committed(_)) = self.run_idle_callback(reconciler)? {
                commits += 1;
            }
        }
        Ok(commits)
    }
}

impl fmt::Debug for StdRuntime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StdRuntime")
            .field("scheduler", &self.scheduler)
            .field("budget", &self.budget)
            .finish()
    }
}

impl Default for StdRuntime {
    fn default() -> Self {
        Self::new()
    }
}
