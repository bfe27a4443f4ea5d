use std::cell::Cell;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use fiber_core::{
    EffectTag, Element, ElementKind, Event, FiberError, IdleDeadline, MemoryRenderTarget, NodeError,
    NodeId, Reconciler, ReconcilerConfig, Runtime, RuntimeScheduler, WorkStatus,
};

/// Scheduler that only counts idle callback requests.
#[derive(Debug, Default)]
pub struct CountingScheduler {
    requests: AtomicUsize,
}

impl CountingScheduler {
    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl RuntimeScheduler for CountingScheduler {
    fn request_idle_callback(&self) {
        self.requests.fetch_add(1, Ordering::SeqCst);
    }
}

/// Deadline that allows a fixed number of units of work per idle callback.
///
/// The work loop always performs at least one unit before consulting the
/// deadline, so a budget of zero behaves like a budget of one.
#[derive(Debug)]
pub struct StepBudget {
    steps: Cell<usize>,
}

impl StepBudget {
    pub fn new(steps: usize) -> Self {
        Self {
            steps: Cell::new(steps),
        }
    }
}

impl IdleDeadline for StepBudget {
    fn time_remaining(&self) -> Duration {
        let steps = self.steps.get();
        if steps > 1 {
            self.steps.set(steps - 1);
            Duration::MAX
        } else {
            Duration::ZERO
        }
    }
}

/// Deadline that never runs out.
#[derive(Clone, Copy, Debug, Default)]
pub struct Unbounded;

impl IdleDeadline for Unbounded {
    fn time_remaining(&self) -> Duration {
        Duration::MAX
    }
}

/// Headless harness for exercising the reconciler in tests.
///
/// Owns a [`MemoryRenderTarget`] with a `root` container and a reconciler
/// rendering into it, and exposes helpers for driving idle callbacks and
/// dispatching events without a real host.
pub struct FiberTestRule {
    reconciler: Reconciler<MemoryRenderTarget>,
    scheduler: Arc<CountingScheduler>,
    container: NodeId,
}

impl FiberTestRule {
    pub fn new() -> Self {
        Self::with_config(ReconcilerConfig::default())
    }

    pub fn with_config(config: ReconcilerConfig) -> Self {
        let scheduler = Arc::new(CountingScheduler::default());
        let mut target = MemoryRenderTarget::new();
        let container = target.create_root("root");
        let reconciler = Reconciler::with_config(target, Runtime::new(scheduler.clone()), config);
        Self {
            reconciler,
            scheduler,
            container,
        }
    }

    /// Schedules a render of `content` without performing any work.
    pub fn render(&mut self, content: Element) {
        self.reconciler.render(content, self.container);
    }

    /// Renders `content` and drives the reconciler until it is idle.
    pub fn set_content(&mut self, content: Element) -> Result<usize, FiberError> {
        self.render(content);
        self.pump_until_idle()
    }

    /// Runs one idle callback that may perform at most `units` units of work.
    pub fn step(&mut self, units: usize) -> Result<WorkStatus, FiberError> {
        self.reconciler.perform_idle_work(&StepBudget::new(units))
    }

    /// Runs idle callbacks until no pass is in flight and no re-render is
    /// pending. Returns the number of commits.
    pub fn pump_until_idle(&mut self) -> Result<usize, FiberError> {
        let mut commits = 0;
        while self.reconciler.has_pending_work() {
            if let WorkStatus::Committed(_) = self.reconciler.perform_idle_work(&Unbounded)? {
                commits += 1;
            }
        }
        Ok(commits)
    }

    /// Dispatches `event` to the first node of `kind` below the container.
    pub fn dispatch(&self, kind: &str, event: &Event) -> Result<bool, NodeError> {
        let Some(node) = self.target().find_by_kind(self.container, kind) else {
            return Ok(false);
        };
        self.target().dispatch(node, event)
    }

    pub fn find(&self, kind: &str) -> Option<NodeId> {
        self.target().find_by_kind(self.container, kind)
    }

    pub fn text(&self) -> String {
        self.target().text_content(self.container)
    }

    pub fn dump(&self) -> String {
        self.target().dump_tree(self.container)
    }

    /// Effect tags of the pass in flight, in commit order.
    pub fn pending_effects(&self) -> Vec<(ElementKind, EffectTag)> {
        self.reconciler.pending_effects()
    }

    pub fn idle_requests(&self) -> usize {
        self.scheduler.requests()
    }

    pub fn container(&self) -> NodeId {
        self.container
    }

    pub fn target(&self) -> &MemoryRenderTarget {
        self.reconciler.target()
    }

    pub fn target_mut(&mut self) -> &mut MemoryRenderTarget {
        self.reconciler.target_mut()
    }

    pub fn reconciler(&mut self) -> &mut Reconciler<MemoryRenderTarget> {
        &mut self.reconciler
    }
}

impl Default for FiberTestRule {
    fn default() -> Self {
        Self::new()
    }
}
