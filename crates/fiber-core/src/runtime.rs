use std::cell::Cell;
use std::fmt;
use std::rc::{Rc, Weak};
use std::sync::Arc;

use crate::platform::RuntimeScheduler;

struct RuntimeInner {
    scheduler: Arc<dyn RuntimeScheduler>,
    rerender_requested: Cell<bool>,
}

impl RuntimeInner {
    fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            scheduler,
            rerender_requested: Cell::new(false),
        }
    }

    fn request_rerender(&self) {
        self.rerender_requested.set(true);
        self.scheduler.request_idle_callback();
    }
}

/// Shared state between the reconciler and the state setters it hands out.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

impl Runtime {
    pub fn new(scheduler: Arc<dyn RuntimeScheduler>) -> Self {
        Self {
            inner: Rc::new(RuntimeInner::new(scheduler)),
        }
    }

    pub fn handle(&self) -> RuntimeHandle {
        RuntimeHandle(Rc::downgrade(&self.inner))
    }

    pub fn request_idle_callback(&self) {
        self.inner.scheduler.request_idle_callback();
    }

    pub fn has_pending_rerender(&self) -> bool {
        self.inner.rerender_requested.get()
    }

    pub(crate) fn take_rerender_request(&self) -> bool {
        self.inner.rerender_requested.replace(false)
    }
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("rerender_requested", &self.inner.rerender_requested.get())
            .finish()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new(Arc::new(DefaultScheduler))
    }
}

#[derive(Default)]
pub struct DefaultScheduler;

impl RuntimeScheduler for DefaultScheduler {
    fn request_idle_callback(&self) {}
}

#[cfg(test)]
#[derive(Default)]
pub struct TestScheduler {
    requests: std::sync::atomic::AtomicUsize,
}

#[cfg(test)]
impl TestScheduler {
    pub fn requests(&self) -> usize {
        self.requests.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(test)]
impl RuntimeScheduler for TestScheduler {
    fn request_idle_callback(&self) {
        self.requests
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
    }
}

/// Weak handle held by state setters. Outlives the runtime harmlessly.
#[derive(Clone)]
pub struct RuntimeHandle(Weak<RuntimeInner>);

impl RuntimeHandle {
    /// Ask for a new render pass rooted at the last committed tree.
    pub fn request_rerender(&self) {
        if let Some(inner) = self.0.upgrade() {
            inner.request_rerender();
        } else {
            log::debug!("re-render requested after the runtime was dropped");
        }
    }

    pub fn has_pending_rerender(&self) -> bool {
        self.0
            .upgrade()
            .map(|inner| inner.rerender_requested.get())
            .unwrap_or(false)
    }
}

impl fmt::Debug for RuntimeHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RuntimeHandle")
            .field(&self.0.strong_count())
            .finish()
    }
}
