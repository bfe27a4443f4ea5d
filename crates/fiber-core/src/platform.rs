//! Platform abstraction traits for the fiber runtime.
//!
//! The reconciler never sleeps or polls on its own. Hosts hand it idle time
//! through these traits, which keeps the core independent of any particular
//! event loop.

use std::time::Duration;

/// Schedules idle-time work for the runtime.
///
/// Implementations must be safe to use from multiple threads, but the
/// callback they arrange must run on the thread that owns the reconciler.
pub trait RuntimeScheduler: Send + Sync {
    /// Request that the host invoke the reconciler's idle callback again.
    fn request_idle_callback(&self);
}

/// The budget handed to one idle callback invocation.
pub trait IdleDeadline {
    /// Time left before the host wants control back.
    fn time_remaining(&self) -> Duration;
}

impl IdleDeadline for Duration {
    fn time_remaining(&self) -> Duration {
        *self
    }
}
