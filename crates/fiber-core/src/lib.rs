#![doc = r"Incremental fiber reconciliation engine: element descriptors, a resumable work loop, an atomic commit phase and per-component hook state."]

pub mod collections;
pub mod commit;
pub mod element;
pub mod error;
pub mod fiber;
pub mod hooks;
pub mod memory;
pub mod platform;
pub mod reconcile;
pub mod runtime;
pub mod scheduler;
pub mod target;

pub use commit::CommitReport;
pub use element::{
    attributes, create_element, leaf, text, AttrValue, Attributes, Child, Component, Element,
    ElementKind, Event, Listener, Props, TEXT_ELEMENT, TEXT_VALUE,
};
pub use error::{FiberError, NodeError};
pub use fiber::{EffectTag, Fiber, FiberId, FiberTree};
pub use hooks::{try_use_state, use_state, SetState};
pub use memory::{MemoryNode, MemoryOp, MemoryRenderTarget};
pub use platform::{IdleDeadline, RuntimeScheduler};
pub use runtime::{DefaultScheduler, Runtime, RuntimeHandle};
pub use scheduler::{Reconciler, ReconcilerConfig, WorkStatus, ROOT_KIND};
pub use target::{diff_attributes, AttributeChange, RenderTarget};

#[cfg(test)]
pub use runtime::TestScheduler;

/// Opaque handle to a node owned by a [`RenderTarget`].
pub type NodeId = usize;
