//! The cooperative work loop.
//!
//! A [`Reconciler`] owns every piece of engine state: the fiber arena, the
//! cursor into the work-in-progress tree, the committed root and the
//! pending deletions. Hosts call [`Reconciler::perform_idle_work`] from
//! their idle callback; the loop expands one fiber per step, yields when the
//! deadline runs low, and commits once the whole tree has been visited.

use std::fmt;
use std::mem;
use std::time::Duration;

use crate::commit::CommitReport;
use crate::element::{create_element, Attributes, Component, Element, ElementKind};
use crate::error::FiberError;
use crate::fiber::{EffectTag, Fiber, FiberId, FiberTree};
use crate::hooks::render_with_hooks;
use crate::platform::IdleDeadline;
use crate::reconcile::reconcile_children;
use crate::runtime::{Runtime, RuntimeHandle};
use crate::target::RenderTarget;
use crate::NodeId;

/// Host kind of the synthetic root fiber.
pub const ROOT_KIND: &str = "ROOT";

#[derive(Clone, Debug)]
pub struct ReconcilerConfig {
    /// The loop yields once the deadline reports less time than this.
    pub yield_threshold: Duration,
    /// Release render-target nodes created by a pass that was abandoned
    /// before it committed. Off by default: such nodes are leaked.
    pub release_abandoned_nodes: bool,
}

impl Default for ReconcilerConfig {
    fn default() -> Self {
        Self {
            yield_threshold: Duration::from_millis(1),
            release_abandoned_nodes: false,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WorkStatus {
    /// Nothing was scheduled.
    Idle,
    /// The deadline ran out with fibers left to expand.
    Suspended,
    Committed(CommitReport),
}

pub struct Reconciler<T: RenderTarget> {
    pub(crate) tree: FiberTree,
    pub(crate) target: T,
    runtime: Runtime,
    config: ReconcilerConfig,
    container: Option<NodeId>,
    next_unit: Option<FiberId>,
    pub(crate) wip_root: Option<FiberId>,
    pub(crate) committed_root: Option<FiberId>,
    pub(crate) deletions: Vec<FiberId>,
}

impl<T: RenderTarget> Reconciler<T> {
    pub fn new(target: T, runtime: Runtime) -> Self {
        Self::with_config(target, runtime, ReconcilerConfig::default())
    }

    pub fn with_config(target: T, runtime: Runtime, config: ReconcilerConfig) -> Self {
        Self {
            tree: FiberTree::new(),
            target,
            runtime,
            config,
            container: None,
            next_unit: None,
            wip_root: None,
            committed_root: None,
            deletions: Vec::new(),
        }
    }

    /// Seeds a new pass rendering `element` into `container`.
    ///
    /// Any unfinished pass is abandoned. Work starts on the next idle
    /// callback.
    pub fn render(&mut self, element: Element, container: NodeId) {
        self.container = Some(container);
        let root = create_element(ROOT_KIND, Attributes::new(), [element]);
        self.begin_pass(root, container);
        self.runtime.request_idle_callback();
    }

    /// The idle callback body. Re-arms itself through the runtime's scheduler
    /// on every invocation, whether or not there was work.
    ///
    /// An error abandons the pass in flight. Errors raised while expanding
    /// fibers leave the render target and the committed tree untouched, so a
    /// later [`render`](Self::render) can recover. An error raised by the
    /// commit itself is different: target mutations applied before the
    /// failure stay applied while [`committed_root`](Self::committed_root)
    /// keeps describing the previous tree. Treat such an error as fatal for
    /// the render target and rebuild it from an empty container.
    pub fn perform_idle_work(
        &mut self,
        deadline: &dyn IdleDeadline,
    ) -> Result<WorkStatus, FiberError> {
        let result = self.work_loop(deadline);
        if let Err(err) = &result {
            log::error!("render pass aborted: {err}");
            self.abandon_pass();
        }
        self.runtime.request_idle_callback();
        result
    }

    fn work_loop(&mut self, deadline: &dyn IdleDeadline) -> Result<WorkStatus, FiberError> {
        self.apply_rerender_request();
        if self.next_unit.is_none() && self.wip_root.is_none() {
            return Ok(WorkStatus::Idle);
        }

        let mut steps = 0usize;
        while let Some(unit) = self.next_unit {
            self.next_unit = self.perform_unit_of_work(unit)?;
            steps += 1;
            self.apply_rerender_request();
            if self.next_unit.is_some() && deadline.time_remaining() < self.config.yield_threshold {
                log::debug!("yielding after {steps} units of work");
                return Ok(WorkStatus::Suspended);
            }
        }

        let report = self.commit_root()?;
        Ok(WorkStatus::Committed(report))
    }

    /// Expands `id` and returns the next fiber to visit.
    fn perform_unit_of_work(&mut self, id: FiberId) -> Result<Option<FiberId>, FiberError> {
        let kind = self.tree.get(id)?.kind().clone();
        log::trace!("performing unit of work for {kind} ({id:?})");
        match kind {
            ElementKind::Component(component) => self.update_function_component(id, &component)?,
            ElementKind::Host(name) => self.update_host_component(id, &name)?,
        }
        let root = self.wip_root.ok_or(FiberError::StaleFiber { fiber: id })?;
        self.tree.next_in_subtree(id, root)
    }

    fn update_function_component(
        &mut self,
        id: FiberId,
        component: &Component,
    ) -> Result<(), FiberError> {
        let fiber = self.tree.get(id)?;
        let element = fiber.element.clone();
        let previous = match fiber.alternate {
            Some(alternate) => self.tree.get(alternate)?.hooks.clone(),
            None => Vec::new(),
        };
        let (child, hooks) = render_with_hooks(id, previous, self.runtime.handle(), || {
            component.render(element.props())
        });
        self.tree.get_mut(id)?.hooks = hooks;
        reconcile_children(&mut self.tree, id, &[child], &mut self.deletions)
    }

    fn update_host_component(&mut self, id: FiberId, kind: &str) -> Result<(), FiberError> {
        let fiber = self.tree.get(id)?;
        let element = fiber.element.clone();
        if fiber.handle.is_none() {
            let handle = self.target.create_node(kind, element.attributes())?;
            self.tree.get_mut(id)?.handle = Some(handle);
        }
        reconcile_children(&mut self.tree, id, element.children(), &mut self.deletions)
    }

    fn begin_pass(&mut self, root: Element, container: NodeId) {
        if self.wip_root.is_some() {
            self.abandon_pass();
        }
        let wip_root = self
            .tree
            .insert(Fiber::root(root, container, self.committed_root));
        log::debug!("starting render pass at {wip_root:?}");
        self.wip_root = Some(wip_root);
        self.next_unit = Some(wip_root);
        self.deletions.clear();
    }

    /// Restarts from the last committed root if a state setter asked for it.
    fn apply_rerender_request(&mut self) {
        if !self.runtime.take_rerender_request() {
            return;
        }
        let Some(container) = self.container else {
            log::debug!("re-render requested before anything was rendered");
            return;
        };
        let root = match self.committed_root.and_then(|id| self.tree.get(id).ok()) {
            Some(committed) => committed.element.clone(),
            // Nothing committed yet: replay the pass in flight from scratch.
            None => match self.wip_root.and_then(|id| self.tree.get(id).ok()) {
                Some(wip) => wip.element.clone(),
                None => return,
            },
        };
        self.begin_pass(root, container);
    }

    /// Drops the work-in-progress tree without committing it.
    fn abandon_pass(&mut self) {
        let Some(wip_root) = self.wip_root.take() else {
            return;
        };
        self.next_unit = None;
        for id in mem::take(&mut self.deletions) {
            if let Ok(fiber) = self.tree.get_mut(id) {
                fiber.effect = None;
            }
        }

        let fibers = self.tree.subtree(wip_root);
        let mut orphaned = Vec::new();
        let mut handed_back = 0;
        for id in &fibers {
            let Ok(fiber) = self.tree.get(*id) else {
                continue;
            };
            if *id != wip_root && fiber.effect == Some(EffectTag::Placement) {
                orphaned.extend(fiber.handle);
            }
            // Setters returned by this pass queued onto its own records; the
            // committed records are the ones the restarted pass will read.
            if let Some(alternate) = fiber.alternate {
                if let Ok(committed) = self.tree.get(alternate) {
                    for (record, target) in fiber.hooks.iter().zip(&committed.hooks) {
                        handed_back += record.hand_back_actions(target);
                    }
                }
            }
        }
        self.tree.remove_subtree(wip_root);
        if handed_back > 0 {
            log::debug!("moved {handed_back} queued state actions back to the committed tree");
        }

        if self.config.release_abandoned_nodes {
            for handle in &orphaned {
                if let Err(err) = self.target.release(*handle) {
                    log::warn!("failed to release abandoned node {handle}: {err}");
                }
            }
        }
        log::debug!(
            "abandoned render pass: freed {} fibers, {} nodes {}",
            fibers.len(),
            orphaned.len(),
            if self.config.release_abandoned_nodes {
                "released"
            } else {
                "leaked"
            }
        );
    }

    pub fn runtime_handle(&self) -> RuntimeHandle {
        self.runtime.handle()
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }

    pub fn target(&self) -> &T {
        &self.target
    }

    pub fn target_mut(&mut self) -> &mut T {
        &mut self.target
    }

    pub fn tree(&self) -> &FiberTree {
        &self.tree
    }

    pub fn container(&self) -> Option<NodeId> {
        self.container
    }

    pub fn committed_root(&self) -> Option<FiberId> {
        self.committed_root
    }

    pub fn wip_root(&self) -> Option<FiberId> {
        self.wip_root
    }

    /// Whether a pass is in flight or a re-render has been requested.
    pub fn has_pending_work(&self) -> bool {
        self.wip_root.is_some() || self.runtime.has_pending_rerender()
    }

    /// Effect tags of the work-in-progress tree in visiting order, root
    /// excluded, followed by the pending deletions.
    pub fn pending_effects(&self) -> Vec<(ElementKind, EffectTag)> {
        let mut effects = Vec::new();
        if let Some(root) = self.wip_root {
            for id in self.tree.subtree(root).into_iter().skip(1) {
                if let Ok(fiber) = self.tree.get(id) {
                    if let Some(effect) = fiber.effect {
                        effects.push((fiber.kind().clone(), effect));
                    }
                }
            }
        }
        for id in &self.deletions {
            if let Ok(fiber) = self.tree.get(*id) {
                effects.push((fiber.kind().clone(), EffectTag::Deletion));
            }
        }
        effects
    }
}

impl<T: RenderTarget> fmt::Debug for Reconciler<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("fibers", &self.tree.len())
            .field("container", &self.container)
            .field("next_unit", &self.next_unit)
            .field("wip_root", &self.wip_root)
            .field("committed_root", &self.committed_root)
            .field("deletions", &self.deletions.len())
            .finish()
    }
}

#[cfg(test)]
#[path = "tests/scheduler_tests.rs"]
mod tests;
