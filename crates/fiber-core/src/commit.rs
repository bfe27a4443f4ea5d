//! The commit phase.
//!
//! Runs to completion in one go once the work loop has visited the whole
//! work-in-progress tree. Pending deletions are applied first, then every
//! fiber below the root is placed or updated in pre-order. Both walks are
//! iterative, so tree depth is bounded only by the arena.

use crate::error::FiberError;
use crate::fiber::{EffectTag, FiberId};
use crate::scheduler::Reconciler;
use crate::target::RenderTarget;

/// What one commit did to the render target.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CommitReport {
    pub placements: usize,
    pub updates: usize,
    pub deletions: usize,
    /// Render-target nodes attached under a parent.
    pub attached: usize,
    /// Render-target nodes detached from their parent and released.
    pub detached: usize,
}

impl CommitReport {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

impl<T: RenderTarget> Reconciler<T> {
    pub(crate) fn commit_root(&mut self) -> Result<CommitReport, FiberError> {
        let Some(root) = self.wip_root else {
            return Ok(CommitReport::default());
        };
        let mut report = CommitReport::default();

        // Kept until the commit succeeds so an aborted commit can untag them.
        for id in self.deletions.clone() {
            self.commit_deletion(id, &mut report)?;
            report.deletions += 1;
        }

        let mut cursor = self.tree.get(root)?.child;
        while let Some(id) = cursor {
            self.commit_work(id, &mut report)?;
            cursor = self.tree.next_in_subtree(id, root)?;
        }

        self.finish_commit(root);
        log::debug!(
            "committed {} placements, {} updates, {} deletions ({} nodes attached, {} detached)",
            report.placements,
            report.updates,
            report.deletions,
            report.attached,
            report.detached
        );
        Ok(report)
    }

    fn commit_work(&mut self, id: FiberId, report: &mut CommitReport) -> Result<(), FiberError> {
        let fiber = self.tree.get(id)?;
        match fiber.effect {
            Some(EffectTag::Placement) => {
                report.placements += 1;
                if let Some(handle) = fiber.handle {
                    let parent = self.tree.host_parent(id)?;
                    self.target.attach(parent, handle)?;
                    report.attached += 1;
                }
            }
            Some(EffectTag::Update) => {
                report.updates += 1;
                let alternate = fiber
                    .alternate
                    .ok_or(FiberError::UpdateWithoutAlternate { fiber: id })?;
                if let Some(handle) = fiber.handle {
                    let old = self.tree.get(alternate)?.element.clone();
                    let new = fiber.element.clone();
                    self.target
                        .apply_attribute_diff(handle, old.attributes(), new.attributes())?;
                }
            }
            Some(EffectTag::Deletion) | None => {}
        }
        Ok(())
    }

    /// Detaches the nodes owned by `id`: its own, or those of the nearest
    /// host descendants when `id` is a component.
    fn commit_deletion(
        &mut self,
        id: FiberId,
        report: &mut CommitReport,
    ) -> Result<(), FiberError> {
        let parent = self.tree.host_parent(id)?;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let fiber = self.tree.get(current)?;
            if let Some(handle) = fiber.handle {
                self.target.detach(parent, handle)?;
                self.target.release(handle)?;
                report.detached += 1;
                continue;
            }
            let children: Vec<FiberId> = self.tree.children(current).collect();
            if children.is_empty() {
                return Err(FiberError::EmptyDeletion { fiber: current });
            }
            stack.extend(children.into_iter().rev());
        }
        Ok(())
    }

    /// Promotes the work-in-progress tree and frees the one it replaces.
    fn finish_commit(&mut self, root: FiberId) {
        for id in self.tree.subtree(root) {
            if let Ok(fiber) = self.tree.get_mut(id) {
                fiber.alternate = None;
                fiber.effect = None;
            }
        }
        if let Some(previous) = self.committed_root.replace(root) {
            let freed = self.tree.remove_subtree(previous);
            log::trace!("freed {freed} fibers of the previous tree");
        }
        self.wip_root = None;
        self.deletions.clear();
    }
}

#[cfg(test)]
#[path = "tests/commit_tests.rs"]
mod tests;
