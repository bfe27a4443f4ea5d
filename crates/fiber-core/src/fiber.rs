//! The fiber arena.
//!
//! Every logical node of the work-in-progress and committed trees is a
//! [`Fiber`] stored in a [`FiberTree`]. Links between fibers (`parent`,
//! `child`, `sibling`, `alternate`) are generational [`FiberId`]s, so a
//! freed fiber can never be reached through a dangling link.

use std::rc::Rc;

use slotmap::{new_key_type, SlotMap};

use crate::element::{Element, ElementKind, Props};
use crate::error::FiberError;
use crate::hooks::HookRecord;
use crate::NodeId;

new_key_type! {
    pub struct FiberId;
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EffectTag {
    Update,
    Placement,
    Deletion,
}

pub struct Fiber {
    pub(crate) element: Element,
    pub(crate) handle: Option<NodeId>,
    pub(crate) parent: Option<FiberId>,
    pub(crate) child: Option<FiberId>,
    pub(crate) sibling: Option<FiberId>,
    pub(crate) alternate: Option<FiberId>,
    pub(crate) effect: Option<EffectTag>,
    pub(crate) hooks: Vec<Rc<HookRecord>>,
}

impl Fiber {
    pub(crate) fn new(element: Element, parent: Option<FiberId>) -> Self {
        Self {
            element,
            handle: None,
            parent,
            child: None,
            sibling: None,
            alternate: None,
            effect: None,
            hooks: Vec::new(),
        }
    }

    /// The synthetic root wrapping the container node.
    pub(crate) fn root(element: Element, container: NodeId, alternate: Option<FiberId>) -> Self {
        Self {
            handle: Some(container),
            alternate,
            ..Self::new(element, None)
        }
    }

    pub fn kind(&self) -> &ElementKind {
        self.element.kind()
    }

    pub fn props(&self) -> &Props {
        self.element.props()
    }

    pub fn element(&self) -> &Element {
        &self.element
    }

    pub fn handle(&self) -> Option<NodeId> {
        self.handle
    }

    pub fn parent(&self) -> Option<FiberId> {
        self.parent
    }

    pub fn child(&self) -> Option<FiberId> {
        self.child
    }

    pub fn sibling(&self) -> Option<FiberId> {
        self.sibling
    }

    pub fn alternate(&self) -> Option<FiberId> {
        self.alternate
    }

    pub fn effect(&self) -> Option<EffectTag> {
        self.effect
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }
}

#[derive(Default)]
pub struct FiberTree {
    fibers: SlotMap<FiberId, Fiber>,
}

impl FiberTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fibers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fibers.is_empty()
    }

    pub fn contains(&self, id: FiberId) -> bool {
        self.fibers.contains_key(id)
    }

    pub(crate) fn insert(&mut self, fiber: Fiber) -> FiberId {
        self.fibers.insert(fiber)
    }

    pub fn get(&self, id: FiberId) -> Result<&Fiber, FiberError> {
        self.fibers
            .get(id)
            .ok_or(FiberError::StaleFiber { fiber: id })
    }

    pub(crate) fn get_mut(&mut self, id: FiberId) -> Result<&mut Fiber, FiberError> {
        self.fibers
            .get_mut(id)
            .ok_or(FiberError::StaleFiber { fiber: id })
    }

    /// Iterates the `child`/`sibling` chain of `id`.
    pub fn children(&self, id: FiberId) -> Children<'_> {
        Children {
            tree: self,
            next: self.fibers.get(id).and_then(|fiber| fiber.child),
        }
    }

    /// Pre-order successor of `id` within the subtree rooted at `root`:
    /// the first child if any, otherwise the sibling of the nearest
    /// ancestor-or-self below `root`.
    pub fn next_in_subtree(
        &self,
        id: FiberId,
        root: FiberId,
    ) -> Result<Option<FiberId>, FiberError> {
        let fiber = self.get(id)?;
        if let Some(child) = fiber.child {
            return Ok(Some(child));
        }
        let mut current = id;
        loop {
            if current == root {
                return Ok(None);
            }
            let fiber = self.get(current)?;
            if let Some(sibling) = fiber.sibling {
                return Ok(Some(sibling));
            }
            match fiber.parent {
                Some(parent) => current = parent,
                None => return Ok(None),
            }
        }
    }

    /// Nearest proper ancestor of `id` that owns a render-target node.
    pub fn host_parent(&self, id: FiberId) -> Result<NodeId, FiberError> {
        let mut current = self.get(id)?.parent;
        while let Some(parent) = current {
            let fiber = self.get(parent)?;
            if let Some(handle) = fiber.handle {
                return Ok(handle);
            }
            current = fiber.parent;
        }
        Err(FiberError::MissingHostAncestor { fiber: id })
    }

    /// Every fiber reachable from `root` through `child`/`sibling` links,
    /// `root` first.
    pub fn subtree(&self, root: FiberId) -> Vec<FiberId> {
        let mut visited = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if !self.fibers.contains_key(id) {
                continue;
            }
            visited.push(id);
            let mut children: Vec<FiberId> = self.children(id).collect();
            children.reverse();
            stack.extend(children);
        }
        visited
    }

    /// Frees `root` and all of its descendants.
    pub(crate) fn remove_subtree(&mut self, root: FiberId) -> usize {
        let ids = self.subtree(root);
        for id in &ids {
            self.fibers.remove(*id);
        }
        ids.len()
    }
}

pub struct Children<'a> {
    tree: &'a FiberTree,
    next: Option<FiberId>,
}

impl Iterator for Children<'_> {
    type Item = FiberId;

    fn next(&mut self) -> Option<Self::Item> {
        let current = self.next?;
        self.next = self
            .tree
            .fibers
            .get(current)
            .and_then(|fiber| fiber.sibling);
        Some(current)
    }
}
