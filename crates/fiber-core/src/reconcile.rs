//! Positional child reconciliation.
//!
//! Children are matched by index only: the child at position `i` of the new
//! list is paired with the `i`-th fiber of the alternate's child chain, and
//! the pair is reused when the kinds are equal. Reordered children are seen
//! as deletions followed by insertions.

use crate::element::Element;
use crate::error::FiberError;
use crate::fiber::{EffectTag, Fiber, FiberId, FiberTree};

/// Builds the child chain of `parent` from `elements`, tagging every produced
/// fiber with an effect and pushing retired old fibers onto `deletions`.
pub(crate) fn reconcile_children(
    tree: &mut FiberTree,
    parent: FiberId,
    elements: &[Element],
    deletions: &mut Vec<FiberId>,
) -> Result<(), FiberError> {
    let mut old = match tree.get(parent)?.alternate {
        Some(alternate) => tree.get(alternate)?.child,
        None => None,
    };
    let mut previous: Option<FiberId> = None;
    let mut index = 0;

    while index < elements.len() || old.is_some() {
        let element = elements.get(index);
        let old_fiber = match old {
            Some(id) => Some((id, tree.get(id)?)),
            None => None,
        };
        let same_kind = matches!(
            (old_fiber, element),
            (Some((_, fiber)), Some(element)) if fiber.kind() == element.kind()
        );
        let next_old = old_fiber.and_then(|(_, fiber)| fiber.sibling);

        let produced = match (element, old_fiber) {
            (Some(element), Some((old_id, old_fiber))) if same_kind => {
                let mut fiber = Fiber::new(element.clone(), Some(parent));
                fiber.handle = old_fiber.handle;
                fiber.alternate = Some(old_id);
                fiber.effect = Some(EffectTag::Update);
                Some(fiber)
            }
            (Some(element), _) => {
                let mut fiber = Fiber::new(element.clone(), Some(parent));
                fiber.effect = Some(EffectTag::Placement);
                Some(fiber)
            }
            (None, _) => None,
        };

        if let Some(old_id) = old {
            if !same_kind {
                tree.get_mut(old_id)?.effect = Some(EffectTag::Deletion);
                deletions.push(old_id);
            }
        }

        if let Some(fiber) = produced {
            let id = tree.insert(fiber);
            match previous {
                Some(previous) => tree.get_mut(previous)?.sibling = Some(id),
                None if index == 0 => tree.get_mut(parent)?.child = Some(id),
                None => return Err(FiberError::UnlinkedChild { parent, index }),
            }
            previous = Some(id);
        }

        old = next_old;
        index += 1;
    }

    log::trace!(
        "reconciled {} children under {parent:?}, {} pending deletions",
        elements.len(),
        deletions.len()
    );
    Ok(())
}

#[cfg(test)]
#[path = "tests/reconcile_tests.rs"]
mod tests;
