//! Per-component hook state.
//!
//! While a component fiber renders, a hook frame is installed for the
//! current thread. Each hook call consumes the next slot of the frame: it
//! reads the record the alternate fiber left at the same position, folds
//! that record's queued actions into the state, and appends a fresh record
//! for this pass. Components must therefore call hooks the same number of
//! times and in the same order on every render.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::marker::PhantomData;
use std::rc::{Rc, Weak};

use crate::element::Element;
use crate::error::FiberError;
use crate::fiber::FiberId;
use crate::runtime::RuntimeHandle;

type Action<T> = Box<dyn Fn(&T) -> T>;

pub(crate) struct HookRecord {
    state: Box<dyn Any>,
    // Each entry is an `Action<T>`. Renders replay entries without draining
    // them, so an abandoned pass leaves them intact for the next one.
    queue: RefCell<Vec<Rc<dyn Any>>>,
}

impl HookRecord {
    fn new<T: 'static>(state: T) -> Self {
        Self {
            state: Box::new(state),
            queue: RefCell::new(Vec::new()),
        }
    }

    #[cfg(test)]
    pub(crate) fn pending_actions(&self) -> usize {
        self.queue.borrow().len()
    }

    /// Moves every action queued on `self` to the end of `target`'s queue.
    pub(crate) fn hand_back_actions(&self, target: &HookRecord) -> usize {
        let mut queue = self.queue.borrow_mut();
        let moved = queue.len();
        target.queue.borrow_mut().extend(queue.drain(..));
        moved
    }
}

struct HookFrame {
    fiber: FiberId,
    previous: Vec<Rc<HookRecord>>,
    hooks: Vec<Rc<HookRecord>>,
    cursor: usize,
    runtime: RuntimeHandle,
}

thread_local! {
    static CURRENT_FRAME: RefCell<Option<HookFrame>> = const { RefCell::new(None) };
}

/// Runs `render` with a hook frame for `fiber` installed and returns the
/// produced element together with the hook records created along the way.
pub(crate) fn render_with_hooks(
    fiber: FiberId,
    previous: Vec<Rc<HookRecord>>,
    runtime: RuntimeHandle,
    render: impl FnOnce() -> Element,
) -> (Element, Vec<Rc<HookRecord>>) {
    let frame = HookFrame {
        fiber,
        previous,
        hooks: Vec::new(),
        cursor: 0,
        runtime,
    };
    let outer = CURRENT_FRAME.with(|slot| slot.borrow_mut().replace(frame));

    struct Guard(Option<Option<HookFrame>>);
    impl Drop for Guard {
        fn drop(&mut self) {
            if let Some(outer) = self.0.take() {
                CURRENT_FRAME.with(|slot| *slot.borrow_mut() = outer);
            }
        }
    }

    let mut guard = Guard(Some(outer));
    let element = render();
    let frame = CURRENT_FRAME.with(|slot| slot.borrow_mut().take());
    if let Some(outer) = guard.0.take() {
        CURRENT_FRAME.with(|slot| *slot.borrow_mut() = outer);
    }
    let hooks = frame.map(|frame| frame.hooks).unwrap_or_default();
    (element, hooks)
}

/// Returns the current state of the next hook slot and a setter for it.
///
/// # Panics
///
/// Panics when called outside a component render. Use [`try_use_state`] to
/// get the error instead.
pub fn use_state<T: Clone + 'static>(initial: T) -> (T, SetState<T>) {
    match try_use_state(initial) {
        Ok(pair) => pair,
        Err(err) => panic!("{err}"),
    }
}

pub fn try_use_state<T: Clone + 'static>(initial: T) -> Result<(T, SetState<T>), FiberError> {
    let (previous, cursor, fiber, runtime) = CURRENT_FRAME.with(|slot| {
        let mut slot = slot.borrow_mut();
        let frame = slot.as_mut().ok_or(FiberError::HookOutsideRender)?;
        let cursor = frame.cursor;
        frame.cursor += 1;
        Ok::<_, FiberError>((
            frame.previous.get(cursor).cloned(),
            cursor,
            frame.fiber,
            frame.runtime.clone(),
        ))
    })?;

    let state = fold_state(previous.as_deref(), initial, cursor, fiber);
    let record = Rc::new(HookRecord::new(state.clone()));
    CURRENT_FRAME.with(|slot| {
        if let Some(frame) = slot.borrow_mut().as_mut() {
            frame.hooks.push(Rc::clone(&record));
        }
    });

    Ok((
        state,
        SetState {
            record: Rc::downgrade(&record),
            runtime,
            _marker: PhantomData,
        },
    ))
}

fn fold_state<T: Clone + 'static>(
    previous: Option<&HookRecord>,
    initial: T,
    cursor: usize,
    fiber: FiberId,
) -> T {
    let Some(previous) = previous else {
        return initial;
    };
    let mut state = match previous.state.downcast_ref::<T>() {
        Some(state) => state.clone(),
        None => {
            log::warn!(
                "hook {cursor} of fiber {fiber:?} changed type between renders; reseeding"
            );
            return initial;
        }
    };
    let actions: Vec<Rc<dyn Any>> = previous.queue.borrow().clone();
    for action in actions {
        match action.downcast_ref::<Action<T>>() {
            Some(action) => state = action(&state),
            None => {
                log::warn!("dropping mistyped action queued on hook {cursor} of fiber {fiber:?}")
            }
        }
    }
    state
}

/// Setter returned by [`use_state`].
///
/// Queued actions are folded, in the order they were queued, the next time
/// the owning component renders.
pub struct SetState<T> {
    record: Weak<HookRecord>,
    runtime: RuntimeHandle,
    _marker: PhantomData<fn(T)>,
}

impl<T> Clone for SetState<T> {
    fn clone(&self) -> Self {
        Self {
            record: Weak::clone(&self.record),
            runtime: self.runtime.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: 'static> SetState<T> {
    pub fn update(&self, action: impl Fn(&T) -> T + 'static) {
        let Some(record) = self.record.upgrade() else {
            log::debug!("state setter used after its component was removed");
            return;
        };
        let action: Action<T> = Box::new(action);
        record.queue.borrow_mut().push(Rc::new(action));
        self.runtime.request_rerender();
    }

    pub fn set(&self, value: T)
    where
        T: Clone,
    {
        self.update(move |_| value.clone());
    }

    /// Whether the hook this setter writes to still exists.
    pub fn is_live(&self) -> bool {
        self.record.strong_count() > 0
    }
}

impl<T> fmt::Debug for SetState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetState")
            .field("live", &(self.record.strong_count() > 0))
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::leaf;
    use crate::runtime::Runtime;

    fn fiber_id() -> FiberId {
        FiberId::default()
    }

    #[test]
    fn hooks_outside_render_fail() {
        assert_eq!(
            try_use_state(0).map(|(state, _)| state),
            Err(FiberError::HookOutsideRender)
        );
    }

    #[test]
    #[should_panic(expected = "hooks may only be called while a component is rendering")]
    fn use_state_panics_outside_render() {
        let _ = use_state(0);
    }

    #[test]
    fn queued_actions_fold_in_order_without_draining() {
        let runtime = Runtime::default();
        let mut setter = None;
        let (_, first) = render_with_hooks(fiber_id(), Vec::new(), runtime.handle(), || {
            let (value, set) = use_state(String::from("a"));
            assert_eq!(value, "a");
            setter = Some(set);
            leaf("div")
        });
        let setter = setter.unwrap();
        setter.update(|value: &String| format!("{value}b"));
        setter.update(|value: &String| format!("{value}c"));
        assert!(runtime.has_pending_rerender());
        assert_eq!(first[0].pending_actions(), 2);

        for _ in 0..2 {
            let (_, hooks) = render_with_hooks(fiber_id(), first.clone(), runtime.handle(), || {
                let (value, _) = use_state(String::from("ignored"));
                assert_eq!(value, "abc");
                leaf("div")
            });
            assert_eq!(hooks.len(), 1);
            assert_eq!(hooks[0].pending_actions(), 0);
        }
    }

    #[test]
    fn handed_back_actions_follow_the_committed_ones() {
        let runtime = Runtime::default();
        let render = |previous: Vec<Rc<HookRecord>>, seen: i32| {
            let mut setter = None;
            let (_, hooks) = render_with_hooks(fiber_id(), previous, runtime.handle(), || {
                let (value, set) = use_state(0);
                assert_eq!(value, seen);
                setter = Some(set);
                leaf("div")
            });
            (hooks, setter.unwrap())
        };
        let (committed, set_committed) = render(Vec::new(), 0);
        set_committed.set(1);
        let (in_flight, set_in_flight) = render(committed.clone(), 1);
        set_in_flight.update(|value| value * 10 + 1);

        assert_eq!(in_flight[0].hand_back_actions(&committed[0]), 1);
        assert_eq!(in_flight[0].pending_actions(), 0);
        assert_eq!(committed[0].pending_actions(), 2);
        render(committed, 11);
    }

    #[test]
    fn mistyped_hook_is_reseeded() {
        let runtime = Runtime::default();
        let (_, first) = render_with_hooks(fiber_id(), Vec::new(), runtime.handle(), || {
            let _ = use_state(5u32);
            leaf("div")
        });
        render_with_hooks(fiber_id(), first, runtime.handle(), || {
            let (value, _) = use_state("fresh");
            assert_eq!(value, "fresh");
            leaf("div")
        });
    }

    #[test]
    fn setter_outliving_its_record_is_inert() {
        let runtime = Runtime::default();
        let mut setter = None;
        let (_, hooks) = render_with_hooks(fiber_id(), Vec::new(), runtime.handle(), || {
            setter = Some(use_state(1).1);
            leaf("div")
        });
        let setter = setter.unwrap();
        assert!(setter.is_live());
        drop(hooks);
        assert!(!setter.is_live());
        setter.set(2);
        assert!(!runtime.has_pending_rerender());
    }
}
