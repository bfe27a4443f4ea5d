use std::cell::RefCell;
use std::rc::Rc;

use fiber_core::{
    create_element, leaf, try_use_state, use_state, Attributes, Component, FiberError, Props,
    SetState, WorkStatus,
};
use fiber_testing::FiberTestRule;

#[derive(Default)]
struct Setters {
    label: Option<SetState<String>>,
    count: Option<SetState<i32>>,
}

fn two_states(setters: &Rc<RefCell<Setters>>) -> fiber_core::Element {
    let setters = Rc::clone(setters);
    leaf(Component::new(move |_: &Props| {
        let (label, set_label) = use_state(String::from("count"));
        let (count, set_count) = use_state(10);
        let mut slots = setters.borrow_mut();
        slots.label = Some(set_label);
        slots.count = Some(set_count);
        create_element("p", Attributes::new(), [format!("{label}={count}")])
    }))
}

#[test]
fn queued_actions_fold_in_enqueue_order() {
    let setters = Rc::new(RefCell::new(Setters::default()));
    let mut rule = FiberTestRule::new();
    rule.set_content(two_states(&setters)).unwrap();
    assert_eq!(rule.text(), "count=10");

    let set_count = setters.borrow().count.clone().unwrap();
    for _ in 0..3 {
        set_count.update(|count| count + 1);
    }
    assert_eq!(rule.pump_until_idle(), Ok(1));

    assert_eq!(rule.text(), "count=13");
}

#[test]
fn actions_apply_first_scheduled_first() {
    let setters = Rc::new(RefCell::new(Setters::default()));
    let mut rule = FiberTestRule::new();
    rule.set_content(two_states(&setters)).unwrap();

    let set_count = setters.borrow().count.clone().unwrap();
    set_count.update(|count| count * 2);
    set_count.update(|count| count + 1);
    set_count.set(4);
    set_count.update(|count| count - 1);
    rule.pump_until_idle().unwrap();

    assert_eq!(rule.text(), "count=3");
}

#[test]
fn hooks_keep_their_own_state() {
    let setters = Rc::new(RefCell::new(Setters::default()));
    let mut rule = FiberTestRule::new();
    rule.set_content(two_states(&setters)).unwrap();

    setters
        .borrow()
        .label
        .clone()
        .unwrap()
        .set(String::from("total"));
    rule.pump_until_idle().unwrap();
    setters.borrow().count.clone().unwrap().update(|count| count + 5);
    rule.pump_until_idle().unwrap();

    assert_eq!(rule.text(), "total=15");
}

#[test]
fn setter_during_incomplete_pass_restarts_from_committed_tree() {
    let setters = Rc::new(RefCell::new(Setters::default()));
    let mut rule = FiberTestRule::new();
    rule.set_content(two_states(&setters)).unwrap();
    let set_count = setters.borrow().count.clone().unwrap();

    set_count.update(|count| count + 1);
    assert_eq!(rule.step(1), Ok(WorkStatus::Suspended));
    let abandoned = rule.reconciler().wip_root().unwrap();

    set_count.update(|count| count + 1);
    assert_eq!(rule.pump_until_idle(), Ok(1));

    assert!(!rule.reconciler().tree().contains(abandoned));
    assert_eq!(rule.text(), "count=12");
}

#[test]
fn setter_from_an_abandoned_pass_keeps_its_action() {
    let setters = Rc::new(RefCell::new(Setters::default()));
    let mut rule = FiberTestRule::new();
    rule.set_content(two_states(&setters)).unwrap();
    let committed = setters.borrow().count.clone().unwrap();

    committed.update(|count| count + 1);
    // root, then the component: it renders and hands out a fresh setter.
    assert_eq!(rule.step(2), Ok(WorkStatus::Suspended));
    let in_flight = setters.borrow().count.clone().unwrap();
    assert!(in_flight.is_live());

    in_flight.update(|count| count + 10);
    assert_eq!(rule.pump_until_idle(), Ok(1));

    assert_eq!(rule.text(), "count=21");
    assert!(!in_flight.is_live());
    setters.borrow().count.clone().unwrap().update(|count| count * 2);
    rule.pump_until_idle().unwrap();
    assert_eq!(rule.text(), "count=42");
}

#[test]
fn removed_component_disarms_its_setters() {
    let setters = Rc::new(RefCell::new(Setters::default()));
    let mut rule = FiberTestRule::new();
    rule.set_content(create_element(
        "main",
        Attributes::new(),
        [two_states(&setters)],
    ))
    .unwrap();
    let set_count = setters.borrow().count.clone().unwrap();
    assert!(set_count.is_live());

    rule.set_content(create_element("main", Attributes::new(), [leaf("span")]))
        .unwrap();

    assert!(!set_count.is_live());
    set_count.set(99);
    assert!(!rule.reconciler().has_pending_work());
    assert_eq!(rule.dump(), "<root>\n  <main>\n    <span>\n");
}

#[test]
fn hooks_outside_a_render_are_rejected() {
    assert_eq!(
        try_use_state(0).map(|(value, _)| value),
        Err(FiberError::HookOutsideRender)
    );
}
