use fiber_core::{create_element, leaf, text, Attributes, FiberError, NodeError, WorkStatus};
use fiber_testing::{FiberTestRule, Unbounded};

fn tree() -> fiber_core::Element {
    create_element(
        "div",
        Attributes::new(),
        [
            create_element("span", Attributes::new(), [text("one")]),
            leaf("hr"),
            create_element("span", Attributes::new(), [text("two")]),
        ],
    )
}

#[test]
fn work_suspends_between_units_and_commits_once() {
    let mut rule = FiberTestRule::new();
    rule.render(tree());

    // root, div, span, "one", hr, span, "two"
    let mut suspended = 0;
    loop {
        match rule.step(1).unwrap() {
            WorkStatus::Suspended => {
                suspended += 1;
                assert!(rule.target().node(rule.container()).unwrap().children().is_empty());
            }
            WorkStatus::Committed(report) => {
                assert_eq!(report.placements, 6);
                break;
            }
            WorkStatus::Idle => panic!("work disappeared before commit"),
        }
    }

    assert_eq!(suspended, 6);
    assert_eq!(rule.text(), "onetwo");
    assert_eq!(rule.step(1), Ok(WorkStatus::Idle));
}

#[test]
fn idle_callback_is_rearmed_after_every_invocation() {
    let mut rule = FiberTestRule::new();
    for expected in 1..=3 {
        assert_eq!(rule.step(1), Ok(WorkStatus::Idle));
        assert_eq!(rule.idle_requests(), expected);
    }

    rule.render(tree());
    let before = rule.idle_requests();
    rule.step(1).unwrap();
    rule.pump_until_idle().unwrap();
    assert!(rule.idle_requests() >= before + 2);
}

#[test]
fn render_target_failure_aborts_the_pass() {
    let mut rule = FiberTestRule::new();
    rule.reconciler().render(tree(), 404);

    let result = rule.reconciler().perform_idle_work(&Unbounded);

    assert_eq!(result, Err(FiberError::Node(NodeError::Missing { id: 404 })));
    assert!(!rule.reconciler().has_pending_work());
    assert!(rule.reconciler().tree().is_empty());

    // Nothing reached the target before the failure, so a new render recovers.
    rule.set_content(leaf("p")).unwrap();
    assert_eq!(rule.dump(), "<root>\n  <p>\n");
}
