use fiber_core::{
    create_element, leaf, text, Attributes, CommitReport, EffectTag, Element, ElementKind,
    MemoryOp, WorkStatus,
};
use fiber_testing::{FiberTestRule, Unbounded};

fn list(items: &[&'static str]) -> Element {
    create_element(
        "ul",
        Attributes::new(),
        items.iter().map(|kind| leaf(*kind)).collect::<Vec<_>>(),
    )
}

fn commit(rule: &mut FiberTestRule, content: Element) -> CommitReport {
    rule.render(content);
    match rule.reconciler().perform_idle_work(&Unbounded) {
        Ok(WorkStatus::Committed(report)) => report,
        other => panic!("expected a commit, got {other:?}"),
    }
}

fn page() -> Element {
    create_element(
        "article",
        Attributes::new(),
        [
            create_element("h1", Attributes::new(), ["Title"]),
            create_element("p", Attributes::new(), [text("Body "), text("text")]),
        ],
    )
}

#[test]
fn unchanged_tree_only_produces_updates() {
    let mut rule = FiberTestRule::new();
    rule.set_content(page()).unwrap();

    for _ in 0..2 {
        rule.target_mut().take_ops();
        let report = commit(&mut rule, page());
        assert_eq!(report.placements, 0);
        assert_eq!(report.deletions, 0);
        // article, h1, "Title", p, "Body ", "text"
        assert_eq!(report.updates, 6);
        assert!(rule.target().ops().is_empty());
    }
}

#[test]
fn shrinking_removes_the_last_child() {
    let mut rule = FiberTestRule::new();
    rule.set_content(list(&["a", "b", "c"])).unwrap();
    rule.target_mut().take_ops();

    rule.render(list(&["a", "b"]));
    rule.step(2).unwrap();
    assert_eq!(
        rule.pending_effects(),
        vec![
            (ElementKind::from("ul"), EffectTag::Update),
            (ElementKind::from("a"), EffectTag::Update),
            (ElementKind::from("b"), EffectTag::Update),
            (ElementKind::from("c"), EffectTag::Deletion),
        ]
    );

    rule.pump_until_idle().unwrap();
    assert_eq!(
        rule.target()
            .count_ops(|op| matches!(op, MemoryOp::Detach { .. })),
        1
    );
    assert_eq!(rule.dump(), "<root>\n  <ul>\n    <a>\n    <b>\n");
}

#[test]
fn growing_attaches_one_node() {
    let mut rule = FiberTestRule::new();
    rule.set_content(list(&["a"])).unwrap();
    rule.target_mut().take_ops();

    let report = commit(&mut rule, list(&["a", "b"]));

    assert_eq!((report.updates, report.placements), (2, 1));
    assert_eq!(
        rule.target()
            .count_ops(|op| matches!(op, MemoryOp::Attach { .. })),
        1
    );
    assert_eq!(rule.dump(), "<root>\n  <ul>\n    <a>\n    <b>\n");
}

#[test]
fn kind_change_replaces_the_handle() {
    let mut rule = FiberTestRule::new();
    rule.set_content(list(&["a"])).unwrap();
    let old = rule.find("a").unwrap();

    let report = commit(&mut rule, list(&["b"]));

    assert_eq!((report.deletions, report.placements), (1, 1));
    assert_eq!(report.detached, 1);
    assert!(rule.find("a").is_none());
    assert_ne!(rule.find("b"), Some(old));
}

#[test]
fn newest_render_request_wins() {
    let mut rule = FiberTestRule::new();
    rule.set_content(list(&["a"])).unwrap();

    rule.render(list(&["b", "c"]));
    assert_eq!(rule.step(2), Ok(WorkStatus::Suspended));
    rule.render(list(&["a", "d"]));
    assert_eq!(rule.pump_until_idle(), Ok(1));

    assert_eq!(rule.dump(), "<root>\n  <ul>\n    <a>\n    <d>\n");
}
