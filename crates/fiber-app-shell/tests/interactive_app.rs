use fiber_app_shell::AppShell;
use fiber_core::{
    attributes, create_element, leaf, use_state, AttrValue, Attributes, Component, Element, Event,
    Listener, Props,
};

fn toggle(_: &Props) -> Element {
    let (on, set_on) = use_state(false);
    let on_click = Listener::new(move |_: &Event| set_on.update(|on| !on));
    create_element(
        "button",
        attributes([
            ("pressed", AttrValue::from(on)),
            ("onClick", AttrValue::from(on_click)),
        ]),
        [if on { "on" } else { "off" }],
    )
}

#[test]
fn events_drive_new_commits() {
    let mut shell = AppShell::headless(leaf(Component::new(toggle)));
    shell.settle();
    assert_eq!(shell.target().text_content(shell.container()), "off");

    assert!(shell.dispatch("button", &Event::new("click")));
    assert!(shell.should_work());
    shell.settle();
    assert_eq!(shell.target().text_content(shell.container()), "on");

    assert!(shell.dispatch("button", &Event::new("click")));
    shell.settle();
    assert_eq!(shell.target().text_content(shell.container()), "off");
    assert!(!shell.dispatch("input", &Event::new("click")));
}

#[test]
fn replacing_content_reuses_matching_nodes() {
    let mut shell = AppShell::headless(create_element("ul", Attributes::new(), [leaf("li")]));
    shell.settle();
    let ul = shell.target().find_by_kind(shell.container(), "ul");

    shell.set_content(create_element("ul", Attributes::new(), [leaf("li"), leaf("li")]));
    shell.settle();

    assert_eq!(shell.target().find_by_kind(shell.container(), "ul"), ul);
    assert_eq!(shell.dump(), "<root>\n  <ul>\n    <li>\n    <li>\n");
}
