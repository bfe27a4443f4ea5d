use std::cell::RefCell;
use std::rc::Rc;

use fiber_app_shell::AppShell;
use fiber_core::{
    attributes, create_element, leaf, use_state, AttrValue, Attributes, Child, Component, Element,
    Event, Listener, Props,
};

const TYPED: &[&str] = &["W", "Wo", "Wor", "Worl", "World!"];

fn app(props: &Props) -> Element {
    create_element(
        "h1",
        Attributes::new(),
        [Child::from("Hi "), Child::from(props.text("name").unwrap_or_default())],
    )
}

/// The page rebuilt from the outside on every keystroke.
fn page(value: &str, on_input: Listener) -> Element {
    create_element(
        "div",
        Attributes::new(),
        [
            create_element(
                Component::new(app),
                attributes([("name", "foo")]),
                Vec::<Element>::new(),
            ),
            create_element(
                "div",
                attributes([("id", "foo")]),
                [
                    create_element(
                        "input",
                        attributes([
                            ("onInput", AttrValue::from(on_input)),
                            ("value", AttrValue::from(value)),
                        ]),
                        Vec::<Element>::new(),
                    ),
                    create_element("h2", Attributes::new(), ["Hello ", value]),
                    create_element("p", Attributes::new(), [value]),
                ],
            ),
        ],
    )
}

/// The same page keeping its value in component state.
fn stateful_page(_: &Props) -> Element {
    let (value, set_value) = use_state(String::from("World"));
    let on_input = Listener::new(move |event: &Event| {
        if let Some(value) = &event.value {
            set_value.set(value.clone());
        }
    });
    page(&value, on_input)
}

fn run_rerendering_demo() {
    println!("--- whole-tree re-render ---");
    let latest: Rc<RefCell<Option<String>>> = Rc::default();
    let sink = Rc::clone(&latest);
    let on_input = Listener::new(move |event: &Event| {
        *sink.borrow_mut() = event.value.clone();
    });

    let mut shell = AppShell::headless(page("World", on_input.clone()));
    shell.settle();
    print!("{}", shell.dump());

    for typed in TYPED {
        shell.dispatch("input", &Event::with_value("input", *typed));
        if let Some(value) = latest.borrow_mut().take() {
            log::info!("rerenderer({value:?})");
            shell.set_content(page(&value, on_input.clone()));
        }
        shell.settle();
    }
    print!("{}", shell.dump());
    println!("commits: {}", shell.commits());
}

fn run_stateful_demo() {
    println!("--- state-driven re-render ---");
    let mut shell = AppShell::headless(leaf(Component::new(stateful_page)));
    shell.settle();
    print!("{}", shell.dump());

    for typed in TYPED {
        shell.dispatch("input", &Event::with_value("input", *typed));
        shell.settle();
    }
    shell.log_debug_info();
}

fn main() {
    env_logger::init();

    println!("=== Fiber-RS Greeting Example ===");
    run_rerendering_demo();
    run_stateful_demo();
}
