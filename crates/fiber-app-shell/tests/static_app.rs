use fiber_app_shell::AppShell;
use fiber_core::{create_element, text, Attributes};

#[test]
fn static_content_settles() {
    let mut shell = AppShell::headless(create_element(
        "main",
        Attributes::new(),
        [
            create_element(
                "section",
                Attributes::new(),
                [text("Hello"), text(" "), text("World")],
            ),
            create_element("section", Attributes::new(), ["Another row"]),
        ],
    ));
    for _ in 0..8 {
        if shell.should_work() {
            shell.update();
        } else {
            break;
        }
    }
    assert!(!shell.should_work());
    assert_eq!(shell.commits(), 1);
    assert_eq!(
        shell.target().text_content(shell.container()),
        "Hello WorldAnother row"
    );
}
