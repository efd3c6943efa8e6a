#![cfg(target_arch = "wasm32")]

use pigeon_manifesto::platform::dom;
use wasm_bindgen_test::*;
use web_sys::Element;

wasm_bindgen_test_configure!(run_in_browser);

fn element() -> Element {
    web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.create_element("div").ok())
        .expect("document available in browser tests")
}

#[wasm_bindgen_test]
fn toggle_class_flips_and_reports_state() {
    let stack = element();
    stack.set_class_name("prototype-concept-stack");

    assert!(dom::toggle_class(&stack, "is-flipped"));
    assert!(dom::has_class(&stack, "is-flipped"));
    assert!(dom::has_class(&stack, "prototype-concept-stack"));

    assert!(!dom::toggle_class(&stack, "is-flipped"));
    assert!(!dom::has_class(&stack, "is-flipped"));
    assert_eq!(dom::class_names(&stack), vec!["prototype-concept-stack".to_string()]);
}

#[wasm_bindgen_test]
fn set_class_is_idempotent() {
    let el = element();
    dom::set_class(&el, "is-active", true);
    dom::set_class(&el, "is-active", true);
    assert_eq!(dom::class_names(&el), vec!["is-active".to_string()]);
    dom::set_class(&el, "is-active", false);
    assert!(dom::class_names(&el).is_empty());
}
