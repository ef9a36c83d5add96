#![cfg(target_arch = "wasm32")]
#![forbid(unsafe_code)]

use std::cell::Cell;
use std::rc::Rc;

use caretmark_core::{
    CaretOptions, CaretTracker, LayoutEngine, MIRROR_ELEMENT_ID, MeasureOutcome, SkipReason,
    TargetElement,
};
use caretmark_web::{CaretMark, DomHost, DomTarget};
use js_sys::{Function, Object, Promise, Reflect};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::{wasm_bindgen_test, wasm_bindgen_test_configure};
use web_sys::{Document, Element, Event, HtmlInputElement, HtmlTextAreaElement};

wasm_bindgen_test_configure!(run_in_browser);

fn document() -> Document {
    web_sys::window()
        .and_then(|w| w.document())
        .expect("test runs in a browser")
}

fn mount(tag: &str) -> Element {
    let doc = document();
    let element = doc.create_element(tag).expect("create element");
    element
        .set_attribute(
            "style",
            "font: 16px monospace; line-height: 20px; width: 200px; padding: 2px; border: 1px solid",
        )
        .expect("style");
    doc.body()
        .expect("body")
        .append_child(&element)
        .expect("append");
    element
}

fn input(value: &str, caret: u32) -> DomTarget {
    let element = mount("input");
    let input: &HtmlInputElement = element.unchecked_ref();
    input.set_value(value);
    input
        .set_selection_range(caret, caret)
        .expect("selection range");
    DomTarget::from_element(element).expect("input is a text control")
}

fn textarea(value: &str, caret: u32) -> DomTarget {
    let element = mount("textarea");
    let area: &HtmlTextAreaElement = element.unchecked_ref();
    area.set_value(value);
    area.set_selection_range(caret, caret)
        .expect("selection range");
    DomTarget::from_element(element).expect("textarea is a text control")
}

fn tracker(relative: bool) -> CaretTracker<DomHost> {
    CaretTracker::new(
        DomHost::new().expect("document"),
        CaretOptions::default().with_relative(relative),
    )
}

fn number(obj: &JsValue, key: &str) -> f64 {
    Reflect::get(obj, &JsValue::from_str(key))
        .expect("field")
        .as_f64()
        .expect("number")
}

/// Resolves on the animation frame after any already requested.
async fn next_frame() {
    let promise = Promise::new(&mut |resolve, _reject| {
        web_sys::window()
            .expect("window")
            .request_animation_frame(&resolve)
            .expect("animation frame");
    });
    JsFuture::from(promise).await.expect("frame");
}

fn fire(element: &Element, event: &str) {
    let event = Event::new(event).expect("event");
    element.dispatch_event(&event).expect("dispatch");
}

fn edit(element: &Element, value: &str, caret: u32) {
    let area: &HtmlTextAreaElement = element.unchecked_ref();
    area.set_value(value);
    area.set_selection_range(caret, caret)
        .expect("selection range");
}

/// Count `onChange` calls. The closure must outlive the mark's use of it.
fn count_changes(mark: &CaretMark) -> (Rc<Cell<u32>>, Closure<dyn FnMut(JsValue)>) {
    let count = Rc::new(Cell::new(0));
    let seen = Rc::clone(&count);
    let callback = Closure::<dyn FnMut(JsValue)>::new(move |_coords: JsValue| {
        seen.set(seen.get() + 1);
    });
    mark.on_change(callback.as_ref().unchecked_ref::<Function>().clone());
    (count, callback)
}

fn tracked_textarea(value: &str, caret: u32, options: &str) -> (Element, CaretMark) {
    let element = mount("textarea");
    edit(&element, value, caret);
    let options = js_sys::JSON::parse(options).expect("json");
    let mark = CaretMark::new(Some(element.clone()), options).expect("constructs");
    (element, mark)
}

#[wasm_bindgen_test]
fn kinds_follow_node_name() {
    use caretmark_core::ControlKind;
    assert_eq!(input("a", 0).control_kind(), ControlKind::SingleLine);
    assert_eq!(textarea("a", 0).control_kind(), ControlKind::MultiLine);
    assert!(DomTarget::from_element(mount("div")).is_err());
}

#[wasm_bindgen_test]
fn caret_at_end_is_right_of_start() {
    let mut t = tracker(true);
    let start = input("hello", 0);
    t.measure(Some(&start));
    let at_start = t.coordinates();
    let end = input("hello", 5);
    t.measure(Some(&end));
    assert!(t.coordinates().left > at_start.left);
    assert_eq!(t.coordinates().top, at_start.top);
}

#[wasm_bindgen_test]
fn second_line_is_lower() {
    let mut t = tracker(true);
    t.measure(Some(&textarea("line1\nline2", 0)));
    let first = t.coordinates();
    t.measure(Some(&textarea("line1\nline2", 6)));
    let second = t.coordinates();
    assert!(second.top > first.top);
    assert_eq!(second.height, 20.0);
}

#[wasm_bindgen_test]
fn viewport_is_relative_plus_rect() {
    let target = textarea("some words here", 5);
    let mut abs = tracker(false);
    let mut rel = tracker(true);
    abs.measure(Some(&target));
    rel.measure(Some(&target));
    let rect = target.bounding_rect();
    let expected = rel.coordinates().translate(rect.left, rect.top);
    assert!((abs.coordinates().top - expected.top).abs() < 1e-6);
    assert!((abs.coordinates().left - expected.left).abs() < 1e-6);
}

#[wasm_bindgen_test]
fn mirror_is_empty_between_measurements_and_removed_on_drop() {
    let mut t = tracker(false);
    t.measure(Some(&textarea("abc", 2)));
    let mirror = document()
        .get_element_by_id(MIRROR_ELEMENT_ID)
        .expect("mirror in document");
    assert!(!mirror.has_child_nodes());
    drop(t);
    assert!(!mirror.is_connected());
}

#[wasm_bindgen_test]
fn detached_target_keeps_last_result() {
    let mut t = tracker(false);
    let target = input("abc", 3);
    t.measure(Some(&target));
    let last = t.coordinates();
    target.element().remove();
    assert_eq!(
        t.measure(Some(&target)),
        MeasureOutcome::Skipped(SkipReason::Detached)
    );
    assert_eq!(t.coordinates(), last);
}

#[wasm_bindgen_test]
fn caret_mark_measures_on_construction() {
    let element = mount("textarea");
    let area: &HtmlTextAreaElement = element.unchecked_ref();
    area.set_value("abc");
    area.set_selection_range(3, 3).expect("selection range");
    let mark = CaretMark::new(Some(element), JsValue::UNDEFINED).expect("constructs");
    assert_eq!(mark.measurements(), 1.0);
    assert!(number(&mark.coordinates(), "height") > 0.0);
    mark.detach();
}

#[wasm_bindgen_test]
fn caret_mark_without_target_reports_zeros() {
    let mark = CaretMark::new(None, JsValue::NULL).expect("constructs");
    let coords = mark.coordinates();
    assert_eq!(number(&coords, "top"), 0.0);
    assert_eq!(number(&coords, "left"), 0.0);
    assert_eq!(number(&coords, "height"), 0.0);
    assert_eq!(
        mark.coordinates_json().expect("json"),
        r#"{"top":0.0,"left":0.0,"height":0.0}"#
    );
}

#[wasm_bindgen_test]
fn caret_mark_rejects_bad_input() {
    let bad_options = js_sys::JSON::parse(r#"{"trackEvents":["paste"]}"#).expect("json");
    assert!(CaretMark::new(None, bad_options).is_err());
    assert!(CaretMark::new(Some(mount("div")), JsValue::UNDEFINED).is_err());
}

#[wasm_bindgen_test]
fn engine_follows_moz_inner_screen_x() {
    let window = Object::new();
    assert_eq!(DomHost::engine_of(&window), LayoutEngine::Standard);
    Reflect::set(&window, &"mozInnerScreenX".into(), &JsValue::NULL).expect("set");
    assert_eq!(DomHost::engine_of(&window), LayoutEngine::Standard);
    Reflect::set(&window, &"mozInnerScreenX".into(), &JsValue::UNDEFINED).expect("set");
    assert_eq!(DomHost::engine_of(&window), LayoutEngine::Standard);
    Reflect::set(&window, &"mozInnerScreenX".into(), &JsValue::from_f64(0.0)).expect("set");
    assert_eq!(DomHost::engine_of(&window), LayoutEngine::Gecko);
}

// ── Event-driven measurement ────────────────────────────────────────────

#[wasm_bindgen_test]
async fn input_burst_measures_once_on_next_frame() {
    let (element, mark) = tracked_textarea("abc", 0, "{}");
    let (changes, _callback) = count_changes(&mark);
    let before = number(&mark.coordinates(), "left");

    edit(&element, "abc def", 7);
    for _ in 0..3 {
        fire(&element, "input");
    }
    assert_eq!(mark.measurements(), 1.0);
    assert_eq!(changes.get(), 0);

    next_frame().await;
    assert_eq!(mark.measurements(), 2.0);
    assert_eq!(changes.get(), 1);
    assert!(number(&mark.coordinates(), "left") > before);
    mark.detach();
}

#[wasm_bindgen_test]
async fn detach_stops_event_measurement() {
    let (element, mark) = tracked_textarea("abc", 3, "{}");
    let (changes, _callback) = count_changes(&mark);
    let last = mark.coordinates_json().expect("json");
    mark.detach();

    edit(&element, "", 0);
    fire(&element, "input");
    next_frame().await;
    assert_eq!(mark.measurements(), 1.0);
    assert_eq!(changes.get(), 0);
    assert_eq!(mark.coordinates_json().expect("json"), last);
}

#[wasm_bindgen_test]
async fn detach_cancels_a_scheduled_frame() {
    let (element, mark) = tracked_textarea("abc", 0, "{}");
    edit(&element, "abc", 3);
    fire(&element, "input");
    mark.detach();
    next_frame().await;
    assert_eq!(mark.measurements(), 1.0);
}

#[wasm_bindgen_test]
async fn off_change_silences_callback() {
    let (element, mark) = tracked_textarea("abc", 0, "{}");
    let (changes, _callback) = count_changes(&mark);
    mark.off_change();

    edit(&element, "abc", 3);
    fire(&element, "input");
    next_frame().await;
    assert_eq!(mark.measurements(), 2.0);
    assert_eq!(changes.get(), 0);
    mark.detach();
}

#[wasm_bindgen_test]
async fn set_target_moves_listeners() {
    let (first, mark) = tracked_textarea("abc", 3, "{}");
    let second = mount("textarea");
    edit(&second, "a", 1);

    mark.set_target(Some(second.clone())).expect("textarea target");
    assert_eq!(mark.measurements(), 2.0);
    let on_second = mark.coordinates_json().expect("json");

    edit(&first, "abc def", 7);
    fire(&first, "input");
    next_frame().await;
    assert_eq!(mark.measurements(), 2.0);

    edit(&second, "a b", 3);
    fire(&second, "input");
    next_frame().await;
    assert_eq!(mark.measurements(), 3.0);
    assert_ne!(mark.coordinates_json().expect("json"), on_second);

    mark.set_target(None).expect("no target");
    assert_eq!(mark.measurements(), 3.0);
    assert!(number(&mark.coordinates(), "height") > 0.0);
    assert!(mark.set_target(Some(mount("div"))).is_err());
}

#[wasm_bindgen_test]
async fn set_options_applies_on_next_frame() {
    let (element, mark) = tracked_textarea("abc", 3, "{}");
    let (changes, _callback) = count_changes(&mark);
    let viewport_left = number(&mark.coordinates(), "left");

    let relative = js_sys::JSON::parse(r#"{"relative":true}"#).expect("json");
    mark.set_options(relative).expect("options");
    assert_eq!(number(&mark.coordinates(), "left"), viewport_left);
    next_frame().await;
    assert_eq!(changes.get(), 1);
    let rect = element.get_bounding_client_rect();
    let relative_left = number(&mark.coordinates(), "left");
    assert!((relative_left + rect.left() - viewport_left).abs() < 1e-6);

    let keyup_only = js_sys::JSON::parse(r#"{"relative":true,"trackEvents":["keyup"]}"#)
        .expect("json");
    mark.set_options(keyup_only).expect("options");
    next_frame().await;
    let measured = mark.measurements();

    edit(&element, "abc def", 7);
    fire(&element, "input");
    next_frame().await;
    assert_eq!(mark.measurements(), measured);
    fire(&element, "keyup");
    next_frame().await;
    assert_eq!(mark.measurements(), measured + 1.0);
    assert!(mark.set_options(js_sys::JSON::parse(r#"{"debug":"yes"}"#).expect("json")).is_err());
    mark.detach();
}
