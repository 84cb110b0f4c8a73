//! Tests for passing data to listeners — registration defaults, emission data
//! and how the two merge.

use std::sync::{Arc, Mutex};

use serde_json::{json, Value};
use urban_events::{EventCore, Listener, ListenerOptions};

/// Register a listener that records the detail it receives.
fn capture(core: &EventCore, options: ListenerOptions) -> Arc<Mutex<Vec<Value>>> {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let seen_clone = Arc::clone(&seen);
    core.on_with(
        "testEvent",
        options,
        Listener::new(move |event| {
            seen_clone
                .lock()
                .unwrap()
                .push(Value::Object(event.detail().clone()));
        }),
    )
    .unwrap();
    seen
}

fn args() -> Value {
    json!({ "foo": "foo", "bar": "bar" })
}

#[test]
fn listener_can_apply_arguments() {
    let core = EventCore::new();
    let seen = capture(&core, ListenerOptions::new().with_args(args()));

    core.fire("testEvent").unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![args()]);
}

#[test]
fn emitter_can_apply_arguments() {
    let core = EventCore::new();
    let seen = capture(&core, ListenerOptions::new());

    core.fire_with("testEvent", args()).unwrap();
    assert_eq!(*seen.lock().unwrap(), vec![args()]);
}

#[test]
fn emitted_arguments_take_precedence() {
    let core = EventCore::new();
    let seen = capture(
        &core,
        ListenerOptions::new().with_args(json!({ "foo": "foobar" })),
    );

    core.fire_with("testEvent", args()).unwrap();
    assert_eq!(seen.lock().unwrap()[0]["foo"], json!("foo"));
}

#[test]
fn emitted_override_keeps_unrelated_defaults() {
    let core = EventCore::new();
    let seen = capture(&core, ListenerOptions::new().with_args(args()));

    core.fire_with("testEvent", json!({ "foo": "foobar" })).unwrap();
    assert_eq!(
        seen.lock().unwrap()[0],
        json!({ "foo": "foobar", "bar": "bar" })
    );
}

#[test]
fn arguments_can_come_from_both_sides() {
    let core = EventCore::new();
    let seen = capture(
        &core,
        ListenerOptions::new().with_args(json!({ "baz": "baz", "quux": "quux" })),
    );

    core.fire_with("testEvent", args()).unwrap();

    let seen = seen.lock().unwrap();
    let mut keys: Vec<&str> = seen[0]
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    keys.sort_unstable();
    assert_eq!(keys, vec!["bar", "baz", "foo", "quux"]);
}

#[test]
fn string_argument_lands_under_data() {
    let core = EventCore::new();
    let seen = capture(&core, ListenerOptions::new().with_args("foobarbaz"));

    core.fire("testEvent").unwrap();
    assert_eq!(seen.lock().unwrap()[0]["data"], json!("foobarbaz"));
}

#[test]
fn emitted_string_overrides_registered_string() {
    let core = EventCore::new();
    let seen = capture(&core, ListenerOptions::new().with_args("registered"));

    core.fire_with("testEvent", "emitted").unwrap();
    assert_eq!(seen.lock().unwrap()[0], json!({ "data": "emitted" }));
}

#[test]
fn no_data_yields_an_empty_detail() {
    let core = EventCore::new();
    let seen = capture(&core, ListenerOptions::new());

    core.fire("testEvent").unwrap();
    assert_eq!(seen.lock().unwrap()[0], json!({}));
}

#[test]
fn each_record_merges_its_own_defaults() {
    let core = EventCore::new();
    let first = capture(&core, ListenerOptions::new().with_args(json!({ "who": "first" })));
    let second = capture(&core, ListenerOptions::new().with_args(json!({ "who": "second" })));

    core.fire_with("testEvent", json!({ "shared": true })).unwrap();

    assert_eq!(
        first.lock().unwrap()[0],
        json!({ "who": "first", "shared": true })
    );
    assert_eq!(
        second.lock().unwrap()[0],
        json!({ "who": "second", "shared": true })
    );
}

#[test]
fn emission_data_does_not_leak_into_later_fires() {
    let core = EventCore::new();
    let seen = capture(&core, ListenerOptions::new().with_args(args()));

    core.fire_with("testEvent", json!({ "foo": "once" })).unwrap();
    core.fire("testEvent").unwrap();

    let seen = seen.lock().unwrap();
    assert_eq!(seen[0]["foo"], json!("once"));
    assert_eq!(seen[1], args());
}
