//! Tests for one-shot listeners.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use serde_json::json;
use urban_events::{EventCore, Listener, ListenerOptions};

use super::common::make_log;

fn counter() -> (Arc<AtomicUsize>, Listener) {
    let calls = Arc::new(AtomicUsize::new(0));
    let c = Arc::clone(&calls);
    let listener = Listener::new(move |_| {
        c.fetch_add(1, Ordering::SeqCst);
    });
    (calls, listener)
}

#[test]
fn once_handler_is_called_only_once() {
    let core = EventCore::new();
    let (calls, listener) = counter();
    core.once("testEvent", listener).unwrap();

    core.fire("testEvent").unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);

    core.fire("testEvent").unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn once_record_leaves_the_registry_after_firing() {
    let core = EventCore::new();
    core.once("testEvent", Listener::new(|_| {})).unwrap();
    assert_eq!(core.len(), 1);
    assert!(core.records()[0].is_once());

    core.fire("testEvent").unwrap();
    assert!(core.is_empty());
}

#[test]
fn once_does_not_affect_other_listeners() {
    let core = EventCore::new();
    let (once_calls, once_listener) = counter();
    let (on_calls, on_listener) = counter();
    core.once("testEvent", once_listener).unwrap();
    core.on("testEvent", on_listener).unwrap();

    core.fire("testEvent").unwrap();
    core.fire("testEvent").unwrap();

    assert_eq!(once_calls.load(Ordering::SeqCst), 1);
    assert_eq!(on_calls.load(Ordering::SeqCst), 2);
    assert_eq!(core.len(), 1);
}

#[test]
fn once_is_not_reinvoked_by_reentrant_fire_from_itself() {
    let core = Arc::new(EventCore::new());
    let calls = Arc::new(AtomicUsize::new(0));
    {
        let core_clone = Arc::clone(&core);
        let calls = Arc::clone(&calls);
        core.once(
            "testEvent",
            Listener::new(move |_| {
                calls.fetch_add(1, Ordering::SeqCst);
                core_clone.fire("testEvent").unwrap();
            }),
        )
        .unwrap();
    }

    core.fire("testEvent").unwrap();
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[test]
fn once_claimed_by_nested_fire_is_skipped_by_outer_dispatch() {
    let core = Arc::new(EventCore::new());
    let log = make_log();

    // The first listener re-fires the same event before the one-shot listener
    // is reached by the outer dispatch.
    {
        let core_clone = Arc::clone(&core);
        let log = Arc::clone(&log);
        let depth = Arc::new(Mutex::new(0));
        core.on(
            "testEvent",
            Listener::new(move |_| {
                log.lock().unwrap().push("outer".to_string());
                let nested = {
                    let mut d = depth.lock().unwrap();
                    *d += 1;
                    *d == 1
                };
                if nested {
                    core_clone.fire("testEvent").unwrap();
                }
            }),
        )
        .unwrap();
    }
    {
        let log = Arc::clone(&log);
        core.once(
            "testEvent",
            Listener::new(move |_| log.lock().unwrap().push("once".to_string())),
        )
        .unwrap();
    }

    core.fire("testEvent").unwrap();

    let log = log.lock().unwrap();
    assert_eq!(log.iter().filter(|s| *s == "once").count(), 1);
    assert_eq!(*log, vec!["outer", "outer", "once"]);
}

#[test]
fn once_with_passes_default_args() {
    let core = EventCore::new();
    let seen = Arc::new(Mutex::new(None));
    {
        let seen = Arc::clone(&seen);
        core.once_with(
            "testEvent",
            ListenerOptions::new().with_args(json!({ "foo": "foo" })),
            Listener::new(move |event| {
                *seen.lock().unwrap() = event.get("foo").cloned();
            }),
        )
        .unwrap();
    }

    core.fire("testEvent").unwrap();
    assert_eq!(*seen.lock().unwrap(), Some(json!("foo")));
}

#[test]
fn once_removed_before_firing_never_runs() {
    let core = EventCore::new();
    let (calls, listener) = counter();
    core.once("testEvent", listener.clone()).unwrap();

    core.off("testEvent", Some(&listener)).unwrap();
    assert_eq!(core.fire("testEvent").unwrap(), 0);
    assert_eq!(calls.load(Ordering::SeqCst), 0);
}
