//! UrbanBase — the JS-facing host object.
//!
//! Owns one `EventCore`. JS functions become `Listener`s; the same JS function
//! always maps to the same `Listener`, so `off(event, fn)` removes exactly the
//! records registered with that function.
//!
//! WASM is single-threaded, so JS handles are wrapped in `unsafe impl
//! Send/Sync` newtypes to satisfy the core's `Send + Sync` bounds.

use std::any::Any;
use std::cell::RefCell;
use std::sync::{Arc, Weak};

use urban_events::events::BoxError;
use urban_events::{Event, EventCore, Listener, ListenerOptions};
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

use crate::{
    conversions::{event_to_js, is_nullish, js_to_value},
    error::{js_error_message, to_js_error, IntoJsResult},
};

const BOUND_METHODS: [&str; 4] = ["on", "off", "once", "fire"];

// ============================================================================
// UrbanBase
// ============================================================================

/// Event host exposed to JavaScript.
///
/// ```js
/// const base = new UrbanBase();
/// base.bindAll(base);
/// base.on("save", { args: { source: "toolbar" } }, function (event) {
///   console.log(this === base, event.detail);
/// });
/// const fire = base.fire;
/// fire("save", { id: 7 });
/// ```
#[wasm_bindgen]
pub struct UrbanBase {
    core: EventCore,
    /// JS function → listener handle, for identity-based `off`.
    handles: RefCell<Vec<JsHandle>>,
    /// Strong owner of the default receiver installed by `bindAll`.
    receiver: RefCell<Option<Arc<JsReceiver>>>,
}

impl Default for UrbanBase {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl UrbanBase {
    #[wasm_bindgen(constructor)]
    pub fn new() -> UrbanBase {
        UrbanBase {
            core: EventCore::new(),
            handles: RefCell::new(Vec::new()),
            receiver: RefCell::new(None),
        }
    }

    /// Register `listener` for `event`.
    ///
    /// `options` may be omitted or carry `context` (the handler's `this`)
    /// and/or `args` (registration-time data). Returns the listener id.
    pub fn on(&self, event: &str, listener: JsValue, options: JsValue) -> Result<f64, JsValue> {
        let func = as_function(listener)?;
        let opts = parse_listener_options(&options)?;
        let listener = self.listener_for(func);
        let id = self.core.on_with(event, opts, listener).into_js()?;
        Ok(id as f64)
    }

    /// Register a listener that runs at most once.
    pub fn once(&self, event: &str, listener: JsValue) -> Result<f64, JsValue> {
        let func = as_function(listener)?;
        let listener = self.listener_for(func);
        let id = self.core.once(event, listener).into_js()?;
        Ok(id as f64)
    }

    /// Remove `listener` from `event`, or every listener for `event` when
    /// `listener` is omitted. Returns the number of records removed.
    pub fn off(&self, event: &str, listener: JsValue) -> Result<u32, JsValue> {
        let removed = if is_nullish(&listener) {
            self.core.off(event, None).into_js()?
        } else {
            let func = as_function(listener)?;
            match self.find_listener(&func) {
                Some(listener) => self.core.off(event, Some(&listener)).into_js()?,
                None => 0,
            }
        };
        self.prune_handles();
        Ok(removed as u32)
    }

    /// Fire `event` with optional data. Returns the number of handlers run.
    ///
    /// Every handler runs even if an earlier one throws; failures are logged
    /// and rethrown together afterwards.
    pub fn fire(&self, event: &str, data: JsValue) -> Result<u32, JsValue> {
        let result = if is_nullish(&data) {
            self.core.fire(event)
        } else {
            let value = js_to_value(&data)?;
            self.core.fire_with(event, value)
        };

        match result {
            Ok(invoked) => Ok(invoked as u32),
            Err(e) => {
                for failure in e.failures() {
                    web_sys::console::warn_1(&JsValue::from_str(&format!(
                        "[urban-base] listener for \"{event}\" threw: {failure}"
                    )));
                }
                Err(to_js_error(e))
            }
        }
    }

    /// Use `target` as the default `this` for handlers and install
    /// `target.on/off/once/fire` as functions bound to `target`, so they can
    /// be passed around detached. Only the first accepted call has any effect.
    ///
    /// `target` must be an object. Binding a base to itself keeps the JS
    /// wrapper reachable from Rust until `clear()` or `free()` is called.
    #[wasm_bindgen(js_name = "bindAll")]
    pub fn bind_all(&self, target: JsValue) -> Result<(), JsValue> {
        check_bind_target(&target)?;

        let receiver = Arc::new(JsReceiver(target.clone()));
        let weak = Arc::downgrade(&receiver);
        let weak: Weak<dyn Any + Send + Sync> = weak;
        if !self.core.bind_receiver(weak) {
            return Ok(());
        }
        *self.receiver.borrow_mut() = Some(receiver);

        for name in BOUND_METHODS {
            let key = JsValue::from_str(name);
            let method = js_sys::Reflect::get(&target, &key)?;
            if let Some(func) = method.dyn_ref::<js_sys::Function>() {
                js_sys::Reflect::set(&target, &key, &func.bind0(&target))?;
            }
        }
        Ok(())
    }

    /// Total number of registered records.
    #[wasm_bindgen(getter)]
    pub fn length(&self) -> u32 {
        self.core.len() as u32
    }

    #[wasm_bindgen(js_name = "listenerCount")]
    pub fn listener_count(&self, event: &str) -> u32 {
        self.core.listener_count(event) as u32
    }

    /// Drop every listener and release the bound receiver (host teardown).
    ///
    /// After `clear()` handlers registered without a `context` run with
    /// `this === undefined`; the bound methods on the target keep working.
    pub fn clear(&self) {
        self.core.clear();
        self.handles.borrow_mut().clear();
        self.receiver.borrow_mut().take();
    }
}

impl UrbanBase {
    /// The listener for `func`, reusing an existing handle when the same
    /// function was registered before.
    fn listener_for(&self, func: js_sys::Function) -> Listener {
        if let Some(listener) = self.find_listener(&func) {
            return listener;
        }
        self.prune_handles();
        let listener = js_listener(SendSyncFn(func.clone()));
        self.handles.borrow_mut().push(JsHandle {
            func,
            listener: listener.clone(),
        });
        listener
    }

    fn find_listener(&self, func: &js_sys::Function) -> Option<Listener> {
        self.handles
            .borrow()
            .iter()
            .find(|h| js_sys::Object::is(&h.func, func))
            .map(|h| h.listener.clone())
    }

    /// Forget handles whose listener no longer has any record.
    fn prune_handles(&self) {
        let records = self.core.records();
        self.handles
            .borrow_mut()
            .retain(|h| records.iter().any(|r| r.listener().same(&h.listener)));
    }
}

// ============================================================================
// JS handles
// ============================================================================

struct JsHandle {
    func: js_sys::Function,
    listener: Listener,
}

/// A JS value used as a handler's `this`.
struct JsReceiver(JsValue);

// SAFETY: WASM is single-threaded.
unsafe impl Send for JsReceiver {}
unsafe impl Sync for JsReceiver {}

/// Send+Sync wrapper for JS callbacks in single-threaded WASM.
struct SendSyncFn(js_sys::Function);

// SAFETY: WASM is single-threaded.
unsafe impl Send for SendSyncFn {}
unsafe impl Sync for SendSyncFn {}

/// Wrap a JS function as a listener. The handler's `this` is the record's
/// context, else the bound host, else `undefined`.
fn js_listener(func: SendSyncFn) -> Listener {
    Listener::new(move |event: &Event| -> Result<(), BoxError> {
        call_js_listener(&func, event)
    })
}

fn call_js_listener(func: &SendSyncFn, event: &Event) -> Result<(), BoxError> {
    let this = event
        .receiver_as::<JsReceiver>()
        .map(|r| r.0.clone())
        .unwrap_or(JsValue::UNDEFINED);
    let arg = event_to_js(event).map_err(|e| js_error_message(&e))?;
    func.0
        .call1(&this, &arg)
        .map(|_| ())
        .map_err(|e| js_error_message(&e).into())
}

fn as_function(value: JsValue) -> Result<js_sys::Function, JsValue> {
    value.dyn_into::<js_sys::Function>().map_err(|v| {
        to_js_error(urban_events::EventError::InvalidListener(format!(
            "expected a function, got {}",
            v.js_typeof().as_string().unwrap_or_default()
        )))
    })
}

/// `bindAll` only accepts an object or function target.
fn check_bind_target(target: &JsValue) -> Result<(), JsValue> {
    if target.is_object() || target.is_function() {
        return Ok(());
    }
    Err(to_js_error(urban_events::EventError::InvalidTarget(format!(
        "bindAll expects an object, got {}",
        target.js_typeof().as_string().unwrap_or_default()
    ))))
}

/// Parse `{ context?, args? }` from a JS options object.
fn parse_listener_options(options: &JsValue) -> Result<ListenerOptions, JsValue> {
    let mut opts = ListenerOptions::new();
    if is_nullish(options) {
        return Ok(opts);
    }

    let context = js_sys::Reflect::get(options, &JsValue::from_str("context"))?;
    if !is_nullish(&context) {
        opts = opts.with_context(Arc::new(JsReceiver(context)));
    }

    let args = js_sys::Reflect::get(options, &JsValue::from_str("args"))?;
    if !args.is_undefined() {
        opts = opts.with_args(js_to_value(&args)?);
    }
    Ok(opts)
}
