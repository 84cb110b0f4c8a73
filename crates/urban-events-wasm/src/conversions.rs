//! Value ↔ JsValue helpers and Event → JS object conversion.

use serde::Serialize;
use serde_json::Value;
use urban_events::Event;
use wasm_bindgen::prelude::*;

/// Convert a `serde_json::Value` to a plain JS value (objects, not `Map`s).
pub fn value_to_js(v: &Value) -> Result<JsValue, JsValue> {
    v.serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Convert a `JsValue` to a `serde_json::Value` using serde-wasm-bindgen.
pub fn js_to_value(v: &JsValue) -> Result<Value, JsValue> {
    serde_wasm_bindgen::from_value(v.clone()).map_err(|e| JsValue::from_str(&e.to_string()))
}

/// Build the `{ name, detail }` object handed to JS listeners.
pub fn event_to_js(event: &Event) -> Result<JsValue, JsValue> {
    let obj = js_sys::Object::new();
    js_sys::Reflect::set(
        &obj,
        &JsValue::from_str("name"),
        &JsValue::from_str(event.name()),
    )?;
    let detail = value_to_js(&Value::Object(event.detail().clone()))?;
    js_sys::Reflect::set(&obj, &JsValue::from_str("detail"), &detail)?;
    Ok(obj.into())
}

/// True for `undefined` and `null`.
pub fn is_nullish(v: &JsValue) -> bool {
    v.is_undefined() || v.is_null()
}
