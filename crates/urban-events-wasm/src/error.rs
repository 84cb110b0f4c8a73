//! Error conversion: EventError → JsValue for wasm-bindgen boundaries.

use urban_events::EventError;
use wasm_bindgen::{JsCast, JsValue};

/// Convert an `EventError` into a JS `Error` carrying its display message.
pub fn to_js_error(e: EventError) -> JsValue {
    let msg = e.to_string();
    js_sys::Error::new(&msg).into()
}

/// Best-effort message for a value thrown by JS code.
pub fn js_error_message(value: &JsValue) -> String {
    if let Some(err) = value.dyn_ref::<js_sys::Error>() {
        return String::from(err.message());
    }
    value
        .as_string()
        .unwrap_or_else(|| format!("{value:?}"))
}

/// Convert any `EventError` result into a `Result<T, JsValue>`.
pub trait IntoJsResult<T> {
    fn into_js(self) -> Result<T, JsValue>;
}

impl<T> IntoJsResult<T> for Result<T, EventError> {
    fn into_js(self) -> Result<T, JsValue> {
        self.map_err(to_js_error)
    }
}
