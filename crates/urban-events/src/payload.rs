//! Payload normalization and the default/emission merge.
//!
//! Registration-time defaults and emission-time data are both normalized to a
//! flat JSON object, then merged shallowly with emission-time keys winning.

use serde_json::Value;

use crate::types::Payload;

/// Key that non-object values are wrapped under.
pub const DATA_KEY: &str = "data";

/// Normalize a value to a payload object.
///
/// - `Object` → shallow copy of its keys.
/// - `Null` → empty payload.
/// - Anything else → `{ "data": value }`.
pub fn into_payload(value: Value) -> Payload {
    match value {
        Value::Object(map) => map,
        Value::Null => Payload::new(),
        other => {
            let mut payload = Payload::new();
            payload.insert(DATA_KEY.to_string(), other);
            payload
        }
    }
}

/// Merge registration-time defaults with emission-time data.
///
/// Keys present in both take the emission-time value. The result is always a
/// payload, empty when neither side supplies data.
pub fn merge(defaults: Option<&Payload>, data: Option<&Payload>) -> Payload {
    let mut merged = defaults.cloned().unwrap_or_default();
    if let Some(data) = data {
        for (key, value) in data {
            merged.insert(key.clone(), value.clone());
        }
    }
    merged
}
