//! WASM bindings for urban-events.
//!
//! Exposes [`UrbanBase`], a JS-facing host that owns one `EventCore`. JS
//! functions are wrapped as listeners, JS objects serve as receivers, and
//! payloads cross the boundary as plain JSON-compatible objects.

pub mod base;
pub mod conversions;
pub mod error;

pub use base::UrbanBase;
