//! In-process publish/subscribe core for `urban-base` style host objects.
//!
//! A host owns one [`EventCore`]. Code registers interest with `on`/`once`,
//! removes it with `off`, and `fire` runs every matching listener
//! synchronously, in registration order, with a payload merged from the
//! listener's registration-time defaults and the emission-time data.
//!
//! ```
//! use serde_json::json;
//! use urban_events::{EventHub, Host, Listener, ListenerOptions};
//!
//! let hub = EventHub::new();
//! hub.on_with(
//!     "save",
//!     ListenerOptions::new().with_args(json!({ "source": "toolbar" })),
//!     Listener::new(|event| {
//!         assert_eq!(event.get("source"), Some(&json!("toolbar")));
//!         assert_eq!(event.get("id"), Some(&json!(7)));
//!     }),
//! )?;
//!
//! let fire = hub.bind_all().fire;
//! assert_eq!(fire("save", Some(json!({ "id": 7 })))?, 1);
//! # Ok::<(), urban_events::EventError>(())
//! ```

pub mod error;
pub mod events;
pub mod payload;
pub mod types;

pub use error::{EventError, HandlerFailure, Result};
pub use events::{BoundMethods, EventCore, EventHub, Host, Listener, ListenerRecord};
pub use types::{
    Context, CoreOptions, Event, FailurePolicy, ListenerId, ListenerOptions, Payload,
};
