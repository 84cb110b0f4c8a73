//! Event layer — listener registry, dispatch and host binding.
//!
//! # Modules
//!
//! - [`listener`] — [`Listener`] handles and [`ListenerRecord`]s.
//! - [`event_core`] — [`EventCore`]: `on` / `once` / `off` / `fire`.
//! - [`host`] — the [`Host`] trait, [`BoundMethods`] and [`EventHub`].

pub mod event_core;
pub mod host;
pub mod listener;

pub use event_core::EventCore;
pub use host::{BoundMethods, EventHub, FireFn, Host, OffFn, OnFn, OnceFn};
pub use listener::{BoxError, HandlerResult, IntoHandlerResult, Listener, ListenerRecord};
