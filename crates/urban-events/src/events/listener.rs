//! Listener handles and registry records.
//!
//! A [`Listener`] is a cheaply cloneable handle around a shared closure. Its
//! identity is the identity of that closure: clones of one handle compare
//! equal, two handles built from separate closures never do. `off` relies on
//! this to remove a specific listener.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::payload::into_payload;
use crate::types::{Context, Event, ListenerId, ListenerOptions, Payload};

/// Error type listeners may return.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Normalized listener outcome.
pub type HandlerResult = Result<(), BoxError>;

/// Return types accepted from listener closures.
pub trait IntoHandlerResult {
    fn into_handler_result(self) -> HandlerResult;
}

impl IntoHandlerResult for () {
    fn into_handler_result(self) -> HandlerResult {
        Ok(())
    }
}

impl<E: Into<BoxError>> IntoHandlerResult for Result<(), E> {
    fn into_handler_result(self) -> HandlerResult {
        self.map_err(Into::into)
    }
}

type HandlerFn = dyn Fn(&Event) -> HandlerResult + Send + Sync;

// ============================================================================
// Listener
// ============================================================================

/// A registrable event handler.
#[derive(Clone)]
pub struct Listener(Arc<HandlerFn>);

impl Listener {
    /// Wrap a closure. It may return `()` or `Result<(), E>`.
    pub fn new<F, R>(f: F) -> Self
    where
        F: Fn(&Event) -> R + Send + Sync + 'static,
        R: IntoHandlerResult,
    {
        Self(Arc::new(move |event: &Event| f(event).into_handler_result()))
    }

    /// True when both handles share the same underlying closure.
    pub fn same(&self, other: &Listener) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.0) as *const (),
            Arc::as_ptr(&other.0) as *const (),
        )
    }

    pub(crate) fn call(&self, event: &Event) -> HandlerResult {
        (self.0)(event)
    }
}

impl PartialEq for Listener {
    fn eq(&self, other: &Self) -> bool {
        self.same(other)
    }
}

impl Eq for Listener {}

impl fmt::Debug for Listener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Listener({:p})", Arc::as_ptr(&self.0) as *const ())
    }
}

// ============================================================================
// ListenerRecord
// ============================================================================

/// One registration: the event it is attached to, the caller's listener and
/// the receiver/default data it runs with.
///
/// `active` goes false once the record is removed or, for one-shot records,
/// claimed by a dispatch. In-flight dispatches skip inactive records.
pub struct ListenerRecord {
    id: ListenerId,
    event: String,
    listener: Listener,
    context: Option<Context>,
    default_args: Option<Payload>,
    once: bool,
    active: AtomicBool,
}

impl ListenerRecord {
    pub(crate) fn new(
        id: ListenerId,
        event: &str,
        listener: Listener,
        options: ListenerOptions,
        once: bool,
    ) -> Self {
        Self {
            id,
            event: event.to_string(),
            listener,
            context: options.context,
            default_args: options.default_args.map(into_payload),
            once,
            active: AtomicBool::new(true),
        }
    }

    pub fn id(&self) -> ListenerId {
        self.id
    }

    pub fn event(&self) -> &str {
        &self.event
    }

    pub fn listener(&self) -> &Listener {
        &self.listener
    }

    pub fn context(&self) -> Option<&Context> {
        self.context.as_ref()
    }

    pub fn default_args(&self) -> Option<&Payload> {
        self.default_args.as_ref()
    }

    pub fn is_once(&self) -> bool {
        self.once
    }

    pub(crate) fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Mark inactive. Returns `true` for the caller that flipped the flag,
    /// which is how a one-shot record is claimed exactly once.
    pub(crate) fn deactivate(&self) -> bool {
        self.active.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn matches(&self, event: &str, listener: Option<&Listener>) -> bool {
        self.event == event && listener.is_none_or(|l| self.listener.same(l))
    }
}

impl fmt::Debug for ListenerRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerRecord")
            .field("id", &self.id)
            .field("event", &self.event)
            .field("listener", &self.listener)
            .field("context", &self.context.is_some())
            .field("default_args", &self.default_args)
            .field("once", &self.once)
            .finish()
    }
}
