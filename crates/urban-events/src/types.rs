use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::{EventError, Result};

/// Registration handle returned by `on`/`once`; unique per `EventCore`.
pub type ListenerId = u64;

/// The flat detail object handed to listeners.
pub type Payload = Map<String, Value>;

/// An explicit receiver object a listener runs against.
pub type Context = Arc<dyn Any + Send + Sync>;

/// Reject empty or whitespace-only event names.
pub(crate) fn validate_event_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(EventError::InvalidEventName(name.to_string()));
    }
    Ok(())
}

// ============================================================================
// Options
// ============================================================================

/// Per-registration options: an explicit receiver and registration-time data.
#[derive(Clone, Default)]
pub struct ListenerOptions {
    /// Receiver for the listener. Falls back to the bound host when `None`.
    pub context: Option<Context>,
    /// Data merged beneath emission-time data on every dispatch.
    pub default_args: Option<Value>,
}

impl ListenerOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use `context` as the listener's receiver.
    pub fn with_context<T: Any + Send + Sync>(mut self, context: Arc<T>) -> Self {
        self.context = Some(context);
        self
    }

    /// Use an already type-erased receiver.
    pub fn with_receiver(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    /// Registration-time data. Objects are merged key by key; any other
    /// value lands under the `data` key.
    pub fn with_args(mut self, args: impl Into<Value>) -> Self {
        self.default_args = Some(args.into());
        self
    }
}

impl fmt::Debug for ListenerOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListenerOptions")
            .field("context", &self.context.is_some())
            .field("default_args", &self.default_args)
            .finish()
    }
}

/// What `fire` does when a listener returns an error or panics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Keep dispatching to the remaining listeners, then report every
    /// failure together as `EventError::Dispatch`.
    #[default]
    Isolate,
    /// Stop at the first failure and return `EventError::HandlerFailed`.
    Propagate,
}

/// Construction options for an `EventCore`.
#[derive(Debug, Clone, Default)]
pub struct CoreOptions {
    pub failure_policy: FailurePolicy,
    /// Warn once per event name when more listeners than this are attached.
    /// `0` disables the check.
    pub max_listeners: usize,
}

// ============================================================================
// Event
// ============================================================================

/// The value every listener receives: the event name, the merged payload and
/// the receiver the listener was registered against.
#[derive(Clone, Serialize)]
pub struct Event {
    name: String,
    detail: Payload,
    #[serde(skip)]
    receiver: Option<Context>,
}

impl Event {
    pub fn new(name: impl Into<String>, detail: Payload, receiver: Option<Context>) -> Self {
        Self {
            name: name.into(),
            detail,
            receiver,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn detail(&self) -> &Payload {
        &self.detail
    }

    /// Shorthand for `detail().get(key)`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.detail.get(key)
    }

    /// The explicit context, or the bound host when none was given.
    pub fn receiver(&self) -> Option<&Context> {
        self.receiver.as_ref()
    }

    /// The receiver downcast to a concrete type.
    pub fn receiver_as<T: Any>(&self) -> Option<&T> {
        self.receiver.as_deref()?.downcast_ref::<T>()
    }

    pub fn into_detail(self) -> Payload {
        self.detail
    }
}

impl fmt::Debug for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Event")
            .field("name", &self.name)
            .field("detail", &self.detail)
            .field("receiver", &self.receiver.is_some())
            .finish()
    }
}
