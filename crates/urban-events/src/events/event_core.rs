//! EventCore — the listener registry and synchronous dispatcher owned by a host.
//!
//! Records are kept in registration order and dispatched in that order.
//! `fire` snapshots the matching records under the lock, releases it, and only
//! then calls listeners, so a listener may call `on`/`once`/`off`/`fire` on the
//! same core without deadlocking:
//!   - A record added during dispatch first runs on the next `fire`.
//!   - A record removed during dispatch is skipped if not yet reached.
//!   - A one-shot record is claimed and removed before its listener runs, so a
//!     re-entrant `fire` can never run it twice.
//!
//! Listener errors and panics are caught per listener. With the default
//! [`FailurePolicy::Isolate`] every matching listener still runs and the
//! failures are returned together once dispatch completes.

use std::any::Any;
use std::collections::HashSet;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock, Weak};

use parking_lot::Mutex;
use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::error::{EventError, HandlerFailure, Result};
use crate::payload::{into_payload, merge};
use crate::types::{
    validate_event_name, Context, CoreOptions, Event, FailurePolicy, ListenerId, ListenerOptions,
    Payload,
};

use super::host::BoundMethods;
use super::listener::{Listener, ListenerRecord};

/// Listener registry plus dispatcher. All methods take `&self`.
pub struct EventCore {
    records: Mutex<Vec<Arc<ListenerRecord>>>,
    next_id: AtomicU64,
    options: CoreOptions,
    /// Default receiver for records registered without a context.
    receiver: OnceLock<Weak<dyn Any + Send + Sync>>,
    /// Detached methods handed out by `Host::bind_all`.
    bound: OnceLock<BoundMethods>,
    /// Event names already reported as over `max_listeners`.
    warned: Mutex<HashSet<String>>,
}

impl EventCore {
    /// Create an empty core with default options.
    pub fn new() -> Self {
        Self::with_options(CoreOptions::default())
    }

    pub fn with_options(options: CoreOptions) -> Self {
        Self {
            records: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            options,
            receiver: OnceLock::new(),
            bound: OnceLock::new(),
            warned: Mutex::new(HashSet::new()),
        }
    }

    pub fn options(&self) -> &CoreOptions {
        &self.options
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register `listener` for `event`.
    ///
    /// Registering the same listener twice creates two independent records.
    pub fn on(&self, event: &str, listener: Listener) -> Result<ListenerId> {
        self.register(event, ListenerOptions::default(), listener, false)
    }

    /// Register with an explicit context and/or default data.
    pub fn on_with(
        &self,
        event: &str,
        options: ListenerOptions,
        listener: Listener,
    ) -> Result<ListenerId> {
        self.register(event, options, listener, false)
    }

    /// Register a listener that runs on the next matching `fire` only.
    pub fn once(&self, event: &str, listener: Listener) -> Result<ListenerId> {
        self.register(event, ListenerOptions::default(), listener, true)
    }

    pub fn once_with(
        &self,
        event: &str,
        options: ListenerOptions,
        listener: Listener,
    ) -> Result<ListenerId> {
        self.register(event, options, listener, true)
    }

    fn register(
        &self,
        event: &str,
        options: ListenerOptions,
        listener: Listener,
        once: bool,
    ) -> Result<ListenerId> {
        validate_event_name(event)?;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let record = Arc::new(ListenerRecord::new(id, event, listener, options, once));

        let attached = {
            let mut records = self.records.lock();
            records.push(record);
            records.iter().filter(|r| r.event() == event).count()
        };
        trace!(event, id, once, attached, "listener registered");

        self.check_listener_limit(event, attached);
        Ok(id)
    }

    fn check_listener_limit(&self, event: &str, attached: usize) {
        let max = self.options.max_listeners;
        if max == 0 || attached <= max {
            return;
        }
        if self.warned.lock().insert(event.to_string()) {
            warn!(
                event,
                attached,
                max,
                "listener limit exceeded; possible leak"
            );
        }
    }

    // ========================================================================
    // Removal
    // ========================================================================

    /// Remove listeners for `event`.
    ///
    /// With `Some(listener)` only records holding that listener are removed;
    /// with `None` every record for `event` is. Returns the number removed.
    pub fn off(&self, event: &str, listener: Option<&Listener>) -> Result<usize> {
        validate_event_name(event)?;
        let removed = self.remove_where(|r| r.matches(event, listener));
        trace!(event, removed, all = listener.is_none(), "listeners removed");
        Ok(removed)
    }

    /// Remove a single registration by id. Safe to call repeatedly.
    pub fn remove(&self, id: ListenerId) -> bool {
        self.remove_where(|r| r.id() == id) > 0
    }

    /// Drop every record.
    pub fn clear(&self) {
        let removed = self.remove_where(|_| true);
        trace!(removed, "registry cleared");
    }

    fn remove_where(&self, pred: impl Fn(&ListenerRecord) -> bool) -> usize {
        let removed: Vec<Arc<ListenerRecord>> = {
            let mut records = self.records.lock();
            let (removed, kept): (Vec<_>, Vec<_>) =
                std::mem::take(&mut *records).into_iter().partition(|r| pred(r.as_ref()));
            *records = kept;
            removed
        };
        for record in &removed {
            record.deactivate();
        }
        removed.len()
    }

    // ========================================================================
    // Dispatch
    // ========================================================================

    /// Fire `event` with no emission-time data.
    ///
    /// Returns the number of listeners invoked. Unknown events are a no-op.
    pub fn fire(&self, event: &str) -> Result<usize> {
        self.dispatch(event, None)
    }

    /// Fire `event` with emission-time data, which takes precedence over each
    /// listener's registration-time defaults.
    pub fn fire_with(&self, event: &str, data: impl Into<Value>) -> Result<usize> {
        let data = into_payload(data.into());
        self.dispatch(event, Some(&data))
    }

    fn dispatch(&self, event: &str, data: Option<&Payload>) -> Result<usize> {
        validate_event_name(event)?;

        let snapshot: Vec<Arc<ListenerRecord>> = {
            let records = self.records.lock();
            records
                .iter()
                .filter(|r| r.event() == event)
                .cloned()
                .collect()
        };
        if snapshot.is_empty() {
            trace!(event, "no listeners");
            return Ok(0);
        }

        let host = self.receiver();
        let mut invoked = 0;
        let mut failures = Vec::new();

        for record in snapshot {
            if record.is_once() {
                if !record.deactivate() {
                    continue;
                }
                let id = record.id();
                self.records.lock().retain(|r| r.id() != id);
            } else if !record.is_active() {
                continue;
            }

            let receiver = record.context().cloned().or_else(|| host.clone());
            let payload = merge(record.default_args(), data);
            let evt = Event::new(event, payload, receiver);

            invoked += 1;
            if let Err(message) = invoke(record.listener(), &evt) {
                warn!(event, listener_id = record.id(), %message, "listener failed");
                match self.options.failure_policy {
                    FailurePolicy::Propagate => {
                        return Err(EventError::HandlerFailed {
                            event: event.to_string(),
                            listener_id: record.id(),
                            message,
                        });
                    }
                    FailurePolicy::Isolate => failures.push(HandlerFailure {
                        listener_id: record.id(),
                        message,
                    }),
                }
            }
        }

        debug!(event, invoked, failed = failures.len(), "event dispatched");
        if failures.is_empty() {
            Ok(invoked)
        } else {
            Err(EventError::Dispatch {
                event: event.to_string(),
                failures,
            })
        }
    }

    // ========================================================================
    // Receiver binding
    // ========================================================================

    /// Install the default receiver. The first call wins; later calls return
    /// `false` and change nothing.
    pub fn bind_receiver(&self, receiver: Weak<dyn Any + Send + Sync>) -> bool {
        self.receiver.set(receiver).is_ok()
    }

    /// The bound default receiver, if one is installed and still alive.
    pub fn receiver(&self) -> Option<Context> {
        self.receiver.get().and_then(Weak::upgrade)
    }

    pub(crate) fn bound(&self) -> &OnceLock<BoundMethods> {
        &self.bound
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    /// Number of registered records.
    pub fn len(&self) -> usize {
        self.records.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.lock().is_empty()
    }

    /// Number of records registered for `event`.
    pub fn listener_count(&self, event: &str) -> usize {
        self.records
            .lock()
            .iter()
            .filter(|r| r.event() == event)
            .count()
    }

    /// Distinct event names in first-registration order.
    pub fn event_names(&self) -> Vec<String> {
        let records = self.records.lock();
        let mut seen = HashSet::new();
        records
            .iter()
            .filter(|r| seen.insert(r.event()))
            .map(|r| r.event().to_string())
            .collect()
    }

    /// Snapshot of the registry in registration order.
    pub fn records(&self) -> Vec<Arc<ListenerRecord>> {
        self.records.lock().clone()
    }
}

impl Default for EventCore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for EventCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventCore")
            .field("records", &self.len())
            .field("options", &self.options)
            .field("bound", &self.receiver.get().is_some())
            .finish()
    }
}

/// Run one listener, turning returned errors and panics into a message.
fn invoke(listener: &Listener, event: &Event) -> std::result::Result<(), String> {
    match panic::catch_unwind(AssertUnwindSafe(|| listener.call(event))) {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(e.to_string()),
        Err(payload) => Err(panic_message(payload.as_ref())),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(msg) = payload.downcast_ref::<&'static str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic".to_string()
    }
}
