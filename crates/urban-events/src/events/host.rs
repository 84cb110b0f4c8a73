//! Host objects and the bind step.
//!
//! A host owns exactly one [`EventCore`] and exposes it through [`Host`].
//! [`Host::bind_all`] installs the host as the default listener receiver and
//! hands out [`BoundMethods`]: detached `on`/`once`/`off`/`fire` closures that
//! keep working wherever they are passed, because each one carries its host.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

use serde_json::Value;
use tracing::debug;

use crate::error::{EventError, Result};
use crate::types::{CoreOptions, ListenerId, ListenerOptions};

use super::event_core::EventCore;
use super::listener::Listener;

pub type OnFn = Arc<dyn Fn(&str, ListenerOptions, Listener) -> Result<ListenerId> + Send + Sync>;
pub type OnceFn = Arc<dyn Fn(&str, Listener) -> Result<ListenerId> + Send + Sync>;
pub type OffFn = Arc<dyn Fn(&str, Option<&Listener>) -> Result<usize> + Send + Sync>;
pub type FireFn = Arc<dyn Fn(&str, Option<Value>) -> Result<usize> + Send + Sync>;

/// Host methods with the receiver captured, safe to store or pass around.
///
/// They hold the host weakly; once it is dropped every call returns
/// [`EventError::HostDropped`].
#[derive(Clone)]
pub struct BoundMethods {
    pub on: OnFn,
    pub once: OnceFn,
    pub off: OffFn,
    pub fire: FireFn,
}

impl BoundMethods {
    fn for_host<H: Host>(host: Weak<H>) -> Self {
        let h = host.clone();
        let on: OnFn = Arc::new(
            move |event: &str, options: ListenerOptions, listener: Listener| {
                upgrade(&h)?.events().on_with(event, options, listener)
            },
        );

        let h = host.clone();
        let once: OnceFn = Arc::new(move |event: &str, listener: Listener| {
            upgrade(&h)?.events().once(event, listener)
        });

        let h = host.clone();
        let off: OffFn = Arc::new(move |event: &str, listener: Option<&Listener>| {
            upgrade(&h)?.events().off(event, listener)
        });

        let fire: FireFn = Arc::new(move |event: &str, data: Option<Value>| {
            let host = upgrade(&host)?;
            match data {
                Some(data) => host.events().fire_with(event, data),
                None => host.events().fire(event),
            }
        });

        Self {
            on,
            once,
            off,
            fire,
        }
    }
}

fn upgrade<H>(host: &Weak<H>) -> Result<Arc<H>> {
    host.upgrade().ok_or(EventError::HostDropped)
}

impl fmt::Debug for BoundMethods {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoundMethods").finish_non_exhaustive()
    }
}

// ============================================================================
// Host
// ============================================================================

/// An object that owns an [`EventCore`] and exposes the event operations.
///
/// Implementors only provide [`Host::events`]; everything else forwards.
pub trait Host: Send + Sync + 'static {
    fn events(&self) -> &EventCore;

    fn on(&self, event: &str, listener: Listener) -> Result<ListenerId> {
        self.events().on(event, listener)
    }

    fn on_with(
        &self,
        event: &str,
        options: ListenerOptions,
        listener: Listener,
    ) -> Result<ListenerId> {
        self.events().on_with(event, options, listener)
    }

    fn once(&self, event: &str, listener: Listener) -> Result<ListenerId> {
        self.events().once(event, listener)
    }

    fn off(&self, event: &str, listener: Option<&Listener>) -> Result<usize> {
        self.events().off(event, listener)
    }

    fn fire(&self, event: &str) -> Result<usize> {
        self.events().fire(event)
    }

    fn fire_with(&self, event: &str, data: Value) -> Result<usize> {
        self.events().fire_with(event, data)
    }

    /// Make this host the default receiver of its listeners and return the
    /// detached methods.
    ///
    /// Idempotent: every call after the first returns clones of the same
    /// closures.
    fn bind_all(self: &Arc<Self>) -> BoundMethods
    where
        Self: Sized,
    {
        let core = self.events();
        let weak = Arc::downgrade(self);
        let receiver: Weak<dyn Any + Send + Sync> = weak.clone();
        if core.bind_receiver(receiver) {
            debug!(host = std::any::type_name::<Self>(), "host bound");
        }
        core.bound()
            .get_or_init(|| BoundMethods::for_host(weak))
            .clone()
    }
}

// ============================================================================
// EventHub
// ============================================================================

/// A minimal host with nothing but an event core, bound on construction.
#[derive(Debug)]
pub struct EventHub {
    core: EventCore,
}

impl EventHub {
    pub fn new() -> Arc<Self> {
        Self::with_options(CoreOptions::default())
    }

    pub fn with_options(options: CoreOptions) -> Arc<Self> {
        let hub = Arc::new(Self {
            core: EventCore::with_options(options),
        });
        hub.bind_all();
        hub
    }
}

impl Host for EventHub {
    fn events(&self) -> &EventCore {
        &self.core
    }
}
