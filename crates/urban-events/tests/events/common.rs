//! Shared helpers for the event integration tests.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;
use urban_events::{EventCore, Host};

/// A shared call-log that listeners append to.
pub fn make_log() -> Arc<Mutex<Vec<String>>> {
    Arc::new(Mutex::new(Vec::new()))
}

/// Stand-in for the `urban-base` element: a host with one mutable property.
#[derive(Debug, Default)]
pub struct TestBase {
    pub core: EventCore,
    pub added_prop: Mutex<Option<String>>,
}

impl TestBase {
    pub fn new() -> Arc<Self> {
        let base = Arc::new(Self::default());
        base.bind_all();
        base
    }
}

impl Host for TestBase {
    fn events(&self) -> &EventCore {
        &self.core
    }
}

/// An unrelated receiver object supplied as an explicit context.
#[derive(Debug, Default)]
pub struct Ctx {
    pub added_prop: Mutex<Option<String>>,
}

/// Counts `WARN` events, for asserting on de-duplicated warnings.
#[derive(Debug, Clone, Default)]
pub struct WarnCounter(Arc<AtomicUsize>);

impl WarnCounter {
    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

impl<S: Subscriber> Layer<S> for WarnCounter {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() == Level::WARN {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }
}
