use std::fmt;
use thiserror::Error;

use crate::types::ListenerId;

// ---------------------------------------------------------------------------
// HandlerFailure
// ---------------------------------------------------------------------------

/// A single handler that returned an error or panicked during dispatch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HandlerFailure {
    pub listener_id: ListenerId,
    pub message: String,
}

impl fmt::Display for HandlerFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener #{}: {}", self.listener_id, self.message)
    }
}

impl std::error::Error for HandlerFailure {}

fn join_failures(failures: &[HandlerFailure]) -> String {
    failures
        .iter()
        .map(|f| f.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

// ---------------------------------------------------------------------------
// EventError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum EventError {
    #[error("Invalid event name: {0:?}")]
    InvalidEventName(String),

    #[error("Invalid listener: {0}")]
    InvalidListener(String),

    #[error("Invalid bind target: {0}")]
    InvalidTarget(String),

    #[error("Listener #{listener_id} for \"{event}\" failed: {message}")]
    HandlerFailed {
        event: String,
        listener_id: ListenerId,
        message: String,
    },

    #[error(
        "{} listener(s) for \"{}\" failed: {}",
        .failures.len(),
        .event,
        join_failures(.failures)
    )]
    Dispatch {
        event: String,
        failures: Vec<HandlerFailure>,
    },

    #[error("Host was dropped; bound method has no receiver")]
    HostDropped,
}

impl EventError {
    /// Short stable label for logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            EventError::InvalidEventName(_) => "invalid_event_name",
            EventError::InvalidListener(_) => "invalid_listener",
            EventError::InvalidTarget(_) => "invalid_target",
            EventError::HandlerFailed { .. } => "handler_failed",
            EventError::Dispatch { .. } => "dispatch_failed",
            EventError::HostDropped => "host_dropped",
        }
    }

    /// Every handler failure carried by this error, in dispatch order.
    pub fn failures(&self) -> Vec<HandlerFailure> {
        match self {
            EventError::HandlerFailed {
                listener_id,
                message,
                ..
            } => vec![HandlerFailure {
                listener_id: *listener_id,
                message: message.clone(),
            }],
            EventError::Dispatch { failures, .. } => failures.clone(),
            _ => Vec::new(),
        }
    }
}

/// Convenience alias — the default error type is `EventError`.
pub type Result<T, E = EventError> = std::result::Result<T, E>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
