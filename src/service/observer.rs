//! Observability hook for calls.
//!
//! The dispatcher reports every call to an injected [`CallObserver`]
//! instead of logging on its own. Closures taking `&CallEvent` are
//! observers, so tests can capture events directly.
//!
//! # Example
//!
//! ```
//! use std::sync::{Arc, Mutex};
//! use pingwire::service::{CallEvent, CallObserver};
//!
//! let seen = Arc::new(Mutex::new(Vec::new()));
//! let sink = seen.clone();
//! let observer = move |event: &CallEvent<'_>| {
//!     if let CallEvent::Request { message, .. } = event {
//!         sink.lock().unwrap().push(message.to_string());
//!     }
//! };
//! observer.observe(&CallEvent::Request { method: "/ping.PingService/Ping", message: "hi" });
//! assert_eq!(seen.lock().unwrap().as_slice(), ["hi"]);
//! ```

use std::time::Duration;

use crate::status::Status;

/// Something that happened during a call.
#[derive(Debug)]
pub enum CallEvent<'a> {
    /// Request decoded, handler about to run.
    Request { method: &'a str, message: &'a str },
    /// Call finished with `status`.
    Response {
        method: &'a str,
        status: &'a Status,
        elapsed: Duration,
    },
}

/// Receiver of call events.
pub trait CallObserver: Send + Sync + 'static {
    fn observe(&self, event: &CallEvent<'_>);
}

impl<F> CallObserver for F
where
    F: Fn(&CallEvent<'_>) + Send + Sync + 'static,
{
    fn observe(&self, event: &CallEvent<'_>) {
        self(event)
    }
}

/// Logs every call through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingObserver;

impl CallObserver for TracingObserver {
    fn observe(&self, event: &CallEvent<'_>) {
        match event {
            CallEvent::Request { method, message } => {
                tracing::info!(method, text = *message, "Received message");
            }
            CallEvent::Response {
                method,
                status,
                elapsed,
            } if status.is_ok() => {
                tracing::info!(method, elapsed_us = elapsed.as_micros() as u64, "Call completed");
            }
            CallEvent::Response {
                method,
                status,
                elapsed,
            } => {
                tracing::warn!(
                    method,
                    code = ?status.code(),
                    error = status.message(),
                    elapsed_us = elapsed.as_micros() as u64,
                    "Call failed"
                );
            }
        }
    }
}

/// Discards all events.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl CallObserver for NoopObserver {
    fn observe(&self, _event: &CallEvent<'_>) {}
}
