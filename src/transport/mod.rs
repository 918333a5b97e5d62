//! Raw event transports connecting the bridge to a host process
//!
//! A transport moves `(identifier, payload)` pairs in both directions. It knows
//! nothing about parameter semantics; states interpret the payloads.

use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::trace;

use crate::error::BridgeResult;

pub mod channel;
pub mod native;
pub mod websocket;

pub use channel::{ChannelTransport, HostEndpoint};
pub use native::NativeInvoker;
pub use websocket::WebSocketTransport;

/// Callback for inbound events on one identifier
pub type EventHandler = Arc<dyn Fn(Value) + Send + Sync>;

/// One event on the wire
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    pub identifier: String,
    #[serde(default)]
    pub payload: Value,
}

impl Envelope {
    pub fn new(identifier: impl Into<String>, payload: Value) -> Self {
        Self {
            identifier: identifier.into(),
            payload,
        }
    }
}

/// Transport trait - every host connection implements this
///
/// All methods take `&self` so a transport can be shared as `Arc<dyn Transport>`.
/// `emit` never blocks: implementations queue the event and return.
pub trait Transport: Send + Sync {
    /// Transport name for logs (e.g., "websocket", "channel")
    fn name(&self) -> &str;

    /// Whether the host end is currently reachable
    fn is_connected(&self) -> bool;

    /// Send an event to the host
    fn emit(&self, identifier: &str, payload: Value) -> BridgeResult<()>;

    /// Register a handler for events the host sends on `identifier`
    fn add_event_listener(&self, identifier: &str, handler: EventHandler);
}

/// Identifier-keyed handler table shared by the transport implementations
#[derive(Default)]
pub struct EventHandlers {
    handlers: DashMap<String, Vec<EventHandler>>,
}

impl EventHandlers {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, identifier: &str, handler: EventHandler) {
        self.handlers
            .entry(identifier.to_string())
            .or_default()
            .push(handler);
    }

    /// Deliver `payload` to every handler registered for `identifier`
    ///
    /// Returns the number of handlers invoked.
    pub fn dispatch(&self, identifier: &str, payload: Value) -> usize {
        // Clone out of the map so handlers can register further handlers
        let handlers = match self.handlers.get(identifier) {
            Some(entry) => entry.value().clone(),
            None => {
                trace!("No handler for '{}'", identifier);
                return 0;
            }
        };

        for handler in &handlers {
            handler(payload.clone());
        }
        handlers.len()
    }

    pub fn dispatch_envelope(&self, envelope: Envelope) -> usize {
        self.dispatch(&envelope.identifier, envelope.payload)
    }

    pub fn has_listener(&self, identifier: &str) -> bool {
        self.handlers.contains_key(identifier)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_dispatch_by_identifier() {
        let handlers = EventHandlers::new();
        let hits = Arc::new(AtomicUsize::new(0));

        let counter = Arc::clone(&hits);
        handlers.add(
            "a",
            Arc::new(move |payload| {
                assert_eq!(payload, json!(1));
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert_eq!(handlers.dispatch("a", json!(1)), 1);
        assert_eq!(handlers.dispatch("b", json!(1)), 0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_envelope_parses_without_payload() {
        let env: Envelope = serde_json::from_value(json!({"identifier": "x"})).unwrap();
        assert_eq!(env.payload, Value::Null);
    }
}
