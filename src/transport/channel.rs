//! In-process transport for hosts embedding the bridge in the same process

use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::debug;

use super::{Envelope, EventHandler, EventHandlers, Transport};
use crate::error::{BridgeError, BridgeResult};

/// Surface side of an in-process connection
///
/// Events emitted by the surface are queued for the [`HostEndpoint`]; events
/// the host pushes are dispatched synchronously to registered handlers.
pub struct ChannelTransport {
    name: String,
    outbound: mpsc::UnboundedSender<Envelope>,
    handlers: EventHandlers,
    connected: AtomicBool,
}

/// Host side of an in-process connection
pub struct HostEndpoint {
    inbound: mpsc::UnboundedReceiver<Envelope>,
    transport: Arc<ChannelTransport>,
}

impl ChannelTransport {
    /// Create a connected transport and its host endpoint
    pub fn pair(name: impl Into<String>) -> (Arc<Self>, HostEndpoint) {
        let (tx, rx) = mpsc::unbounded_channel();
        let transport = Arc::new(Self {
            name: name.into(),
            outbound: tx,
            handlers: EventHandlers::new(),
            connected: AtomicBool::new(true),
        });

        let endpoint = HostEndpoint {
            inbound: rx,
            transport: Arc::clone(&transport),
        };
        (transport, endpoint)
    }

    /// Mark the host as gone; further emits fail
    pub fn disconnect(&self) {
        if self.connected.swap(false, Ordering::SeqCst) {
            debug!("Channel transport '{}' disconnected", self.name);
        }
    }
}

impl Transport for ChannelTransport {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && !self.outbound.is_closed()
    }

    fn emit(&self, identifier: &str, payload: Value) -> BridgeResult<()> {
        if !self.connected.load(Ordering::SeqCst) {
            return Err(BridgeError::TransportClosed);
        }
        self.outbound
            .send(Envelope::new(identifier, payload))
            .map_err(|_| BridgeError::TransportClosed)
    }

    fn add_event_listener(&self, identifier: &str, handler: EventHandler) {
        self.handlers.add(identifier, handler);
    }
}

impl HostEndpoint {
    /// Wait for the next event emitted by the surface
    pub async fn recv(&mut self) -> Option<Envelope> {
        self.inbound.recv().await
    }

    /// Next queued event, if any
    pub fn try_recv(&mut self) -> Option<Envelope> {
        self.inbound.try_recv().ok()
    }

    /// All queued events
    pub fn drain(&mut self) -> Vec<Envelope> {
        let mut out = Vec::new();
        while let Ok(envelope) = self.inbound.try_recv() {
            out.push(envelope);
        }
        out
    }

    /// Deliver an event to the surface; returns the number of handlers reached
    pub fn push(&self, identifier: &str, payload: Value) -> usize {
        self.transport.handlers.dispatch(identifier, payload)
    }

    pub fn transport(&self) -> &Arc<ChannelTransport> {
        &self.transport
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_emit_reaches_host() {
        let (transport, mut host) = ChannelTransport::pair("test");
        transport.emit("id", json!({"x": 1})).unwrap();

        let env = host.try_recv().unwrap();
        assert_eq!(env.identifier, "id");
        assert_eq!(env.payload, json!({"x": 1}));
        assert!(host.try_recv().is_none());
    }

    #[test]
    fn test_push_reaches_listeners() {
        let (transport, host) = ChannelTransport::pair("test");
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&hits);
        transport.add_event_listener(
            "id",
            Arc::new(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            }),
        );

        assert_eq!(host.push("id", json!(null)), 1);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_disconnect_rejects_emit() {
        let (transport, _host) = ChannelTransport::pair("test");
        assert!(transport.is_connected());

        transport.disconnect();
        assert!(!transport.is_connected());
        assert_eq!(
            transport.emit("id", json!(null)),
            Err(BridgeError::TransportClosed)
        );
    }

    #[test]
    fn test_dropped_host_reports_disconnected() {
        let (transport, host) = ChannelTransport::pair("test");
        drop(host);
        assert!(!transport.is_connected());
        assert!(transport.emit("id", json!(null)).is_err());
    }
}
