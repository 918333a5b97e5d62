//! WebSocket transport to an out-of-process host
//!
//! Each text frame carries one JSON [`Envelope`]. A reader task dispatches
//! inbound envelopes; a writer task drains the outbound queue so `emit` never
//! waits on the socket. When the reader stops, the writer closes the sink.

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, Notify};
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use super::{Envelope, EventHandler, EventHandlers, Transport};
use crate::error::{BridgeError, BridgeResult};

pub struct WebSocketTransport {
    url: String,
    outbound: mpsc::UnboundedSender<Envelope>,
    handlers: Arc<EventHandlers>,
    connected: Arc<AtomicBool>,
}

impl WebSocketTransport {
    /// Connect to the host, failing if it does not answer within `timeout`
    pub async fn connect(url: &str, timeout: Duration) -> Result<Arc<Self>> {
        info!("🔌 Connecting to host at {}", url);

        let (stream, _response) = tokio::time::timeout(timeout, tokio_tungstenite::connect_async(url))
            .await
            .with_context(|| format!("Timed out connecting to host at {}", url))?
            .with_context(|| format!("Failed to connect to host at {}", url))?;

        let (mut sink, mut source) = stream.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<Envelope>();
        let handlers = Arc::new(EventHandlers::new());
        let connected = Arc::new(AtomicBool::new(true));
        let reader_done = Arc::new(Notify::new());

        // Writer: outbound queue → socket
        let writer_connected = Arc::clone(&connected);
        let writer_stop = Arc::clone(&reader_done);
        tokio::spawn(async move {
            loop {
                let envelope = tokio::select! {
                    _ = writer_stop.notified() => break,
                    next = rx.recv() => match next {
                        Some(envelope) => envelope,
                        None => break,
                    },
                };
                let text = match serde_json::to_string(&envelope) {
                    Ok(text) => text,
                    Err(e) => {
                        warn!("Failed to encode event '{}': {}", envelope.identifier, e);
                        continue;
                    }
                };
                if let Err(e) = sink.send(Message::Text(text)).await {
                    warn!("⚠️  Host socket write failed: {}", e);
                    break;
                }
            }
            writer_connected.store(false, Ordering::SeqCst);
            let _ = sink.close().await;
            debug!("Host socket writer stopped");
        });

        // Reader: socket → handlers
        let reader_handlers = Arc::clone(&handlers);
        let reader_connected = Arc::clone(&connected);
        let reader_url = url.to_string();
        tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                match frame {
                    Ok(Message::Text(text)) => match serde_json::from_str::<Envelope>(&text) {
                        Ok(envelope) => {
                            debug!("📥 Host event '{}'", envelope.identifier);
                            reader_handlers.dispatch_envelope(envelope);
                        }
                        Err(e) => warn!("Ignoring malformed host frame: {}", e),
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(e) => {
                        warn!("⚠️  Host socket read failed: {}", e);
                        break;
                    }
                }
            }
            reader_connected.store(false, Ordering::SeqCst);
            // Stored permit if the writer is mid-send
            reader_done.notify_one();
            info!("Host connection to {} closed", reader_url);
        });

        info!("✅ Connected to host at {}", url);
        Ok(Arc::new(Self {
            url: url.to_string(),
            outbound: tx,
            handlers,
            connected,
        }))
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl Transport for WebSocketTransport {
    fn name(&self) -> &str {
        "websocket"
    }

    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    fn emit(&self, identifier: &str, payload: Value) -> BridgeResult<()> {
        if !self.is_connected() {
            return Err(BridgeError::TransportClosed);
        }
        self.outbound
            .send(Envelope::new(identifier, payload))
            .map_err(|e| BridgeError::Transport(e.to_string()))
    }

    fn add_event_listener(&self, identifier: &str, handler: EventHandler) {
        self.handlers.add(identifier, handler);
    }
}
