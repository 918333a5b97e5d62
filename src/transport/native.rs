//! Native function calls over a raw transport
//!
//! A call is emitted as `__juce__invoke {name, params, resultId}`. The host
//! answers with `__juce__complete {promiseId, result}`. Calls that are not
//! completed within the timeout fail; a late completion is dropped.

use dashmap::DashMap;
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, warn};

use super::Transport;
use crate::error::{BridgeError, BridgeResult};
use crate::wire::coerce_f64;

pub const INVOKE_EVENT: &str = "__juce__invoke";
pub const COMPLETE_EVENT: &str = "__juce__complete";

/// Default time a host gets to complete a native call
pub const DEFAULT_NATIVE_TIMEOUT_MS: u64 = 5000;

type PendingMap = DashMap<u64, oneshot::Sender<Value>>;

pub struct NativeInvoker {
    transport: Arc<dyn Transport>,
    pending: Arc<PendingMap>,
    next_id: AtomicU64,
    timeout: Duration,
}

impl NativeInvoker {
    /// Create an invoker and subscribe to completions on `transport`
    pub fn attach(transport: Arc<dyn Transport>, timeout: Duration) -> Arc<Self> {
        let pending: Arc<PendingMap> = Arc::new(DashMap::new());

        let completions = Arc::clone(&pending);
        transport.add_event_listener(
            COMPLETE_EVENT,
            Arc::new(move |payload: Value| {
                let id = payload.get("promiseId").map(coerce_f64).unwrap_or(-1.0);
                if id < 0.0 || id.fract() != 0.0 {
                    debug!("Ignoring completion without a valid promiseId");
                    return;
                }
                match completions.remove(&(id as u64)) {
                    Some((_, tx)) => {
                        let result = payload.get("result").cloned().unwrap_or(Value::Null);
                        let _ = tx.send(result);
                    }
                    None => debug!("Ignoring completion for unknown call {}", id),
                }
            }),
        );

        Arc::new(Self {
            transport,
            pending,
            next_id: AtomicU64::new(1),
            timeout,
        })
    }

    /// Number of calls awaiting completion
    pub fn pending_calls(&self) -> usize {
        self.pending.len()
    }

    pub async fn invoke(&self, name: &str, params: Vec<Value>) -> BridgeResult<Value> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let (tx, rx) = oneshot::channel();
        self.pending.insert(id, tx);

        let request = json!({ "name": name, "params": params, "resultId": id });
        if let Err(e) = self.transport.emit(INVOKE_EVENT, request) {
            self.pending.remove(&id);
            return Err(BridgeError::NativeFailed(format!("{}: {}", name, e)));
        }

        match tokio::time::timeout(self.timeout, rx).await {
            Ok(Ok(result)) => Ok(result),
            Ok(Err(_)) => Err(BridgeError::TransportClosed),
            Err(_) => {
                self.pending.remove(&id);
                warn!("⚠️  Native call '{}' timed out after {:?}", name, self.timeout);
                Err(BridgeError::NativeTimeout(name.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ChannelTransport;

    #[tokio::test]
    async fn test_invoke_resolves_on_completion() {
        let (transport, mut host) = ChannelTransport::pair("test");
        let invoker = NativeInvoker::attach(transport, Duration::from_secs(2));

        let call = {
            let invoker = Arc::clone(&invoker);
            tokio::spawn(async move { invoker.invoke("getChoiceItems", vec![json!("mode")]).await })
        };

        let request = host.recv().await.unwrap();
        assert_eq!(request.identifier, INVOKE_EVENT);
        assert_eq!(request.payload["name"], json!("getChoiceItems"));
        assert_eq!(request.payload["params"], json!(["mode"]));

        let id = request.payload["resultId"].clone();
        host.push(COMPLETE_EVENT, json!({"promiseId": id, "result": ["A", "B"]}));

        let result = call.await.unwrap().unwrap();
        assert_eq!(result, json!(["A", "B"]));
        assert_eq!(invoker.pending_calls(), 0);
    }

    #[tokio::test]
    async fn test_invoke_times_out() {
        let (transport, _host) = ChannelTransport::pair("test");
        let invoker = NativeInvoker::attach(transport, Duration::from_millis(20));

        let err = invoker.invoke("slow", vec![]).await.unwrap_err();
        assert_eq!(err, BridgeError::NativeTimeout("slow".into()));
        assert_eq!(invoker.pending_calls(), 0);
    }

    #[tokio::test]
    async fn test_invoke_on_closed_transport_fails_fast() {
        let (transport, _host) = ChannelTransport::pair("test");
        transport.disconnect();
        let invoker = NativeInvoker::attach(transport, Duration::from_secs(5));

        let err = invoker.invoke("any", vec![]).await.unwrap_err();
        assert!(matches!(err, BridgeError::NativeFailed(_)));
    }
}
