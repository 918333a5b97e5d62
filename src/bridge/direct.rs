//! Bridge over a raw event transport

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{
    BridgeKind, BridgeProvider, EmptyListFunction, InvokedFunction, NativeFunction, StateRegistry,
    UnavailableFunction, CHOICE_ITEMS_FUNCTION,
};
use crate::params::{
    BooleanState, ContinuousProperties, ContinuousState, EnumeratedProperties, EnumeratedState,
    ParameterState,
};
use crate::transport::native::DEFAULT_NATIVE_TIMEOUT_MS;
use crate::transport::{NativeInvoker, Transport};
use crate::wire::WireMessage;

/// How a direct bridge answers native function lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NativeCallMode {
    /// Choice items resolve to an empty list; every other function is unavailable
    #[default]
    Stub,
    /// Calls are forwarded to the host and completed asynchronously
    Invoke,
}

#[derive(Debug, Clone)]
pub struct DirectOptions {
    pub native_calls: NativeCallMode,
    pub native_timeout: Duration,
}

impl Default for DirectOptions {
    fn default() -> Self {
        Self {
            native_calls: NativeCallMode::Stub,
            native_timeout: Duration::from_millis(DEFAULT_NATIVE_TIMEOUT_MS),
        }
    }
}

/// Shared construction for transport-backed bridges
///
/// A new state subscribes to its transport key and asks the host for its
/// current value once.
pub(crate) struct TransportStates {
    transport: Arc<dyn Transport>,
    registry: StateRegistry,
}

impl TransportStates {
    pub(crate) fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            registry: StateRegistry::default(),
        }
    }

    pub(crate) fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub(crate) fn state_count(&self) -> usize {
        self.registry.len()
    }

    pub(crate) fn continuous(&self, name: &str) -> Arc<ContinuousState> {
        self.registry.continuous_or_insert_with(name, || {
            self.attach(Arc::new(ContinuousState::new(
                name,
                Some(Arc::clone(&self.transport)),
                0.0,
                ContinuousProperties::default(),
            )))
        })
    }

    pub(crate) fn boolean(&self, name: &str) -> Arc<BooleanState> {
        self.registry.boolean_or_insert_with(name, || {
            self.attach(Arc::new(BooleanState::new(
                name,
                Some(Arc::clone(&self.transport)),
                false,
            )))
        })
    }

    pub(crate) fn enumerated(&self, name: &str) -> Arc<EnumeratedState> {
        self.registry.enumerated_or_insert_with(name, || {
            self.attach(Arc::new(EnumeratedState::new(
                name,
                Some(Arc::clone(&self.transport)),
                0.0,
                EnumeratedProperties::default(),
            )))
        })
    }

    fn attach<S: ParameterState + 'static>(&self, state: Arc<S>) -> Arc<S> {
        let key = state.transport_key().to_string();
        let weak: Weak<S> = Arc::downgrade(&state);

        self.transport.add_event_listener(
            &key,
            Arc::new(move |payload| {
                let Some(state) = weak.upgrade() else {
                    return;
                };
                match WireMessage::from_payload(&payload) {
                    Ok(message) => state.apply_remote(&message),
                    Err(e) => warn!("Ignoring payload for '{}': {}", state.transport_key(), e),
                }
            }),
        );

        if let Err(e) = self
            .transport
            .emit(&key, WireMessage::RequestInitialUpdate.to_payload())
        {
            warn!("⚠️  Initial update request for '{}' failed: {}", key, e);
        }
        debug!("Attached {} state '{}'", state.kind(), state.name());
        state
    }
}

pub struct DirectBridge {
    states: TransportStates,
    invoker: Option<Arc<NativeInvoker>>,
}

impl DirectBridge {
    pub fn new(transport: Arc<dyn Transport>, options: DirectOptions) -> Self {
        let invoker = match options.native_calls {
            NativeCallMode::Stub => None,
            NativeCallMode::Invoke => Some(NativeInvoker::attach(
                Arc::clone(&transport),
                options.native_timeout,
            )),
        };

        info!(
            "🔗 Direct bridge over '{}' (native calls: {:?})",
            transport.name(),
            options.native_calls
        );
        Self {
            states: TransportStates::new(transport),
            invoker,
        }
    }

    pub fn state_count(&self) -> usize {
        self.states.state_count()
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        self.states.transport()
    }
}

impl BridgeProvider for DirectBridge {
    fn kind(&self) -> BridgeKind {
        BridgeKind::Direct
    }

    fn transport_connected(&self) -> bool {
        self.states.transport().is_connected()
    }

    fn continuous(&self, name: &str) -> Arc<ContinuousState> {
        self.states.continuous(name)
    }

    fn boolean(&self, name: &str) -> Arc<BooleanState> {
        self.states.boolean(name)
    }

    fn enumerated(&self, name: &str) -> Arc<EnumeratedState> {
        self.states.enumerated(name)
    }

    fn native_function(&self, identifier: &str) -> Option<Arc<dyn NativeFunction>> {
        let function: Arc<dyn NativeFunction> = match &self.invoker {
            Some(invoker) => Arc::new(InvokedFunction::new(identifier, Arc::clone(invoker))),
            None if identifier == CHOICE_ITEMS_FUNCTION => Arc::new(EmptyListFunction::new(identifier)),
            None => Arc::new(UnavailableFunction::new(identifier)),
        };
        Some(function)
    }
}
