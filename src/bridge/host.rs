//! Bridge installed by an embedding host
//!
//! The host owns the transport and registers its native functions directly,
//! so lookups for unregistered names return `None` rather than a failing stand-in.

use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

use super::direct::TransportStates;
use super::{BridgeKind, BridgeProvider, NativeFunction};
use crate::params::{BooleanState, ContinuousState, EnumeratedState};
use crate::transport::Transport;

pub struct HostBridge {
    states: TransportStates,
    natives: DashMap<String, Arc<dyn NativeFunction>>,
}

impl HostBridge {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        info!("🔗 Host bridge over '{}'", transport.name());
        Self {
            states: TransportStates::new(transport),
            natives: DashMap::new(),
        }
    }

    /// Register a native function; replaces any previous registration
    pub fn register_native(&self, function: Arc<dyn NativeFunction>) {
        let identifier = function.identifier().to_string();
        debug!("Registered native function '{}'", identifier);
        self.natives.insert(identifier, function);
    }

    pub fn native_count(&self) -> usize {
        self.natives.len()
    }

    pub fn state_count(&self) -> usize {
        self.states.state_count()
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        self.states.transport()
    }
}

impl BridgeProvider for HostBridge {
    fn kind(&self) -> BridgeKind {
        BridgeKind::Host
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
        self.natives.get(identifier).map(|entry| Arc::clone(entry.value()))
    }
}
