//! Parameter states - the per-control view of a host parameter
//!
//! Each state owns its current value, calibration properties, and two
//! listener registries. Mutation has exactly two entry points:
//!
//! - **local** (`set_*` methods): store, emit to the transport if any, notify
//! - **remote** ([`ParameterState::apply_remote`]): store, notify, never emit
//!
//! Remote updates never echo back to the host.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::listeners::ListenerRegistry;
use crate::transport::Transport;
use crate::wire::WireMessage;

mod boolean;
mod continuous;
mod enumerated;

pub use boolean::{BooleanProperties, BooleanState};
pub use continuous::{ContinuousProperties, ContinuousState};
pub use enumerated::{decode_index, encode_index, index_from_input, EnumeratedProperties, EnumeratedState};

/// The closed set of parameter kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterKind {
    Continuous,
    Boolean,
    Enumerated,
}

impl ParameterKind {
    fn key_prefix(&self) -> &'static str {
        match self {
            ParameterKind::Continuous => "__juce__slider",
            ParameterKind::Boolean => "__juce__toggle",
            ParameterKind::Enumerated => "__juce__comboBox",
        }
    }

    /// Wire identifier for a state of this kind
    pub fn transport_key(&self, name: &str) -> String {
        format!("{}{}", self.key_prefix(), name)
    }
}

impl std::fmt::Display for ParameterKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParameterKind::Continuous => write!(f, "continuous"),
            ParameterKind::Boolean => write!(f, "boolean"),
            ParameterKind::Enumerated => write!(f, "enumerated"),
        }
    }
}

/// Point-in-time reading of a state, taken through its getters
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SnapshotValue {
    Continuous { scaled: f64, normalized: f64 },
    Boolean { value: bool },
    Enumerated { index: usize, choices: usize },
}

/// Capability interface shared by all parameter kinds
pub trait ParameterState: Send + Sync {
    fn name(&self) -> &str;

    fn kind(&self) -> ParameterKind;

    /// Wire identifier derived from name and kind
    fn transport_key(&self) -> &str;

    fn on_value_changed(&self) -> &ListenerRegistry;

    fn on_properties_changed(&self) -> &ListenerRegistry;

    /// Apply a host-originated message: mutate, then notify. Never emits.
    fn apply_remote(&self, message: &WireMessage);

    fn snapshot(&self) -> SnapshotValue;
}

/// A state of any kind, for code that walks every registered state
#[derive(Clone)]
pub enum ParameterHandle {
    Continuous(Arc<ContinuousState>),
    Boolean(Arc<BooleanState>),
    Enumerated(Arc<EnumeratedState>),
}

impl ParameterHandle {
    pub fn state(&self) -> &dyn ParameterState {
        match self {
            ParameterHandle::Continuous(s) => s.as_ref(),
            ParameterHandle::Boolean(s) => s.as_ref(),
            ParameterHandle::Enumerated(s) => s.as_ref(),
        }
    }

    pub fn name(&self) -> &str {
        self.state().name()
    }

    pub fn kind(&self) -> ParameterKind {
        self.state().kind()
    }

    pub fn snapshot(&self) -> SnapshotValue {
        self.state().snapshot()
    }
}

impl From<Arc<ContinuousState>> for ParameterHandle {
    fn from(state: Arc<ContinuousState>) -> Self {
        ParameterHandle::Continuous(state)
    }
}

impl From<Arc<BooleanState>> for ParameterHandle {
    fn from(state: Arc<BooleanState>) -> Self {
        ParameterHandle::Boolean(state)
    }
}

impl From<Arc<EnumeratedState>> for ParameterHandle {
    fn from(state: Arc<EnumeratedState>) -> Self {
        ParameterHandle::Enumerated(state)
    }
}

/// Outbound side of a state: its transport key and optional transport
#[derive(Clone)]
pub struct StateLink {
    key: String,
    transport: Option<Arc<dyn Transport>>,
}

impl StateLink {
    pub fn new(key: String, transport: Option<Arc<dyn Transport>>) -> Self {
        Self { key, transport }
    }

    /// A link that never emits (preview operation)
    pub fn detached(key: String) -> Self {
        Self {
            key,
            transport: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn has_transport(&self) -> bool {
        self.transport.is_some()
    }

    /// Emit to the host if a transport exists; failures are logged, not returned
    pub fn emit(&self, message: &WireMessage) {
        let Some(transport) = &self.transport else {
            return;
        };

        debug!("📤 {} → {}", self.key, message.event_type());
        if let Err(e) = transport.emit(&self.key, message.to_payload()) {
            warn!("⚠️  Failed to emit {} on '{}': {}", message.event_type(), self.key, e);
        }
    }
}

/// Log a remote message a state kind does not understand
pub(crate) fn ignore_remote(key: &str, message: &WireMessage) {
    debug!("Ignoring {} on '{}'", message.event_type(), key);
}

/// Shorthand used by the kinds when reading a `valueChanged` payload
pub(crate) fn remote_value(message: &WireMessage) -> Option<&Value> {
    match message {
        WireMessage::ValueChanged { value } => Some(value),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_keys() {
        assert_eq!(
            ParameterKind::Continuous.transport_key("size_uniform"),
            "__juce__slidersize_uniform"
        );
        assert_eq!(ParameterKind::Boolean.transport_key("size_link"), "__juce__togglesize_link");
        assert_eq!(ParameterKind::Enumerated.transport_key("mode"), "__juce__comboBoxmode");
    }

    #[test]
    fn test_detached_link_does_not_emit() {
        let link = StateLink::detached("k".into());
        assert!(!link.has_transport());
        link.emit(&WireMessage::RequestInitialUpdate);
    }
}
