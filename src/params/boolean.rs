//! Boolean (toggle) parameter state

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

use super::{ignore_remote, remote_value, ParameterKind, ParameterState, SnapshotValue, StateLink};
use crate::listeners::ListenerRegistry;
use crate::transport::Transport;
use crate::wire::{coerce_bool, ParameterMeta, WireMessage};

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BooleanProperties {
    #[serde(flatten)]
    pub meta: ParameterMeta,
}

impl BooleanProperties {
    pub fn merge(&mut self, fields: &Map<String, Value>) {
        self.meta.merge(fields);
    }
}

struct BooleanInner {
    value: bool,
    properties: BooleanProperties,
}

pub struct BooleanState {
    name: String,
    link: StateLink,
    inner: RwLock<BooleanInner>,
    value_changed: ListenerRegistry,
    properties_changed: ListenerRegistry,
}

impl BooleanState {
    pub fn new(name: impl Into<String>, transport: Option<Arc<dyn Transport>>, value: bool) -> Self {
        let name = name.into();
        let key = ParameterKind::Boolean.transport_key(&name);
        Self {
            name,
            link: StateLink::new(key, transport),
            inner: RwLock::new(BooleanInner {
                value,
                properties: BooleanProperties::default(),
            }),
            value_changed: ListenerRegistry::new("boolean.value"),
            properties_changed: ListenerRegistry::new("boolean.properties"),
        }
    }

    pub fn value(&self) -> bool {
        self.inner.read().value
    }

    pub fn properties(&self) -> BooleanProperties {
        self.inner.read().properties.clone()
    }

    /// Local edit: store, emit, notify
    pub fn set_value(&self, value: bool) {
        self.inner.write().value = value;
        self.link.emit(&WireMessage::value(value));
        self.value_changed.call_listeners();
    }
}

impl ParameterState for BooleanState {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ParameterKind {
        ParameterKind::Boolean
    }

    fn transport_key(&self) -> &str {
        self.link.key()
    }

    fn on_value_changed(&self) -> &ListenerRegistry {
        &self.value_changed
    }

    fn on_properties_changed(&self) -> &ListenerRegistry {
        &self.properties_changed
    }

    fn apply_remote(&self, message: &WireMessage) {
        if let Some(value) = remote_value(message) {
            self.inner.write().value = coerce_bool(value);
            self.value_changed.call_listeners();
            return;
        }

        match message {
            WireMessage::PropertiesChanged { fields } => {
                self.inner.write().properties.merge(fields);
                self.properties_changed.call_listeners();
            }
            other => ignore_remote(self.link.key(), other),
        }
    }

    fn snapshot(&self) -> SnapshotValue {
        SnapshotValue::Boolean { value: self.value() }
    }
}
