//! Continuous (slider) parameter state

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

use super::{ignore_remote, remote_value, ParameterKind, ParameterState, SnapshotValue, StateLink};
use crate::listeners::ListenerRegistry;
use crate::transform::{effective_skew, SkewedRange};
use crate::transport::Transport;
use crate::wire::{coerce_f64, ParameterMeta, WireMessage};

/// Calibration of a continuous parameter
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinuousProperties {
    pub start: f64,
    pub end: f64,
    pub skew: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub num_steps: Option<u64>,
    #[serde(flatten)]
    pub meta: ParameterMeta,
}

impl ContinuousProperties {
    pub fn new(start: f64, end: f64, skew: f64) -> Self {
        Self {
            start,
            end,
            skew,
            interval: None,
            num_steps: None,
            meta: ParameterMeta::default(),
        }
    }

    /// Range used for value mapping; an invalid skew maps linearly
    pub fn range(&self) -> SkewedRange {
        SkewedRange::new(self.start, self.end, effective_skew(self.skew))
    }

    /// Merge the fields present in a `propertiesChanged` payload
    pub fn merge(&mut self, fields: &Map<String, Value>) {
        if let Some(v) = fields.get("start") {
            self.start = coerce_f64(v);
        }
        if let Some(v) = fields.get("end") {
            self.end = coerce_f64(v);
        }
        if let Some(v) = fields.get("skew") {
            self.skew = coerce_f64(v);
        }
        if let Some(v) = fields.get("interval") {
            self.interval = Some(coerce_f64(v));
        }
        if let Some(v) = fields.get("numSteps") {
            self.num_steps = Some(coerce_f64(v).max(0.0) as u64);
        }
        self.meta.merge(fields);
    }
}

impl Default for ContinuousProperties {
    fn default() -> Self {
        Self::new(0.0, 1.0, 1.0)
    }
}

struct ContinuousInner {
    scaled: f64,
    properties: ContinuousProperties,
}

/// Slider-like state; `scaled` is the single source of truth
pub struct ContinuousState {
    name: String,
    link: StateLink,
    inner: RwLock<ContinuousInner>,
    value_changed: ListenerRegistry,
    properties_changed: ListenerRegistry,
}

impl ContinuousState {
    pub fn new(
        name: impl Into<String>,
        transport: Option<Arc<dyn Transport>>,
        scaled: f64,
        properties: ContinuousProperties,
    ) -> Self {
        let name = name.into();
        let key = ParameterKind::Continuous.transport_key(&name);
        Self {
            name,
            link: StateLink::new(key, transport),
            inner: RwLock::new(ContinuousInner { scaled, properties }),
            value_changed: ListenerRegistry::new("continuous.value"),
            properties_changed: ListenerRegistry::new("continuous.properties"),
        }
    }

    pub fn scaled(&self) -> f64 {
        self.inner.read().scaled
    }

    /// Normalized position, always derived from the scaled value
    pub fn normalized(&self) -> f64 {
        let inner = self.inner.read();
        inner.properties.range().to_normalized(inner.scaled)
    }

    pub fn properties(&self) -> ContinuousProperties {
        self.inner.read().properties.clone()
    }

    /// Local edit: clamp, store, emit the scaled value, notify
    pub fn set_normalized(&self, normalized: f64) {
        let scaled = {
            let mut inner = self.inner.write();
            inner.scaled = inner.properties.range().to_scaled(normalized);
            inner.scaled
        };
        self.link.emit(&WireMessage::value(scaled));
        self.value_changed.call_listeners();
    }

    /// Gesture start; the host uses this to group automation
    pub fn drag_started(&self) {
        self.link.emit(&WireMessage::SliderDragStarted);
    }

    pub fn drag_ended(&self) {
        self.link.emit(&WireMessage::SliderDragEnded);
    }
}

impl ParameterState for ContinuousState {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ParameterKind {
        ParameterKind::Continuous
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
            self.inner.write().scaled = coerce_f64(value);
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
        SnapshotValue::Continuous {
            scaled: self.scaled(),
            normalized: self.normalized(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ChannelTransport;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn counter(registry: &ListenerRegistry) -> Arc<AtomicUsize> {
        let hits = Arc::new(AtomicUsize::new(0));
        let c = Arc::clone(&hits);
        registry.add_listener(move || {
            c.fetch_add(1, Ordering::SeqCst);
        });
        hits
    }

    #[test]
    fn test_set_normalized_stores_scaled() {
        let state = ContinuousState::new("gain", None, 0.0, ContinuousProperties::new(-60.0, 12.0, 1.0));
        let hits = counter(state.on_value_changed());

        state.set_normalized(0.5);
        assert_eq!(state.scaled(), -24.0);
        assert_eq!(state.normalized(), 0.5);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_set_normalized_clamps() {
        let state = ContinuousState::new("x", None, 0.0, ContinuousProperties::new(0.0, 10.0, 1.0));
        state.set_normalized(4.0);
        assert_eq!(state.scaled(), 10.0);
        state.set_normalized(-4.0);
        assert_eq!(state.scaled(), 0.0);
    }

    #[test]
    fn test_local_edit_emits_scaled_value() {
        let (transport, mut host) = ChannelTransport::pair("test");
        let state = ContinuousState::new(
            "gain",
            Some(transport),
            0.0,
            ContinuousProperties::new(0.0, 10.0, 1.0),
        );

        state.set_normalized(0.3);
        let env = host.try_recv().unwrap();
        assert_eq!(env.identifier, "__juce__slidergain");
        assert_eq!(env.payload["eventType"], json!("valueChanged"));
        assert!((env.payload["value"].as_f64().unwrap() - 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_drag_notifications_only_emit() {
        let (transport, mut host) = ChannelTransport::pair("test");
        let state = ContinuousState::new("gain", Some(transport), 1.0, ContinuousProperties::default());
        let hits = counter(state.on_value_changed());

        state.drag_started();
        state.drag_ended();

        let events: Vec<_> = host.drain().into_iter().map(|e| e.payload["eventType"].clone()).collect();
        assert_eq!(events, vec![json!("sliderDragStarted"), json!("sliderDragEnded")]);
        assert_eq!(state.scaled(), 1.0);
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_remote_value_does_not_echo() {
        let (transport, mut host) = ChannelTransport::pair("test");
        let state = ContinuousState::new("gain", Some(transport), 0.0, ContinuousProperties::default());
        let hits = counter(state.on_value_changed());

        state.apply_remote(&WireMessage::value(0.75));
        assert_eq!(state.scaled(), 0.75);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
        assert!(host.try_recv().is_none());
    }

    #[test]
    fn test_remote_properties_rescale_normalized() {
        let state = ContinuousState::new("size", None, 5.0, ContinuousProperties::new(0.0, 100.0, 0.3));
        let hits = counter(state.on_properties_changed());

        let fields = json!({"start": 0, "end": 10, "skew": 1}).as_object().cloned().unwrap();
        state.apply_remote(&WireMessage::properties(fields));

        assert_eq!(state.normalized(), 0.5);
        assert_eq!(state.scaled(), 5.0);
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_partial_properties_merge() {
        let state = ContinuousState::new("x", None, 0.0, ContinuousProperties::new(-1.0, 1.0, 0.5));
        let fields = json!({"end": 3, "label": "m"}).as_object().cloned().unwrap();
        state.apply_remote(&WireMessage::properties(fields));

        let props = state.properties();
        assert_eq!(props.start, -1.0);
        assert_eq!(props.end, 3.0);
        assert_eq!(props.skew, 0.5);
        assert_eq!(props.meta.label.as_deref(), Some("m"));
    }

    #[test]
    fn test_malformed_remote_value_coerces_to_zero() {
        let state = ContinuousState::new("x", None, 4.0, ContinuousProperties::new(0.0, 10.0, 1.0));
        state.apply_remote(&WireMessage::value("not a number"));
        assert_eq!(state.scaled(), 0.0);
    }

    #[test]
    fn test_invalid_remote_skew_maps_linearly() {
        let state = ContinuousState::new("x", None, 2.5, ContinuousProperties::new(0.0, 10.0, 1.0));
        let fields = json!({"skew": -3}).as_object().cloned().unwrap();
        state.apply_remote(&WireMessage::properties(fields));
        assert_eq!(state.normalized(), 0.25);
    }

    #[test]
    fn test_listener_reads_updated_state() {
        let state = Arc::new(ContinuousState::new("x", None, 0.0, ContinuousProperties::default()));
        let seen = Arc::new(parking_lot::Mutex::new(None));

        let reader = Arc::clone(&state);
        let slot = Arc::clone(&seen);
        state.on_value_changed().add_listener(move || {
            *slot.lock() = Some(reader.scaled());
        });

        state.apply_remote(&WireMessage::value(0.4));
        assert_eq!(*seen.lock(), Some(0.4));
    }
}
