#![allow(dead_code)]

use std::sync::Arc;

use param_bridge::bridge::{DirectBridge, DirectOptions, NativeCallMode};
use param_bridge::transport::{ChannelTransport, Envelope, HostEndpoint};
use serde_json::{json, Value};
use std::time::Duration;

/// Direct bridge over an in-process host endpoint
pub fn direct_bridge(native_calls: NativeCallMode) -> (Arc<DirectBridge>, HostEndpoint) {
    let (transport, host) = ChannelTransport::pair("test-host");
    let options = DirectOptions {
        native_calls,
        native_timeout: Duration::from_millis(500),
    };
    (Arc::new(DirectBridge::new(transport, options)), host)
}

pub fn slider_key(name: &str) -> String {
    format!("__juce__slider{}", name)
}

pub fn toggle_key(name: &str) -> String {
    format!("__juce__toggle{}", name)
}

pub fn combo_key(name: &str) -> String {
    format!("__juce__comboBox{}", name)
}

pub fn value_changed(value: impl Into<Value>) -> Value {
    json!({"eventType": "valueChanged", "value": value.into()})
}

pub fn properties_changed(fields: Value) -> Value {
    let mut payload = fields;
    payload["eventType"] = json!("propertiesChanged");
    payload
}

/// Event types the bridge sent on `identifier`
pub fn sent_on(envelopes: &[Envelope], identifier: &str) -> Vec<String> {
    envelopes
        .iter()
        .filter(|e| e.identifier == identifier)
        .map(|e| e.payload["eventType"].as_str().unwrap_or_default().to_string())
        .collect()
}
