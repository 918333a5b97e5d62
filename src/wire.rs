//! Wire messages exchanged with the host, plus tolerant payload coercion
//!
//! Every state talks to the host through a single identifier (its transport
//! key). Payloads are JSON objects tagged by `eventType`. Remote payloads are
//! never trusted: numeric fields that fail to parse become `0`, missing choice
//! lists become empty.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{BridgeError, BridgeResult};

/// Transport-level message for one parameter state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "eventType", rename_all = "camelCase")]
pub enum WireMessage {
    /// New value. Numeric for continuous and enumerated states, boolean for toggles.
    ValueChanged {
        #[serde(default)]
        value: Value,
    },
    /// Partial property update, merged shallowly into the existing properties
    PropertiesChanged {
        #[serde(flatten)]
        fields: Map<String, Value>,
    },
    /// Sent once per state at construction so the host pushes current state
    RequestInitialUpdate,
    SliderDragStarted,
    SliderDragEnded,
}

impl WireMessage {
    pub fn value(value: impl Into<Value>) -> Self {
        WireMessage::ValueChanged {
            value: value.into(),
        }
    }

    pub fn properties(fields: Map<String, Value>) -> Self {
        WireMessage::PropertiesChanged { fields }
    }

    /// Parse a raw transport payload
    pub fn from_payload(payload: &Value) -> BridgeResult<Self> {
        serde_json::from_value(payload.clone())
            .map_err(|e| BridgeError::MalformedPayload(e.to_string()))
    }

    /// Encode for the transport
    pub fn to_payload(&self) -> Value {
        // Serializing a plain enum of JSON values cannot fail
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    /// Short name for logs
    pub fn event_type(&self) -> &'static str {
        match self {
            WireMessage::ValueChanged { .. } => "valueChanged",
            WireMessage::PropertiesChanged { .. } => "propertiesChanged",
            WireMessage::RequestInitialUpdate => "requestInitialUpdate",
            WireMessage::SliderDragStarted => "sliderDragStarted",
            WireMessage::SliderDragEnded => "sliderDragEnded",
        }
    }
}

/// Coerce a JSON value to a finite number, falling back to `0`
pub fn coerce_f64(value: &Value) -> f64 {
    let n = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        Value::Bool(true) => 1.0,
        _ => 0.0,
    };
    if n.is_finite() {
        n
    } else {
        0.0
    }
}

/// Truthiness of a JSON value
pub fn coerce_bool(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map(|f| f != 0.0 && !f.is_nan()).unwrap_or(false),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

/// Render a JSON value the way a choice label is displayed
pub fn label_of(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Coerce a choice list; anything but an array is an empty list
pub fn coerce_choices(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items.iter().map(label_of).collect(),
        _ => Vec::new(),
    }
}

/// Metadata every parameter kind carries alongside its calibration
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterMeta {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameter_index: Option<i64>,
}

impl ParameterMeta {
    /// Merge the metadata fields present in `fields`, leaving the rest untouched
    pub fn merge(&mut self, fields: &Map<String, Value>) {
        if let Some(v) = fields.get("name") {
            self.name = Some(label_of(v));
        }
        if let Some(v) = fields.get("label") {
            self.label = Some(label_of(v));
        }
        if let Some(v) = fields.get("parameterIndex") {
            self.parameter_index = Some(coerce_f64(v) as i64);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_changed_round_trip() {
        let msg = WireMessage::value(0.25);
        let payload = msg.to_payload();
        assert_eq!(payload, json!({"eventType": "valueChanged", "value": 0.25}));
        assert_eq!(WireMessage::from_payload(&payload).unwrap(), msg);
    }

    #[test]
    fn test_unit_messages_encode_tag_only() {
        assert_eq!(
            WireMessage::RequestInitialUpdate.to_payload(),
            json!({"eventType": "requestInitialUpdate"})
        );
        assert_eq!(
            WireMessage::SliderDragEnded.to_payload(),
            json!({"eventType": "sliderDragEnded"})
        );
    }

    #[test]
    fn test_properties_changed_collects_fields() {
        let payload = json!({"eventType": "propertiesChanged", "start": 0, "end": 10, "skew": 1});
        match WireMessage::from_payload(&payload).unwrap() {
            WireMessage::PropertiesChanged { fields } => {
                assert_eq!(fields.len(), 3);
                assert!(!fields.contains_key("eventType"));
                assert_eq!(fields["end"], json!(10));
            }
            other => panic!("unexpected message: {:?}", other),
        }
    }

    #[test]
    fn test_value_changed_without_value_is_null() {
        let msg = WireMessage::from_payload(&json!({"eventType": "valueChanged"})).unwrap();
        assert_eq!(msg, WireMessage::ValueChanged { value: Value::Null });
    }

    #[test]
    fn test_unknown_event_type_is_malformed() {
        let err = WireMessage::from_payload(&json!({"eventType": "explode"})).unwrap_err();
        assert!(matches!(err, BridgeError::MalformedPayload(_)));
        assert!(WireMessage::from_payload(&json!("nope")).is_err());
    }

    #[test]
    fn test_numeric_coercion() {
        assert_eq!(coerce_f64(&json!(3.5)), 3.5);
        assert_eq!(coerce_f64(&json!(" 2.5 ")), 2.5);
        assert_eq!(coerce_f64(&json!("abc")), 0.0);
        assert_eq!(coerce_f64(&json!(null)), 0.0);
        assert_eq!(coerce_f64(&json!(true)), 1.0);
        assert_eq!(coerce_f64(&json!({"x": 1})), 0.0);
    }

    #[test]
    fn test_bool_coercion() {
        assert!(coerce_bool(&json!(true)));
        assert!(coerce_bool(&json!(1)));
        assert!(!coerce_bool(&json!(0)));
        assert!(!coerce_bool(&json!("")));
        assert!(coerce_bool(&json!("yes")));
        assert!(!coerce_bool(&json!(null)));
    }

    #[test]
    fn test_choice_coercion() {
        assert_eq!(coerce_choices(&json!(["A", 2, true])), vec!["A", "2", "true"]);
        assert!(coerce_choices(&json!("A")).is_empty());
        assert!(coerce_choices(&json!(null)).is_empty());
    }

    #[test]
    fn test_meta_merge_is_shallow() {
        let mut meta = ParameterMeta {
            name: Some("Gain".into()),
            label: Some("dB".into()),
            parameter_index: None,
        };
        let fields = json!({"parameterIndex": 7}).as_object().cloned().unwrap();
        meta.merge(&fields);
        assert_eq!(meta.name.as_deref(), Some("Gain"));
        assert_eq!(meta.label.as_deref(), Some("dB"));
        assert_eq!(meta.parameter_index, Some(7));
    }
}
