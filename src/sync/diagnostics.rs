//! Diagnostics payload written after each tick

use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Map, Value};

use super::{CounterSnapshot, Snapshot};
use crate::bridge::BridgeKind;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostics {
    /// RFC 3339 capture time, millisecond precision
    pub ts: String,
    pub bridge: BridgeKind,
    pub has_transport: bool,
    pub counters: CounterSnapshot,
    pub snapshot: Snapshot,
    /// Free-form extras, flattened into the payload
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Diagnostics {
    pub fn capture(
        bridge: BridgeKind,
        has_transport: bool,
        counters: CounterSnapshot,
        snapshot: Snapshot,
    ) -> Self {
        Self {
            ts: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            has_transport,
            bridge,
            counters,
            snapshot,
            extra: Map::new(),
        }
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.extra.insert(key.to_string(), value.into());
        self
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn to_json_pretty(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }
}
