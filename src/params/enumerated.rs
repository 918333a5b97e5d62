//! Enumerated (choice) parameter state
//!
//! With more than one choice the selection is a fraction in `[0, 1]` encoding
//! an index. With zero or one choice the selection holds the raw index. All
//! encoding goes through [`encode_index`] and [`decode_index`].

use parking_lot::RwLock;
use serde::Serialize;
use serde_json::{Map, Value};
use std::sync::Arc;

use super::{ignore_remote, remote_value, ParameterKind, ParameterState, SnapshotValue, StateLink};
use crate::listeners::ListenerRegistry;
use crate::transport::Transport;
use crate::wire::{coerce_choices, coerce_f64, ParameterMeta, WireMessage};

/// Encode an index for a list of `count` choices
pub fn encode_index(index: usize, count: usize) -> f64 {
    if count <= 1 {
        index as f64
    } else {
        (index as f64 / (count - 1) as f64).clamp(0.0, 1.0)
    }
}

/// Decode a selection for a list of `count` choices, clamped into range
pub fn decode_index(selection: f64, count: usize) -> usize {
    let selection = if selection.is_finite() { selection } else { 0.0 };
    if count <= 1 {
        return selection.max(0.0).round() as usize;
    }

    let last = count - 1;
    let index = (selection.clamp(0.0, 1.0) * last as f64).round() as usize;
    index.min(last)
}

/// Round arbitrary consumer input to a non-negative index
pub fn index_from_input(raw: f64) -> usize {
    if raw.is_finite() {
        raw.round().max(0.0) as usize
    } else {
        0
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnumeratedProperties {
    /// Ordered choice labels; order defines the index
    pub choices: Vec<String>,
    #[serde(flatten)]
    pub meta: ParameterMeta,
}

impl EnumeratedProperties {
    pub fn with_choices(choices: Vec<String>) -> Self {
        Self {
            choices,
            meta: ParameterMeta::default(),
        }
    }

    pub fn merge(&mut self, fields: &Map<String, Value>) {
        if let Some(v) = fields.get("choices") {
            self.choices = coerce_choices(v);
        }
        self.meta.merge(fields);
    }
}

struct EnumeratedInner {
    selection: f64,
    properties: EnumeratedProperties,
}

pub struct EnumeratedState {
    name: String,
    link: StateLink,
    inner: RwLock<EnumeratedInner>,
    value_changed: ListenerRegistry,
    properties_changed: ListenerRegistry,
}

impl EnumeratedState {
    pub fn new(
        name: impl Into<String>,
        transport: Option<Arc<dyn Transport>>,
        selection: f64,
        properties: EnumeratedProperties,
    ) -> Self {
        let name = name.into();
        let key = ParameterKind::Enumerated.transport_key(&name);
        Self {
            name,
            link: StateLink::new(key, transport),
            inner: RwLock::new(EnumeratedInner {
                selection,
                properties,
            }),
            value_changed: ListenerRegistry::new("enumerated.value"),
            properties_changed: ListenerRegistry::new("enumerated.properties"),
        }
    }

    /// Build a state pre-selected at `index` within `choices`
    pub fn with_index(
        name: impl Into<String>,
        transport: Option<Arc<dyn Transport>>,
        index: usize,
        choices: Vec<String>,
    ) -> Self {
        let count = choices.len();
        let index = index.min(count.saturating_sub(1));
        Self::new(
            name,
            transport,
            encode_index(index, count),
            EnumeratedProperties::with_choices(choices),
        )
    }

    /// Raw wire selection
    pub fn selection(&self) -> f64 {
        self.inner.read().selection
    }

    pub fn choices(&self) -> Vec<String> {
        self.inner.read().properties.choices.clone()
    }

    pub fn choice_count(&self) -> usize {
        self.inner.read().properties.choices.len()
    }

    pub fn properties(&self) -> EnumeratedProperties {
        self.inner.read().properties.clone()
    }

    pub fn index(&self) -> usize {
        let inner = self.inner.read();
        decode_index(inner.selection, inner.properties.choices.len())
    }

    /// Label of the current choice, if choices are known
    pub fn selected_label(&self) -> Option<String> {
        let inner = self.inner.read();
        let index = decode_index(inner.selection, inner.properties.choices.len());
        inner.properties.choices.get(index).cloned()
    }

    /// Local edit: encode against the known choice list, emit, notify
    pub fn set_index(&self, index: usize) {
        self.apply_local(index, None);
    }

    /// Local edit when the real choice list may not be known yet
    ///
    /// If at most one choice is known and `assumed_count > 1`, the index is
    /// encoded against `assumed_count`. Otherwise identical to [`Self::set_index`].
    pub fn set_index_assuming(&self, index: usize, assumed_count: usize) {
        self.apply_local(index, Some(assumed_count));
    }

    /// Read-back counterpart of [`Self::set_index_assuming`]
    pub fn index_assuming(&self, assumed_count: usize) -> usize {
        let inner = self.inner.read();
        let count = effective_count(inner.properties.choices.len(), Some(assumed_count));
        decode_index(inner.selection, count)
    }

    /// Install a resolved choice list and return the re-derived index
    ///
    /// The index is clamped into the new list even when it has fewer than two
    /// entries, where the stored selection is a raw index.
    ///
    /// This is a local resolution, not an edit: properties listeners are
    /// notified and nothing is emitted.
    pub fn install_choices(&self, choices: Vec<String>) -> usize {
        let index = {
            let mut inner = self.inner.write();
            inner.properties.choices = choices;
            let count = inner.properties.choices.len();
            decode_index(inner.selection, count).min(count.saturating_sub(1))
        };
        self.properties_changed.call_listeners();
        index
    }

    fn apply_local(&self, index: usize, assumed_count: Option<usize>) {
        let selection = {
            let mut inner = self.inner.write();
            let count = effective_count(inner.properties.choices.len(), assumed_count);
            inner.selection = encode_index(index, count);
            inner.selection
        };
        self.link.emit(&WireMessage::value(selection));
        self.value_changed.call_listeners();
    }
}

fn effective_count(known: usize, assumed: Option<usize>) -> usize {
    match assumed {
        Some(assumed) if known <= 1 && assumed > 1 => assumed,
        _ => known,
    }
}

impl ParameterState for EnumeratedState {
    fn name(&self) -> &str {
        &self.name
    }

    fn kind(&self) -> ParameterKind {
        ParameterKind::Enumerated
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
            self.inner.write().selection = coerce_f64(value);
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
        let inner = self.inner.read();
        let count = inner.properties.choices.len();
        SnapshotValue::Enumerated {
            index: decode_index(inner.selection, count),
            choices: count,
        }
    }
}
