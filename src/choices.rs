//! Choice list resolution for enumerated states
//!
//! A selector whose host has not supplied choices asks the bridge's
//! `getChoiceItems` native function for them. Concurrent requests for the same
//! logical role are collapsed into one; failures and empty answers install
//! the static fallback list.

use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::bridge::{BridgeProvider, CHOICE_ITEMS_FUNCTION};
use crate::error::BridgeError;
use crate::wire::label_of;

/// Built-in choice lists for the standard selectors
pub const DEFAULT_CHOICES: &[(&str, &[&str])] = &[
    ("mode", &["Calibrate", "Emitter", "Renderer"]),
    ("cal_spk_config", &["4x Mono", "2x Stereo"]),
    ("cal_test_type", &["Sweep", "Pink", "White", "Impulse"]),
    ("pos_coord_mode", &["Spherical", "Cartesian"]),
    ("rend_quality", &["Draft", "Final"]),
    ("rend_distance_model", &["Inverse Square", "Linear", "Logarithmic", "Custom"]),
    ("rend_phys_rate", &["30 Hz", "60 Hz", "120 Hz", "240 Hz"]),
    ("rend_viz_mode", &["Perspective", "Top Down", "Front", "Side"]),
    ("anim_mode", &["DAW", "Internal"]),
    ("phys_gravity_dir", &["Down", "Up", "To Center", "From Center", "Custom"]),
];

/// Static choice lists by parameter name
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChoiceDefaults {
    lists: BTreeMap<String, Vec<String>>,
}

impl ChoiceDefaults {
    pub fn builtin() -> Self {
        let lists = DEFAULT_CHOICES
            .iter()
            .map(|(name, items)| (name.to_string(), items.iter().map(|s| s.to_string()).collect()))
            .collect();
        Self { lists }
    }

    /// Built-in lists with `overrides` replacing or adding entries
    pub fn with_overrides(overrides: &BTreeMap<String, Vec<String>>) -> Self {
        let mut defaults = Self::builtin();
        for (name, items) in overrides {
            defaults.set(name, items.clone());
        }
        defaults
    }

    pub fn get(&self, name: &str) -> Option<Vec<String>> {
        self.lists.get(name).cloned()
    }

    pub fn set(&mut self, name: &str, items: Vec<String>) {
        self.lists.insert(name.to_string(), items);
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.lists.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }
}

/// One selector to populate
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceRequest {
    /// Logical role, the de-duplication key (e.g. "quality")
    pub role: String,
    /// State name, also passed to the native function
    pub parameter_id: String,
    pub fallback: Vec<String>,
}

impl ChoiceRequest {
    pub fn new(role: impl Into<String>, parameter_id: impl Into<String>, fallback: Vec<String>) -> Self {
        Self {
            role: role.into(),
            parameter_id: parameter_id.into(),
            fallback,
        }
    }
}

/// Where a resolved list came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChoiceSource {
    Native,
    Fallback,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ChoiceOutcome {
    /// The state already has choices; nothing requested
    AlreadyPopulated,
    /// The bridge exposes no choice-items function
    NoNativeFunction,
    /// A request for the same role is still pending
    InFlight,
    Resolved {
        index: usize,
        choices: Vec<String>,
        source: ChoiceSource,
    },
    /// The native call failed; the fallback list was installed
    FellBack {
        index: usize,
        choices: Vec<String>,
        error: BridgeError,
    },
}

impl ChoiceOutcome {
    /// Whether this call installed a list
    pub fn applied(&self) -> bool {
        matches!(self, ChoiceOutcome::Resolved { .. } | ChoiceOutcome::FellBack { .. })
    }
}

/// Interpret a choice-items answer
///
/// A list is used as-is, `{items: [...]}` is unwrapped and a non-empty string
/// becomes a single choice. Anything else yields an empty list.
pub fn interpret_choice_items(result: &Value) -> Vec<String> {
    match result {
        Value::Array(items) => items.iter().map(label_of).collect(),
        Value::Object(map) => match map.get("items") {
            Some(Value::Array(items)) => items.iter().map(label_of).collect(),
            _ => Vec::new(),
        },
        Value::String(s) if !s.is_empty() => vec![s.clone()],
        _ => Vec::new(),
    }
}

/// Clears the in-flight flag for a role when dropped
struct InFlightGuard {
    in_flight: Arc<Mutex<HashSet<String>>>,
    role: String,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.in_flight.lock().remove(&self.role);
    }
}

#[derive(Clone)]
pub struct ChoiceResolver {
    bridge: Arc<dyn BridgeProvider>,
    in_flight: Arc<Mutex<HashSet<String>>>,
}

impl ChoiceResolver {
    pub fn new(bridge: Arc<dyn BridgeProvider>) -> Self {
        Self {
            bridge,
            in_flight: Arc::new(Mutex::new(HashSet::new())),
        }
    }

    pub fn is_in_flight(&self, role: &str) -> bool {
        self.in_flight.lock().contains(role)
    }

    /// Populate an empty selector; safe to call repeatedly
    ///
    /// `on_applied` receives the re-derived index and the installed list.
    pub async fn resolve<F>(&self, request: &ChoiceRequest, on_applied: F) -> ChoiceOutcome
    where
        F: FnOnce(usize, &[String]),
    {
        let state = self.bridge.enumerated(&request.parameter_id);
        if state.choice_count() > 0 {
            return ChoiceOutcome::AlreadyPopulated;
        }

        let Some(function) = self.bridge.native_function(CHOICE_ITEMS_FUNCTION) else {
            return ChoiceOutcome::NoNativeFunction;
        };

        if !self.in_flight.lock().insert(request.role.clone()) {
            debug!("Choice fetch for '{}' already in flight", request.role);
            return ChoiceOutcome::InFlight;
        }
        let _guard = InFlightGuard {
            in_flight: Arc::clone(&self.in_flight),
            role: request.role.clone(),
        };

        debug!("📥 Fetching choices for '{}'", request.parameter_id);
        match function.call(vec![Value::String(request.parameter_id.clone())]).await {
            Ok(result) => {
                let mut choices = interpret_choice_items(&result);
                let source = if choices.is_empty() {
                    choices = request.fallback.clone();
                    ChoiceSource::Fallback
                } else {
                    ChoiceSource::Native
                };

                let index = state.install_choices(choices.clone());
                info!(
                    "✅ Choices for '{}': {} item(s) ({:?})",
                    request.parameter_id,
                    choices.len(),
                    source
                );
                on_applied(index, &choices);
                ChoiceOutcome::Resolved {
                    index,
                    choices,
                    source,
                }
            }
            Err(error) => {
                warn!(
                    "⚠️  Choice fetch for '{}' failed: {} (using defaults)",
                    request.parameter_id, error
                );
                let choices = request.fallback.clone();
                let index = state.install_choices(choices.clone());
                on_applied(index, &choices);
                ChoiceOutcome::FellBack {
                    index,
                    choices,
                    error,
                }
            }
        }
    }
}
