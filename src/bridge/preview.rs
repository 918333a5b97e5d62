//! Offline bridge with synthetic defaults
//!
//! No transport I/O. Mutators still notify local listeners so a surface
//! behaves the same with or without a host.

use serde::Serialize;
use std::sync::Arc;
use tracing::info;

use super::{BridgeKind, BridgeProvider, EmptyListFunction, NativeFunction, StateRegistry};
use crate::choices::ChoiceDefaults;
use crate::params::{BooleanState, ContinuousProperties, ContinuousState, EnumeratedState};

/// Default value and calibration of a preview slider
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SliderDefault {
    pub name: &'static str,
    pub scaled: f64,
    pub start: f64,
    pub end: f64,
    pub skew: f64,
}

const fn slider(name: &'static str, scaled: f64, start: f64, end: f64, skew: f64) -> SliderDefault {
    SliderDefault {
        name,
        scaled,
        start,
        end,
        skew,
    }
}

pub const SLIDER_DEFAULTS: &[SliderDefault] = &[
    slider("cal_mic_channel", 1.0, 1.0, 8.0, 1.0),
    slider("cal_spk1_out", 1.0, 1.0, 8.0, 1.0),
    slider("cal_spk2_out", 2.0, 1.0, 8.0, 1.0),
    slider("cal_spk3_out", 3.0, 1.0, 8.0, 1.0),
    slider("cal_spk4_out", 4.0, 1.0, 8.0, 1.0),
    slider("cal_test_level", -20.0, -60.0, 0.0, 1.0),
    slider("pos_azimuth", 0.0, -180.0, 180.0, 1.0),
    slider("pos_elevation", 0.0, -90.0, 90.0, 1.0),
    slider("pos_distance", 2.0, 0.0, 50.0, 0.5),
    slider("pos_x", 0.0, -25.0, 25.0, 1.0),
    slider("pos_y", 0.0, -25.0, 25.0, 1.0),
    slider("pos_z", 0.0, -10.0, 10.0, 1.0),
    slider("size_uniform", 0.5, 0.01, 20.0, 0.4),
    slider("size_width", 0.5, 0.01, 20.0, 0.5),
    slider("size_depth", 0.5, 0.01, 20.0, 0.5),
    slider("size_height", 0.5, 0.01, 10.0, 0.5),
    slider("emit_color", 0.0, 0.0, 15.0, 1.0),
    slider("emit_gain", 0.0, -60.0, 12.0, 1.0),
    slider("emit_spread", 0.0, 0.0, 1.0, 1.0),
    slider("emit_directivity", 0.5, 0.0, 1.0, 1.0),
    slider("phys_mass", 1.0, 0.01, 100.0, 0.4),
    slider("phys_drag", 0.5, 0.0, 10.0, 1.0),
    slider("phys_elasticity", 0.7, 0.0, 1.0, 1.0),
    slider("phys_gravity", 0.0, -20.0, 20.0, 1.0),
    slider("phys_friction", 0.3, 0.0, 1.0, 1.0),
    slider("anim_speed", 1.0, 0.1, 10.0, 1.0),
    slider("rend_master_gain", 0.0, -60.0, 12.0, 1.0),
    slider("rend_spk1_gain", 0.0, -24.0, 12.0, 1.0),
    slider("rend_spk2_gain", 0.0, -24.0, 12.0, 1.0),
    slider("rend_spk3_gain", 0.0, -24.0, 12.0, 1.0),
    slider("rend_spk4_gain", 0.0, -24.0, 12.0, 1.0),
    slider("rend_spk1_delay", 0.0, 0.0, 50.0, 1.0),
    slider("rend_spk2_delay", 0.0, 0.0, 50.0, 1.0),
    slider("rend_spk3_delay", 0.0, 0.0, 50.0, 1.0),
    slider("rend_spk4_delay", 0.0, 0.0, 50.0, 1.0),
    slider("rend_distance_ref", 1.0, 0.1, 10.0, 1.0),
    slider("rend_distance_max", 50.0, 1.0, 100.0, 1.0),
    slider("rend_doppler_scale", 1.0, 0.0, 5.0, 1.0),
    slider("rend_room_mix", 0.3, 0.0, 1.0, 1.0),
    slider("rend_room_size", 1.0, 0.5, 5.0, 1.0),
    slider("rend_room_damping", 0.5, 0.0, 1.0, 1.0),
    slider("rend_viz_trail_len", 5.0, 0.5, 30.0, 1.0),
];

/// Used for slider names missing from [`SLIDER_DEFAULTS`]
pub const GENERIC_SLIDER: SliderDefault = slider("", 0.5, 0.0, 1.0, 1.0);

pub const TOGGLE_DEFAULTS: &[(&str, bool)] = &[
    ("size_link", true),
    ("phys_enable", false),
    ("phys_throw", false),
    ("phys_reset", false),
    ("anim_enable", false),
    ("anim_loop", false),
    ("anim_sync", true),
    ("emit_mute", false),
    ("emit_solo", false),
    ("rend_doppler", false),
    ("rend_air_absorb", true),
    ("rend_room_enable", true),
    ("rend_room_er_only", false),
    ("rend_phys_walls", true),
    ("rend_phys_pause", false),
    ("rend_viz_trails", true),
    ("rend_viz_vectors", false),
    ("rend_viz_grid", true),
    ("rend_viz_labels", true),
];

/// Initial index of each choice selector; absent names start at 0
pub const COMBO_DEFAULT_INDICES: &[(&str, usize)] = &[
    ("mode", 1),
    ("cal_spk_config", 0),
    ("cal_test_type", 0),
    ("pos_coord_mode", 0),
    ("rend_quality", 0),
    ("rend_distance_model", 0),
    ("rend_phys_rate", 1),
    ("rend_viz_mode", 0),
    ("anim_mode", 0),
    ("phys_gravity_dir", 0),
];

pub fn slider_default(name: &str) -> SliderDefault {
    SLIDER_DEFAULTS
        .iter()
        .find(|d| d.name == name)
        .copied()
        .unwrap_or(GENERIC_SLIDER)
}

pub fn toggle_default(name: &str) -> bool {
    TOGGLE_DEFAULTS
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, v)| *v)
        .unwrap_or(false)
}

pub fn combo_default_index(name: &str) -> usize {
    COMBO_DEFAULT_INDICES
        .iter()
        .find(|(n, _)| *n == name)
        .map(|(_, i)| *i)
        .unwrap_or(0)
}

pub struct PreviewBridge {
    registry: StateRegistry,
    choices: ChoiceDefaults,
}

impl PreviewBridge {
    pub fn new() -> Self {
        Self::with_choices(ChoiceDefaults::builtin())
    }

    /// Preview bridge whose selectors start with the given choice lists
    pub fn with_choices(choices: ChoiceDefaults) -> Self {
        info!("🧪 Preview bridge (no host transport)");
        Self {
            registry: StateRegistry::default(),
            choices,
        }
    }

    pub fn state_count(&self) -> usize {
        self.registry.len()
    }
}

impl Default for PreviewBridge {
    fn default() -> Self {
        Self::new()
    }
}

impl BridgeProvider for PreviewBridge {
    fn kind(&self) -> BridgeKind {
        BridgeKind::Preview
    }

    fn transport_connected(&self) -> bool {
        false
    }

    fn continuous(&self, name: &str) -> Arc<ContinuousState> {
        self.registry.continuous_or_insert_with(name, || {
            let d = slider_default(name);
            Arc::new(ContinuousState::new(
                name,
                None,
                d.scaled,
                ContinuousProperties::new(d.start, d.end, d.skew),
            ))
        })
    }

    fn boolean(&self, name: &str) -> Arc<BooleanState> {
        self.registry
            .boolean_or_insert_with(name, || Arc::new(BooleanState::new(name, None, toggle_default(name))))
    }

    fn enumerated(&self, name: &str) -> Arc<EnumeratedState> {
        self.registry.enumerated_or_insert_with(name, || {
            let choices = self.choices.get(name).unwrap_or_default();
            Arc::new(EnumeratedState::with_index(
                name,
                None,
                combo_default_index(name),
                choices,
            ))
        })
    }

    fn native_function(&self, identifier: &str) -> Option<Arc<dyn NativeFunction>> {
        Some(Arc::new(EmptyListFunction::new(identifier)))
    }
}
