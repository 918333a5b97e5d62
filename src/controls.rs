//! The standard control vocabulary of the surface

use std::collections::BTreeMap;
use std::sync::Arc;

use crate::bridge::preview::{SLIDER_DEFAULTS, TOGGLE_DEFAULTS};
use crate::bridge::BridgeProvider;
use crate::choices::{ChoiceDefaults, ChoiceRequest};
use crate::params::{BooleanState, ContinuousState, EnumeratedState, ParameterHandle};

/// Selectors as `(role, parameter name)`; the role keys choice resolution
pub const SELECTORS: &[(&str, &str)] = &[
    ("mode", "mode"),
    ("calSpkConfig", "cal_spk_config"),
    ("calTestType", "cal_test_type"),
    ("quality", "rend_quality"),
    ("posCoordMode", "pos_coord_mode"),
    ("physGravityDir", "phys_gravity_dir"),
    ("rendDistanceModel", "rend_distance_model"),
    ("rendPhysRate", "rend_phys_rate"),
    ("rendVizMode", "rend_viz_mode"),
    ("animMode", "anim_mode"),
];

/// Every standard state, fetched once from a bridge
pub struct ControlSet {
    continuous: BTreeMap<&'static str, Arc<ContinuousState>>,
    boolean: BTreeMap<&'static str, Arc<BooleanState>>,
    enumerated: BTreeMap<&'static str, Arc<EnumeratedState>>,
}

impl ControlSet {
    pub fn build(bridge: &dyn BridgeProvider) -> Self {
        let continuous = SLIDER_DEFAULTS
            .iter()
            .map(|d| (d.name, bridge.continuous(d.name)))
            .collect();
        let boolean = TOGGLE_DEFAULTS
            .iter()
            .map(|(name, _)| (*name, bridge.boolean(name)))
            .collect();
        let enumerated = SELECTORS
            .iter()
            .map(|(_, name)| (*name, bridge.enumerated(name)))
            .collect();

        Self {
            continuous,
            boolean,
            enumerated,
        }
    }

    pub fn continuous(&self, name: &str) -> Option<&Arc<ContinuousState>> {
        self.continuous.get(name)
    }

    pub fn boolean(&self, name: &str) -> Option<&Arc<BooleanState>> {
        self.boolean.get(name)
    }

    pub fn enumerated(&self, name: &str) -> Option<&Arc<EnumeratedState>> {
        self.enumerated.get(name)
    }

    pub fn continuous_states(&self) -> impl Iterator<Item = &Arc<ContinuousState>> {
        self.continuous.values()
    }

    pub fn boolean_states(&self) -> impl Iterator<Item = &Arc<BooleanState>> {
        self.boolean.values()
    }

    pub fn enumerated_states(&self) -> impl Iterator<Item = &Arc<EnumeratedState>> {
        self.enumerated.values()
    }

    pub fn len(&self) -> usize {
        self.continuous.len() + self.boolean.len() + self.enumerated.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn handles(&self) -> Vec<ParameterHandle> {
        let mut handles: Vec<ParameterHandle> = Vec::with_capacity(self.len());
        handles.extend(self.enumerated.values().cloned().map(ParameterHandle::from));
        handles.extend(self.boolean.values().cloned().map(ParameterHandle::from));
        handles.extend(self.continuous.values().cloned().map(ParameterHandle::from));
        handles
    }

    /// One request per selector, falling back to `defaults` (empty if unknown)
    pub fn choice_requests(&self, defaults: &ChoiceDefaults) -> Vec<ChoiceRequest> {
        SELECTORS
            .iter()
            .map(|(role, name)| ChoiceRequest::new(*role, *name, defaults.get(name).unwrap_or_default()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bridge::PreviewBridge;
    use crate::params::ParameterKind;

    #[test]
    fn test_build_from_preview() {
        let bridge = PreviewBridge::new();
        let controls = ControlSet::build(&bridge);

        assert_eq!(controls.len(), SLIDER_DEFAULTS.len() + TOGGLE_DEFAULTS.len() + SELECTORS.len());
        assert_eq!(bridge.state_count(), controls.len());
        assert!(controls.boolean("size_link").unwrap().value());
        assert_eq!(controls.enumerated("rend_quality").unwrap().choice_count(), 2);
        assert!(controls.continuous("missing").is_none());

        let handles = controls.handles();
        assert_eq!(handles.len(), controls.len());
        assert_eq!(handles[0].kind(), ParameterKind::Enumerated);
    }

    #[test]
    fn test_same_instances_as_bridge() {
        let bridge = PreviewBridge::new();
        let controls = ControlSet::build(&bridge);
        assert!(Arc::ptr_eq(controls.continuous("pos_x").unwrap(), &bridge.continuous("pos_x")));
    }

    #[test]
    fn test_choice_requests_carry_fallbacks() {
        let bridge = PreviewBridge::new();
        let controls = ControlSet::build(&bridge);
        let requests = controls.choice_requests(&ChoiceDefaults::builtin());

        let quality = requests.iter().find(|r| r.role == "quality").unwrap();
        assert_eq!(quality.parameter_id, "rend_quality");
        assert_eq!(quality.fallback, vec!["Draft".to_string(), "Final".to_string()]);
    }
}
