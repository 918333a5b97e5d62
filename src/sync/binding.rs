//! Consumer bindings
//!
//! A binding re-renders from the getters whenever a state changes and never
//! calls a mutator from inside a listener. Local interactions go through the
//! `commit_*` functions: one mutator call, then the authoritative read-back.

use std::sync::{Arc, Weak};

use super::SyncCounters;
use crate::params::{
    index_from_input, BooleanState, ContinuousState, EnumeratedState, ParameterState,
};

/// Render callback; receives the state to read from
pub type Render<S> = Arc<dyn Fn(&S) + Send + Sync>;

pub(super) fn bind_state<S>(state: &Arc<S>, counters: &Arc<SyncCounters>, render: Render<S>)
where
    S: ParameterState + 'static,
{
    let kind = state.kind();

    // Listeners live inside the state, so they only hold it weakly
    let weak: Weak<S> = Arc::downgrade(state);
    let stats = Arc::clone(counters);
    let on_value = Arc::clone(&render);
    state.on_value_changed().add_listener(move || {
        if let Some(state) = weak.upgrade() {
            stats.record_value(kind);
            on_value(&state);
        }
    });

    let weak: Weak<S> = Arc::downgrade(state);
    let stats = Arc::clone(counters);
    state.on_properties_changed().add_listener(move || {
        if let Some(state) = weak.upgrade() {
            stats.record_props(kind);
            render(&state);
        }
    });
}

pub fn bind_continuous<F>(state: &Arc<ContinuousState>, counters: &Arc<SyncCounters>, render: F)
where
    F: Fn(&ContinuousState) + Send + Sync + 'static,
{
    bind_state(state, counters, Arc::new(render));
}

pub fn bind_boolean<F>(state: &Arc<BooleanState>, counters: &Arc<SyncCounters>, render: F)
where
    F: Fn(&BooleanState) + Send + Sync + 'static,
{
    bind_state(state, counters, Arc::new(render));
}

pub fn bind_enumerated<F>(state: &Arc<EnumeratedState>, counters: &Arc<SyncCounters>, render: F)
where
    F: Fn(&EnumeratedState) + Send + Sync + 'static,
{
    bind_state(state, counters, Arc::new(render));
}

/// Commit a slider interaction; returns the stored normalized position
pub fn commit_continuous(state: &ContinuousState, counters: &SyncCounters, normalized: f64) -> f64 {
    counters.record_set(state.kind());
    state.set_normalized(normalized);
    state.normalized()
}

pub fn commit_boolean(state: &BooleanState, counters: &SyncCounters, value: bool) -> bool {
    counters.record_set(state.kind());
    state.set_value(value);
    state.value()
}

/// Commit a selector interaction from raw input
///
/// With `assumed_count`, a selector whose choices are not known yet is encoded
/// against that count (see [`EnumeratedState::set_index_assuming`]).
pub fn commit_enumerated(
    state: &EnumeratedState,
    counters: &SyncCounters,
    raw_index: f64,
    assumed_count: Option<usize>,
) -> usize {
    counters.record_set(state.kind());
    let index = index_from_input(raw_index);
    match assumed_count {
        Some(assumed) => {
            state.set_index_assuming(index, assumed);
            state.index_assuming(assumed)
        }
        None => {
            state.set_index(index);
            state.index()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{ContinuousProperties, EnumeratedProperties, ParameterKind};
    use crate::wire::WireMessage;
    use parking_lot::Mutex;
    use serde_json::json;

    #[test]
    fn test_commit_reads_back_clamped_value() {
        let counters = SyncCounters::new();
        let state = ContinuousState::new("x", None, 0.0, ContinuousProperties::new(0.0, 10.0, 1.0));
        assert_eq!(commit_continuous(&state, &counters, 3.0), 1.0);
        assert_eq!(counters.snapshot().continuous.set, 1);
    }

    #[test]
    fn test_commit_enumerated_rounds_and_clamps() {
        let counters = SyncCounters::new();
        let state = EnumeratedState::with_index("q", None, 0, vec!["A".into(), "B".into()]);
        assert_eq!(commit_enumerated(&state, &counters, 7.4, None), 1);
        assert_eq!(commit_enumerated(&state, &counters, -2.0, None), 0);
    }

    #[test]
    fn test_commit_enumerated_with_assumed_count() {
        let counters = SyncCounters::new();
        let state = EnumeratedState::new("q", None, 0.0, EnumeratedProperties::default());
        assert_eq!(commit_enumerated(&state, &counters, 1.0, Some(2)), 1);
        assert_eq!(state.selection(), 1.0);
    }

    #[test]
    fn test_binding_renders_from_getters() {
        let counters = Arc::new(SyncCounters::new());
        let state = Arc::new(BooleanState::new("size_link", None, false));
        let rendered = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&rendered);
        bind_boolean(&state, &counters, move |s| sink.lock().push(s.value()));

        state.apply_remote(&WireMessage::value(true));
        let fields = json!({"label": "Link"}).as_object().cloned().unwrap();
        state.apply_remote(&WireMessage::properties(fields));

        assert_eq!(*rendered.lock(), vec![true, true]);
        let snap = counters.snapshot();
        assert_eq!(snap.boolean.value, 1);
        assert_eq!(snap.boolean.props, 1);
        assert_eq!(snap.boolean.set, 0);
    }

    #[test]
    fn test_local_commit_notifies_binding_once() {
        let counters = Arc::new(SyncCounters::new());
        let state = Arc::new(EnumeratedState::with_index(
            "mode",
            None,
            0,
            vec!["A".into(), "B".into(), "C".into()],
        ));
        let seen = Arc::new(Mutex::new(Vec::new()));

        let sink = Arc::clone(&seen);
        bind_enumerated(&state, &counters, move |s| sink.lock().push(s.index()));

        commit_enumerated(&state, &counters, 2.0, None);
        assert_eq!(*seen.lock(), vec![2]);

        let snap = counters.snapshot();
        assert_eq!(snap.enumerated.set, 1);
        assert_eq!(snap.enumerated.value, 1);
        assert_eq!(state.kind(), ParameterKind::Enumerated);
    }

    #[test]
    fn test_binding_does_not_keep_state_alive() {
        let counters = Arc::new(SyncCounters::new());
        let state = Arc::new(ContinuousState::new("x", None, 0.0, ContinuousProperties::default()));
        bind_continuous(&state, &counters, |_| {});

        let weak = Arc::downgrade(&state);
        drop(state);
        assert!(weak.upgrade().is_none());
    }
}
