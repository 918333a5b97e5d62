mod common;

use std::sync::Arc;

use param_bridge::bridge::{BridgeProvider, NativeCallMode};
use param_bridge::controls::ControlSet;
use param_bridge::sync::{bind_continuous, bind_enumerated, commit_boolean, commit_continuous, SyncCounters};
use parking_lot::Mutex;
use serde_json::json;

#[test]
fn test_each_state_requests_initial_update_once() {
    let (bridge, mut host) = common::direct_bridge(NativeCallMode::Stub);
    let controls = ControlSet::build(bridge.as_ref());
    // Second build hits the memoized states
    let _again = ControlSet::build(bridge.as_ref());

    let sent = host.drain();
    assert_eq!(sent.len(), controls.len());
    assert!(sent.iter().all(|e| e.payload == json!({"eventType": "requestInitialUpdate"})));
    assert_eq!(
        common::sent_on(&sent, &common::combo_key("rend_quality")),
        vec!["requestInitialUpdate"]
    );
}

#[test]
fn test_host_initial_push_then_local_edit() {
    let (bridge, mut host) = common::direct_bridge(NativeCallMode::Stub);
    let counters = Arc::new(SyncCounters::new());
    let size = bridge.continuous("size_uniform");
    host.drain();

    let rendered = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&rendered);
    bind_continuous(&size, &counters, move |s| sink.lock().push(s.normalized()));

    let key = common::slider_key("size_uniform");
    host.push(&key, common::properties_changed(json!({"start": 0, "end": 10, "skew": 1})));
    host.push(&key, common::value_changed(5));
    assert_eq!(size.normalized(), 0.5);
    assert_eq!(*rendered.lock(), vec![0.0, 0.5]);
    // Host-originated updates are not echoed back
    assert!(host.try_recv().is_none());

    let stored = commit_continuous(&size, &counters, 1.4);
    assert_eq!(stored, 1.0);
    let sent = host.drain();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].payload, common::value_changed(10.0));

    let snap = counters.snapshot();
    assert_eq!(snap.continuous.set, 1);
    assert_eq!(snap.continuous.value, 2);
    assert_eq!(snap.continuous.props, 1);
}

#[test]
fn test_toggle_round_trip() {
    let (bridge, mut host) = common::direct_bridge(NativeCallMode::Stub);
    let counters = SyncCounters::new();
    let link = bridge.boolean("size_link");
    host.drain();

    assert!(commit_boolean(&link, &counters, true));
    assert_eq!(host.try_recv().unwrap().payload, common::value_changed(true));

    host.push(&common::toggle_key("size_link"), common::value_changed(0));
    assert!(!link.value());
}

#[test]
fn test_remote_choices_and_selection() {
    let (bridge, mut host) = common::direct_bridge(NativeCallMode::Stub);
    let counters = Arc::new(SyncCounters::new());
    let mode = bridge.enumerated("mode");
    host.drain();

    let labels = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&labels);
    bind_enumerated(&mode, &counters, move |s| sink.lock().push(s.selected_label()));

    let key = common::combo_key("mode");
    host.push(&key, common::properties_changed(json!({"choices": ["Calibrate", "Emitter", "Renderer"]})));
    host.push(&key, common::value_changed(0.5));
    assert_eq!(mode.index(), 1);

    mode.set_index(2);
    assert_eq!(host.try_recv().unwrap().payload, common::value_changed(1.0));
    assert_eq!(
        *labels.lock(),
        vec![
            Some("Calibrate".to_string()),
            Some("Emitter".to_string()),
            Some("Renderer".to_string())
        ]
    );
}

#[test]
fn test_drag_gesture_framing() {
    let (bridge, mut host) = common::direct_bridge(NativeCallMode::Stub);
    let azimuth = bridge.continuous("pos_azimuth");
    host.drain();

    azimuth.drag_started();
    azimuth.set_normalized(0.25);
    azimuth.drag_ended();

    let sent = host.drain();
    assert_eq!(
        common::sent_on(&sent, &common::slider_key("pos_azimuth")),
        vec!["sliderDragStarted", "valueChanged", "sliderDragEnded"]
    );
}

#[test]
fn test_disconnected_transport_keeps_surface_usable() {
    let (bridge, host) = common::direct_bridge(NativeCallMode::Stub);
    let gain = bridge.continuous("emit_gain");
    host.transport().disconnect();

    gain.set_normalized(0.75);
    assert_eq!(gain.scaled(), 0.75);
}
