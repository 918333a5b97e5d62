//! Periodic resynchronization pass
//!
//! A tick re-reads every watched state through its getters, re-renders the
//! consumers bound through the heartbeat, and schedules choice resolution for
//! selectors that are still empty. It never calls a mutator, so repeated
//! ticks are idempotent.

use parking_lot::RwLock;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, trace};

use super::binding::{bind_state, Render};
use super::SyncCounters;
use crate::bridge::BridgeProvider;
use crate::choices::{ChoiceRequest, ChoiceResolver};
use crate::listeners::ListenerRegistry;
use crate::params::{
    BooleanState, ContinuousState, EnumeratedState, ParameterHandle, ParameterKind, ParameterState,
    SnapshotValue,
};

/// Default tick interval
pub const DEFAULT_HEARTBEAT_MS: u64 = 350;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SnapshotEntry {
    pub name: String,
    #[serde(flatten)]
    pub value: SnapshotValue,
}

/// Readings of all watched states, in watch order
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Snapshot {
    pub entries: Vec<SnapshotEntry>,
}

impl Snapshot {
    pub fn get(&self, name: &str) -> Option<&SnapshotValue> {
        self.entries.iter().find(|e| e.name == name).map(|e| &e.value)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub struct Heartbeat {
    counters: Arc<SyncCounters>,
    resolver: ChoiceResolver,
    handles: RwLock<Vec<ParameterHandle>>,
    requests: RwLock<Vec<ChoiceRequest>>,
    latest: RwLock<Snapshot>,
    on_tick: ListenerRegistry,
}

impl Heartbeat {
    pub fn new(bridge: Arc<dyn BridgeProvider>, counters: Arc<SyncCounters>) -> Self {
        Self {
            counters,
            resolver: ChoiceResolver::new(bridge),
            handles: RwLock::new(Vec::new()),
            requests: RwLock::new(Vec::new()),
            latest: RwLock::new(Snapshot::default()),
            on_tick: ListenerRegistry::new("heartbeat.tick"),
        }
    }

    pub fn watch(&self, handle: impl Into<ParameterHandle>) {
        self.handles.write().push(handle.into());
    }

    /// Keep resolving choices for `request` on every tick until populated
    pub fn watch_choices(&self, request: ChoiceRequest) {
        self.requests.write().push(request);
    }

    pub fn resolver(&self) -> &ChoiceResolver {
        &self.resolver
    }

    pub fn counters(&self) -> &Arc<SyncCounters> {
        &self.counters
    }

    /// Re-render hooks run after each tick's readings are stored
    pub fn on_tick(&self) -> &ListenerRegistry {
        &self.on_tick
    }

    /// Bind `render` to the state's change listeners and to every tick
    pub fn bind_continuous<F>(&self, state: &Arc<ContinuousState>, render: F)
    where
        F: Fn(&ContinuousState) + Send + Sync + 'static,
    {
        self.bind(state, Arc::new(render));
    }

    pub fn bind_boolean<F>(&self, state: &Arc<BooleanState>, render: F)
    where
        F: Fn(&BooleanState) + Send + Sync + 'static,
    {
        self.bind(state, Arc::new(render));
    }

    pub fn bind_enumerated<F>(&self, state: &Arc<EnumeratedState>, render: F)
    where
        F: Fn(&EnumeratedState) + Send + Sync + 'static,
    {
        self.bind(state, Arc::new(render));
    }

    fn bind<S>(&self, state: &Arc<S>, render: Render<S>)
    where
        S: ParameterState + 'static,
    {
        bind_state(state, &self.counters, Arc::clone(&render));

        // Tick renders bypass the state registries, so counters stay untouched
        let weak = Arc::downgrade(state);
        self.on_tick.add_listener(move || {
            if let Some(state) = weak.upgrade() {
                render(&state);
            }
        });
    }

    /// Readings from the most recent tick
    pub fn latest(&self) -> Snapshot {
        self.latest.read().clone()
    }

    /// Run one resynchronization pass
    pub fn tick(&self) -> Snapshot {
        let beat = self.counters.record_heartbeat();

        let (snapshot, empty_selectors) = {
            let handles = self.handles.read();
            let entries = handles
                .iter()
                .map(|h| SnapshotEntry {
                    name: h.name().to_string(),
                    value: h.snapshot(),
                })
                .collect::<Vec<_>>();
            let empty = handles
                .iter()
                .filter_map(|h| match h {
                    ParameterHandle::Enumerated(s) if s.choice_count() == 0 => Some(h.name().to_string()),
                    _ => None,
                })
                .collect::<Vec<_>>();
            (Snapshot { entries }, empty)
        };

        *self.latest.write() = snapshot.clone();
        self.schedule_choices(&empty_selectors);
        self.on_tick.call_listeners();

        trace!("💓 Heartbeat {} ({} states)", beat, snapshot.len());
        snapshot
    }

    /// Spawn resolution for pending selectors; needs a tokio runtime
    fn schedule_choices(&self, empty_selectors: &[String]) {
        if empty_selectors.is_empty() {
            return;
        }
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            debug!("No runtime, skipping choice resolution");
            return;
        };

        let requests = self.requests.read();
        for request in requests.iter().filter(|r| empty_selectors.contains(&r.parameter_id)) {
            if self.resolver.is_in_flight(&request.role) {
                continue;
            }
            let resolver = self.resolver.clone();
            let request = request.clone();
            runtime.spawn(async move {
                resolver.resolve(&request, |_, _| {}).await;
            });
        }
    }

    pub fn watched(&self) -> usize {
        self.handles.read().len()
    }

    /// Count of watched states per kind, for startup logs
    pub fn watched_by_kind(&self, kind: ParameterKind) -> usize {
        self.handles.read().iter().filter(|h| h.kind() == kind).count()
    }
}
