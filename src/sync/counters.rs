//! Interaction counters
//!
//! `set` counts local commits, `value` and `props` count listener firings.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::params::ParameterKind;

#[derive(Debug, Default)]
struct KindCounters {
    set: AtomicU64,
    value: AtomicU64,
    props: AtomicU64,
}

impl KindCounters {
    fn read(&self) -> KindCounts {
        KindCounts {
            set: self.set.load(Ordering::Relaxed),
            value: self.value.load(Ordering::Relaxed),
            props: self.props.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Default)]
pub struct SyncCounters {
    continuous: KindCounters,
    boolean: KindCounters,
    enumerated: KindCounters,
    heartbeat: AtomicU64,
}

impl SyncCounters {
    pub fn new() -> Self {
        Self::default()
    }

    fn kind(&self, kind: ParameterKind) -> &KindCounters {
        match kind {
            ParameterKind::Continuous => &self.continuous,
            ParameterKind::Boolean => &self.boolean,
            ParameterKind::Enumerated => &self.enumerated,
        }
    }

    pub fn record_set(&self, kind: ParameterKind) {
        self.kind(kind).set.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_value(&self, kind: ParameterKind) {
        self.kind(kind).value.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_props(&self, kind: ParameterKind) {
        self.kind(kind).props.fetch_add(1, Ordering::Relaxed);
    }

    /// Returns the new heartbeat count
    pub fn record_heartbeat(&self) -> u64 {
        self.heartbeat.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn heartbeat(&self) -> u64 {
        self.heartbeat.load(Ordering::Relaxed)
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            continuous: self.continuous.read(),
            boolean: self.boolean.read(),
            enumerated: self.enumerated.read(),
            heartbeat: self.heartbeat(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct KindCounts {
    pub set: u64,
    pub value: u64,
    pub props: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    pub continuous: KindCounts,
    pub boolean: KindCounts,
    pub enumerated: KindCounts,
    pub heartbeat: u64,
}

impl std::fmt::Display for CounterSnapshot {
    /// `set t/c/s | value t/c/s | props t/c/s | hb n`, toggle first
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let (b, e, c) = (self.boolean, self.enumerated, self.continuous);
        write!(
            f,
            "set {}/{}/{} | value {}/{}/{} | props {}/{}/{} | hb {}",
            b.set, e.set, c.set, b.value, e.value, c.value, b.props, e.props, c.props, self.heartbeat
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_are_per_kind() {
        let counters = SyncCounters::new();
        counters.record_set(ParameterKind::Boolean);
        counters.record_value(ParameterKind::Continuous);
        counters.record_value(ParameterKind::Continuous);
        counters.record_props(ParameterKind::Enumerated);
        assert_eq!(counters.record_heartbeat(), 1);

        let snap = counters.snapshot();
        assert_eq!(snap.boolean, KindCounts { set: 1, value: 0, props: 0 });
        assert_eq!(snap.continuous.value, 2);
        assert_eq!(snap.enumerated.props, 1);
        assert_eq!(snap.to_string(), "set 1/0/0 | value 0/0/2 | props 0/1/0 | hb 1");
    }
}
