//! Consumer-side synchronization
//!
//! How a surface stays consistent with remote state without feedback loops:
//! - local interaction: one `commit_*` call, render the value it returns
//! - remote change: bound listeners re-render from getters only
//! - heartbeat: periodic read-only pass over all watched states

mod binding;
mod counters;
mod diagnostics;
mod heartbeat;

pub use binding::{
    bind_boolean, bind_continuous, bind_enumerated, commit_boolean, commit_continuous,
    commit_enumerated, Render,
};
pub use counters::{CounterSnapshot, KindCounts, SyncCounters};
pub use diagnostics::Diagnostics;
pub use heartbeat::{Heartbeat, Snapshot, SnapshotEntry, DEFAULT_HEARTBEAT_MS};
