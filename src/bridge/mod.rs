//! Bridge providers - where parameter states come from
//!
//! Three implementations, chosen once at startup:
//!
//! - [`HostBridge`]: installed by an embedding host that owns the transport
//!   and registers its native functions in-process
//! - [`DirectBridge`]: builds states over a raw event transport
//! - [`PreviewBridge`]: fully local with synthetic defaults, no transport
//!
//! Consumers see the same API from all three. States are memoized per name:
//! one bridge never hands out two instances for the same `(kind, name)`.

use async_trait::async_trait;
use dashmap::DashMap;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

use crate::error::{BridgeError, BridgeResult};
use crate::params::{BooleanState, ContinuousState, EnumeratedState};
use crate::transport::NativeInvoker;

mod direct;
mod host;
pub mod preview;
mod select;

pub use direct::{DirectBridge, DirectOptions, NativeCallMode};
pub use host::HostBridge;
pub use preview::PreviewBridge;
pub use select::{global, install_global, resolve_global, select_bridge};

/// Reserved native function returning the choice list of a parameter
pub const CHOICE_ITEMS_FUNCTION: &str = "getChoiceItems";

/// Which backing a bridge uses
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BridgeKind {
    Host,
    Direct,
    Preview,
}

impl std::fmt::Display for BridgeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BridgeKind::Host => write!(f, "host"),
            BridgeKind::Direct => write!(f, "direct"),
            BridgeKind::Preview => write!(f, "preview"),
        }
    }
}

/// A host function callable by identifier
#[async_trait]
pub trait NativeFunction: Send + Sync {
    fn identifier(&self) -> &str;

    async fn call(&self, args: Vec<Value>) -> BridgeResult<Value>;
}

/// Consumer-facing bridge API
pub trait BridgeProvider: Send + Sync {
    fn kind(&self) -> BridgeKind;

    /// Whether the bridge's transport is currently connected
    fn transport_connected(&self) -> bool;

    fn continuous(&self, name: &str) -> Arc<ContinuousState>;

    fn boolean(&self, name: &str) -> Arc<BooleanState>;

    fn enumerated(&self, name: &str) -> Arc<EnumeratedState>;

    /// Look up a native function; `None` if the bridge has no such function
    fn native_function(&self, identifier: &str) -> Option<Arc<dyn NativeFunction>>;
}

/// Memoization maps, one per kind
///
/// `DashMap::entry` holds the shard lock while the state is built, so
/// concurrent lookups of the same name construct exactly one instance.
#[derive(Default)]
pub(crate) struct StateRegistry {
    continuous: DashMap<String, Arc<ContinuousState>>,
    boolean: DashMap<String, Arc<BooleanState>>,
    enumerated: DashMap<String, Arc<EnumeratedState>>,
}

impl StateRegistry {
    pub(crate) fn continuous_or_insert_with(
        &self,
        name: &str,
        build: impl FnOnce() -> Arc<ContinuousState>,
    ) -> Arc<ContinuousState> {
        Arc::clone(self.continuous.entry(name.to_string()).or_insert_with(build).value())
    }

    pub(crate) fn boolean_or_insert_with(
        &self,
        name: &str,
        build: impl FnOnce() -> Arc<BooleanState>,
    ) -> Arc<BooleanState> {
        Arc::clone(self.boolean.entry(name.to_string()).or_insert_with(build).value())
    }

    pub(crate) fn enumerated_or_insert_with(
        &self,
        name: &str,
        build: impl FnOnce() -> Arc<EnumeratedState>,
    ) -> Arc<EnumeratedState> {
        Arc::clone(self.enumerated.entry(name.to_string()).or_insert_with(build).value())
    }

    pub(crate) fn len(&self) -> usize {
        self.continuous.len() + self.boolean.len() + self.enumerated.len()
    }
}

/// Resolves to an empty list; stand-in when the host cannot introspect
pub struct EmptyListFunction {
    identifier: String,
}

impl EmptyListFunction {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
        }
    }
}

#[async_trait]
impl NativeFunction for EmptyListFunction {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    async fn call(&self, _args: Vec<Value>) -> BridgeResult<Value> {
        Ok(json!([]))
    }
}

/// Always fails with [`BridgeError::NativeUnavailable`]
pub struct UnavailableFunction {
    identifier: String,
}

impl UnavailableFunction {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
        }
    }
}

#[async_trait]
impl NativeFunction for UnavailableFunction {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    async fn call(&self, _args: Vec<Value>) -> BridgeResult<Value> {
        Err(BridgeError::NativeUnavailable(self.identifier.clone()))
    }
}

/// Forwards the call to the host over the transport
pub struct InvokedFunction {
    identifier: String,
    invoker: Arc<NativeInvoker>,
}

impl InvokedFunction {
    pub fn new(identifier: impl Into<String>, invoker: Arc<NativeInvoker>) -> Self {
        Self {
            identifier: identifier.into(),
            invoker,
        }
    }
}

#[async_trait]
impl NativeFunction for InvokedFunction {
    fn identifier(&self) -> &str {
        &self.identifier
    }

    async fn call(&self, args: Vec<Value>) -> BridgeResult<Value> {
        self.invoker.invoke(&self.identifier, args).await
    }
}
