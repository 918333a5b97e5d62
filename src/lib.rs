//! Param Bridge - bidirectional parameter sync between a control surface and its host
//!
//! The host owns the authoritative value of every parameter. This crate keeps
//! a local state per parameter in step with it over an event transport, and
//! degrades to a fully local preview when no host is reachable.

pub mod bridge;
pub mod choices;
pub mod config;
pub mod controls;
pub mod error;
pub mod listeners;
pub mod params;
pub mod sync;
pub mod transform;
pub mod transport;
pub mod wire;

pub use bridge::{BridgeKind, BridgeProvider, DirectBridge, HostBridge, NativeFunction, PreviewBridge};
pub use choices::{ChoiceDefaults, ChoiceOutcome, ChoiceRequest, ChoiceResolver};
pub use error::{BridgeError, BridgeResult};
pub use listeners::{ListenerId, ListenerRegistry};
pub use params::{BooleanState, ContinuousState, EnumeratedState, ParameterHandle, ParameterKind, ParameterState};
pub use transport::{ChannelTransport, Transport, WebSocketTransport};
pub use wire::WireMessage;
