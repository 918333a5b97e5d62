//! Error taxonomy for the bridge layer
//!
//! None of these conditions are fatal to the control surface. Mutators swallow
//! and log them; only native function calls surface them to the caller.

use thiserror::Error;

/// Errors produced by transports and native function calls
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum BridgeError {
    /// The host does not expose the requested native function
    #[error("native function unavailable: {0}")]
    NativeUnavailable(String),

    /// The host did not complete a native call in time
    #[error("native function timeout: {0}")]
    NativeTimeout(String),

    /// The native call completed with an error or could not be issued
    #[error("native function failed: {0}")]
    NativeFailed(String),

    /// The transport refused or failed to deliver a message
    #[error("transport error: {0}")]
    Transport(String),

    /// A remote payload could not be interpreted
    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    /// The transport has been closed by the host
    #[error("transport closed")]
    TransportClosed,
}

pub type BridgeResult<T> = std::result::Result<T, BridgeError>;
