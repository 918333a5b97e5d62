//! Bridge selection and the process-wide bridge slot
//!
//! Selection runs once:
//! 1. an already installed bridge is reused unchanged
//! 2. a connected transport gets a [`DirectBridge`]
//! 3. otherwise a [`PreviewBridge`]
//!
//! Preview is unconditional, so selection cannot fail.

use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::{info, warn};

use super::{BridgeProvider, DirectBridge, DirectOptions, PreviewBridge};
use crate::choices::ChoiceDefaults;
use crate::transport::Transport;

static GLOBAL: OnceCell<Arc<dyn BridgeProvider>> = OnceCell::new();

pub fn select_bridge(
    existing: Option<Arc<dyn BridgeProvider>>,
    transport: Option<Arc<dyn Transport>>,
    options: DirectOptions,
    choices: ChoiceDefaults,
) -> Arc<dyn BridgeProvider> {
    if let Some(bridge) = existing {
        info!("Reusing existing {} bridge", bridge.kind());
        return bridge;
    }

    match transport {
        Some(transport) if transport.is_connected() => Arc::new(DirectBridge::new(transport, options)),
        Some(transport) => {
            warn!("⚠️  Transport '{}' not connected, falling back to preview", transport.name());
            Arc::new(PreviewBridge::with_choices(choices))
        }
        None => Arc::new(PreviewBridge::with_choices(choices)),
    }
}

/// Install the process-wide bridge; only the first call succeeds
///
/// On conflict the rejected bridge is handed back.
pub fn install_global(bridge: Arc<dyn BridgeProvider>) -> Result<(), Arc<dyn BridgeProvider>> {
    GLOBAL.set(bridge)?;
    info!("✅ Installed global bridge");
    Ok(())
}

pub fn global() -> Option<Arc<dyn BridgeProvider>> {
    GLOBAL.get().cloned()
}

/// Select a bridge once and install it; later calls return the installed one
pub fn resolve_global(
    transport: Option<Arc<dyn Transport>>,
    options: DirectOptions,
    choices: ChoiceDefaults,
) -> Arc<dyn BridgeProvider> {
    Arc::clone(GLOBAL.get_or_init(|| select_bridge(None, transport, options, choices)))
}
