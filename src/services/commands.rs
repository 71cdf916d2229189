//! Write path: client-submitted characteristic values to device settings patches.

use crate::attributes::{self, AttributeKey, CommandError};
use crate::gateway::{Gateway, GatewayError};
use crate::models::accessory::Value;
use crate::models::device::Settings;
use crate::state::AccessoryState;
use log::{info, warn};
use std::sync::Arc;

#[derive(Debug)]
pub enum CommandOutcome {
    Sent(Settings),
    Rejected(CommandError),
    Failed(GatewayError),
}

/// Translate, validate and send one client write. Nothing here touches accessory state:
/// the next poll reports what the device actually accepted.
pub fn handle(gateway: &dyn Gateway, key: AttributeKey, value: Value) -> CommandOutcome {
    let attr = attributes::lookup(key);
    let Some(translate) = attr.translate else {
        warn!("{}: ignoring write, attribute is read-only", attr.name);
        return CommandOutcome::Rejected(CommandError::ReadOnly(attr.name));
    };

    info!("Setting {} to {}", attr.name, value);
    let patch = match translate(attr, value) {
        Ok(patch) => patch,
        Err(e) => {
            warn!("Invalid {} setting ({}). Ignoring change request.", attr.name, e);
            return CommandOutcome::Rejected(e);
        }
    };

    match gateway.send_settings(&patch) {
        Ok(()) => {
            info!("Sent {} patch: {}", attr.name, patch.present_fields().join(", "));
            CommandOutcome::Sent(patch)
        }
        Err(e) => {
            warn!("Sending {} patch failed, dropping command: {}", attr.name, e);
            CommandOutcome::Failed(e)
        }
    }
}

/// Register a handler for every characteristic the accessory accepts writes on.
/// Returns how many were registered.
pub fn register_all(state: &AccessoryState, gateway: Arc<dyn Gateway>) -> usize {
    let profile = state.profile();
    let writable: Vec<AttributeKey> = state
        .attributes()
        .filter(|a| profile.accepts_writes(a))
        .map(|a| a.key)
        .collect();

    let mut registered = 0;
    for key in writable {
        let gateway = Arc::clone(&gateway);
        let handler = Arc::new(move |value: Value| {
            let _ = handle(gateway.as_ref(), key, value);
        });
        match state.on_remote_update(key, handler) {
            Ok(()) => registered += 1,
            Err(e) => warn!("Could not register handler for {:?}: {}", key, e),
        }
    }
    registered
}
