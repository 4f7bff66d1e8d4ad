use std::sync::Arc;

use chrono::{DateTime, Utc};
use schema_core::{
    service::ActionHandle,
    transport::{StateMap, Transport},
};
use tracing::warn;

/// Snapshot key for the optimistic power flag kept after an action-based
/// power change. Never collides with property keys, which always contain a
/// service qualifier.
pub(crate) const POWER_SHADOW: &str = "power";

/// Shared polling and write plumbing behind every entity facade. Reads answer
/// from the snapshot taken by the last `update`; they never touch the device.
pub struct EntityCore {
    transport: Arc<dyn Transport>,
    state: StateMap,
    available: bool,
    last_updated: Option<DateTime<Utc>>,
}

impl EntityCore {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self { transport, state: StateMap::new(), available: false, last_updated: None }
    }

    pub fn state(&self) -> &StateMap {
        &self.state
    }

    pub fn available(&self) -> bool {
        self.available
    }

    pub fn last_updated(&self) -> Option<DateTime<Utc>> {
        self.last_updated
    }

    pub fn value(&self, full_name: &str) -> Option<&serde_json::Value> {
        self.state.get(full_name)
    }

    /// Replaces the snapshot with a fresh read of every property. A failed
    /// poll keeps the stale snapshot and marks the entity unavailable until
    /// the next successful one.
    pub async fn update(&mut self) -> bool {
        match self.transport.read_all().await {
            Ok(state) => {
                self.state = state;
                self.available = true;
                self.last_updated = Some(Utc::now());
                true
            }
            Err(err) => {
                warn!(error = %err, "poll failed, keeping stale snapshot");
                self.available = false;
                false
            }
        }
    }

    /// Writes one property and echoes the accepted value into the local
    /// snapshot so reads between polls see it.
    pub async fn set_property(&mut self, full_name: &str, value: serde_json::Value) -> bool {
        match self.transport.write_property(full_name, value.clone()).await {
            Ok(true) => {
                self.state.insert(full_name.to_string(), value);
                true
            }
            Ok(false) => {
                warn!(property = full_name, "device rejected write");
                false
            }
            Err(err) => {
                warn!(property = full_name, error = %err, "write failed");
                false
            }
        }
    }

    pub async fn invoke(&self, action: ActionHandle) -> bool {
        match self.transport.invoke_action(action).await {
            Ok(ok) => ok,
            Err(err) => {
                warn!(siid = action.siid, aiid = action.aiid, error = %err, "action failed");
                false
            }
        }
    }

    /// Overlays a value onto the snapshot without touching the device. The
    /// next successful poll overwrites it.
    pub fn set_local(&mut self, full_name: &str, value: serde_json::Value) {
        self.state.insert(full_name.to_string(), value);
    }
}
