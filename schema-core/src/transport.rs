use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use anyhow::{Result, anyhow};
use async_trait::async_trait;

use crate::service::ActionHandle;

/// Flat device snapshot keyed by fully qualified property name.
pub type StateMap = BTreeMap<String, serde_json::Value>;

/// Device I/O seam. Real implementations talk to hardware over the vendor
/// protocol using the address map a capability binding produced; the library
/// only ships [`InMemoryTransport`].
///
/// `write_property` and `invoke_action` return `Ok(false)` when the device
/// acknowledges but refuses the request.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    async fn read_all(&self) -> Result<StateMap>;
    async fn write_property(&self, full_name: &str, value: serde_json::Value) -> Result<bool>;
    async fn invoke_action(&self, action: ActionHandle) -> Result<bool>;
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordedWrite {
    pub full_name: String,
    pub value: serde_json::Value,
}

#[derive(Default)]
struct Inner {
    state: StateMap,
    writes: Vec<RecordedWrite>,
    actions: Vec<ActionHandle>,
    reject_writes: bool,
    offline: bool,
}

/// Scriptable transport backed by a plain map. Accepted writes are applied
/// to the backing state so a follow-up `read_all` observes them; every write
/// and action is journaled for assertions.
#[derive(Clone, Default)]
pub struct InMemoryTransport {
    inner: Arc<Mutex<Inner>>,
}

impl InMemoryTransport {
    pub fn new(state: StateMap) -> Self {
        Self { inner: Arc::new(Mutex::new(Inner { state, ..Inner::default() })) }
    }

    pub fn set_state(&self, full_name: &str, value: serde_json::Value) {
        self.inner.lock().unwrap().state.insert(full_name.to_string(), value);
    }

    pub fn remove_state(&self, full_name: &str) {
        self.inner.lock().unwrap().state.remove(full_name);
    }

    pub fn writes(&self) -> Vec<RecordedWrite> {
        self.inner.lock().unwrap().writes.clone()
    }

    pub fn write_count(&self) -> usize {
        self.inner.lock().unwrap().writes.len()
    }

    pub fn actions(&self) -> Vec<ActionHandle> {
        self.inner.lock().unwrap().actions.clone()
    }

    /// Make the device acknowledge and refuse subsequent writes and actions.
    pub fn reject_writes(&self, reject: bool) {
        self.inner.lock().unwrap().reject_writes = reject;
    }

    /// Make every call fail as if the device dropped off the network.
    pub fn set_offline(&self, offline: bool) {
        self.inner.lock().unwrap().offline = offline;
    }
}

#[async_trait]
impl Transport for InMemoryTransport {
    async fn read_all(&self) -> Result<StateMap> {
        let inner = self.inner.lock().unwrap();
        if inner.offline {
            return Err(anyhow!("device unreachable"));
        }
        Ok(inner.state.clone())
    }

    async fn write_property(&self, full_name: &str, value: serde_json::Value) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        if inner.offline {
            return Err(anyhow!("device unreachable"));
        }
        inner.writes.push(RecordedWrite { full_name: full_name.to_string(), value: value.clone() });
        if inner.reject_writes {
            return Ok(false);
        }
        inner.state.insert(full_name.to_string(), value);
        Ok(true)
    }

    async fn invoke_action(&self, action: ActionHandle) -> Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        if inner.offline {
            return Err(anyhow!("device unreachable"));
        }
        inner.actions.push(action);
        Ok(!inner.reject_writes)
    }
}
