use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;

use super::{ClientError, ObjectRef, RemoteClient};

#[derive(Default)]
struct State {
    objects: BTreeMap<ObjectRef, Value>,
    files: BTreeMap<(ObjectRef, String), Vec<u8>>,
    /// Status merged into objects of a kind whenever they are applied.
    status_on_apply: BTreeMap<String, Value>,
}

/// In-process remote system. Applied objects are stored as given; a status can be
/// pre-registered per kind to simulate convergence.
#[derive(Default)]
pub struct MemoryClient {
    state: Mutex<State>,
}

impl MemoryClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_status_on_apply(&self, kind: &str, status: Value) {
        self.lock().status_on_apply.insert(kind.to_string(), status);
    }

    pub fn set_status(&self, obj_ref: &ObjectRef, status: Value) {
        if let Some(obj) = self.lock().objects.get_mut(obj_ref) {
            obj["status"] = status;
        }
    }

    pub fn set_file(&self, obj_ref: &ObjectRef, path: &str, content: impl Into<Vec<u8>>) {
        self.lock()
            .files
            .insert((obj_ref.clone(), path.to_string()), content.into());
    }

    pub fn object(&self, obj_ref: &ObjectRef) -> Option<Value> {
        self.lock().objects.get(obj_ref).cloned()
    }

    pub fn objects(&self) -> Vec<ObjectRef> {
        self.lock().objects.keys().cloned().collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, State> {
        // A poisoned lock only means another test thread panicked mid-update.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl RemoteClient for MemoryClient {
    async fn apply(&self, mut obj: Value) -> Result<Value, ClientError> {
        let obj_ref = ObjectRef::from_object(&obj)?;
        let mut state = self.lock();
        if let Some(status) = state.status_on_apply.get(&obj_ref.kind) {
            obj["status"] = status.clone();
        } else if obj.get("status").is_none() {
            if let Some(existing) = state.objects.get(&obj_ref).and_then(|o| o.get("status")) {
                obj["status"] = existing.clone();
            }
        }
        state.objects.insert(obj_ref, obj.clone());
        Ok(obj)
    }

    async fn get(&self, obj_ref: &ObjectRef) -> Result<Option<Value>, ClientError> {
        Ok(self.lock().objects.get(obj_ref).cloned())
    }

    async fn delete(&self, obj_ref: &ObjectRef) -> Result<bool, ClientError> {
        let mut state = self.lock();
        state.files.retain(|(r, _), _| r != obj_ref);
        Ok(state.objects.remove(obj_ref).is_some())
    }

    async fn read_file(&self, obj_ref: &ObjectRef, path: &str) -> Result<Option<Vec<u8>>, ClientError> {
        let state = self.lock();
        if !state.objects.contains_key(obj_ref) {
            return Err(ClientError::NotFound(obj_ref.clone()));
        }
        Ok(state.files.get(&(obj_ref.clone(), path.to_string())).cloned())
    }
}
