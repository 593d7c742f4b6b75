use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use opflow_core::{Instance, OperatorVersion};
use tokio::sync::RwLock;

use crate::store::{namespace_or_default, NewEvent, StateStore, StoreError, StoredEvent};

type Key = (String, String);

fn key(namespace: &str, name: &str) -> Key {
    (namespace_or_default(namespace).to_string(), name.to_string())
}

/// Process-local store, used by tests and one-shot CLI runs.
#[derive(Default)]
pub struct MemoryStore {
    instances: RwLock<BTreeMap<Key, Instance>>,
    operator_versions: RwLock<BTreeMap<Key, OperatorVersion>>,
    events: RwLock<BTreeMap<Key, Vec<StoredEvent>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn get_instance(&self, namespace: &str, name: &str) -> Result<Option<Instance>, StoreError> {
        Ok(self.instances.read().await.get(&key(namespace, name)).cloned())
    }

    async fn put_instance(&self, instance: &Instance) -> Result<(), StoreError> {
        self.instances
            .write()
            .await
            .insert(key(&instance.namespace, &instance.name), instance.clone());
        Ok(())
    }

    async fn get_operator_version(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<OperatorVersion>, StoreError> {
        Ok(self
            .operator_versions
            .read()
            .await
            .get(&key(namespace, name))
            .cloned())
    }

    async fn put_operator_version(&self, operator_version: &OperatorVersion) -> Result<(), StoreError> {
        self.operator_versions.write().await.insert(
            key(&operator_version.namespace, &operator_version.name),
            operator_version.clone(),
        );
        Ok(())
    }

    async fn append_event(&self, event: NewEvent) -> Result<(), StoreError> {
        let mut events = self.events.write().await;
        let list = events.entry(key(&event.namespace, &event.instance)).or_default();
        let id = list.len() as i64 + 1;
        list.push(StoredEvent::from_new(id, Utc::now(), event));
        Ok(())
    }

    async fn list_events(&self, namespace: &str, instance: &str) -> Result<Vec<StoredEvent>, StoreError> {
        Ok(self
            .events
            .read()
            .await
            .get(&key(namespace, instance))
            .cloned()
            .unwrap_or_default())
    }
}
