use std::path::{Path, PathBuf};

use async_trait::async_trait;
use opflow_core::{Instance, OperatorVersion};

use crate::store::{NewEvent, StateStore, StoreError, StoredEvent};

use super::documents::{
    document_path, read_document, write_document, INSTANCES_DIR, OPERATOR_VERSIONS_DIR,
};
use super::events;

/// Directory-backed store:
/// `instances/<ns>/<name>.yaml`, `operatorversions/<ns>/<name>.yaml`,
/// `events/<ns>/<name>.jsonl`.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let store = Self::new(root);
        tokio::fs::create_dir_all(&store.root).await?;
        tracing::debug!(root = %store.root.display(), "opened file store");
        Ok(store)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[async_trait]
impl StateStore for FileStore {
    async fn get_instance(&self, namespace: &str, name: &str) -> Result<Option<Instance>, StoreError> {
        read_document(&document_path(&self.root, INSTANCES_DIR, namespace, name)).await
    }

    async fn put_instance(&self, instance: &Instance) -> Result<(), StoreError> {
        let path = document_path(&self.root, INSTANCES_DIR, &instance.namespace, &instance.name);
        write_document(&path, instance).await
    }

    async fn get_operator_version(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<OperatorVersion>, StoreError> {
        read_document(&document_path(&self.root, OPERATOR_VERSIONS_DIR, namespace, name)).await
    }

    async fn put_operator_version(&self, operator_version: &OperatorVersion) -> Result<(), StoreError> {
        let path = document_path(
            &self.root,
            OPERATOR_VERSIONS_DIR,
            &operator_version.namespace,
            &operator_version.name,
        );
        write_document(&path, operator_version).await
    }

    async fn append_event(&self, event: NewEvent) -> Result<(), StoreError> {
        events::append_event(&self.root, event).await
    }

    async fn list_events(&self, namespace: &str, instance: &str) -> Result<Vec<StoredEvent>, StoreError> {
        events::list_events(&self.root, namespace, instance).await
    }
}
