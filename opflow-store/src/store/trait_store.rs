use async_trait::async_trait;
use opflow_core::{Instance, OperatorVersion};

use crate::store::types::*;

#[async_trait]
pub trait StateStore: Send + Sync {
    async fn get_instance(&self, namespace: &str, name: &str)
        -> Result<Option<Instance>, StoreError>;

    /// Insert or replace the instance document, status included.
    async fn put_instance(&self, instance: &Instance) -> Result<(), StoreError>;

    async fn get_operator_version(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<OperatorVersion>, StoreError>;

    async fn put_operator_version(&self, operator_version: &OperatorVersion)
        -> Result<(), StoreError>;

    /// Append-only; ids are assigned per instance in insertion order.
    async fn append_event(&self, event: NewEvent) -> Result<(), StoreError>;

    async fn list_events(&self, namespace: &str, instance: &str)
        -> Result<Vec<StoredEvent>, StoreError>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid document {path}: {message}")]
    Document { path: String, message: String },
    #[error("store error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(e: serde_json::Error) -> Self {
        StoreError::Other(e.to_string())
    }
}

impl From<serde_yaml::Error> for StoreError {
    fn from(e: serde_yaml::Error) -> Self {
        StoreError::Other(e.to_string())
    }
}
