mod dir;
mod memory;

use async_trait::async_trait;
use serde_json::Value;

pub use dir::DirClient;
pub use memory::MemoryClient;

/// Address of an object on the remote system.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObjectRef {
    pub kind: String,
    pub namespace: String,
    pub name: String,
}

impl ObjectRef {
    pub fn new(kind: impl Into<String>, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            kind: kind.into(),
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Reads `kind`, `metadata.namespace` and `metadata.name` from an object.
    pub fn from_object(obj: &Value) -> Result<Self, ClientError> {
        let kind = obj
            .get("kind")
            .and_then(Value::as_str)
            .ok_or_else(|| ClientError::Invalid("object has no kind".to_string()))?;
        let metadata = obj.get("metadata");
        let name = metadata
            .and_then(|m| m.get("name"))
            .and_then(Value::as_str)
            .ok_or_else(|| ClientError::Invalid(format!("{kind} has no metadata.name")))?;
        let namespace = metadata
            .and_then(|m| m.get("namespace"))
            .and_then(Value::as_str)
            .unwrap_or_default();
        Ok(Self::new(kind, namespace, name))
    }
}

impl std::fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}/{}", self.kind, self.namespace, self.name)
    }
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    #[error("not found: {0}")]
    NotFound(ObjectRef),
    /// The remote system rejected the object as malformed.
    #[error("invalid object: {0}")]
    Invalid(String),
    #[error("remote unavailable: {0}")]
    Unavailable(String),
    #[error("client error: {0}")]
    Other(String),
}

/// Shared read/write handle to the remote system the tasks act on.
#[async_trait]
pub trait RemoteClient: Send + Sync {
    /// Create or update `obj`; returns the object as stored remotely.
    async fn apply(&self, obj: Value) -> Result<Value, ClientError>;

    async fn get(&self, obj_ref: &ObjectRef) -> Result<Option<Value>, ClientError>;

    /// Returns `false` when the object did not exist.
    async fn delete(&self, obj_ref: &ObjectRef) -> Result<bool, ClientError>;

    /// Reads a file produced inside a running unit of work (e.g. a pipe pod).
    async fn read_file(&self, obj_ref: &ObjectRef, path: &str)
        -> Result<Option<Vec<u8>>, ClientError>;
}
