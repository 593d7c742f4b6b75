use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use serde_json::Value;

use super::{ClientError, ObjectRef, RemoteClient};

/// Remote system backed by a directory tree:
/// `<root>/<kind>/<namespace>/<name>.json`, with files produced by a unit of work under
/// `<root>/<kind>/<namespace>/<name>.files/`.
pub struct DirClient {
    root: PathBuf,
}

impl DirClient {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn object_dir(&self, obj_ref: &ObjectRef) -> PathBuf {
        let namespace = if obj_ref.namespace.is_empty() {
            "_cluster"
        } else {
            obj_ref.namespace.as_str()
        };
        self.root.join(&obj_ref.kind).join(namespace)
    }

    fn object_path(&self, obj_ref: &ObjectRef) -> PathBuf {
        self.object_dir(obj_ref).join(format!("{}.json", obj_ref.name))
    }

    fn files_dir(&self, obj_ref: &ObjectRef) -> PathBuf {
        self.object_dir(obj_ref).join(format!("{}.files", obj_ref.name))
    }
}

fn io_error(e: std::io::Error) -> ClientError {
    ClientError::Unavailable(e.to_string())
}

/// Keeps only normal components so a file path cannot escape the files directory.
fn relative_file_path(path: &str) -> PathBuf {
    Path::new(path)
        .components()
        .filter_map(|c| match c {
            Component::Normal(p) => Some(p),
            _ => None,
        })
        .collect()
}

#[async_trait]
impl RemoteClient for DirClient {
    async fn apply(&self, mut obj: Value) -> Result<Value, ClientError> {
        let obj_ref = ObjectRef::from_object(&obj)?;
        let path = self.object_path(&obj_ref);

        if obj.get("status").is_none() {
            if let Some(existing) = self.get(&obj_ref).await? {
                if let Some(status) = existing.get("status") {
                    obj["status"] = status.clone();
                }
            }
        }

        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(io_error)?;
        }
        let body = serde_json::to_vec_pretty(&obj).map_err(|e| ClientError::Invalid(e.to_string()))?;
        tokio::fs::write(&path, body).await.map_err(io_error)?;
        Ok(obj)
    }

    async fn get(&self, obj_ref: &ObjectRef) -> Result<Option<Value>, ClientError> {
        let path = self.object_path(obj_ref);
        let body = match tokio::fs::read(&path).await {
            Ok(b) => b,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(io_error(e)),
        };
        serde_json::from_slice(&body)
            .map(Some)
            .map_err(|e| ClientError::Other(format!("{}: {e}", path.display())))
    }

    async fn delete(&self, obj_ref: &ObjectRef) -> Result<bool, ClientError> {
        let files = self.files_dir(obj_ref);
        if let Err(e) = tokio::fs::remove_dir_all(&files).await {
            if e.kind() != std::io::ErrorKind::NotFound {
                return Err(io_error(e));
            }
        }
        match tokio::fs::remove_file(self.object_path(obj_ref)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(io_error(e)),
        }
    }

    async fn read_file(&self, obj_ref: &ObjectRef, path: &str) -> Result<Option<Vec<u8>>, ClientError> {
        if self.get(obj_ref).await?.is_none() {
            return Err(ClientError::NotFound(obj_ref.clone()));
        }
        let file = self.files_dir(obj_ref).join(relative_file_path(path));
        match tokio::fs::read(&file).await {
            Ok(b) => Ok(Some(b)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(e)),
        }
    }
}
