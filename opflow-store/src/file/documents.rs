use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::store::{namespace_or_default, StoreError};

pub(crate) const INSTANCES_DIR: &str = "instances";
pub(crate) const OPERATOR_VERSIONS_DIR: &str = "operatorversions";

pub(crate) fn document_path(root: &Path, dir: &str, namespace: &str, name: &str) -> PathBuf {
    root.join(dir)
        .join(namespace_or_default(namespace))
        .join(format!("{name}.yaml"))
}

pub(crate) async fn read_document<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, StoreError> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };
    let doc = opflow_core::parse_document_str::<T>(&content, opflow_core::DocumentFormat::Auto)
        .map_err(|e| StoreError::Document {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
    Ok(Some(doc.document))
}

/// Writes through a sibling temp file and renames it into place.
pub(crate) async fn write_document<T: Serialize>(path: &Path, doc: &T) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let content = serde_yaml::to_string(doc)?;
    let tmp = path.with_extension("yaml.tmp");
    tokio::fs::write(&tmp, content).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}
