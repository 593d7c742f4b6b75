use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::io::AsyncWriteExt;

use crate::store::{namespace_or_default, NewEvent, StoreError, StoredEvent};

pub(crate) const EVENTS_DIR: &str = "events";

fn events_path(root: &Path, namespace: &str, instance: &str) -> PathBuf {
    root.join(EVENTS_DIR)
        .join(namespace_or_default(namespace))
        .join(format!("{instance}.jsonl"))
}

pub(crate) async fn append_event(root: &Path, event: NewEvent) -> Result<(), StoreError> {
    let path = events_path(root, &event.namespace, &event.instance);
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    let id = list_events(root, &event.namespace, &event.instance).await?.len() as i64 + 1;
    let stored = StoredEvent::from_new(id, Utc::now(), event);
    let mut line = serde_json::to_string(&stored)?;
    line.push('\n');

    let mut file = tokio::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .await?;
    file.write_all(line.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}

pub(crate) async fn list_events(
    root: &Path,
    namespace: &str,
    instance: &str,
) -> Result<Vec<StoredEvent>, StoreError> {
    let path = events_path(root, namespace, instance);
    let content = match tokio::fs::read_to_string(&path).await {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };
    let mut events = Vec::new();
    for line in content.lines().filter(|l| !l.trim().is_empty()) {
        let event = serde_json::from_str(line).map_err(|e| StoreError::Document {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        events.push(event);
    }
    Ok(events)
}
