use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

/// Namespace used when a document leaves it empty.
pub const DEFAULT_NAMESPACE: &str = "default";

pub fn namespace_or_default(namespace: &str) -> &str {
    if namespace.is_empty() {
        DEFAULT_NAMESPACE
    } else {
        namespace
    }
}

#[derive(Debug, Clone)]
pub struct NewEvent {
    pub namespace: String,
    pub instance: String,
    pub r#type: String,
    pub payload: JsonValue,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct StoredEvent {
    pub id: i64,
    pub ts: DateTime<Utc>,
    pub namespace: String,
    pub instance: String,
    pub event_type: String,
    pub payload: JsonValue,
}

impl StoredEvent {
    pub fn from_new(id: i64, ts: DateTime<Utc>, event: NewEvent) -> Self {
        Self {
            id,
            ts,
            namespace: namespace_or_default(&event.namespace).to_string(),
            instance: event.instance,
            event_type: event.r#type,
            payload: event.payload,
        }
    }
}
