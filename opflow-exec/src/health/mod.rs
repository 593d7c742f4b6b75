use serde_json::Value;

/// Whether an observed object has converged.
///
/// Objects without a `status` are accepted as soon as they exist. Otherwise the object
/// is healthy when `status.ready` is true, when a `Ready` condition is `"True"`, or when
/// `status.phase` reports a running or finished unit of work.
pub fn is_healthy(obj: &Value) -> bool {
    let Some(status) = obj.get("status") else {
        return true;
    };
    if status.is_null() {
        return true;
    }

    if let Some(ready) = status.get("ready").and_then(Value::as_bool) {
        return ready;
    }

    if let Some(conditions) = status.get("conditions").and_then(Value::as_array) {
        if let Some(ready) = conditions
            .iter()
            .find(|c| c.get("type").and_then(Value::as_str) == Some("Ready"))
        {
            return ready.get("status").and_then(Value::as_str) == Some("True");
        }
    }

    match status.get("phase").and_then(Value::as_str) {
        Some("Succeeded" | "Running" | "Active") => true,
        Some(_) => false,
        None => status.get("conditions").is_none(),
    }
}

/// Whether a unit of work has terminally failed.
pub fn is_failed(obj: &Value) -> bool {
    obj.get("status")
        .and_then(|s| s.get("phase"))
        .and_then(Value::as_str)
        == Some("Failed")
}
