use std::collections::BTreeMap;

use crate::types::{Instance, OperatorVersion};

/// Builds the `{{ .Params.<name> }}` map: instance overrides win over operator version
/// defaults. Parameters without an override or a default render as an empty string.
pub fn params_map(instance: &Instance, operator_version: &OperatorVersion) -> BTreeMap<String, String> {
    let mut params = instance.spec.parameters.clone();

    for param in &operator_version.parameters {
        params
            .entry(param.name.clone())
            .or_insert_with(|| param.default.clone().unwrap_or_default());
    }

    params
}

/// Keys removed from `old`, plus keys added or changed in `new`.
///
/// Removed keys carry their old value, added or changed keys their new one.
pub fn parameter_diff(
    old: &BTreeMap<String, String>,
    new: &BTreeMap<String, String>,
) -> BTreeMap<String, String> {
    let mut diff = BTreeMap::new();

    for (key, val) in old {
        if !new.contains_key(key) {
            diff.insert(key.clone(), val.clone());
        }
    }

    for (key, val) in new {
        if old.get(key) != Some(val) {
            diff.insert(key.clone(), val.clone());
        }
    }

    diff
}
