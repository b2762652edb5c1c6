// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Report parameter overrides.

use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Key/value parameters injected into a report. Ordered by key so two
/// submissions with the same parameters compare equal regardless of the
/// order they were given in.
pub type Overrides = BTreeMap<String, Value>;

#[derive(Debug, Error)]
pub enum OverridesError {
    #[error("overrides are not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("overrides must be a JSON object or a list of objects, got: {0}")]
    NotAnObject(Value),

    #[error("can't iterate over '{key}' unless it is given in the overrides: {overrides}")]
    MissingIterateKey { key: String, overrides: Value },

    #[error("can't iterate over '{key}': its value is not a list ({value})")]
    NotAList { key: String, value: Value },
}

/// True when every key in `filter` is present in `overrides` with an equal
/// value. An empty filter matches everything.
pub fn matches(overrides: &Overrides, filter: &Overrides) -> bool {
    filter.iter().all(|(k, v)| overrides.get(k) == Some(v))
}

/// Expand a JSON overrides document into one override set per job to run.
///
/// - a list of objects yields one job per object (`iterate_key` is ignored)
/// - an object with `iterate_key` set explodes that key's list value into one
///   job per element, other keys copied as-is
/// - any other object yields exactly one job
pub fn expand_overrides(
    json: &str,
    iterate_key: Option<&str>,
) -> Result<Vec<Overrides>, OverridesError> {
    let doc: Value = if json.trim().is_empty() {
        Value::Object(serde_json::Map::new())
    } else {
        serde_json::from_str(json)?
    };

    match doc {
        Value::Array(items) => {
            if let Some(key) = iterate_key {
                tracing::warn!(
                    key,
                    "iterate key given with a list of overrides; running the list as-is"
                );
            }
            items.into_iter().map(into_overrides).collect()
        }
        Value::Object(map) => {
            let base: Overrides = map.into_iter().collect();
            let Some(key) = iterate_key.filter(|k| !k.is_empty()) else {
                return Ok(vec![base]);
            };
            let Some(values) = base.get(key) else {
                return Err(OverridesError::MissingIterateKey {
                    key: key.to_string(),
                    overrides: Value::Object(base.into_iter().collect()),
                });
            };
            let Value::Array(values) = values else {
                return Err(OverridesError::NotAList { key: key.to_string(), value: values.clone() });
            };
            Ok(values
                .iter()
                .map(|v| {
                    let mut one = base.clone();
                    one.insert(key.to_string(), v.clone());
                    one
                })
                .collect())
        }
        other => Err(OverridesError::NotAnObject(other)),
    }
}

fn into_overrides(value: Value) -> Result<Overrides, OverridesError> {
    match value {
        Value::Object(map) => Ok(map.into_iter().collect()),
        other => Err(OverridesError::NotAnObject(other)),
    }
}

#[cfg(test)]
#[path = "overrides_tests.rs"]
mod tests;
