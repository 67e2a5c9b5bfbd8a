use serde_json::{Map, Value};

/// One field whose value differs between two snapshots of a device.
///
/// `field` is a dotted path (`"temperature"`, `"aq_detail.level"`).
/// `old` is `Null` when the field did not exist before.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueChange {
    pub field: String,
    pub old: Value,
    pub new: Value,
}

/// Walks `current` and records every leaf that differs from `previous`.
/// Keys only present in `previous` are not reported.
pub(crate) fn diff_json(
    previous: &Value,
    current: &Value,
    path_prefix: &str,
    changes: &mut Vec<(String, Value, Value)>,
) {
    match (previous, current) {
        (Value::Object(prev_map), Value::Object(curr_map)) => {
            for (key, curr_val) in curr_map {
                let path = if path_prefix.is_empty() {
                    key.clone()
                } else {
                    format!("{path_prefix}.{key}")
                };
                match prev_map.get(key) {
                    Some(prev_val) => diff_json(prev_val, curr_val, &path, changes),
                    None => {
                        if curr_val.is_object() {
                            diff_json(&Value::Object(Map::new()), curr_val, &path, changes);
                        } else {
                            changes.push((path, Value::Null, curr_val.clone()));
                        }
                    }
                }
            }
        }
        (prev, curr) if !same_value(prev, curr) => {
            changes.push((path_prefix.to_string(), prev.clone(), curr.clone()));
        }
        _ => {}
    }
}

// 26 and 26.0 are the same reading; the service is not consistent about it.
fn same_value(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64() == y.as_f64(),
        _ => a == b,
    }
}

pub(crate) fn value_changes(previous: &Value, current: &Value) -> Vec<ValueChange> {
    let mut changes = Vec::new();
    diff_json(previous, current, "", &mut changes);
    changes
        .into_iter()
        .map(|(field, old, new)| ValueChange { field, old, new })
        .collect()
}
