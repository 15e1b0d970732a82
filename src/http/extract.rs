//! Response body path lookups
//!
//! Plain paths use dot notation with optional array indexing
//! (`meta.next`, `data[0].id`, `data[-1].id`). Paths containing a `*`
//! wildcard are evaluated as JSONPath.

use crate::error::{Error, Result};
use serde_json::Value;

/// Look up a single value by dot path
///
/// Returns `None` when any segment is missing. A leading `$.` is ignored.
pub fn lookup<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    let path = path.strip_prefix("$.").unwrap_or(path);
    if path.is_empty() || path == "$" {
        return Some(value);
    }

    let mut current = value;
    for part in path.split('.') {
        match part.find('[') {
            Some(bracket) => {
                let name = &part[..bracket];
                let index = part[bracket + 1..].strip_suffix(']')?;

                if !name.is_empty() {
                    current = current.get(name)?;
                }
                current = index_array(current, index)?;
            }
            None => current = current.get(part)?,
        }
    }

    Some(current)
}

fn index_array<'a>(value: &'a Value, index: &str) -> Option<&'a Value> {
    let items = value.as_array()?;
    let index: i64 = index.parse().ok()?;
    let position = if index < 0 {
        items.len().checked_sub(index.unsigned_abs() as usize)?
    } else {
        index as usize
    };
    items.get(position)
}

/// Extract the item array at `path`
///
/// A missing path or `null` yields no items. A single non-array value is
/// treated as a one-item page.
pub fn extract_items(value: &Value, path: &str) -> Result<Vec<Value>> {
    if path.contains('*') {
        return extract_with_jsonpath(value, path);
    }

    match lookup(value, path) {
        Some(Value::Array(items)) => Ok(items.clone()),
        Some(Value::Null) | None => Ok(Vec::new()),
        Some(other) => Ok(vec![other.clone()]),
    }
}

/// Look up a value and render it as a cursor string
///
/// Strings are used verbatim, numbers in their decimal form. Anything
/// else (missing, `null`, empty string, objects) means no cursor.
pub fn extract_cursor(value: &Value, path: &str) -> Option<String> {
    match lookup(value, path)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Look up a non-negative integer, accepting numeric strings
pub fn extract_u64(value: &Value, path: &str) -> Result<Option<u64>> {
    match lookup(value, path) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Number(n)) => n.as_u64().map(Some).ok_or_else(|| Error::RecordExtraction {
            path: path.to_string(),
            message: format!("expected a non-negative integer, got {n}"),
        }),
        Some(Value::String(s)) => s.parse().map(Some).map_err(|_| Error::RecordExtraction {
            path: path.to_string(),
            message: format!("expected a non-negative integer, got '{s}'"),
        }),
        Some(other) => Err(Error::RecordExtraction {
            path: path.to_string(),
            message: format!("expected a non-negative integer, got {other}"),
        }),
    }
}

/// Extract values using jsonpath-rust
fn extract_with_jsonpath(value: &Value, path: &str) -> Result<Vec<Value>> {
    use jsonpath_rust::JsonPath;

    let jp = JsonPath::try_from(path)
        .map_err(|e| Error::json_path(format!("Invalid JSONPath '{path}': {e}")))?;

    match jp.find(value) {
        Value::Array(items) => Ok(items),
        Value::Null => Ok(Vec::new()),
        other => Ok(vec![other]),
    }
}
