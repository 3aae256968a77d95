//! Client-side collection operations over cached JSON records.
//!
//! These are the pure cores behind the manager's async `filter_data`,
//! `sort_data`, and `search_data`. They never mutate their input; each
//! returns a fresh `Vec`.

use std::cmp::Ordering;

use serde_json::Value;

/// Fields searched when the caller does not name any.
pub const DEFAULT_SEARCH_FIELDS: &[&str] = &["title", "body"];

/// Coerce a JSON value to the text used for searching and mixed-type
/// comparison. Strings are taken verbatim (no surrounding quotes).
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Case-insensitive string comparison.
pub fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.to_lowercase().cmp(&b.to_lowercase())
}

/// Case-insensitive substring check.
pub fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

/// Compare two field values: strings case-insensitively, numbers
/// numerically, anything else through its text coercion. Missing fields
/// (Null) sort through the text path as empty strings.
fn cmp_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::String(a), Value::String(b)) => cmp_ignore_case(a, b),
        (Value::Number(a), Value::Number(b)) => {
            let (a, b) = (a.as_f64().unwrap_or(0.0), b.as_f64().unwrap_or(0.0));
            a.partial_cmp(&b).unwrap_or(Ordering::Equal)
        }
        _ => cmp_ignore_case(&value_text(a), &value_text(b)),
    }
}

/// Keep the items satisfying `predicate`, order preserved.
pub fn filter<F>(data: &[Value], predicate: F) -> Vec<Value>
where
    F: Fn(&Value) -> bool,
{
    data.iter().filter(|item| predicate(item)).cloned().collect()
}

/// Sort by the named field. Stable, so equal keys keep their input order.
pub fn sort(data: &[Value], sort_key: &str, ascending: bool) -> Vec<Value> {
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| {
        let ordering = cmp_values(
            a.get(sort_key).unwrap_or(&Value::Null),
            b.get(sort_key).unwrap_or(&Value::Null),
        );
        if ascending {
            ordering
        } else {
            ordering.reverse()
        }
    });
    sorted
}

/// Keep items where any of `fields` contains `query` as a case-insensitive
/// substring. A blank query returns the input unchanged.
pub fn search(data: &[Value], query: &str, fields: &[&str]) -> Vec<Value> {
    let query = query.trim();
    if query.is_empty() {
        return data.to_vec();
    }
    data.iter()
        .filter(|item| {
            fields.iter().any(|field| {
                item.get(field)
                    .map(|value| contains_ignore_case(&value_text(value), query))
                    .unwrap_or(false)
            })
        })
        .cloned()
        .collect()
}
