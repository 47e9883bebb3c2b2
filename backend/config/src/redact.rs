//! Config redaction: mask secrets before a config is printed or logged.

use serde_json::Value;

static SENSITIVE_KEYS: &[&str] = &[
    "token",
    "bot_token",
    "api_key",
    "secret",
    "password",
];

/// Copy of `value` with every sensitive string replaced by a short hint.
pub fn redact(value: &Value) -> Value {
    redact_recursive(value, "")
}

pub fn is_sensitive_key(key: &str) -> bool {
    SENSITIVE_KEYS.iter().any(|k| k.eq_ignore_ascii_case(key))
}

fn redact_string(s: &str, key: &str) -> Value {
    if !is_sensitive_key(key) || s.is_empty() {
        return Value::String(s.to_string());
    }
    // Keep the first 4 characters as a hint unless that would reveal most of it.
    let hint: String = if s.chars().count() > 8 {
        s.chars().take(4).collect()
    } else {
        String::new()
    };
    Value::String(format!("{hint}***"))
}

fn redact_recursive(value: &Value, key: &str) -> Value {
    match value {
        Value::String(s) => redact_string(s, key),
        Value::Array(arr) => Value::Array(arr.iter().map(|v| redact_recursive(v, key)).collect()),
        Value::Object(map) => Value::Object(
            map.iter()
                .map(|(k, v)| (k.clone(), redact_recursive(v, k)))
                .collect(),
        ),
        other => other.clone(),
    }
}

/// Dotted paths of every field `redact` would mask.
pub fn collect_redacted_paths(value: &Value) -> Vec<String> {
    let mut paths = Vec::new();
    collect_paths_recursive(value, "", "", &mut paths);
    paths
}

fn collect_paths_recursive(value: &Value, key: &str, path: &str, out: &mut Vec<String>) {
    match value {
        Value::String(s) if !s.is_empty() && is_sensitive_key(key) => out.push(path.to_string()),
        Value::Array(arr) => {
            for (i, v) in arr.iter().enumerate() {
                collect_paths_recursive(v, key, &format!("{path}[{i}]"), out);
            }
        }
        Value::Object(map) => {
            for (k, v) in map {
                let child_path = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                collect_paths_recursive(v, k, &child_path, out);
            }
        }
        _ => {}
    }
}
