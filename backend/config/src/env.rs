//! `${VAR_NAME}` substitution in config string values.
//!
//! Only uppercase `[A-Z_][A-Z0-9_]*` names are recognised. `$${VAR}` escapes
//! to a literal `${VAR}`.

use anyhow::Result;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::HashMap;

/// A reference, optionally preceded by the `$` escape.
static ENV_VAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\$?)\$\{([A-Z_][A-Z0-9_]*)\}").expect("valid env var pattern"));

#[derive(Debug, thiserror::Error)]
#[error("Missing env var \"{var_name}\" referenced at config path: {config_path}")]
pub struct MissingEnvVarError {
    pub var_name: String,
    pub config_path: String,
}

/// Substitute `${VAR}` references with values from `env`.
///
/// Unset or empty variables are an error.
pub fn resolve_env_vars_with(value: &Value, env: &HashMap<String, String>) -> Result<Value> {
    Ok(substitute_value(value, env, "")?)
}

fn substitute_value(
    value: &Value,
    env: &HashMap<String, String>,
    path: &str,
) -> Result<Value, MissingEnvVarError> {
    match value {
        Value::String(s) => Ok(Value::String(substitute_string(s, env, path)?)),
        Value::Array(arr) => arr
            .iter()
            .enumerate()
            .map(|(i, v)| substitute_value(v, env, &format!("{path}[{i}]")))
            .collect::<Result<Vec<_>, _>>()
            .map(Value::Array),
        Value::Object(map) => {
            let mut result = serde_json::Map::new();
            for (k, v) in map {
                let child_path = if path.is_empty() {
                    k.clone()
                } else {
                    format!("{path}.{k}")
                };
                result.insert(k.clone(), substitute_value(v, env, &child_path)?);
            }
            Ok(Value::Object(result))
        }
        other => Ok(other.clone()),
    }
}

fn substitute_string(
    s: &str,
    env: &HashMap<String, String>,
    path: &str,
) -> Result<String, MissingEnvVarError> {
    if !s.contains("${") {
        return Ok(s.to_string());
    }

    let mut missing: Option<MissingEnvVarError> = None;
    let substituted = ENV_VAR_PATTERN.replace_all(s, |caps: &Captures| {
        let var_name = &caps[2];
        if !caps[1].is_empty() {
            return format!("${{{var_name}}}");
        }
        match env.get(var_name) {
            Some(val) if !val.is_empty() => val.clone(),
            _ => {
                missing.get_or_insert_with(|| MissingEnvVarError {
                    var_name: var_name.to_string(),
                    config_path: path.to_string(),
                });
                String::new()
            }
        }
    });

    match missing {
        Some(err) => Err(err),
        None => Ok(substituted.into_owned()),
    }
}

/// All env var names referenced in a value tree, sorted and deduplicated.
pub fn collect_referenced_vars(value: &Value) -> Vec<String> {
    let mut vars = Vec::new();
    collect_vars_recursive(value, &mut vars);
    vars.sort();
    vars.dedup();
    vars
}

fn collect_vars_recursive(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::String(s) => {
            for caps in ENV_VAR_PATTERN.captures_iter(s) {
                if caps[1].is_empty() {
                    out.push(caps[2].to_string());
                }
            }
        }
        Value::Array(arr) => arr.iter().for_each(|v| collect_vars_recursive(v, out)),
        Value::Object(map) => map.values().for_each(|v| collect_vars_recursive(v, out)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn substitutes_token() {
        let v = json!({"api": {"token": "${TELEGRAM_BOT_TOKEN}"}});
        let result = resolve_env_vars_with(&v, &env(&[("TELEGRAM_BOT_TOKEN", "123:abc")])).unwrap();
        assert_eq!(result["api"]["token"], "123:abc");
    }

    #[test]
    fn substitutes_inside_larger_string() {
        let v = json!({"dir": "${HOME_DIR}/logs"});
        let result = resolve_env_vars_with(&v, &env(&[("HOME_DIR", "/srv/bot")])).unwrap();
        assert_eq!(result["dir"], "/srv/bot/logs");
    }

    #[test]
    fn missing_var_names_var_and_path() {
        let v = json!({"api": {"token": "${MISSING_VAR}"}});
        let err = resolve_env_vars_with(&v, &HashMap::new()).unwrap_err().to_string();
        assert!(err.contains("MISSING_VAR"));
        assert!(err.contains("api.token"));
    }

    #[test]
    fn empty_var_counts_as_missing() {
        let v = json!({"key": "${EMPTY}"});
        assert!(resolve_env_vars_with(&v, &env(&[("EMPTY", "")])).is_err());
    }

    #[test]
    fn escaped_reference_is_kept_literally() {
        let v = json!({"key": "$${NOT_A_VAR} and ${REAL}"});
        let result = resolve_env_vars_with(&v, &env(&[("REAL", "x")])).unwrap();
        assert_eq!(result["key"], "${NOT_A_VAR} and x");
    }

    #[test]
    fn non_strings_and_lowercase_pass_through() {
        let v = json!({"n": 5, "flag": true, "s": "${lower}", "list": ["${A}"]});
        let result = resolve_env_vars_with(&v, &env(&[("A", "1")])).unwrap();
        assert_eq!(result, json!({"n": 5, "flag": true, "s": "${lower}", "list": ["1"]}));
    }

    #[test]
    fn collects_referenced_vars_without_escapes() {
        let v = json!({"a": "${FOO}", "b": {"c": "${BAR} $${BAZ}"}, "d": ["${FOO}"]});
        assert_eq!(collect_referenced_vars(&v), vec!["BAR", "FOO"]);
    }
}
