//! Config file location and parsing.

use anyhow::{Context, Result, bail};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Config file used when neither `--config` nor the env var is given.
pub const DEFAULT_CONFIG_FILE: &str = "pollcast.toml";

/// Env var naming the config file.
pub const CONFIG_ENV_VAR: &str = "POLLCAST_CONFIG";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Toml,
    Yaml,
}

impl ConfigFormat {
    /// `.yaml`/`.yml` are YAML, anything else is TOML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("yaml") || ext.eq_ignore_ascii_case("yml") => {
                Self::Yaml
            }
            _ => Self::Toml,
        }
    }
}

/// Resolve the config file path.
/// Priority: explicit path > `POLLCAST_CONFIG` > `pollcast.toml`
pub fn config_file_path(explicit: Option<&Path>) -> PathBuf {
    if let Some(path) = explicit {
        return path.to_path_buf();
    }
    match std::env::var(CONFIG_ENV_VAR) {
        Ok(path) if !path.is_empty() => PathBuf::from(path),
        _ => PathBuf::from(DEFAULT_CONFIG_FILE),
    }
}

/// Parse config text into a JSON value tree.
pub fn parse_document(raw: &str, format: ConfigFormat) -> Result<Value> {
    let value: Value = match format {
        ConfigFormat::Toml => toml::from_str(raw).context("Invalid TOML")?,
        ConfigFormat::Yaml => serde_yaml::from_str(raw).context("Invalid YAML")?,
    };
    match value {
        Value::Object(_) => Ok(value),
        // An empty YAML file parses as null.
        Value::Null => Ok(Value::Object(Default::default())),
        other => bail!("Config root must be a table, got {}", type_name(&other)),
    }
}

/// Read and parse the config file.
///
/// A missing file yields an empty document (every value defaulted).
pub async fn read_document(path: &Path) -> Result<Value> {
    if !fs::try_exists(path).await.unwrap_or(false) {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(Value::Object(Default::default()));
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let document = parse_document(&raw, ConfigFormat::from_path(path))
        .with_context(|| format!("Failed to parse config at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(document)
}

/// Read a token file, trimming surrounding whitespace.
pub async fn read_token_file(path: &Path) -> Result<String> {
    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read token file: {}", path.display()))?;
    Ok(raw.trim().to_string())
}

/// RFC 7396 JSON Merge Patch.
pub fn json_merge_patch(target: &mut Value, patch: &Value) {
    let Value::Object(patch_map) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Default::default());
    }
    if let Value::Object(target_map) = target {
        for (key, patch_val) in patch_map {
            if patch_val.is_null() {
                target_map.remove(key);
            } else {
                let entry = target_map.entry(key.clone()).or_insert(Value::Null);
                json_merge_patch(entry, patch_val);
            }
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "a table",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn format_from_extension() {
        assert_eq!(ConfigFormat::from_path(Path::new("bot.yaml")), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("bot.YML")), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::from_path(Path::new("pollcast.toml")), ConfigFormat::Toml);
        assert_eq!(ConfigFormat::from_path(Path::new("noext")), ConfigFormat::Toml);
    }

    #[test]
    fn explicit_path_wins() {
        assert_eq!(
            config_file_path(Some(Path::new("/etc/bot.toml"))),
            PathBuf::from("/etc/bot.toml")
        );
    }

    #[test]
    fn parses_toml_and_yaml_alike() {
        let toml = parse_document(
            "[api]\ntoken = \"t\"\n[flood_control]\nperiod_secs = 5.0\n",
            ConfigFormat::Toml,
        )
        .unwrap();
        let yaml = parse_document(
            "api:\n  token: t\nflood_control:\n  period_secs: 5.0\n",
            ConfigFormat::Yaml,
        )
        .unwrap();
        assert_eq!(toml, yaml);
        assert_eq!(toml, json!({"api": {"token": "t"}, "flood_control": {"period_secs": 5.0}}));
    }

    #[test]
    fn empty_yaml_is_empty_document() {
        assert_eq!(parse_document("", ConfigFormat::Yaml).unwrap(), json!({}));
    }

    #[test]
    fn non_table_root_is_error() {
        let err = parse_document("- 1\n- 2\n", ConfigFormat::Yaml).unwrap_err();
        assert!(err.to_string().contains("an array"));
    }

    #[tokio::test]
    async fn missing_file_is_empty_document() {
        let dir = tempfile::tempdir().unwrap();
        let doc = read_document(&dir.path().join("absent.toml")).await.unwrap();
        assert_eq!(doc, json!({}));
    }

    #[tokio::test]
    async fn token_file_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tgtoken");
        fs::write(&path, "123:abc\n").await.unwrap();
        assert_eq!(read_token_file(&path).await.unwrap(), "123:abc");
    }

    #[test]
    fn merge_patch_overlays_and_removes() {
        let mut target = json!({"api": {"token": "t", "extra": 1}, "custom": {"x": true}});
        json_merge_patch(&mut target, &json!({"api": {"base_url": "u", "extra": null}}));
        assert_eq!(
            target,
            json!({"api": {"token": "t", "base_url": "u"}, "custom": {"x": true}})
        );
    }
}
