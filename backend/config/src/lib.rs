//! `pollcast-config` — configuration loading for the Pollcast bot runtime.
//!
//! Provides:
//! - Typed config schema
//! - TOML/YAML loading chosen by file extension
//! - `${ENV_VAR}` substitution
//! - Default value application and validation
//! - Dotted-path lookup and redaction for display

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod settings;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{MissingEnvVarError, collect_referenced_vars, resolve_env_vars_with};
pub use io::{CONFIG_ENV_VAR, ConfigFormat, DEFAULT_CONFIG_FILE, config_file_path, read_document};
pub use redact::{collect_redacted_paths, redact};
pub use schema::PollcastConfig;
pub use settings::{ConfigError, Settings};
pub use validation::{ConfigValidationError, ValidationReport, validate};

use anyhow::{Context, Result, bail};
use std::collections::HashMap;
use std::path::Path;

/// Load a config file, substitute env vars, apply defaults and validate.
///
/// Validation errors abort loading; warnings are logged.
pub async fn load_and_prepare(path: &Path) -> Result<Settings> {
    load_and_prepare_with(path, &std::env::vars().collect()).await
}

/// Like [`load_and_prepare`] with an explicit environment.
pub async fn load_and_prepare_with(path: &Path, env: &HashMap<String, String>) -> Result<Settings> {
    let raw = read_document(path).await?;
    let document = resolve_env_vars_with(&raw, env).context("Failed to resolve env vars in config")?;

    let config: PollcastConfig = serde_json::from_value(document.clone())
        .with_context(|| format!("Invalid config at: {}", path.display()))?;
    let mut config = apply_all_defaults(config);

    if let Some(api) = config.api.as_mut() {
        if api.token.as_deref().map_or(true, str::is_empty) {
            if let Some(token_file) = api.token_file.as_deref() {
                api.token = Some(io::read_token_file(Path::new(token_file)).await?);
            }
        }
    }

    let report = validate(&config);
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    if !report.is_valid() {
        for error in &report.errors {
            tracing::error!(path = %error.path, message = %error.message, "Config error");
        }
        let messages: Vec<String> = report.errors.iter().map(ToString::to_string).collect();
        bail!("Invalid config at {}:\n{}", path.display(), messages.join("\n"));
    }

    // Overlay the typed, defaulted values so lookups see defaults too.
    let mut merged = document;
    let typed = serde_json::to_value(&config).context("Failed to serialize prepared config")?;
    io::json_merge_patch(&mut merged, &typed);

    Ok(Settings::new(config, merged))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    async fn write(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        tokio::fs::write(&path, contents).await.unwrap();
        path
    }

    #[tokio::test]
    async fn loads_toml_with_env_and_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(
            &dir,
            "pollcast.toml",
            r#"
[api]
token = "${TELEGRAM_BOT_TOKEN}"

[flood_control]
threshold = 1.0

[custom]
owner = "ann"
"#,
        )
        .await;

        let settings = load_and_prepare_with(&path, &env(&[("TELEGRAM_BOT_TOKEN", "123:abc")]))
            .await
            .unwrap();

        assert_eq!(settings.token(), "123:abc");
        assert_eq!(settings.flood_threshold(), 1.0);
        assert_eq!(settings.flood_period_secs(), 5.0);
        assert_eq!(settings.lookup_f64("flood_control.period_secs").unwrap(), 5.0);
        assert_eq!(settings.lookup_str("custom.owner").unwrap(), "ann");
        assert_eq!(settings.lookup_str("state.cursor_path").unwrap(), "last_update_id");
    }

    #[tokio::test]
    async fn loads_yaml_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "bot.yaml", "api:\n  token: \"123:abc\"\n  poll_timeout_secs: 5\n").await;
        let settings = load_and_prepare_with(&path, &HashMap::new()).await.unwrap();
        assert_eq!(settings.poll_timeout().as_secs(), 5);
    }

    #[tokio::test]
    async fn token_file_fills_missing_token() {
        let dir = tempfile::tempdir().unwrap();
        let token_path = write(&dir, "tgtoken", "999:xyz\n").await;
        let config = format!("[api]\ntoken_file = {:?}\n", token_path.display().to_string());
        let path = write(&dir, "pollcast.toml", &config).await;

        let settings = load_and_prepare_with(&path, &HashMap::new()).await.unwrap();
        assert_eq!(settings.token(), "999:xyz");
    }

    #[tokio::test]
    async fn validation_errors_abort_loading() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "pollcast.toml", "[flood_control]\nperiod_secs = 0.0\n").await;
        let err = load_and_prepare_with(&path, &HashMap::new()).await.unwrap_err();
        let msg = format!("{err:#}");
        assert!(msg.contains("api.token"));
        assert!(msg.contains("flood_control.period_secs"));
    }

    #[tokio::test]
    async fn missing_env_var_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "pollcast.toml", "[api]\ntoken = \"${NOPE_TOKEN}\"\n").await;
        let err = load_and_prepare_with(&path, &HashMap::new()).await.unwrap_err();
        assert!(format!("{err:#}").contains("NOPE_TOKEN"));
    }

    #[tokio::test]
    async fn malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "pollcast.toml", "[api\ntoken=").await;
        assert!(load_and_prepare_with(&path, &HashMap::new()).await.is_err());
    }
}
