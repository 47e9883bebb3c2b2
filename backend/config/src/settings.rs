//! Loaded settings: typed accessors plus dotted-path lookup.

use serde_json::Value;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::defaults::{
    DEFAULT_BASE_URL, DEFAULT_CURSOR_PATH, DEFAULT_FLOOD_PERIOD_SECS, DEFAULT_FLOOD_THRESHOLD,
    DEFAULT_LOG_LEVEL, DEFAULT_POLL_TIMEOUT_SECS,
};
use crate::redact::redact;
use crate::schema::PollcastConfig;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Config has no value at path '{path}'")]
    MissingKey { path: String },

    #[error("Config value at path '{path}' is not {expected}")]
    WrongType { path: String, expected: &'static str },
}

/// A fully prepared configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    config: PollcastConfig,
    // Substituted document with defaults overlaid; keeps keys the schema
    // does not know about.
    document: Value,
}

impl Settings {
    pub fn new(config: PollcastConfig, document: Value) -> Self {
        Self { config, document }
    }

    pub fn config(&self) -> &PollcastConfig {
        &self.config
    }

    pub fn document(&self) -> &Value {
        &self.document
    }

    /// Document with secrets masked, for display.
    pub fn redacted(&self) -> Value {
        redact(&self.document)
    }

    /// Look up a dotted path such as `"api.token"`.
    pub fn lookup(&self, path: &str) -> Result<&Value, ConfigError> {
        path.split('.')
            .try_fold(&self.document, |node, key| node.get(key))
            .ok_or_else(|| ConfigError::MissingKey {
                path: path.to_string(),
            })
    }

    pub fn lookup_str(&self, path: &str) -> Result<&str, ConfigError> {
        self.lookup(path)?.as_str().ok_or(ConfigError::WrongType {
            path: path.to_string(),
            expected: "a string",
        })
    }

    pub fn lookup_f64(&self, path: &str) -> Result<f64, ConfigError> {
        self.lookup(path)?.as_f64().ok_or(ConfigError::WrongType {
            path: path.to_string(),
            expected: "a number",
        })
    }

    // -- typed accessors ---------------------------------------------------

    pub fn token(&self) -> &str {
        self.config
            .api
            .as_ref()
            .and_then(|a| a.token.as_deref())
            .unwrap_or_default()
    }

    pub fn base_url(&self) -> &str {
        self.config
            .api
            .as_ref()
            .and_then(|a| a.base_url.as_deref())
            .unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn poll_timeout(&self) -> Duration {
        let secs = self
            .config
            .api
            .as_ref()
            .and_then(|a| a.poll_timeout_secs)
            .unwrap_or(DEFAULT_POLL_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    pub fn flood_period_secs(&self) -> f64 {
        self.config
            .flood_control
            .as_ref()
            .and_then(|f| f.period_secs)
            .unwrap_or(DEFAULT_FLOOD_PERIOD_SECS)
    }

    pub fn flood_threshold(&self) -> f64 {
        self.config
            .flood_control
            .as_ref()
            .and_then(|f| f.threshold)
            .unwrap_or(DEFAULT_FLOOD_THRESHOLD)
    }

    pub fn cursor_path(&self) -> PathBuf {
        PathBuf::from(
            self.config
                .state
                .as_ref()
                .and_then(|s| s.cursor_path.as_deref())
                .unwrap_or(DEFAULT_CURSOR_PATH),
        )
    }

    pub fn log_level(&self) -> &str {
        self.config
            .logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or(DEFAULT_LOG_LEVEL)
    }

    /// `None` when file logging is disabled (empty `logging.dir`).
    pub fn log_dir(&self) -> Option<PathBuf> {
        self.config
            .logging
            .as_ref()
            .and_then(|l| l.dir.as_deref())
            .filter(|d| !d.is_empty())
            .map(PathBuf::from)
    }
}
