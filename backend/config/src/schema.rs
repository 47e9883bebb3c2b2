//! Pollcast configuration schema.
//!
//! Every field is optional on disk; `defaults::apply_all_defaults` fills in
//! whatever the file leaves out.

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Top-level config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PollcastConfig {
    /// Bot API connection
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api: Option<ApiConfig>,

    /// Per-sender message rate limiting
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flood_control: Option<FloodControlConfig>,

    /// Persistent runtime state
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<StateConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// File holding the token, read when `token` is not set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_file: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Long-poll timeout for `getUpdates`; 0 means short polling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FloodControlConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub period_secs: Option<f64>,

    /// Messages per second.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threshold: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StateConfig {
    /// Where the last processed update id is kept.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor_path: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,

    /// Directory for rolling JSON log files. Empty string disables file logs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_partial_document() {
        let cfg: PollcastConfig = serde_json::from_value(json!({
            "api": {"token": "abc"},
            "flood_control": {"threshold": 1.5}
        }))
        .unwrap();
        assert_eq!(cfg.api.unwrap().token.as_deref(), Some("abc"));
        assert_eq!(cfg.flood_control.unwrap().period_secs, None);
        assert!(cfg.state.is_none());
    }

    #[test]
    fn unset_fields_are_not_serialized() {
        let cfg = PollcastConfig {
            logging: Some(LoggingConfig {
                level: Some("debug".into()),
                dir: None,
            }),
            ..Default::default()
        };
        assert_eq!(serde_json::to_value(&cfg).unwrap(), json!({"logging": {"level": "debug"}}));
    }
}
