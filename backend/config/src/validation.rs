//! Config validation with field paths in every message.

use crate::schema::PollcastConfig;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

/// Validate a defaulted config and report every problem found.
pub fn validate(config: &PollcastConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_api(config, &mut report);
    validate_flood_control(config, &mut report);
    validate_state(config, &mut report);
    report
}

fn validate_api(config: &PollcastConfig, report: &mut ValidationReport) {
    let api = config.api.as_ref();
    let token = api.and_then(|a| a.token.as_deref()).unwrap_or("");
    if token.trim().is_empty() {
        report.error("api.token", "Telegram bot token is required");
    }
    if let Some(url) = api.and_then(|a| a.base_url.as_deref()) {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            report.error("api.base_url", format!("'{url}' is not an http(s) URL"));
        }
    }
    if api.and_then(|a| a.poll_timeout_secs) == Some(0) {
        report.warn(
            "api.poll_timeout_secs",
            "Timeout 0 means short polling; the bot will query the API continuously",
        );
    }
}

fn validate_flood_control(config: &PollcastConfig, report: &mut ValidationReport) {
    let Some(flood) = &config.flood_control else { return };
    if let Some(period) = flood.period_secs {
        if !(period.is_finite() && period > 0.0) {
            report.error("flood_control.period_secs", "period_secs must be > 0");
        }
    }
    if let Some(threshold) = flood.threshold {
        if !(threshold.is_finite() && threshold > 0.0) {
            report.error("flood_control.threshold", "threshold must be > 0");
        }
    }
}

fn validate_state(config: &PollcastConfig, report: &mut ValidationReport) {
    let Some(state) = &config.state else { return };
    if state.cursor_path.as_deref().is_some_and(|p| p.trim().is_empty()) {
        report.error("state.cursor_path", "cursor_path cannot be empty");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::defaults::apply_all_defaults;
    use crate::schema::{ApiConfig, FloodControlConfig};

    fn with_token() -> PollcastConfig {
        apply_all_defaults(PollcastConfig {
            api: Some(ApiConfig {
                token: Some("123:abc".into()),
                ..Default::default()
            }),
            ..Default::default()
        })
    }

    #[test]
    fn defaulted_config_with_token_is_valid() {
        let report = validate(&with_token());
        assert!(report.is_valid(), "errors: {:?}", report.errors);
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn missing_token_is_error() {
        let report = validate(&apply_all_defaults(PollcastConfig::default()));
        assert!(!report.is_valid());
        assert_eq!(report.errors[0].path, "api.token");
    }

    #[test]
    fn non_positive_flood_settings_are_errors() {
        let mut cfg = with_token();
        cfg.flood_control = Some(FloodControlConfig {
            period_secs: Some(0.0),
            threshold: Some(-1.0),
        });
        let paths: Vec<_> = validate(&cfg).errors.into_iter().map(|e| e.path).collect();
        assert_eq!(paths, vec!["flood_control.period_secs", "flood_control.threshold"]);
    }

    #[test]
    fn zero_poll_timeout_is_warning() {
        let mut cfg = with_token();
        if let Some(api) = cfg.api.as_mut() {
            api.poll_timeout_secs = Some(0);
        }
        let report = validate(&cfg);
        assert!(report.is_valid());
        assert_eq!(report.warnings[0].path, "api.poll_timeout_secs");
    }
}
