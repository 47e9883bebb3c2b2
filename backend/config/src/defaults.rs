//! Config defaults: fills in values the config file leaves out.

use crate::schema::{ApiConfig, FloodControlConfig, LoggingConfig, PollcastConfig, StateConfig};

pub const DEFAULT_BASE_URL: &str = "https://api.telegram.org";

pub const DEFAULT_POLL_TIMEOUT_SECS: u64 = 60;

/// Decay period of the flood monitor (seconds).
pub const DEFAULT_FLOOD_PERIOD_SECS: f64 = 5.0;

/// Flood threshold (messages per second).
pub const DEFAULT_FLOOD_THRESHOLD: f64 = 0.5;

pub const DEFAULT_CURSOR_PATH: &str = "last_update_id";

pub const DEFAULT_LOG_LEVEL: &str = "info";

pub const DEFAULT_LOG_DIR: &str = "logs";

/// Apply all defaults to a freshly loaded config.
pub fn apply_all_defaults(config: PollcastConfig) -> PollcastConfig {
    let config = apply_api_defaults(config);
    let config = apply_flood_control_defaults(config);
    let config = apply_state_defaults(config);
    apply_logging_defaults(config)
}

fn apply_api_defaults(mut config: PollcastConfig) -> PollcastConfig {
    let api = config.api.get_or_insert_with(ApiConfig::default);
    if api.base_url.is_none() {
        api.base_url = Some(DEFAULT_BASE_URL.to_string());
    }
    if api.poll_timeout_secs.is_none() {
        api.poll_timeout_secs = Some(DEFAULT_POLL_TIMEOUT_SECS);
    }
    config
}

fn apply_flood_control_defaults(mut config: PollcastConfig) -> PollcastConfig {
    let flood = config
        .flood_control
        .get_or_insert_with(FloodControlConfig::default);
    flood.period_secs.get_or_insert(DEFAULT_FLOOD_PERIOD_SECS);
    flood.threshold.get_or_insert(DEFAULT_FLOOD_THRESHOLD);
    config
}

fn apply_state_defaults(mut config: PollcastConfig) -> PollcastConfig {
    let state = config.state.get_or_insert_with(StateConfig::default);
    if state.cursor_path.is_none() {
        state.cursor_path = Some(DEFAULT_CURSOR_PATH.to_string());
    }
    config
}

fn apply_logging_defaults(mut config: PollcastConfig) -> PollcastConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    if logging.level.is_none() {
        logging.level = Some(DEFAULT_LOG_LEVEL.to_string());
    }
    if logging.dir.is_none() {
        logging.dir = Some(DEFAULT_LOG_DIR.to_string());
    }
    config
}
