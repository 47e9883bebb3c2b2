//! Bot Event Logger
//!
//! Structured events (update received, command dispatched, flood alert,
//! consumer error) emitted at the `bot_events` target so the JSON file layer
//! can be filtered down to them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::info;

use crate::redact::redact_sensitive_data;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BotEvent {
    UpdateReceived {
        update_id: i64,
        kind: String,
    },
    CommandDispatched {
        command: String,
        chat_id: i64,
    },
    FloodAlert {
        chat_id: i64,
        user_id: i64,
        frequency: f64,
    },
    ConsumerError {
        consumer: String,
        error_msg: String,
    },
}

#[derive(Debug, Serialize)]
pub struct EventLogEntry {
    pub source: String,
    pub timestamp: DateTime<Utc>,
    pub event: BotEvent,
}

impl EventLogEntry {
    pub fn new(source: &str, mut event: BotEvent) -> Self {
        if let BotEvent::ConsumerError { error_msg, .. } = &mut event {
            *error_msg = redact_sensitive_data(error_msg);
        }
        Self {
            source: source.into(),
            timestamp: Utc::now(),
            event,
        }
    }
}

pub struct BotEventLogger;

impl BotEventLogger {
    /// Logs a runtime event, redacting free-form error text first.
    pub fn log_event(source: &str, event: BotEvent) {
        let entry = EventLogEntry::new(source, event);
        let json = serde_json::to_string(&entry).unwrap_or_else(|_| format!("{entry:?}"));
        info!(target: "bot_events", event = %json, "Bot event");
    }
}
