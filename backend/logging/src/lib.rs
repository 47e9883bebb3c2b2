//! Telemetry and structured logging for Pollcast.
//!
//! Handles log redaction, console plus rolling JSON file output, and
//! structured bot event logging.

pub mod event_logger;
pub mod logger;
pub mod redact;

pub use event_logger::{BotEvent, BotEventLogger, EventLogEntry};
pub use logger::init_logger;
pub use redact::redact_sensitive_data;
