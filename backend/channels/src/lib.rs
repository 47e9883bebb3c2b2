//! Telegram transport, the long-poll producer, and the built-in consumers.

pub mod activity_monitor;
pub mod cursor;
pub mod dumper;
pub mod flood_control;
pub mod polling;
pub mod telegram;

pub use activity_monitor::{ActivityMonitor, MonitorError};
pub use cursor::CursorStore;
pub use dumper::UpdateDumper;
pub use flood_control::{FloodControl, FloodPolicy, MonitorKey, Observation};
pub use polling::{DEFAULT_POLL_TIMEOUT, FetchLoop};
pub use telegram::TelegramBotApi;
