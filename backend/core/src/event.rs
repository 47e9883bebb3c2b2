use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::message::Message;

/// One update as delivered by `getUpdates`.
///
/// The dispatcher never looks inside; consumers pick out what they need.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Update {
    pub update_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Updates are broadcast behind an `Arc` so fan-out does not deep-copy them.
pub type SharedUpdate = Arc<Update>;

impl Update {
    /// Which kind of update this is (`"message"`, `"edited_message"`, ...).
    pub fn kind(&self) -> &str {
        if self.message.is_some() {
            return "message";
        }
        self.extra.keys().next().map(String::as_str).unwrap_or("unknown")
    }
}
