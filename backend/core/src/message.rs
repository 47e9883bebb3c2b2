use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Entity type Telegram uses for `/command` spans.
pub const BOT_COMMAND: &str = "bot_command";

/// A chat message carried inside an update.
///
/// Only the fields the runtime reads are typed; everything else is kept in
/// `extra` so the record can be logged back out unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub message_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<User>,
    pub chat: Chat,
    /// Unix time in seconds.
    pub date: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<MessageEntity>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Message {
    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.date, 0)
    }

    /// Text covered by `entity`. Offsets count UTF-16 code units.
    pub fn entity_text(&self, entity: &MessageEntity) -> Option<String> {
        let text = self.text.as_deref()?;
        let units: Vec<u16> = text.encode_utf16().collect();
        let end = entity.offset.checked_add(entity.length)?;
        let span = units.get(entity.offset..end)?;
        String::from_utf16(span).ok()
    }

    /// The first `/command` entity, if any.
    pub fn first_command(&self) -> Option<&MessageEntity> {
        self.entities.iter().find(|e| e.is_bot_command())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl User {
    /// `@username` when the user has one, otherwise the first name.
    pub fn display_name(&self) -> String {
        match &self.username {
            Some(username) => format!("@{username}"),
            None => self.first_name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Chat {
    pub fn label(&self) -> &str {
        self.title.as_deref().unwrap_or("private")
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageEntity {
    #[serde(rename = "type")]
    pub kind: String,
    pub offset: usize,
    pub length: usize,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MessageEntity {
    pub fn is_bot_command(&self) -> bool {
        self.kind == BOT_COMMAND
    }
}

/// Payload of an outbound `sendMessage` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutgoingMessage {
    pub chat_id: i64,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_mode: Option<String>,
}

impl OutgoingMessage {
    pub fn plain(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            parse_mode: None,
        }
    }

    pub fn markdown(chat_id: i64, text: impl Into<String>) -> Self {
        Self {
            chat_id,
            text: text.into(),
            parse_mode: Some("Markdown".into()),
        }
    }
}
