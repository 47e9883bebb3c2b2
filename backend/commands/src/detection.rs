/// Command detection: find the `/command` entity in an inbound message.
use pollcast_core::Message;

use crate::types::CommandInvocation;

/// The message's first command entity, if any.
///
/// Only the first `bot_command` entity is considered; later ones are never
/// looked at, whether or not the first one is registered.
pub fn detect_command(message: &Message) -> Option<CommandInvocation> {
    let entity = message.first_command()?;
    let command = message.entity_text(entity)?;

    let text = message.text.as_deref().unwrap_or_default();
    let consumed = entity.offset + entity.length;
    let raw_args = tail_after_utf16(text, consumed);

    Some(CommandInvocation {
        command,
        raw_args: raw_args.trim().to_string(),
    })
}

/// Text after the first `units` UTF-16 code units.
fn tail_after_utf16(text: &str, units: usize) -> String {
    let mut seen = 0;
    for (byte_idx, ch) in text.char_indices() {
        if seen >= units {
            return text[byte_idx..].to_string();
        }
        seen += ch.len_utf16();
    }
    String::new()
}
