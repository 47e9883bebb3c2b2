/// Built-in command handlers.
use anyhow::Result;
use async_trait::async_trait;
use tracing::debug;

use crate::dispatch::{CommandContext, CommandHandler, CommandResponse};
use crate::types::CommandInvocation;

pub const HELP_GREETING: &str = "I'm just a testing bot but I'm willing to help";

// ---------------------------------------------------------------------------
// /help
// ---------------------------------------------------------------------------

pub struct HelpHandler;

#[async_trait]
impl CommandHandler for HelpHandler {
    async fn handle(
        &self,
        ctx: &CommandContext<'_>,
        _inv: &CommandInvocation,
    ) -> Result<Option<CommandResponse>> {
        debug!(chat_id = ctx.chat_id(), sender = ?ctx.sender_id(), "Answering /help");
        let mut lines = vec![HELP_GREETING.to_string()];
        for cmd in ctx.registry.all() {
            lines.push(format!("{} - {}", cmd.command, cmd.description));
        }
        Ok(Some(CommandResponse::markdown(lines.join("\n"))))
    }
}
