//! Diagnostic consumer that logs every update it sees.

use anyhow::Result;
use async_trait::async_trait;
use pollcast_core::{Consumer, SharedUpdate, Subscription};
use pollcast_logging::{BotEvent, BotEventLogger};
use tracing::{debug, info};

#[derive(Debug, Default)]
pub struct UpdateDumper {
    seen: u64,
}

impl UpdateDumper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seen(&self) -> u64 {
        self.seen
    }
}

#[async_trait]
impl Consumer for UpdateDumper {
    fn name(&self) -> &str {
        "update_dumper"
    }

    // A slow log sink should not hold up the broadcast.
    fn capacity(&self) -> usize {
        64
    }

    async fn run(&mut self, mut subscription: Subscription<SharedUpdate>) -> Result<()> {
        while let Some(update) = subscription.recv().await {
            self.seen += 1;
            BotEventLogger::log_event(
                self.name(),
                BotEvent::UpdateReceived {
                    update_id: update.update_id,
                    kind: update.kind().to_string(),
                },
            );
            let pretty = serde_json::to_string_pretty(update.as_ref())?;
            debug!(update_id = update.update_id, "New update:\n{pretty}");
        }
        info!(seen = self.seen, "Update dumper stopped");
        Ok(())
    }
}
