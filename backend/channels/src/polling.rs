//! Long-poll fetch loop: the single producer feeding the dispatcher.
//!
//! There is no retry here. A transport failure ends the loop with
//! an error and the process exits; restarting is left to whatever supervises
//! the process, and the persisted cursor makes the restart pick up where the
//! last run stopped.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use pollcast_config::defaults::DEFAULT_POLL_TIMEOUT_SECS;
use pollcast_core::{Inlet, SharedUpdate, Transport};
use tracing::{debug, info};

use crate::cursor::CursorStore;

/// Default long-poll timeout passed to `getUpdates`.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(DEFAULT_POLL_TIMEOUT_SECS);

pub struct FetchLoop {
    transport: Arc<dyn Transport>,
    cursor: CursorStore,
    poll_timeout: Duration,
}

impl FetchLoop {
    pub fn new(transport: Arc<dyn Transport>, cursor: CursorStore) -> Self {
        Self {
            transport,
            cursor,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }

    pub fn with_poll_timeout(mut self, timeout: Duration) -> Self {
        self.poll_timeout = timeout;
        self
    }

    /// Poll forever, submitting every update in order and persisting the
    /// cursor after each one. Only returns on failure.
    pub async fn run(&self, inlet: Inlet<SharedUpdate>) -> Result<()> {
        let mut last_update_id = self.cursor.load().await;
        info!(
            transport = self.transport.name(),
            cursor = ?last_update_id,
            timeout_secs = self.poll_timeout.as_secs(),
            "Fetch loop started"
        );

        loop {
            let updates = self
                .transport
                .fetch_updates(last_update_id, self.poll_timeout)
                .await
                .with_context(|| format!("Fetching updates from {} failed", self.transport.name()))?;
            debug!(count = updates.len(), "Fetched updates");

            for update in updates {
                let update_id = update.update_id;
                inlet
                    .submit(Arc::new(update))
                    .await
                    .context("Dispatcher stopped accepting updates")?;
                self.cursor.store(update_id).await?;
                last_update_id = Some(update_id);
            }
        }
    }
}
