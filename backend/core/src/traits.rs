use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use crate::dispatcher::Subscription;
use crate::error::TransportError;
use crate::event::{SharedUpdate, Update};
use crate::message::OutgoingMessage;

/// The messaging platform as seen by the runtime.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Human-readable transport name for logging.
    fn name(&self) -> &str;

    /// Long-poll for updates with an id greater than `since`.
    /// Blocks server-side for up to `timeout` when nothing is pending.
    async fn fetch_updates(
        &self,
        since: Option<i64>,
        timeout: Duration,
    ) -> Result<Vec<Update>, TransportError>;

    /// Deliver a message to a chat.
    async fn send_notification(&self, message: &OutgoingMessage) -> Result<(), TransportError>;
}

/// An in-process consumer of the update broadcast.
///
/// Each consumer runs in its own task and returns once its subscription
/// reaches end-of-stream.
#[async_trait]
pub trait Consumer: Send + 'static {
    /// Human-readable name of this consumer.
    fn name(&self) -> &str;

    /// Outlet capacity to request from the dispatcher.
    fn capacity(&self) -> usize {
        0
    }

    /// Process updates until the subscription ends.
    async fn run(&mut self, subscription: Subscription<SharedUpdate>) -> Result<()>;
}
