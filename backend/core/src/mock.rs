use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;

use crate::error::TransportError;
use crate::event::Update;
use crate::message::OutgoingMessage;
use crate::traits::Transport;

/// An in-memory transport that replays scripted `getUpdates` batches and
/// records everything sent through it.
///
/// Once the script runs out, `fetch_updates` fails with a network error.
#[derive(Default)]
pub struct MockTransport {
    batches: Mutex<VecDeque<Result<Vec<Update>, TransportError>>>,
    fetches: Mutex<Vec<Option<i64>>>,
    sent: Mutex<Vec<OutgoingMessage>>,
    fail_sends: bool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_batch(self, batch: Vec<Update>) -> Self {
        self.push(Ok(batch));
        self
    }

    pub fn with_error(self, error: TransportError) -> Self {
        self.push(Err(error));
        self
    }

    /// Every `send_notification` call fails with an API error.
    pub fn failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    /// The `since` argument of every fetch so far.
    pub fn fetches(&self) -> Vec<Option<i64>> {
        self.fetches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Every message passed to `send_notification`, including failed ones.
    pub fn sent(&self) -> Vec<OutgoingMessage> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn push(&self, batch: Result<Vec<Update>, TransportError>) {
        self.batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(batch);
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn name(&self) -> &str {
        "mock"
    }

    async fn fetch_updates(
        &self,
        since: Option<i64>,
        _timeout: Duration,
    ) -> Result<Vec<Update>, TransportError> {
        self.fetches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(since);
        let next = self
            .batches
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        next.unwrap_or_else(|| {
            Err(TransportError::Network {
                method: "getUpdates".into(),
                message: "mock script exhausted".into(),
            })
        })
    }

    async fn send_notification(&self, message: &OutgoingMessage) -> Result<(), TransportError> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(message.clone());
        if self.fail_sends {
            return Err(TransportError::Api {
                method: "sendMessage".into(),
                description: "Forbidden: bot was blocked by the user".into(),
                http_code: 403,
                error_code: Some(403),
                parameters: None,
            });
        }
        Ok(())
    }
}
