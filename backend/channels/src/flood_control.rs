//! Flood control: one activity monitor per (chat, sender) pair.
//!
//! When a sender's message rate in a chat crosses the threshold, a single
//! warning is posted to that chat. Nothing more is sent until the rate has
//! dropped back under the threshold and crossed it again.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use pollcast_core::{Consumer, Message, OutgoingMessage, SharedUpdate, Subscription, Transport};
use pollcast_logging::{BotEvent, BotEventLogger};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::activity_monitor::{ActivityMonitor, MonitorError};

/// (chat id, sender id)
pub type MonitorKey = (i64, i64);

/// Monitor configuration applied to every key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FloodPolicy {
    /// Decay period in seconds.
    pub period_secs: f64,
    /// Messages per second above which a sender is flooding.
    pub threshold: f64,
}

impl Default for FloodPolicy {
    fn default() -> Self {
        Self {
            period_secs: 5.0,
            threshold: 0.5,
        }
    }
}

/// Outcome of feeding one message to the monitors.
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub key: MonitorKey,
    pub frequency: f64,
    pub alert: Option<OutgoingMessage>,
}

pub struct FloodControl {
    transport: Arc<dyn Transport>,
    policy: FloodPolicy,
    // Never pruned: one entry per (chat, sender) ever seen.
    monitors: HashMap<MonitorKey, ActivityMonitor>,
}

impl FloodControl {
    /// Fails if the policy would produce an invalid monitor.
    pub fn new(transport: Arc<dyn Transport>, policy: FloodPolicy) -> Result<Self, MonitorError> {
        ActivityMonitor::new(policy.period_secs, policy.threshold)?;
        Ok(Self {
            transport,
            policy,
            monitors: HashMap::new(),
        })
    }

    pub fn policy(&self) -> FloodPolicy {
        self.policy
    }

    pub fn monitor(&self, key: &MonitorKey) -> Option<&ActivityMonitor> {
        self.monitors.get(key)
    }

    pub fn tracked_keys(&self) -> usize {
        self.monitors.len()
    }

    /// Feed one message to its monitor. `Ok(None)` for messages without a
    /// sender or with an unrepresentable date.
    pub fn observe(&mut self, message: &Message) -> Result<Option<Observation>, MonitorError> {
        let (Some(sender), Some(timestamp)) = (&message.from, message.timestamp()) else {
            return Ok(None);
        };
        let key = (message.chat.id, sender.id);

        let policy = self.policy;
        let monitor = match self.monitors.entry(key) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                entry.insert(ActivityMonitor::new(policy.period_secs, policy.threshold)?)
            }
        };

        let new_alert = monitor.update(timestamp, 1.0)?;
        let frequency = monitor.last_frequency();
        let alert = new_alert.then(|| warning_for(message.chat.id, sender.id, &sender.display_name()));

        Ok(Some(Observation {
            key,
            frequency,
            alert,
        }))
    }

    async fn handle(&mut self, message: &Message) {
        let observation = match self.observe(message) {
            Ok(Some(observation)) => observation,
            Ok(None) => return,
            Err(e) => {
                warn!(chat_id = message.chat.id, error = %e, "Skipping message for flood control");
                return;
            }
        };

        let sender = message.from.as_ref().map(|u| u.display_name()).unwrap_or_default();
        debug!(
            chat = message.chat.label(),
            sender = %sender,
            frequency = %format_args!("{:.2}", observation.frequency),
            "Activity updated"
        );

        let Some(alert) = observation.alert else {
            return;
        };
        let (chat_id, user_id) = observation.key;
        info!(chat_id, user_id, frequency = observation.frequency, "Flood detected");
        BotEventLogger::log_event(
            self.name(),
            BotEvent::FloodAlert {
                chat_id,
                user_id,
                frequency: observation.frequency,
            },
        );

        if let Err(e) = self.transport.send_notification(&alert).await {
            error!(chat_id, error = %e, "Failed to send flood warning");
            BotEventLogger::log_event(
                self.name(),
                BotEvent::ConsumerError {
                    consumer: self.name().to_string(),
                    error_msg: e.to_string(),
                },
            );
        }
    }
}

fn warning_for(chat_id: i64, user_id: i64, display_name: &str) -> OutgoingMessage {
    OutgoingMessage::markdown(
        chat_id,
        format!("Hey [{display_name}](tg://user?id={user_id}), you might be writing too fast!"),
    )
}

#[async_trait]
impl Consumer for FloodControl {
    fn name(&self) -> &str {
        "flood_control"
    }

    async fn run(&mut self, mut subscription: Subscription<SharedUpdate>) -> Result<()> {
        info!(
            period_secs = self.policy.period_secs,
            threshold = self.policy.threshold,
            "Flood control started"
        );
        while let Some(update) = subscription.recv().await {
            if let Some(message) = &update.message {
                self.handle(message).await;
            }
        }
        info!(tracked = self.monitors.len(), "Flood control stopped");
        Ok(())
    }
}
