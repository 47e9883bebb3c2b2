/// Command dispatch: route detected commands to their handlers.
use std::any::Any;
use std::collections::HashMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use futures::FutureExt;
use pollcast_core::{Consumer, Message, OutgoingMessage, SharedUpdate, Subscription, Transport};
use pollcast_logging::{BotEvent, BotEventLogger};
use tracing::{debug, error, info};

use crate::detection::detect_command;
use crate::registry::{CommandRegistry, validate_command};
use crate::types::{CommandDef, CommandError, CommandInvocation};

// ---------------------------------------------------------------------------
// Handler trait
// ---------------------------------------------------------------------------

/// Context passed to every command handler.
pub struct CommandContext<'a> {
    pub message: &'a Message,
    pub registry: &'a CommandRegistry,
}

impl CommandContext<'_> {
    pub fn chat_id(&self) -> i64 {
        self.message.chat.id
    }

    pub fn sender_id(&self) -> Option<i64> {
        self.message.from.as_ref().map(|u| u.id)
    }
}

/// The reply a handler wants posted back to the chat.
#[derive(Debug, Clone, PartialEq)]
pub struct CommandResponse {
    pub text: String,
    pub markdown: bool,
}

impl CommandResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markdown: false,
        }
    }

    pub fn markdown(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            markdown: true,
        }
    }

    fn into_message(self, chat_id: i64) -> OutgoingMessage {
        if self.markdown {
            OutgoingMessage::markdown(chat_id, self.text)
        } else {
            OutgoingMessage::plain(chat_id, self.text)
        }
    }
}

#[async_trait]
pub trait CommandHandler: Send + Sync {
    /// Handle one invocation. `Ok(None)` means "nothing to reply".
    async fn handle(
        &self,
        ctx: &CommandContext<'_>,
        invocation: &CommandInvocation,
    ) -> Result<Option<CommandResponse>>;
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

/// Scans inbound messages for a command and runs its handler.
pub struct CommandRouter {
    transport: Arc<dyn Transport>,
    registry: CommandRegistry,
    handlers: HashMap<String, Arc<dyn CommandHandler>>,
}

impl CommandRouter {
    pub fn new(transport: Arc<dyn Transport>) -> Self {
        Self {
            transport,
            registry: CommandRegistry::new(),
            handlers: HashMap::new(),
        }
    }

    /// Register `handler` for the exact command text `command` (e.g. "/help").
    pub fn register(
        &mut self,
        command: &str,
        description: &str,
        handler: Arc<dyn CommandHandler>,
    ) -> Result<(), CommandError> {
        validate_command(command)?;
        self.registry.register(CommandDef {
            command: command.to_string(),
            description: description.to_string(),
        })?;
        self.handlers.insert(command.to_string(), handler);
        debug!(command, "Command registered");
        Ok(())
    }

    pub fn registry(&self) -> &CommandRegistry {
        &self.registry
    }

    /// Dispatch the message's command, if it has a registered one.
    ///
    /// Returns the command that ran. Handler errors, handler panics and reply
    /// failures are logged here and never returned.
    pub async fn route(&self, message: &Message) -> Option<String> {
        let invocation = detect_command(message)?;
        let Some(handler) = self.handlers.get(&invocation.command) else {
            debug!(command = %invocation.command, "Ignoring unregistered command");
            return None;
        };

        let chat_id = message.chat.id;
        info!(command = %invocation.command, chat_id, "Dispatching command");
        BotEventLogger::log_event(
            self.name(),
            BotEvent::CommandDispatched {
                command: invocation.command.clone(),
                chat_id,
            },
        );

        let ctx = CommandContext {
            message,
            registry: &self.registry,
        };
        let outcome = AssertUnwindSafe(handler.handle(&ctx, &invocation))
            .catch_unwind()
            .await;
        match outcome {
            Ok(Ok(Some(response))) => {
                let reply = response.into_message(chat_id);
                if let Err(e) = self.transport.send_notification(&reply).await {
                    self.report(&invocation.command, &e.to_string());
                }
            }
            Ok(Ok(None)) => {}
            Ok(Err(e)) => self.report(&invocation.command, &format!("{e:#}")),
            Err(panic) => self.report(
                &invocation.command,
                &format!("handler panicked: {}", panic_message(panic.as_ref())),
            ),
        }

        Some(invocation.command)
    }

    fn report(&self, command: &str, error_msg: &str) {
        error!(command, error = %error_msg, "Command handler failed");
        BotEventLogger::log_event(
            self.name(),
            BotEvent::ConsumerError {
                consumer: self.name().to_string(),
                error_msg: error_msg.to_string(),
            },
        );
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg
    } else {
        "non-string panic payload"
    }
}

#[async_trait]
impl Consumer for CommandRouter {
    fn name(&self) -> &str {
        "command_router"
    }

    async fn run(&mut self, mut subscription: Subscription<SharedUpdate>) -> Result<()> {
        info!(commands = self.registry.all().len(), "Command router started");
        while let Some(update) = subscription.recv().await {
            if let Some(message) = &update.message {
                self.route(message).await;
            }
        }
        info!("Command router stopped");
        Ok(())
    }
}
