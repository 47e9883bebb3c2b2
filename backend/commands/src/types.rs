/// Slash command types.
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Every command starts with this character.
pub const COMMAND_PREFIX: char = '/';

// ---------------------------------------------------------------------------
// Command definition
// ---------------------------------------------------------------------------

/// A registered command as shown in `/help`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandDef {
    /// Full command text including the prefix (e.g. "/help").
    pub command: String,
    pub description: String,
}

// ---------------------------------------------------------------------------
// Parsed invocation
// ---------------------------------------------------------------------------

/// A command found in an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandInvocation {
    /// Exactly the text covered by the command entity.
    pub command: String,
    /// Remaining message text after the command, trimmed.
    pub raw_args: String,
}

impl CommandInvocation {
    /// Whitespace-separated arguments.
    pub fn args(&self) -> Vec<&str> {
        self.raw_args.split_whitespace().collect()
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("command must start with '{COMMAND_PREFIX}': {0:?}")]
    MissingPrefix(String),

    #[error("command name must be non-empty and contain no whitespace: {0:?}")]
    InvalidName(String),
}
