/// Command registry: the table of known commands and their descriptions.
use tracing::debug;

use crate::types::{COMMAND_PREFIX, CommandDef, CommandError};

/// Check that `command` can be registered.
pub fn validate_command(command: &str) -> Result<(), CommandError> {
    let Some(name) = command.strip_prefix(COMMAND_PREFIX) else {
        return Err(CommandError::MissingPrefix(command.to_string()));
    };
    if name.is_empty() || name.chars().any(char::is_whitespace) {
        return Err(CommandError::InvalidName(command.to_string()));
    }
    Ok(())
}

#[derive(Debug, Default)]
pub struct CommandRegistry {
    commands: Vec<CommandDef>,
}

impl CommandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a command definition.
    pub fn register(&mut self, def: CommandDef) -> Result<(), CommandError> {
        validate_command(&def.command)?;
        match self.commands.iter_mut().find(|c| c.command == def.command) {
            Some(existing) => {
                debug!(command = %def.command, "Replacing command definition");
                *existing = def;
            }
            None => self.commands.push(def),
        }
        Ok(())
    }

    pub fn all(&self) -> &[CommandDef] {
        &self.commands
    }

    /// Exact, case-sensitive lookup (e.g. "/help").
    pub fn find(&self, command: &str) -> Option<&CommandDef> {
        self.commands.iter().find(|c| c.command == command)
    }
}
