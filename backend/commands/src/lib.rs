pub mod detection;
pub mod dispatch;
pub mod handlers;
pub mod registry;
pub mod types;

use std::sync::Arc;

use pollcast_core::Transport;

pub use detection::detect_command;
pub use dispatch::{CommandContext, CommandHandler, CommandResponse, CommandRouter};
pub use handlers::{HELP_GREETING, HelpHandler};
pub use registry::{CommandRegistry, validate_command};
pub use types::{COMMAND_PREFIX, CommandDef, CommandError, CommandInvocation};

/// Build a router pre-wired with the built-in handlers.
pub fn build_default_router(transport: Arc<dyn Transport>) -> Result<CommandRouter, CommandError> {
    let mut router = CommandRouter::new(transport);
    router.register("/help", "List available commands", Arc::new(HelpHandler))?;
    Ok(router)
}
