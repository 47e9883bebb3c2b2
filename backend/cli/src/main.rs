mod check_config_cmd;
mod cursor_cmd;
mod runtime;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::{info, warn};

use pollcast_config::{config_file_path, load_and_prepare, validate};
use pollcast_logging::init_logger;

#[derive(Parser)]
#[command(name = "pollcast")]
#[command(about = "Pollcast — long-polling Telegram bot runtime")]
#[command(version)]
struct Cli {
    /// Config file (TOML, or YAML by extension). Defaults to $POLLCAST_CONFIG or pollcast.toml
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll for updates and run the bot (default)
    Run,
    /// Load and validate the config, then print it with secrets masked
    CheckConfig,
    /// Inspect or reset the persisted update cursor
    Cursor {
        #[command(subcommand)]
        action: cursor_cmd::CursorAction,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let path = config_file_path(cli.config.as_deref());

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => {
            let settings = load_and_prepare(&path).await?;
            init_logger(settings.log_dir(), settings.log_level());
            // Loading ran before the subscriber existed; surface warnings now.
            for warning in validate(settings.config()).warnings {
                warn!(path = %warning.path, message = %warning.message, "Config warning");
            }
            info!(config = %path.display(), "Starting Pollcast");
            runtime::run_bot(&settings).await?;
        }
        Commands::CheckConfig => check_config_cmd::run(&path).await?,
        Commands::Cursor { action } => cursor_cmd::run(&path, action).await?,
    }

    Ok(())
}
