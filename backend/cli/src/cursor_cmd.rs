//! `pollcast cursor show|reset`

use std::path::Path;

use anyhow::Result;
use clap::Subcommand;
use pollcast_channels::CursorStore;
use pollcast_config::load_and_prepare;

#[derive(Subcommand)]
pub enum CursorAction {
    /// Print the id of the last processed update
    Show,
    /// Forget the cursor so the next run starts from the oldest pending update
    Reset,
}

pub async fn run(config_path: &Path, action: CursorAction) -> Result<()> {
    let settings = load_and_prepare(config_path).await?;
    let store = CursorStore::new(settings.cursor_path());
    println!("{}", apply(&store, action).await?);
    Ok(())
}

async fn apply(store: &CursorStore, action: CursorAction) -> Result<String> {
    let path = store.path().display();
    Ok(match action {
        CursorAction::Show => match store.load().await {
            Some(id) => format!("{id} ({path})"),
            None => format!("no cursor ({path})"),
        },
        CursorAction::Reset => {
            store.reset().await?;
            format!("cursor reset ({path})")
        }
    })
}
