//! Persisted fetch cursor: the id of the last update handed to the dispatcher.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio::fs;
use tracing::{debug, warn};

/// Plain-text store for the last processed update id.
#[derive(Debug, Clone)]
pub struct CursorStore {
    path: PathBuf,
}

impl CursorStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the cursor. A missing or unparsable file means "start from the beginning".
    pub async fn load(&self) -> Option<i64> {
        let raw = match fs::read_to_string(&self.path).await {
            Ok(raw) => raw,
            Err(e) => {
                debug!(path = %self.path.display(), error = %e, "No cursor; starting from the beginning");
                return None;
            }
        };
        match raw.trim().parse() {
            Ok(id) => Some(id),
            Err(_) => {
                warn!(path = %self.path.display(), "Cursor file is not a number; starting from the beginning");
                None
            }
        }
    }

    /// Persist the cursor (write to a temp file, then rename).
    pub async fn store(&self, update_id: i64) -> Result<()> {
        let tmp_path = self.path.with_extension("tmp");
        fs::write(&tmp_path, update_id.to_string())
            .await
            .with_context(|| format!("Failed to write cursor: {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path)
            .await
            .with_context(|| format!("Failed to rename cursor to: {}", self.path.display()))?;
        Ok(())
    }

    /// Forget the cursor so the next start fetches from the beginning.
    pub async fn reset(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove cursor: {}", self.path.display())),
        }
    }
}
