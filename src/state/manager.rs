//! State manager implementation
//!
//! Provides file-based checkpoint persistence with atomic writes.

use super::types::{Checkpoint, CHECKPOINT_VERSION};
use crate::error::{Error, Result};
use crate::pagination::PaginationState;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Reads and writes the checkpoint file of one traversal
#[derive(Debug, Clone)]
pub struct StateManager {
    /// Path to the state file
    path: PathBuf,
}

impl StateManager {
    /// Create a new state manager with the given path
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Get the state file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the checkpoint file, if there is one
    pub async fn load_checkpoint(&self) -> Result<Option<Checkpoint>> {
        if !tokio::fs::try_exists(&self.path).await? {
            return Ok(None);
        }

        let contents = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|e| Error::state(format!("Failed to read state file: {e}")))?;

        let checkpoint: Checkpoint = serde_json::from_str(&contents)
            .map_err(|e| Error::state(format!("Failed to parse state file: {e}")))?;

        if checkpoint.version > CHECKPOINT_VERSION {
            return Err(Error::state(format!(
                "State file version {} is newer than supported version {CHECKPOINT_VERSION}",
                checkpoint.version
            )));
        }

        Ok(Some(checkpoint))
    }

    /// Load the saved state for `endpoint`
    ///
    /// A missing file, or one written for another endpoint, yields `None`
    /// and the traversal starts fresh.
    pub async fn load(&self, endpoint: &str) -> Result<Option<PaginationState>> {
        let Some(checkpoint) = self.load_checkpoint().await? else {
            debug!(path = %self.path.display(), "No state file, starting fresh");
            return Ok(None);
        };

        if checkpoint.endpoint != endpoint {
            warn!(
                path = %self.path.display(),
                saved = %checkpoint.endpoint,
                requested = %endpoint,
                "State file belongs to another endpoint, starting fresh"
            );
            return Ok(None);
        }

        Ok(Some(checkpoint.state))
    }

    /// Save `state` for `endpoint`
    pub async fn save(&self, endpoint: &str, state: &PaginationState) -> Result<()> {
        let checkpoint = Checkpoint::new(endpoint, state.clone());
        let contents = serde_json::to_string_pretty(&checkpoint)
            .map_err(|e| Error::state(format!("Failed to serialize state: {e}")))?;

        // Write to temp file first, then rename for atomicity
        let temp_path = self.path.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| Error::state(format!("Failed to write state file: {e}")))?;

        tokio::fs::rename(&temp_path, &self.path)
            .await
            .map_err(|e| Error::state(format!("Failed to rename state file: {e}")))?;

        debug!(
            path = %self.path.display(),
            pages_fetched = state.pages_fetched,
            "Saved state"
        );
        Ok(())
    }

    /// Remove the state file if it exists
    pub async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::state(format!("Failed to remove state file: {e}"))),
        }
    }
}
