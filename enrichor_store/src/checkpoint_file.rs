use async_trait::async_trait;
use enrichor_core::{Checkpoint, CheckpointStore, Error, Result};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::atomic::write_atomic;

/// Checkpoint persisted as a single JSON file.
///
/// Presence of the file means a previous run did not finish.
#[derive(Debug, Clone)]
pub struct FileCheckpointManager {
    path: PathBuf,
}

impl FileCheckpointManager {
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    #[must_use]
    pub fn exists(&self) -> bool {
        self.path.exists()
    }
}

#[async_trait]
impl CheckpointStore for FileCheckpointManager {
    async fn load(&self) -> Option<Checkpoint> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No checkpoint at {}", self.path.display());
                return None;
            }
            Err(e) => {
                warn!("Cannot read checkpoint {}: {e}", self.path.display());
                return None;
            }
        };

        match serde_json::from_slice::<Checkpoint>(&bytes) {
            Ok(checkpoint) if checkpoint.is_supported() => Some(checkpoint),
            Ok(checkpoint) => {
                warn!(
                    "Ignoring checkpoint {} with unsupported version {}",
                    self.path.display(),
                    checkpoint.version
                );
                None
            }
            Err(e) => {
                warn!("Ignoring malformed checkpoint {}: {e}", self.path.display());
                None
            }
        }
    }

    async fn save(&self, checkpoint: &Checkpoint) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(checkpoint)?;
        write_atomic(&self.path, &bytes).await
    }

    async fn clear(&self) -> Result<()> {
        match tokio::fs::remove_file(&self.path).await {
            Ok(()) => {
                debug!("Cleared checkpoint {}", self.path.display());
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(Error::persistence(&self.path, e)),
        }
    }
}
