use std::path::PathBuf;
use tracing::{debug, info};

use super::{CacheSnapshot, RefreshError};

/// Owns the on-disk snapshot document at `{data_directory}/cache.json`.
#[derive(Clone)]
pub struct SnapshotStore {
    data_directory: PathBuf,
}

impl SnapshotStore {
    pub fn new(data_directory: impl Into<PathBuf>) -> Self {
        Self {
            data_directory: data_directory.into(),
        }
    }

    pub fn snapshot_path(&self) -> PathBuf {
        self.data_directory.join("cache.json")
    }

    /// Replaces the snapshot. The document goes to a temporary file in the
    /// same directory first and is renamed over the canonical path, so a
    /// crash mid-write leaves the previous snapshot intact.
    pub async fn write(&self, snapshot: &CacheSnapshot) -> Result<(), RefreshError> {
        tokio::fs::create_dir_all(&self.data_directory).await?;
        let json = serde_json::to_string_pretty(snapshot)?;

        let temp_path = self
            .data_directory
            .join(format!("cache.json.{:08x}.tmp", rand::random::<u32>()));

        if let Err(error) = tokio::fs::write(&temp_path, &json).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(error.into());
        }
        if let Err(error) = tokio::fs::rename(&temp_path, self.snapshot_path()).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(error.into());
        }

        info!(
            "wrote snapshot with {} items to {:?}",
            snapshot.items.len(),
            self.snapshot_path()
        );
        Ok(())
    }

    /// Reads the current snapshot. A missing or unparsable file reads as
    /// `None`; the gallery treats that as an empty album.
    pub async fn read(&self) -> Option<CacheSnapshot> {
        let json = tokio::fs::read_to_string(self.snapshot_path()).await.ok()?;
        match serde_json::from_str(&json) {
            Ok(snapshot) => Some(snapshot),
            Err(error) => {
                debug!(
                    "snapshot at {:?} does not parse: {}",
                    self.snapshot_path(),
                    error
                );
                None
            }
        }
    }
}
