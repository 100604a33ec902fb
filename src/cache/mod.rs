// Album snapshot pipeline - fetch, bounded fan-out, assemble, persist
mod builder;
mod error;
mod handlers;
mod types;
mod writer;

pub use builder::SnapshotBuilder;
pub use error::RefreshError;
pub use handlers::{gallery_handler, refresh_handler};
pub use types::*;
pub use writer::SnapshotStore;

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{error, info, warn};

use crate::proxy::{ImageStore, spawn_prefetch};
use crate::upstream::DynPhotoSource;

pub type SharedRefresher = Arc<Refresher>;

#[derive(Debug, Clone)]
pub struct RefreshOptions {
    pub album_id: String,
    pub worker_count: usize,
    pub timeout_seconds: u64,
    pub prefetch_previews: bool,
}

impl RefreshOptions {
    pub fn from_config(config: &crate::Config) -> Self {
        Self {
            album_id: config.upstream.album_id.clone(),
            worker_count: config.cache.worker_count,
            timeout_seconds: config.cache.refresh_timeout_seconds,
            prefetch_previews: config.cache.prefetch_previews,
        }
    }
}

/// Runs the fetch, assemble, write sequence for the configured album.
///
/// Refreshes are serialized behind an advisory lock: a trigger that arrives
/// while another refresh is in flight fails with `AlreadyRunning` instead of
/// interleaving writes to the snapshot file.
pub struct Refresher {
    builder: SnapshotBuilder,
    store: SnapshotStore,
    images: Option<ImageStore>,
    source: DynPhotoSource,
    options: RefreshOptions,
    lock: Mutex<()>,
}

impl Refresher {
    pub fn new(
        source: DynPhotoSource,
        store: SnapshotStore,
        images: Option<ImageStore>,
        options: RefreshOptions,
    ) -> Self {
        Self {
            builder: SnapshotBuilder::new(source.clone(), options.worker_count),
            store,
            images,
            source,
            options,
            lock: Mutex::new(()),
        }
    }

    pub async fn refresh(&self) -> Result<CacheSnapshot, RefreshError> {
        let Ok(_guard) = self.lock.try_lock() else {
            return Err(RefreshError::AlreadyRunning);
        };

        let deadline = Duration::from_secs(self.options.timeout_seconds);
        let snapshot =
            match tokio::time::timeout(deadline, self.builder.build(&self.options.album_id)).await
            {
                Ok(built) => built?,
                Err(_) => return Err(RefreshError::Timeout(self.options.timeout_seconds)),
            };

        self.store.write(&snapshot).await?;

        if let Some(images) = &self.images {
            let kept: Vec<String> = snapshot.items.iter().map(|item| item.id.clone()).collect();
            if let Err(prune_error) = images.prune(&kept).await {
                warn!("image store prune failed: {}", prune_error);
            }
            if self.options.prefetch_previews {
                spawn_prefetch(images.clone(), self.source.clone(), kept);
            }
        }

        info!(
            "refresh complete: album {} with {} of {} assets cached",
            snapshot.album.id,
            snapshot.items.len(),
            snapshot.album.asset_count
        );
        Ok(snapshot)
    }
}

/// Rebuilds the snapshot on a fixed schedule, the same way a manual
/// `POST /api/refresh` would.
pub fn start_periodic_refresh(refresher: SharedRefresher, interval_minutes: u64) {
    tokio::spawn(async move {
        let mut interval =
            tokio::time::interval(Duration::from_secs(interval_minutes * 60));
        interval.tick().await; // Skip the first immediate tick

        loop {
            interval.tick().await;
            info!("starting scheduled snapshot refresh");
            if let Err(refresh_error) = refresher.refresh().await {
                error!("scheduled refresh failed: {}", refresh_error);
            }
        }
    });
}
