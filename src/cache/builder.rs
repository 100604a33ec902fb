use std::collections::HashSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::task::JoinSet;
use tracing::{debug, warn};

use super::{AlbumSummary, AssetDetail, CacheSnapshot};
use crate::upstream::{DynPhotoSource, UpstreamError};

/// Builds one denormalized snapshot of an album: the summary plus per-asset
/// metadata, fetched with a bounded number of concurrent upstream requests.
pub struct SnapshotBuilder {
    source: DynPhotoSource,
    worker_count: usize,
}

impl SnapshotBuilder {
    pub fn new(source: DynPhotoSource, worker_count: usize) -> Self {
        Self {
            source,
            worker_count: worker_count.max(1),
        }
    }

    /// Runs the whole pipeline for one album. An album-fetch failure aborts
    /// before any per-asset request is issued; per-asset failures only drop
    /// that asset from the result.
    pub async fn build(&self, album_id: &str) -> Result<CacheSnapshot, UpstreamError> {
        let (album, asset_ids) = self.source.album(album_id).await?;
        debug!("album {} lists {} assets", album.id, asset_ids.len());

        let slots = self.fetch_details(asset_ids).await;
        Ok(assemble(album, slots))
    }

    /// Fetches detail for every asset id with at most `worker_count` requests
    /// in flight. Returns one slot per input position: `Some` on success,
    /// `None` when that asset's fetch failed.
    ///
    /// Workers share a single claim cursor. Each claims the next unclaimed
    /// position, fetches it, and records the outcome under that position, so
    /// the output order always matches the input order no matter which worker
    /// finishes first.
    async fn fetch_details(&self, asset_ids: Vec<String>) -> Vec<Option<AssetDetail>> {
        let total = asset_ids.len();
        if total == 0 {
            return Vec::new();
        }

        let ids: Arc<[String]> = asset_ids.into();
        let cursor = Arc::new(AtomicUsize::new(0));
        let workers = self.worker_count.min(total);

        let mut pool = JoinSet::new();
        for _ in 0..workers {
            let ids = Arc::clone(&ids);
            let cursor = Arc::clone(&cursor);
            let source = Arc::clone(&self.source);

            pool.spawn(async move {
                let mut fetched = Vec::new();
                loop {
                    let index = cursor.fetch_add(1, Ordering::Relaxed);
                    if index >= ids.len() {
                        break;
                    }
                    match source.asset(&ids[index]).await {
                        Ok(detail) => fetched.push((index, Some(detail))),
                        Err(error) => {
                            warn!("asset {} skipped: {}", ids[index], error);
                            fetched.push((index, None));
                        }
                    }
                }
                fetched
            });
        }

        // Claimed indices are disjoint across workers, so every slot is
        // written at most once.
        let mut slots: Vec<Option<AssetDetail>> = (0..total).map(|_| None).collect();
        while let Some(joined) = pool.join_next().await {
            match joined {
                Ok(fetched) => {
                    for (index, outcome) in fetched {
                        slots[index] = outcome;
                    }
                }
                Err(error) => warn!("metadata worker aborted: {}", error),
            }
        }
        slots
    }
}

/// Keeps the successful slots in their original index order and drops
/// duplicate ids, first occurrence winning.
fn assemble(album: AlbumSummary, slots: Vec<Option<AssetDetail>>) -> CacheSnapshot {
    let mut seen = HashSet::new();
    let items = slots
        .into_iter()
        .flatten()
        .filter(|detail| seen.insert(detail.id.clone()))
        .collect();
    CacheSnapshot { album, items }
}
