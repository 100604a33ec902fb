use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::path::PathBuf;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::upstream::{DynPhotoSource, ImageVariant};

// Extension lookup order when probing for a stored file.
const KNOWN_EXTENSIONS: [&str; 4] = ["jpg", "webp", "png", "avif"];

/// On-disk store of proxied image bytes, laid out as
/// `{root}/{variant}/{sha256(asset id)}.{ext}`. Asset ids are hashed so an
/// upstream-controlled id can never name a path outside the store.
#[derive(Clone)]
pub struct ImageStore {
    root: PathBuf,
}

impl ImageStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn stem(asset_id: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(asset_id.as_bytes());
        format!("{:x}", hasher.finalize())
    }

    fn variant_dir(&self, variant: ImageVariant) -> PathBuf {
        self.root.join(variant.as_str())
    }

    /// Probes the store for an asset's file; returns its path and mime type.
    pub fn find(&self, variant: ImageVariant, asset_id: &str) -> Option<(PathBuf, String)> {
        let stem = Self::stem(asset_id);
        for extension in KNOWN_EXTENSIONS {
            let path = self.variant_dir(variant).join(format!("{stem}.{extension}"));
            if path.is_file() {
                let mime = mime_guess::from_path(&path).first_or_octet_stream();
                return Some((path, mime.to_string()));
            }
        }
        None
    }

    /// Stores downloaded bytes via a temp file and rename; a failed write
    /// never leaves a half-written file at the final path.
    pub async fn save(
        &self,
        variant: ImageVariant,
        asset_id: &str,
        content_type: Option<&str>,
        bytes: &[u8],
    ) -> std::io::Result<PathBuf> {
        let dir = self.variant_dir(variant);
        tokio::fs::create_dir_all(&dir).await?;

        let stem = Self::stem(asset_id);
        let final_path = dir.join(format!("{stem}.{}", extension_for(content_type)));
        let temp_path = dir.join(format!("{stem}.{:08x}.tmp", rand::random::<u32>()));

        if let Err(error) = tokio::fs::write(&temp_path, bytes).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(error);
        }
        if let Err(error) = tokio::fs::rename(&temp_path, &final_path).await {
            let _ = tokio::fs::remove_file(&temp_path).await;
            return Err(error);
        }

        debug!("stored {} bytes at {:?}", bytes.len(), final_path);
        Ok(final_path)
    }

    /// Drops stored files for assets that are no longer in the album.
    pub async fn prune(&self, keep_ids: &[String]) -> std::io::Result<()> {
        let keep: HashSet<String> = keep_ids.iter().map(|id| Self::stem(id)).collect();
        let root = self.root.clone();

        tokio::task::spawn_blocking(move || {
            for entry in WalkDir::new(&root)
                .min_depth(2)
                .max_depth(2)
                .into_iter()
                .filter_map(Result::ok)
            {
                if !entry.file_type().is_file() {
                    continue;
                }
                let stem = entry
                    .path()
                    .file_stem()
                    .and_then(|name| name.to_str())
                    .unwrap_or("");
                if !keep.contains(stem) {
                    debug!("pruning stale store file {:?}", entry.path());
                    let _ = std::fs::remove_file(entry.path());
                }
            }
        })
        .await
        .map_err(std::io::Error::other)
    }
}

fn extension_for(content_type: Option<&str>) -> &'static str {
    match content_type.map(|value| value.trim().to_lowercase()).as_deref() {
        Some("image/webp") => "webp",
        Some("image/png") => "png",
        Some("image/avif") => "avif",
        _ => "jpg",
    }
}

/// Downloads previews for album assets that are not stored yet, one at a
/// time so a background fill never competes with the refresh fan-out for
/// upstream capacity.
pub fn spawn_prefetch(store: ImageStore, source: DynPhotoSource, asset_ids: Vec<String>) {
    tokio::spawn(async move {
        let mut fetched = 0usize;
        for asset_id in &asset_ids {
            if store.find(ImageVariant::Preview, asset_id).is_some() {
                continue;
            }
            match source.image(asset_id, ImageVariant::Preview).await {
                Ok(download) => {
                    match store
                        .save(
                            ImageVariant::Preview,
                            asset_id,
                            download.content_type.as_deref(),
                            &download.bytes,
                        )
                        .await
                    {
                        Ok(_) => fetched += 1,
                        Err(error) => warn!("prefetch store failed for {}: {}", asset_id, error),
                    }
                }
                Err(error) => warn!("prefetch download failed for {}: {}", asset_id, error),
            }
        }
        if fetched > 0 {
            info!("prefetched {} previews", fetched);
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn save_then_find_uses_content_type_extension() {
        let temp = TempDir::new().unwrap();
        let store = ImageStore::new(temp.path());

        store
            .save(ImageVariant::Preview, "asset-1", Some("image/webp"), &[1, 2])
            .await
            .unwrap();

        let (path, mime) = store.find(ImageVariant::Preview, "asset-1").unwrap();
        assert!(path.to_string_lossy().ends_with(".webp"));
        assert_eq!(mime, "image/webp");
        assert!(store.find(ImageVariant::Fullsize, "asset-1").is_none());
    }

    #[tokio::test]
    async fn unknown_content_type_falls_back_to_jpg() {
        let temp = TempDir::new().unwrap();
        let store = ImageStore::new(temp.path());

        let path = store
            .save(ImageVariant::Preview, "asset-1", None, &[1])
            .await
            .unwrap();
        assert!(path.to_string_lossy().ends_with(".jpg"));
    }

    #[tokio::test]
    async fn prune_keeps_only_listed_assets() {
        let temp = TempDir::new().unwrap();
        let store = ImageStore::new(temp.path());

        store
            .save(ImageVariant::Preview, "keep", Some("image/jpeg"), &[1])
            .await
            .unwrap();
        store
            .save(ImageVariant::Preview, "stale", Some("image/jpeg"), &[1])
            .await
            .unwrap();

        store.prune(&["keep".to_string()]).await.unwrap();

        assert!(store.find(ImageVariant::Preview, "keep").is_some());
        assert!(store.find(ImageVariant::Preview, "stale").is_none());
    }
}
