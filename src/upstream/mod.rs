// Upstream photo-management API (Immich) - read-only client
mod client;
mod error;
mod types;

pub use client::ImmichClient;
pub use error::UpstreamError;

use async_trait::async_trait;
use bytes::Bytes;
use std::sync::Arc;

use crate::cache::{AlbumSummary, AssetDetail};

/// Which rendition of an asset to download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageVariant {
    Preview,
    Fullsize,
}

impl ImageVariant {
    pub fn as_str(self) -> &'static str {
        match self {
            ImageVariant::Preview => "preview",
            ImageVariant::Fullsize => "fullsize",
        }
    }

    /// Normalizes the proxy query value; unknown sizes fall back to preview,
    /// and the legacy "thumbnail" alias maps there too.
    pub fn from_query(value: Option<&str>) -> Self {
        match value.map(str::to_lowercase).as_deref() {
            Some("fullsize") => ImageVariant::Fullsize,
            _ => ImageVariant::Preview,
        }
    }
}

/// A downloaded image body plus the content type upstream reported.
#[derive(Debug, Clone)]
pub struct ImageDownload {
    pub content_type: Option<String>,
    pub bytes: Bytes,
}

/// Read-only view of the photo service the portfolio is backed by. The
/// refresh pipeline and the image proxy only depend on this seam, so tests
/// can substitute an instrumented fake.
#[async_trait]
pub trait PhotoSource: Send + Sync {
    /// Album summary plus the ordered asset ids it contains.
    async fn album(&self, album_id: &str) -> Result<(AlbumSummary, Vec<String>), UpstreamError>;

    /// Full metadata for one asset.
    async fn asset(&self, asset_id: &str) -> Result<AssetDetail, UpstreamError>;

    /// Image bytes for one asset in the requested rendition.
    async fn image(
        &self,
        asset_id: &str,
        variant: ImageVariant,
    ) -> Result<ImageDownload, UpstreamError>;
}

pub type DynPhotoSource = Arc<dyn PhotoSource>;
