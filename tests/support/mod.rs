#![allow(dead_code)]

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::HashSet;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tempfile::TempDir;

use obscura::Config;
use obscura::cache::{AlbumSummary, AssetDetail, ExifSummary};
use obscura::mail::{MailError, MailMessage, MailProvider};
use obscura::upstream::{ImageDownload, ImageVariant, PhotoSource, UpstreamError};

/// Instrumented in-memory stand-in for the photo service. Counts calls and
/// tracks how many asset fetches are in flight at once.
pub struct FakeUpstream {
    pub album: AlbumSummary,
    pub asset_ids: Vec<String>,
    pub failing: HashSet<String>,
    pub album_fails: bool,
    pub asset_delay: Option<Duration>,
    pub album_calls: AtomicUsize,
    pub asset_calls: AtomicUsize,
    pub image_calls: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeUpstream {
    pub fn with_assets(ids: &[&str]) -> Self {
        Self {
            album: AlbumSummary {
                id: "album-1".to_string(),
                name: "Portfolio".to_string(),
                asset_count: ids.len() as u64,
            },
            asset_ids: ids.iter().map(|id| id.to_string()).collect(),
            failing: HashSet::new(),
            album_fails: false,
            asset_delay: None,
            album_calls: AtomicUsize::new(0),
            asset_calls: AtomicUsize::new(0),
            image_calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    pub fn failing_assets(mut self, ids: &[&str]) -> Self {
        self.failing = ids.iter().map(|id| id.to_string()).collect();
        self
    }

    pub fn album_failure(mut self) -> Self {
        self.album_fails = true;
        self
    }

    pub fn with_asset_delay(mut self, delay: Duration) -> Self {
        self.asset_delay = Some(delay);
        self
    }

    pub fn detail(id: &str) -> AssetDetail {
        AssetDetail {
            id: id.to_string(),
            original_file_name: Some(format!("{id}.jpg")),
            exif: ExifSummary {
                model: Some("X-T5".to_string()),
                ..Default::default()
            },
            tags: Vec::new(),
        }
    }
}

#[async_trait]
impl PhotoSource for FakeUpstream {
    async fn album(&self, _album_id: &str) -> Result<(AlbumSummary, Vec<String>), UpstreamError> {
        self.album_calls.fetch_add(1, Ordering::SeqCst);
        if self.album_fails {
            return Err(UpstreamError::Rejected { status: 500 });
        }
        Ok((self.album.clone(), self.asset_ids.clone()))
    }

    async fn asset(&self, asset_id: &str) -> Result<AssetDetail, UpstreamError> {
        self.asset_calls.fetch_add(1, Ordering::SeqCst);
        let concurrent = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(concurrent, Ordering::SeqCst);

        if let Some(delay) = self.asset_delay {
            tokio::time::sleep(delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing.contains(asset_id) {
            return Err(UpstreamError::Rejected { status: 404 });
        }
        Ok(Self::detail(asset_id))
    }

    async fn image(
        &self,
        _asset_id: &str,
        _variant: ImageVariant,
    ) -> Result<ImageDownload, UpstreamError> {
        self.image_calls.fetch_add(1, Ordering::SeqCst);
        Ok(ImageDownload {
            content_type: Some("image/jpeg".to_string()),
            bytes: Bytes::from_static(&[0xFF, 0xD8, 0xFF, 0xD9]),
        })
    }
}

/// Mail provider that records what would have been sent.
#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<MailMessage>>,
}

#[async_trait]
impl MailProvider for RecordingMailer {
    async fn send(&self, message: MailMessage) -> Result<(), MailError> {
        self.sent.lock().unwrap().push(message);
        Ok(())
    }

    fn name(&self) -> &str {
        "recording"
    }
}

pub fn test_config(temp: &TempDir) -> Config {
    let mut config = Config::default();
    config.cache.data_directory = temp.path().join("data");
    config.cache.refresh_on_startup = false;
    config.app.admin_token = "secret-token".to_string();
    config.upstream.base_url = "http://upstream.invalid".to_string();
    config.upstream.api_key = "key".to_string();
    config.upstream.album_id = "album-1".to_string();
    config
}
