use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use super::types::{AlbumResponse, AssetResponse};
use super::{ImageDownload, ImageVariant, PhotoSource, UpstreamError};
use crate::UpstreamConfig;
use crate::cache::{AlbumSummary, AssetDetail};

/// HTTP client for the Immich API. Authenticates every request with the
/// `x-api-key` header and never retries; retry policy belongs to callers.
pub struct ImmichClient {
    client: Client,
    base_url: String,
    api_key: String,
}

impl ImmichClient {
    pub fn new(config: &UpstreamConfig) -> Result<Self, UpstreamError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(UpstreamError::Unavailable)?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, UpstreamError> {
        debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .header("x-api-key", &self.api_key)
            .send()
            .await
            .map_err(UpstreamError::Unavailable)?;

        let status = response.status();
        if !status.is_success() {
            return Err(UpstreamError::Rejected {
                status: status.as_u16(),
            });
        }
        Ok(response)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, UpstreamError> {
        self.get(url)
            .await?
            .json::<T>()
            .await
            .map_err(|error| UpstreamError::Malformed(error.to_string()))
    }
}

#[async_trait]
impl PhotoSource for ImmichClient {
    async fn album(&self, album_id: &str) -> Result<(AlbumSummary, Vec<String>), UpstreamError> {
        let url = format!(
            "{}/api/albums/{}?withoutAssets=false",
            self.base_url, album_id
        );
        let response: AlbumResponse = self.get_json(&url).await?;

        let listing = response.assets.ok_or_else(|| {
            UpstreamError::Malformed(format!("album {} has no assets field", response.id))
        })?;

        let summary = AlbumSummary {
            id: response.id,
            name: response.album_name,
            asset_count: response.asset_count,
        };
        Ok((summary, listing.into_ids()))
    }

    async fn asset(&self, asset_id: &str) -> Result<AssetDetail, UpstreamError> {
        let url = format!("{}/api/assets/{}", self.base_url, asset_id);
        let response: AssetResponse = self.get_json(&url).await?;
        Ok(response.into())
    }

    async fn image(
        &self,
        asset_id: &str,
        variant: ImageVariant,
    ) -> Result<ImageDownload, UpstreamError> {
        let url = match variant {
            ImageVariant::Preview => format!(
                "{}/api/assets/{}/thumbnail?size=preview",
                self.base_url, asset_id
            ),
            ImageVariant::Fullsize => format!("{}/api/assets/{}/original", self.base_url, asset_id),
        };

        let response = self.get(&url).await?;
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_string);
        let bytes = response
            .bytes()
            .await
            .map_err(UpstreamError::Unavailable)?;

        Ok(ImageDownload {
            content_type,
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;

    fn client_for(base_url: &str) -> ImmichClient {
        ImmichClient::new(&UpstreamConfig {
            base_url: base_url.to_string(),
            api_key: "test-key".to_string(),
            album_id: "album-1".to_string(),
            request_timeout_seconds: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn album_parses_wrapped_asset_listing() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/api/albums/album-1")
            .match_query(Matcher::UrlEncoded(
                "withoutAssets".into(),
                "false".into(),
            ))
            .match_header("x-api-key", "test-key")
            .with_status(200)
            .with_body(
                r#"{
                    "id": "album-1",
                    "albumName": "Portfolio",
                    "assetCount": 2,
                    "assets": {"items": [{"id": "a"}, {"id": "b"}]}
                }"#,
            )
            .create_async()
            .await;

        let client = client_for(&server.url());
        let (summary, ids) = client.album("album-1").await.unwrap();

        assert_eq!(summary.name, "Portfolio");
        assert_eq!(summary.asset_count, 2);
        assert_eq!(ids, vec!["a", "b"]);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn album_without_assets_field_is_malformed() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/albums/album-1")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"id": "album-1", "albumName": "Portfolio", "assetCount": 0}"#)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let error = client.album("album-1").await.unwrap_err();
        assert!(matches!(error, UpstreamError::Malformed(_)));
    }

    #[tokio::test]
    async fn non_success_status_is_rejected_with_status() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/albums/album-1")
            .match_query(Matcher::Any)
            .with_status(401)
            .create_async()
            .await;

        let client = client_for(&server.url());
        let error = client.album("album-1").await.unwrap_err();
        assert!(matches!(error, UpstreamError::Rejected { status: 401 }));
    }

    #[tokio::test]
    async fn unreachable_host_is_unavailable() {
        // nothing listens on port 1
        let client = client_for("http://127.0.0.1:1");
        let error = client.album("album-1").await.unwrap_err();
        assert!(matches!(error, UpstreamError::Unavailable(_)));
    }

    #[tokio::test]
    async fn asset_parses_exif_and_tags() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/assets/a")
            .with_status(200)
            .with_body(
                r#"{
                    "id": "a",
                    "originalFileName": "DSCF0001.jpg",
                    "exifInfo": {"model": "X-T5", "iso": 400, "exposureTime": "1/250"},
                    "tags": [{"id": "t1", "name": "street"}]
                }"#,
            )
            .create_async()
            .await;

        let client = client_for(&server.url());
        let detail = client.asset("a").await.unwrap();

        assert_eq!(detail.original_file_name.as_deref(), Some("DSCF0001.jpg"));
        assert_eq!(detail.exif.model.as_deref(), Some("X-T5"));
        assert_eq!(detail.exif.iso, Some(400));
        assert_eq!(detail.tags.len(), 1);
    }

    #[tokio::test]
    async fn image_download_carries_content_type() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("GET", "/api/assets/a/thumbnail")
            .match_query(Matcher::UrlEncoded("size".into(), "preview".into()))
            .with_status(200)
            .with_header("content-type", "image/webp")
            .with_body(vec![1u8, 2, 3])
            .create_async()
            .await;

        let client = client_for(&server.url());
        let download = client.image("a", ImageVariant::Preview).await.unwrap();

        assert_eq!(download.content_type.as_deref(), Some("image/webp"));
        assert_eq!(download.bytes.as_ref(), &[1, 2, 3]);
    }
}
