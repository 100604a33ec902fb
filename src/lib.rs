use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod cache;
pub mod contact;
pub mod mail;
pub mod proxy;
pub mod startup_checks;
pub mod upstream;

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub app: AppConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub mail: Option<mail::MailConfig>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AppConfig {
    pub name: String,
    pub log_level: String,
    /// Shared secret for `POST /api/refresh`. Empty means the endpoint
    /// rejects everything.
    #[serde(default)]
    pub admin_token: String,
    /// CORS allow-origin: `*` or a comma-separated origin list.
    #[serde(default = "default_allow_origin")]
    pub allow_origin: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default)]
    pub album_id: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    pub data_directory: PathBuf,
    /// Upper bound on concurrent per-asset metadata requests.
    #[serde(default = "default_worker_count")]
    pub worker_count: usize,
    /// Overall deadline for one refresh run.
    #[serde(default = "default_refresh_timeout")]
    pub refresh_timeout_seconds: u64,
    /// Rebuild the snapshot on this schedule when set.
    #[serde(default)]
    pub refresh_interval_minutes: Option<u64>,
    #[serde(default = "default_true")]
    pub refresh_on_startup: bool,
    /// Keep proxied image bytes on disk next to the snapshot.
    #[serde(default = "default_true")]
    pub store_images: bool,
    /// Download previews for the whole album after each refresh.
    #[serde(default)]
    pub prefetch_previews: bool,
}

fn default_allow_origin() -> String {
    "*".to_string()
}

fn default_request_timeout() -> u64 {
    30
}

fn default_worker_count() -> usize {
    10
}

fn default_refresh_timeout() -> u64 {
    600
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "Obscura".to_string(),
            log_level: "info".to_string(),
            admin_token: String::new(),
            allow_origin: default_allow_origin(),
        }
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            album_id: String::new(),
            request_timeout_seconds: default_request_timeout(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            data_directory: PathBuf::from("data"),
            worker_count: default_worker_count(),
            refresh_timeout_seconds: default_refresh_timeout(),
            refresh_interval_minutes: None,
            refresh_on_startup: true,
            store_images: true,
            prefetch_previews: false,
        }
    }
}

impl Config {
    /// Deployment-specific values can come from the environment, using the
    /// same variable names the original frontend tooling reads.
    pub fn apply_env_overrides(&mut self) {
        if let Ok(value) = std::env::var("IMMICH_URL")
            && !value.is_empty()
        {
            self.upstream.base_url = value;
        }
        if let Ok(value) = std::env::var("IMMICH_API_KEY")
            && !value.is_empty()
        {
            self.upstream.api_key = value;
        }
        if let Ok(value) = std::env::var("IMMICH_ALBUM_ID")
            && !value.is_empty()
        {
            self.upstream.album_id = value;
        }
        if let Ok(value) = std::env::var("ADMIN_TOKEN")
            && !value.is_empty()
        {
            self.app.admin_token = value;
        }
        if let Ok(value) = std::env::var("ALLOW_ORIGIN")
            && !value.is_empty()
        {
            self.app.allow_origin = value;
        }
    }
}

use axum::{Router, http::HeaderValue, routing};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use cache::{Refresher, SharedRefresher, SnapshotStore};
use mail::DynMailProvider;
use proxy::ImageStore;
use upstream::{DynPhotoSource, ImmichClient};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub snapshots: SnapshotStore,
    pub refresher: SharedRefresher,
    pub source: DynPhotoSource,
    pub images: Option<ImageStore>,
    pub mailer: Option<DynMailProvider>,
}

/// Builds the application state from configuration alone, connecting the
/// real upstream client and mail provider.
pub async fn build_state(
    config: Config,
) -> Result<AppState, Box<dyn std::error::Error + Send + Sync>> {
    let source: DynPhotoSource = Arc::new(ImmichClient::new(&config.upstream)?);
    let mailer = match &config.mail {
        Some(mail_config) => Some(mail::create_provider(&mail_config.provider).await?),
        None => None,
    };
    Ok(build_state_with_parts(config, source, mailer))
}

/// Same as [`build_state`] but with the upstream and mail seams supplied by
/// the caller.
pub fn build_state_with_parts(
    config: Config,
    source: DynPhotoSource,
    mailer: Option<DynMailProvider>,
) -> AppState {
    let snapshots = SnapshotStore::new(&config.cache.data_directory);
    let images = config
        .cache
        .store_images
        .then(|| ImageStore::new(config.cache.data_directory.join("img")));
    let refresher = Arc::new(Refresher::new(
        source.clone(),
        snapshots.clone(),
        images.clone(),
        cache::RefreshOptions::from_config(&config),
    ));

    AppState {
        config,
        snapshots,
        refresher,
        source,
        images,
        mailer,
    }
}

pub fn create_app(app_state: AppState) -> Router {
    let cors = build_cors_layer(&app_state.config.app.allow_origin);

    Router::new()
        .route("/healthz", routing::get(health_handler))
        .route("/api/gallery", routing::get(cache::gallery_handler))
        .route("/api/refresh", routing::post(cache::refresh_handler))
        .route("/api/img/{id}", routing::get(proxy::image_handler))
        .route("/api/contact", routing::post(contact::contact_handler))
        .layer(cors)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &axum::http::Request<_>| {
                    tracing::info_span!(
                        "http_request",
                        method = %request.method(),
                        uri = %request.uri(),
                    )
                })
                .on_response(
                    |response: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     _span: &tracing::Span| {
                        tracing::info!(
                            target: "access_log",
                            status = %response.status(),
                            latency_ms = %latency.as_millis(),
                            "response"
                        );
                    },
                ),
        )
        .with_state(app_state)
}

async fn health_handler() -> &'static str {
    "ok"
}

fn build_cors_layer(allow_origin: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers(Any)
        .max_age(Duration::from_secs(600));

    let trimmed = allow_origin.trim();
    if trimmed.is_empty() || trimmed == "*" {
        layer.allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = trimmed
            .split(',')
            .filter_map(|origin| origin.trim().parse().ok())
            .collect();
        layer.allow_origin(origins)
    }
}
