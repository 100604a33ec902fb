use axum::{
    extract::State,
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Json},
};
use serde_json::json;
use tracing::{info, warn};

use super::RefreshError;
use crate::AppState;

/// Serves the cached album document. A missing or unreadable snapshot is an
/// empty album as far as the gallery is concerned - never an error.
pub async fn gallery_handler(State(app_state): State<AppState>) -> impl IntoResponse {
    let body = match app_state.snapshots.read().await {
        Some(snapshot) => serde_json::to_value(&snapshot)
            .unwrap_or_else(|_| json!({ "album": null, "items": [] })),
        None => json!({ "album": null, "items": [] }),
    };
    ([(header::CACHE_CONTROL, "no-store")], Json(body))
}

/// Rebuilds the snapshot. Requires the shared admin token; the check happens
/// before any upstream request is made, and an unconfigured token rejects
/// everything.
pub async fn refresh_handler(
    State(app_state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, StatusCode> {
    let configured = app_state.config.app.admin_token.as_str();
    let presented = headers
        .get("x-admin-token")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("");

    if configured.is_empty() || presented != configured {
        warn!("refresh rejected: missing or invalid admin token");
        return Err(StatusCode::UNAUTHORIZED);
    }

    match app_state.refresher.refresh().await {
        Ok(snapshot) => {
            info!(
                "refresh ok: album={} count={}",
                snapshot.album.id,
                snapshot.items.len()
            );
            Ok(Json(json!({
                "ok": true,
                "count": snapshot.items.len(),
                "album": snapshot.album,
            })))
        }
        Err(RefreshError::AlreadyRunning) => Err(StatusCode::CONFLICT),
        Err(refresh_error @ RefreshError::Upstream(_)) => {
            tracing::error!("refresh failed: {}", refresh_error);
            Err(StatusCode::BAD_GATEWAY)
        }
        Err(refresh_error) => {
            tracing::error!("refresh failed: {}", refresh_error);
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}
