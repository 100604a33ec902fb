use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use tokio_util::io::ReaderStream;
use tracing::{error, warn};

use crate::AppState;
use crate::upstream::{ImageVariant, UpstreamError};

const STORED_CACHE_CONTROL: &str = "public, max-age=604800, immutable";
const PASSTHROUGH_CACHE_CONTROL: &str = "public, max-age=86400, immutable";

#[derive(Debug, Deserialize, Default)]
pub struct ImageQuery {
    pub q: Option<String>,
}

/// Image proxy: serve from the on-disk store when present, otherwise
/// download from upstream (storing a copy when possible), otherwise pass the
/// downloaded bytes straight through.
pub async fn image_handler(
    State(app_state): State<AppState>,
    Path(asset_id): Path<String>,
    Query(query): Query<ImageQuery>,
) -> Response {
    let variant = ImageVariant::from_query(query.q.as_deref());

    if let Some(store) = &app_state.images
        && let Some((path, mime)) = store.find(variant, &asset_id)
    {
        match serve_stored_file(&path, &mime).await {
            Ok(response) => return response,
            Err(serve_error) => {
                warn!("stored image {:?} unreadable: {}", path, serve_error);
            }
        }
    }

    match app_state.source.image(&asset_id, variant).await {
        Ok(download) => {
            if let Some(store) = &app_state.images
                && let Err(store_error) = store
                    .save(
                        variant,
                        &asset_id,
                        download.content_type.as_deref(),
                        &download.bytes,
                    )
                    .await
            {
                warn!("could not store image {}: {}", asset_id, store_error);
            }

            let content_type = download
                .content_type
                .unwrap_or_else(|| "image/jpeg".to_string());
            (
                [
                    (header::CONTENT_TYPE, content_type),
                    (
                        header::CACHE_CONTROL,
                        PASSTHROUGH_CACHE_CONTROL.to_string(),
                    ),
                ],
                download.bytes,
            )
                .into_response()
        }
        Err(UpstreamError::Rejected { status }) => {
            warn!("upstream rejected image {} with {}", asset_id, status);
            StatusCode::from_u16(status)
                .unwrap_or(StatusCode::BAD_GATEWAY)
                .into_response()
        }
        Err(fetch_error) => {
            error!("image proxy failed for {}: {}", asset_id, fetch_error);
            StatusCode::BAD_GATEWAY.into_response()
        }
    }
}

async fn serve_stored_file(
    path: &std::path::Path,
    content_type: &str,
) -> std::io::Result<Response> {
    let file = tokio::fs::File::open(path).await?;
    let modified = file
        .metadata()
        .await?
        .modified()
        .ok()
        .map(httpdate::fmt_http_date);

    let mut builder = Response::builder()
        .header(header::CONTENT_TYPE, content_type)
        .header(header::CACHE_CONTROL, STORED_CACHE_CONTROL);
    if let Some(modified) = modified {
        builder = builder.header(header::LAST_MODIFIED, modified);
    }

    builder
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(std::io::Error::other)
}
