//! Range-preserving byte relay from the upstream source
//!
//! The relay never interprets ranges itself: the client's `range` header is
//! forwarded verbatim and the upstream decides satisfiability. Dropping the
//! response stream on client disconnect drops the upstream request with it.

use axum::{
    body::Body,
    extract::{rejection::PathRejection, Path, Query, State},
    http::{header, HeaderValue, StatusCode},
    response::Response,
};
use serde::Deserialize;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::web::AppState;

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    pub token: Option<String>,
}

/// `GET /api/videos/{id}/stream?token=…`
pub async fn stream_video(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    Query(query): Query<StreamQuery>,
    headers: axum::http::HeaderMap,
) -> AppResult<Response> {
    let Path(video_id) =
        path.map_err(|_| AppError::invalid_input("invalid_id", "video id must be a UUID"))?;

    let token = query.token.ok_or(AppError::Unauthorized)?;
    state.token_service.verify_stream_token(&token, video_id)?;

    let source_url = state
        .database
        .video_source_url(video_id)
        .await?
        .ok_or_else(|| AppError::not_found("video", video_id.to_string()))?;
    let source =
        Url::parse(&source_url).map_err(|e| AppError::upstream(format!("bad source url: {e}")))?;

    let mut upstream_request = state.http_client.get(source);
    if let Some(range) = headers.get(header::RANGE).and_then(|v| v.to_str().ok()) {
        upstream_request = upstream_request.header(reqwest::header::RANGE, range);
    }

    let upstream = upstream_request
        .send()
        .await
        .map_err(|e| AppError::upstream(format!("request to origin failed: {e}")))?;

    let upstream_status = upstream.status();
    debug!(
        "Relaying video {} from origin: status {}",
        video_id, upstream_status
    );

    // 200/206 relay bytes; 416 passes through so the origin stays the range
    // authority; anything else is an upstream failure.
    let status = StatusCode::from_u16(upstream_status.as_u16())
        .ok()
        .filter(|s| {
            *s == StatusCode::OK
                || *s == StatusCode::PARTIAL_CONTENT
                || *s == StatusCode::RANGE_NOT_SATISFIABLE
        })
        .ok_or_else(|| AppError::upstream(format!("origin returned status {upstream_status}")))?;

    let mut builder = Response::builder().status(status);
    if let Some(relay_headers) = builder.headers_mut() {
        for name in [
            header::CONTENT_TYPE,
            header::CONTENT_LENGTH,
            header::CONTENT_RANGE,
            header::ACCEPT_RANGES,
            header::ETAG,
            header::LAST_MODIFIED,
        ] {
            if let Some(value) = upstream.headers().get(name.as_str()) {
                if let Ok(value) = HeaderValue::from_bytes(value.as_bytes()) {
                    relay_headers.insert(name, value);
                }
            }
        }
        relay_headers.insert(header::CACHE_CONTROL, HeaderValue::from_static("no-store"));
    }

    builder
        .body(Body::from_stream(upstream.bytes_stream()))
        .map_err(|e| AppError::internal(format!("assembling relay response: {e}")))
}
