//! Analytics ingestion: session pings and view counting

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        ConnectInfo, Path, State,
    },
    http::HeaderMap,
    Json,
};
use chrono::Utc;
use std::net::SocketAddr;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::{PingRequest, PingResponse, ViewResponse};
use crate::services::analytics::normalize_session_id;
use crate::web::extractors::{client_ip_hash, optional_subject, session_id_header, user_agent};
use crate::web::AppState;

/// `POST /api/analytics/ping`
///
/// Requires `x-session-id`; tolerates an absent body since beacon senders
/// often omit the JSON content type.
pub async fn ping(
    State(state): State<AppState>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
    body: Result<Json<PingRequest>, JsonRejection>,
) -> AppResult<Json<PingResponse>> {
    let session_id = normalize_session_id(session_id_header(&headers)).ok_or_else(|| {
        AppError::invalid_input("missing_session_id", "x-session-id header required")
    })?;

    let request = match body {
        Ok(Json(request)) => request,
        Err(JsonRejection::MissingJsonContentType(_)) => PingRequest::default(),
        Err(_) => {
            return Err(AppError::invalid_input("invalid_body", "malformed JSON body"));
        }
    };

    let user_id = optional_subject(&headers, &state.token_service);
    let ip_hash = client_ip_hash(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    let agent = user_agent(&headers);

    let now = Utc::now();
    state
        .analytics
        .record_ping(&session_id, user_id, &agent, &ip_hash, &request, now)
        .await?;

    Ok(Json(PingResponse {
        ok: true,
        server_time: now,
    }))
}

/// `POST /api/videos/{id}/view`
///
/// The counter increments even without a session id; the event record is
/// only written when one is present.
pub async fn record_view(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
    connect_info: Option<ConnectInfo<SocketAddr>>,
    headers: HeaderMap,
) -> AppResult<Json<ViewResponse>> {
    let Path(video_id) =
        path.map_err(|_| AppError::invalid_input("invalid_id", "video id must be a UUID"))?;

    let session_id = normalize_session_id(session_id_header(&headers));
    let ip_hash = client_ip_hash(&headers, connect_info.map(|ConnectInfo(addr)| addr));
    let agent = user_agent(&headers);

    let views = state
        .analytics
        .record_view(video_id, session_id.as_deref(), &agent, &ip_hash, Utc::now())
        .await?
        .ok_or_else(|| AppError::not_found("video", video_id.to_string()))?;

    Ok(Json(ViewResponse { views }))
}
