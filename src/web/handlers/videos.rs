//! Playback grants: the mint surface for stream tokens

use axum::{
    extract::{rejection::PathRejection, Path, State},
    Json,
};
use chrono::Utc;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::PlaybackGrant;
use crate::web::AppState;

/// `GET /api/videos/{id}/play`
///
/// Returns catalog metadata plus a ready-to-use stream URL carrying a
/// freshly minted single-video token.
pub async fn playback_grant(
    State(state): State<AppState>,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<PlaybackGrant>> {
    let Path(video_id) =
        path.map_err(|_| AppError::invalid_input("invalid_id", "video id must be a UUID"))?;

    let video = state
        .database
        .video_playback(video_id)
        .await?
        .ok_or_else(|| AppError::not_found("video", video_id.to_string()))?;

    let now = Utc::now();
    let token = state.token_service.mint_stream_token(video_id)?;
    let stream_url = format!(
        "{}/api/videos/{}/stream?token={}",
        state.config.web.base_url.trim_end_matches('/'),
        video_id,
        urlencoding::encode(&token)
    );

    Ok(Json(PlaybackGrant {
        id: video.id,
        title: video.title,
        duration_seconds: video.duration_seconds,
        views: video.views,
        is_trending: video.is_trending,
        stream_url,
        expires_at: state.token_service.stream_expiry_from(now),
    }))
}
