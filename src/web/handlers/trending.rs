//! Admin surface for trending settings, recompute, insights, and curated
//! categories

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde_json::{json, Value};
use tracing::info;
use uuid::Uuid;

use crate::errors::{AppError, AppResult};
use crate::models::{
    TrendingCategoryAssignRequest, TrendingCategoryCreateRequest, TrendingSettingsUpdate,
    TrendingSettingsView,
};
use crate::web::extractors::AdminClaims;
use crate::web::AppState;

pub const CATEGORY_NAME_MAX_LEN: usize = 60;

/// `GET /api/admin/trending-settings`
pub async fn get_settings(
    State(state): State<AppState>,
    _claims: AdminClaims,
) -> AppResult<Json<TrendingSettingsView>> {
    let settings = state.trending.settings().await?;
    Ok(Json(TrendingSettingsView::from(&settings)))
}

/// `PATCH /api/admin/trending-settings`
///
/// Persists the merged settings, then recomputes iff the merged
/// `autoRefresh` is true.
pub async fn update_settings(
    State(state): State<AppState>,
    _claims: AdminClaims,
    body: Result<Json<TrendingSettingsUpdate>, JsonRejection>,
) -> AppResult<Json<Value>> {
    let Json(update) =
        body.map_err(|_| AppError::invalid_input("invalid_body", "malformed JSON body"))?;
    state.trending.update_settings(update).await?;
    Ok(Json(json!({ "success": true })))
}

/// `POST /api/admin/trending-settings/recompute`
pub async fn recompute(
    State(state): State<AppState>,
    _claims: AdminClaims,
) -> AppResult<Json<Value>> {
    let summary = state.trending.recompute().await?;
    info!(
        "Trending recompute: {} pinned, {} selected",
        summary.pinned, summary.selected
    );
    Ok(Json(json!({ "success": true })))
}

/// `GET /api/admin/trending-insights`
pub async fn insights(
    State(state): State<AppState>,
    _claims: AdminClaims,
) -> AppResult<Json<Value>> {
    let insights = state.trending.insights().await?;
    Ok(Json(json!({ "insights": insights })))
}

/// `GET /api/admin/trending-categories`
pub async fn list_categories(
    State(state): State<AppState>,
    _claims: AdminClaims,
) -> AppResult<Json<Value>> {
    let categories = state.database.list_trending_categories().await?;
    Ok(Json(json!({ "categories": categories })))
}

/// `POST /api/admin/trending-categories`
pub async fn create_category(
    State(state): State<AppState>,
    _claims: AdminClaims,
    body: Result<Json<TrendingCategoryCreateRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Value>)> {
    let Json(request) =
        body.map_err(|_| AppError::invalid_input("invalid_body", "malformed JSON body"))?;
    let name = request.name.trim();
    if name.is_empty() || name.chars().count() > CATEGORY_NAME_MAX_LEN {
        return Err(AppError::invalid_input(
            "invalid_name",
            "name must be 1-60 characters",
        ));
    }

    let category = state
        .database
        .create_trending_category(name, Utc::now())
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "id": category.id }))))
}

/// `DELETE /api/admin/trending-categories/{id}`
pub async fn delete_category(
    State(state): State<AppState>,
    _claims: AdminClaims,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<StatusCode> {
    let Path(category_id) =
        path.map_err(|_| AppError::invalid_input("invalid_id", "category id must be a UUID"))?;

    if !state.database.delete_trending_category(category_id).await? {
        return Err(AppError::not_found(
            "trending category",
            category_id.to_string(),
        ));
    }
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/admin/trending-categories/{id}/videos`
pub async fn list_category_videos(
    State(state): State<AppState>,
    _claims: AdminClaims,
    path: Result<Path<Uuid>, PathRejection>,
) -> AppResult<Json<Value>> {
    let Path(category_id) =
        path.map_err(|_| AppError::invalid_input("invalid_id", "category id must be a UUID"))?;

    if !state.database.trending_category_exists(category_id).await? {
        return Err(AppError::not_found(
            "trending category",
            category_id.to_string(),
        ));
    }
    let video_ids = state.database.list_category_video_ids(category_id).await?;
    Ok(Json(json!({ "videoIds": video_ids })))
}

/// `POST /api/admin/trending-categories/{id}/videos`
///
/// Duplicate assignment is a no-op, not an error.
pub async fn assign_category_video(
    State(state): State<AppState>,
    _claims: AdminClaims,
    path: Result<Path<Uuid>, PathRejection>,
    body: Result<Json<TrendingCategoryAssignRequest>, JsonRejection>,
) -> AppResult<StatusCode> {
    let Path(category_id) =
        path.map_err(|_| AppError::invalid_input("invalid_id", "category id must be a UUID"))?;
    let Json(request) =
        body.map_err(|_| AppError::invalid_input("invalid_body", "malformed JSON body"))?;

    if !state.database.trending_category_exists(category_id).await? {
        return Err(AppError::not_found(
            "trending category",
            category_id.to_string(),
        ));
    }
    if !state.database.video_exists(request.video_id).await? {
        return Err(AppError::not_found("video", request.video_id.to_string()));
    }

    state
        .database
        .assign_video_to_category(category_id, request.video_id, Utc::now())
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `DELETE /api/admin/trending-categories/{id}/videos/{videoId}`
pub async fn unassign_category_video(
    State(state): State<AppState>,
    _claims: AdminClaims,
    path: Result<Path<(Uuid, Uuid)>, PathRejection>,
) -> AppResult<StatusCode> {
    let Path((category_id, video_id)) =
        path.map_err(|_| AppError::invalid_input("invalid_id", "ids must be UUIDs"))?;

    state
        .database
        .unassign_video_from_category(category_id, video_id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
