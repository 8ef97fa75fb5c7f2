//! Live metrics push channel and the windowed analytics report
//!
//! The SSE endpoint authorizes once at connection time via a `token` query
//! parameter because `EventSource` cannot set request headers. Each
//! connection owns its ticker; dropping the stream on disconnect tears the
//! ticker down with it.

use axum::{
    extract::{rejection::QueryRejection, Query, State},
    http::{header, HeaderValue},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    Json,
};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::{convert::Infallible, time::Duration};
use tracing::{debug, warn};

use crate::errors::{AppError, AppResult};
use crate::models::{AnalyticsReport, BucketInterval, Role};
use crate::web::extractors::AdminClaims;
use crate::web::AppState;

const KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

#[derive(Debug, Deserialize)]
pub struct LiveQuery {
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReportQuery {
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub bucket: Option<BucketInterval>,
}

/// `GET /api/admin/live?token=…`
///
/// Pushes a `metrics` event immediately, then on every interval tick. A
/// failed snapshot is logged and the frame skipped; the ticker keeps going.
pub async fn live_metrics(
    State(state): State<AppState>,
    Query(query): Query<LiveQuery>,
) -> AppResult<Response> {
    let token = query.token.ok_or(AppError::Unauthorized)?;
    let claims = state.token_service.verify_session_token(&token)?;
    if claims.role != Role::Admin {
        return Err(AppError::Forbidden);
    }
    debug!("Live metrics stream opened for subject {}", claims.sub);

    let metrics = state.metrics.clone();
    let period = Duration::from_secs(state.config.metrics.live_interval_seconds);

    let stream = async_stream::stream! {
        // First tick fires immediately, giving the on-open snapshot.
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            match metrics.snapshot(Utc::now()).await {
                Ok(snapshot) => match serde_json::to_string(&snapshot) {
                    Ok(payload) => {
                        yield Ok::<Event, Infallible>(Event::default().event("metrics").data(payload));
                    }
                    Err(e) => warn!("Skipping metrics frame, serialization failed: {}", e),
                },
                Err(e) => warn!("Skipping metrics frame, snapshot failed: {}", e),
            }
        }
    };

    let mut response = Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(KEEP_ALIVE_INTERVAL)
                .text("keep-alive"),
        )
        .into_response();
    response.headers_mut().insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-transform"),
    );
    Ok(response)
}

/// `GET /api/admin/analytics?from=&to=&bucket=`
pub async fn analytics_report(
    State(state): State<AppState>,
    _claims: AdminClaims,
    query: Result<Query<ReportQuery>, QueryRejection>,
) -> AppResult<Json<AnalyticsReport>> {
    let Query(query) = query.map_err(|_| {
        AppError::invalid_input(
            "invalid_query",
            "from/to must be RFC3339 timestamps and bucket one of hour, day",
        )
    })?;

    let bucket = query.bucket.unwrap_or(BucketInterval::Day);
    let report = state
        .metrics
        .report(query.from, query.to, bucket, Utc::now())
        .await?;
    Ok(Json(report))
}
