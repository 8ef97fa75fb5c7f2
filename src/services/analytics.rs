//! Analytics ingestion rules: session id normalization, body validation,
//! event classification, visitor anonymization, and the write pipeline.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::database::Database;
use crate::errors::{AppError, AppResult};
use crate::models::{EventType, PingRequest};

pub const SESSION_ID_MAX_LEN: usize = 120;
pub const PATH_MAX_LEN: usize = 500;
pub const WATCH_SECONDS_MIN: i64 = 1;
pub const WATCH_SECONDS_MAX: i64 = 3600;

// Client heartbeat contract: a tick every 15s, position jumps past 40s are
// seeks, and a single report never claims more than 30s.
pub const HEARTBEAT_INTERVAL_SECONDS: i64 = 15;
pub const SEEK_DELTA_CEILING_SECONDS: i64 = 40;
pub const HEARTBEAT_REPORT_CAP_SECONDS: i64 = 30;

/// Trimmed session id, when present and within bounds. Bounds count
/// characters, not bytes.
pub fn normalize_session_id(raw: Option<&str>) -> Option<String> {
    let trimmed = raw?.trim();
    if trimmed.is_empty() || trimmed.chars().count() > SESSION_ID_MAX_LEN {
        return None;
    }
    Some(trimmed.to_string())
}

/// One-way visitor hash; the raw address never reaches storage.
/// Prefers the leftmost forwarded-for entry, then the peer address.
pub fn hash_client_ip(forwarded_for: Option<&str>, peer: Option<&str>) -> String {
    let ip = forwarded_for
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .or(peer)
        .unwrap_or("unknown");
    hex::encode(Sha256::digest(ip.as_bytes()))
}

/// Classify an incoming event. A watch duration always wins; otherwise only
/// an explicit `pageview` survives and everything else lands as `ping`.
pub fn classify_event(event_type: Option<&str>, watch_seconds: Option<i64>) -> EventType {
    if watch_seconds.is_some() {
        return EventType::Watch;
    }
    match event_type.and_then(EventType::parse) {
        Some(EventType::Pageview) => EventType::Pageview,
        _ => EventType::Ping,
    }
}

pub fn validate_ping_body(request: &PingRequest) -> AppResult<()> {
    if let Some(path) = &request.path {
        if path.chars().count() > PATH_MAX_LEN {
            return Err(AppError::invalid_input("invalid_body", "path too long"));
        }
    }
    if let Some(seconds) = request.watch_seconds {
        if !(WATCH_SECONDS_MIN..=WATCH_SECONDS_MAX).contains(&seconds) {
            return Err(AppError::invalid_input(
                "invalid_body",
                "watchSeconds out of range",
            ));
        }
    }
    Ok(())
}

/// Heartbeat delta to reportable watch seconds, if any. Zero and negative
/// deltas are dropped, jumps beyond the seek ceiling are dropped, survivors
/// clamp to the report cap.
pub fn clamp_watch_delta(delta_seconds: i64) -> Option<i64> {
    if delta_seconds <= 0 || delta_seconds > SEEK_DELTA_CEILING_SECONDS {
        return None;
    }
    Some(delta_seconds.clamp(WATCH_SECONDS_MIN, HEARTBEAT_REPORT_CAP_SECONDS))
}

#[derive(Clone)]
pub struct AnalyticsService {
    database: Database,
}

impl AnalyticsService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Ping pipeline: validate, touch the session, classify, append.
    pub async fn record_ping(
        &self,
        session_id: &str,
        user_id: Option<Uuid>,
        user_agent: &str,
        ip_hash: &str,
        request: &PingRequest,
        now: DateTime<Utc>,
    ) -> AppResult<EventType> {
        validate_ping_body(request)?;
        self.database
            .upsert_session(session_id, user_id, user_agent, ip_hash, now)
            .await?;
        let event_type = classify_event(request.event_type.as_deref(), request.watch_seconds);
        self.database
            .insert_event(
                session_id,
                event_type,
                request.path.as_deref(),
                request.video_id,
                request.watch_seconds,
                now,
            )
            .await?;
        Ok(event_type)
    }

    /// Increment the view counter, then record the event when a session id
    /// is present. The counter runs first so an unknown video commits
    /// nothing; an absent session skips the event but keeps the increment.
    pub async fn record_view(
        &self,
        video_id: Uuid,
        session_id: Option<&str>,
        user_agent: &str,
        ip_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<Option<i64>> {
        let views = match self.database.increment_video_views(video_id, now).await? {
            Some(views) => views,
            None => return Ok(None),
        };

        if let Some(session_id) = session_id {
            self.database
                .upsert_session(session_id, None, user_agent, ip_hash, now)
                .await?;
            let path = format!("/videos/{video_id}/view");
            self.database
                .insert_event(
                    session_id,
                    EventType::View,
                    Some(&path),
                    Some(video_id),
                    None,
                    now,
                )
                .await?;
        }

        Ok(Some(views))
    }
}
