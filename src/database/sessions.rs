use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::{parse_datetime, parse_uuid, Database};
use crate::errors::{AppError, AppResult};
use crate::models::{AnalyticsEvent, BucketInterval, EventType, SeriesPoint, Session};

impl Database {
    /// Insert-or-touch a session. The user id is sticky: a null incoming id
    /// never clears one recorded earlier.
    pub async fn upsert_session(
        &self,
        session_id: &str,
        user_id: Option<Uuid>,
        user_agent: &str,
        ip_hash: &str,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            r#"
            INSERT INTO analytics_sessions (session_id, user_id, user_agent, ip_hash, first_seen_at, last_seen_at)
            VALUES (?, ?, ?, ?, ?, ?)
            ON CONFLICT(session_id) DO UPDATE SET
                last_seen_at = excluded.last_seen_at,
                user_id = COALESCE(excluded.user_id, analytics_sessions.user_id),
                user_agent = excluded.user_agent,
                ip_hash = excluded.ip_hash
            "#,
        )
        .bind(session_id)
        .bind(user_id.map(|u| u.to_string()))
        .bind(user_agent)
        .bind(ip_hash)
        .bind(now.to_rfc3339())
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    pub async fn get_session(&self, session_id: &str) -> AppResult<Option<Session>> {
        let row = sqlx::query(
            "SELECT session_id, user_id, user_agent, ip_hash, first_seen_at, last_seen_at
             FROM analytics_sessions WHERE session_id = ?",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let user_id: Option<String> = row.get("user_id");
        let first_seen_at: String = row.get("first_seen_at");
        let last_seen_at: String = row.get("last_seen_at");
        Ok(Some(Session {
            session_id: row.get("session_id"),
            user_id: user_id.as_deref().map(parse_uuid).transpose()?,
            user_agent: row.get("user_agent"),
            ip_hash: row.get("ip_hash"),
            first_seen_at: parse_datetime(&first_seen_at)?,
            last_seen_at: parse_datetime(&last_seen_at)?,
        }))
    }

    pub async fn insert_event(
        &self,
        session_id: &str,
        event_type: EventType,
        path: Option<&str>,
        video_id: Option<Uuid>,
        watch_seconds: Option<i64>,
        now: DateTime<Utc>,
    ) -> AppResult<()> {
        sqlx::query(
            "INSERT INTO analytics_events (session_id, event_type, path, video_id, watch_seconds, created_at)
             VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(session_id)
        .bind(event_type.as_str())
        .bind(path)
        .bind(video_id.map(|u| u.to_string()))
        .bind(watch_seconds)
        .bind(now.to_rfc3339())
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Events for one session, newest first
    pub async fn list_session_events(&self, session_id: &str) -> AppResult<Vec<AnalyticsEvent>> {
        let rows = sqlx::query(
            "SELECT id, session_id, event_type, path, video_id, watch_seconds, created_at
             FROM analytics_events WHERE session_id = ? ORDER BY id DESC",
        )
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        let mut events = Vec::with_capacity(rows.len());
        for row in rows {
            let event_type_str: String = row.get("event_type");
            let event_type = EventType::parse(&event_type_str).ok_or_else(|| {
                AppError::internal(format!("invalid stored event type '{event_type_str}'"))
            })?;
            let video_id: Option<String> = row.get("video_id");
            let created_at: String = row.get("created_at");
            events.push(AnalyticsEvent {
                id: row.get("id"),
                session_id: row.get("session_id"),
                event_type,
                path: row.get("path"),
                video_id: video_id.as_deref().map(parse_uuid).transpose()?,
                watch_seconds: row.get("watch_seconds"),
                created_at: parse_datetime(&created_at)?,
            });
        }
        Ok(events)
    }

    pub async fn count_active_sessions(&self, cutoff: DateTime<Utc>) -> AppResult<i64> {
        let count: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM analytics_sessions WHERE last_seen_at >= ?")
                .bind(cutoff.to_rfc3339())
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    /// Distinct visitors whose session was last seen inside `[from, to]`.
    pub async fn count_distinct_visitors_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT ip_hash) FROM analytics_sessions
             WHERE last_seen_at >= ? AND last_seen_at <= ?",
        )
        .bind(from.to_rfc3339())
        .bind(to.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn count_distinct_visitors_since(&self, cutoff: DateTime<Utc>) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(DISTINCT ip_hash) FROM analytics_sessions WHERE last_seen_at >= ?",
        )
        .bind(cutoff.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn count_view_events_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM analytics_events
             WHERE event_type = 'view' AND created_at >= ? AND created_at <= ?",
        )
        .bind(from.to_rfc3339())
        .bind(to.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn sum_watch_seconds_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> AppResult<i64> {
        let total: i64 = sqlx::query_scalar(
            "SELECT COALESCE(SUM(watch_seconds), 0) FROM analytics_events
             WHERE event_type = 'watch' AND created_at >= ? AND created_at <= ?",
        )
        .bind(from.to_rfc3339())
        .bind(to.to_rfc3339())
        .fetch_one(&self.pool)
        .await?;
        Ok(total)
    }

    /// Bucketed view/visitor series over `[from, to]`, ascending by bucket.
    /// Buckets are UTC boundaries rendered as RFC3339 strings.
    pub async fn event_series(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
        bucket: BucketInterval,
    ) -> AppResult<Vec<SeriesPoint>> {
        let bucket_format = match bucket {
            BucketInterval::Hour => "%Y-%m-%dT%H:00:00Z",
            BucketInterval::Day => "%Y-%m-%dT00:00:00Z",
        };

        let rows = sqlx::query(
            r#"
            SELECT strftime(?, e.created_at) AS bucket,
                   SUM(CASE WHEN e.event_type = 'view' THEN 1 ELSE 0 END) AS views,
                   COUNT(DISTINCT s.ip_hash) AS visitors
            FROM analytics_events e
            JOIN analytics_sessions s ON s.session_id = e.session_id
            WHERE e.created_at >= ? AND e.created_at <= ?
            GROUP BY bucket
            ORDER BY bucket ASC
            "#,
        )
        .bind(bucket_format)
        .bind(from.to_rfc3339())
        .bind(to.to_rfc3339())
        .fetch_all(&self.pool)
        .await?;

        let mut series = Vec::with_capacity(rows.len());
        for row in rows {
            series.push(SeriesPoint {
                bucket: row.get("bucket"),
                views: row.get("views"),
                visitors: row.get("visitors"),
            });
        }
        Ok(series)
    }
}
